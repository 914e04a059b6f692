//! Persistence of harvested playlists, tracks and their associations.

mod schema;
mod store;
mod trait_def;

pub use store::SqliteHarvestStore;
pub use trait_def::{HarvestStore, UpsertSummary};
