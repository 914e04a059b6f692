//! Playlist Harvester Library
//!
//! Collects playlists and their tracks from a music catalog API into a
//! local SQLite database. The library exposes the modules for the
//! `harvester` binary and for integration tests.

pub mod catalog;
pub mod config;
pub mod harvest;
pub mod harvest_store;
pub mod normalize;
pub mod retry_policy;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use catalog::{CatalogApi, CatalogError, EnvCredentials, SpotifyCatalogClient};
pub use config::{AppConfig, CliConfig, FileConfig, ParentSelection};
pub use harvest::{HarvestError, Harvester, RunReport, RunStatus};
pub use harvest_store::{HarvestStore, SqliteHarvestStore};
pub use retry_policy::RetryPolicy;
