//! Playlist harvesting pipeline.
//!
//! Searches the catalog for playlists, fetches their tracks page by page,
//! and writes them to a [`HarvestStore`](crate::harvest_store::HarvestStore)
//! in batches.

mod collector;
mod models;
mod orchestrator;
mod report;

pub use collector::{ChildFetch, Collector, CollectorSettings, SearchResult};
pub use models::{
    Playlist, PlaylistTrack, Rejection, RejectionCounts, StoreTotals, Track, UNKNOWN,
};
pub use orchestrator::{BatchAccumulator, DiscoveredPlaylists, Harvester};
pub use report::{RunReport, RunStatus};

use crate::catalog::CatalogError;
use thiserror::Error;

/// Errors that abort a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Missing catalog credentials: {0}")]
    MissingCredentials(String),

    #[error("Catalog client error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}
