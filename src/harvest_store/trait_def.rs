//! HarvestStore trait definition.

use crate::harvest::{Playlist, PlaylistTrack, StoreTotals};
use anyhow::Result;

/// Rows actually written by one [`HarvestStore::upsert`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Inserted or replaced playlist rows.
    pub playlists_written: usize,
    /// New track rows; already known tracks are not counted.
    pub tracks_inserted: usize,
    /// New playlist/track/date rows.
    pub associations_inserted: usize,
}

/// Write side of the harvest database.
///
/// Implementations own all writes to the store. One `upsert` call is one
/// atomic batch: either every row is committed or none is.
pub trait HarvestStore: Send + Sync {
    /// Playlists are inserted or replaced by id; tracks are inserted unless
    /// the id is already known; associations are inserted unless the
    /// (playlist, track, snapshot date) triple is already known.
    fn upsert(&self, playlists: &[Playlist], tracks: &[PlaylistTrack]) -> Result<UpsertSummary>;

    /// Current row counts, for progress reporting.
    fn totals(&self) -> Result<StoreTotals>;
}
