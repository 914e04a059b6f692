//! Normalized records produced by the collection layer.

use chrono::NaiveDate;
use std::ops::AddAssign;

/// Fallback for names the catalog omits.
pub const UNKNOWN: &str = "Unknown";

/// A playlist discovered by a search query.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub follower_count: u64,
    /// Track count declared by the catalog, not what was fetched.
    pub total_tracks: u64,
    /// The query that discovered this playlist.
    pub category: String,
    pub snapshot_date: NaiveDate,
    pub data_source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub name_clean: String,
    pub artist_name: String,
    pub artist_name_clean: String,
    pub album_name: String,
    pub release_year: Option<i32>,
    pub duration_ms: i64,
    pub popularity: u8,
    pub explicit: bool,
}

/// A track observed in a playlist on a given date.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistTrack {
    pub playlist_id: String,
    pub snapshot_date: NaiveDate,
    pub track: Track,
}

/// Why a playlist item didn't become a [`Track`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The item's track is null (deleted or unavailable).
    NullTrack,
    MissingId,
    /// Duration outside the configured bounds.
    Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub null_track: u32,
    pub missing_id: u32,
    pub duration: u32,
}

impl RejectionCounts {
    pub fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::NullTrack => self.null_track += 1,
            Rejection::MissingId => self.missing_id += 1,
            Rejection::Duration => self.duration += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.null_track + self.missing_id + self.duration
    }
}

impl AddAssign for RejectionCounts {
    fn add_assign(&mut self, other: Self) {
        self.null_track += other.null_track;
        self.missing_id += other.missing_id;
        self.duration += other.duration;
    }
}

/// Row counts read back from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreTotals {
    /// Distinct playlist ids.
    pub playlists: u64,
    pub tracks: u64,
    pub associations: u64,
    /// Distinct artist names.
    pub artists: u64,
}
