//! Test fixtures: raw catalog records, settings and stores.

use super::constants::*;
use chrono::NaiveDate;
use playlist_harvester::catalog::models::{
    RawAlbum, RawArtist, RawOwner, RawPlaylist, RawPlaylistItem, RawTotal, RawTrack,
};
use playlist_harvester::config::HarvestSettings;
use playlist_harvester::{RetryPolicy, SqliteHarvestStore};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub fn raw_playlist(id: &str, name: &str, followers: u64) -> RawPlaylist {
    RawPlaylist {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        owner: Some(RawOwner {
            display_name: Some("curator".to_string()),
        }),
        followers: Some(RawTotal {
            total: Some(followers),
        }),
        tracks: Some(RawTotal { total: None }),
    }
}

pub fn raw_track(id: &str, artist: &str, duration_ms: i64) -> RawPlaylistItem {
    RawPlaylistItem {
        track: Some(RawTrack {
            id: Some(id.to_string()),
            name: Some(format!("Track {}", id)),
            duration_ms: Some(duration_ms),
            popularity: Some(60),
            explicit: Some(false),
            artists: vec![RawArtist {
                name: Some(artist.to_string()),
            }],
            album: Some(RawAlbum {
                name: Some("Album".to_string()),
                release_date: Some("2021-04-09".to_string()),
            }),
        }),
    }
}

/// `count` valid tracks with ids `{prefix}-0`, `{prefix}-1`, ...
pub fn raw_tracks(prefix: &str, count: usize) -> Vec<RawPlaylistItem> {
    (0..count)
        .map(|i| raw_track(&format!("{}-{}", prefix, i), "Artist", OK_DURATION_MS))
        .collect()
}

pub fn snapshot(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

pub fn harvest_settings(queries: &[&str]) -> HarvestSettings {
    HarvestSettings {
        queries: queries.iter().map(|q| q.to_string()).collect(),
        ..Default::default()
    }
}

/// Retry policy with tiny waits, for tests that don't pause time.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        backoff_factor: 2.0,
    }
}

/// An initialized database in a temporary directory.
pub struct TestDb {
    pub path: PathBuf,
    _temp_dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("processed").join("harvest.db");
        SqliteHarvestStore::initialize(&path).unwrap();
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    pub fn open_store(&self) -> SqliteHarvestStore {
        SqliteHarvestStore::open(&self.path).unwrap()
    }

    pub fn count(&self, table: &str) -> i64 {
        count_rows(&self.path, table)
    }

    pub fn query_string(&self, sql: &str) -> String {
        let conn = Connection::open(&self.path).unwrap();
        conn.query_row(sql, [], |r| r.get(0)).unwrap()
    }

    pub fn query_i64(&self, sql: &str) -> i64 {
        let conn = Connection::open(&self.path).unwrap();
        conn.query_row(sql, [], |r| r.get(0)).unwrap()
    }
}

pub fn count_rows(db_path: &Path, table: &str) -> i64 {
    let conn = Connection::open(db_path).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
        r.get(0)
    })
    .unwrap()
}
