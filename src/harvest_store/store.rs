//! SQLite-backed harvest store.

use super::schema::HARVEST_SCHEMA;
use super::trait_def::{HarvestStore, UpsertSummary};
use crate::harvest::{Playlist, PlaylistTrack, StoreTotals};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Single-writer store over one SQLite connection.
#[derive(Clone)]
pub struct SqliteHarvestStore {
    conn: Arc<Mutex<Connection>>,
}

fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open harvest database {:?}", db_path))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

/// SQLite has no unsigned 64-bit integers.
fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl SqliteHarvestStore {
    /// Creates the database file, its parent directories and the schema.
    ///
    /// Safe to run against an already initialized database: existing tables
    /// and rows are left untouched.
    pub fn initialize<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let conn = open_connection(db_path)?;
        HARVEST_SCHEMA.create(&conn)?;
        HARVEST_SCHEMA.validate(&conn)?;
        info!("Initialized harvest database at {:?}", db_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens a database previously set up by [`SqliteHarvestStore::initialize`].
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if !db_path.exists() {
            bail!(
                "Harvest database {:?} does not exist, run `harvester init-db` first",
                db_path
            );
        }

        let conn = open_connection(db_path)?;
        let missing = HARVEST_SCHEMA.missing_tables(&conn)?;
        if !missing.is_empty() {
            bail!(
                "Harvest database {:?} is missing tables ({}), run `harvester init-db` first",
                db_path,
                missing.join(", ")
            );
        }
        HARVEST_SCHEMA
            .validate(&conn)
            .with_context(|| format!("Harvest database {:?} has an unexpected schema", db_path))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        let totals = store.totals()?;
        info!(
            "Opened harvest database: {} playlists, {} tracks, {} associations",
            totals.playlists, totals.tracks, totals.associations
        );
        Ok(store)
    }
}

impl HarvestStore for SqliteHarvestStore {
    fn upsert(&self, playlists: &[Playlist], tracks: &[PlaylistTrack]) -> Result<UpsertSummary> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut summary = UpsertSummary::default();

        {
            let mut playlist_stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO playlists
                    (playlist_id, snapshot_date, playlist_name, owner, follower_count,
                     total_tracks, category, data_source)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for playlist in playlists {
                summary.playlists_written += playlist_stmt.execute(params![
                    playlist.id,
                    playlist.snapshot_date.to_string(),
                    playlist.name,
                    playlist.owner,
                    to_sql_int(playlist.follower_count),
                    to_sql_int(playlist.total_tracks),
                    playlist.category,
                    playlist.data_source,
                ])?;
            }

            let mut track_stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO tracks
                    (track_id, track_name, track_name_clean, artist_name, artist_name_clean,
                     album_name, release_year, duration_ms, popularity, explicit)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            let mut link_stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO playlist_tracks (playlist_id, track_id, snapshot_date)
                 VALUES (?1, ?2, ?3)",
            )?;
            for observation in tracks {
                let track = &observation.track;
                summary.tracks_inserted += track_stmt.execute(params![
                    track.id,
                    track.name,
                    track.name_clean,
                    track.artist_name,
                    track.artist_name_clean,
                    track.album_name,
                    track.release_year,
                    track.duration_ms,
                    track.popularity,
                    track.explicit,
                ])?;
                summary.associations_inserted += link_stmt.execute(params![
                    observation.playlist_id,
                    track.id,
                    observation.snapshot_date.to_string(),
                ])?;
            }
        }

        tx.commit().context("Failed to commit harvest batch")?;
        Ok(summary)
    }

    fn totals(&self) -> Result<StoreTotals> {
        let conn = self.conn.lock().unwrap();
        let count = |sql: &str| -> Result<u64> {
            let n: i64 = conn.query_row(sql, [], |r| r.get(0))?;
            Ok(n.max(0) as u64)
        };
        Ok(StoreTotals {
            playlists: count("SELECT COUNT(DISTINCT playlist_id) FROM playlists")?,
            tracks: count("SELECT COUNT(*) FROM tracks")?,
            associations: count("SELECT COUNT(*) FROM playlist_tracks")?,
            artists: count("SELECT COUNT(DISTINCT artist_name) FROM tracks")?,
        })
    }
}
