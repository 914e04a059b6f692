//! SQLite schema of the harvest database.
//!
//! `playlists` keeps the latest observation per playlist, `tracks` the first
//! observation per track, and `playlist_tracks` one row per
//! (playlist, track, snapshot date).

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const PLAYLISTS_TABLE: Table = Table {
    name: "playlists",
    columns: &[
        sqlite_column!("playlist_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("snapshot_date", &SqlType::Text, non_null = true), // 'YYYY-MM-DD'
        sqlite_column!("playlist_name", &SqlType::Text, non_null = true),
        sqlite_column!("owner", &SqlType::Text, non_null = true),
        sqlite_column!("follower_count", &SqlType::Integer, non_null = true),
        sqlite_column!("total_tracks", &SqlType::Integer, non_null = true),
        sqlite_column!("category", &SqlType::Text, non_null = true),
        sqlite_column!("data_source", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_playlists_category", "category")],
    unique_constraints: &[],
};

const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("track_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("track_name", &SqlType::Text, non_null = true),
        sqlite_column!("track_name_clean", &SqlType::Text, non_null = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_name_clean", &SqlType::Text, non_null = true),
        sqlite_column!("album_name", &SqlType::Text, non_null = true),
        sqlite_column!("release_year", &SqlType::Integer),
        sqlite_column!("duration_ms", &SqlType::Integer, non_null = true),
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
        sqlite_column!("explicit", &SqlType::Integer, non_null = true), // 0/1
    ],
    indices: &[("idx_tracks_artist_clean", "artist_name_clean")],
    unique_constraints: &[],
};

const PLAYLIST_TRACKS_TABLE: Table = Table {
    name: "playlist_tracks",
    columns: &[
        sqlite_column!("playlist_id", &SqlType::Text, non_null = true),
        sqlite_column!("track_id", &SqlType::Text, non_null = true),
        sqlite_column!("snapshot_date", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_playlist_tracks_track", "track_id")],
    unique_constraints: &[&["playlist_id", "track_id", "snapshot_date"]],
};

pub const HARVEST_SCHEMA: VersionedSchema = VersionedSchema {
    version: 0,
    tables: &[PLAYLISTS_TABLE, TRACKS_TABLE, PLAYLIST_TRACKS_TABLE],
};
