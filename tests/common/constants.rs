//! Shared constants for end-to-end tests
//!
//! When the scripted catalog data changes, update only this file.

// ============================================================================
// Queries
// ============================================================================

pub const QUERY_YOGA: &str = "yoga";
pub const QUERY_RUNNING: &str = "running";

// ============================================================================
// Playlist IDs
// ============================================================================

pub const PLAYLIST_1_ID: &str = "p1";
pub const PLAYLIST_2_ID: &str = "p2";
pub const PLAYLIST_3_ID: &str = "p3";

// ============================================================================
// Track bounds
// ============================================================================

/// Shortest duration accepted by default.
pub const MIN_DURATION_MS: i64 = 30_000;

/// Longest duration accepted by default.
pub const MAX_DURATION_MS: i64 = 600_000;

/// A duration comfortably inside the accepted bounds.
pub const OK_DURATION_MS: i64 = 180_000;

// ============================================================================
// Client credentials used against the mock HTTP server
// ============================================================================

pub const TEST_CLIENT_ID: &str = "test-client";
pub const TEST_CLIENT_SECRET: &str = "test-secret";
pub const TEST_ACCESS_TOKEN: &str = "test-token";
