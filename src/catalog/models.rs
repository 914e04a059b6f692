//! Raw, unvalidated catalog records as returned by the Web API.
//!
//! Every field is optional: the API omits or nulls fields freely and the
//! collection layer decides what is acceptable.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawOwner {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawTotal {
    pub total: Option<u64>,
}

/// Playlist as it appears in a search result.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawPlaylist {
    pub id: Option<String>,
    pub name: Option<String>,
    pub owner: Option<RawOwner>,
    pub followers: Option<RawTotal>,
    pub tracks: Option<RawTotal>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawArtist {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawAlbum {
    pub name: Option<String>,
    /// `2023-05-15`, `2023-05` or `2023`.
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawTrack {
    /// Null for local files and some unavailable tracks.
    pub id: Option<String>,
    pub name: Option<String>,
    pub duration_ms: Option<i64>,
    pub popularity: Option<i64>,
    pub explicit: Option<bool>,
    #[serde(default)]
    pub artists: Vec<RawArtist>,
    pub album: Option<RawAlbum>,
}

/// Entry of a playlist track listing. `track` is null for deleted or
/// unavailable tracks.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawPlaylistItem {
    pub track: Option<RawTrack>,
}

// =============================================================================
// Response envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub playlists: Option<PagingObject>,
}

/// Items are kept as loose JSON so one malformed entry doesn't fail the page.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PagingObject {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}
