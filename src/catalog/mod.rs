//! External music catalog access.
//!
//! The harvester talks to the catalog only through [`CatalogApi`], which
//! exposes the two calls the pipeline needs: playlist search and paginated
//! playlist track listing. [`SpotifyCatalogClient`] is the HTTP implementation.

mod client;
pub mod credentials;
pub mod models;

pub use client::{CallPacer, CatalogClientSettings, SpotifyCatalogClient};
pub use credentials::{ClientCredentials, CredentialProvider, EnvCredentials};
pub use models::{RawAlbum, RawArtist, RawPlaylist, RawPlaylistItem, RawTrack};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// One page of results from the catalog.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Entries that decoded successfully.
    pub items: Vec<T>,
    /// Number of raw entries the API returned, including null or malformed
    /// ones that were skipped. End of results is detected on this count.
    pub returned: usize,
    /// Total declared by the API, if any.
    pub total: Option<u64>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            returned: 0,
            total: None,
        }
    }
}

/// Errors returned by a single catalog call.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited by catalog API")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Catalog API returned status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl CatalogError {
    /// Whether repeating the same call can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CatalogError::NotFound(_))
    }

    /// Server-provided wait hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CatalogError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CatalogError::Decode(e.to_string())
        } else {
            CatalogError::Transport(e.to_string())
        }
    }
}

/// Typed access to the external catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Search playlists matching `query`, returning at most `page_size` entries.
    async fn search_playlists(
        &self,
        query: &str,
        page_size: u32,
    ) -> Result<Page<RawPlaylist>, CatalogError>;

    /// List one page of the tracks of `playlist_id` starting at `offset`.
    async fn list_playlist_tracks(
        &self,
        playlist_id: &str,
        page_size: u32,
        offset: u32,
    ) -> Result<Page<RawPlaylistItem>, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_not_retryable() {
        assert!(!CatalogError::NotFound("playlist x".into()).is_retryable());
        assert!(CatalogError::Auth("expired".into()).is_retryable());
        assert!(CatalogError::Transport("reset".into()).is_retryable());
        assert!(CatalogError::Decode("eof".into()).is_retryable());
        assert!(CatalogError::Http {
            status: 502,
            message: "bad gateway".into()
        }
        .is_retryable());
        assert!(CatalogError::RateLimited { retry_after: None }.is_retryable());
    }

    #[test]
    fn test_retry_after_only_for_rate_limit() {
        let limited = CatalogError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
        };
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(3)));
        assert_eq!(CatalogError::Transport("x".into()).retry_after(), None);
    }
}
