//! Turns catalog responses into normalized playlists and tracks.

use super::models::{Playlist, Rejection, RejectionCounts, Track, UNKNOWN};
use crate::catalog::{CatalogApi, RawPlaylist, RawPlaylistItem};
use crate::config::HarvestSettings;
use crate::normalize::normalize_str;
use crate::retry_policy::{RetryOutcome, RetryPolicy};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub search_page_size: u32,
    pub track_page_size: u32,
    pub min_duration_ms: i64,
    pub max_duration_ms: i64,
    /// Date stamped on every record of the run.
    pub snapshot_date: NaiveDate,
    pub data_source: String,
}

impl CollectorSettings {
    pub fn from_harvest(settings: &HarvestSettings, snapshot_date: NaiveDate) -> Self {
        Self {
            search_page_size: settings.search_page_size,
            track_page_size: settings.track_page_size,
            min_duration_ms: settings.min_duration_ms,
            max_duration_ms: settings.max_duration_ms,
            snapshot_date,
            data_source: settings.data_source.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SearchResult {
    pub playlists: Vec<Playlist>,
    /// The search failed after every retry; `playlists` is empty.
    pub exhausted: bool,
}

#[derive(Debug)]
pub struct ChildFetch {
    pub tracks: Vec<Track>,
    pub rejections: RejectionCounts,
    /// Pages successfully fetched.
    pub pages: u32,
    /// False when a page failed after every retry. Tracks from the pages
    /// before it are kept.
    pub complete: bool,
}

pub struct Collector {
    catalog: Arc<dyn CatalogApi>,
    retry: RetryPolicy,
    settings: CollectorSettings,
}

impl Collector {
    pub fn new(catalog: Arc<dyn CatalogApi>, retry: RetryPolicy, settings: CollectorSettings) -> Self {
        Self {
            catalog,
            retry,
            settings,
        }
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Searches playlists for `query`, tagging each with the query as its
    /// category. Never fails: an exhausted search yields no playlists.
    pub async fn search_entities(&self, query: &str) -> SearchResult {
        let page_size = self.settings.search_page_size;
        let outcome = self
            .retry
            .run("search_playlists", move || {
                self.catalog.search_playlists(query, page_size)
            })
            .await;

        let page = match outcome {
            RetryOutcome::Succeeded { value, .. } => value,
            RetryOutcome::Exhausted { .. } => {
                warn!(query, "Search exhausted its retries, no playlists collected");
                return SearchResult {
                    playlists: Vec::new(),
                    exhausted: true,
                };
            }
        };

        let returned = page.items.len();
        let playlists: Vec<Playlist> = page
            .items
            .into_iter()
            .filter_map(|raw| self.to_playlist(raw, query))
            .collect();
        debug!(
            query,
            returned,
            kept = playlists.len(),
            "Search returned playlists"
        );

        SearchResult {
            playlists,
            exhausted: false,
        }
    }

    /// Fetches every track of a playlist, a page at a time, until a page
    /// comes back short.
    pub async fn fetch_all_children(&self, playlist_id: &str) -> ChildFetch {
        let page_size = self.settings.track_page_size;
        let mut fetch = ChildFetch {
            tracks: Vec::new(),
            rejections: RejectionCounts::default(),
            pages: 0,
            complete: true,
        };
        let mut offset: u32 = 0;

        loop {
            let outcome = self
                .retry
                .run("list_playlist_tracks", move || {
                    self.catalog
                        .list_playlist_tracks(playlist_id, page_size, offset)
                })
                .await;

            let page = match outcome {
                RetryOutcome::Succeeded { value, .. } => value,
                RetryOutcome::Exhausted { last_error, .. } => {
                    warn!(
                        playlist_id,
                        offset, "Stopping pagination after failed page: {}", last_error
                    );
                    fetch.complete = false;
                    break;
                }
            };
            fetch.pages += 1;

            for item in page.items {
                match self.to_track(item) {
                    Ok(track) => fetch.tracks.push(track),
                    Err(rejection) => fetch.rejections.record(rejection),
                }
            }

            if page.returned < page_size as usize {
                break;
            }
            offset = offset.saturating_add(page_size);
        }

        let rejections = fetch.rejections;
        if rejections.total() > 0 {
            info!(
                playlist_id,
                accepted = fetch.tracks.len(),
                null_track = rejections.null_track,
                missing_id = rejections.missing_id,
                duration = rejections.duration,
                "Rejected playlist items"
            );
        }
        debug!(
            playlist_id,
            pages = fetch.pages,
            accepted = fetch.tracks.len(),
            complete = fetch.complete,
            "Fetched playlist tracks"
        );
        fetch
    }

    fn to_playlist(&self, raw: RawPlaylist, query: &str) -> Option<Playlist> {
        let id = raw.id.filter(|id| !id.trim().is_empty())?;
        Some(Playlist {
            id,
            name: raw.name.unwrap_or_else(|| UNKNOWN.to_string()),
            owner: raw
                .owner
                .and_then(|owner| owner.display_name)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            follower_count: raw.followers.and_then(|f| f.total).unwrap_or(0),
            total_tracks: raw.tracks.and_then(|t| t.total).unwrap_or(0),
            category: query.to_string(),
            snapshot_date: self.settings.snapshot_date,
            data_source: self.settings.data_source.clone(),
        })
    }

    fn to_track(&self, item: RawPlaylistItem) -> Result<Track, Rejection> {
        let raw = item.track.ok_or(Rejection::NullTrack)?;
        let id = raw
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or(Rejection::MissingId)?;

        let duration_ms = raw.duration_ms.unwrap_or(0);
        if duration_ms < self.settings.min_duration_ms || duration_ms > self.settings.max_duration_ms
        {
            return Err(Rejection::Duration);
        }

        let name = raw.name.unwrap_or_else(|| UNKNOWN.to_string());
        let artist_name = raw
            .artists
            .into_iter()
            .next()
            .and_then(|artist| artist.name)
            .unwrap_or_else(|| UNKNOWN.to_string());
        let album = raw.album.unwrap_or_default();

        Ok(Track {
            id,
            name_clean: normalize_str(&name),
            name,
            artist_name_clean: normalize_str(&artist_name),
            artist_name,
            album_name: album.name.unwrap_or_else(|| UNKNOWN.to_string()),
            release_year: album.release_date.as_deref().and_then(release_year),
            duration_ms,
            popularity: raw.popularity.unwrap_or(0).clamp(0, 100) as u8,
            explicit: raw.explicit.unwrap_or(false),
        })
    }
}

/// Year from a release date such as `2019-06-01`, `2019-06` or `2019`.
pub fn release_year(release_date: &str) -> Option<i32> {
    release_date.get(..4)?.parse().ok()
}
