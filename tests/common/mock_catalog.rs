//! In-memory catalog with scripted data and failure injection.

use async_trait::async_trait;
use playlist_harvester::catalog::{CatalogApi, CatalogError, Page, RawPlaylist, RawPlaylistItem};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Mock catalog for harvest tests.
///
/// Searches return the playlists registered for the query; listings serve
/// a playlist's items page by page. A query or playlist can be set to fail
/// a number of times before it starts answering.
#[derive(Default)]
pub struct MockCatalog {
    searches: HashMap<String, Vec<RawPlaylist>>,
    tracks: HashMap<String, Vec<RawPlaylistItem>>,
    search_failures: Mutex<HashMap<String, u32>>,
    listing_failures: Mutex<HashMap<String, u32>>,
    search_calls: AtomicU32,
    listing_calls: Mutex<Vec<(String, u32)>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: &str, playlists: Vec<RawPlaylist>) -> Self {
        self.searches.insert(query.to_string(), playlists);
        self
    }

    pub fn with_tracks(mut self, playlist_id: &str, items: Vec<RawPlaylistItem>) -> Self {
        self.tracks.insert(playlist_id.to_string(), items);
        self
    }

    /// The next `times` searches for `query` fail with a transient error.
    pub fn failing_search(self, query: &str, times: u32) -> Self {
        self.search_failures
            .lock()
            .unwrap()
            .insert(query.to_string(), times);
        self
    }

    /// The next `times` listings of `playlist_id` fail with a transient error.
    pub fn failing_listing(self, playlist_id: &str, times: u32) -> Self {
        self.listing_failures
            .lock()
            .unwrap()
            .insert(playlist_id.to_string(), times);
        self
    }

    pub fn search_call_count(&self) -> u32 {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Listing calls made for `playlist_id`, failed ones included.
    pub fn listing_call_count(&self, playlist_id: &str) -> usize {
        self.listing_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == playlist_id)
            .count()
    }

    pub fn listing_offsets(&self, playlist_id: &str) -> Vec<u32> {
        self.listing_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == playlist_id)
            .map(|(_, offset)| *offset)
            .collect()
    }

    fn take_failure(failures: &Mutex<HashMap<String, u32>>, key: &str) -> bool {
        let mut failures = failures.lock().unwrap();
        match failures.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn search_playlists(
        &self,
        query: &str,
        page_size: u32,
    ) -> Result<Page<RawPlaylist>, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.search_failures, query) {
            return Err(CatalogError::Http {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }

        let items: Vec<RawPlaylist> = self
            .searches
            .get(query)
            .map(|playlists| playlists.iter().take(page_size as usize).cloned().collect())
            .unwrap_or_default();
        Ok(Page {
            returned: items.len(),
            total: Some(items.len() as u64),
            items,
        })
    }

    async fn list_playlist_tracks(
        &self,
        playlist_id: &str,
        page_size: u32,
        offset: u32,
    ) -> Result<Page<RawPlaylistItem>, CatalogError> {
        self.listing_calls
            .lock()
            .unwrap()
            .push((playlist_id.to_string(), offset));
        if Self::take_failure(&self.listing_failures, playlist_id) {
            return Err(CatalogError::Transport("connection reset".to_string()));
        }

        let all = self
            .tracks
            .get(playlist_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let items: Vec<RawPlaylistItem> = all
            .iter()
            .skip(offset as usize)
            .take(page_size as usize)
            .cloned()
            .collect();
        Ok(Page {
            returned: items.len(),
            total: Some(all.len() as u64),
            items,
        })
    }
}
