//! Drives a harvest run: search, select, fetch, batch and persist.

use super::collector::{ChildFetch, Collector, CollectorSettings};
use super::models::{Playlist, PlaylistTrack, Track};
use super::report::RunReport;
use super::HarvestError;
use crate::catalog::CatalogApi;
use crate::config::{HarvestSettings, ParentSelection};
use crate::harvest_store::{HarvestStore, UpsertSummary};
use crate::retry_policy::RetryPolicy;
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Playlists deduplicated by id.
///
/// A playlist found again keeps its first position but takes the content of
/// the latest sighting, so its category is the last query that returned it.
#[derive(Debug, Default)]
pub struct DiscoveredPlaylists {
    playlists: Vec<Playlist>,
    positions: HashMap<String, usize>,
}

impl DiscoveredPlaylists {
    pub fn insert(&mut self, playlist: Playlist) {
        match self.positions.get(&playlist.id) {
            Some(&position) => self.playlists[position] = playlist,
            None => {
                self.positions
                    .insert(playlist.id.clone(), self.playlists.len());
                self.playlists.push(playlist);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    /// Keeps at most `target` playlists according to `policy`.
    pub fn select(self, policy: ParentSelection, target: usize) -> Vec<Playlist> {
        let mut playlists = self.playlists;
        if policy == ParentSelection::MostFollowed {
            // Stable, so ties stay in discovery order.
            playlists.sort_by_key(|p| Reverse(p.follower_count));
        }
        playlists.truncate(target);
        playlists
    }
}

/// Playlists and track observations waiting to be written.
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    playlists: Vec<Playlist>,
    observations: Vec<PlaylistTrack>,
}

impl BatchAccumulator {
    pub fn push(&mut self, playlist: Playlist, tracks: Vec<Track>) {
        self.observations
            .extend(tracks.into_iter().map(|track| PlaylistTrack {
                playlist_id: playlist.id.clone(),
                snapshot_date: playlist.snapshot_date,
                track,
            }));
        self.playlists.push(playlist);
    }

    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    pub fn playlist_count(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty() && self.observations.is_empty()
    }

    /// Writes the buffered rows in one upsert. The buffer is only cleared
    /// once the store has committed them.
    pub fn flush(&mut self, store: &dyn HarvestStore) -> anyhow::Result<Option<UpsertSummary>> {
        if self.is_empty() {
            return Ok(None);
        }
        let summary = store.upsert(&self.playlists, &self.observations)?;
        self.playlists.clear();
        self.observations.clear();
        Ok(Some(summary))
    }
}

pub struct Harvester {
    collector: Collector,
    store: Arc<dyn HarvestStore>,
    settings: HarvestSettings,
}

impl Harvester {
    pub fn new(
        catalog: Arc<dyn CatalogApi>,
        store: Arc<dyn HarvestStore>,
        settings: HarvestSettings,
        retry: RetryPolicy,
        snapshot_date: NaiveDate,
    ) -> Self {
        let collector = Collector::new(
            catalog,
            retry,
            CollectorSettings::from_harvest(&settings, snapshot_date),
        );
        Self {
            collector,
            store,
            settings,
        }
    }

    /// Runs every query in order and collects the unique playlists found.
    pub async fn discover(&self, queries: &[String], report: &mut RunReport) -> DiscoveredPlaylists {
        let mut discovered = DiscoveredPlaylists::default();
        for query in queries {
            let result = self.collector.search_entities(query).await;
            report.queries_issued += 1;
            if result.exhausted {
                report.exhausted_searches.push(query.clone());
            }
            let found = result.playlists.len();
            for playlist in result.playlists {
                discovered.insert(playlist);
            }
            info!(
                "Query '{}': {} playlists ({} unique so far)",
                query,
                found,
                discovered.len()
            );
        }
        discovered
    }

    /// Runs one harvest.
    ///
    /// Search and listing failures degrade the report to a partial success.
    /// A failed batch write aborts the run; batches already written stay.
    pub async fn run(&self, queries: &[String]) -> Result<RunReport, HarvestError> {
        let started = Instant::now();
        let mut report = RunReport {
            snapshot_date: Some(self.collector.settings().snapshot_date),
            ..Default::default()
        };

        let discovered = self.discover(queries, &mut report).await;
        report.playlists_discovered = discovered.len();
        if !discovered.is_empty() {
            self.save_discovered(&discovered)?;
        }

        let selected = discovered.select(self.settings.parent_selection, self.settings.target_playlists);
        report.playlists_selected = selected.len();
        info!(
            "Fetching tracks for {} of {} discovered playlists ({:?})",
            report.playlists_selected, report.playlists_discovered, self.settings.parent_selection
        );

        let mut batch = BatchAccumulator::default();
        let total = selected.len();
        for (index, playlist) in selected.into_iter().enumerate() {
            let position = index + 1;
            info!("[{}/{}] {}", position, total, display_name(&playlist.name));

            let fetch = self.collector.fetch_all_children(&playlist.id).await;
            record_fetch(&mut report, &playlist, &fetch);
            batch.push(playlist, fetch.tracks);

            if batch.observation_count() >= self.settings.batch_size {
                self.flush(&mut batch, &mut report)?;
            }
            if position % self.settings.progress_every.max(1) == 0 {
                self.log_progress(position, total);
            }
        }
        self.flush(&mut batch, &mut report)?;

        report.totals = match self.store.totals() {
            Ok(totals) => Some(totals),
            Err(e) => {
                warn!("Failed to read final store totals: {:#}", e);
                None
            }
        };
        report.elapsed = started.elapsed();
        Ok(report)
    }

    /// Every discovered playlist gets a row, including the ones the target
    /// cap leaves without a track fetch.
    fn save_discovered(&self, discovered: &DiscoveredPlaylists) -> Result<(), HarvestError> {
        match self.store.upsert(discovered.playlists(), &[]) {
            Ok(summary) => {
                info!(
                    playlists = summary.playlists_written,
                    "Saved discovered playlists"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    "Failed to save {} discovered playlists: {:#}",
                    discovered.len(),
                    e
                );
                Err(HarvestError::Persistence(e))
            }
        }
    }

    fn flush(&self, batch: &mut BatchAccumulator, report: &mut RunReport) -> Result<(), HarvestError> {
        let playlists = batch.playlist_count();
        let observations = batch.observation_count();
        match batch.flush(self.store.as_ref()) {
            Ok(Some(summary)) => {
                report.batches_flushed += 1;
                info!(
                    playlists,
                    observations,
                    new_tracks = summary.tracks_inserted,
                    new_associations = summary.associations_inserted,
                    "Saved batch"
                );
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                error!(
                    "Failed to save batch of {} playlists and {} observations: {:#}",
                    playlists, observations, e
                );
                Err(HarvestError::Persistence(e))
            }
        }
    }

    fn log_progress(&self, position: usize, total: usize) {
        match self.store.totals() {
            Ok(totals) => info!(
                "Progress {}/{}: {} playlists, {} tracks, {} associations, {} artists stored",
                position, total, totals.playlists, totals.tracks, totals.associations, totals.artists
            ),
            Err(e) => warn!("Failed to read store totals: {:#}", e),
        }
    }
}

fn record_fetch(report: &mut RunReport, playlist: &Playlist, fetch: &ChildFetch) {
    report.playlists_processed += 1;
    report.tracks_accepted += fetch.tracks.len();
    report.rejections += fetch.rejections;
    if !fetch.complete {
        report.incomplete_playlists.push(playlist.id.clone());
    }
}

/// Playlist name trimmed for log lines.
fn display_name(name: &str) -> String {
    const MAX_CHARS: usize = 50;
    if name.chars().count() <= MAX_CHARS {
        name.to_string()
    } else {
        let truncated: String = name.chars().take(MAX_CHARS).collect();
        format!("{}...", truncated)
    }
}
