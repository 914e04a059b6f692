use super::models::{RejectionCounts, StoreTotals};
use chrono::NaiveDate;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Some searches or playlists gave up after retries.
    PartialSuccess,
}

impl RunStatus {
    pub fn exit_code(self) -> ExitCode {
        match self {
            RunStatus::Success => ExitCode::SUCCESS,
            RunStatus::PartialSuccess => ExitCode::from(2),
        }
    }
}

/// Summary of one harvest run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub snapshot_date: Option<NaiveDate>,
    pub queries_issued: usize,
    /// Queries whose search failed after every retry.
    pub exhausted_searches: Vec<String>,
    /// Unique playlists found across all queries.
    pub playlists_discovered: usize,
    pub playlists_selected: usize,
    pub playlists_processed: usize,
    /// Playlists whose track listing stopped on a failed page.
    pub incomplete_playlists: Vec<String>,
    pub tracks_accepted: usize,
    pub rejections: RejectionCounts,
    pub batches_flushed: usize,
    pub totals: Option<StoreTotals>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn status(&self) -> RunStatus {
        if self.exhausted_searches.is_empty() && self.incomplete_playlists.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::PartialSuccess
        }
    }

    pub fn log_summary(&self) {
        info!(
            queries = self.queries_issued,
            discovered = self.playlists_discovered,
            selected = self.playlists_selected,
            processed = self.playlists_processed,
            tracks_accepted = self.tracks_accepted,
            rejected_null_track = self.rejections.null_track,
            rejected_missing_id = self.rejections.missing_id,
            rejected_duration = self.rejections.duration,
            batches = self.batches_flushed,
            elapsed_secs = self.elapsed.as_secs(),
            "Harvest finished"
        );
        if let Some(totals) = &self.totals {
            info!(
                "Store now holds {} playlists, {} tracks, {} associations, {} artists",
                totals.playlists, totals.tracks, totals.associations, totals.artists
            );
        }
        if !self.exhausted_searches.is_empty() {
            warn!(
                "{} searches failed: {}",
                self.exhausted_searches.len(),
                self.exhausted_searches.join(", ")
            );
        }
        if !self.incomplete_playlists.is_empty() {
            warn!(
                "{} playlists were only partially fetched: {}",
                self.incomplete_playlists.len(),
                self.incomplete_playlists.join(", ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status() {
        let mut report = RunReport::default();
        assert_eq!(report.status(), RunStatus::Success);

        report.exhausted_searches.push("yoga".to_string());
        assert_eq!(report.status(), RunStatus::PartialSuccess);

        report.exhausted_searches.clear();
        report.incomplete_playlists.push("p1".to_string());
        assert_eq!(report.status(), RunStatus::PartialSuccess);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunStatus::Success.exit_code(), ExitCode::SUCCESS);
        assert_eq!(RunStatus::PartialSuccess.exit_code(), ExitCode::from(2));
    }
}
