mod file_config;

pub use file_config::{CatalogConfig, FileConfig, HarvestConfig, RetryConfig};

use crate::catalog::CatalogClientSettings;
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "data/processed/spotify.db";

/// Queries used when neither the CLI nor the config file provide any.
pub const DEFAULT_QUERIES: &[&str] = &[
    "workout",
    "gym",
    "fitness",
    "running",
    "cardio",
    "HIIT",
    "strength",
    "weights",
    "yoga",
    "cycling",
    "exercise",
    "training",
    "powerlifting",
    "crossfit",
    "spinning",
    "pilates",
    "aerobics",
    "zumba",
];

/// The catalog rejects search limits above this.
pub const MAX_SEARCH_PAGE_SIZE: u32 = 50;
/// The catalog rejects playlist track limits above this.
pub const MAX_TRACK_PAGE_SIZE: u32 = 100;

/// How the capped playlist set is chosen among the deduplicated ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ParentSelection {
    /// Keep the first `target_playlists` in discovery order.
    #[default]
    DiscoveryOrder,
    /// Keep the `target_playlists` with the most followers.
    MostFollowed,
}

/// CLI arguments that take part in config resolution.
/// Values set here win over the TOML file.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub queries: Vec<String>,
    pub target_playlists: Option<usize>,
    pub parent_selection: Option<ParentSelection>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub harvest: HarvestSettings,
    pub catalog: CatalogClientSettings,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub queries: Vec<String>,
    pub target_playlists: usize,
    pub parent_selection: ParentSelection,
    /// Playlist-track observations buffered before a flush.
    pub batch_size: usize,
    /// Store totals are logged every this many playlists.
    pub progress_every: usize,
    pub search_page_size: u32,
    pub track_page_size: u32,
    pub min_duration_ms: i64,
    pub max_duration_ms: i64,
    pub data_source: String,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            target_playlists: 200,
            parent_selection: ParentSelection::DiscoveryOrder,
            batch_size: 500,
            progress_every: 25,
            search_page_size: MAX_SEARCH_PAGE_SIZE,
            track_page_size: MAX_TRACK_PAGE_SIZE,
            min_duration_ms: 30_000,
            max_duration_ms: 600_000,
            data_source: "fast_collection".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrySettings {
    /// Total attempts per catalog call, the first one included.
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub base_delay: Duration,
    pub max_backoff: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: 2.0,
            base_delay: Duration::from_secs(10),
            max_backoff: Duration::from_secs(300),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// Explicit CLI values override TOML values, which override defaults.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = cli
            .db_path
            .clone()
            .or_else(|| file.db_path.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let defaults = HarvestSettings::default();
        let h = file.harvest.unwrap_or_default();
        let queries = if !cli.queries.is_empty() {
            cli.queries.clone()
        } else {
            h.queries.unwrap_or(defaults.queries)
        };
        let harvest = HarvestSettings {
            queries: clean_queries(queries),
            target_playlists: cli
                .target_playlists
                .or(h.target_playlists)
                .unwrap_or(defaults.target_playlists),
            parent_selection: cli
                .parent_selection
                .or(h.parent_selection)
                .unwrap_or(defaults.parent_selection),
            batch_size: h.batch_size.unwrap_or(defaults.batch_size),
            progress_every: h.progress_every.unwrap_or(defaults.progress_every),
            search_page_size: h.search_page_size.unwrap_or(defaults.search_page_size),
            track_page_size: h.track_page_size.unwrap_or(defaults.track_page_size),
            min_duration_ms: h.min_duration_ms.unwrap_or(defaults.min_duration_ms),
            max_duration_ms: h.max_duration_ms.unwrap_or(defaults.max_duration_ms),
            data_source: h.data_source.unwrap_or(defaults.data_source),
        };

        let catalog_defaults = CatalogClientSettings::default();
        let c = file.catalog.unwrap_or_default();
        let rate_limit_delay = match c.rate_limit_delay_secs {
            Some(secs) => secs_to_duration("catalog.rate_limit_delay_secs", secs)?,
            None => catalog_defaults.rate_limit_delay,
        };
        let catalog = CatalogClientSettings {
            api_base_url: c.api_base_url.unwrap_or(catalog_defaults.api_base_url),
            token_url: c.token_url.unwrap_or(catalog_defaults.token_url),
            request_timeout: c
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(catalog_defaults.request_timeout),
            rate_limit_delay,
        };

        let retry_defaults = RetrySettings::default();
        let r = file.retry.unwrap_or_default();
        let retry = RetrySettings {
            max_retries: r.max_retries.unwrap_or(retry_defaults.max_retries),
            backoff_factor: r.backoff_factor.unwrap_or(retry_defaults.backoff_factor),
            base_delay: match r.base_delay_secs {
                Some(secs) => secs_to_duration("retry.base_delay_secs", secs)?,
                None => retry_defaults.base_delay,
            },
            max_backoff: match r.max_backoff_secs {
                Some(secs) => secs_to_duration("retry.max_backoff_secs", secs)?,
                None => retry_defaults.max_backoff,
            },
        };

        let config = Self {
            db_path,
            harvest,
            catalog,
            retry,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let h = &self.harvest;
        if h.queries.is_empty() {
            bail!("At least one search query must be configured");
        }
        if h.batch_size == 0 {
            bail!("harvest.batch_size must be greater than 0");
        }
        if h.progress_every == 0 {
            bail!("harvest.progress_every must be greater than 0");
        }
        if !(1..=MAX_SEARCH_PAGE_SIZE).contains(&h.search_page_size) {
            bail!(
                "harvest.search_page_size must be between 1 and {}, got {}",
                MAX_SEARCH_PAGE_SIZE,
                h.search_page_size
            );
        }
        if !(1..=MAX_TRACK_PAGE_SIZE).contains(&h.track_page_size) {
            bail!(
                "harvest.track_page_size must be between 1 and {}, got {}",
                MAX_TRACK_PAGE_SIZE,
                h.track_page_size
            );
        }
        if h.min_duration_ms < 0 || h.min_duration_ms > h.max_duration_ms {
            bail!(
                "Invalid track duration bounds: [{}, {}]",
                h.min_duration_ms,
                h.max_duration_ms
            );
        }
        if self.retry.max_retries == 0 {
            bail!("retry.max_retries must be at least 1");
        }
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 1.0 {
            bail!(
                "retry.backoff_factor must be >= 1.0, got {}",
                self.retry.backoff_factor
            );
        }
        Ok(())
    }
}

fn secs_to_duration(field: &str, secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        bail!("{} must be a non-negative number of seconds, got {}", field, secs);
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| anyhow!("{} is out of range ({} seconds): {}", field, secs, e))
}

/// Trims queries and drops empty ones, preserving order.
fn clean_queries(queries: Vec<String>) -> Vec<String> {
    queries
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect()
}
