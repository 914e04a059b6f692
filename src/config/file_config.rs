use super::ParentSelection;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_path: Option<String>,

    pub harvest: Option<HarvestConfig>,
    pub catalog: Option<CatalogConfig>,
    pub retry: Option<RetryConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct HarvestConfig {
    pub queries: Option<Vec<String>>,
    pub target_playlists: Option<usize>,
    pub parent_selection: Option<ParentSelection>,
    pub batch_size: Option<usize>,
    pub progress_every: Option<usize>,
    pub search_page_size: Option<u32>,
    pub track_page_size: Option<u32>,
    pub min_duration_ms: Option<i64>,
    pub max_duration_ms: Option<i64>,
    pub data_source: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub api_base_url: Option<String>,
    pub token_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// Fractional seconds, e.g. `0.15`.
    pub rate_limit_delay_secs: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: Option<u32>,
    pub backoff_factor: Option<f64>,
    pub base_delay_secs: Option<f64>,
    pub max_backoff_secs: Option<f64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let file = FileConfig::parse(
            r#"
            db_path = "/tmp/harvest.db"

            [harvest]
            queries = ["yoga", "pilates"]
            target_playlists = 10
            parent_selection = "most_followed"
            batch_size = 100

            [catalog]
            rate_limit_delay_secs = 0.5

            [retry]
            max_retries = 3
            base_delay_secs = 1.5
            "#,
        )
        .unwrap();

        assert_eq!(file.db_path.as_deref(), Some("/tmp/harvest.db"));
        let harvest = file.harvest.unwrap();
        assert_eq!(
            harvest.queries,
            Some(vec!["yoga".to_string(), "pilates".to_string()])
        );
        assert_eq!(harvest.target_playlists, Some(10));
        assert_eq!(harvest.parent_selection, Some(ParentSelection::MostFollowed));
        assert_eq!(harvest.batch_size, Some(100));
        assert!(harvest.track_page_size.is_none());
        assert_eq!(file.catalog.unwrap().rate_limit_delay_secs, Some(0.5));
        let retry = file.retry.unwrap();
        assert_eq!(retry.max_retries, Some(3));
        assert_eq!(retry.base_delay_secs, Some(1.5));
    }

    #[test]
    fn test_parse_empty_file() {
        let file = FileConfig::parse("").unwrap();
        assert!(file.db_path.is_none());
        assert!(file.harvest.is_none());
    }

    #[test]
    fn test_unknown_selection_policy_fails() {
        let result = FileConfig::parse(
            r#"
            [harvest]
            parent_selection = "random"
            "#,
        );
        assert!(result.is_err());
    }
}
