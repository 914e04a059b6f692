//! HTTP client for the Spotify Web API.
//!
//! Uses the client-credentials flow and paces every API call with a fixed
//! delay to stay under the catalog's rate limit (~6-7 requests per second
//! with the default 150ms).

use super::credentials::{ClientCredentials, CredentialProvider};
use super::models::{PagingObject, SearchResponse, TokenResponse};
use super::{CatalogApi, CatalogError, Page, RawPlaylist, RawPlaylistItem};
use crate::harvest::HarvestError;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Tokens are refreshed this long before their declared expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct CatalogClientSettings {
    pub api_base_url: String,
    pub token_url: String,
    pub request_timeout: Duration,
    /// Delay applied before every API call.
    pub rate_limit_delay: Duration,
}

impl Default for CatalogClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            rate_limit_delay: Duration::from_millis(150),
        }
    }
}

/// Fixed-delay pacing shared by every call of a client.
///
/// Callers are serialized while they wait, so calls issued through the same
/// pacer are always at least `delay` apart.
pub struct CallPacer {
    delay: Duration,
    gate: Mutex<()>,
}

impl CallPacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            gate: Mutex::new(()),
        }
    }

    /// Waits the configured delay. Call right before issuing a request.
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        let _guard = self.gate.lock().await;
        tokio::time::sleep(self.delay).await;
    }
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct SpotifyCatalogClient {
    client: reqwest::Client,
    api_base: Url,
    token_url: String,
    credentials: ClientCredentials,
    pacer: CallPacer,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyCatalogClient {
    /// Create a client, resolving credentials up front.
    ///
    /// Missing credentials are reported here, before any network call.
    pub fn new(
        settings: CatalogClientSettings,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self, HarvestError> {
        let credentials = credentials.credentials()?;

        let api_base = Url::parse(settings.api_base_url.trim_end_matches('/')).map_err(|e| {
            CatalogError::Transport(format!(
                "Invalid API base URL {}: {}",
                settings.api_base_url, e
            ))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(CatalogError::Transport(format!(
                "API base URL cannot be a base: {}",
                settings.api_base_url
            ))
            .into());
        }

        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(concat!("playlist-harvester/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CatalogError::from)?;

        Ok(Self {
            client,
            api_base,
            token_url: settings.token_url,
            credentials,
            pacer: CallPacer::new(settings.rate_limit_delay),
            token: Mutex::new(None),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::Transport("API base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn access_token(&self) -> Result<String, CatalogError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Requesting catalog access token");
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Auth(format!(
                "token endpoint returned {}: {}",
                status,
                truncate(&body, 200)
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Decode(format!("token response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + lifetime,
        });
        Ok(access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        self.pacer.wait().await;
        let token = self.access_token().await?;

        trace!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| CatalogError::Decode(e.to_string()));
        }

        match status {
            StatusCode::UNAUTHORIZED => {
                self.invalidate_token().await;
                Err(CatalogError::Auth(format!("{} rejected access token", url.path())))
            }
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound(url.path().to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(CatalogError::RateLimited {
                retry_after: parse_retry_after(response.headers()),
            }),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(CatalogError::Http {
                    status: status.as_u16(),
                    message: truncate(&body, 200),
                })
            }
        }
    }
}

#[async_trait]
impl CatalogApi for SpotifyCatalogClient {
    async fn search_playlists(
        &self,
        query: &str,
        page_size: u32,
    ) -> Result<Page<RawPlaylist>, CatalogError> {
        let url = self.endpoint(&["search"])?;
        let response: SearchResponse = self
            .get_json(
                url,
                &[
                    ("q", query.to_string()),
                    ("type", "playlist".to_string()),
                    ("limit", page_size.to_string()),
                ],
            )
            .await?;

        Ok(decode_items(response.playlists.unwrap_or_default(), "playlist"))
    }

    async fn list_playlist_tracks(
        &self,
        playlist_id: &str,
        page_size: u32,
        offset: u32,
    ) -> Result<Page<RawPlaylistItem>, CatalogError> {
        let url = self.endpoint(&["playlists", playlist_id, "tracks"])?;
        let response: PagingObject = self
            .get_json(
                url,
                &[
                    ("limit", page_size.to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?;

        Ok(decode_items(response, "playlist item"))
    }
}

/// Decode each entry on its own, skipping nulls and malformed entries.
fn decode_items<T: DeserializeOwned>(paging: PagingObject, kind: &str) -> Page<T> {
    let returned = paging.items.len();
    let items = paging
        .items
        .into_iter()
        .filter(|value| !value.is_null())
        .filter_map(|value| match serde_json::from_value::<T>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("Skipping malformed {}: {}", kind, e);
                None
            }
        })
        .collect();

    Page {
        items,
        returned,
        total: paging.total,
    }
}

fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
