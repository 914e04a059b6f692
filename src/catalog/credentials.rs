//! Client credentials for the catalog API.

use crate::harvest::HarvestError;

pub const CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";

#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Source of catalog API credentials.
///
/// Failing to produce both values is a fatal precondition for a run.
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self) -> Result<ClientCredentials, HarvestError>;
}

/// Reads credentials from `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET`.
#[derive(Debug, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    /// Loads a `.env` file from the working directory (if any) before reading.
    pub fn with_dotenv() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {:?}", path),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Failed to load .env file: {}", e),
        }
        Self
    }

    fn read(var: &str) -> Option<String> {
        std::env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> Result<ClientCredentials, HarvestError> {
        let client_id = Self::read(CLIENT_ID_VAR);
        let client_secret = Self::read(CLIENT_SECRET_VAR);

        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(ClientCredentials {
                client_id,
                client_secret,
            }),
            (id, secret) => {
                let missing: Vec<&str> = [
                    id.is_none().then_some(CLIENT_ID_VAR),
                    secret.is_none().then_some(CLIENT_SECRET_VAR),
                ]
                .into_iter()
                .flatten()
                .collect();
                Err(HarvestError::MissingCredentials(missing.join(", ")))
            }
        }
    }
}

/// Fixed credentials, mostly useful for tests and embedding.
impl CredentialProvider for ClientCredentials {
    fn credentials(&self) -> Result<ClientCredentials, HarvestError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(HarvestError::MissingCredentials(
                "client id or secret is empty".to_string(),
            ));
        }
        Ok(self.clone())
    }
}
