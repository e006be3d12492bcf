//! HTTP sync client for talking to a notesync server.

use reqwest::StatusCode;
use thiserror::Error;

use super::cursor::CursorError;
use super::fragment::SyncFragment;
use super::pull::FragmentSource;
use super::state::SyncState;
use crate::config::SyncConfig;
use crate::presenters::ErrorResponse;

#[derive(Error, Debug)]
pub enum SyncClientError {
    #[error("Sync not configured. Add sync.server_url and sync.api_key to config.")]
    NotConfigured,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned {status}: {message}")]
    Server { status: StatusCode, message: String },
    #[error(transparent)]
    Cursor(#[from] CursorError),
}

/// Sync client for one user's account on a notesync server.
#[derive(Debug, Clone)]
pub struct SyncClient {
    server_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl SyncClient {
    /// Creates a new sync client with explicit parameters.
    pub fn new(server_url: String, api_key: String) -> Self {
        Self {
            server_url,
            api_key,
            http: reqwest::Client::new(),
        }
    }

    /// Creates a sync client from config.
    ///
    /// Returns an error if sync is not configured.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncClientError> {
        let server_url = config
            .server_url
            .clone()
            .ok_or(SyncClientError::NotConfigured)?;
        let api_key = config
            .api_key
            .clone()
            .ok_or(SyncClientError::NotConfigured)?;

        Ok(Self::new(server_url, api_key))
    }

    /// Builds the URL of an API path on the configured server.
    fn build_url(&self, path: &str) -> String {
        let base_url = self.server_url.trim_end_matches('/');
        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url.to_string()
        } else {
            format!("http://{}", base_url)
        };

        format!("{}{}", base_url, path)
    }

    pub async fn get_sync_state(&self) -> Result<SyncState, SyncClientError> {
        let response = self
            .http
            .get(self.build_url("/v3/sync/state"))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Self::parse(response).await
    }

    pub async fn get_fragment(
        &self,
        after_usn: i64,
        limit: i64,
    ) -> Result<SyncFragment, SyncClientError> {
        let response = self
            .http
            .get(self.build_url("/v3/sync/fragment"))
            .query(&[("after_usn", after_usn), ("limit", limit)])
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SyncClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(error) => error.message,
            Err(_) => body,
        };

        tracing::warn!("Sync request failed with {}: {}", status, message);
        Err(SyncClientError::Server { status, message })
    }
}

impl FragmentSource for SyncClient {
    type Error = SyncClientError;

    async fn sync_state(&self) -> Result<SyncState, SyncClientError> {
        self.get_sync_state().await
    }

    async fn fragment(&self, after_usn: i64, limit: i64) -> Result<SyncFragment, SyncClientError> {
        self.get_fragment(after_usn, limit).await
    }
}
