//! Nightscout REST client
//!
//! Implements [`RecordSource`] over the `/api/v1/<collection>.json`
//! endpoints. Each call issues exactly one GET; retries are the fetcher's
//! business.

use super::query::{base_params, window_params};
use super::url::looks_like_tls_failure;
use crate::config::{SecretString, SourceConfig};
use crate::core::fetch::{records_from_payload, RecordSource};
use crate::core::plan::Window;
use crate::domain::{DataType, ExportError, Result, SourceError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::time::Duration;

/// Longest response body excerpt kept in an error message
const BODY_EXCERPT_LEN: usize = 200;

/// Build the HTTP client shared by probes and collection requests
pub fn build_http_client(config: &SourceConfig) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .user_agent(concat!("nsexport/", env!("CARGO_PKG_VERSION")));

    if !config.tls_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| ExportError::Configuration(format!("Failed to build HTTP client: {e}")))
}

/// Map a transport-level failure to a source error
pub fn classify_transport_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout(err.to_string())
    } else if looks_like_tls_failure(&err) {
        SourceError::TlsHandshake(err.to_string())
    } else {
        SourceError::Transport(err.to_string())
    }
}

/// Client for one Nightscout site
///
/// # Example
///
/// ```no_run
/// use nightscout_export::adapters::nightscout::NightscoutClient;
/// use nightscout_export::config::SourceConfig;
///
/// # fn example() -> nightscout_export::domain::Result<()> {
/// let config = SourceConfig::default();
/// let client = NightscoutClient::new("https://my-site.herokuapp.com", &config)?;
/// # Ok(())
/// # }
/// ```
pub struct NightscoutClient {
    /// Normalized base URL, without trailing slash
    base_url: String,

    /// HTTP client for making requests
    client: Client,

    /// Value sent as `count`
    record_count: u64,

    /// Optional API token sent as `token`
    token: Option<SecretString>,
}

impl NightscoutClient {
    /// Create a client for `base_url` using the `[source]` settings
    pub fn new(base_url: impl Into<String>, config: &SourceConfig) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ExportError::Configuration(
                "Nightscout base URL cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            client: build_http_client(config)?,
            record_count: config.record_count,
            token: config.api_token.clone(),
        })
    }

    fn endpoint(&self, data_type: DataType) -> String {
        format!("{}{}", self.base_url, data_type.endpoint_path())
    }

    fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret().as_ref())
    }

    async fn get_json(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> std::result::Result<Value, SourceError> {
        let resp = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::TransientHttp {
                status: status.as_u16(),
                message: excerpt(&body),
            });
        }

        let bytes = resp.bytes().await.map_err(classify_transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| {
            SourceError::MalformedResponse(format!("{url}: {e} (body: {})", excerpt_bytes(&bytes)))
        })
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LEN).collect()
}

fn excerpt_bytes(bytes: &[u8]) -> String {
    excerpt(&String::from_utf8_lossy(bytes))
}

#[async_trait]
impl RecordSource for NightscoutClient {
    async fn fetch_window(
        &self,
        data_type: DataType,
        window: &Window,
    ) -> std::result::Result<Vec<Value>, SourceError> {
        let params = window_params(data_type, window, self.record_count, self.token());
        tracing::debug!(data_type = %data_type, window = %window, "Requesting window");

        let payload = self.get_json(&self.endpoint(data_type), &params).await?;
        let records = records_from_payload(payload)?;

        tracing::debug!(data_type = %data_type, records = records.len(), "Window retrieved");
        Ok(records)
    }

    async fn fetch_single(&self, data_type: DataType) -> std::result::Result<Value, SourceError> {
        let params = base_params(self.record_count, self.token());
        self.get_json(&self.endpoint(data_type), &params).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
