//! Source URL normalization
//!
//! Users paste anything from a bare host name to a deep link. The exporter
//! reduces it to scheme and host, prefers https, and confirms the site
//! answers before any run starts.

use super::client::{build_http_client, classify_transport_error};
use crate::config::SourceConfig;
use crate::domain::{Result, SourceError};
use reqwest::{Client, StatusCode};
use std::error::Error as StdError;
use url::Url;

/// Fragments of TLS library error messages that point at a failed handshake
///
/// Matched against the causes of a request error only. The top-level
/// message embeds the request URL, so a host name could match.
const TLS_MARKERS: [&str; 7] = [
    "certificate",
    "handshake",
    "corrupt message",
    "invalidcontenttype",
    "fatal alert",
    "peer misbehaved",
    "peer is incompatible",
];

/// Reduce `input` to `scheme://host[:port]`, assuming https when no scheme is given
pub fn origin_of(input: &str) -> std::result::Result<Url, SourceError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SourceError::InvalidUrl("empty URL".to_string()));
    }

    let with_scheme = if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&with_scheme)
        .map_err(|e| SourceError::InvalidUrl(format!("{trimmed}: {e}")))?;
    if parsed.host_str().is_none() {
        return Err(SourceError::InvalidUrl(format!("{trimmed}: missing host")));
    }

    let origin = parsed.origin().ascii_serialization();
    Url::parse(&origin).map_err(|e| SourceError::InvalidUrl(format!("{trimmed}: {e}")))
}

/// Whether a request failed during the TLS handshake
pub fn looks_like_tls_failure(err: &reqwest::Error) -> bool {
    err.source().map(causes_show_tls_failure).unwrap_or(false)
}

/// Whether `cause` or anything below it reads like a TLS library error
fn causes_show_tls_failure(cause: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(cause);
    while let Some(e) = current {
        let message = e.to_string().to_lowercase();
        if TLS_MARKERS.iter().any(|marker| message.contains(marker)) {
            return true;
        }
        current = e.source();
    }
    false
}

/// Normalize and probe a user-supplied source URL
///
/// Returns the origin that answered the probe with 200. When https fails
/// with a TLS error the same host is retried over plain http.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] for unparseable input and
/// [`SourceError::Unreachable`] when the probe answers with anything but 200.
pub async fn normalize_url(input: &str, config: &SourceConfig) -> Result<String> {
    let origin = origin_of(input)?;
    let client = build_http_client(config)?;

    let (url, status) = match probe(&client, &origin).await {
        Ok(status) => (origin, status),
        Err(e) if origin.scheme() == "https" && looks_like_tls_failure(&e) => {
            let mut fallback = origin.clone();
            fallback
                .set_scheme("http")
                .map_err(|_| SourceError::InvalidUrl(origin.to_string()))?;
            tracing::warn!(
                url = %origin,
                error = %e,
                "TLS failed, falling back to http"
            );
            let status = probe(&client, &fallback)
                .await
                .map_err(classify_transport_error)?;
            (fallback, status)
        }
        Err(e) => return Err(classify_transport_error(e).into()),
    };

    let normalized = url.as_str().trim_end_matches('/').to_string();
    if status != StatusCode::OK {
        return Err(SourceError::Unreachable {
            url: normalized,
            status: status.as_u16(),
        }
        .into());
    }

    tracing::info!(url = %normalized, "Source URL normalized");
    Ok(normalized)
}

async fn probe(client: &Client, url: &Url) -> std::result::Result<StatusCode, reqwest::Error> {
    client.get(url.clone()).send().await.map(|resp| resp.status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExportError;
    use std::fmt;

    #[test]
    fn test_origin_adds_https() {
        let url = origin_of("my-site.herokuapp.com").unwrap();
        assert_eq!(url.as_str(), "https://my-site.herokuapp.com/");
    }

    #[test]
    fn test_origin_strips_path_and_query() {
        let url = origin_of("https://my-site.herokuapp.com/api/v1/entries.json?count=10").unwrap();
        assert_eq!(url.as_str(), "https://my-site.herokuapp.com/");
    }

    #[test]
    fn test_origin_keeps_port_and_scheme() {
        let url = origin_of("http://localhost:1337/some/page").unwrap();
        assert_eq!(url.as_str(), "http://localhost:1337/");
    }

    #[test]
    fn test_origin_rejects_garbage() {
        assert!(origin_of("").is_err());
        assert!(origin_of("https://").is_err());
    }

    #[derive(Debug)]
    struct Wrapped {
        message: &'static str,
        inner: Option<Box<Wrapped>>,
    }

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.inner.as_deref().map(|e| e as &(dyn StdError + 'static))
        }
    }

    #[test]
    fn test_tls_detection_walks_the_chain() {
        let err = Wrapped {
            message: "error sending request",
            inner: Some(Box::new(Wrapped {
                message: "invalid peer certificate: UnknownIssuer",
                inner: None,
            })),
        };
        assert!(causes_show_tls_failure(&err));

        let plain = Wrapped {
            message: "tcp connect error",
            inner: Some(Box::new(Wrapped {
                message: "Connection refused (os error 111)",
                inner: None,
            })),
        };
        assert!(!causes_show_tls_failure(&plain));
    }

    #[tokio::test]
    async fn test_host_name_does_not_trigger_tls_classification() {
        // "classlab" contains "ssl"; ".invalid" never resolves
        let client = build_http_client(&SourceConfig::default()).unwrap();
        let err = client
            .get("https://classlab-certificate-handshake.invalid/")
            .send()
            .await
            .unwrap_err();

        assert!(!looks_like_tls_failure(&err));
        assert!(matches!(
            classify_transport_error(err),
            SourceError::Transport(_) | SourceError::Timeout(_)
        ));
    }

    #[tokio::test]
    async fn test_plain_http_site_is_reached_after_tls_failure() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        // mockito speaks plain http, so the https handshake fails
        let https = server.url().replacen("http://", "https://", 1);
        let normalized = normalize_url(&https, &SourceConfig::default()).await.unwrap();

        assert_eq!(normalized, server.url());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_refused_https_does_not_fall_back() {
        let err = normalize_url("https://127.0.0.1:9", &SourceConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExportError::Source(SourceError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_normalize_probes_the_origin() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let input = format!("{}/api/v1/status.json", server.url());
        let normalized = normalize_url(&input, &SourceConfig::default()).await.unwrap();

        assert_eq!(normalized, server.url());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_normalize_rejects_non_200() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(404)
            .create_async()
            .await;

        let err = normalize_url(&server.url(), &SourceConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExportError::Source(SourceError::Unreachable { status: 404, .. })
        ));
    }
}
