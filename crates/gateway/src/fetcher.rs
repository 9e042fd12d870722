use crate::error::GatewayError;
use crate::pointer::{ContentPointer, MirrorSet};
use crate::{ContentFetcher, FetchedContent};
use async_trait::async_trait;
use configuration::GatewayConfig;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Resolves content pointers against an ordered list of mirrors.
///
/// Mirrors are tried strictly one after another. Each request runs under its
/// own timeout; expiry aborts that request only and the next mirror is tried.
/// There are no retries here, the snapshot loader owns the retry budget.
#[derive(Clone)]
pub struct GatewayFetcher {
    client: reqwest::Client,
    mirrors: MirrorSet,
    timeout: Duration,
}

impl GatewayFetcher {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|source| GatewayError::Network {
                url: String::new(),
                source,
            })?;

        Ok(Self {
            client,
            mirrors: MirrorSet::from_config(config),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn mirrors(&self) -> &MirrorSet {
        &self.mirrors
    }

    /// One request against one mirror, bounded by the timeout.
    async fn fetch_from(&self, url: &str) -> Result<Vec<u8>, GatewayError> {
        let request = async {
            let network = |source: reqwest::Error| GatewayError::Network {
                url: url.to_string(),
                source,
            };

            let response = self.client.get(url).send().await.map_err(network)?;
            let status = response.status();
            if !status.is_success() {
                return Err(GatewayError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let html_content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value.to_ascii_lowercase().contains("text/html"));

            let body = response.bytes().await.map_err(network)?;
            if html_content_type || looks_like_html(&body) {
                return Err(GatewayError::HtmlPayload { url: url.to_string() });
            }

            Ok::<_, GatewayError>(body.to_vec())
        };

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| GatewayError::Timeout {
                url: url.to_string(),
                after_ms: self.timeout.as_millis(),
            })?
    }
}

#[async_trait]
impl ContentFetcher for GatewayFetcher {
    async fn fetch(&self, pointer: &ContentPointer) -> Result<FetchedContent, GatewayError> {
        let urls = self.mirrors.expand(pointer);
        if urls.is_empty() {
            return Err(GatewayError::NoMirrors);
        }

        let mut last_error = GatewayError::NoMirrors;
        for (position, url) in urls.iter().enumerate() {
            match self.fetch_from(url).await {
                Ok(bytes) => {
                    tracing::debug!(%pointer, %url, size = bytes.len(), "Fetched content from mirror");
                    return Ok(FetchedContent {
                        bytes,
                        source_url: url.clone(),
                    });
                }
                Err(e) => {
                    tracing::warn!(%pointer, mirror = position + 1, error = %e, "Mirror attempt failed");
                    last_error = e;
                }
            }
        }

        Err(GatewayError::AllMirrorsExhausted {
            pointer: pointer.to_string(),
            attempts: urls.len(),
            last: Box::new(last_error),
        })
    }
}

/// Gateways answer missing or rate-limited content with an HTML page and,
/// occasionally, a success status.
fn looks_like_html(body: &[u8]) -> bool {
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|first| *first == b'<')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_html_by_first_significant_byte() {
        assert!(looks_like_html(b"  \n<!DOCTYPE html><html></html>"));
        assert!(looks_like_html(b"<html>"));
        assert!(!looks_like_html(b"{\"sha256\":\"ab\"}"));
        assert!(!looks_like_html(b"   "));
        assert!(!looks_like_html(b""));
    }
}
