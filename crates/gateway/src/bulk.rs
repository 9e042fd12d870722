use crate::error::GatewayError;
use chrono::DateTime;
use core_types::{Digest, VerifiedSnapshot};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// One record of the bulk snapshot API.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkRecord {
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub as_of_utc: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl BulkRecord {
    /// Bulk records come from a controlled channel and are trusted as verified.
    /// Returns `None` when the as-of instant is missing or cannot be parsed.
    pub fn into_snapshot(self) -> Option<VerifiedSnapshot> {
        let as_of_utc = self.as_of_utc?;
        let as_of = DateTime::parse_from_rfc3339(&as_of_utc).ok()?;
        let expected_hash = self.sha256.as_deref().and_then(|h| Digest::from_hex(h).ok());
        let pointer = match &expected_hash {
            Some(hash) => format!("bulk:{}", hash),
            None => format!("bulk:{}", as_of_utc),
        };

        Some(VerifiedSnapshot::new(
            pointer,
            expected_hash,
            as_of.timestamp_millis(),
            self.data,
            true,
        ))
    }
}

/// A client for the bulk snapshot API, which returns the whole history in
/// one read.
#[derive(Clone)]
pub struct BulkClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl BulkClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    /// Fetches all snapshots, degrading any failure to an empty list.
    pub async fn fetch_snapshots(&self) -> Vec<VerifiedSnapshot> {
        match self.try_fetch_snapshots().await {
            Ok(snapshots) => {
                tracing::info!(count = snapshots.len(), url = %self.url, "Bulk snapshots received");
                snapshots
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %self.url, "Bulk snapshot request failed");
                Vec::new()
            }
        }
    }

    /// Fetches all snapshots in the order the API returns them.
    pub async fn try_fetch_snapshots(&self) -> Result<Vec<VerifiedSnapshot>, GatewayError> {
        let network = |source: reqwest::Error| GatewayError::Network {
            url: self.url.clone(),
            source,
        };

        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(network)?;
        parse_bulk(&text)
    }
}

/// Parses a bulk response body.
///
/// Only a body that is not a JSON array fails. Individual records that are
/// malformed or carry no usable as-of instant are skipped.
pub fn parse_bulk(text: &str) -> Result<Vec<VerifiedSnapshot>, GatewayError> {
    let items: Vec<Value> =
        serde_json::from_str(text).map_err(|e| GatewayError::Deserialization(e.to_string()))?;

    let total = items.len();
    let snapshots: Vec<VerifiedSnapshot> = items
        .into_iter()
        .filter_map(|item| BulkRecord::deserialize(item).ok())
        .filter_map(BulkRecord::into_snapshot)
        .collect();

    if snapshots.len() < total {
        tracing::debug!(skipped = total - snapshots.len(), "Skipped malformed bulk records");
    }

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_becomes_trusted_snapshot() {
        let record: BulkRecord = serde_json::from_value(json!({
            "sha256": format!("0x{}", "AB".repeat(32)),
            "as_of_utc": "2024-02-01T21:00:00Z",
            "data": { "payload": { "accounts": {} } }
        }))
        .unwrap();

        let snapshot = record.into_snapshot().unwrap();
        assert!(snapshot.is_verified());
        assert_eq!(snapshot.expected_hash().unwrap().to_hex(), "ab".repeat(32));
        assert_eq!(snapshot.timestamp_millis(), 1_706_821_200_000);
        assert_eq!(snapshot.content_pointer(), format!("bulk:{}", "ab".repeat(32)));
    }

    #[test]
    fn unparseable_instant_is_skipped() {
        let record = BulkRecord {
            sha256: None,
            as_of_utc: Some("yesterday".to_string()),
            data: json!({}),
        };
        assert!(record.into_snapshot().is_none());
    }

    #[test]
    fn bad_records_do_not_drop_the_batch() {
        let body = r#"[
            {"sha256":null,"as_of_utc":"2024-02-01T21:00:00Z","data":{"payload":{"accounts":{}}}},
            {"sha256":null,"as_of_utc":null,"data":{}},
            {"sha256":"ab","data":{}},
            {"as_of_utc":17,"data":{}},
            "not a record",
            {"as_of_utc":"2024-02-02T21:00:00Z"}
        ]"#;

        let snapshots = parse_bulk(body).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].timestamp_millis(), 1_706_821_200_000);
        assert_eq!(snapshots[0].content_pointer(), "bulk:2024-02-01T21:00:00Z");
        assert_eq!(snapshots[1].payload(), &Value::Null);
    }

    #[test]
    fn non_array_body_is_a_deserialization_error() {
        assert!(matches!(parse_bulk("{}"), Err(GatewayError::Deserialization(_))));
        assert!(matches!(parse_bulk("<html>"), Err(GatewayError::Deserialization(_))));
    }
}
