use crate::digest::Digest;
use crate::record::SnapshotRecord;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One registry entry: where a snapshot lives and what it should hash to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDescriptor {
    pub content_pointer: String,
    /// `None` when the registry holds the all-zero "not yet anchored" value.
    pub expected_hash: Option<Digest>,
    pub timestamp_seconds: i64,
}

impl SnapshotDescriptor {
    /// Builds a descriptor from the raw registry triple, normalizing an
    /// all-zero hash to `None`.
    pub fn from_registry(content_pointer: impl Into<String>, expected_hash: [u8; 32], timestamp_seconds: i64) -> Self {
        Self {
            content_pointer: content_pointer.into(),
            expected_hash: Digest::new(expected_hash).anchored(),
            timestamp_seconds,
        }
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp_seconds.saturating_mul(1000)
    }
}

/// A snapshot whose bytes were fetched and checked, or which arrived through
/// the trusted bulk channel. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedSnapshot {
    content_pointer: String,
    expected_hash: Option<Digest>,
    timestamp_millis: i64,
    payload: Value,
    verified: bool,
}

impl VerifiedSnapshot {
    pub fn new(
        content_pointer: impl Into<String>,
        expected_hash: Option<Digest>,
        timestamp_millis: i64,
        payload: Value,
        verified: bool,
    ) -> Self {
        Self {
            content_pointer: content_pointer.into(),
            expected_hash,
            timestamp_millis,
            payload,
            verified,
        }
    }

    pub fn content_pointer(&self) -> &str {
        &self.content_pointer
    }

    pub fn expected_hash(&self) -> Option<&Digest> {
        self.expected_hash.as_ref()
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp_millis
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// The instant the snapshot reports on.
    ///
    /// Prefers the record's own `as_of_utc`; falls back to the anchoring
    /// timestamp when the record does not carry one.
    pub fn as_of(&self) -> Option<DateTime<Utc>> {
        self.payload
            .get("as_of_utc")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| Utc.timestamp_millis_opt(self.timestamp_millis).single())
    }

    /// The typed view of the payload.
    pub fn record(&self) -> SnapshotRecord {
        SnapshotRecord::from_value(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_hash_from_registry_is_absent() {
        let descriptor = SnapshotDescriptor::from_registry("bafy", [0u8; 32], 1_700_000_000);
        assert_eq!(descriptor.expected_hash, None);
        assert_eq!(descriptor.timestamp_millis(), 1_700_000_000_000);

        let mut bytes = [0u8; 32];
        bytes[31] = 7;
        let anchored = SnapshotDescriptor::from_registry("bafy", bytes, 0);
        assert_eq!(anchored.expected_hash, Some(Digest::new(bytes)));
    }

    #[test]
    fn as_of_prefers_record_field() {
        let snapshot = VerifiedSnapshot::new(
            "bafy",
            None,
            0,
            json!({ "as_of_utc": "2024-02-02T01:30:00Z" }),
            true,
        );
        assert_eq!(snapshot.as_of().unwrap().to_rfc3339(), "2024-02-02T01:30:00+00:00");
    }

    #[test]
    fn as_of_falls_back_to_anchor_time() {
        let snapshot = VerifiedSnapshot::new("bafy", None, 1_706_745_600_000, json!({}), false);
        assert_eq!(snapshot.as_of().unwrap().timestamp(), 1_706_745_600);
    }
}
