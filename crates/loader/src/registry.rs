use crate::error::RegistryError;
use async_trait::async_trait;
use core_types::{Digest, SnapshotDescriptor};
use serde::Deserialize;
use std::path::Path;

/// Read-only view of the append-only snapshot registry.
#[async_trait]
pub trait RegistryReader: Send + Sync {
    /// Number of anchored snapshots.
    async fn count(&self) -> Result<u64, RegistryError>;

    /// The most recently anchored snapshot.
    async fn latest(&self) -> Result<SnapshotDescriptor, RegistryError>;

    async fn by_index(&self, index: u64) -> Result<SnapshotDescriptor, RegistryError>;
}

/// One entry of a registry manifest file.
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    content_pointer: String,
    #[serde(default)]
    expected_hash: Option<String>,
    timestamp_seconds: i64,
}

/// A registry held in memory, typically loaded from a JSON manifest exported
/// from the ledger.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entries: Vec<SnapshotDescriptor>,
}

impl StaticRegistry {
    pub fn new(entries: Vec<SnapshotDescriptor>) -> Self {
        Self { entries }
    }

    /// Reads a manifest file: a JSON array of
    /// `{content_pointer, expected_hash, timestamp_seconds}` objects.
    pub fn from_manifest(path: &Path) -> Result<Self, RegistryError> {
        let text = std::fs::read_to_string(path)?;
        let registry = Self::from_manifest_str(&text)?;
        tracing::info!(path = %path.display(), entries = registry.entries.len(), "Registry manifest loaded");
        Ok(registry)
    }

    pub fn from_manifest_str(text: &str) -> Result<Self, RegistryError> {
        let raw: Vec<ManifestEntry> = serde_json::from_str(text)?;

        let entries = raw
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let expected_hash = match entry.expected_hash.as_deref() {
                    Some(hex) if !hex.trim().is_empty() => Digest::from_hex(hex)
                        .map_err(|e| RegistryError::InvalidHash {
                            index: index as u64,
                            reason: e.to_string(),
                        })?
                        .anchored(),
                    _ => None,
                };
                Ok(SnapshotDescriptor {
                    content_pointer: entry.content_pointer,
                    expected_hash,
                    timestamp_seconds: entry.timestamp_seconds,
                })
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;

        Ok(Self { entries })
    }
}

#[async_trait]
impl RegistryReader for StaticRegistry {
    async fn count(&self) -> Result<u64, RegistryError> {
        Ok(self.entries.len() as u64)
    }

    async fn latest(&self) -> Result<SnapshotDescriptor, RegistryError> {
        self.entries.last().cloned().ok_or(RegistryError::Empty)
    }

    async fn by_index(&self, index: u64) -> Result<SnapshotDescriptor, RegistryError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .cloned()
            .ok_or(RegistryError::IndexOutOfRange {
                index,
                count: self.entries.len() as u64,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"[
        { "content_pointer": "bafyone", "expected_hash": "0x0000000000000000000000000000000000000000000000000000000000000000", "timestamp_seconds": 1706821200 },
        { "content_pointer": "bafyroot/two.json", "expected_hash": "ABABABABABABABABABABABABABABABABABABABABABABABABABABABABABABABAB", "timestamp_seconds": 1706907600 },
        { "content_pointer": "bafythree", "timestamp_seconds": 1706994000 }
    ]"#;

    #[tokio::test]
    async fn manifest_entries_are_normalized() {
        let registry = StaticRegistry::from_manifest_str(MANIFEST).unwrap();

        assert_eq!(registry.count().await.unwrap(), 3);

        let first = registry.by_index(0).await.unwrap();
        assert_eq!(first.expected_hash, None);

        let second = registry.by_index(1).await.unwrap();
        assert_eq!(second.expected_hash.unwrap().to_hex(), "ab".repeat(32));
        assert_eq!(second.content_pointer, "bafyroot/two.json");

        let latest = registry.latest().await.unwrap();
        assert_eq!(latest.content_pointer, "bafythree");
        assert_eq!(latest.expected_hash, None);
    }

    #[tokio::test]
    async fn out_of_range_and_empty_registries_fail() {
        let registry = StaticRegistry::from_manifest_str(MANIFEST).unwrap();
        assert!(matches!(
            registry.by_index(3).await,
            Err(RegistryError::IndexOutOfRange { index: 3, count: 3 })
        ));

        let empty = StaticRegistry::default();
        assert!(matches!(empty.latest().await, Err(RegistryError::Empty)));
    }

    #[test]
    fn malformed_hash_is_rejected() {
        let err = StaticRegistry::from_manifest_str(
            r#"[{ "content_pointer": "x", "expected_hash": "abc", "timestamp_seconds": 0 }]"#,
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidHash { index: 0, .. }));
    }
}
