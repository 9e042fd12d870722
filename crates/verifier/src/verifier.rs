use crate::canonical::canonical_bytes;
use crate::error::VerifierError;
use core_types::Digest;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest as _, Sha256};

/// The record field holding the producer's own digest of the record.
pub const EMBEDDED_DIGEST_FIELD: &str = "sha256";

pub fn sha256(bytes: &[u8]) -> Digest {
    let hash: [u8; 32] = Sha256::digest(bytes).into();
    Digest::new(hash)
}

/// Which comparison decided the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationMode {
    /// No expected digest and no embedded digest matched.
    None,
    /// Raw bytes compared against the registry's digest.
    OnChainBytes,
    /// Raw bytes matched the record's embedded digest.
    EmbeddedBytes,
    /// The canonical form matched the record's embedded digest.
    EmbeddedCanonical,
}

impl VerificationMode {
    /// Applies the decision order and returns `(ok, mode)`.
    ///
    /// A registry digest is authoritative: when present, the embedded digest
    /// is never consulted and a mismatch is reported as `(false, OnChainBytes)`.
    pub fn decide(
        raw: &Digest,
        canonical: &Digest,
        expected: Option<&Digest>,
        embedded: Option<&Digest>,
    ) -> (bool, VerificationMode) {
        if let Some(expected) = expected {
            return (raw == expected, VerificationMode::OnChainBytes);
        }
        match embedded {
            Some(embedded) if embedded == raw => (true, VerificationMode::EmbeddedBytes),
            Some(embedded) if embedded == canonical => (true, VerificationMode::EmbeddedCanonical),
            _ => (false, VerificationMode::None),
        }
    }
}

impl std::fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            VerificationMode::None => "none",
            VerificationMode::OnChainBytes => "on-chain bytes",
            VerificationMode::EmbeddedBytes => "embedded bytes",
            VerificationMode::EmbeddedCanonical => "embedded canonical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub ok: bool,
    pub mode: VerificationMode,
    pub raw_digest: Digest,
    pub canonical_digest: Digest,
    pub source_url: Option<String>,
}

impl VerificationResult {
    pub fn with_source(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}

/// The outcome of verifying one byte payload, together with the parsed record.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub result: VerificationResult,
    pub payload: Value,
}

/// A stateless checker of snapshot bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashVerifier {}

impl HashVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and verifies `bytes`.
    ///
    /// Fails only when the bytes are not JSON. Mismatches come back as
    /// `ok = false`.
    pub fn verify(&self, bytes: &[u8], expected: Option<&Digest>) -> Result<Verification, VerifierError> {
        let payload: Value = serde_json::from_slice(bytes)?;

        let raw_digest = sha256(bytes);
        let canonical_digest = Self::canonical_digest(&payload);
        let embedded = Self::embedded_digest(&payload);

        let (ok, mode) = VerificationMode::decide(&raw_digest, &canonical_digest, expected, embedded.as_ref());
        tracing::debug!(ok, %mode, raw = %raw_digest, canonical = %canonical_digest, "Snapshot verification decided");

        Ok(Verification {
            result: VerificationResult {
                ok,
                mode,
                raw_digest,
                canonical_digest,
                source_url: None,
            },
            payload,
        })
    }

    /// Digest of the canonical form with the embedded digest field removed.
    pub fn canonical_digest(payload: &Value) -> Digest {
        match payload {
            Value::Object(map) if map.contains_key(EMBEDDED_DIGEST_FIELD) => {
                let mut stripped = map.clone();
                stripped.remove(EMBEDDED_DIGEST_FIELD);
                sha256(&canonical_bytes(&Value::Object(stripped)))
            }
            other => sha256(&canonical_bytes(other)),
        }
    }

    /// The record's self-embedded digest, if present and well formed.
    pub fn embedded_digest(payload: &Value) -> Option<Digest> {
        payload
            .get(EMBEDDED_DIGEST_FIELD)
            .and_then(Value::as_str)
            .and_then(|hex| Digest::from_hex(hex).ok())
    }
}
