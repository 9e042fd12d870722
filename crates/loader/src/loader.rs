use crate::error::LoadError;
use crate::registry::RegistryReader;
use configuration::LoaderConfig;
use core_types::{Digest, SnapshotDescriptor, VerifiedSnapshot};
use gateway::{ContentFetcher, ContentPointer};
use std::sync::Arc;
use std::time::Duration;
use verifier::{HashVerifier, Verification, VerificationResult};

/// The result of a single fetch-and-verify attempt.
#[derive(Debug)]
pub enum AttemptResult {
    /// A structured payload was obtained. Verification may still have failed.
    Success(Verification),
    /// Fetching or parsing failed; another attempt may succeed.
    Retryable(LoadError),
}

/// The result of loading one snapshot across the whole retry budget.
#[derive(Debug)]
pub enum LoadOutcome {
    Success {
        snapshot: VerifiedSnapshot,
        verification: VerificationResult,
        attempts: u32,
    },
    Exhausted {
        attempts: u32,
        failures: Vec<LoadError>,
    },
}

impl LoadOutcome {
    pub fn snapshot(&self) -> Option<&VerifiedSnapshot> {
        match self {
            LoadOutcome::Success { snapshot, .. } => Some(snapshot),
            LoadOutcome::Exhausted { .. } => None,
        }
    }

    pub fn into_snapshot(self) -> Option<VerifiedSnapshot> {
        match self {
            LoadOutcome::Success { snapshot, .. } => Some(snapshot),
            LoadOutcome::Exhausted { .. } => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            LoadOutcome::Success { attempts, .. } | LoadOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn last_error(&self) -> Option<&LoadError> {
        match self {
            LoadOutcome::Success { .. } => None,
            LoadOutcome::Exhausted { failures, .. } => failures.last(),
        }
    }
}

/// Loads one snapshot at a time: registry lookup, mirror fetch, verification.
///
/// Attempts run strictly one after another. Failures are absorbed and
/// reported as `LoadOutcome::Exhausted` (or `None` from [`SnapshotLoader::load`]);
/// nothing is propagated to the caller as an error.
pub struct SnapshotLoader {
    registry: Arc<dyn RegistryReader>,
    fetcher: Arc<dyn ContentFetcher>,
    verifier: HashVerifier,
    max_attempts: u32,
    retry_delay: Duration,
}

impl SnapshotLoader {
    pub fn new(
        registry: Arc<dyn RegistryReader>,
        fetcher: Arc<dyn ContentFetcher>,
        config: &LoaderConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            verifier: HashVerifier::new(),
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    pub fn registry(&self) -> &Arc<dyn RegistryReader> {
        &self.registry
    }

    /// Loads the snapshot at `index`, or `None` when it is unavailable.
    pub async fn load(&self, index: u64) -> Option<VerifiedSnapshot> {
        let outcome = self.load_with_outcome(index).await;
        Self::report(&index.to_string(), outcome)
    }

    /// Loads the most recently anchored snapshot, or `None` when unavailable.
    pub async fn load_latest(&self) -> Option<VerifiedSnapshot> {
        let outcome = self.load_latest_with_outcome().await;
        Self::report("latest", outcome)
    }

    /// Loads the given indices one after another, keeping input order and
    /// skipping those that are unavailable.
    pub async fn load_range(&self, indices: impl IntoIterator<Item = u64>) -> Vec<VerifiedSnapshot> {
        let mut snapshots = Vec::new();
        for index in indices {
            if let Some(snapshot) = self.load(index).await {
                snapshots.push(snapshot);
            }
        }
        snapshots
    }

    pub async fn load_with_outcome(&self, index: u64) -> LoadOutcome {
        match self.registry.by_index(index).await {
            Ok(descriptor) => self.load_descriptor(&descriptor).await,
            Err(e) => LoadOutcome::Exhausted {
                attempts: 0,
                failures: vec![e.into()],
            },
        }
    }

    pub async fn load_latest_with_outcome(&self) -> LoadOutcome {
        match self.registry.latest().await {
            Ok(descriptor) => self.load_descriptor(&descriptor).await,
            Err(e) => LoadOutcome::Exhausted {
                attempts: 0,
                failures: vec![e.into()],
            },
        }
    }

    /// Runs the attempt loop for an already resolved descriptor.
    pub async fn load_descriptor(&self, descriptor: &SnapshotDescriptor) -> LoadOutcome {
        let pointer = match ContentPointer::parse(&descriptor.content_pointer) {
            Ok(pointer) => pointer,
            Err(e) => {
                return LoadOutcome::Exhausted {
                    attempts: 0,
                    failures: vec![e.into()],
                };
            }
        };
        let expected = descriptor.expected_hash.and_then(Digest::anchored);

        let mut failures = Vec::new();
        for attempt in 1..=self.max_attempts {
            match self.attempt(&pointer, expected.as_ref()).await {
                AttemptResult::Success(verification) => {
                    let snapshot = VerifiedSnapshot::new(
                        descriptor.content_pointer.clone(),
                        expected,
                        descriptor.timestamp_millis(),
                        verification.payload,
                        verification.result.ok,
                    );
                    return LoadOutcome::Success {
                        snapshot,
                        verification: verification.result,
                        attempts: attempt,
                    };
                }
                AttemptResult::Retryable(e) => {
                    tracing::debug!(%pointer, attempt, error = %e, "Snapshot attempt failed");
                    failures.push(e);
                    if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        LoadOutcome::Exhausted {
            attempts: self.max_attempts,
            failures,
        }
    }

    async fn attempt(&self, pointer: &ContentPointer, expected: Option<&Digest>) -> AttemptResult {
        let fetched = match self.fetcher.fetch(pointer).await {
            Ok(fetched) => fetched,
            Err(e) => return AttemptResult::Retryable(e.into()),
        };

        match self.verifier.verify(&fetched.bytes, expected) {
            Ok(mut verification) => {
                verification.result = verification.result.with_source(fetched.source_url);
                AttemptResult::Success(verification)
            }
            Err(e) => AttemptResult::Retryable(e.into()),
        }
    }

    /// Converts an outcome into the soft-failing view, logging the evidence.
    fn report(label: &str, outcome: LoadOutcome) -> Option<VerifiedSnapshot> {
        match outcome {
            LoadOutcome::Success {
                snapshot,
                verification,
                attempts,
            } => {
                if verification.ok {
                    tracing::info!(snapshot = label, mode = %verification.mode, attempts, "Snapshot verified");
                } else {
                    tracing::warn!(
                        snapshot = label,
                        mode = %verification.mode,
                        raw = %verification.raw_digest,
                        source = verification.source_url.as_deref().unwrap_or("-"),
                        "Snapshot loaded but failed verification"
                    );
                }
                Some(snapshot)
            }
            LoadOutcome::Exhausted { attempts, failures } => {
                let last = failures
                    .last()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "no attempt was made".to_string());
                tracing::warn!(snapshot = label, attempts, error = %last, "Snapshot unavailable");
                None
            }
        }
    }
}
