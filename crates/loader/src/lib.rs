//! # Navproof Snapshot Loader
//!
//! Turns a registry index into a `VerifiedSnapshot`. The loader reads the
//! descriptor from a `RegistryReader`, fetches the bytes through a
//! `ContentFetcher` and checks them with the `HashVerifier`, retrying whole
//! attempts up to the configured budget.
//!
//! Exhaustion is a soft failure: callers get `None` (or an explicit
//! `LoadOutcome::Exhausted` with the evidence) and decide how to present it.

pub mod error;
pub mod loader;
pub mod registry;

pub use error::{LoadError, RegistryError};
pub use loader::{AttemptResult, LoadOutcome, SnapshotLoader};
pub use registry::{RegistryReader, StaticRegistry};
