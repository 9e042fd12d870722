//! # Navproof Core Types
//!
//! The shared vocabulary of the workspace. Every other crate speaks in terms of
//! the structs defined here: registry descriptors, verified snapshots, the
//! typed view of a snapshot record and the points of the equity curve.
//!
//! This crate has no knowledge of the network, the registry or the analytics
//! formulas. It only defines data and the invariants that travel with it.

pub mod digest;
pub mod error;
pub mod record;
pub mod series;
pub mod snapshot;

// Re-export the core types to provide a clean public API.
pub use digest::Digest;
pub use error::CoreError;
pub use record::{AccountMap, AccountMetrics, Position, SnapshotRecord, AGGREGATE_ACCOUNT_KEY};
pub use series::{DrawdownPoint, EquityPoint, ReturnPoint, WealthIndexPoint};
pub use snapshot::{SnapshotDescriptor, VerifiedSnapshot};
