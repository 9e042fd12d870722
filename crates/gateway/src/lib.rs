//! # Navproof Gateway
//!
//! Network access to snapshot bytes. The `GatewayFetcher` resolves a content
//! pointer across interchangeable mirrors; the `BulkClient` reads the whole
//! history from the bulk snapshot API.
//!
//! Neither component retries. A failed pointer resolution surfaces as
//! `GatewayError::AllMirrorsExhausted` and the caller decides what to do.

use async_trait::async_trait;

pub mod bulk;
pub mod error;
pub mod fetcher;
pub mod pointer;

// --- Public API ---
pub use bulk::{BulkClient, BulkRecord};
pub use error::GatewayError;
pub use fetcher::GatewayFetcher;
pub use pointer::{ContentPointer, MirrorSet};

/// Raw bytes of one successful mirror request and where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub bytes: Vec<u8>,
    pub source_url: String,
}

/// The abstract interface for resolving a content pointer to bytes.
/// The snapshot loader depends on this trait, allowing the mirror-backed
/// implementation to be swapped out in tests.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, pointer: &ContentPointer) -> Result<FetchedContent, GatewayError>;
}
