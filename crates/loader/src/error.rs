use gateway::GatewayError;
use thiserror::Error;
use verifier::VerifierError;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read the registry manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse the registry manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid expected hash for entry {index}: {reason}")]
    InvalidHash { index: u64, reason: String },

    #[error("Snapshot index {index} is out of range (registry holds {count})")]
    IndexOutOfRange { index: u64, count: u64 },

    #[error("The registry holds no snapshots")]
    Empty,
}

/// Why one load attempt did not produce a payload.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Registry read failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("Fetch failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Payload rejected: {0}")]
    Verifier(#[from] VerifierError),
}
