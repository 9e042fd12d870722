use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("Snapshot bytes are not a valid JSON document: {0}")]
    Format(#[from] serde_json::Error),
}
