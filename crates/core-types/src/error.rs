use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid digest '{0}': {1}")]
    InvalidDigest(String, String),
}
