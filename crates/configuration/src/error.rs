use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file or a `NAVPROOF_*` override could not be read or deserialized.
    #[error("Failed to load configuration from file or environment: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}
