use crate::error::ConfigError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    BulkConfig, Config, GatewayConfig, LoaderConfig, LogFormat, LoggingConfig, RegistryConfig,
    ReportingConfig,
};

/// Prefix of environment overrides, e.g. `NAVPROOF_GATEWAY__TIMEOUT_SECS=5`.
const ENV_PREFIX: &str = "NAVPROOF";

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. The file is
/// optional; environment variables are layered on top and the result is
/// validated before it is returned.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Same as [`load_config`] with an explicit file path.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    tracing::debug!(path = %path.display(), "Loading configuration");
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false));
    finish(builder)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Config, ConfigError> {
    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = settings.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

/// Rejects configurations the fetcher or the analytics could not run with.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let gateway = &config.gateway;

    if gateway.whole_object_mirrors.is_empty() || gateway.path_mirrors.is_empty() {
        return Err(ConfigError::ValidationError(
            "gateway mirror lists must not be empty".to_string(),
        ));
    }
    if let Some(bad) = gateway.whole_object_mirrors.iter().find(|t| !t.contains("{cid}")) {
        return Err(ConfigError::ValidationError(format!(
            "whole-object mirror '{}' is missing the {{cid}} placeholder",
            bad
        )));
    }
    if let Some(bad) = gateway
        .path_mirrors
        .iter()
        .find(|t| !t.contains("{root}") || !t.contains("{path}"))
    {
        return Err(ConfigError::ValidationError(format!(
            "path mirror '{}' needs both {{root}} and {{path}} placeholders",
            bad
        )));
    }
    if gateway.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "gateway.timeout_secs must be positive".to_string(),
        ));
    }
    if config.loader.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "loader.max_attempts must be at least 1".to_string(),
        ));
    }
    if config.reporting.tz().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "unknown reporting time zone '{}'",
            config.reporting.timezone
        )));
    }

    Ok(())
}
