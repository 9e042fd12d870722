use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every section falls back to its defaults, so an empty configuration is
/// valid and points at the public mirrors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub loader: LoaderConfig,
    pub reporting: ReportingConfig,
    pub registry: RegistryConfig,
    pub bulk: BulkConfig,
    pub logging: LoggingConfig,
}

/// Mirror endpoints and the per-request budget of the gateway fetcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// URL templates for whole-object pointers. `{cid}` is replaced by the pointer.
    pub whole_object_mirrors: Vec<String>,
    /// URL templates for `<root>/<path>` pointers, using `{root}` and `{path}`.
    pub path_mirrors: Vec<String>,
    /// Timeout of a single mirror request, in seconds.
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            whole_object_mirrors: vec![
                "https://ipfs.io/ipfs/{cid}".to_string(),
                "https://cloudflare-ipfs.com/ipfs/{cid}".to_string(),
                "https://dweb.link/ipfs/{cid}".to_string(),
            ],
            path_mirrors: vec![
                "https://{root}.ipfs.w3s.link/{path}".to_string(),
                "https://ipfs.io/ipfs/{root}/{path}".to_string(),
                "https://dweb.link/ipfs/{root}/{path}".to_string(),
            ],
            timeout_secs: 15,
        }
    }
}

/// Retry budget of the snapshot loader.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Whole fetch-and-verify attempts per snapshot.
    pub max_attempts: u32,
    /// Pause between two attempts, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 0,
        }
    }
}

/// Settings of the equity curve and analytics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// IANA name of the time zone trading days are reported in.
    pub timezone: String,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
        }
    }
}

impl ReportingConfig {
    pub fn tz(&self) -> Option<chrono_tz::Tz> {
        self.timezone.parse().ok()
    }
}

/// Where the read-only registry is mirrored locally.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// JSON manifest of `{content_pointer, expected_hash, timestamp_seconds}` entries.
    pub manifest_path: Option<PathBuf>,
}

/// The bulk snapshot API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BulkConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            directory: None,
        }
    }
}
