use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid content pointer '{0}'")]
    InvalidPointer(String),

    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Mirror {url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} timed out after {after_ms} ms")]
    Timeout { url: String, after_ms: u128 },

    #[error("Mirror {url} returned an HTML page instead of a snapshot")]
    HtmlPayload { url: String },

    #[error("Failed to deserialize the bulk response: {0}")]
    Deserialization(String),

    #[error("No mirror templates are configured")]
    NoMirrors,

    #[error("All {attempts} mirrors failed for '{pointer}', last error: {last}")]
    AllMirrorsExhausted {
        pointer: String,
        attempts: usize,
        last: Box<GatewayError>,
    },
}
