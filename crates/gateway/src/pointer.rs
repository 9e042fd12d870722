use crate::error::GatewayError;
use configuration::GatewayConfig;
use std::fmt;
use std::str::FromStr;

/// Address of immutable bytes in the content store.
///
/// A bare identifier addresses a whole object; `<root>/<path>` addresses a
/// file inside a directory object. The two shapes use different mirror URL
/// families.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentPointer {
    Whole { cid: String },
    Path { root: String, path: String },
}

impl ContentPointer {
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let trimmed = raw.trim();
        let stripped = trimmed
            .strip_prefix("ipfs://")
            .or_else(|| trimmed.strip_prefix("/ipfs/"))
            .unwrap_or(trimmed)
            .trim_matches('/');

        if stripped.is_empty() {
            return Err(GatewayError::InvalidPointer(raw.to_string()));
        }

        match stripped.split_once('/') {
            Some((root, path)) => Ok(ContentPointer::Path {
                root: root.to_string(),
                path: path.to_string(),
            }),
            None => Ok(ContentPointer::Whole {
                cid: stripped.to_string(),
            }),
        }
    }
}

impl FromStr for ContentPointer {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ContentPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentPointer::Whole { cid } => f.write_str(cid),
            ContentPointer::Path { root, path } => write!(f, "{}/{}", root, path),
        }
    }
}

/// The two ordered families of mirror URL templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSet {
    whole_object: Vec<String>,
    path: Vec<String>,
}

impl MirrorSet {
    pub fn new(whole_object: Vec<String>, path: Vec<String>) -> Self {
        Self { whole_object, path }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.whole_object_mirrors.clone(), config.path_mirrors.clone())
    }

    /// Expands the templates of the pointer's family, in configured order.
    pub fn expand(&self, pointer: &ContentPointer) -> Vec<String> {
        match pointer {
            ContentPointer::Whole { cid } => self
                .whole_object
                .iter()
                .map(|template| template.replace("{cid}", cid))
                .collect(),
            ContentPointer::Path { root, path } => self
                .path
                .iter()
                .map(|template| template.replace("{root}", root).replace("{path}", path))
                .collect(),
        }
    }
}
