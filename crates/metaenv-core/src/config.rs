//! Plugin options and prefix resolution.
//!
//! Options arrive through the host's plugin-options channel as JSON:
//!
//! ```json
//! { "envPrefix": "APP_" }
//! { "envPrefix": ["VITE_", "APP_"] }
//! ```

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix used when no `envPrefix` is configured.
pub const DEFAULT_ENV_PREFIX: &str = "VITE_";

/// The `envPrefix` option: a single prefix or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvPrefix {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for EnvPrefix {
    fn from(prefix: &str) -> Self {
        Self::One(prefix.to_string())
    }
}

impl From<String> for EnvPrefix {
    fn from(prefix: String) -> Self {
        Self::One(prefix)
    }
}

impl From<Vec<String>> for EnvPrefix {
    fn from(prefixes: Vec<String>) -> Self {
        Self::Many(prefixes)
    }
}

/// Options for one plugin invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MetaEnvOptions {
    /// Recognized variable-name prefixes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_prefix: Option<EnvPrefix>,
}

impl MetaEnvOptions {
    /// Create options with no prefix configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prefix option.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<EnvPrefix>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Parse options from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|source| Error::ConfigParse { path: None, source })
    }

    /// Load options from a JSON file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    /// The resolved, ordered prefix set for these options.
    #[must_use]
    pub fn prefixes(&self) -> Vec<String> {
        resolve_prefixes(self)
    }
}

/// Resolve the active prefix set.
///
/// A string becomes a one-element set and a list is kept as given, including
/// an empty list (which then matches no prefixed variable). A missing option
/// or an empty string yields `["VITE_"]`.
#[must_use]
pub fn resolve_prefixes(options: &MetaEnvOptions) -> Vec<String> {
    match &options.env_prefix {
        Some(EnvPrefix::One(prefix)) if !prefix.is_empty() => vec![prefix.clone()],
        Some(EnvPrefix::Many(prefixes)) => prefixes.clone(),
        Some(EnvPrefix::One(_)) | None => vec![DEFAULT_ENV_PREFIX.to_string()],
    }
}
