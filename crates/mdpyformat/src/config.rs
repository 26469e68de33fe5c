//! Render configuration.
//!
//! All fields have defaults matching the classic output format, so an empty
//! TOML file (or no file at all) gives the classic `>> ` result blocks.

use std::{fmt, fs, io, path::Path, path::PathBuf, time::Duration};

use ouros::ResourceLimits;
use serde::Deserialize;

/// Marker put in front of every line of captured output.
pub const DEFAULT_RESULT_PREFIX: &str = ">> ";
/// Script name snippets are executed under; shows up in tracebacks.
pub const DEFAULT_SCRIPT_NAME: &str = "<snippet>";

/// Options controlling how a literate document is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Prefix for each line of a result block.
    pub result_prefix: String,
    /// Escape `_` in prose and headers.
    pub escape_underscores: bool,
    /// Script name used for the snippet namespace.
    pub script_name: String,
    /// Insert a table of contents after rendering.
    pub toc: bool,
    /// Per-snippet VM instruction budget.
    pub max_operations: Option<usize>,
    /// Per-snippet wall clock budget in milliseconds.
    pub max_duration_ms: Option<u64>,
    /// Maximum Python call depth.
    pub max_recursion_depth: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            result_prefix: DEFAULT_RESULT_PREFIX.to_owned(),
            escape_underscores: true,
            script_name: DEFAULT_SCRIPT_NAME.to_owned(),
            toc: false,
            max_operations: None,
            max_duration_ms: None,
            max_recursion_depth: None,
        }
    }
}

impl RenderConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::Parse)
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Interpreter limits for the snippet namespace, or `None` when no limit is configured.
    #[must_use]
    pub fn resource_limits(&self) -> Option<ResourceLimits> {
        if self.max_operations.is_none() && self.max_duration_ms.is_none() && self.max_recursion_depth.is_none() {
            return None;
        }
        let mut limits = ResourceLimits::new();
        if let Some(operations) = self.max_operations {
            limits = limits.max_operations(operations);
        }
        if let Some(millis) = self.max_duration_ms {
            limits = limits.max_duration(Duration::from_millis(millis));
        }
        if let Some(depth) = self.max_recursion_depth {
            limits = limits.max_recursion_depth(Some(depth));
        }
        Some(limits)
    }
}

/// Errors raised while loading a configuration file.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io { path: PathBuf, source: io::Error },
    /// The file is not valid TOML or contains unknown keys.
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read config {}: {source}", path.display()),
            Self::Parse(error) => write!(f, "invalid config: {error}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(error) => Some(error),
        }
    }
}
