//! Engine settings, loadable from TOML.
//!
//! ```toml
//! max_iterations = 1000000
//! splice = "collapse"
//! progress_interval = 10000
//! coverage = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a successful match is written back into the DNA.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpliceStrategy {
    /// Leave the largest unprotected group in place and splice around it.
    #[default]
    Collapse,
    /// Rebuild the whole matched prefix from the template.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Stop after this many rewrites even if the program could continue.
    pub max_iterations: Option<u64>,
    pub splice: SpliceStrategy,
    /// Log progress every this many iterations; 0 disables it.
    pub progress_interval: u64,
    /// Record which source bases each iteration reads.
    pub coverage: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            splice: SpliceStrategy::Collapse,
            progress_interval: 10_000,
            coverage: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
