use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::parser::ParseOverrides;

pub const CONFIG_FILE: &str = "testnorm.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Parser defaults; unset keys keep the built-in defaults.
    #[serde(default)]
    pub parser: ParseOverrides,
    #[serde(default)]
    pub output: OutputConfig,
}

/// How the CLI prints results.
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Example: "json", "summary" or "failures"
    pub format: Option<String>,
    /// Pretty-print JSON output.
    #[serde(default)]
    pub pretty: bool,
}

impl Config {
    /// Load `testnorm.toml` from `dir`, falling back to defaults if absent or invalid.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::from_path(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring config file");
                Self::default()
            }
        }
    }

    /// Load an explicitly named config file; unlike [`Config::load`] a missing
    /// or invalid file is an error.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }
}
