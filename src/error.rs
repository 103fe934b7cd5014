use std::path::PathBuf;

use thiserror::Error;

/// Why a framework payload could not be read. Never escapes `parse()`; it only
/// becomes the message of a ParseError result.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no {framework} report found in output (looked for {marker})")]
    NoPayload {
        framework: &'static str,
        marker: &'static str,
    },

    #[error("malformed {framework} report: {source}")]
    Decode {
        framework: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed {framework} report: {reason}")]
    Malformed {
        framework: &'static str,
        reason: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown test framework '{0}' (expected one of: mocha, jest, vitest)")]
pub struct UnknownFramework(pub String);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
