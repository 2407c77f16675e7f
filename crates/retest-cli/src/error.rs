//! CLI error types

use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed clients.toml
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// `--clients` named a configuration that does not exist
    #[error("Unknown client: {0}")]
    UnknownClient(String),

    /// `--suite` named a suite that is not built in
    #[error("Unknown test suite: {0}")]
    UnknownSuite(String),
}
