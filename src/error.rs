//! Error types for dcim-import

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for import operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("'{path}' should start with '{expected_prefix}'")]
    PathAssumption {
        path: String,
        expected_prefix: String,
    },

    #[error("Copy failed for {failed} of {total} files")]
    CopyFailed { failed: usize, total: usize },

    #[error("Logging setup failed: {reason}")]
    Logging { reason: String },
}

impl Error {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}

/// A date bound that could not be parsed.
///
/// Never fatal: the run continues without the bound.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid date string given: {input} ({reason})")]
pub struct InvalidDateFilter {
    pub input: String,
    pub reason: String,
}

/// One file the copy collaborator failed to copy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CopyFailure {
    pub destination: PathBuf,
    pub message: String,
}

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, Error>;
