//! Error types for the Arbor configuration system

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration or manifest file
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Layered configuration could not be extracted
    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[source]
        source: Box<figment::Error>,
    },

    /// A package manifest is not valid TOML
    #[error("Failed to parse package manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    /// Current directory could not be determined
    #[error("Unable to determine current directory")]
    CurrentDirectoryNotFound,
}

impl ConfigError {
    /// Create a FileRead error.
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Create a Manifest error.
    pub fn manifest(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::ParseError {
            source: Box::new(error),
        }
    }
}
