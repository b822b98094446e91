//! Error types for command discovery, registration and invocation.

use std::path::PathBuf;
use thiserror::Error;

use crate::schema::ValidationFailure;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or running a program.
#[derive(Error, Debug)]
pub enum Error {
    /// A commands directory or one of its entries could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A command module exists but could not be loaded.
    #[error("failed to load command module '{path}': {message}")]
    Module { path: PathBuf, message: String },

    /// A command module names a component that was never registered.
    #[error("command module '{path}' references unknown component '{name}'")]
    UnknownComponent { path: PathBuf, name: String },

    /// Two filesystem entries resolve to the same command name.
    #[error("command '{name}' is defined by both '{first}' and '{second}'")]
    DuplicateCommand {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// More than one sibling is marked as the default command.
    #[error("'{parent}' has more than one default command: {names}")]
    MultipleDefaults { parent: String, names: String },

    /// A command uses a name the registrar reserves for itself.
    #[error("'{name}' under '{parent}' is reserved and cannot be used as a command name")]
    ReservedName { name: String, parent: String },

    /// An option flag collides with another flag on the same command.
    #[error("option '{flag}' of command '{command}' conflicts with {conflict}")]
    FlagConflict {
        command: String,
        flag: String,
        conflict: String,
    },

    /// A schema document is not usable as an options or arguments schema.
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    /// Embedded field configuration could not be decoded.
    #[error("invalid configuration for field '{field}': {message}")]
    FieldConfig { field: String, message: String },

    /// A template failed to parse.
    #[error("template error: {0}")]
    Template(String),

    /// A component failed while producing its output.
    #[error("render failed: {0}")]
    Render(String),

    /// Output could not be written to the terminal.
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),

    /// User input did not satisfy a command schema.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// A command group was invoked with nothing to run.
    #[error("'{path}' requires a subcommand")]
    MissingSubcommand { path: String },

    /// Command-line parsing failed.
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// Package manifest discovery failed.
    #[error(transparent)]
    Config(#[from] arbor_config::ConfigError),
}

impl Error {
    /// Create an Io error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a Module error.
    pub fn module(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Module {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an InvalidSchema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Create a FieldConfig error.
    pub fn field_config(field: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::FieldConfig {
            field: field.into(),
            message: message.to_string(),
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(error) => error.exit_code(),
            _ => 1,
        }
    }

    /// Whether the error has already been written to the terminal.
    pub fn is_reported(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::MissingSubcommand { .. } | Self::Usage(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_reported_with_status_one() {
        let error = Error::from(ValidationFailure::new("Required at \"target\""));
        assert_eq!(error.exit_code(), 1);
        assert!(error.is_reported());
        assert_eq!(error.to_string(), "Required at \"target\"");
    }

    #[test]
    fn test_load_errors_are_not_reported() {
        let error = Error::module("commands/build.md", "bad frontmatter");
        assert_eq!(error.exit_code(), 1);
        assert!(!error.is_reported());
        assert!(error.to_string().contains("commands/build.md"));
    }

    #[test]
    fn test_usage_error_keeps_clap_exit_code() {
        let error = clap::Command::new("demo")
            .try_get_matches_from(["demo", "--nope"])
            .unwrap_err();
        let code = error.exit_code();
        assert_eq!(Error::from(error).exit_code(), code);
    }
}
