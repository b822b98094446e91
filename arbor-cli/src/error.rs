//! Error handling for the Arbor CLI
//!
//! Library errors are converted into a [`CliError`] carrying the exit code
//! the process should end with.

use std::error::Error;
use std::fmt;

use crate::exit_codes::{EXIT_ERROR, EXIT_SUCCESS};

/// CLI-specific result type that preserves error information
pub type CliResult<T> = Result<T, CliError>;

/// CLI error with its exit code
#[derive(Debug)]
pub struct CliError {
    pub message: String,
    pub exit_code: i32,
    /// Whether the user has already seen this error on the terminal.
    pub reported: bool,
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl CliError {
    /// Get the full error chain as a formatted string
    pub fn full_chain(&self) -> String {
        let mut result = self.message.clone();

        let mut current_source = self.source.as_deref().and_then(|e| e.source());
        while let Some(err) = current_source {
            result.push_str(&format!("\n  Caused by: {err}"));
            current_source = err.source();
        }

        result
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl From<arbor::Error> for CliError {
    fn from(error: arbor::Error) -> Self {
        Self {
            message: error.to_string(),
            exit_code: error.exit_code(),
            reported: error.is_reported(),
            source: Some(Box::new(error)),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(error: anyhow::Error) -> Self {
        Self {
            message: format!("{error:#}"),
            exit_code: EXIT_ERROR,
            reported: false,
            source: None,
        }
    }
}

/// Convert a CliResult to an exit code, printing the error chain unless it
/// has already been shown
pub fn handle_cli_result<T>(result: CliResult<T>) -> i32 {
    match result {
        Ok(_) => EXIT_SUCCESS,
        Err(e) => {
            tracing::debug!(exit_code = e.exit_code, "command failed: {}", e.full_chain());
            if !e.reported {
                eprintln!("Error: {}", e.full_chain());
            }
            e.exit_code
        }
    }
}
