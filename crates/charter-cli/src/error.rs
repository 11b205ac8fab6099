//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use charter_chart::ChartError;
use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Configuration could not be loaded or validated
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// Chart lint or packaging failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Chart(#[from] ChartError),

    /// Linting failed at or above the failure threshold
    #[error("Linting failed with {errors} error(s) and {warnings} warning(s)")]
    #[diagnostic(code(charter::cli::lint))]
    LintFailed { errors: usize, warnings: usize },

    /// Some releases failed to update
    #[error("{failed} of {total} release(s) failed")]
    #[diagnostic(
        code(charter::cli::update),
        help("rerun with --log-level debug or RUST_LOG=debug for details")
    )]
    UpdateFailed { failed: usize, total: usize },

    /// Invalid arguments
    #[error("{message}")]
    #[diagnostic(code(charter::cli::usage))]
    Usage { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(charter::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(charter::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => exit_codes::CONFIG_ERROR,
            CliError::Chart(ChartError::Io { .. }) => exit_codes::IO_ERROR,
            CliError::Chart(_) => exit_codes::CHART_ERROR,
            CliError::LintFailed { .. } => exit_codes::ERROR,
            CliError::UpdateFailed { .. } => exit_codes::RELEASE_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Create a lint failure error
    pub fn lint_failed(errors: usize, warnings: usize) -> Self {
        Self::LintFailed { errors, warnings }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let missing = CliError::from(ConfigError::NotFound {
            path: PathBuf::from("config.yaml"),
        });
        assert_eq!(missing.exit_code(), exit_codes::CONFIG_ERROR);
        assert_eq!(CliError::lint_failed(1, 0).exit_code(), exit_codes::ERROR);
        assert_eq!(
            CliError::UpdateFailed { failed: 1, total: 2 }.exit_code(),
            exit_codes::RELEASE_ERROR
        );
        assert_eq!(CliError::usage("bad").exit_code(), exit_codes::USAGE_ERROR);
        assert_eq!(
            CliError::from(ChartError::NotAChart {
                path: PathBuf::from("x")
            })
            .exit_code(),
            exit_codes::CHART_ERROR
        );
        assert_eq!(
            CliError::from(std::io::Error::other("disk")).exit_code(),
            exit_codes::IO_ERROR
        );
    }
}
