//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Manifest has no valid 'kind' field: {document}")]
    MissingKind { document: String },

    #[error("Manifest must be a mapping, found {found}")]
    NotAMapping { found: &'static str },

    #[error("Invalid values: {message}")]
    InvalidValues { message: String },

    #[error("Invalid {field} regex '{pattern}': {source}")]
    InvalidRegex {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("No value path found in expression '{expression}' (expected a .Values.<path> reference)")]
    MissingValuesPath { expression: String },

    #[error("Invalid Chart.yaml: {message}")]
    InvalidChart { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid version '{version}': {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
