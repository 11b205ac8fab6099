//! Chart assembly error types

use charter_core::CoreError;
use charter_engine::EngineError;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::assembler::ChartStage;
use crate::lint::LintSeverity;

#[derive(Error, Debug, Diagnostic)]
pub enum ChartError {
    #[error("Invalid chart version '{version}': {source}")]
    #[diagnostic(
        code(charter::chart::invalid_version),
        help("the release tag must be SemVer, optionally prefixed with 'v'")
    )]
    InvalidVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("Lint failed for chart {chart}: {count} finding(s) at or above {threshold}")]
    #[diagnostic(code(charter::chart::lint_failed))]
    LintFailed {
        chart: String,
        threshold: LintSeverity,
        count: usize,
    },

    #[error("Chart {chart} cancelled at stage {stage}")]
    #[diagnostic(code(charter::chart::cancelled))]
    Cancelled { chart: String, stage: ChartStage },

    #[error("Not a chart directory: {}", path.display())]
    #[diagnostic(
        code(charter::chart::not_a_chart),
        help("a chart directory contains a Chart.yaml")
    )]
    NotAChart { path: PathBuf },

    #[error("IO error on {}: {source}", path.display())]
    #[diagnostic(code(charter::chart::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk chart directory: {0}")]
    #[diagnostic(code(charter::chart::walk))]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    #[diagnostic(code(charter::chart::core))]
    Core(#[from] CoreError),
}

impl ChartError {
    /// Attach a path to an IO error
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ChartError::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;
