//! Engine error types

use charter_core::CoreError;
use charter_expr::ExprError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error("Invalid modification rule #{index}: {source}")]
    #[diagnostic(
        code(charter::engine::invalid_rule),
        help("check the kindMatch / kindReject / textRegex patterns and the .Values reference of the rule")
    )]
    InvalidRule {
        index: usize,
        #[source]
        source: CoreError,
    },

    #[error("Invalid expression in rule #{index} '{expression}': {source}")]
    #[diagnostic(code(charter::engine::invalid_expression))]
    InvalidExpression {
        index: usize,
        expression: String,
        #[source]
        source: ExprError,
    },

    #[error("Rule #{index} failed on {manifest}: {source}")]
    #[diagnostic(code(charter::engine::evaluation))]
    Evaluation {
        index: usize,
        manifest: String,
        #[source]
        source: ExprError,
    },

    #[error("Rule #{index} produced no document for {manifest}")]
    #[diagnostic(
        code(charter::engine::empty_result),
        help("a rewrite expression must return the whole document, e.g. '.spec.x |= ...' rather than '.spec.x'")
    )]
    EmptyResult { index: usize, manifest: String },

    #[error("Rule #{index} turned {manifest} into {found} instead of a mapping")]
    #[diagnostic(
        code(charter::engine::not_a_mapping),
        help("a rewrite expression must return the whole document, e.g. '.spec.x |= ...' rather than '.spec.x'")
    )]
    NotAMapping {
        index: usize,
        manifest: String,
        found: &'static str,
    },

    #[error("Rule #{index} removed the kind of {manifest}")]
    #[diagnostic(code(charter::engine::lost_kind))]
    LostKind {
        index: usize,
        manifest: String,
        #[source]
        source: CoreError,
    },

    #[error(transparent)]
    #[diagnostic(code(charter::engine::core))]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
