//! Expression errors

use thiserror::Error;

use crate::parser::Rule;

#[derive(Debug, Error)]
pub enum ExprError {
    #[error("Parse error: {0}")]
    Parse(Box<pest::error::Error<Rule>>),

    #[error("Invalid string literal: {0}")]
    InvalidString(String),

    #[error("Unknown function '{name}/{arity}'")]
    UnknownFunction { name: String, arity: usize },

    #[error("Cannot use {expression} as a path")]
    InvalidPath { expression: &'static str },

    #[error("Cannot {operation} {found}")]
    TypeMismatch {
        operation: &'static str,
        found: String,
    },

    #[error("Unexpected rule: {0:?}")]
    UnexpectedRule(Rule),
}

impl From<pest::error::Error<Rule>> for ExprError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        ExprError::Parse(Box::new(e))
    }
}

impl ExprError {
    pub(crate) fn mismatch(operation: &'static str, found: impl Into<String>) -> Self {
        ExprError::TypeMismatch {
            operation,
            found: found.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExprError>;
