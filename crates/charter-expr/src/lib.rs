//! Charter Expr - query / update expressions over document trees
//!
//! Modification rules are written in a yq-compatible subset:
//!
//! - `.spec.configuration` reads a subtree
//! - `.spec.replicas |= "{{ .Values.replicas }}"` replaces each match
//! - `(.subjects[] | select(.name == "x") .namespace) = "y"` assigns through a filtered path
//! - `del(.metadata.annotations)` deletes locations
//! - `. * {"spec": {"paused": true}}` deep merges
//!
//! The [`Evaluator`] trait is the seam used by the rest of the workspace;
//! [`YqEvaluator`] is the built-in implementation.

pub mod ast;
pub mod error;
pub mod eval;
pub mod parser;

pub use ast::Expr;
pub use error::{ExprError, Result};
pub use parser::parse;

use charter_core::Node;

/// Evaluates expressions against documents
pub trait Evaluator: Send + Sync {
    /// Run `expression` against `document`, returning every result
    fn evaluate(&self, expression: &str, document: &Node) -> Result<Vec<Node>>;

    /// Check that `expression` is well formed without running it
    fn validate(&self, expression: &str) -> Result<()>;
}

/// Built-in evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct YqEvaluator;

impl YqEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for YqEvaluator {
    fn evaluate(&self, expression: &str, document: &Node) -> Result<Vec<Node>> {
        let expr = parse(expression)?;
        tracing::trace!(expression, "evaluating expression");
        eval::evaluate(&expr, document)
    }

    fn validate(&self, expression: &str) -> Result<()> {
        parse(expression).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluator_is_object_safe() {
        let evaluator: Box<dyn Evaluator> = Box::new(YqEvaluator::new());
        let doc = Node::from_yaml("spec: {replicas: 1}").unwrap();
        let out = evaluator.evaluate(".spec.replicas", &doc).unwrap();
        assert_eq!(out, vec![Node::Int(1)]);
    }

    #[test]
    fn test_validate() {
        let evaluator = YqEvaluator;
        assert!(evaluator.validate(r#".spec |= "{{ .Values.spec }}""#).is_ok());
        assert!(evaluator.validate(".spec |=").is_err());
        assert!(evaluator.validate("nope(.a)").is_err());
    }
}
