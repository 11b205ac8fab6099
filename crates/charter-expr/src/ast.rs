//! AST of the query / update language
//!
//! Paths such as `.spec.template[0]` are not a node of their own: they are
//! chains of [`Expr::Index`] / [`Expr::Iterate`] on top of [`Expr::Identity`],
//! which lets the evaluator resolve any chain as a location when it appears
//! on the left of an assignment.

use charter_core::Node;

/// A parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `.`
    Identity,
    /// `"str"`, `1`, `true`, `null`
    Literal(Node),
    /// `target.key`, `target["key"]`, `target[0]`
    Index { target: Box<Expr>, index: Box<Expr> },
    /// `target[]`
    Iterate(Box<Expr>),
    /// `left | right`
    Pipe(Box<Expr>, Box<Expr>),
    /// `left, right`
    Comma(Box<Expr>, Box<Expr>),
    /// `path = value`, `path |= update`, `path += value`
    Assign {
        op: AssignOp,
        path: Box<Expr>,
        value: Box<Expr>,
    },
    /// `left // right`
    Alternative(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Arithmetic(ArithmeticOp, Box<Expr>, Box<Expr>),
    /// `[expr]` collects every output of `expr`
    Array(Option<Box<Expr>>),
    /// `{key: value, ...}`
    Object(Vec<(Expr, Expr)>),
    /// Builtin function call
    Call(Builtin, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`: value evaluated once against the input
    Set,
    /// `|=`: value evaluated against each matched node
    Update,
    /// `+=`
    Add,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    /// Numbers multiply, mappings deep merge
    Multiply,
}

/// Supported builtin functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Select,
    Del,
    With,
    Has,
    Keys,
    Length,
    Not,
    Empty,
    Type,
}

impl Builtin {
    /// Resolve a function name and its argument count
    pub fn resolve(name: &str, arity: usize) -> Option<Self> {
        let builtin = match name {
            "select" => Builtin::Select,
            "del" => Builtin::Del,
            "with" => Builtin::With,
            "has" => Builtin::Has,
            "keys" => Builtin::Keys,
            "length" => Builtin::Length,
            "not" => Builtin::Not,
            "empty" => Builtin::Empty,
            "type" | "tag" => Builtin::Type,
            _ => return None,
        };
        (builtin.arity() == arity).then_some(builtin)
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::Select | Builtin::Del | Builtin::Has => 1,
            Builtin::With => 2,
            Builtin::Keys
            | Builtin::Length
            | Builtin::Not
            | Builtin::Empty
            | Builtin::Type => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Select => "select",
            Builtin::Del => "del",
            Builtin::With => "with",
            Builtin::Has => "has",
            Builtin::Keys => "keys",
            Builtin::Length => "length",
            Builtin::Not => "not",
            Builtin::Empty => "empty",
            Builtin::Type => "type",
        }
    }
}

impl Expr {
    pub fn index(target: Expr, index: Expr) -> Self {
        Expr::Index {
            target: Box::new(target),
            index: Box::new(index),
        }
    }

    /// `target.key`
    pub fn field(target: Expr, key: impl Into<String>) -> Self {
        Expr::index(target, Expr::Literal(Node::String(key.into())))
    }

    /// Short description used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Expr::Identity => "identity",
            Expr::Literal(_) => "literal",
            Expr::Index { .. } => "index",
            Expr::Iterate(_) => "iteration",
            Expr::Pipe(..) => "pipe",
            Expr::Comma(..) => "comma",
            Expr::Assign { .. } => "assignment",
            Expr::Alternative(..) => "alternative",
            Expr::And(..) => "and",
            Expr::Or(..) => "or",
            Expr::Compare(..) => "comparison",
            Expr::Arithmetic(..) => "arithmetic",
            Expr::Array(_) => "array construction",
            Expr::Object(_) => "object construction",
            Expr::Call(builtin, _) => builtin.name(),
        }
    }
}
