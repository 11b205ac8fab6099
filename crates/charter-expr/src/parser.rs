//! Expression parser
//!
//! Parses query / update expressions into an AST using pest.

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest_derive::Parser;

use charter_core::Node;

use crate::ast::*;
use crate::error::{ExprError, Result};

#[derive(Parser)]
#[grammar = "yq.pest"]
struct ExpressionParser;

/// Parse an expression string into an AST
pub fn parse(input: &str) -> Result<Expr> {
    let pairs = ExpressionParser::parse(Rule::expression, input)?;

    for pair in pairs {
        if pair.as_rule() == Rule::expression {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::pipe {
                    return build(inner);
                }
            }
        }
    }

    Err(ExprError::UnexpectedRule(Rule::EOI))
}

fn build(pair: Pair<Rule>) -> Result<Expr> {
    match pair.as_rule() {
        Rule::pipe => fold(pair.into_inner(), |l, r| Expr::Pipe(Box::new(l), Box::new(r))),
        Rule::comma => fold(pair.into_inner(), |l, r| Expr::Comma(Box::new(l), Box::new(r))),
        Rule::alternative => fold(pair.into_inner(), |l, r| {
            Expr::Alternative(Box::new(l), Box::new(r))
        }),
        Rule::or_expr => fold(pair.into_inner(), |l, r| Expr::Or(Box::new(l), Box::new(r))),
        Rule::and_expr => fold(pair.into_inner(), |l, r| Expr::And(Box::new(l), Box::new(r))),
        Rule::assign => build_assign(pair.into_inner()),
        Rule::compare => build_compare(pair.into_inner()),
        Rule::additive | Rule::multiplicative => build_arithmetic(pair.into_inner()),
        Rule::postfix => build_postfix(pair.into_inner()),
        Rule::paren => build(single(pair.into_inner())?),
        Rule::array => {
            let inner = pair.into_inner().next().map(build).transpose()?;
            Ok(Expr::Array(inner.map(Box::new)))
        }
        Rule::object => pair
            .into_inner()
            .map(build_object_entry)
            .collect::<Result<Vec<_>>>()
            .map(Expr::Object),
        Rule::call => build_call(pair.into_inner()),
        Rule::field => Ok(Expr::field(Expr::Identity, key(single(pair.into_inner())?)?)),
        Rule::identity => Ok(Expr::Identity),
        Rule::null_lit => Ok(Expr::Literal(Node::Null)),
        Rule::bool_lit => Ok(Expr::Literal(Node::Bool(pair.as_str() == "true"))),
        Rule::number => Ok(Expr::Literal(number(pair.as_str()))),
        Rule::string => Ok(Expr::Literal(Node::String(unescape(pair)?))),
        other => Err(ExprError::UnexpectedRule(other)),
    }
}

/// Left fold of a flat operand list, keyword tokens skipped
fn fold(pairs: Pairs<Rule>, combine: impl Fn(Expr, Expr) -> Expr) -> Result<Expr> {
    let mut operands = pairs.filter(|p| !matches!(p.as_rule(), Rule::kw_or | Rule::kw_and));
    let mut expr = build(next(&mut operands)?)?;
    for operand in operands {
        expr = combine(expr, build(operand)?);
    }
    Ok(expr)
}

fn build_assign(mut pairs: Pairs<Rule>) -> Result<Expr> {
    let path = build(next(&mut pairs)?)?;
    let Some(op) = pairs.next() else {
        return Ok(path);
    };
    let op = match op.as_str() {
        "|=" => AssignOp::Update,
        "+=" => AssignOp::Add,
        _ => AssignOp::Set,
    };
    let value = build(next(&mut pairs)?)?;
    Ok(Expr::Assign {
        op,
        path: Box::new(path),
        value: Box::new(value),
    })
}

fn build_compare(mut pairs: Pairs<Rule>) -> Result<Expr> {
    let left = build(next(&mut pairs)?)?;
    let Some(op) = pairs.next() else {
        return Ok(left);
    };
    let op = match op.as_str() {
        "==" => CompareOp::Eq,
        "!=" => CompareOp::Ne,
        "<=" => CompareOp::Le,
        ">=" => CompareOp::Ge,
        "<" => CompareOp::Lt,
        _ => CompareOp::Gt,
    };
    let right = build(next(&mut pairs)?)?;
    Ok(Expr::Compare(op, Box::new(left), Box::new(right)))
}

fn build_arithmetic(mut pairs: Pairs<Rule>) -> Result<Expr> {
    let mut expr = build(next(&mut pairs)?)?;
    while let Some(op) = pairs.next() {
        let op = match op.as_str() {
            "+" => ArithmeticOp::Add,
            "-" => ArithmeticOp::Subtract,
            _ => ArithmeticOp::Multiply,
        };
        let right = build(next(&mut pairs)?)?;
        expr = Expr::Arithmetic(op, Box::new(expr), Box::new(right));
    }
    Ok(expr)
}

fn build_postfix(mut pairs: Pairs<Rule>) -> Result<Expr> {
    let mut expr = build(next(&mut pairs)?)?;
    for suffix in pairs {
        expr = match suffix.as_rule() {
            Rule::iterate_suffix => Expr::Iterate(Box::new(expr)),
            Rule::index_suffix => Expr::index(expr, build(single(suffix.into_inner())?)?),
            Rule::field_suffix => Expr::field(expr, key(single(suffix.into_inner())?)?),
            other => return Err(ExprError::UnexpectedRule(other)),
        };
    }
    Ok(expr)
}

fn build_object_entry(pair: Pair<Rule>) -> Result<(Expr, Expr)> {
    let mut inner = pair.into_inner();
    let key_pair = next(&mut inner)?;
    let key_expr = match key_pair.as_rule() {
        Rule::paren => build(key_pair)?,
        _ => Expr::Literal(Node::String(key(key_pair)?)),
    };
    let value = build(next(&mut inner)?)?;
    Ok((key_expr, value))
}

fn build_call(mut pairs: Pairs<Rule>) -> Result<Expr> {
    let name = next(&mut pairs)?.as_str().to_string();
    let args = pairs.map(build).collect::<Result<Vec<_>>>()?;
    let builtin = Builtin::resolve(&name, args.len()).ok_or(ExprError::UnknownFunction {
        name,
        arity: args.len(),
    })?;
    Ok(Expr::Call(builtin, args))
}

fn next<'i>(pairs: &mut impl Iterator<Item = Pair<'i, Rule>>) -> Result<Pair<'i, Rule>> {
    pairs.next().ok_or(ExprError::UnexpectedRule(Rule::EOI))
}

fn single(mut pairs: Pairs<Rule>) -> Result<Pair<Rule>> {
    next(&mut pairs)
}

/// Mapping key from an identifier or a string literal
fn key(pair: Pair<Rule>) -> Result<String> {
    match pair.as_rule() {
        Rule::ident => Ok(pair.as_str().to_string()),
        Rule::string => unescape(pair),
        other => Err(ExprError::UnexpectedRule(other)),
    }
}

fn number(text: &str) -> Node {
    match text.parse::<i64>() {
        Ok(i) => Node::Int(i),
        Err(_) => text.parse::<f64>().map_or(Node::Null, Node::Float),
    }
}

fn unescape(pair: Pair<Rule>) -> Result<String> {
    let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or_default();
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            _ => return Err(ExprError::InvalidString(raw.to_string())),
        }
    }
    Ok(out)
}
