//! Expression evaluation
//!
//! Every expression maps one input node to zero or more output nodes.
//! Assignments additionally resolve their left-hand side as a set of
//! locations inside the input and return a modified copy of it.

use std::cmp::Ordering;

use charter_core::{Mapping, Node, deep_merge};

use crate::ast::*;
use crate::error::{ExprError, Result};

/// One step of a location inside a document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A location and the value currently found there (`null` when missing)
type Located = (Vec<Segment>, Node);

/// Evaluate `expr` against `input`
pub fn evaluate(expr: &Expr, input: &Node) -> Result<Vec<Node>> {
    match expr {
        Expr::Identity => Ok(vec![input.clone()]),
        Expr::Literal(node) => Ok(vec![node.clone()]),
        Expr::Index { target, index } => {
            let keys = evaluate(index, input)?;
            let mut out = Vec::new();
            for value in evaluate(target, input)? {
                for key in &keys {
                    out.push(child(&value, key)?.1);
                }
            }
            Ok(out)
        }
        Expr::Iterate(target) => {
            let mut out = Vec::new();
            for value in evaluate(target, input)? {
                out.extend(children(&value)?.into_iter().map(|(_, node)| node));
            }
            Ok(out)
        }
        Expr::Pipe(left, right) => {
            let mut out = Vec::new();
            for value in evaluate(left, input)? {
                out.extend(evaluate(right, &value)?);
            }
            Ok(out)
        }
        Expr::Comma(left, right) => {
            let mut out = evaluate(left, input)?;
            out.extend(evaluate(right, input)?);
            Ok(out)
        }
        Expr::Assign { op, path, value } => assign(*op, path, value, input),
        Expr::Alternative(left, right) => {
            let truthy: Vec<Node> = evaluate(left, input)
                .map(|values| values.into_iter().filter(Node::is_truthy).collect())
                .unwrap_or_default();
            if truthy.is_empty() {
                evaluate(right, input)
            } else {
                Ok(truthy)
            }
        }
        Expr::And(left, right) => logical(left, right, input, false),
        Expr::Or(left, right) => logical(left, right, input, true),
        Expr::Compare(op, left, right) => {
            let rights = evaluate(right, input)?;
            let mut out = Vec::new();
            for l in evaluate(left, input)? {
                for r in &rights {
                    out.push(Node::Bool(compare(*op, &l, r)));
                }
            }
            Ok(out)
        }
        Expr::Arithmetic(op, left, right) => {
            let rights = evaluate(right, input)?;
            let mut out = Vec::new();
            for l in evaluate(left, input)? {
                for r in &rights {
                    out.push(arithmetic(*op, &l, r)?);
                }
            }
            Ok(out)
        }
        Expr::Array(None) => Ok(vec![Node::Sequence(Vec::new())]),
        Expr::Array(Some(inner)) => Ok(vec![Node::Sequence(evaluate(inner, input)?)]),
        Expr::Object(entries) => object(entries, input),
        Expr::Call(builtin, args) => call(*builtin, args, input),
    }
}

fn logical(left: &Expr, right: &Expr, input: &Node, short_circuit_on: bool) -> Result<Vec<Node>> {
    let mut out = Vec::new();
    for l in evaluate(left, input)? {
        if l.is_truthy() == short_circuit_on {
            out.push(Node::Bool(short_circuit_on));
            continue;
        }
        for r in evaluate(right, input)? {
            out.push(Node::Bool(r.is_truthy()));
        }
    }
    Ok(out)
}

fn object(entries: &[(Expr, Expr)], input: &Node) -> Result<Vec<Node>> {
    let mut objects = vec![Mapping::new()];
    for (key_expr, value_expr) in entries {
        let keys = evaluate(key_expr, input)?;
        let values = evaluate(value_expr, input)?;
        let mut next = Vec::with_capacity(objects.len() * keys.len() * values.len());
        for object in &objects {
            for key in &keys {
                let key = key
                    .as_str()
                    .ok_or_else(|| ExprError::mismatch("use as object key", key.type_name()))?;
                for value in &values {
                    let mut extended = object.clone();
                    extended.insert(key.to_string(), value.clone());
                    next.push(extended);
                }
            }
        }
        objects = next;
    }
    Ok(objects.into_iter().map(Node::Mapping).collect())
}

fn arg(builtin: Builtin, args: &[Expr], i: usize) -> Result<&Expr> {
    args.get(i).ok_or_else(|| ExprError::UnknownFunction {
        name: builtin.name().to_string(),
        arity: args.len(),
    })
}

fn call(builtin: Builtin, args: &[Expr], input: &Node) -> Result<Vec<Node>> {
    match builtin {
        Builtin::Select => {
            let keep = evaluate(arg(builtin, args, 0)?, input)?
                .iter()
                .any(Node::is_truthy);
            Ok(if keep { vec![input.clone()] } else { Vec::new() })
        }
        Builtin::Del => {
            let mut paths: Vec<Vec<Segment>> = locate(arg(builtin, args, 0)?, input)?
                .into_iter()
                .map(|(path, _)| path)
                .collect();
            paths.sort();
            paths.dedup();
            let mut doc = input.clone();
            // deepest / highest indices first so earlier removals don't shift later ones
            for path in paths.iter().rev() {
                delete_path(&mut doc, path);
            }
            Ok(vec![doc])
        }
        Builtin::With => assign(
            AssignOp::Update,
            arg(builtin, args, 0)?,
            arg(builtin, args, 1)?,
            input,
        ),
        Builtin::Has => evaluate(arg(builtin, args, 0)?, input)?
            .iter()
            .map(|key| has(input, key).map(Node::Bool))
            .collect(),
        Builtin::Keys => match input {
            Node::Mapping(map) => Ok(vec![Node::Sequence(
                map.keys().map(|k| Node::String(k.clone())).collect(),
            )]),
            Node::Sequence(items) => Ok(vec![Node::Sequence(
                (0..items.len() as i64).map(Node::Int).collect(),
            )]),
            other => Err(ExprError::mismatch("get keys of", other.type_name())),
        },
        Builtin::Length => {
            let length = match input {
                Node::Null => Node::Int(0),
                Node::Int(i) => Node::Int(i.abs()),
                Node::Float(f) => Node::Float(f.abs()),
                Node::String(s) => Node::Int(s.chars().count() as i64),
                Node::Sequence(items) => Node::Int(items.len() as i64),
                Node::Mapping(map) => Node::Int(map.len() as i64),
                Node::Bool(_) => return Err(ExprError::mismatch("get length of", "!!bool")),
            };
            Ok(vec![length])
        }
        Builtin::Not => Ok(vec![Node::Bool(!input.is_truthy())]),
        Builtin::Empty => Ok(Vec::new()),
        Builtin::Type => Ok(vec![Node::from(input.type_name())]),
    }
}

fn has(input: &Node, key: &Node) -> Result<bool> {
    match (input, key) {
        (Node::Mapping(map), Node::String(k)) => Ok(map.contains_key(k)),
        (Node::Sequence(items), Node::Int(i)) => Ok(*i >= 0 && (*i as usize) < items.len()),
        (Node::Null, _) => Ok(false),
        _ => Err(ExprError::mismatch(
            "check key",
            format!("{} of {}", key.type_name(), input.type_name()),
        )),
    }
}

fn assign(op: AssignOp, path: &Expr, value: &Expr, input: &Node) -> Result<Vec<Node>> {
    let located = locate(path, input)?;

    if op == AssignOp::Update {
        let mut doc = input.clone();
        for (location, current) in located {
            if let Some(updated) = evaluate(value, &current)?.into_iter().next() {
                set_path(&mut doc, &location, updated)?;
            }
        }
        return Ok(vec![doc]);
    }

    let mut out = Vec::new();
    for rhs in evaluate(value, input)? {
        let mut doc = input.clone();
        for (location, current) in &located {
            let new_value = match op {
                AssignOp::Add => arithmetic(ArithmeticOp::Add, current, &rhs)?,
                _ => rhs.clone(),
            };
            set_path(&mut doc, location, new_value)?;
        }
        out.push(doc);
    }
    Ok(out)
}

/// Resolve `expr` as a set of locations inside `input`
fn locate(expr: &Expr, input: &Node) -> Result<Vec<Located>> {
    match expr {
        Expr::Identity => Ok(vec![(Vec::new(), input.clone())]),
        Expr::Index { target, index } => {
            let keys = evaluate(index, input)?;
            let mut out = Vec::new();
            for (path, value) in locate(target, input)? {
                for key in &keys {
                    let (segment, node) = child(&value, key)?;
                    let mut path = path.clone();
                    path.push(segment);
                    out.push((path, node));
                }
            }
            Ok(out)
        }
        Expr::Iterate(target) => {
            let mut out = Vec::new();
            for (path, value) in locate(target, input)? {
                for (segment, node) in children(&value)? {
                    let mut path = path.clone();
                    path.push(segment);
                    out.push((path, node));
                }
            }
            Ok(out)
        }
        Expr::Pipe(left, right) => {
            let mut out = Vec::new();
            for (prefix, value) in locate(left, input)? {
                for (suffix, node) in locate(right, &value)? {
                    let mut path = prefix.clone();
                    path.extend(suffix);
                    out.push((path, node));
                }
            }
            Ok(out)
        }
        Expr::Comma(left, right) => {
            let mut out = locate(left, input)?;
            out.extend(locate(right, input)?);
            Ok(out)
        }
        Expr::Alternative(left, right) => {
            let truthy: Vec<Located> = locate(left, input)
                .map(|found| found.into_iter().filter(|(_, n)| n.is_truthy()).collect())
                .unwrap_or_default();
            if truthy.is_empty() {
                locate(right, input)
            } else {
                Ok(truthy)
            }
        }
        Expr::Call(Builtin::Select, args) => {
            let keep = evaluate(arg(Builtin::Select, args, 0)?, input)?
                .iter()
                .any(Node::is_truthy);
            Ok(if keep {
                vec![(Vec::new(), input.clone())]
            } else {
                Vec::new()
            })
        }
        Expr::Call(Builtin::Empty, _) => Ok(Vec::new()),
        other => Err(ExprError::InvalidPath {
            expression: other.describe(),
        }),
    }
}

/// Step into `value` by `key`; missing entries resolve to `null`
fn child(value: &Node, key: &Node) -> Result<(Segment, Node)> {
    match (value, key) {
        (Node::Mapping(map), Node::String(k)) => Ok((
            Segment::Key(k.clone()),
            map.get(k).cloned().unwrap_or_default(),
        )),
        (Node::Null, Node::String(k)) => Ok((Segment::Key(k.clone()), Node::Null)),
        (Node::Sequence(items), Node::Int(i)) => {
            let index = resolve_index(*i, items.len())?;
            Ok((
                Segment::Index(index),
                items.get(index).cloned().unwrap_or_default(),
            ))
        }
        (Node::Null, Node::Int(i)) => Ok((Segment::Index(resolve_index(*i, 0)?), Node::Null)),
        _ => Err(ExprError::mismatch(
            "index",
            format!("{} with {}", value.type_name(), key.type_name()),
        )),
    }
}

/// Entries of a collection; `null` has none
fn children(value: &Node) -> Result<Vec<(Segment, Node)>> {
    match value {
        Node::Mapping(map) => Ok(map
            .iter()
            .map(|(k, v)| (Segment::Key(k.clone()), v.clone()))
            .collect()),
        Node::Sequence(items) => Ok(items
            .iter()
            .enumerate()
            .map(|(i, v)| (Segment::Index(i), v.clone()))
            .collect()),
        Node::Null => Ok(Vec::new()),
        other => Err(ExprError::mismatch("iterate over", other.type_name())),
    }
}

fn resolve_index(index: i64, len: usize) -> Result<usize> {
    if index >= 0 {
        return usize::try_from(index).map_err(|_| ExprError::mismatch("index", index.to_string()));
    }
    usize::try_from(index.unsigned_abs())
        .ok()
        .and_then(|back| len.checked_sub(back))
        .ok_or_else(|| {
            ExprError::mismatch("index", format!("sequence of length {} with {}", len, index))
        })
}

/// Write `value` at `path`, creating intermediate mappings / sequences
fn set_path(doc: &mut Node, path: &[Segment], value: Node) -> Result<()> {
    let mut node = doc;
    for segment in path {
        node = match segment {
            Segment::Key(key) => {
                if node.is_null() {
                    *node = Node::mapping();
                }
                match node {
                    Node::Mapping(map) => map.entry(key.clone()).or_default(),
                    other => return Err(ExprError::mismatch("set key on", other.type_name())),
                }
            }
            Segment::Index(index) => {
                if node.is_null() {
                    *node = Node::Sequence(Vec::new());
                }
                match node {
                    Node::Sequence(items) => {
                        if items.len() <= *index {
                            items.resize(*index + 1, Node::Null);
                        }
                        &mut items[*index]
                    }
                    other => return Err(ExprError::mismatch("set index on", other.type_name())),
                }
            }
        };
    }
    *node = value;
    Ok(())
}

fn delete_path(doc: &mut Node, path: &[Segment]) {
    let Some((last, parents)) = path.split_last() else {
        *doc = Node::Null;
        return;
    };

    let mut node = doc;
    for segment in parents {
        let next = match (segment, node) {
            (Segment::Key(key), Node::Mapping(map)) => map.get_mut(key),
            (Segment::Index(index), Node::Sequence(items)) => items.get_mut(*index),
            _ => None,
        };
        match next {
            Some(found) => node = found,
            None => return,
        }
    }

    match (last, node) {
        (Segment::Key(key), Node::Mapping(map)) => {
            map.shift_remove(key);
        }
        (Segment::Index(index), Node::Sequence(items)) if *index < items.len() => {
            items.remove(*index);
        }
        _ => {}
    }
}

fn compare(op: CompareOp, left: &Node, right: &Node) -> bool {
    match op {
        CompareOp::Eq => equal(left, right),
        CompareOp::Ne => !equal(left, right),
        CompareOp::Lt => order(left, right) == Ordering::Less,
        CompareOp::Le => order(left, right) != Ordering::Greater,
        CompareOp::Gt => order(left, right) == Ordering::Greater,
        CompareOp::Ge => order(left, right) != Ordering::Less,
    }
}

fn as_number(node: &Node) -> Option<f64> {
    match node {
        Node::Int(i) => Some(*i as f64),
        Node::Float(f) => Some(*f),
        _ => None,
    }
}

fn equal(left: &Node, right: &Node) -> bool {
    match (as_number(left), as_number(right)) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

fn rank(node: &Node) -> u8 {
    match node {
        Node::Null => 0,
        Node::Bool(false) => 1,
        Node::Bool(true) => 2,
        Node::Int(_) | Node::Float(_) => 3,
        Node::String(_) => 4,
        Node::Sequence(_) => 5,
        Node::Mapping(_) => 6,
    }
}

/// Total order: null < false < true < numbers < strings < sequences < mappings
fn order(left: &Node, right: &Node) -> Ordering {
    match (left, right) {
        (Node::String(l), Node::String(r)) => l.cmp(r),
        (Node::Sequence(l), Node::Sequence(r)) => l
            .iter()
            .zip(r)
            .map(|(a, b)| order(a, b))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| l.len().cmp(&r.len())),
        (Node::Mapping(l), Node::Mapping(r)) => {
            let mut left_keys: Vec<_> = l.keys().collect();
            let mut right_keys: Vec<_> = r.keys().collect();
            left_keys.sort();
            right_keys.sort();
            left_keys.cmp(&right_keys)
        }
        _ => match (as_number(left), as_number(right)) {
            (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
            _ => rank(left).cmp(&rank(right)),
        },
    }
}

fn arithmetic(op: ArithmeticOp, left: &Node, right: &Node) -> Result<Node> {
    let operands = || format!("{} and {}", left.type_name(), right.type_name());
    match op {
        ArithmeticOp::Add => match (left, right) {
            (Node::Null, other) | (other, Node::Null) => Ok(other.clone()),
            (Node::Int(l), Node::Int(r)) => Ok(l
                .checked_add(*r)
                .map_or(Node::Float(*l as f64 + *r as f64), Node::Int)),
            (Node::String(l), Node::String(r)) => Ok(Node::String(format!("{}{}", l, r))),
            (Node::Sequence(l), Node::Sequence(r)) => {
                Ok(Node::Sequence(l.iter().chain(r).cloned().collect()))
            }
            (Node::Mapping(l), Node::Mapping(r)) => {
                let mut merged = l.clone();
                for (k, v) in r {
                    merged.insert(k.clone(), v.clone());
                }
                Ok(Node::Mapping(merged))
            }
            _ => match (as_number(left), as_number(right)) {
                (Some(l), Some(r)) => Ok(Node::Float(l + r)),
                _ => Err(ExprError::mismatch("add", operands())),
            },
        },
        ArithmeticOp::Subtract => match (left, right) {
            (Node::Int(l), Node::Int(r)) => Ok(l
                .checked_sub(*r)
                .map_or(Node::Float(*l as f64 - *r as f64), Node::Int)),
            (Node::Sequence(l), Node::Sequence(r)) => Ok(Node::Sequence(
                l.iter().filter(|item| !r.contains(item)).cloned().collect(),
            )),
            _ => match (as_number(left), as_number(right)) {
                (Some(l), Some(r)) => Ok(Node::Float(l - r)),
                _ => Err(ExprError::mismatch("subtract", operands())),
            },
        },
        ArithmeticOp::Multiply => match (left, right) {
            (Node::Int(l), Node::Int(r)) => Ok(l
                .checked_mul(*r)
                .map_or(Node::Float(*l as f64 * *r as f64), Node::Int)),
            (Node::Mapping(_), Node::Mapping(_)) => {
                let mut merged = left.clone();
                deep_merge(&mut merged, right);
                Ok(merged)
            }
            _ => match (as_number(left), as_number(right)) {
                (Some(l), Some(r)) => Ok(Node::Float(l * r)),
                _ => Err(ExprError::mismatch("multiply", operands())),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn node(yaml: &str) -> Node {
        Node::from_yaml(yaml).unwrap()
    }

    fn run(expression: &str, input: &str) -> Vec<Node> {
        evaluate(&parse(expression).unwrap(), &node(input)).unwrap()
    }

    fn run_one(expression: &str, input: &str) -> Node {
        let mut results = run(expression, input);
        assert_eq!(results.len(), 1, "expected a single result for {}", expression);
        results.remove(0)
    }

    const KUBEVIRT: &str = r#"
apiVersion: kubevirt.io/v1
kind: KubeVirt
metadata:
  name: kubevirt
  namespace: kubevirt
spec:
  certificateRotateStrategy: {}
  configuration:
    developerConfiguration:
      featureGates: []
  customizeComponents: {}
"#;

    #[test]
    fn test_select_value() {
        assert_eq!(
            run_one(".spec.configuration", KUBEVIRT),
            node("developerConfiguration: {featureGates: []}")
        );
        assert_eq!(run_one(".spec.missing", KUBEVIRT), Node::Null);
    }

    #[test]
    fn test_update_replaces_subtree_with_placeholder() {
        let out = run_one(
            r#".spec.configuration |= "{{ .Values.kubevirt.configuration }}""#,
            KUBEVIRT,
        );
        assert_eq!(
            out.get("spec").and_then(|s| s.get("configuration")),
            Some(&Node::from("{{ .Values.kubevirt.configuration }}"))
        );
        let keys: Vec<_> = out.get("spec").unwrap().as_mapping().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["certificateRotateStrategy", "configuration", "customizeComponents"]
        );
    }

    #[test]
    fn test_set_through_selection() {
        let input = r#"
kind: RoleBinding
subjects:
  - kind: ServiceAccount
    name: kubevirt-operator
    namespace: kubevirt
  - kind: ServiceAccount
    name: other
    namespace: kubevirt
"#;
        let out = run_one(
            r#"(.subjects[] | select(.name == "kubevirt-operator") .namespace) = "{{ .Release.Namespace }}""#,
            input,
        );
        let subjects = out.get("subjects").unwrap().as_sequence().unwrap();
        assert_eq!(
            subjects[0].get("namespace"),
            Some(&Node::from("{{ .Release.Namespace }}"))
        );
        assert_eq!(subjects[1].get("namespace"), Some(&Node::from("kubevirt")));
    }

    #[test]
    fn test_update_uses_matched_value() {
        let out = run_one(".replicas |= . + 1", "replicas: 2");
        assert_eq!(out, node("replicas: 3"));
    }

    #[test]
    fn test_assignment_creates_missing_keys() {
        assert_eq!(
            run_one(".metadata.labels.app = \"x\"", "kind: Pod"),
            node("kind: Pod\nmetadata: {labels: {app: x}}")
        );
        assert_eq!(run_one(".items[1] = 5", "{}"), node("items: [null, 5]"));
    }

    #[test]
    fn test_iterating_null_yields_nothing() {
        assert!(run(".missing[]", "a: 1").is_empty());
        assert_eq!(run_one(".missing[].x = 1", "a: 1"), node("a: 1"));
    }

    #[test]
    fn test_indexing_scalar_is_an_error() {
        let result = evaluate(&parse(".a.b").unwrap(), &node("a: 1"));
        assert!(matches!(result, Err(ExprError::TypeMismatch { .. })));
    }

    #[test]
    fn test_non_path_assignment_is_rejected() {
        let result = evaluate(&parse("(.a + 1) = 2").unwrap(), &node("a: 1"));
        assert!(matches!(result, Err(ExprError::InvalidPath { .. })));
    }

    #[test]
    fn test_del() {
        assert_eq!(
            run_one("del(.metadata.annotations)", "metadata: {name: a, annotations: {x: y}}"),
            node("metadata: {name: a}")
        );
        assert_eq!(
            run_one("del(.items[0], .items[2])", "items: [a, b, c, d]"),
            node("items: [b, d]")
        );
        assert_eq!(
            run_one(r#"del(.items[] | select(. == "b"))"#, "items: [a, b, c]"),
            node("items: [a, c]")
        );
    }

    #[test]
    fn test_with() {
        assert_eq!(
            run_one("with(.spec; .replicas = 3 | .paused = false)", "spec: {replicas: 1}"),
            node("spec: {replicas: 3, paused: false}")
        );
    }

    #[test]
    fn test_add_assign_appends() {
        assert_eq!(
            run_one(r#".args += ["--verbose"]"#, "args: [--port]"),
            node("args: [--port, --verbose]")
        );
    }

    #[test]
    fn test_multiply_deep_merges() {
        assert_eq!(
            run_one(". * {\"spec\": {\"b\": 2}}", "spec: {a: 1}"),
            node("spec: {a: 1, b: 2}")
        );
    }

    #[test]
    fn test_alternative() {
        assert_eq!(run_one(".a // \"default\"", "b: 1"), Node::from("default"));
        assert_eq!(run_one(".a // \"default\"", "a: set"), Node::from("set"));
        assert_eq!(run_one(".a // \"default\"", "a: false"), Node::from("default"));
    }

    #[test]
    fn test_builtins() {
        assert_eq!(run_one("has(\"a\")", "a: null"), Node::Bool(true));
        assert_eq!(run_one("keys", "b: 1\na: 2"), node("[b, a]"));
        assert_eq!(run_one(".items | length", "items: [1, 2, 3]"), Node::Int(3));
        assert_eq!(run_one("type", "[]"), Node::from("!!seq"));
        assert_eq!(run_one(".a | not", "a: false"), Node::Bool(true));
        assert!(run("empty", "a: 1").is_empty());
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(run_one(".a == 1.0", "a: 1"), Node::Bool(true));
        assert_eq!(run_one(".a < \"b\"", "a: a"), Node::Bool(true));
        assert_eq!(run_one("null < false", "{}"), Node::Bool(true));
        assert_eq!(run_one(".a > 1 and .a < 3", "a: 2"), Node::Bool(true));
        assert_eq!(run_one(".a != 2 or .b", "a: 2"), Node::Bool(false));
    }

    #[test]
    fn test_comma_and_construction() {
        assert_eq!(run(".a, .b", "a: 1\nb: 2"), vec![Node::Int(1), Node::Int(2)]);
        assert_eq!(run_one("[.items[].name]", "items: [{name: x}, {name: y}]"), node("[x, y]"));
        assert_eq!(
            run_one("{name: .metadata.name, \"kind\": .kind}", "kind: Pod\nmetadata: {name: web}"),
            node("{name: web, kind: Pod}")
        );
    }
}
