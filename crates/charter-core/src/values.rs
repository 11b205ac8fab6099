//! Values handling with deep merge support

use std::path::Path;

use crate::error::{CoreError, Result};
use crate::node::{Mapping, Node};

/// Externalized chart configuration (the chart's `values.yaml`)
///
/// Always a mapping at the root. Built incrementally by deep-merging the
/// fragments extracted from manifests.
#[derive(Debug, Clone, PartialEq)]
pub struct Values(Node);

impl Default for Values {
    fn default() -> Self {
        Self::new()
    }
}

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(Node::mapping())
    }

    /// Wrap a mapping node; `null` is treated as empty values
    pub fn from_node(node: Node) -> Result<Self> {
        match node {
            Node::Null => Ok(Self::new()),
            node @ Node::Mapping(_) => Ok(Self(node)),
            other => Err(CoreError::InvalidValues {
                message: format!("values must be a mapping, found {}", other.type_name()),
            }),
        }
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::new());
        }
        Self::from_node(Node::from_yaml(yaml)?)
    }

    /// Load values from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Build values holding `value` under a dotted path
    ///
    /// `nest_under(&["a", "b"], v)` gives `{a: {b: v}}`.
    pub fn nest_under<S: AsRef<str>>(path: &[S], value: Node) -> Self {
        let nested = path.iter().rev().fold(value, |inner, segment| {
            let mut map = Mapping::new();
            map.insert(segment.as_ref().to_string(), inner);
            Node::Mapping(map)
        });
        // an empty path leaves the value at the root, which must still be a mapping
        Self::from_node(nested).unwrap_or_default()
    }

    /// Deep merge another Values into this one
    ///
    /// Rules:
    /// - Mappings: recursive merge
    /// - Everything else (scalars, sequences, type changes): overlay replaces base
    /// - An empty overlay leaves the base unchanged
    pub fn merge(&mut self, overlay: &Values) {
        if overlay.is_empty() {
            return;
        }
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Consuming variant of [`Values::merge`]
    pub fn merged(mut self, overlay: &Values) -> Self {
        self.merge(overlay);
        self
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&Node> {
        path.split('.')
            .try_fold(&self.0, |node, segment| node.get(segment))
    }

    /// Replace the value at a dotted path, creating intermediate mappings
    pub fn set(&mut self, path: &str, value: Node) {
        let segments: Vec<&str> = path.split('.').collect();
        set_in(&mut self.0, &segments, value);
    }

    /// Get the inner node
    pub fn inner(&self) -> &Node {
        &self.0
    }

    pub fn into_inner(self) -> Node {
        self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        self.0.as_mapping().is_none_or(Mapping::is_empty)
    }

    /// Serialize as `values.yaml` content; empty values produce an empty file
    pub fn to_yaml(&self) -> Result<String> {
        if self.is_empty() {
            return Ok(String::new());
        }
        self.0.to_yaml()
    }
}

fn set_in(node: &mut Node, path: &[&str], value: Node) {
    let Some((head, rest)) = path.split_first() else {
        *node = value;
        return;
    };
    if !node.is_mapping() {
        *node = Node::mapping();
    }
    if let Some(map) = node.as_mapping_mut() {
        set_in(map.entry(head.to_string()).or_default(), rest, value);
    }
}

/// Deep merge `overlay` into `base`, right-biased on collisions
pub fn deep_merge(base: &mut Node, overlay: &Node) {
    match (base, overlay) {
        (Node::Mapping(base_map), Node::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}
