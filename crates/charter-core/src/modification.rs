//! Modification rules applied to manifests
//!
//! A rule is configured as plain strings ([`Modification`]) and compiled once
//! per release ([`CompiledModification`]) so that broken regexes or value
//! extraction without a target path are reported before any manifest is
//! touched.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};

/// `.Values.<dotted.path>` reference inside a rule expression
static VALUES_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.Values\.([A-Za-z0-9_-]+(?:\.[A-Za-z0-9_-]+)*)").expect("static regex")
});

/// A configured modification rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modification {
    /// Rewrite expression, or the replacement text of a `textRegex` rule
    pub expression: String,

    /// Read-only queries whose results are externalized into values
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub values_selector: Vec<String>,

    /// Apply only to manifests whose kind matches
    #[serde(default, alias = "kind", skip_serializing_if = "Option::is_none")]
    pub kind_match: Option<String>,

    /// Skip manifests whose kind matches
    #[serde(default, alias = "reject", skip_serializing_if = "Option::is_none")]
    pub kind_reject: Option<String>,

    /// Raw-text regex applied to the materialized template file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_regex: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) if s.is_empty() => Vec::new(),
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

impl Modification {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ..Default::default()
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.values_selector.push(selector.into());
        self
    }

    pub fn with_kind_match(mut self, pattern: impl Into<String>) -> Self {
        self.kind_match = Some(pattern.into());
        self
    }

    pub fn with_kind_reject(mut self, pattern: impl Into<String>) -> Self {
        self.kind_reject = Some(pattern.into());
        self
    }

    pub fn with_text_regex(mut self, pattern: impl Into<String>) -> Self {
        self.text_regex = Some(pattern.into());
        self
    }

    /// Validate and compile the rule
    pub fn compile(&self) -> Result<CompiledModification> {
        let values_path = if self.values_selector.is_empty() {
            None
        } else {
            Some(values_path(&self.expression).ok_or_else(|| CoreError::MissingValuesPath {
                expression: self.expression.clone(),
            })?)
        };

        Ok(CompiledModification {
            expression: self.expression.clone(),
            values_selector: self.values_selector.clone(),
            values_path,
            kind_match: compile_optional("kindMatch", self.kind_match.as_deref())?,
            kind_reject: compile_optional("kindReject", self.kind_reject.as_deref())?,
            text_regex: compile_optional("textRegex", self.text_regex.as_deref())?,
        })
    }
}

fn compile_optional(field: &'static str, pattern: Option<&str>) -> Result<Option<Regex>> {
    match pattern {
        None | Some("") => Ok(None),
        Some(pattern) => Regex::new(pattern)
            .map(Some)
            .map_err(|source| CoreError::InvalidRegex {
                field,
                pattern: pattern.to_string(),
                source,
            }),
    }
}

/// Path segments of the first `.Values.<path>` reference in `expression`
pub fn values_path(expression: &str) -> Option<Vec<String>> {
    VALUES_REFERENCE
        .captures(expression)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split('.').map(str::to_string).collect())
}

/// A validated modification rule
#[derive(Debug, Clone)]
pub struct CompiledModification {
    pub expression: String,
    pub values_selector: Vec<String>,
    /// Target of extracted values; set whenever selectors are present
    pub values_path: Option<Vec<String>>,
    kind_match: Option<Regex>,
    kind_reject: Option<Regex>,
    text_regex: Option<Regex>,
}

impl CompiledModification {
    /// Kind gating: `kindMatch` must match and `kindReject` must not
    pub fn applies_to(&self, kind: &str) -> bool {
        if let Some(re) = &self.kind_match {
            if !re.is_match(kind) {
                return false;
            }
        }
        if let Some(re) = &self.kind_reject {
            if re.is_match(kind) {
                return false;
            }
        }
        true
    }

    pub fn extracts_values(&self) -> bool {
        !self.values_selector.is_empty()
    }

    pub fn text_regex(&self) -> Option<&Regex> {
        self.text_regex.as_ref()
    }

    /// Rules with a `textRegex` are raw-text patches, not tree rewrites
    pub fn is_text_patch(&self) -> bool {
        self.text_regex.is_some()
    }
}

/// Ordered, validated rule list of one chart
#[derive(Debug, Clone, Default)]
pub struct ModificationSet {
    rules: Vec<CompiledModification>,
}

impl ModificationSet {
    pub fn compile(modifications: &[Modification]) -> Result<Self> {
        let rules = modifications
            .iter()
            .map(Modification::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Rules that rewrite the document tree, in configured order
    pub fn tree_rules(&self) -> impl Iterator<Item = (usize, &CompiledModification)> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| !rule.is_text_patch())
    }

    /// Raw-text patches, in configured order
    pub fn text_rules(&self) -> impl Iterator<Item = &CompiledModification> {
        self.rules.iter().filter(|rule| rule.is_text_patch())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledModification> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl From<Vec<CompiledModification>> for ModificationSet {
    fn from(rules: Vec<CompiledModification>) -> Self {
        Self { rules }
    }
}
