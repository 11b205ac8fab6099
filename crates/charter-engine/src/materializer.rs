//! Chart materializer: rewritten manifests to template files
//!
//! Two passes, strictly in this order:
//! 1. structural: group documents by kind and serialize them, then undo the
//!    quoting YAML serialization puts around `{{ ... }}` placeholders
//! 2. textual: apply the `textRegex` patches to each file's full text

use charter_core::chart::TEMPLATES_DIR;
use charter_core::{Manifest, ModificationSet};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::Result;

/// A single quoted placeholder: `'{{ ... }}'` or `"{{ ... }}"` with no braces inside
static QUOTED_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"'(\{\{[^{}]*\}\})'|"(\{\{[^{}]*\}\})""#).expect("static regex")
});

/// Separator between documents of one template file
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// One chart template holding every manifest of a kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Path relative to the chart root, e.g. `templates/configmap.yaml`
    pub name: String,
    /// Kind as found on the first manifest of the group
    pub kind: String,
    pub content: String,
}

impl TemplateFile {
    /// File name inside `templates/`
    pub fn file_name(&self) -> &str {
        self.name
            .rsplit_once('/')
            .map_or(self.name.as_str(), |(_, file)| file)
    }
}

/// Template path for a kind
pub fn template_name(kind: &str) -> String {
    format!("{}/{}.yaml", TEMPLATES_DIR, kind.to_lowercase())
}

/// Group manifests by kind, in order of first appearance
pub fn materialize(manifests: &[Manifest]) -> Result<Vec<TemplateFile>> {
    let mut files: IndexMap<String, TemplateFile> = IndexMap::new();

    for manifest in manifests {
        let name = template_name(manifest.kind());
        let document = manifest.to_yaml()?;

        match files.get_mut(&name) {
            Some(file) => {
                file.content.push_str(DOCUMENT_SEPARATOR);
                file.content.push_str(&document);
            }
            None => {
                files.insert(
                    name.clone(),
                    TemplateFile {
                        name,
                        kind: manifest.kind().to_string(),
                        content: document,
                    },
                );
            }
        }
    }

    Ok(files
        .into_values()
        .map(|mut file| {
            file.content = unquote_placeholders(&file.content);
            file
        })
        .collect())
}

/// Strip the quotes YAML serialization adds around a lone `{{ ... }}` value
///
/// Only a matching pair wrapping exactly one placeholder is removed; quotes
/// around text mixing placeholders and literals stay.
pub fn unquote_placeholders(content: &str) -> String {
    QUOTED_PLACEHOLDER
        .replace_all(content, "${1}${2}")
        .into_owned()
}

/// Apply every `textRegex` patch whose kind gate admits the file
pub fn insert_helpers(file: &mut TemplateFile, rules: &ModificationSet) {
    for rule in rules.text_rules() {
        let Some(regex) = rule.text_regex() else {
            continue;
        };
        if !rule.applies_to(&file.kind) {
            continue;
        }
        let patched = regex.replace_all(&file.content, rule.expression.as_str());
        if let std::borrow::Cow::Owned(patched) = patched {
            debug!(template = %file.name, pattern = %regex, "Inserted helper");
            file.content = patched;
        }
    }
}

/// Materialize manifests and apply the text patches
pub fn create_templates(manifests: &[Manifest], rules: &ModificationSet) -> Result<Vec<TemplateFile>> {
    let mut files = materialize(manifests)?;
    for file in &mut files {
        insert_helpers(file, rules);
    }
    Ok(files)
}
