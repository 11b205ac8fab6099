//! Rule engine: applies modification rules to manifests
//!
//! For every manifest the rules run in configured order, one at a time.
//! A rule first extracts values with its selectors (read-only) and then
//! rewrites the document with its expression; the next rule sees the
//! rewritten document. Rules carrying a `textRegex` are raw-text patches and
//! are left to the materializer.

use charter_core::{
    CompiledModification, Manifest, ManifestSet, Modification, ModificationSet, Node, Values,
};
use charter_expr::{Evaluator, YqEvaluator};
use tracing::{debug, trace};

use crate::error::{EngineError, Result};

/// Result of running all rules over one manifest
#[derive(Debug, Clone, PartialEq)]
pub struct Modified {
    pub manifest: Manifest,
    /// Values extracted from this manifest only
    pub values: Values,
}

/// Validated rule list bound to an evaluator
pub struct Modifier {
    evaluator: Box<dyn Evaluator>,
    rules: ModificationSet,
}

impl std::fmt::Debug for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modifier")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Modifier {
    /// Compile and validate every rule
    ///
    /// Regexes must compile, expressions and selectors must parse, and a rule
    /// with selectors must name a `.Values.<path>` target. Nothing is
    /// evaluated yet.
    pub fn new(evaluator: Box<dyn Evaluator>, modifications: &[Modification]) -> Result<Self> {
        let mut rules = Vec::with_capacity(modifications.len());

        for (index, modification) in modifications.iter().enumerate() {
            let rule = modification
                .compile()
                .map_err(|source| EngineError::InvalidRule { index, source })?;

            if !rule.is_text_patch() {
                let expressions =
                    std::iter::once(&rule.expression).chain(rule.values_selector.iter());
                for expression in expressions {
                    evaluator.validate(expression).map_err(|source| {
                        EngineError::InvalidExpression {
                            index,
                            expression: expression.clone(),
                            source,
                        }
                    })?;
                }
            }

            rules.push(rule);
        }

        Ok(Self {
            evaluator,
            rules: ModificationSet::from(rules),
        })
    }

    /// Modifier backed by the built-in evaluator
    pub fn with_default_evaluator(modifications: &[Modification]) -> Result<Self> {
        Self::new(Box::new(YqEvaluator::new()), modifications)
    }

    pub fn rules(&self) -> &ModificationSet {
        &self.rules
    }

    /// Run all tree rules over one manifest
    pub fn modify(&self, manifest: &Manifest) -> Result<Modified> {
        // gating uses the kind the manifest had when it entered the pass
        let kind = manifest.kind().to_string();
        let label = manifest.to_string();
        let mut current = manifest.clone();
        let mut values = Values::new();

        debug!(manifest = %label, rules = self.rules.len(), "Applying modifications");

        for (index, rule) in self.rules.tree_rules() {
            if !rule.applies_to(&kind) {
                trace!(manifest = %label, rule = index, "Rule gated by kind");
                continue;
            }

            let fragment = self.extract(index, rule, &current, &label)?;
            values.merge(&fragment);

            current = self.rewrite(index, rule, &current, &label)?;
        }

        Ok(Modified {
            manifest: current,
            values,
        })
    }

    /// Selector results, each nested under the rule's values path
    fn extract(
        &self,
        index: usize,
        rule: &CompiledModification,
        manifest: &Manifest,
        label: &str,
    ) -> Result<Values> {
        let mut extracted = Values::new();
        let Some(path) = &rule.values_path else {
            return Ok(extracted);
        };

        for selector in &rule.values_selector {
            let results = self
                .evaluator
                .evaluate(selector, manifest.document())
                .map_err(|source| EngineError::Evaluation {
                    index,
                    manifest: label.to_string(),
                    source,
                })?;

            for result in results {
                extracted.merge(&Values::nest_under(path.as_slice(), result));
            }
        }

        if !extracted.is_empty() {
            trace!(manifest = %label, rule = index, path = %path.join("."), "Extracted values");
        }
        Ok(extracted)
    }

    fn rewrite(
        &self,
        index: usize,
        rule: &CompiledModification,
        manifest: &Manifest,
        label: &str,
    ) -> Result<Manifest> {
        let results = self
            .evaluator
            .evaluate(&rule.expression, manifest.document())
            .map_err(|source| EngineError::Evaluation {
                index,
                manifest: label.to_string(),
                source,
            })?;

        match results.into_iter().next() {
            Some(document @ Node::Mapping(_)) => {
                Manifest::new(document).map_err(|source| EngineError::LostKind {
                    index,
                    manifest: label.to_string(),
                    source,
                })
            }
            Some(other) => Err(EngineError::NotAMapping {
                index,
                manifest: label.to_string(),
                found: other.type_name(),
            }),
            None => Err(EngineError::EmptyResult {
                index,
                manifest: label.to_string(),
            }),
        }
    }

    /// Run the rules over a whole set
    ///
    /// Regular manifests accumulate into `values`, CRDs into `crd_values`,
    /// both in manifest order. The first failing manifest aborts the set.
    pub fn parametrize(&self, set: ManifestSet) -> Result<ManifestSet> {
        let ManifestSet {
            crds,
            manifests,
            version,
            app_version,
            mut values,
            mut crd_values,
        } = set;

        let manifests = self.modify_all(manifests, &mut values)?;
        let crds = self.modify_all(crds, &mut crd_values)?;

        Ok(ManifestSet {
            crds,
            manifests,
            version,
            app_version,
            values,
            crd_values,
        })
    }

    fn modify_all(&self, manifests: Vec<Manifest>, values: &mut Values) -> Result<Vec<Manifest>> {
        manifests
            .iter()
            .map(|manifest| {
                let Modified {
                    manifest,
                    values: fragment,
                } = self.modify(manifest)?;
                values.merge(&fragment);
                Ok(manifest)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charter_expr::ExprError;
    use semver::Version;

    fn manifest(yaml: &str) -> Manifest {
        Manifest::from_yaml(yaml).unwrap()
    }

    fn values(yaml: &str) -> Values {
        Values::from_yaml(yaml).unwrap()
    }

    fn modifier(rules: Vec<Modification>) -> Modifier {
        Modifier::with_default_evaluator(&rules).unwrap()
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
  imagePullPolicy: IfNotPresent
"#;

    const ROLE_BINDING: &str = r#"
apiVersion: rbac.authorization.k8s.io/v1
kind: RoleBinding
metadata:
  name: kubevirt-operator-rolebinding
  namespace: kubevirt
subjects:
  - kind: ServiceAccount
    name: kubevirt-operator
    namespace: kubevirt
"#;

    fn namespace_rule() -> Modification {
        Modification::new(r#".metadata.namespace |= "{{ .Release.Namespace }}""#)
    }

    #[test]
    fn test_value_extraction() {
        let engine = modifier(vec![
            namespace_rule(),
            Modification::new(r#".spec.configuration |= "{{ .Values.kubevirt.configuration }}""#)
                .with_selector(".spec.configuration")
                .with_kind_match("KubeVirt"),
            Modification::new(
                r#".spec.customizeComponents |= "{{ .Values.kubevirt.customizeComponents }}""#,
            )
            .with_selector(".spec.customizeComponents")
            .with_kind_match("KubeVirt"),
        ]);

        let Modified { manifest, values: extracted } = engine.modify(&manifest(KUBEVIRT)).unwrap();

        assert_eq!(
            extracted,
            values(
                r#"
kubevirt:
  configuration:
    developerConfiguration:
      featureGates: []
  customizeComponents: {}
"#
            )
        );
        let spec = manifest.document().get("spec").unwrap();
        assert_eq!(
            spec.get("configuration"),
            Some(&Node::from("{{ .Values.kubevirt.configuration }}"))
        );
        assert_eq!(spec.get("imagePullPolicy"), Some(&Node::from("IfNotPresent")));
        assert_eq!(
            manifest.document().get("metadata").and_then(|m| m.get("namespace")),
            Some(&Node::from("{{ .Release.Namespace }}"))
        );
    }

    #[test]
    fn test_no_selectors_no_values() {
        let engine = modifier(vec![namespace_rule()]);
        let modified = engine.modify(&manifest(KUBEVIRT)).unwrap();
        assert!(modified.values.is_empty());
    }

    #[test]
    fn test_list_element_rewrite() {
        let engine = modifier(vec![
            namespace_rule(),
            Modification::new(
                r#"(.subjects[] | select(.name == "kubevirt-operator") .namespace) = "{{ .Release.Namespace }}""#,
            )
            .with_kind_match("RoleBinding"),
        ]);

        let modified = engine.modify(&manifest(ROLE_BINDING)).unwrap();
        let subject = &modified.manifest.document().get("subjects").unwrap().as_sequence().unwrap()[0];
        assert_eq!(subject.get("namespace"), Some(&Node::from("{{ .Release.Namespace }}")));
        assert_eq!(subject.get("name"), Some(&Node::from("kubevirt-operator")));
    }

    #[test]
    fn test_kind_gating() {
        let engine = modifier(vec![
            Modification::new(r#".metadata.labels.gated = "yes""#).with_kind_match(".*Role$"),
        ]);

        for (kind, expected) in [("Role", true), ("ClusterRole", true), ("Deployment", false)] {
            let input = manifest(&format!("kind: {}\nmetadata: {{name: x}}", kind));
            let modified = engine.modify(&input).unwrap();
            let gated = modified
                .manifest
                .document()
                .get("metadata")
                .and_then(|m| m.get("labels"))
                .is_some();
            assert_eq!(gated, expected, "kind {}", kind);
        }
    }

    #[test]
    fn test_reject_skips_extraction_and_rewrite() {
        let engine = modifier(vec![
            Modification::new(r#".spec |= "{{ .Values.spec }}""#)
                .with_selector(".spec")
                .with_kind_reject("^Kube"),
        ]);

        let input = manifest(KUBEVIRT);
        let modified = engine.modify(&input).unwrap();
        assert!(modified.values.is_empty());
        assert_eq!(modified.manifest, input);
    }

    #[test]
    fn test_later_rules_see_earlier_rewrites() {
        let engine = modifier(vec![
            Modification::new(".spec.replicas |= 3"),
            Modification::new(r#".spec.replicas |= "{{ .Values.replicas }}""#)
                .with_selector(".spec.replicas"),
        ]);

        let modified = engine
            .modify(&manifest("kind: Deployment\nspec: {replicas: 1}"))
            .unwrap();
        assert_eq!(modified.values, values("replicas: 3"));
    }

    #[test]
    fn test_gating_uses_original_kind() {
        let engine = modifier(vec![
            Modification::new(r#".kind = "Renamed""#),
            Modification::new(r#".metadata.touched = true"#).with_kind_match("^Original$"),
        ]);

        let modified = engine.modify(&manifest("kind: Original\nmetadata: {}")).unwrap();
        assert_eq!(modified.manifest.kind(), "Renamed");
        assert!(modified.manifest.document().get("metadata").unwrap().get("touched").is_some());
    }

    #[test]
    fn test_multiple_selectors_merge_into_one_target() {
        let engine = modifier(vec![
            Modification::new(r#".spec |= "{{ .Values.cdi.config }}""#)
                .with_selector(".spec.config")
                .with_selector(".spec.workload"),
        ]);

        let modified = engine
            .modify(&manifest(
                "kind: CDI\nspec: {config: {a: 1}, workload: {nodeSelector: {x: y}}}",
            ))
            .unwrap();
        assert_eq!(
            modified.values,
            values("cdi: {config: {a: 1, nodeSelector: {x: y}}}")
        );
    }

    #[test]
    fn test_text_patches_are_not_evaluated() {
        let engine = modifier(vec![
            Modification::new(r#"${1} {{- include "x.labels" . }}"#)
                .with_text_regex("(labels:)"),
        ]);
        let input = manifest(KUBEVIRT);
        assert_eq!(engine.modify(&input).unwrap().manifest, input);
    }

    #[test]
    fn test_rewrite_must_return_a_document() {
        let engine = modifier(vec![Modification::new(".metadata.name")]);
        let err = engine.modify(&manifest(KUBEVIRT)).unwrap_err();
        assert!(matches!(err, EngineError::NotAMapping { index: 0, found: "!!str", .. }));

        let engine = modifier(vec![Modification::new("empty")]);
        let err = engine.modify(&manifest(KUBEVIRT)).unwrap_err();
        assert!(matches!(err, EngineError::EmptyResult { .. }));

        let engine = modifier(vec![namespace_rule(), Modification::new("del(.kind)")]);
        let err = engine.modify(&manifest(KUBEVIRT)).unwrap_err();
        assert!(matches!(err, EngineError::LostKind { index: 1, .. }));
    }

    #[test]
    fn test_evaluation_errors_carry_manifest() {
        let engine = modifier(vec![Modification::new(".metadata.name.first = 1")]);
        let err = engine.modify(&manifest(KUBEVIRT)).unwrap_err();
        match err {
            EngineError::Evaluation { index, manifest, source } => {
                assert_eq!(index, 0);
                assert_eq!(manifest, "KubeVirt/kubevirt");
                assert!(matches!(source, ExprError::TypeMismatch { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rules_validated_up_front() {
        let bad_regex = Modifier::with_default_evaluator(&[
            namespace_rule(),
            Modification::new(".").with_kind_reject("[z-a]"),
        ]);
        assert!(matches!(bad_regex, Err(EngineError::InvalidRule { index: 1, .. })));

        let bad_expression = Modifier::with_default_evaluator(&[Modification::new(".spec |=")]);
        assert!(matches!(bad_expression, Err(EngineError::InvalidExpression { index: 0, .. })));

        let bad_selector = Modifier::with_default_evaluator(&[
            Modification::new(r#".spec |= "{{ .Values.spec }}""#).with_selector(".spec[")
        ]);
        assert!(matches!(bad_selector, Err(EngineError::InvalidExpression { .. })));

        let no_target = Modifier::with_default_evaluator(&[
            Modification::new(r#".spec |= "{{ .Release.Name }}""#).with_selector(".spec")
        ]);
        assert!(matches!(no_target, Err(EngineError::InvalidRule { .. })));
    }

    #[test]
    fn test_parametrize_accumulates_per_partition() {
        let documents = Node::parse_documents(
            r#"
kind: CustomResourceDefinition
metadata: {name: kubevirts.kubevirt.io}
spec: {group: kubevirt.io}
---
kind: ConfigMap
metadata: {name: first}
data: {a: "1"}
---
kind: ConfigMap
metadata: {name: second}
data: {a: "2", b: "3"}
"#,
        )
        .unwrap();
        let set = ManifestSet::classify(documents, Version::new(1, 0, 0), "v1.0.0").unwrap();

        let engine = modifier(vec![
            Modification::new(r#".data |= "{{ .Values.data }}""#)
                .with_selector(".data")
                .with_kind_match("ConfigMap"),
            Modification::new(r#".spec.group |= "{{ .Values.group }}""#)
                .with_selector(".spec.group")
                .with_kind_match("CustomResourceDefinition"),
        ]);

        let set = engine.parametrize(set).unwrap();
        assert_eq!(set.values, values(r#"data: {a: "2", b: "3"}"#));
        assert_eq!(set.crd_values, values("group: kubevirt.io"));
        assert_eq!(set.manifests.len(), 2);
        assert_eq!(set.crds.len(), 1);
        assert_eq!(set.app_version, "v1.0.0");
    }
}
