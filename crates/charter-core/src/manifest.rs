//! Manifest documents and the per-release manifest set

use semver::Version;

use crate::error::{CoreError, Result};
use crate::node::Node;
use crate::values::Values;

/// Field every manifest must carry
pub const KIND: &str = "kind";

/// Kinds starting with this prefix are moved to the CRDs chart
pub const CRD_KIND_PREFIX: &str = "CustomResourceDefinition";

/// One Kubernetes object: a mapping with a non-empty string `kind`
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    document: Node,
}

impl Manifest {
    pub fn new(document: Node) -> Result<Self> {
        if !document.is_mapping() {
            return Err(CoreError::NotAMapping {
                found: document.type_name(),
            });
        }
        match document.get(KIND).and_then(Node::as_str) {
            Some(kind) if !kind.trim().is_empty() => Ok(Self { document }),
            _ => Err(CoreError::MissingKind {
                document: describe(&document),
            }),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::new(Node::from_yaml(yaml)?)
    }

    pub fn kind(&self) -> &str {
        self.document
            .get(KIND)
            .and_then(Node::as_str)
            .unwrap_or_default()
    }

    /// `metadata.name`, when present
    pub fn name(&self) -> Option<&str> {
        self.document
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Node::as_str)
    }

    pub fn is_crd(&self) -> bool {
        self.kind().starts_with(CRD_KIND_PREFIX)
    }

    pub fn document(&self) -> &Node {
        &self.document
    }

    pub fn into_document(self) -> Node {
        self.document
    }

    pub fn to_yaml(&self) -> Result<String> {
        self.document.to_yaml()
    }
}

impl TryFrom<Node> for Manifest {
    type Error = CoreError;

    fn try_from(document: Node) -> Result<Self> {
        Self::new(document)
    }
}

impl std::fmt::Display for Manifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind(), self.name().unwrap_or("<unnamed>"))
    }
}

fn describe(document: &Node) -> String {
    let name = document
        .get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(Node::as_str)
        .unwrap_or("<unnamed>");
    format!("metadata.name={}", name)
}

/// Manifests of one release, partitioned into CRDs and everything else
///
/// Created once per update cycle from freshly decoded documents; each
/// pipeline step consumes the set and hands back a new one.
#[derive(Debug, Clone)]
pub struct ManifestSet {
    pub crds: Vec<Manifest>,
    pub manifests: Vec<Manifest>,
    /// Chart version stamped on both charts
    pub version: Version,
    /// Upstream release version, stamped on the main chart only
    pub app_version: String,
    pub values: Values,
    pub crd_values: Values,
}

impl ManifestSet {
    /// Partition decoded documents by kind
    ///
    /// Document order is preserved within each partition. A document
    /// without a `kind` rejects the whole set.
    pub fn classify(
        documents: Vec<Node>,
        version: Version,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        let mut crds = Vec::new();
        let mut manifests = Vec::new();

        for document in documents {
            let manifest = Manifest::new(document)?;
            if manifest.is_crd() {
                crds.push(manifest);
            } else {
                manifests.push(manifest);
            }
        }

        Ok(Self {
            crds,
            manifests,
            version,
            app_version: app_version.into(),
            values: Values::new(),
            crd_values: Values::new(),
        })
    }

    pub fn contains_crds(&self) -> bool {
        !self.crds.is_empty()
    }

    /// Drop manifests whose kind is denied (case-insensitive exact match)
    ///
    /// CRDs and accumulated values pass through untouched.
    pub fn filter_kinds<S: AsRef<str>>(self, deny: &[S]) -> Self {
        if deny.is_empty() {
            return self;
        }
        let denied: Vec<String> = deny.iter().map(|k| k.as_ref().to_lowercase()).collect();
        let manifests = self
            .manifests
            .into_iter()
            .filter(|m| !denied.contains(&m.kind().to_lowercase()))
            .collect();

        Self { manifests, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(yaml: &str) -> Vec<Node> {
        Node::parse_documents(yaml).unwrap()
    }

    const BUNDLE: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: kubevirts.kubevirt.io
---
apiVersion: v1
kind: Namespace
metadata:
  name: kubevirt
---
apiVersion: v1
kind: ServiceAccount
metadata:
  name: kubevirt-operator
---
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRole
metadata:
  name: kubevirt-operator
---
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinitionList
metadata:
  name: extra
"#;

    fn set() -> ManifestSet {
        ManifestSet::classify(docs(BUNDLE), Version::new(1, 0, 0), "v1.0.0").unwrap()
    }

    #[test]
    fn test_manifest_requires_kind() {
        assert!(Manifest::from_yaml("metadata: {name: a}").is_err());
        assert!(Manifest::from_yaml("kind: ''").is_err());
        assert!(Manifest::from_yaml("kind: 3").is_err());
        assert!(Manifest::from_yaml("- kind: A").is_err());
        assert_eq!(Manifest::from_yaml("kind: Pod").unwrap().kind(), "Pod");
    }

    #[test]
    fn test_classify_partitions_crds() {
        let set = set();
        assert_eq!(set.crds.len(), 2);
        assert_eq!(set.manifests.len(), 3);
        assert!(set.crds.iter().all(Manifest::is_crd));
        assert!(set.manifests.iter().all(|m| !m.is_crd()));
        assert_eq!(set.manifests[0].kind(), "Namespace");
        assert_eq!(set.manifests[2].kind(), "ClusterRole");
    }

    #[test]
    fn test_classify_rejects_document_without_kind() {
        let result = ManifestSet::classify(
            docs("kind: Pod\n---\nmetadata: {name: broken}\n"),
            Version::new(1, 0, 0),
            "1.0.0",
        );
        assert!(matches!(result, Err(CoreError::MissingKind { .. })));
    }

    #[test]
    fn test_filter_kinds_is_case_insensitive() {
        let filtered = set().filter_kinds(&["namespace", "CLUSTERROLE"]);
        let kinds: Vec<_> = filtered.manifests.iter().map(Manifest::kind).collect();
        assert_eq!(kinds, vec!["ServiceAccount"]);
        assert_eq!(filtered.crds.len(), 2);
    }

    #[test]
    fn test_filter_kinds_exact_match_only() {
        let filtered = set().filter_kinds(&["Service", "Unknown"]);
        assert_eq!(filtered.manifests.len(), 3);
    }

    #[test]
    fn test_display() {
        let manifest = Manifest::from_yaml("kind: Pod\nmetadata: {name: web}").unwrap();
        assert_eq!(manifest.to_string(), "Pod/web");
    }
}
