//! Chart output settings and per-release chart operations

use charter_core::Modification;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::lint::{DEFAULT_KUBE_VERSION, LintSeverity};

/// Where charts are written and how they are checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmSettings {
    /// Directory holding one sub-directory per chart
    #[serde(default = "default_src_dir")]
    pub src_dir: PathBuf,

    /// Directory receiving packaged archives
    #[serde(default = "default_target_dir")]
    pub target_dir: PathBuf,

    /// Kubernetes version charts are linted against
    #[serde(default = "default_lint_k8s")]
    pub lint_k8s: String,

    /// Lowest lint severity that fails a chart
    #[serde(default)]
    pub lint_fail_on: LintSeverity,

    #[serde(default = "default_package")]
    pub package: bool,

    /// `oci://` registry packaged charts are pushed to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

fn default_src_dir() -> PathBuf {
    PathBuf::from("charts")
}

fn default_target_dir() -> PathBuf {
    PathBuf::from("target")
}

fn default_lint_k8s() -> String {
    DEFAULT_KUBE_VERSION.to_string()
}

fn default_package() -> bool {
    true
}

impl Default for HelmSettings {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            target_dir: default_target_dir(),
            lint_k8s: default_lint_k8s(),
            lint_fail_on: LintSeverity::default(),
            package: default_package(),
            remote: None,
        }
    }
}

/// How one release becomes a chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOps {
    /// Chart name; CRDs go to `<name>-crds`
    pub name: String,

    /// Kinds removed before any rule runs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drop: Vec<String>,

    /// Rules applied in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifications: Vec<Modification>,
}

impl ChartOps {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: HelmSettings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, HelmSettings::default());
        assert_eq!(settings.lint_k8s, "1.30.0");
        assert_eq!(settings.lint_fail_on, LintSeverity::Warning);
        assert!(settings.package);
        assert_eq!(settings.remote, None);

        let settings: HelmSettings =
            serde_yaml::from_str("remote: oci://ghcr.io/kiemlicz/charts").unwrap();
        assert_eq!(settings.remote.as_deref(), Some("oci://ghcr.io/kiemlicz/charts"));
    }

    #[test]
    fn test_chart_ops_from_yaml() {
        let ops: ChartOps = serde_yaml::from_str(
            r#"
name: kubevirt
drop: [Namespace]
modifications:
  - expression: '.spec.configuration |= "{{ .Values.kubevirt.configuration | toYaml | nindent 4 }}"'
    valuesSelector: .spec.configuration
    kind: ^KubeVirt$
"#,
        )
        .unwrap();

        assert_eq!(ops.name, "kubevirt");
        assert_eq!(ops.drop, vec!["Namespace"]);
        assert_eq!(ops.modifications[0].values_selector, vec![".spec.configuration"]);
        assert_eq!(ops.modifications[0].kind_match.as_deref(), Some("^KubeVirt$"));
    }
}
