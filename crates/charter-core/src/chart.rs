//! Chart.yaml metadata and chart version derivation

use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CoreError, Result};

pub const CHART_FILE: &str = "Chart.yaml";
pub const VALUES_FILE: &str = "values.yaml";
pub const TEMPLATES_DIR: &str = "templates";

/// Suffix of the sibling chart holding CRDs
pub const CRDS_CHART_SUFFIX: &str = "-crds";

/// Helm Chart.yaml structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    /// API version (v2)
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Chart name
    pub name: String,

    /// Chart version (SemVer, validated on stamping and lint)
    pub version: String,

    /// Kubernetes version constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Chart type (application or library)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<Maintainer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Upstream application version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Maintainer information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn default_api_version() -> String {
    "v2".to_string()
}

impl ChartMetadata {
    /// Fresh application chart metadata
    pub fn new(name: impl Into<String>, version: &Version) -> Self {
        let name = name.into();
        Self {
            api_version: default_api_version(),
            description: Some(format!("A Helm chart for {}", name)),
            name,
            version: version.to_string(),
            kube_version: None,
            chart_type: Some("application".to_string()),
            keywords: Vec::new(),
            home: None,
            sources: Vec::new(),
            maintainers: Vec::new(),
            icon: None,
            app_version: None,
            deprecated: false,
            annotations: BTreeMap::new(),
        }
    }

    /// Parse a Chart.yaml string
    pub fn parse(content: &str) -> Result<Self> {
        let chart: ChartMetadata = serde_yaml::from_str(content)?;

        if chart.name.trim().is_empty() {
            return Err(CoreError::MissingField {
                field: "name".to_string(),
            });
        }
        if chart.version.trim().is_empty() {
            return Err(CoreError::MissingField {
                field: "version".to_string(),
            });
        }

        Ok(chart)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load `<chart_dir>/Chart.yaml` if it exists
    pub fn load_existing(chart_dir: &Path) -> Result<Option<Self>> {
        let path = chart_dir.join(CHART_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Self::from_file(path).map(Some)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Set version and (optionally) appVersion
    pub fn stamp(&mut self, version: &Version, app_version: Option<&str>) {
        self.version = version.to_string();
        self.app_version = app_version.map(str::to_string);
    }

    /// Parsed chart version
    pub fn semver(&self) -> Result<Version> {
        Version::parse(&self.version).map_err(|source| CoreError::InvalidVersion {
            version: self.version.clone(),
            source,
        })
    }
}

/// Chart version derived from an upstream release tag
///
/// A single leading `v` is dropped (`v1.4.0` becomes `1.4.0`); the rest must
/// be a valid SemVer.
pub fn chart_version(app_version: &str) -> Result<Version> {
    let trimmed = app_version.trim();
    let bare = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    Version::parse(bare).map_err(|source| CoreError::InvalidVersion {
        version: app_version.to_string(),
        source,
    })
}

/// Name of the sibling CRDs chart
pub fn crds_chart_name(chart_name: &str) -> String {
    format!("{}{}", chart_name, CRDS_CHART_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_chart() {
        let content = r#"
apiVersion: v2
name: kubevirt
version: 1.0.0
appVersion: v1.0.0
description: KubeVirt operator
maintainers:
  - name: someone
"#;
        let chart = ChartMetadata::parse(content).unwrap();
        assert_eq!(chart.name, "kubevirt");
        assert_eq!(chart.app_version.as_deref(), Some("v1.0.0"));
        assert_eq!(chart.maintainers.len(), 1);
    }

    #[test]
    fn test_parse_requires_name() {
        let content = "apiVersion: v2\nname: ''\nversion: 1.0.0\n";
        assert!(matches!(
            ChartMetadata::parse(content),
            Err(CoreError::MissingField { .. })
        ));
    }

    #[test]
    fn test_new_and_stamp() {
        let mut chart = ChartMetadata::new("cdi", &Version::new(1, 2, 3));
        assert_eq!(chart.description.as_deref(), Some("A Helm chart for cdi"));
        assert_eq!(chart.app_version, None);

        chart.stamp(&Version::new(1, 3, 0), Some("v1.3.0"));
        assert_eq!(chart.version, "1.3.0");
        assert_eq!(chart.app_version.as_deref(), Some("v1.3.0"));

        let yaml = chart.to_yaml().unwrap();
        assert!(yaml.starts_with("apiVersion: v2\nname: cdi\nversion: 1.3.0\n"));
        assert!(!yaml.contains("deprecated"));
        assert_eq!(ChartMetadata::parse(&yaml).unwrap(), chart);
    }

    #[test]
    fn test_chart_version() {
        assert_eq!(chart_version("v1.4.0").unwrap(), Version::new(1, 4, 0));
        assert_eq!(chart_version("1.4.0").unwrap(), Version::new(1, 4, 0));
        assert_eq!(
            chart_version("v1.59.0-rc.1").unwrap(),
            Version::parse("1.59.0-rc.1").unwrap()
        );
        assert!(chart_version("release-1.4").is_err());
        assert!(chart_version("v1.4").is_err());
    }

    #[test]
    fn test_crds_chart_name() {
        assert_eq!(crds_chart_name("kubevirt"), "kubevirt-crds");
    }
}
