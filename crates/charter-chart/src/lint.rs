//! Chart lint
//!
//! Static checks run against a chart directory after it is written. They
//! catch what `helm lint` would reject for a generated chart without
//! rendering it: bad metadata, unparsable values, broken template actions,
//! documents without `apiVersion`/`kind` and `.Values` references that would
//! dereference a missing mapping at install time.

use charter_core::chart::{CHART_FILE, TEMPLATES_DIR, VALUES_FILE};
use charter_core::{ChartMetadata, Node, Values};
use once_cell::sync::Lazy;
use regex::Regex;
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use walkdir::WalkDir;

use crate::error::{ChartError, Result};

/// Kubernetes version charts are linted against when none is configured
pub const DEFAULT_KUBE_VERSION: &str = "1.30.0";

static VALUES_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.Values((?:\.[A-Za-z_][A-Za-z0-9_]*)+)").expect("static regex")
});

static DOCUMENT_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^---[ \t]*$").expect("static regex"));

static TOP_LEVEL_API_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^apiVersion:").expect("static regex"));

static TOP_LEVEL_KIND: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^kind:").expect("static regex"));

/// Lint severity levels
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    /// Informational note
    Info,
    /// May break installs on some clusters
    #[default]
    Warning,
    /// Will break the chart
    Error,
}

impl LintSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LintSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LintSeverity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown lint severity '{}', expected info, warning or error",
                other
            )),
        }
    }
}

/// A single lint finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintMessage {
    pub severity: LintSeverity,
    /// File the finding is about, relative to the chart root
    pub path: String,
    pub message: String,
}

impl LintMessage {
    fn new(severity: LintSeverity, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LintMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.severity.as_str().to_uppercase(),
            self.path,
            self.message
        )
    }
}

/// Findings for one chart
#[derive(Debug, Clone, Default, Serialize)]
pub struct LintReport {
    pub chart: String,
    pub messages: Vec<LintMessage>,
}

impl LintReport {
    /// Most severe finding, `None` for a clean chart
    pub fn highest(&self) -> Option<LintSeverity> {
        self.messages.iter().map(|m| m.severity).max()
    }

    /// Findings at or above `severity`
    pub fn at_least(&self, severity: LintSeverity) -> impl Iterator<Item = &LintMessage> {
        self.messages.iter().filter(move |m| m.severity >= severity)
    }

    pub fn count(&self, severity: LintSeverity) -> usize {
        self.messages.iter().filter(|m| m.severity == severity).count()
    }

    pub fn is_clean(&self) -> bool {
        self.messages.is_empty()
    }

    /// Fail when any finding reaches `threshold`
    pub fn check(&self, threshold: LintSeverity) -> Result<()> {
        let count = self.at_least(threshold).count();
        if count > 0 {
            return Err(ChartError::LintFailed {
                chart: self.chart.clone(),
                threshold,
                count,
            });
        }
        Ok(())
    }

    fn push(&mut self, severity: LintSeverity, path: impl Into<String>, message: impl Into<String>) {
        self.messages.push(LintMessage::new(severity, path, message));
    }
}

/// Lints charts against a target Kubernetes version
#[derive(Debug, Clone)]
pub struct Linter {
    kube_version: Version,
    /// Set when the configured version was unusable
    fallback_reason: Option<String>,
}

impl Default for Linter {
    fn default() -> Self {
        Self::new(DEFAULT_KUBE_VERSION)
    }
}

impl Linter {
    /// Linter for `kube_version` (`1.30`, `1.30.0` and `v1.30.0` are accepted)
    ///
    /// An unparsable version falls back to [`DEFAULT_KUBE_VERSION`] and every
    /// report produced by this linter carries a warning about it.
    pub fn new(kube_version: &str) -> Self {
        match parse_kube_version(kube_version) {
            Some(version) => Self {
                kube_version: version,
                fallback_reason: None,
            },
            None => Self {
                kube_version: Version::new(1, 30, 0),
                fallback_reason: Some(format!(
                    "invalid lint Kubernetes version '{}', linting against {}",
                    kube_version, DEFAULT_KUBE_VERSION
                )),
            },
        }
    }

    pub fn kube_version(&self) -> &Version {
        &self.kube_version
    }

    /// Lint the chart in `chart_dir`
    pub fn lint(&self, chart_dir: &Path) -> Result<LintReport> {
        if !chart_dir.is_dir() {
            return Err(ChartError::NotAChart {
                path: chart_dir.to_path_buf(),
            });
        }

        let mut report = LintReport {
            chart: chart_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            messages: Vec::new(),
        };

        if let Some(reason) = &self.fallback_reason {
            report.push(LintSeverity::Warning, CHART_FILE, reason.clone());
        }

        self.lint_metadata(chart_dir, &mut report);
        let values = lint_values(chart_dir, &mut report);
        lint_templates(chart_dir, values.as_ref(), &mut report)?;

        Ok(report)
    }

    fn lint_metadata(&self, chart_dir: &Path, report: &mut LintReport) {
        let path = chart_dir.join(CHART_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => {
                report.push(LintSeverity::Error, CHART_FILE, "Chart.yaml file is missing");
                return;
            }
        };
        let chart: ChartMetadata = match serde_yaml::from_str(&content) {
            Ok(chart) => chart,
            Err(e) => {
                report.push(
                    LintSeverity::Error,
                    CHART_FILE,
                    format!("unable to parse Chart.yaml: {}", e),
                );
                return;
            }
        };

        report.chart = chart.name.clone();

        if chart.api_version != "v2" && chart.api_version != "v1" {
            report.push(
                LintSeverity::Error,
                CHART_FILE,
                format!("apiVersion '{}' is not valid, expected v2", chart.api_version),
            );
        }

        if chart.name.trim().is_empty() {
            report.push(LintSeverity::Error, CHART_FILE, "name is required");
        } else if let Some(dir_name) = chart_dir.file_name().map(|n| n.to_string_lossy()) {
            if dir_name != chart.name {
                report.push(
                    LintSeverity::Error,
                    CHART_FILE,
                    format!(
                        "directory name ({}) and chart name ({}) must match",
                        dir_name, chart.name
                    ),
                );
            }
        }

        if chart.version.trim().is_empty() {
            report.push(LintSeverity::Error, CHART_FILE, "version is required");
        } else if let Err(e) = Version::parse(&chart.version) {
            report.push(
                LintSeverity::Error,
                CHART_FILE,
                format!("version '{}' is not a valid SemVer: {}", chart.version, e),
            );
        }

        if chart.icon.is_none() {
            report.push(LintSeverity::Info, CHART_FILE, "icon is recommended");
        }

        if let Some(constraint) = chart.kube_version.as_deref() {
            match satisfies(constraint, &self.kube_version) {
                Ok(true) => {}
                Ok(false) => report.push(
                    LintSeverity::Error,
                    CHART_FILE,
                    format!(
                        "chart requires kubeVersion: {} which is incompatible with Kubernetes v{}",
                        constraint, self.kube_version
                    ),
                ),
                Err(e) => report.push(
                    LintSeverity::Error,
                    CHART_FILE,
                    format!("kubeVersion '{}' is not a valid constraint: {}", constraint, e),
                ),
            }
        }
    }
}

/// Parse `1.30`, `1.30.0` or `v1.30.0`
fn parse_kube_version(version: &str) -> Option<Version> {
    let bare = version.trim().trim_start_matches(['v', 'V']);
    if bare.is_empty() {
        return None;
    }
    Version::parse(bare)
        .or_else(|_| Version::parse(&format!("{}.0", bare)))
        .ok()
}

/// Evaluate a Helm `kubeVersion` constraint; `||` separates alternatives
fn satisfies(constraint: &str, version: &Version) -> std::result::Result<bool, semver::Error> {
    let mut matched = false;
    for alternative in constraint.split("||") {
        let req = VersionReq::parse(alternative.trim())?;
        matched |= req.matches(version);
    }
    Ok(matched)
}

fn lint_values(chart_dir: &Path, report: &mut LintReport) -> Option<Values> {
    let path = chart_dir.join(VALUES_FILE);
    if !path.exists() {
        report.push(LintSeverity::Info, VALUES_FILE, "file does not exist");
        return Some(Values::new());
    }
    match Values::from_file(&path) {
        Ok(values) => Some(values),
        Err(e) => {
            report.push(
                LintSeverity::Error,
                VALUES_FILE,
                format!("unable to parse values.yaml: {}", e),
            );
            None
        }
    }
}

fn lint_templates(chart_dir: &Path, values: Option<&Values>, report: &mut LintReport) -> Result<()> {
    let templates_dir = chart_dir.join(TEMPLATES_DIR);
    if !templates_dir.is_dir() {
        report.push(LintSeverity::Warning, TEMPLATES_DIR, "directory does not exist");
        return Ok(());
    }

    let mut manifests = 0;
    for entry in WalkDir::new(&templates_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path
            .strip_prefix(chart_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                report.push(LintSeverity::Error, relative, format!("unable to read: {}", e));
                continue;
            }
        };

        let is_manifest = path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if is_manifest {
            manifests += 1;
        }

        if let Some(line) = unclosed_action(&content) {
            report.push(
                LintSeverity::Error,
                relative.clone(),
                format!("unclosed action '{{{{' at line {}", line),
            );
            continue;
        }

        if is_manifest {
            lint_documents(&relative, &content, report);
        }
        if let Some(values) = values {
            lint_value_references(&relative, &content, values, report);
        }
    }

    if manifests == 0 {
        report.push(LintSeverity::Info, TEMPLATES_DIR, "chart has no templates to render");
    }

    Ok(())
}

/// Line of the first `{{` with no matching `}}`
///
/// A stray `}}` outside an action is plain text to the template engine and
/// is not reported.
fn unclosed_action(content: &str) -> Option<usize> {
    let mut position = 0;
    while let Some(open) = content[position..].find("{{") {
        let open = position + open;
        match content[open + 2..].find("}}") {
            Some(close) => position = open + 2 + close + 2,
            None => return Some(content[..open].matches('\n').count() + 1),
        }
    }
    None
}

fn lint_documents(path: &str, content: &str, report: &mut LintReport) {
    for (index, document) in DOCUMENT_SEPARATOR.split(content).enumerate() {
        if is_blank_document(document) {
            continue;
        }
        if !TOP_LEVEL_API_VERSION.is_match(document) {
            report.push(
                LintSeverity::Error,
                path,
                format!("document {}: object has no apiVersion", index + 1),
            );
        }
        if !TOP_LEVEL_KIND.is_match(document) {
            report.push(
                LintSeverity::Error,
                path,
                format!("document {}: object has no kind", index + 1),
            );
        }
    }
}

fn is_blank_document(document: &str) -> bool {
    document.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || (line.starts_with("{{") && line.ends_with("}}"))
    })
}

fn lint_value_references(path: &str, content: &str, values: &Values, report: &mut LintReport) {
    let references: BTreeSet<&str> = VALUES_REFERENCE
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim_start_matches('.'))
        .collect();

    for reference in references {
        let segments: Vec<&str> = reference.split('.').collect();
        let mut node = values.inner();

        for (depth, segment) in segments.iter().enumerate() {
            let is_leaf = depth + 1 == segments.len();
            let child = match node {
                Node::Mapping(map) => map.get(*segment),
                _ => None,
            };
            match child {
                Some(child) => node = child,
                None if is_leaf => {
                    report.push(
                        LintSeverity::Info,
                        path,
                        format!(".Values.{} is not set", reference),
                    );
                    break;
                }
                None => {
                    let parent = segments[..=depth].join(".");
                    report.push(
                        LintSeverity::Error,
                        path,
                        format!(
                            ".Values.{} is missing, so rendering .Values.{} fails with a nil pointer",
                            parent, reference
                        ),
                    );
                    break;
                }
            }
        }
    }
}
