//! Chart assembler: one release's manifests to saved, linted charts
//!
//! ```text
//! ManifestSet ─► drop kinds ─► rules ─┬─► <name>-crds  (CRDs, if any)
//!                                     └─► <name>       (everything else)
//! ```
//!
//! Each chart walks through [`ChartStage`]s in order; the CRD chart is
//! finished before the main chart starts. The [`CancelFlag`] is checked
//! before every stage is entered, so a cancelled release writes nothing
//! past the stage it was in.

use charter_core::{
    ChartMetadata, CoreError, Manifest, ManifestSet, Node, Values, crds_chart_name,
};
use charter_engine::{Modifier, create_templates};
use semver::Version;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, info_span, warn};

use crate::cancel::CancelFlag;
use crate::error::{ChartError, Result};
use crate::lint::{LintReport, LintSeverity, Linter};
use crate::package::package_chart;
use crate::settings::{ChartOps, HelmSettings};
use crate::writer;

/// Progress of a chart through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChartStage {
    Raw,
    Filtered,
    Modified,
    Materialized,
    Saved,
    Linted,
    Packaged,
    /// Pushed to a chart registry (done by the caller, after packaging)
    Pushed,
}

impl fmt::Display for ChartStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Raw => "raw",
            Self::Filtered => "filtered",
            Self::Modified => "modified",
            Self::Materialized => "materialized",
            Self::Saved => "saved",
            Self::Linted => "linted",
            Self::Packaged => "packaged",
            Self::Pushed => "pushed",
        };
        f.write_str(name)
    }
}

/// A chart written by the assembler
#[derive(Debug, Clone)]
pub struct AssembledChart {
    pub name: String,
    pub path: PathBuf,
    pub version: Version,
    pub app_version: Option<String>,
    /// Last stage reached
    pub stage: ChartStage,
    pub lint: LintReport,
    pub package: Option<PathBuf>,
    /// Registry reference the package was pushed to
    pub pushed: Option<String>,
}

/// Charts produced for one release
#[derive(Debug, Clone)]
pub struct AssembledCharts {
    pub main: AssembledChart,
    pub crds: Option<AssembledChart>,
}

impl AssembledCharts {
    /// CRD chart first, then the main chart
    pub fn iter(&self) -> impl Iterator<Item = &AssembledChart> {
        self.crds.iter().chain(std::iter::once(&self.main))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AssembledChart> {
        self.crds.iter_mut().chain(std::iter::once(&mut self.main))
    }
}

/// Chart version derived from an upstream release tag
///
/// `v1.4.0` gives `1.4.0`; anything that is not SemVer once a leading `v` is
/// dropped is rejected.
pub fn chart_version(app_version: &str) -> Result<Version> {
    charter_core::chart_version(app_version).map_err(|e| match e {
        CoreError::InvalidVersion { version, source } => {
            ChartError::InvalidVersion { version, source }
        }
        other => ChartError::Core(other),
    })
}

/// Classify decoded documents into a [`ManifestSet`] stamped from `app_version`
pub fn manifest_set(documents: Vec<Node>, app_version: &str) -> Result<ManifestSet> {
    let version = chart_version(app_version)?;
    Ok(ManifestSet::classify(documents, version, app_version)?)
}

/// Runs the chart pipeline for one release
#[derive(Debug)]
pub struct ChartAssembler {
    settings: HelmSettings,
    linter: Linter,
    cancel: CancelFlag,
}

impl ChartAssembler {
    pub fn new(settings: HelmSettings) -> Self {
        let linter = Linter::new(&settings.lint_k8s);
        Self {
            settings,
            linter,
            cancel: CancelFlag::new(),
        }
    }

    /// Stop at the next stage once `cancel` is raised
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn settings(&self) -> &HelmSettings {
        &self.settings
    }

    /// Build, save, lint and (optionally) package the charts of a release
    ///
    /// The rules of `ops` are compiled here, with the built-in evaluator.
    pub fn prepare(&self, set: ManifestSet, ops: &ChartOps) -> Result<AssembledCharts> {
        let span = info_span!("chart", name = %ops.name);
        let _enter = span.enter();

        let modifier = Modifier::with_default_evaluator(&ops.modifications)?;

        info!(
            manifests = set.manifests.len(),
            crds = set.crds.len(),
            version = %set.version,
            "Creating or updating chart"
        );
        self.reach(&ops.name, ChartStage::Raw)?;

        let set = set.filter_kinds(ops.drop.as_slice());
        self.reach(&ops.name, ChartStage::Filtered)?;

        let set = modifier.parametrize(set)?;
        self.reach(&ops.name, ChartStage::Modified)?;

        let crds = if set.contains_crds() {
            let name = crds_chart_name(&ops.name);
            info!(count = set.crds.len(), chart = %name, "Moving CRDs to dedicated chart");
            Some(self.build(&modifier, &name, &set.crds, &set.crd_values, &set.version, None)?)
        } else {
            None
        };

        let main = self.build(
            &modifier,
            &ops.name,
            &set.manifests,
            &set.values,
            &set.version,
            Some(set.app_version.as_str()),
        )?;

        Ok(AssembledCharts { main, crds })
    }

    fn build(
        &self,
        modifier: &Modifier,
        name: &str,
        manifests: &[Manifest],
        values: &Values,
        version: &Version,
        app_version: Option<&str>,
    ) -> Result<AssembledChart> {
        let templates = create_templates(manifests, modifier.rules())?;
        self.reach(name, ChartStage::Materialized)?;

        let path = self.settings.src_dir.join(name);
        let mut metadata = match ChartMetadata::load_existing(&path) {
            Ok(Some(existing)) => existing,
            Ok(None) => ChartMetadata::new(name, version),
            Err(e) => {
                warn!(chart = %name, error = %e, "Existing Chart.yaml is unreadable, recreating it");
                ChartMetadata::new(name, version)
            }
        };
        metadata.name = name.to_string();
        metadata.stamp(version, app_version);

        writer::save(&path, &metadata, &templates, values)?;
        self.reach(name, ChartStage::Saved)?;

        let lint = self.linter.lint(&path)?;
        report_findings(&lint, self.settings.lint_fail_on);
        lint.check(self.settings.lint_fail_on)?;
        let mut stage = ChartStage::Linted;
        self.reach(name, stage)?;

        let package = if self.settings.package {
            let archive = package_chart(&path, &self.settings.target_dir)?;
            stage = ChartStage::Packaged;
            log_stage(name, stage);
            Some(archive)
        } else {
            None
        };

        Ok(AssembledChart {
            name: name.to_string(),
            path,
            version: version.clone(),
            app_version: app_version.map(str::to_string),
            stage,
            lint,
            package,
            pushed: None,
        })
    }

    /// Enter `stage` unless the pipeline was cancelled
    fn reach(&self, chart: &str, stage: ChartStage) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!(chart, %stage, "Chart pipeline cancelled");
            return Err(ChartError::Cancelled {
                chart: chart.to_string(),
                stage,
            });
        }
        log_stage(chart, stage);
        Ok(())
    }
}

fn log_stage(chart: &str, stage: ChartStage) {
    info!(chart, %stage, "Chart stage reached");
}

fn report_findings(report: &LintReport, threshold: LintSeverity) {
    for message in &report.messages {
        if message.severity >= threshold {
            warn!(chart = %report.chart, path = %message.path, severity = %message.severity, "{}", message.message);
        } else {
            info!(chart = %report.chart, path = %message.path, severity = %message.severity, "{}", message.message);
        }
    }
}
