//! Release driver
//!
//! Every configured release runs in its own tokio task under its own timeout.
//! Fetching is async; building the charts is CPU and filesystem work and runs
//! on the blocking pool. A failing or timed-out release never affects its
//! siblings: when a release times out its pipeline is cancelled at the next
//! stage, so nothing more is written for it.

use charter_chart::{
    AssembledCharts, CancelFlag, ChartAssembler, ChartError, ChartStage, HelmSettings,
    manifest_set,
};
use charter_core::ChartMetadata;
use futures::future::join_all;
use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};

use crate::config::ReleaseConfig;
use crate::registry::{ChartRegistry, RegistryError};
use crate::source::{self, SourceError};

#[derive(Error, Debug, Diagnostic)]
pub enum ReleaseError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error("Timed out after {0:?}")]
    #[diagnostic(
        code(charter::release::timeout),
        help("raise the release's timeout in the config")
    )]
    Timeout(Duration),

    #[error("Release task failed: {0}")]
    #[diagnostic(code(charter::release::task))]
    Task(#[from] tokio::task::JoinError),
}

/// What happened to one release
#[derive(Debug)]
pub enum Outcome {
    /// Charts were regenerated
    Updated(Box<AssembledCharts>),
    /// The existing chart already carries the latest version
    UpToDate { app_version: String },
    Failed(ReleaseError),
}

#[derive(Debug)]
pub struct ReleaseReport {
    pub name: String,
    pub outcome: Outcome,
}

impl ReleaseReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Run every release concurrently and wait for all of them
///
/// Reports come back in the order the releases were given.
pub async fn run_all(
    releases: Vec<ReleaseConfig>,
    settings: &HelmSettings,
    force: bool,
) -> Vec<ReleaseReport> {
    let tasks: Vec<_> = releases
        .into_iter()
        .map(|release| {
            let name = release.name.clone();
            let settings = settings.clone();
            let handle = tokio::spawn(run_with_timeout(release, settings, force));
            (name, handle)
        })
        .collect();

    let (names, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
    let results = join_all(handles).await;

    names
        .into_iter()
        .zip(results)
        .map(|(name, joined)| {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => Outcome::Failed(ReleaseError::Task(e)),
            };
            ReleaseReport { name, outcome }
        })
        .collect()
}

async fn run_with_timeout(release: ReleaseConfig, settings: HelmSettings, force: bool) -> Outcome {
    let span = info_span!("release", name = %release.name);
    let timeout = release.timeout;

    let result = tokio::time::timeout(timeout, update(release, settings, force))
        .instrument(span.clone())
        .await;

    span.in_scope(|| match result {
        Ok(Ok(outcome)) => {
            info!("Release handled");
            outcome
        }
        Ok(Err(e)) => {
            error!(error = %e, "Release failed");
            Outcome::Failed(e)
        }
        Err(_) => {
            error!(timeout = ?timeout, "Release timed out");
            Outcome::Failed(ReleaseError::Timeout(timeout))
        }
    })
}

/// Fetch, compare and (re)build one release
pub async fn update(
    release: ReleaseConfig,
    settings: HelmSettings,
    force: bool,
) -> Result<Outcome, ReleaseError> {
    let source = source::from_config(&release.source)?;
    let latest = source.latest_version().await?;

    let chart_dir = settings.src_dir.join(&release.chart.name);
    if !force {
        match ChartMetadata::load_existing(&chart_dir) {
            Ok(Some(existing)) if existing.app_version.as_deref() == Some(latest.as_str()) => {
                info!(app_version = %latest, "Chart is up to date");
                return Ok(Outcome::UpToDate {
                    app_version: latest,
                });
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Existing Chart.yaml is unreadable, regenerating");
            }
        }
    }

    let registry = settings
        .remote
        .as_deref()
        .map(ChartRegistry::new)
        .transpose()?;

    let fetched = source.fetch(&latest).await?;
    info!(documents = fetched.documents.len(), app_version = %fetched.app_version, "Fetched manifests");

    // Dropping this future (on timeout) raises the flag
    let cancel = CancelFlag::new();
    let _guard = cancel.drop_guard();

    let ops = release.chart;
    let span = tracing::Span::current();
    let mut charts = tokio::task::spawn_blocking(move || -> Result<AssembledCharts, ReleaseError> {
        let _enter = span.enter();
        let assembler = ChartAssembler::new(settings).with_cancel(cancel);
        let set = manifest_set(fetched.documents, &fetched.app_version)?;
        Ok(assembler.prepare(set, &ops)?)
    })
    .await??;

    if let Some(registry) = registry {
        push_all(&registry, &mut charts).await?;
    }

    Ok(Outcome::Updated(Box::new(charts)))
}

/// Push every packaged chart of a release, CRD chart first
async fn push_all(
    registry: &ChartRegistry,
    charts: &mut AssembledCharts,
) -> Result<(), ReleaseError> {
    for chart in charts.iter_mut() {
        let Some(archive) = chart.package.clone() else {
            continue;
        };
        let reference = registry.push(&archive, &chart.path).await?;
        info!(chart = %chart.name, reference = %reference, "Chart pushed");
        chart.pushed = Some(reference);
        chart.stage = ChartStage::Pushed;
    }
    Ok(())
}
