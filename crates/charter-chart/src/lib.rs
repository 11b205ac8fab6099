//! Charter Chart - turns parametrized manifests into Helm charts on disk
//!
//! The [`ChartAssembler`] drives one release through the whole pipeline;
//! the [`writer`], [`lint`] and [`package`] modules are usable on their own
//! for existing chart directories.

pub mod assembler;
pub mod cancel;
pub mod error;
pub mod lint;
pub mod package;
pub mod settings;
pub mod writer;

pub use assembler::{
    AssembledChart, AssembledCharts, ChartAssembler, ChartStage, chart_version, manifest_set,
};
pub use cancel::{CancelFlag, CancelGuard};
pub use error::{ChartError, Result};
pub use lint::{DEFAULT_KUBE_VERSION, LintMessage, LintReport, LintSeverity, Linter};
pub use package::{archive_name, package_chart};
pub use settings::{ChartOps, HelmSettings};
pub use writer::{clear_generated, save};
