//! Charter Core - Core types for turning operator manifests into Helm charts
//!
//! This crate provides the foundational types used throughout Charter:
//! - `Node`: The document tree of one manifest or of a values file
//! - `Values`: Externalized configuration with deep merge support
//! - `Manifest` / `ManifestSet`: Kind-validated documents of one release
//! - `Modification`: Rewrite / extraction rules applied to manifests
//! - `ChartMetadata`: Chart.yaml handling and version derivation

pub mod chart;
pub mod error;
pub mod manifest;
pub mod modification;
pub mod node;
pub mod values;

pub use chart::{ChartMetadata, Maintainer, chart_version, crds_chart_name};
pub use error::{CoreError, Result};
pub use manifest::{Manifest, ManifestSet};
pub use modification::{CompiledModification, Modification, ModificationSet};
pub use node::{Mapping, Node};
pub use values::{Values, deep_merge};
