//! Charter Engine - manifest parametrization and template materialization
//!
//! - [`Modifier`] runs the configured rules over every manifest, rewriting
//!   the documents and collecting the values they externalize
//! - [`materializer`] groups the rewritten manifests into chart templates and
//!   applies the raw-text helper patches

pub mod error;
pub mod materializer;
pub mod modifier;

pub use error::{EngineError, Result};
pub use materializer::{TemplateFile, create_templates, materialize};
pub use modifier::{Modified, Modifier};
