//! CLI commands

pub mod lint;
pub mod package;
pub mod update;
