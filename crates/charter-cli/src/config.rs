//! Configuration file loading
//!
//! `config.yaml` is deep-merged with an optional `.local/config.yaml` next to
//! it, then deserialized and validated. Sequences are replaced as a whole by
//! the overlay, so an overlay `releases:` list supersedes the base one.

use charter_chart::{ChartOps, HelmSettings};
use charter_core::{Node, deep_merge};
use charter_engine::{EngineError, Modifier};
use charter_expr::YqEvaluator;
use miette::Diagnostic;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Overlay merged over the config file, relative to its directory
pub const LOCAL_OVERLAY: &str = ".local/config.yaml";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Config file not found: {}", path.display())]
    #[diagnostic(
        code(charter::config::not_found),
        help("pass --config <FILE> or create config.yaml in the working directory")
    )]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    #[diagnostic(code(charter::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    #[diagnostic(code(charter::config::parse))]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(charter::config::invalid))]
    Invalid { message: String },

    #[error("Invalid modification rules for release '{release}'")]
    #[diagnostic(code(charter::config::rules))]
    Rules {
        release: String,
        #[source]
        #[diagnostic_source]
        source: EngineError,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub helm: HelmSettings,

    #[serde(default)]
    pub releases: Vec<ReleaseConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One upstream project turned into a chart
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseConfig {
    pub name: String,

    /// Upper bound for fetching and building this release
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// `source: {github: ...}` or `source: {local: ...}`
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub source: SourceConfig,

    pub chart: ChartOps,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

/// Where a release's manifests come from
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceConfig {
    Github(GithubSourceConfig),
    Local(LocalSourceConfig),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubSourceConfig {
    pub owner: String,
    pub repo: String,
    /// Release asset names holding the manifests
    pub assets: Vec<String>,
    /// API endpoint, for GitHub Enterprise
    #[serde(default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSourceConfig {
    /// Manifest files or directories of them
    pub paths: Vec<PathBuf>,
    /// Version the manifests correspond to
    pub app_version: String,
}

impl Config {
    /// Load, merge and validate the configuration at `path`
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let mut merged = read_node(path)?;
        let overlay = overlay_path(path);
        if overlay.is_file() {
            tracing::debug!(path = %overlay.display(), "Merging local config overlay");
            deep_merge(&mut merged, &read_node(&overlay)?);
        }

        let config = Self::from_node(&merged, path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config only if the file exists
    pub fn load_if_present(path: &Path) -> Result<Option<Self>> {
        if path.is_file() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    fn from_node(node: &Node, path: &Path) -> Result<Self> {
        let parse_error = |e: serde_yaml::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        if node.is_null() {
            return Ok(Self::default());
        }
        let value = serde_yaml::to_value(node).map_err(parse_error)?;
        serde_yaml::from_value(value).map_err(parse_error)
    }

    /// Check names and compile every release's rules
    pub fn validate(&self) -> Result<()> {
        let mut releases = HashSet::new();
        let mut charts = HashSet::new();

        for release in &self.releases {
            if release.name.trim().is_empty() {
                return Err(invalid("release name must not be empty"));
            }
            if !releases.insert(release.name.as_str()) {
                return Err(invalid(format!("duplicate release name '{}'", release.name)));
            }
            if release.chart.name.trim().is_empty() {
                return Err(invalid(format!(
                    "release '{}' has an empty chart name",
                    release.name
                )));
            }
            if !charts.insert(release.chart.name.as_str()) {
                return Err(invalid(format!(
                    "chart '{}' is produced by more than one release",
                    release.chart.name
                )));
            }

            match &release.source {
                SourceConfig::Github(github) if github.assets.is_empty() => {
                    return Err(invalid(format!(
                        "release '{}' lists no GitHub assets",
                        release.name
                    )));
                }
                SourceConfig::Local(local) if local.paths.is_empty() => {
                    return Err(invalid(format!(
                        "release '{}' lists no local paths",
                        release.name
                    )));
                }
                _ => {}
            }

            Modifier::new(Box::new(YqEvaluator::new()), &release.chart.modifications).map_err(
                |source| ConfigError::Rules {
                    release: release.name.clone(),
                    source,
                },
            )?;
        }

        Ok(())
    }

    /// Releases selected by name; all of them when `names` is empty
    pub fn select(&self, names: &[String]) -> Result<Vec<ReleaseConfig>> {
        if names.is_empty() {
            return Ok(self.releases.clone());
        }
        names
            .iter()
            .map(|name| {
                self.releases
                    .iter()
                    .find(|r| &r.name == name)
                    .cloned()
                    .ok_or_else(|| invalid(format!("no release named '{}' in config", name)))
            })
            .collect()
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

fn overlay_path(config: &Path) -> PathBuf {
    config
        .parent()
        .map(|dir| dir.join(LOCAL_OVERLAY))
        .unwrap_or_else(|| PathBuf::from(LOCAL_OVERLAY))
}

fn read_node(path: &Path) -> Result<Node> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Node::Null);
    }
    Node::from_yaml(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
