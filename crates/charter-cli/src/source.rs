//! Manifest sources
//!
//! A source answers two questions: what is the latest upstream version, and
//! what manifests belong to a given version. [`GithubSource`] reads release
//! assets through the GitHub REST API; [`LocalSource`] reads YAML files from
//! disk.

use async_trait::async_trait;
use charter_core::{CoreError, Node};
use miette::Diagnostic;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::{GithubSourceConfig, LocalSourceConfig, SourceConfig};

/// Public GitHub API endpoint
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Environment variable holding an optional GitHub token
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Error, Debug, Diagnostic)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    #[diagnostic(code(charter::source::http))]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    #[diagnostic(
        code(charter::source::status),
        help("set GITHUB_TOKEN when hitting the anonymous rate limit")
    )]
    Status { url: String, status: u16 },

    #[error("Release {tag} has no asset named '{asset}'")]
    #[diagnostic(code(charter::source::asset_not_found))]
    AssetNotFound { tag: String, asset: String },

    #[error("Failed to read {}: {source}", path.display())]
    #[diagnostic(code(charter::source::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk {}: {source}", path.display())]
    #[diagnostic(code(charter::source::walk))]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Invalid manifests in {origin}: {source}")]
    #[diagnostic(code(charter::source::manifests))]
    Manifests {
        origin: String,
        #[source]
        source: CoreError,
    },
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// Documents of one upstream version
#[derive(Debug, Clone)]
pub struct FetchedManifests {
    pub app_version: String,
    pub documents: Vec<Node>,
}

/// Where manifests come from
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Latest upstream version (the release tag)
    async fn latest_version(&self) -> Result<String>;

    /// All documents published for `version`, in source order
    async fn fetch(&self, version: &str) -> Result<FetchedManifests>;
}

/// Build the source described by a release config
pub fn from_config(config: &SourceConfig) -> Result<Box<dyn ManifestSource>> {
    Ok(match config {
        SourceConfig::Github(github) => Box::new(GithubSource::new(github.clone())?),
        SourceConfig::Local(local) => Box::new(LocalSource::new(local.clone())),
    })
}

fn parse_documents(origin: &str, content: &str) -> Result<Vec<Node>> {
    Node::parse_documents(content).map_err(|source| SourceError::Manifests {
        origin: origin.to_string(),
        source,
    })
}

/// Release assets of a GitHub repository
pub struct GithubSource {
    client: reqwest::Client,
    config: GithubSourceConfig,
    api_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
    name: String,
    browser_download_url: String,
}

impl GithubSource {
    pub fn new(config: GithubSourceConfig) -> Result<Self> {
        let token = std::env::var(GITHUB_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self::with_token(config, token)
    }

    pub fn with_token(config: GithubSourceConfig, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("charter/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| GITHUB_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            config,
            api_url,
            token,
        })
    }

    async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response> {
        let mut request = self.client.get(url).header(reqwest::header::ACCEPT, accept);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn release(&self, path: &str) -> Result<GithubRelease> {
        let url = format!(
            "{}/repos/{}/{}/releases/{}",
            self.api_url, self.config.owner, self.config.repo, path
        );
        Ok(self
            .get(&url, "application/vnd.github+json")
            .await?
            .json()
            .await?)
    }
}

#[async_trait]
impl ManifestSource for GithubSource {
    async fn latest_version(&self) -> Result<String> {
        let release = self.release("latest").await?;
        info!(
            repo = %format!("{}/{}", self.config.owner, self.config.repo),
            tag = %release.tag_name,
            "Latest release"
        );
        Ok(release.tag_name)
    }

    async fn fetch(&self, version: &str) -> Result<FetchedManifests> {
        let release = self.release(&format!("tags/{}", version)).await?;
        let mut documents = Vec::new();

        for wanted in &self.config.assets {
            let asset = release
                .assets
                .iter()
                .find(|a| &a.name == wanted)
                .ok_or_else(|| SourceError::AssetNotFound {
                    tag: release.tag_name.clone(),
                    asset: wanted.clone(),
                })?;

            let content = self
                .get(&asset.browser_download_url, "application/octet-stream")
                .await?
                .text()
                .await?;
            let parsed = parse_documents(&asset.name, &content)?;
            debug!(asset = %asset.name, bytes = content.len(), documents = parsed.len(), "Downloaded asset");
            documents.extend(parsed);
        }

        Ok(FetchedManifests {
            app_version: release.tag_name,
            documents,
        })
    }
}

/// Manifests on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalSource {
    config: LocalSourceConfig,
}

impl LocalSource {
    pub fn new(config: LocalSourceConfig) -> Self {
        Self { config }
    }

    /// YAML files under the configured paths; directories are walked in name order
    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for path in &self.config.paths {
            if path.is_dir() {
                for entry in WalkDir::new(path).sort_by_file_name() {
                    let entry = entry.map_err(|source| SourceError::Walk {
                        path: path.clone(),
                        source,
                    })?;
                    if entry.file_type().is_file() && is_yaml(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
            } else {
                files.push(path.clone());
            }
        }
        Ok(files)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml")
}

#[async_trait]
impl ManifestSource for LocalSource {
    async fn latest_version(&self) -> Result<String> {
        Ok(self.config.app_version.clone())
    }

    async fn fetch(&self, version: &str) -> Result<FetchedManifests> {
        let mut documents = Vec::new();
        for file in self.files()? {
            let content = tokio::fs::read_to_string(&file)
                .await
                .map_err(|source| SourceError::Io {
                    path: file.clone(),
                    source,
                })?;
            documents.extend(parse_documents(&file.display().to_string(), &content)?);
        }

        Ok(FetchedManifests {
            app_version: version.to_string(),
            documents,
        })
    }
}
