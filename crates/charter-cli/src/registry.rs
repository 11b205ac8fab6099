//! OCI registry publishing
//!
//! Packaged charts are pushed as Helm OCI artifacts: the chart metadata as
//! the config blob and the archive as the single content layer. A version
//! already present in the registry is never overwritten.

use charter_core::{ChartMetadata, CoreError};
use miette::Diagnostic;
use oci_distribution::Reference;
use oci_distribution::client::{Client, ClientConfig, ClientProtocol, Config, ImageLayer};
use oci_distribution::secrets::RegistryAuth;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Helm chart config
pub const HELM_CONFIG: &str = "application/vnd.cncf.helm.config.v1+json";
/// Helm chart content layer
pub const HELM_CONTENT: &str = "application/vnd.cncf.helm.chart.content.v1.tar+gzip";

pub const USERNAME_ENV: &str = "CHARTER_REGISTRY_USERNAME";
pub const PASSWORD_ENV: &str = "CHARTER_REGISTRY_PASSWORD";

const OCI_SCHEME: &str = "oci://";

#[derive(Error, Debug, Diagnostic)]
pub enum RegistryError {
    #[error("Invalid remote '{remote}'")]
    #[diagnostic(
        code(charter::registry::invalid_remote),
        help("helm.remote must look like oci://<registry>/<path>")
    )]
    InvalidRemote { remote: String },

    #[error("Invalid OCI reference '{reference}': {message}")]
    #[diagnostic(code(charter::registry::invalid_reference))]
    InvalidReference { reference: String, message: String },

    #[error("Chart {chart} version {version} already exists in {reference}")]
    #[diagnostic(
        code(charter::registry::version_exists),
        help("published versions are immutable; bump the release or drop helm.remote")
    )]
    VersionExists {
        chart: String,
        version: String,
        reference: String,
    },

    #[error("Failed to list tags of {reference}: {message}")]
    #[diagnostic(code(charter::registry::tags))]
    Tags { reference: String, message: String },

    #[error("Failed to push {reference}: {message}")]
    #[diagnostic(code(charter::registry::push))]
    Push { reference: String, message: String },

    #[error("Failed to read {}: {source}", path.display())]
    #[diagnostic(code(charter::registry::io))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read chart metadata: {0}")]
    #[diagnostic(code(charter::registry::metadata))]
    Metadata(#[from] CoreError),

    #[error("Failed to encode chart config: {0}")]
    #[diagnostic(code(charter::registry::encode))]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Client for the registry configured as `helm.remote`
pub struct ChartRegistry {
    /// Remote without its scheme and trailing slash
    base: String,
    client: Client,
    auth: RegistryAuth,
}

impl ChartRegistry {
    /// HTTPS client, authenticated from the environment when both
    /// `CHARTER_REGISTRY_USERNAME` and `CHARTER_REGISTRY_PASSWORD` are set
    pub fn new(remote: &str) -> Result<Self> {
        let auth = match (std::env::var(USERNAME_ENV), std::env::var(PASSWORD_ENV)) {
            (Ok(username), Ok(password)) => RegistryAuth::Basic(username, password),
            _ => RegistryAuth::Anonymous,
        };
        Self::with_protocol(remote, ClientProtocol::Https, auth)
    }

    pub fn with_protocol(remote: &str, protocol: ClientProtocol, auth: RegistryAuth) -> Result<Self> {
        let base = remote
            .strip_prefix(OCI_SCHEME)
            .map(|rest| rest.trim_end_matches('/'))
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| RegistryError::InvalidRemote {
                remote: remote.to_string(),
            })?;

        let config = ClientConfig {
            protocol,
            ..Default::default()
        };

        Ok(Self {
            base: base.to_string(),
            client: Client::new(config),
            auth,
        })
    }

    /// Reference a chart version is published under
    ///
    /// A remote already ending with the chart name is used as is, otherwise
    /// the name is appended. `+` is not allowed in tags and becomes `_`.
    pub fn reference(&self, chart: &str, version: &str) -> Result<Reference> {
        let repository = match self.base.rsplit('/').next() {
            Some(last) if last == chart => self.base.clone(),
            _ => format!("{}/{}", self.base, chart),
        };
        let raw = format!("{}:{}", repository, version.replace('+', "_"));

        Reference::try_from(raw.as_str()).map_err(|e| RegistryError::InvalidReference {
            reference: raw.clone(),
            message: e.to_string(),
        })
    }

    /// Whether `version` is already tagged in the repository of `reference`
    ///
    /// A repository the registry does not know yet has no versions.
    pub async fn version_exists(&self, reference: &Reference, version: &str) -> Result<bool> {
        let tag = version.replace('+', "_");
        match self.client.list_tags(reference, &self.auth, None, None).await {
            Ok(response) => Ok(response.tags.iter().any(|t| *t == tag)),
            Err(e) => {
                let message = e.to_string();
                let lowered = message.to_lowercase();
                if lowered.contains("not found")
                    || lowered.contains("name unknown")
                    || lowered.contains("404")
                {
                    debug!(reference = %reference, "Repository not found in registry");
                    Ok(false)
                } else {
                    Err(RegistryError::Tags {
                        reference: reference.whole(),
                        message,
                    })
                }
            }
        }
    }

    /// Push a packaged chart, returning its `oci://` reference
    pub async fn push(&self, archive: &Path, chart_dir: &Path) -> Result<String> {
        let metadata = ChartMetadata::from_file(chart_dir.join("Chart.yaml"))?;
        let reference = self.reference(&metadata.name, &metadata.version)?;

        if self.version_exists(&reference, &metadata.version).await? {
            return Err(RegistryError::VersionExists {
                chart: metadata.name,
                version: metadata.version,
                reference: reference.whole(),
            });
        }

        let data = tokio::fs::read(archive)
            .await
            .map_err(|source| RegistryError::Read {
                path: archive.to_path_buf(),
                source,
            })?;

        let config = Config {
            data: serde_json::to_vec(&metadata)?,
            media_type: HELM_CONFIG.to_string(),
            annotations: None,
        };
        let layers = vec![ImageLayer {
            data,
            media_type: HELM_CONTENT.to_string(),
            annotations: None,
        }];

        info!(chart = %metadata.name, reference = %reference, "Pushing chart");
        let response = self
            .client
            .push(&reference, &layers, config, &self.auth, None)
            .await
            .map_err(|e| RegistryError::Push {
                reference: reference.whole(),
                message: e.to_string(),
            })?;
        debug!(manifest = %response.manifest_url, "Chart manifest pushed");

        Ok(format!("{}{}", OCI_SCHEME, reference.whole()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry(remote: &str) -> ChartRegistry {
        ChartRegistry::with_protocol(remote, ClientProtocol::Https, RegistryAuth::Anonymous)
            .unwrap()
    }

    /// Registry served by `server`, accepting anonymous pulls
    async fn local_registry(server: &MockServer) -> ChartRegistry {
        Mock::given(method("GET"))
            .and(path("/v2/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;

        let host = server.uri().trim_start_matches("http://").to_string();
        ChartRegistry::with_protocol(
            &format!("oci://{}/charts", host),
            ClientProtocol::Http,
            RegistryAuth::Anonymous,
        )
        .unwrap()
    }

    #[test]
    fn test_reference_naming() {
        let charts = registry("oci://ghcr.io/kiemlicz/charts/");
        assert_eq!(
            charts.reference("kubevirt", "1.4.0").unwrap().whole(),
            "ghcr.io/kiemlicz/charts/kubevirt:1.4.0"
        );

        let dedicated = registry("oci://ghcr.io/kiemlicz/kubevirt");
        assert_eq!(
            dedicated.reference("kubevirt", "1.4.0").unwrap().whole(),
            "ghcr.io/kiemlicz/kubevirt:1.4.0"
        );
        assert_eq!(
            dedicated.reference("kubevirt-crds", "1.4.0").unwrap().whole(),
            "ghcr.io/kiemlicz/kubevirt/kubevirt-crds:1.4.0"
        );

        assert_eq!(
            charts.reference("cdi", "1.60.0+build.1").unwrap().tag(),
            Some("1.60.0_build.1")
        );
    }

    #[test]
    fn test_remote_requires_oci_scheme() {
        for remote in ["ghcr.io/kiemlicz/charts", "https://ghcr.io/charts", "oci://"] {
            let result =
                ChartRegistry::with_protocol(remote, ClientProtocol::Https, RegistryAuth::Anonymous);
            assert!(
                matches!(result, Err(RegistryError::InvalidRemote { .. })),
                "{remote} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_repository_has_no_versions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/charts/kubevirt/tags/list"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "errors": [{"code": "NAME_UNKNOWN", "message": "repository not found"}]
            })))
            .mount(&server)
            .await;
        let charts = local_registry(&server).await;

        let reference = charts.reference("kubevirt", "1.4.0").unwrap();
        assert!(!charts.version_exists(&reference, "1.4.0").await.unwrap());
    }

    #[tokio::test]
    async fn test_existing_version_is_not_pushed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/charts/kubevirt/tags/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "charts/kubevirt",
                "tags": ["1.3.0", "1.4.0"]
            })))
            .mount(&server)
            .await;
        let charts = local_registry(&server).await;

        let dir = TempDir::new().unwrap();
        let chart_dir = dir.path().join("kubevirt");
        fs::create_dir_all(&chart_dir).unwrap();
        fs::write(
            chart_dir.join("Chart.yaml"),
            "apiVersion: v2\nname: kubevirt\nversion: 1.4.0\nappVersion: v1.4.0\n",
        )
        .unwrap();

        let reference = charts.reference("kubevirt", "1.4.0").unwrap();
        assert!(charts.version_exists(&reference, "1.4.0").await.unwrap());
        assert!(!charts.version_exists(&reference, "1.5.0").await.unwrap());

        // The archive is never read once the version is known to exist
        let missing_archive = dir.path().join("kubevirt-1.4.0.tgz");
        let err = charts.push(&missing_archive, &chart_dir).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::VersionExists { ref chart, ref version, .. }
                if chart == "kubevirt" && version == "1.4.0"
        ));
    }
}
