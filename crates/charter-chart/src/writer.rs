//! Chart directory writer
//!
//! Layout written for every chart:
//!
//! ```text
//! <chart>/
//!   Chart.yaml
//!   values.yaml
//!   templates/
//!     _helpers.tpl      (scaffolded once, then left to the user)
//!     <kind>.yaml       (regenerated on every run)
//! ```

use charter_core::chart::{CHART_FILE, TEMPLATES_DIR, VALUES_FILE};
use charter_core::{ChartMetadata, Values};
use charter_engine::TemplateFile;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{ChartError, Result};

/// Name of the scaffolded helpers template
pub const HELPERS_FILE: &str = "_helpers.tpl";

const HELPER_EXTENSION: &str = "tpl";

/// Remove generated files from a chart directory
///
/// Every file and directory under `templates/` goes except `*.tpl` helpers,
/// and `values.yaml` is deleted. A missing directory is not an error.
pub fn clear_generated(chart_dir: &Path) -> Result<()> {
    let templates_dir = chart_dir.join(TEMPLATES_DIR);
    if templates_dir.is_dir() {
        for entry in fs::read_dir(&templates_dir).map_err(ChartError::io(&templates_dir))? {
            let entry = entry.map_err(ChartError::io(&templates_dir))?;
            let path = entry.path();

            if path.is_file() && is_helper(&path) {
                continue;
            }

            debug!(path = %path.display(), "Removing generated template");
            if path.is_dir() {
                fs::remove_dir_all(&path).map_err(ChartError::io(&path))?;
            } else {
                fs::remove_file(&path).map_err(ChartError::io(&path))?;
            }
        }
    }

    let values = chart_dir.join(VALUES_FILE);
    if values.exists() {
        fs::remove_file(&values).map_err(ChartError::io(&values))?;
    }

    Ok(())
}

fn is_helper(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == HELPER_EXTENSION)
}

/// Write a complete chart
///
/// Previously generated files are cleared first so that kinds which
/// disappeared upstream do not leave stale templates behind.
pub fn save(
    chart_dir: &Path,
    metadata: &ChartMetadata,
    templates: &[TemplateFile],
    values: &Values,
) -> Result<()> {
    clear_generated(chart_dir)?;

    let templates_dir = chart_dir.join(TEMPLATES_DIR);
    fs::create_dir_all(&templates_dir).map_err(ChartError::io(&templates_dir))?;

    write_file(&chart_dir.join(CHART_FILE), &metadata.to_yaml()?)?;
    write_file(&chart_dir.join(VALUES_FILE), &values.to_yaml()?)?;

    for template in templates {
        write_file(&chart_dir.join(&template.name), &template.content)?;
    }

    let helpers = templates_dir.join(HELPERS_FILE);
    if !helpers.exists() {
        write_file(&helpers, &helpers_template(&metadata.name))?;
    }

    debug!(
        chart = %metadata.name,
        templates = templates.len(),
        path = %chart_dir.display(),
        "Saved chart"
    );
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(ChartError::io(path))
}

/// Standard named templates for a chart
///
/// Same set `helm create` scaffolds, so that text patches can `include`
/// `<chart>.labels` and friends.
pub fn helpers_template(chart: &str) -> String {
    HELPERS_SCAFFOLD.replace("CHART", chart)
}

const HELPERS_SCAFFOLD: &str = r#"{{/*
Expand the name of the chart.
*/}}
{{- define "CHART.name" -}}
{{- default .Chart.Name .Values.nameOverride | trunc 63 | trimSuffix "-" }}
{{- end }}

{{/*
Create a default fully qualified app name.
We truncate at 63 chars because some Kubernetes name fields are limited to this (by the DNS naming spec).
If release name contains chart name it will be used as a full name.
*/}}
{{- define "CHART.fullname" -}}
{{- if .Values.fullnameOverride }}
{{- .Values.fullnameOverride | trunc 63 | trimSuffix "-" }}
{{- else }}
{{- $name := default .Chart.Name .Values.nameOverride }}
{{- if contains $name .Release.Name }}
{{- .Release.Name | trunc 63 | trimSuffix "-" }}
{{- else }}
{{- printf "%s-%s" .Release.Name $name | trunc 63 | trimSuffix "-" }}
{{- end }}
{{- end }}
{{- end }}

{{/*
Create chart name and version as used by the chart label.
*/}}
{{- define "CHART.chart" -}}
{{- printf "%s-%s" .Chart.Name .Chart.Version | replace "+" "_" | trunc 63 | trimSuffix "-" }}
{{- end }}

{{/*
Common labels
*/}}
{{- define "CHART.labels" -}}
helm.sh/chart: {{ include "CHART.chart" . }}
{{ include "CHART.selectorLabels" . }}
{{- if .Chart.AppVersion }}
app.kubernetes.io/version: {{ .Chart.AppVersion | quote }}
{{- end }}
app.kubernetes.io/managed-by: {{ .Release.Service }}
{{- end }}

{{/*
Selector labels
*/}}
{{- define "CHART.selectorLabels" -}}
app.kubernetes.io/name: {{ include "CHART.name" . }}
app.kubernetes.io/instance: {{ .Release.Name }}
{{- end }}
"#;
