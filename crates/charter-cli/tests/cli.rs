//! Integration tests for CLI commands

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run charter with `dir` as working directory
fn charter(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_charter"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("CHARTER_CONFIG")
        .args(args)
        .output()
        .expect("Failed to execute charter")
}

fn fixtures_path() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures"))
}

/// A config with one local release reading the kubevirt fixture manifests
fn write_local_config(dir: &Path) {
    let config = format!(
        r#"
helm:
  srcDir: charts
  targetDir: target
releases:
  - name: kubevirt
    source:
      local:
        paths:
          - {manifests}
        appVersion: v1.4.0
    chart:
      name: kubevirt
      drop:
        - namespace
      modifications:
        - expression: .spec.configuration |= "{{{{ .Values.kubevirt.configuration | toYaml | nindent 4 }}}}"
          valuesSelector: .spec.configuration
          kind: ^KubeVirt$
        - expression: .metadata.namespace = "{{{{ .Release.Namespace }}}}"
          kind: ^(ServiceAccount|Deployment|KubeVirt)$
"#,
        manifests = fixtures_path().join("kubevirt").display()
    );
    fs::write(dir.join("config.yaml"), config).unwrap();
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

mod update_command {
    use super::*;

    #[test]
    fn test_update_generates_charts() {
        let dir = TempDir::new().unwrap();
        write_local_config(dir.path());

        let output = charter(dir.path(), &["update"]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        assert!(stdout(&output).contains("kubevirt updated to v1.4.0"));

        let chart = dir.path().join("charts/kubevirt");
        assert!(chart.join("Chart.yaml").is_file());
        assert!(chart.join("templates/kubevirt.yaml").is_file());
        assert!(chart.join("templates/_helpers.tpl").is_file());
        assert!(!chart.join("templates/namespace.yaml").exists());
        let values = fs::read_to_string(chart.join("values.yaml")).unwrap();
        assert!(values.contains("featureGates"));

        assert!(dir.path().join("charts/kubevirt-crds/Chart.yaml").is_file());
        assert!(dir.path().join("target/kubevirt-1.4.0.tgz").is_file());
        assert!(dir.path().join("target/kubevirt-crds-1.4.0.tgz").is_file());
    }

    #[test]
    fn test_update_skips_current_chart_unless_forced() {
        let dir = TempDir::new().unwrap();
        write_local_config(dir.path());

        assert!(charter(dir.path(), &["update", "--no-package"]).status.success());
        assert!(!dir.path().join("target").exists());

        let output = charter(dir.path(), &["update", "--no-package"]);
        assert!(output.status.success());
        assert!(stdout(&output).contains("kubevirt is up to date (v1.4.0)"));

        let output = charter(dir.path(), &["update", "--no-package", "--force"]);
        assert!(output.status.success());
        assert!(stdout(&output).contains("kubevirt updated to v1.4.0"));
    }

    #[test]
    fn test_unknown_release_is_usage_error() {
        let dir = TempDir::new().unwrap();
        write_local_config(dir.path());

        let output = charter(dir.path(), &["update", "--release", "cdi"]);
        assert_eq!(output.status.code(), Some(64));
        assert!(!dir.path().join("charts").exists());
    }

    #[test]
    fn test_missing_config() {
        let dir = TempDir::new().unwrap();

        let output = charter(dir.path(), &["update"]);
        assert_eq!(output.status.code(), Some(2));
    }

    #[test]
    fn test_invalid_rule_in_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            r#"
releases:
  - name: broken
    source: {local: {paths: [x], appVersion: v1.0.0}}
    chart:
      name: broken
      modifications:
        - expression: .spec
          kind: "("
"#,
        )
        .unwrap();

        let output = charter(dir.path(), &["update"]);
        assert_eq!(output.status.code(), Some(2));
    }

    #[test]
    fn test_failed_release_sets_exit_code() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            r#"
releases:
  - name: gone
    source: {local: {paths: [does-not-exist.yaml], appVersion: v1.0.0}}
    chart: {name: gone}
"#,
        )
        .unwrap();

        let output = charter(dir.path(), &["update"]);
        assert_eq!(output.status.code(), Some(3));
        assert!(stdout(&output).contains("gone failed"));
    }
}

mod lint_command {
    use super::*;

    #[test]
    fn test_lint_generated_chart() {
        let dir = TempDir::new().unwrap();
        write_local_config(dir.path());
        assert!(charter(dir.path(), &["update", "--no-package"]).status.success());

        let output = charter(dir.path(), &["lint", "charts/kubevirt"]);
        assert!(output.status.success());
        assert!(stdout(&output).contains("Linting passed"));
    }

    #[test]
    fn test_lint_json_output() {
        let dir = TempDir::new().unwrap();
        write_local_config(dir.path());
        assert!(charter(dir.path(), &["update", "--no-package"]).status.success());

        let output = charter(dir.path(), &["lint", "charts/kubevirt-crds", "--json"]);
        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");

        assert_eq!(json["chart"], "kubevirt-crds");
        assert_eq!(json["passed"], true);
        assert!(json["messages"].is_array());
    }

    #[test]
    fn test_lint_broken_chart() {
        let dir = TempDir::new().unwrap();
        let broken = fixtures_path().join("broken");

        let output = charter(dir.path(), &["lint", broken.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(1));
        let out = stdout(&output);
        assert!(out.contains("is not a valid SemVer"));
        assert!(out.contains("unclosed action"));
        assert!(out.contains("Linting failed"));
    }

    #[test]
    fn test_lint_broken_chart_json() {
        let dir = TempDir::new().unwrap();
        let broken = fixtures_path().join("broken");

        let output = charter(dir.path(), &["lint", broken.to_str().unwrap(), "--json"]);
        assert!(!output.status.success());
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(json["passed"], false);
        assert_eq!(json["highest"], "error");
    }
}

mod package_command {
    use super::*;

    #[test]
    fn test_package_to_output_dir() {
        let dir = TempDir::new().unwrap();
        write_local_config(dir.path());
        assert!(charter(dir.path(), &["update", "--no-package"]).status.success());

        let output = charter(dir.path(), &["package", "charts/kubevirt", "--output", "dist"]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        assert!(stdout(&output).contains("Created"));
        assert!(dir.path().join("dist/kubevirt-1.4.0.tgz").is_file());
    }

    #[test]
    fn test_package_missing_chart() {
        let dir = TempDir::new().unwrap();

        let output = charter(dir.path(), &["package", "nowhere"]);
        assert_eq!(output.status.code(), Some(4));
    }
}
