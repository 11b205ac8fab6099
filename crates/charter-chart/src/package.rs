//! Chart packaging into `<name>-<version>.tgz`
//!
//! The archive mirrors `helm package`: every file of the chart under a
//! top-level `<name>/` directory. Entries are sorted and carry a fixed mtime,
//! so packaging the same chart twice yields identical bytes.

use charter_core::ChartMetadata;
use charter_core::chart::CHART_FILE;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::{Builder, Header};
use tracing::info;
use walkdir::WalkDir;

use crate::error::{ChartError, Result};

/// Archive name for a chart
#[must_use]
pub fn archive_name(chart: &ChartMetadata) -> String {
    format!("{}-{}.tgz", chart.name, chart.version)
}

/// Package the chart in `chart_dir` into `target_dir`
///
/// Returns the path of the written archive.
pub fn package_chart(chart_dir: &Path, target_dir: &Path) -> Result<PathBuf> {
    let chart_file = chart_dir.join(CHART_FILE);
    if !chart_file.is_file() {
        return Err(ChartError::NotAChart {
            path: chart_dir.to_path_buf(),
        });
    }
    let chart = ChartMetadata::from_file(&chart_file)?;
    chart.semver()?;

    std::fs::create_dir_all(target_dir).map_err(ChartError::io(target_dir))?;
    let output = target_dir.join(archive_name(&chart));

    let file = File::create(&output).map_err(ChartError::io(&output))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);

    for entry in WalkDir::new(chart_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(chart_dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        let content = std::fs::read(entry.path()).map_err(ChartError::io(entry.path()))?;
        add_bytes_to_archive(&mut builder, &format!("{}/{}", chart.name, relative), &content)
            .map_err(ChartError::io(&output))?;
    }

    let encoder = builder.into_inner().map_err(ChartError::io(&output))?;
    encoder.finish().map_err(ChartError::io(&output))?;

    info!(chart = %chart.name, version = %chart.version, path = %output.display(), "Packaged chart");
    Ok(output)
}

/// Add bytes to a tar archive with a given path
fn add_bytes_to_archive<W: Write>(
    builder: &mut Builder<W>,
    archive_path: &str,
    content: &[u8],
) -> std::io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();

    builder.append_data(&mut header, archive_path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;
    use tar::Archive;
    use tempfile::TempDir;

    fn write_chart(root: &Path) -> PathBuf {
        let chart = root.join("kubevirt");
        fs::create_dir_all(chart.join("templates")).unwrap();
        fs::write(
            chart.join("Chart.yaml"),
            "apiVersion: v2\nname: kubevirt\nversion: 1.4.0\nappVersion: v1.4.0\n",
        )
        .unwrap();
        fs::write(chart.join("values.yaml"), "").unwrap();
        fs::write(chart.join("templates/service.yaml"), "kind: Service\n").unwrap();
        fs::write(chart.join("templates/_helpers.tpl"), "").unwrap();
        fs::write(chart.join("templates/deployment.yaml"), "kind: Deployment\n").unwrap();
        chart
    }

    fn entries(archive: &Path) -> Vec<String> {
        let mut archive = Archive::new(GzDecoder::new(File::open(archive).unwrap()));
        archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_package_layout() {
        let dir = TempDir::new().unwrap();
        let chart = write_chart(dir.path());
        let target = dir.path().join("target");

        let archive = package_chart(&chart, &target).unwrap();
        assert_eq!(archive, target.join("kubevirt-1.4.0.tgz"));
        assert_eq!(
            entries(&archive),
            vec![
                "kubevirt/Chart.yaml",
                "kubevirt/templates/_helpers.tpl",
                "kubevirt/templates/deployment.yaml",
                "kubevirt/templates/service.yaml",
                "kubevirt/values.yaml",
            ]
        );
    }

    #[test]
    fn test_package_is_reproducible() {
        let dir = TempDir::new().unwrap();
        let chart = write_chart(dir.path());

        let first = fs::read(package_chart(&chart, &dir.path().join("a")).unwrap()).unwrap();
        let second = fs::read(package_chart(&chart, &dir.path().join("b")).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_package_requires_chart() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            package_chart(dir.path(), &dir.path().join("target")),
            Err(ChartError::NotAChart { .. })
        ));
    }

    #[test]
    fn test_package_rejects_invalid_version() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Chart.yaml"), "name: demo\nversion: latest\n").unwrap();
        assert!(package_chart(dir.path(), &dir.path().join("target")).is_err());
    }
}
