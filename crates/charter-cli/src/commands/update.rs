//! Update command - regenerate charts from the latest upstream releases

use charter_chart::AssembledChart;
use console::style;

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::release::{self, Outcome, ReleaseReport};
use crate::util::plural;

pub struct UpdateOptions {
    /// Only these releases; all when empty
    pub releases: Vec<String>,
    pub force: bool,
    pub no_package: bool,
}

pub fn run(config: Config, options: UpdateOptions) -> Result<()> {
    for name in &options.releases {
        if !config.releases.iter().any(|r| &r.name == name) {
            return Err(CliError::usage(format!(
                "unknown release '{}' (configured: {})",
                name,
                config
                    .releases
                    .iter()
                    .map(|r| r.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
    }

    let releases = config.select(&options.releases)?;
    let mut settings = config.helm.clone();
    if options.no_package {
        settings.package = false;
    }

    println!(
        "{} Updating {} into {}",
        style("→").blue(),
        plural(releases.len(), "release"),
        settings.src_dir.display()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let reports = runtime.block_on(release::run_all(releases, &settings, options.force));

    for report in &reports {
        print_report(report);
    }

    let total = reports.len();
    let failed = reports.iter().filter(|r| r.is_failure()).count();

    println!();
    if failed > 0 {
        println!(
            "{} {} of {} failed",
            style("✗").red().bold(),
            failed,
            plural(total, "release")
        );
        return Err(CliError::UpdateFailed { failed, total });
    }
    println!("{} All releases handled", style("✓").green().bold());
    Ok(())
}

fn print_report(report: &ReleaseReport) {
    match &report.outcome {
        Outcome::Updated(charts) => {
            println!(
                "  {} {} updated to {}",
                style("✓").green(),
                style(&report.name).bold(),
                charts.main.app_version.as_deref().unwrap_or("-")
            );
            for chart in charts.iter() {
                print_chart(chart);
            }
        }
        Outcome::UpToDate { app_version } => {
            println!(
                "  {} {} is up to date ({})",
                style("•").dim(),
                style(&report.name).bold(),
                app_version
            );
        }
        Outcome::Failed(error) => {
            println!(
                "  {} {} failed: {}",
                style("✗").red(),
                style(&report.name).bold(),
                error
            );
        }
    }
}

fn print_chart(chart: &AssembledChart) {
    let location = match (&chart.pushed, &chart.package) {
        (Some(reference), _) => reference.clone(),
        (None, Some(archive)) => archive.display().to_string(),
        (None, None) => chart.path.display().to_string(),
    };
    println!(
        "      {} v{} [{}] {}",
        chart.name,
        chart.version,
        chart.stage,
        style(location).dim()
    );
}
