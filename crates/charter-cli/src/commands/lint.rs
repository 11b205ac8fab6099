//! Lint command - check a generated chart

use charter_chart::{LintReport, LintSeverity, Linter};
use console::style;
use std::path::Path;

use crate::error::{CliError, Result};
use crate::util::plural;

pub fn run(path: &Path, kube_version: &str, strict: bool, json: bool) -> Result<()> {
    let linter = Linter::new(kube_version);
    let report = linter.lint(path)?;

    // --strict fails on warnings too
    let threshold = if strict {
        LintSeverity::Warning
    } else {
        LintSeverity::Error
    };
    let passed = report.at_least(threshold).next().is_none();

    if json {
        print_json(&report, passed)?;
    } else {
        print_report(path, &linter, &report, passed);
    }

    if passed {
        Ok(())
    } else {
        Err(CliError::lint_failed(
            report.count(LintSeverity::Error),
            report.count(LintSeverity::Warning),
        ))
    }
}

fn print_json(report: &LintReport, passed: bool) -> Result<()> {
    let output = serde_json::json!({
        "chart": report.chart,
        "passed": passed,
        "highest": report.highest(),
        "messages": report.messages,
    });
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::internal(format!("failed to serialize lint report: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

fn print_report(path: &Path, linter: &Linter, report: &LintReport, passed: bool) {
    println!(
        "{} Linting chart at {} (Kubernetes v{})",
        style("→").blue(),
        path.display(),
        linter.kube_version()
    );

    if report.is_clean() {
        println!("  {} no findings", style("✓").green());
    }
    for message in &report.messages {
        let icon = match message.severity {
            LintSeverity::Error => style("✗").red(),
            LintSeverity::Warning => style("⚠").yellow(),
            LintSeverity::Info => style("ℹ").cyan(),
        };
        println!("  {} {}: {}", icon, style(&message.path).dim(), message.message);
    }

    let errors = report.count(LintSeverity::Error);
    let warnings = report.count(LintSeverity::Warning);

    println!();
    if !passed {
        println!(
            "{} Linting failed with {} and {}",
            style("✗").red().bold(),
            plural(errors, "error"),
            plural(warnings, "warning")
        );
    } else if warnings > 0 {
        println!(
            "{} Linting passed with {}",
            style("⚠").yellow().bold(),
            plural(warnings, "warning")
        );
    } else {
        println!("{} Linting passed!", style("✓").green().bold());
    }
}
