//! Charter CLI - Helm charts generated from upstream Kubernetes release manifests

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod config;
mod error;
mod exit_codes;
mod registry;
mod release;
mod source;
mod util;

use commands::update::UpdateOptions;
use config::{Config, DEFAULT_CONFIG_FILE};
use error::Result;

#[derive(Parser)]
#[command(name = "charter")]
#[command(author = "Charter Contributors")]
#[command(version)]
#[command(about = "Generate Helm charts from upstream Kubernetes release manifests", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE, env = "CHARTER_CONFIG")]
    config: PathBuf,

    /// Log level (overrides the config; RUST_LOG overrides both)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest releases and regenerate their charts
    Update {
        /// Only update these releases
        #[arg(short, long = "release")]
        releases: Vec<String>,

        /// Regenerate even when the chart is already at the latest version
        #[arg(long)]
        force: bool,

        /// Skip packaging
        #[arg(long)]
        no_package: bool,
    },

    /// Lint a chart directory
    Lint {
        /// Chart path
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Fail on warnings too
        #[arg(long)]
        strict: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Kubernetes version to check kubeVersion constraints against
        #[arg(long)]
        kube_version: Option<String>,
    },

    /// Package a chart directory into a .tgz archive
    Package {
        /// Chart path
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "target")]
        output: PathBuf,
    },
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            let code = e.exit_code();
            eprintln!("{:?}", miette::Report::new(e));
            code
        }
    };

    std::process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Update {
            releases,
            force,
            no_package,
        } => {
            let loaded = Config::load(&cli.config);
            init_logging(log_level(cli.log_level.as_deref(), loaded.as_ref().ok()));
            commands::update::run(
                loaded?,
                UpdateOptions {
                    releases,
                    force,
                    no_package,
                },
            )
        }

        Commands::Lint {
            path,
            strict,
            json,
            kube_version,
        } => {
            let config = optional_config(&cli.config, cli.log_level.as_deref());
            let kube_version = kube_version
                .or_else(|| config.map(|c| c.helm.lint_k8s))
                .unwrap_or_else(|| charter_chart::DEFAULT_KUBE_VERSION.to_string());
            commands::lint::run(&path, &kube_version, strict, json)
        }

        Commands::Package { path, output } => {
            optional_config(&cli.config, cli.log_level.as_deref());
            commands::package::run(&path, &output)
        }
    }
}

/// Load the config for commands that can run without one
///
/// A broken config is reported and ignored.
fn optional_config(path: &Path, flag: Option<&str>) -> Option<Config> {
    match Config::load_if_present(path) {
        Ok(config) => {
            init_logging(log_level(flag, config.as_ref()));
            config
        }
        Err(e) => {
            init_logging(log_level(flag, None));
            warn!(path = %path.display(), error = %e, "Ignoring unusable config");
            None
        }
    }
}

fn log_level(flag: Option<&str>, config: Option<&Config>) -> String {
    flag.map(str::to_string)
        .or_else(|| config.map(|c| c.log.level.clone()))
        .unwrap_or_else(|| "info".to_string())
}

fn init_logging(level: String) {
    let directives = format!(
        "warn,charter={0},charter_core={0},charter_expr={0},charter_engine={0},charter_chart={0}",
        level
    );
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directives))
        .unwrap_or_else(|_| EnvFilter::new("warn,charter=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_level_precedence() {
        let mut config = Config::default();
        config.log.level = "debug".to_string();

        assert_eq!(log_level(Some("trace"), Some(&config)), "trace");
        assert_eq!(log_level(None, Some(&config)), "debug");
        assert_eq!(log_level(None, None), "info");
    }

    #[test]
    fn test_update_arguments() {
        let cli = Cli::parse_from([
            "charter",
            "--config",
            "releases.yaml",
            "update",
            "-r",
            "kubevirt",
            "--release",
            "cdi",
            "--no-package",
        ]);
        assert_eq!(cli.config, PathBuf::from("releases.yaml"));
        match cli.command {
            Commands::Update {
                releases,
                force,
                no_package,
            } => {
                assert_eq!(releases, vec!["kubevirt", "cdi"]);
                assert!(!force);
                assert!(no_package);
            }
            _ => panic!("expected update"),
        }
    }
}
