//! Kubernetes Toolbox CLI
//!
//! Operational reports against a cluster: how workload pods are spread
//! across failure zones, and a generated ClusterRole that keeps secrets,
//! pods and RBAC objects out of a wildcard grant.

mod commands;
mod config;
mod output;
mod report;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use commands::{rbac, spread};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use toolbox_lib::rbac::DEFAULT_ROLE_NAME;
use toolbox_lib::spread::{DisbalanceClassifier, NamespaceFilter, SpreadSettings};
use toolbox_lib::KubeCluster;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Kubernetes Toolbox CLI
#[derive(Parser)]
#[command(name = "k8s-toolbox")]
#[command(author, version, about = "Kubernetes Toolbox - workload zone spread and RBAC helpers", long_about = None)]
pub struct Cli {
    /// Path to kubeconfig file (uses KUBECONFIG or ~/.kube/config if not specified)
    #[arg(long, global = true)]
    pub kubeconfig: Option<String>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Output format for terminal output
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how each workload's pods are spread across failure zones
    SpreadByZone {
        /// Only inspect this namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// Skip a namespace (repeatable)
        #[arg(long = "exclude-namespace", value_name = "NAMESPACE")]
        exclude_namespaces: Vec<String>,

        /// Write the report to a file instead of printing it (csv or text)
        #[arg(long, value_enum)]
        output: Option<output::ReportFile>,

        /// Report file path (defaults to pod-spread-by-zone.csv / .txt)
        #[arg(long, requires = "output")]
        output_file: Option<PathBuf>,

        /// Only report disbalanced workloads
        #[arg(long, visible_alias = "short")]
        disbalanced_only: bool,

        /// Zone share gap, in percent, above which a workload is disbalanced
        #[arg(long, value_parser = parse_threshold)]
        threshold: Option<f64>,

        /// Node label holding the failure zone
        #[arg(long)]
        zone_label: Option<String>,

        /// Abort the run after this many seconds
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,
    },

    /// Compose a ClusterRole from `kubectl api-resources` output
    RbacComposer {
        /// File holding `kubectl api-resources` output
        #[arg(long, short, default_value = "api-resources.txt")]
        input: PathBuf,

        /// Output file for the ClusterRole YAML (`-` for stdout)
        #[arg(long, short, default_value = "clusterrole.yaml")]
        output: PathBuf,

        /// ClusterRole name
        #[arg(long, default_value = DEFAULT_ROLE_NAME)]
        name: String,
    },
}

fn parse_threshold(value: &str) -> Result<f64, String> {
    let threshold: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    config::check_threshold(threshold)
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,toolbox_lib=debug,k8s_toolbox=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    // Execute command
    match cli.command {
        Commands::SpreadByZone {
            namespace,
            exclude_namespaces,
            output,
            output_file,
            disbalanced_only,
            threshold,
            zone_label,
            timeout,
        } => {
            let config = config::Config::load()?;
            let format = cli
                .format
                .or_else(|| {
                    config
                        .default_format
                        .as_deref()
                        .and_then(output::OutputFormat::from_name)
                })
                .unwrap_or_default();

            let mut exclude = config.exclude_namespaces.clone();
            exclude.extend(exclude_namespaces);

            let options = spread::SpreadOptions {
                settings: SpreadSettings {
                    zone_label: zone_label.unwrap_or_else(|| config.zone_label.clone()),
                    namespaces: NamespaceFilter {
                        only: namespace,
                        exclude,
                    },
                },
                classifier: DisbalanceClassifier::new(
                    threshold.unwrap_or(config.disbalance_threshold),
                ),
                disbalanced_only,
                output,
                output_file,
            };

            let kubeconfig = config::kubeconfig_path(cli.kubeconfig.as_deref());
            let cluster = KubeCluster::connect(kubeconfig.as_deref(), cli.context.as_deref())
                .await
                .context("Failed to create Kubernetes client")?;

            let cancel = CancellationToken::new();
            let interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, cancelling");
                    interrupt.cancel();
                }
            });

            let run = spread::show_spread(&cluster, &options, format, cancel.clone());
            match timeout {
                Some(secs) => tokio::time::timeout(Duration::from_secs(secs), run)
                    .await
                    .map_err(|_| {
                        cancel.cancel();
                        anyhow!("Timed out after {}s", secs)
                    })??,
                None => run.await?,
            }
        }
        Commands::RbacComposer {
            input,
            output,
            name,
        } => {
            rbac::compose_role(&input, &output, &name)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold("60"), Ok(60.0));
        assert_eq!(parse_threshold("12.5"), Ok(12.5));
        assert!(parse_threshold("150").is_err());
        assert!(parse_threshold("many").is_err());
    }

    #[test]
    fn test_short_alias_sets_disbalanced_only() {
        let cli = Cli::try_parse_from(["k8s-toolbox", "spread-by-zone", "--short"]).unwrap();
        match cli.command {
            Commands::SpreadByZone {
                disbalanced_only, ..
            } => assert!(disbalanced_only),
            _ => panic!("expected spread-by-zone"),
        }
    }

    #[test]
    fn test_disbalanced_only_defaults_off() {
        let cli = Cli::try_parse_from(["k8s-toolbox", "spread-by-zone", "--output", "csv"]).unwrap();
        match cli.command {
            Commands::SpreadByZone {
                disbalanced_only,
                output,
                ..
            } => {
                assert!(!disbalanced_only);
                assert_eq!(output, Some(output::ReportFile::Csv));
            }
            _ => panic!("expected spread-by-zone"),
        }
    }

    #[test]
    fn test_output_file_requires_output() {
        assert!(
            Cli::try_parse_from(["k8s-toolbox", "spread-by-zone", "--output-file", "x.csv"]).is_err()
        );
    }
}
