//! Workload spread-by-zone command

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use toolbox_lib::spread::{spread_by_zone, DisbalanceClassifier, SpreadSettings};
use toolbox_lib::ClusterClient;
use tracing::info;

use crate::output::{print_info, print_success, print_warning, OutputFormat, ReportFile};
use crate::report::{write_atomically, SpreadReport};

/// Options for one spread-by-zone run
#[derive(Debug, Clone)]
pub struct SpreadOptions {
    pub settings: SpreadSettings,
    pub classifier: DisbalanceClassifier,
    pub disbalanced_only: bool,
    pub output: Option<ReportFile>,
    pub output_file: Option<PathBuf>,
}

/// Aggregate, classify and emit the spread report
///
/// Nothing is written until the whole cluster has been walked.
pub async fn show_spread<C>(
    client: &C,
    options: &SpreadOptions,
    format: OutputFormat,
    cancel: CancellationToken,
) -> Result<()>
where
    C: ClusterClient + ?Sized,
{
    let result = spread_by_zone(client, &options.settings, cancel)
        .await
        .context("Workload spread aggregation failed")?;

    for (zone, pods) in result.zone_totals() {
        info!(zone = %zone, pods, "Zone total");
    }

    let report = SpreadReport::new(&result, &options.classifier, options.disbalanced_only);

    if let Some(kind) = options.output {
        let path = options
            .output_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(kind.default_path()));
        let contents = match kind {
            ReportFile::Csv => report.to_csv(),
            ReportFile::Text => report.to_text(),
        };
        write_atomically(&path, &contents)?;
        print_success(&format!(
            "Wrote {} rows to {}",
            report.rows.len(),
            path.display()
        ));
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            println!("{}", report.to_json()?);
        }
        OutputFormat::Table => {
            if report.rows.is_empty() {
                if options.disbalanced_only && !result.is_empty() {
                    print_info("No disbalanced workloads found");
                } else {
                    print_warning("No workloads with running replicas found");
                }
                return Ok(());
            }

            println!("{}", report.to_table());
            println!(
                "\n{} workloads, {} disbalanced (gap > {}%), {} namespaces scanned, {} skipped with zero replicas",
                report.rows.len(),
                report.disbalanced_count().to_string().red().bold(),
                options.classifier.threshold,
                result.stats.namespaces_scanned,
                result.stats.skipped_zero_replicas,
            );
        }
    }

    Ok(())
}
