//! Spread report rendering (terminal table, JSON, CSV and text files)

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tabled::builder::Builder;
use tabled::settings::Style;
use toolbox_lib::spread::{spread_gap, DisbalanceClassifier};
use toolbox_lib::{AggregateResult, ControllerKind, RunStats, WorkloadSpread};

use crate::output::{color_disbalanced, format_gap, stars};

const NAME_WIDTH: usize = 50;
const ZONE_WIDTH: usize = 20;

/// One classified row
pub struct ReportRow<'a> {
    pub spread: &'a WorkloadSpread,
    pub gap: Option<f64>,
    pub disbalanced: bool,
}

/// A normalized result plus the classification of each row
pub struct SpreadReport<'a> {
    pub result: &'a AggregateResult,
    pub threshold: f64,
    pub rows: Vec<ReportRow<'a>>,
}

impl<'a> SpreadReport<'a> {
    /// Classify every row; with `disbalanced_only`, keep only disbalanced ones
    pub fn new(
        result: &'a AggregateResult,
        classifier: &DisbalanceClassifier,
        disbalanced_only: bool,
    ) -> Self {
        let rows = result
            .spread
            .iter()
            .map(|spread| ReportRow {
                spread,
                gap: spread_gap(spread),
                disbalanced: classifier.classify(spread),
            })
            .filter(|row| !disbalanced_only || row.disbalanced)
            .collect();

        Self {
            result,
            threshold: classifier.threshold,
            rows,
        }
    }

    pub fn disbalanced_count(&self) -> usize {
        self.rows.iter().filter(|r| r.disbalanced).count()
    }

    /// CSV with header `namespace,controller,<zone>...`
    pub fn to_csv(&self) -> String {
        let mut out = String::new();

        let header: Vec<&str> = ["namespace", "controller"]
            .into_iter()
            .chain(self.result.zones.iter().map(String::as_str))
            .collect();
        push_csv_record(&mut out, &header);

        for row in &self.rows {
            let counts: Vec<String> = self
                .result
                .zones
                .iter()
                .map(|zone| row.spread.count(zone).to_string())
                .collect();
            let record: Vec<&str> = [row.spread.namespace.as_str(), row.spread.controller.as_str()]
                .into_iter()
                .chain(counts.iter().map(String::as_str))
                .collect();
            push_csv_record(&mut out, &record);
        }

        out
    }

    /// Fixed-width table with one `*` per pod in each zone column
    pub fn to_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);

        let mut header = format!("{:<w$}{:<w$}", "NAMESPACE", "CONTROLLER", w = NAME_WIDTH);
        for zone in &self.result.zones {
            header.push_str(&format!("{:<w$}", zone, w = ZONE_WIDTH));
        }
        lines.push(header);

        for row in &self.rows {
            let mut line = format!(
                "{:<w$}{:<w$}",
                row.spread.namespace,
                row.spread.controller,
                w = NAME_WIDTH
            );
            for zone in &self.result.zones {
                line.push_str(&format!("{:<w$}", stars(row.spread.count(zone)), w = ZONE_WIDTH));
            }
            lines.push(line);
        }

        lines
            .iter()
            .map(|line| format!("{}\n", line.trim_end()))
            .collect()
    }

    /// Terminal table with a per-zone totals footer
    pub fn to_table(&self) -> String {
        let mut builder = Builder::default();

        let mut header = vec![
            "Namespace".to_string(),
            "Controller".to_string(),
            "Kind".to_string(),
        ];
        header.extend(self.result.zones.iter().cloned());
        header.push("Gap".to_string());
        header.push("Disbalanced".to_string());
        builder.push_record(header);

        for row in &self.rows {
            let mut record = vec![
                row.spread.namespace.clone(),
                row.spread.controller.clone(),
                row.spread.kind.to_string(),
            ];
            record.extend(
                self.result
                    .zones
                    .iter()
                    .map(|zone| row.spread.count(zone).to_string()),
            );
            record.push(format_gap(row.gap));
            record.push(color_disbalanced(row.disbalanced));
            builder.push_record(record);
        }

        let mut footer = vec!["Total".to_string(), String::new(), String::new()];
        footer.extend(
            self.result
                .zones
                .iter()
                .map(|zone| self.zone_total(zone).to_string()),
        );
        footer.push(String::new());
        footer.push(String::new());
        builder.push_record(footer);

        builder.build().with(Style::rounded()).to_string()
    }

    /// Pretty JSON document with rows, zones and run statistics
    pub fn to_json(&self) -> Result<String> {
        let report = JsonReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            threshold: self.threshold,
            zones: &self.result.zones,
            workloads: self
                .rows
                .iter()
                .map(|row| JsonRow {
                    namespace: &row.spread.namespace,
                    controller: &row.spread.controller,
                    kind: row.spread.kind,
                    counts: &row.spread.counts,
                    total: row.spread.total(),
                    spread_gap: row.gap,
                    disbalanced: row.disbalanced,
                })
                .collect(),
            zone_totals: self
                .result
                .zones
                .iter()
                .map(|zone| (zone.as_str(), self.zone_total(zone)))
                .collect(),
            stats: &self.result.stats,
        };
        serde_json::to_string_pretty(&report).context("Failed to serialize report")
    }

    /// Pods in `zone` over the rows in this report
    fn zone_total(&self, zone: &str) -> u32 {
        self.rows.iter().map(|r| r.spread.count(zone)).sum()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    threshold: f64,
    zones: &'a [String],
    workloads: Vec<JsonRow<'a>>,
    zone_totals: BTreeMap<&'a str, u32>,
    stats: &'a RunStats,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    namespace: &'a str,
    controller: &'a str,
    kind: ControllerKind,
    counts: &'a BTreeMap<String, u32>,
    total: u32,
    spread_gap: Option<f64>,
    disbalanced: bool,
}

fn push_csv_record(out: &mut String, fields: &[&str]) {
    let line: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write `contents` to `path` via a temp file in the same directory,
/// so a failed run never leaves a partial report behind
pub fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    file.write_all(contents.as_bytes())
        .context("Failed to write report")?;
    file.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbox_lib::spread::normalize;

    fn row(ns: &str, name: &str, counts: &[(&str, u32)]) -> WorkloadSpread {
        WorkloadSpread {
            namespace: ns.to_string(),
            controller: name.to_string(),
            kind: ControllerKind::Deployment,
            counts: counts.iter().map(|(z, c)| (z.to_string(), *c)).collect(),
        }
    }

    fn result() -> AggregateResult {
        let mut result = AggregateResult {
            spread: vec![
                row("default", "x", &[("zone-a", 1), ("zone-b", 1)]),
                row("shop", "y", &[("zone-a", 10)]),
            ],
            ..Default::default()
        };
        result.collect_zones();
        normalize(&mut result);
        result
    }

    #[test]
    fn test_csv_header_and_rows_share_zone_order() {
        let result = result();
        let report = SpreadReport::new(&result, &DisbalanceClassifier::default(), false);

        assert_eq!(
            report.to_csv(),
            "namespace,controller,zone-a,zone-b\ndefault,x,1,1\nshop,y,10,0\n"
        );
    }

    #[test]
    fn test_disbalanced_only_keeps_disbalanced_rows() {
        let result = result();
        let report = SpreadReport::new(&result, &DisbalanceClassifier::default(), true);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].spread.controller, "y");
        assert_eq!(report.to_csv(), "namespace,controller,zone-a,zone-b\nshop,y,10,0\n");
    }

    #[test]
    fn test_all_rows_kept_without_filter() {
        let result = result();
        let report = SpreadReport::new(&result, &DisbalanceClassifier::default(), false);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.disbalanced_count(), 1);
    }

    #[test]
    fn test_csv_escapes_special_characters() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_text_renders_star_histogram() {
        let result = result();
        let report = SpreadReport::new(&result, &DisbalanceClassifier::default(), false);
        let text = report.to_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAMESPACE"));
        assert_eq!(&lines[0][2 * NAME_WIDTH..2 * NAME_WIDTH + 6], "zone-a");
        assert_eq!(&lines[2][2 * NAME_WIDTH..], "**********");
        assert_eq!(&lines[1][2 * NAME_WIDTH..2 * NAME_WIDTH + 1], "*");
        assert_eq!(&lines[1][2 * NAME_WIDTH + ZONE_WIDTH..], "*");
    }

    #[test]
    fn test_json_contains_classification() {
        let result = result();
        let report = SpreadReport::new(&result, &DisbalanceClassifier::new(60.0), false);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["threshold"], 60.0);
        assert_eq!(json["zones"][1], "zone-b");
        assert_eq!(json["workloads"][0]["disbalanced"], false);
        assert_eq!(json["workloads"][1]["disbalanced"], true);
        assert_eq!(json["workloads"][1]["spread_gap"], 100.0);
        assert_eq!(json["zone_totals"]["zone-a"], 11);
        assert_eq!(json["workloads"][1]["kind"], "deployment");
    }

    #[test]
    fn test_table_has_totals_footer() {
        let result = result();
        let report = SpreadReport::new(&result, &DisbalanceClassifier::default(), false);
        let table = report.to_table();
        assert!(table.contains("Total"));
        assert!(table.contains("11"));
        assert!(table.contains("zone-b"));
    }

    #[test]
    fn test_write_atomically_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::write(&path, "old").unwrap();

        write_atomically(&path, "namespace,controller\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "namespace,controller\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
