//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;

/// Output format for terminal output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name from configuration, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Report file written by `--output`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFile {
    /// Comma-separated values with one column per zone
    Csv,
    /// Fixed-width text table with `*` histograms
    Text,
}

impl ReportFile {
    /// File name used when `--output-file` is not given
    pub fn default_path(&self) -> &'static str {
        match self {
            ReportFile::Csv => "pod-spread-by-zone.csv",
            ReportFile::Text => "pod-spread-by-zone.txt",
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a zone share gap
pub fn format_gap(gap: Option<f64>) -> String {
    match gap {
        Some(gap) => format!("{:.0}%", gap),
        None => "-".to_string(),
    }
}

/// Color the disbalance verdict
pub fn color_disbalanced(disbalanced: bool) -> String {
    if disbalanced {
        "yes".red().bold().to_string()
    } else {
        "no".green().to_string()
    }
}

/// Render a count as a run of `*`
pub fn stars(count: u32) -> String {
    "*".repeat(count as usize)
}
