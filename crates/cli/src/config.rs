//! Configuration management for the CLI

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toolbox_lib::spread::DEFAULT_DISBALANCE_THRESHOLD;
use toolbox_lib::DEFAULT_ZONE_LABEL;

/// Environment variable prefix for overrides (e.g. `TOOLBOX_ZONE_LABEL`)
const ENV_PREFIX: &str = "TOOLBOX";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Node label holding the failure zone
    #[serde(default = "default_zone_label")]
    pub zone_label: String,
    /// Zone share gap (percentage points) above which a workload is disbalanced
    #[serde(default = "default_disbalance_threshold")]
    pub disbalance_threshold: f64,
    /// Namespaces skipped by spread reports
    #[serde(default)]
    pub exclude_namespaces: Vec<String>,
    /// Default output format
    #[serde(default)]
    pub default_format: Option<String>,
}

fn default_zone_label() -> String {
    DEFAULT_ZONE_LABEL.to_string()
}

fn default_disbalance_threshold() -> f64 {
    DEFAULT_DISBALANCE_THRESHOLD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zone_label: default_zone_label(),
            disbalance_threshold: default_disbalance_threshold(),
            exclude_namespaces: Vec::new(),
            default_format: None,
        }
    }
}

impl Config {
    /// Load configuration from the user config file and environment
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path` (optional) layered under `TOOLBOX_*` variables
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("exclude_namespaces"),
            )
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;
        if let Err(reason) = check_threshold(config.disbalance_threshold) {
            bail!("Invalid disbalance_threshold in configuration: {}", reason);
        }
        Ok(config)
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("k8s-toolbox").join("config.json"))
    }
}

/// Reject thresholds outside 0..=100 (NaN included)
pub fn check_threshold(threshold: f64) -> Result<f64, String> {
    if !(0.0..=100.0).contains(&threshold) {
        return Err(format!("threshold must be between 0 and 100, got {}", threshold));
    }
    Ok(threshold)
}

/// Get kubeconfig path
///
/// Returns `None` when neither an override nor `KUBECONFIG` is set, leaving
/// the client to infer its configuration (`~/.kube/config`, in-cluster).
pub fn kubeconfig_path(override_path: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(PathBuf::from(path));
    }

    std::env::var("KUBECONFIG")
        .ok()
        .filter(|path| !path.is_empty() && !path.contains(multi_path_separator()))
        .map(PathBuf::from)
}

// KUBECONFIG may hold a list of files; those are left to kube's own merging.
fn multi_path_separator() -> char {
    if cfg!(windows) {
        ';'
    } else {
        ':'
    }
}
