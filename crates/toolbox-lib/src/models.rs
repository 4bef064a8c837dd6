//! Core data models for the toolbox
//!
//! These are plain, API-agnostic views of the cluster objects the spread
//! report consumes. The Kubernetes adapter in [`crate::cluster`] converts
//! `k8s-openapi` types into them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Zone assigned to nodes without a recognised zone label
pub const UNKNOWN_ZONE: &str = "unknown";

/// Well-known topology label carrying a node's failure zone
pub const DEFAULT_ZONE_LABEL: &str = "topology.kubernetes.io/zone";

/// Deprecated zone label still set by some older node pools
pub const LEGACY_ZONE_LABEL: &str = "failure-domain.beta.kubernetes.io/zone";

/// Pod phase excluded from zone counts
pub const FAILED_PHASE: &str = "Failed";

/// A compute node and its labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: BTreeMap::new(),
        }
    }

    /// Add a label (builder style, mostly for tests and fixtures)
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Kind of workload controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Deployment,
    StatefulSet,
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerKind::Deployment => write!(f, "deployment"),
            ControllerKind::StatefulSet => write!(f, "statefulset"),
        }
    }
}

/// A workload controller (deployment or stateful set) within a namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controller {
    pub kind: ControllerKind,
    pub namespace: String,
    pub name: String,
    /// Desired replica count
    pub replicas: i32,
    /// `spec.selector.matchLabels`, in the order the API returned them
    pub match_labels: Vec<(String, String)>,
    /// `spec.selector.matchExpressions`, in the order the API returned them
    #[serde(default)]
    pub match_expressions: Vec<LabelRequirement>,
}

impl Controller {
    /// Whether the selector constrains anything at all
    pub fn has_selector(&self) -> bool {
        !self.match_labels.is_empty() || !self.match_expressions.is_empty()
    }
}

/// Set-based selector operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl SelectorOperator {
    /// Parse the operator as spelled in a `LabelSelectorRequirement`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "In" => Some(Self::In),
            "NotIn" => Some(Self::NotIn),
            "Exists" => Some(Self::Exists),
            "DoesNotExist" => Some(Self::DoesNotExist),
            _ => None,
        }
    }
}

/// One `matchExpressions` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    /// Empty for `Exists` / `DoesNotExist`
    pub values: Vec<String>,
}

/// One pod belonging to a controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    /// Assigned node, `None` while the pod is still pending scheduling
    pub node_name: Option<String>,
    pub phase: Option<String>,
}

impl Instance {
    pub fn new(name: impl Into<String>, node_name: Option<&str>, phase: Option<&str>) -> Self {
        Self {
            name: name.into(),
            node_name: node_name.map(str::to_string),
            phase: phase.map(str::to_string),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.phase.as_deref() == Some(FAILED_PHASE)
    }
}

/// Per-controller zone counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpread {
    pub namespace: String,
    pub controller: String,
    pub kind: ControllerKind,
    /// Zone -> number of non-failed pods in it
    pub counts: BTreeMap<String, u32>,
}

impl WorkloadSpread {
    /// Count for a zone, zero if the zone is absent
    pub fn count(&self, zone: &str) -> u32 {
        self.counts.get(zone).copied().unwrap_or(0)
    }

    /// Total counted pods across all zones
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}

/// Bookkeeping about what the aggregation walked and skipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub namespaces_scanned: usize,
    pub controllers_counted: usize,
    pub skipped_zero_replicas: usize,
    pub skipped_empty_selector: usize,
}

/// Result of one spread-by-zone run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Every zone observed in any row, sorted; used as the report header
    pub zones: Vec<String>,
    /// One row per counted controller, in walk order
    pub spread: Vec<WorkloadSpread>,
    pub stats: RunStats,
}

impl AggregateResult {
    /// Rebuild `zones` from the union of row keys
    pub fn collect_zones(&mut self) {
        let zones: BTreeSet<&String> = self.spread.iter().flat_map(|ws| ws.counts.keys()).collect();
        self.zones = zones.into_iter().cloned().collect();
    }

    /// Pods per zone across all rows, in header order
    pub fn zone_totals(&self) -> Vec<(String, u32)> {
        self.zones
            .iter()
            .map(|zone| {
                let total = self.spread.iter().map(|ws| ws.count(zone)).sum();
                (zone.clone(), total)
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.spread.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread(ns: &str, name: &str, counts: &[(&str, u32)]) -> WorkloadSpread {
        WorkloadSpread {
            namespace: ns.to_string(),
            controller: name.to_string(),
            kind: ControllerKind::Deployment,
            counts: counts.iter().map(|(z, c)| (z.to_string(), *c)).collect(),
        }
    }

    #[test]
    fn test_instance_failed_phase() {
        assert!(Instance::new("p", Some("n1"), Some("Failed")).is_failed());
        assert!(!Instance::new("p", Some("n1"), Some("Running")).is_failed());
        assert!(!Instance::new("p", None, None).is_failed());
    }

    #[test]
    fn test_workload_spread_count_and_total() {
        let ws = spread("default", "web", &[("zone-a", 2), ("zone-b", 3)]);
        assert_eq!(ws.count("zone-a"), 2);
        assert_eq!(ws.count("zone-c"), 0);
        assert_eq!(ws.total(), 5);
    }

    #[test]
    fn test_collect_zones_is_sorted_union() {
        let mut result = AggregateResult {
            spread: vec![
                spread("a", "x", &[("zone-c", 1)]),
                spread("a", "y", &[("zone-a", 1), ("zone-c", 2)]),
            ],
            ..Default::default()
        };
        result.collect_zones();
        assert_eq!(result.zones, vec!["zone-a", "zone-c"]);
    }

    #[test]
    fn test_zone_totals() {
        let mut result = AggregateResult {
            spread: vec![
                spread("a", "x", &[("zone-a", 1), ("zone-b", 4)]),
                spread("a", "y", &[("zone-a", 2)]),
            ],
            ..Default::default()
        };
        result.collect_zones();
        assert_eq!(
            result.zone_totals(),
            vec![("zone-a".to_string(), 3), ("zone-b".to_string(), 4)]
        );
    }

    #[test]
    fn test_controller_kind_display() {
        assert_eq!(ControllerKind::Deployment.to_string(), "deployment");
        assert_eq!(ControllerKind::StatefulSet.to_string(), "statefulset");
    }

    #[test]
    fn test_spread_serializes_with_lowercase_kind() {
        let ws = WorkloadSpread {
            kind: ControllerKind::StatefulSet,
            ..spread("data", "pg", &[("zone-a", 2)])
        };
        let json = serde_json::to_value(&ws).unwrap();
        assert_eq!(json["kind"], "statefulset");
        assert_eq!(json["counts"]["zone-a"], 2);
    }
}
