//! Node name -> failure zone lookup

use crate::models::{Node, DEFAULT_ZONE_LABEL, LEGACY_ZONE_LABEL, UNKNOWN_ZONE};
use std::collections::HashMap;

/// Immutable map from node name to zone, built once per run
#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    zones: HashMap<String, String>,
}

impl ZoneIndex {
    /// Build the index using the standard topology label
    pub fn build(nodes: &[Node]) -> Self {
        Self::build_with_label(nodes, DEFAULT_ZONE_LABEL)
    }

    /// Build the index reading the zone from `zone_label`
    ///
    /// Nodes without the label (or with an empty value) map to
    /// [`UNKNOWN_ZONE`]. A later node with a duplicate name overwrites
    /// the earlier entry.
    pub fn build_with_label(nodes: &[Node], zone_label: &str) -> Self {
        let zones = nodes
            .iter()
            .map(|node| (node.name.clone(), node_zone(node, zone_label).to_string()))
            .collect();
        Self { zones }
    }

    /// Zone of a node; nodes missing from the index resolve to `unknown`
    pub fn zone_of(&self, node_name: &str) -> &str {
        self.zones
            .get(node_name)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_ZONE)
    }

    /// Zone of an optional node assignment (unscheduled pods are `unknown`)
    pub fn resolve(&self, node_name: Option<&str>) -> &str {
        node_name.map_or(UNKNOWN_ZONE, |name| self.zone_of(name))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Read a node's zone from its labels, falling back to the legacy key
pub fn node_zone<'a>(node: &'a Node, zone_label: &str) -> &'a str {
    [zone_label, LEGACY_ZONE_LABEL]
        .iter()
        .filter_map(|key| node.labels.get(*key))
        .map(String::as_str)
        .find(|zone| !zone.is_empty())
        .unwrap_or(UNKNOWN_ZONE)
}
