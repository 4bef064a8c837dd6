//! Workload spread across failure zones
//!
//! The pipeline runs in five steps:
//! 1. [`ZoneIndex`] maps node names to zones
//! 2. [`SpreadAggregator`] walks namespaces and controllers
//! 3. [`attribute`] counts each controller's pods per zone
//! 4. [`normalize`] makes every row carry every observed zone
//! 5. [`DisbalanceClassifier`] flags uneven spreads
//!
//! [`spread_by_zone`] runs steps 1-4 against a [`crate::cluster::ClusterClient`].

mod aggregator;
mod attribution;
mod classify;
mod normalize;
mod selector;
mod zone_index;


pub use aggregator::{spread_by_zone, NamespaceFilter, SpreadAggregator, SpreadSettings};
pub use attribution::attribute;
pub use classify::{
    spread_gap, zone_percentages, DisbalanceClassifier, DEFAULT_DISBALANCE_THRESHOLD,
};
pub use normalize::{normalize, normalized};
pub use selector::{controller_selector, label_selector, requirement_selector};
pub use zone_index::{node_zone, ZoneIndex};
