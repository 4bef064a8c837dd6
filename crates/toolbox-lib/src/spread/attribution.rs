//! Per-controller zone counting

use super::ZoneIndex;
use crate::models::Instance;
use std::collections::BTreeMap;

/// Count a controller's non-failed pods per zone.
///
/// The result is sparse: only zones with at least one pod appear. Counting
/// is a pure additive fold, so the order of `instances` does not matter.
pub fn attribute(instances: &[Instance], index: &ZoneIndex) -> BTreeMap<String, u32> {
    instances
        .iter()
        .filter(|instance| !instance.is_failed())
        .fold(BTreeMap::new(), |mut counts, instance| {
            let zone = index.resolve(instance.node_name.as_deref());
            *counts.entry(zone.to_string()).or_insert(0) += 1;
            counts
        })
}
