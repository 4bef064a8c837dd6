//! Disbalance classification
//!
//! A controller is disbalanced when the gap between its most and least
//! populated zone, measured as a share of its pods, exceeds a threshold.
//! Shares are computed in floating point: `count / total * 100`. The
//! threshold test itself works from the integer counts so a gap exactly at
//! the threshold never rounds above it.

use crate::models::WorkloadSpread;
use serde::{Deserialize, Serialize};

/// Default gap (in percentage points) above which a spread is disbalanced
pub const DEFAULT_DISBALANCE_THRESHOLD: f64 = 60.0;

/// Classifies normalized zone spreads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisbalanceClassifier {
    /// Maximum allowed gap between zone shares, in percentage points
    pub threshold: f64,
}

impl Default for DisbalanceClassifier {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DISBALANCE_THRESHOLD,
        }
    }
}

impl DisbalanceClassifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// `true` when `max_share - min_share > threshold`.
    ///
    /// A spread with no pods is never disbalanced.
    pub fn classify(&self, ws: &WorkloadSpread) -> bool {
        // (max - min) / total * 100 > threshold, without the division
        count_range(ws).is_some_and(|(min, max, total)| {
            f64::from(max - min) * 100.0 > self.threshold * f64::from(total)
        })
    }
}

/// Each zone's share of the controller's pods, in percent
///
/// Empty when the controller has no counted pods.
pub fn zone_percentages(ws: &WorkloadSpread) -> Vec<(&str, f64)> {
    let total = ws.total();
    if total == 0 {
        return Vec::new();
    }
    let total = f64::from(total);

    ws.counts
        .iter()
        .map(|(zone, count)| (zone.as_str(), f64::from(*count) / total * 100.0))
        .collect()
}

/// Difference between the largest and smallest zone share
///
/// `None` for a spread with no pods.
pub fn spread_gap(ws: &WorkloadSpread) -> Option<f64> {
    count_range(ws).map(|(min, max, total)| f64::from(max - min) * 100.0 / f64::from(total))
}

/// Smallest count, largest count and total; `None` when there are no pods
fn count_range(ws: &WorkloadSpread) -> Option<(u32, u32, u32)> {
    let total = ws.total();
    if total == 0 {
        return None;
    }
    let min = ws.counts.values().copied().min()?;
    let max = ws.counts.values().copied().max()?;
    Some((min, max, total))
}
