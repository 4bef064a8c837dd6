//! Dense zone matrix for rendering

use crate::models::AggregateResult;

/// Give every row an explicit count for every zone in `result.zones`.
///
/// Missing zones are filled with 0. Running it twice changes nothing.
pub fn normalize(result: &mut AggregateResult) {
    for ws in &mut result.spread {
        for zone in &result.zones {
            ws.counts.entry(zone.clone()).or_insert(0);
        }
    }
}

/// Owned variant of [`normalize`]
pub fn normalized(mut result: AggregateResult) -> AggregateResult {
    normalize(&mut result);
    result
}
