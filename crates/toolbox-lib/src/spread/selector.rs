//! Label selector construction

use crate::models::{LabelRequirement, SelectorOperator};

/// Join match labels into a `key=value,key=value` selector.
///
/// Pairs are emitted in the order given, so the same input always yields
/// the same string.
pub fn label_selector<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Full selector: equality pairs first, then set-based requirements.
///
/// Both parts keep their given order.
pub fn controller_selector<K, V>(pairs: &[(K, V)], requirements: &[LabelRequirement]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let labels = label_selector(pairs);
    let expressions = requirements
        .iter()
        .map(requirement_selector)
        .collect::<Vec<_>>()
        .join(",");

    match (labels.is_empty(), expressions.is_empty()) {
        (_, true) => labels,
        (true, false) => expressions,
        (false, false) => format!("{},{}", labels, expressions),
    }
}

/// Render one requirement in set-based syntax (`k in (a,b)`, `!k`, ...)
pub fn requirement_selector(requirement: &LabelRequirement) -> String {
    let key = &requirement.key;
    match requirement.operator {
        SelectorOperator::In => format!("{} in ({})", key, requirement.values.join(",")),
        SelectorOperator::NotIn => format!("{} notin ({})", key, requirement.values.join(",")),
        SelectorOperator::Exists => key.clone(),
        SelectorOperator::DoesNotExist => format!("!{}", key),
    }
}
