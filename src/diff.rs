use std::collections::BTreeMap;

use serde_json::Value;

/// A changed property: code, old value, new value. A code that appeared has
/// `Null` as its old value; one that vanished has `Null` as its new value.
pub(crate) type Change = (String, Value, Value);

/// Per-code differences between two property maps, ordered by code.
pub(crate) fn property_changes(
    previous: &BTreeMap<String, Value>,
    current: &BTreeMap<String, Value>,
) -> Vec<Change> {
    let mut changes: Vec<Change> = current
        .iter()
        .filter_map(|(code, value)| match previous.get(code) {
            Some(old) if old == value => None,
            old => Some((code.clone(), old.cloned().unwrap_or(Value::Null), value.clone())),
        })
        .collect();
    changes.extend(
        previous
            .iter()
            .filter(|(code, _)| !current.contains_key(*code))
            .map(|(code, old)| (code.clone(), old.clone(), Value::Null)),
    );
    changes.sort_by(|a, b| a.0.cmp(&b.0));
    changes
}

/// Property codes whose value differs between two snapshots, including
/// codes that appeared or vanished.
pub(crate) fn changed_properties(
    previous: &BTreeMap<String, Value>,
    current: &BTreeMap<String, Value>,
) -> Vec<String> {
    property_changes(previous, current)
        .into_iter()
        .map(|(code, _, _)| code)
        .collect()
}
