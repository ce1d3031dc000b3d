//! Array ⇄ object compaction of sibling groups
//!
//! A sibling group is the children list of an element (or the top-level
//! entry list). In array form it is a list of single-key entries:
//!
//! ```text
//! [{"@id": "1"}, {"b": []}, {"#TEXT": "x"}]   ──compact──▶   {"@id": "1", "b": {}, "#TEXT": "x"}
//!                                             ◀──expand───
//! ```
//!
//! Compaction only happens when every key of the group is unique; a group
//! with a duplicate key keeps the array form, which is always lossless.
//!
//! Both directions recurse once per JSON level; callers keep input within
//! [`crate::json::MAX_JSON_DEPTH`].

use crate::utils::{keys_unique, single_key};
use serde_json::{Map, Value};

/// Compact every group, innermost first. Idempotent.
pub fn compact(group: Value) -> Value {
    match group {
        Value::Array(entries) => {
            let entries: Vec<Value> = entries.into_iter().map(compact_entry).collect();

            let compactable = entries.iter().all(|e| single_key(e).is_some())
                && keys_unique(entries.iter().filter_map(single_key));
            if !compactable {
                return Value::Array(entries);
            }

            let mut map = Map::with_capacity(entries.len());
            for entry in entries {
                if let Value::Object(entry) = entry {
                    map.extend(entry);
                }
            }
            Value::Object(map)
        }
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, compact(value)))
                .collect(),
        ),
        leaf => leaf,
    }
}

/// Rewrite every group into array form (the inverse of [`compact`])
pub fn expand(group: Value) -> Value {
    match group {
        Value::Object(map) => Value::Array(map.into_iter().map(entry).collect()),
        Value::Array(entries) => Value::Array(
            entries
                .into_iter()
                .flat_map(|e| match e {
                    // Multi-key entries are split into one entry per key
                    Value::Object(map) => map.into_iter().map(entry).collect::<Vec<_>>(),
                    other => vec![other],
                })
                .collect(),
        ),
        leaf => leaf,
    }
}

fn compact_entry(entry: Value) -> Value {
    match entry {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, compact(value)))
                .collect(),
        ),
        other => other,
    }
}

fn entry((key, value): (String, Value)) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(key, expand(value));
    Value::Object(map)
}
