// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Recursive diff and merge of structured values.
//!
//! `diff(current, reference)` describes what has to be applied to
//! `reference` to reach `current`; `merge(base, overlay)` applies such a
//! description. Both are pure and never fail loudly: "nothing changed" and
//! "shapes are irreconcilable" are both expressed as `None`.
//!
//! # Rules
//!
//! | current / base | reference / overlay | diff | merge |
//! |---|---|---|---|
//! | object | object | per-key recursion, `Null` tombstone for removed keys | per-key recursion, new keys copied |
//! | scalar/array/`Null` | same kind | `current` if unequal | `overlay` |
//! | any | other kind | `current` | `None` |
//!
//! `Null` is a kind of its own. A tombstone merged onto a key that still
//! holds a value is a kind mismatch, so the whole merge fails.
//!
//! Arrays are never diffed element-wise; any difference replaces the array.
//!
//! # Example
//!
//! ```
//! use record_graph::Value;
//! use serde_json::json;
//!
//! let before = Value::from(json!({"name": "Dave", "rating": 0}));
//! let after = Value::from(json!({"name": "Dave", "rating": 9}));
//!
//! let changes = after.diff(&before).unwrap();
//! assert_eq!(changes, Value::from(json!({"rating": 9})));
//! assert_eq!(before.merge(&changes), Some(after.clone()));
//! assert_eq!(after.diff(&after), None);
//! ```

use super::{Map, Value};

impl Value {
    /// Describe how `reference` must change to become `self`.
    ///
    /// Returns `None` when the two are equal. An object whose every key is
    /// unchanged yields `None`, never an empty object, so callers can tell
    /// "nothing changed" apart from "changed to `{}`".
    #[must_use]
    pub fn diff(&self, reference: &Value) -> Option<Value> {
        match (self, reference) {
            (Value::Object(current), Value::Object(reference)) => {
                let mut changes = Map::new();

                for (key, value) in current {
                    match reference.get(key) {
                        Some(previous) => {
                            if let Some(change) = value.diff(previous) {
                                changes.insert(key.clone(), change);
                            }
                        }
                        None => {
                            changes.insert(key.clone(), value.clone());
                        }
                    }
                }

                for key in reference.keys() {
                    if !current.contains_key(key) {
                        changes.insert(key.clone(), Value::Null);
                    }
                }

                if changes.is_empty() {
                    None
                } else {
                    Some(Value::Object(changes))
                }
            }
            (current, reference) if current.kind() == reference.kind() => {
                if current == reference {
                    None
                } else {
                    Some(current.clone())
                }
            }
            (current, _) => Some(current.clone()),
        }
    }

    /// Apply `overlay` on top of `self`.
    ///
    /// Returns `None` when a pair of values at the same path have
    /// different kinds; the failure propagates to the root. `Null` only
    /// merges with `Null`.
    #[must_use]
    pub fn merge(&self, overlay: &Value) -> Option<Value> {
        match (self, overlay) {
            (Value::Object(base), Value::Object(changes)) => {
                let mut merged = base.clone();
                for (key, change) in changes {
                    let value = match base.get(key) {
                        Some(existing) => existing.merge(change)?,
                        None => change.clone(),
                    };
                    merged.insert(key.clone(), value);
                }
                Some(Value::Object(merged))
            }
            (base, overlay) if base.kind() == overlay.kind() => Some(overlay.clone()),
            _ => None,
        }
    }
}

/// Function form of [`Value::diff`].
#[must_use]
pub fn diff(current: &Value, reference: &Value) -> Option<Value> {
    current.diff(reference)
}

/// Function form of [`Value::merge`].
#[must_use]
pub fn merge(base: &Value, overlay: &Value) -> Option<Value> {
    base.merge(overlay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people() -> (Value, Value) {
        (
            Value::from(json!({
                "name": "John",
                "surname": "Smith",
                "title": "Manager",
                "male": true,
                "car": {"make": "Ford", "model": "Escort", "year": 1979},
            })),
            Value::from(json!({
                "name": "Sarah",
                "surname": "Smith",
                "age": 65,
                "male": false,
                "car": {"make": "Ford", "model": "Falcon", "year": 1992},
            })),
        )
    }

    #[test]
    fn test_diff() {
        let (john, sarah) = people();

        let diff = sarah.diff(&john).unwrap();
        assert!(diff.get("title").is_some_and(Value::is_null));
        assert_eq!(diff.get("age").and_then(Value::as_i64), Some(65));
        assert_eq!(diff.get("car").and_then(|c| c.get("model")).and_then(Value::as_str), Some("Falcon"));
        assert!(diff.get("car").and_then(|c| c.get("make")).is_none());
        assert!(diff.get("surname").is_none());

        let reverse = john.diff(&sarah).unwrap();
        assert_eq!(reverse.get("title").and_then(Value::as_str), Some("Manager"));
        assert!(reverse.get("age").is_some_and(Value::is_null));
        assert_eq!(reverse.get("car").and_then(|c| c.get("model")).and_then(Value::as_str), Some("Escort"));
        assert!(reverse.get("car").and_then(|c| c.get("make")).is_none());
    }

    #[test]
    fn test_merge() {
        let (john, sarah) = people();

        let merged = john.merge(&sarah).unwrap();
        assert_eq!(merged.get("name").and_then(Value::as_str), Some("Sarah"));
        assert_eq!(merged.get("surname").and_then(Value::as_str), Some("Smith"));
        assert_eq!(merged.get("title").and_then(Value::as_str), Some("Manager"));
        assert_eq!(merged.get("age").and_then(Value::as_i64), Some(65));
        assert_eq!(merged.get("car").and_then(|c| c.get("model")).and_then(Value::as_str), Some("Falcon"));
        assert_eq!(merged.get("car").and_then(|c| c.get("make")).and_then(Value::as_str), Some("Ford"));
    }

    #[test]
    fn test_diff_of_equal_values_is_none() {
        let (john, _) = people();
        assert_eq!(john.diff(&john), None);
        assert_eq!(Value::Null.diff(&Value::Null), None);
        assert_eq!(Value::Object(Map::new()).diff(&Value::Object(Map::new())), None);
    }

    #[test]
    fn test_diff_distinguishes_no_change_from_empty_object() {
        let before = Value::from(json!({"settings": {"theme": "dark"}}));
        let after = Value::from(json!({"settings": {}}));

        let diff = after.diff(&before).unwrap();
        assert_eq!(diff, Value::from(json!({"settings": {"theme": null}})));

        let empty = Value::from(json!({}));
        assert_eq!(empty.diff(&Value::from("text")), Some(empty.clone()));
    }

    #[test]
    fn test_arrays_are_replaced_wholesale() {
        let before = Value::from(json!({"tags": ["a", "b", "c"]}));
        let after = Value::from(json!({"tags": ["a", "b", "d"]}));

        let diff = after.diff(&before).unwrap();
        assert_eq!(diff, Value::from(json!({"tags": ["a", "b", "d"]})));
        assert_eq!(before.merge(&diff), Some(after));
    }

    #[test]
    fn test_type_mismatch_diff_returns_current() {
        let current = Value::from(json!({"a": 1}));
        assert_eq!(current.diff(&Value::from(5)), Some(current.clone()));
        assert_eq!(Value::from("5").diff(&Value::from(5)), Some(Value::from("5")));
        assert_eq!(Value::Bytes(vec![1]).diff(&Value::from(vec![Value::from(1)])), Some(Value::Bytes(vec![1])));
    }

    #[test]
    fn test_scalar_diff() {
        assert_eq!(Value::from(true).diff(&Value::from(false)), Some(Value::from(true)));
        assert_eq!(Value::from(3).diff(&Value::from(3)), None);
        assert_eq!(Value::Bytes(vec![1, 2]).diff(&Value::Bytes(vec![1, 2])), None);
    }

    #[test]
    fn test_merge_of_mismatched_kinds_fails() {
        assert_eq!(Value::from("x").merge(&Value::from(1)), None);
        assert_eq!(Value::from(json!({"a": 1})).merge(&Value::from("a")), None);
        assert_eq!(Value::from("a").merge(&Value::from(json!({"a": 1}))), None);
    }

    #[test]
    fn test_merge_failure_propagates_from_nested_key() {
        let base = Value::from(json!({"name": "Dave", "car": {"year": 1979}}));
        let overlay = Value::from(json!({"name": "Alan", "car": {"year": "old"}}));
        assert_eq!(base.merge(&overlay), None);
    }

    #[test]
    fn test_merge_of_tombstone_onto_present_key_fails() {
        let base = Value::from(json!({"title": "Manager", "name": "John"}));
        let overlay = Value::from(json!({"title": null}));
        assert_eq!(base.merge(&overlay), None);
        assert_eq!(Value::from("x").merge(&Value::Null), None);
    }

    #[test]
    fn test_merge_onto_null_base_fails() {
        let base = Value::from(json!({"color": null}));
        let overlay = Value::from(json!({"color": "Green"}));
        assert_eq!(base.merge(&overlay), None);
        assert_eq!(Value::Null.merge(&Value::from(1)), None);
    }

    #[test]
    fn test_null_merges_with_null() {
        let base = Value::from(json!({"color": null, "name": "Dave"}));
        let overlay = Value::from(json!({"color": null}));
        assert_eq!(base.merge(&overlay), Some(base.clone()));
        assert_eq!(Value::Null.merge(&Value::Null), Some(Value::Null));
    }

    #[test]
    fn test_roundtrip_merge_of_diff() {
        let (john, sarah) = people();
        // John's `title` is tombstoned in the diff and cannot be merged back.
        let diff = sarah.diff(&john).unwrap();
        assert_eq!(john.merge(&diff), None);

        let mut without_title = john.as_object().unwrap().clone();
        without_title.remove("title");
        let john = Value::Object(without_title);
        let diff = sarah.diff(&john).unwrap();
        assert_eq!(john.merge(&diff), Some(sarah));
    }

    #[test]
    fn test_function_forms_match_methods() {
        let (john, sarah) = people();
        assert_eq!(diff(&sarah, &john), sarah.diff(&john));
        assert_eq!(merge(&john, &sarah), john.merge(&sarah));
    }
}
