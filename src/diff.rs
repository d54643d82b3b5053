use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::trace::types::FieldChange;

/// Computes field-level changes between two snapshots using JSON paths.
///
/// Pure and deterministic: union keys are visited in sorted order, so the
/// output list is reproducible for identical inputs. Only nested objects
/// are recursed into; list-valued fields are compared as atomic leaves.
/// Values are compared with strict `Value` equality, no type coercion.
pub fn compute_field_changes(
    old: Option<&Map<String, Value>>,
    new: &Map<String, Value>,
    prefix: &str,
) -> Vec<FieldChange> {
    let empty = Map::new();
    let old = old.unwrap_or(&empty);

    let mut changes = Vec::new();
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    for key in keys {
        let old_val = old.get(key.as_str());
        let new_val = new.get(key.as_str());
        let path = format!("{}.{}", prefix, key);

        match (old_val, new_val) {
            (Some(Value::Object(old_map)), Some(Value::Object(new_map))) => {
                changes.extend(compute_field_changes(Some(old_map), new_map, &path));
            }
            _ => {
                if !leaf_eq(old_val, new_val) {
                    changes.push(FieldChange::new(
                        path,
                        old_val.cloned(),
                        new_val.cloned(),
                    ));
                }
            }
        }
    }

    changes
}

/// Diff against the root prefix `$`.
pub fn diff_snapshots(
    old: Option<&Map<String, Value>>,
    new: &Map<String, Value>,
) -> Vec<FieldChange> {
    compute_field_changes(old, new, "$")
}

// Absent and explicit null are the same leaf state.
fn leaf_eq(old: Option<&Value>, new: Option<&Value>) -> bool {
    let old = old.filter(|value| !value.is_null());
    let new = new.filter(|value| !value.is_null());
    old == new
}
