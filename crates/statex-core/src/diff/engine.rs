//! Structural diff over JSON values.
//!
//! [`diff`] compares two values and emits the [`ChangeRecord`]s that turn the
//! first into the second; [`apply_changes`] replays them. The algorithm knows
//! nothing about document categories.

use crate::errors::{Result, StatexError};
use crate::model::{ChangeKind, ChangeRecord, KeySegment};
use serde_json::{Map, Value};

/// Compute the changes that turn `current` into `desired`.
///
/// Objects are compared key by key in sorted order: shared keys recurse
/// first, then keys only in `current` become deletes, then keys only in
/// `desired` become puts. Arrays keep their common prefix; from the first
/// differing position the old tail is deleted back to front and the new tail
/// put front to back. Any other mismatch is a put of the desired value.
pub fn diff(current: &Value, desired: &Value) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();
    let mut prefix = Vec::new();
    compare(current, desired, &mut prefix, &mut changes);
    changes
}

fn compare(
    current: &Value,
    desired: &Value,
    prefix: &mut Vec<KeySegment>,
    out: &mut Vec<ChangeRecord>,
) {
    match (current, desired) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, old_value) in old {
                if let Some(new_value) = new.get(key) {
                    prefix.push(KeySegment::Field(key.clone()));
                    compare(old_value, new_value, prefix, out);
                    prefix.pop();
                }
            }
            for key in old.keys().filter(|k| !new.contains_key(*k)) {
                out.push(ChangeRecord::delete(extend(prefix, KeySegment::Field(key.clone()))));
            }
            for (key, new_value) in new.iter().filter(|(k, _)| !old.contains_key(*k)) {
                out.push(ChangeRecord::put(
                    extend(prefix, KeySegment::Field(key.clone())),
                    new_value.clone(),
                ));
            }
        }
        (Value::Array(old), Value::Array(new)) => {
            let common = old
                .iter()
                .zip(new.iter())
                .take_while(|(a, b)| a == b)
                .count();
            for index in (common..old.len()).rev() {
                out.push(ChangeRecord::delete(extend(prefix, KeySegment::Index(index))));
            }
            for (index, value) in new.iter().enumerate().skip(common) {
                out.push(ChangeRecord::put(
                    extend(prefix, KeySegment::Index(index)),
                    value.clone(),
                ));
            }
        }
        (old, new) if old == new => {}
        (_, new) => out.push(ChangeRecord::put(prefix.clone(), new.clone())),
    }
}

fn extend(prefix: &[KeySegment], segment: KeySegment) -> Vec<KeySegment> {
    let mut key = prefix.to_vec();
    key.push(segment);
    key
}

/// Replay `changes` on top of `value`.
///
/// # Errors
///
/// `InvalidDocument` when a key walks through a scalar or indexes past the
/// end of an array.
pub fn apply_changes(mut value: Value, changes: &[ChangeRecord]) -> Result<Value> {
    for change in changes {
        match change.kind {
            ChangeKind::Put => set_nested(&mut value, &change.key, change.value_or_null().clone())?,
            ChangeKind::Delete => {
                remove_nested(&mut value, &change.key)?;
            }
        }
    }
    Ok(value)
}

/// Write `new_value` at `key`, creating intermediate objects as needed.
/// An empty key replaces `target` entirely.
///
/// # Errors
///
/// `InvalidDocument` when the key cannot be followed.
pub fn set_nested(target: &mut Value, key: &[KeySegment], new_value: Value) -> Result<()> {
    let Some((last, parents)) = key.split_last() else {
        *target = new_value;
        return Ok(());
    };

    let mut cursor = target;
    for (depth, segment) in parents.iter().enumerate() {
        cursor = step_into(cursor, segment, &key[..=depth])?;
    }

    if cursor.is_null() && matches!(last, KeySegment::Field(_)) {
        *cursor = Value::Object(Map::new());
    }
    match (cursor, last) {
        (Value::Object(map), KeySegment::Field(name)) => {
            map.insert(name.clone(), new_value);
            Ok(())
        }
        (Value::Array(items), KeySegment::Index(index)) if *index < items.len() => {
            items[*index] = new_value;
            Ok(())
        }
        (Value::Array(items), KeySegment::Index(index)) if *index == items.len() => {
            items.push(new_value);
            Ok(())
        }
        _ => Err(unreachable_key(key)),
    }
}

/// Remove the entry at `key`, returning it if it existed.
///
/// # Errors
///
/// `InvalidDocument` when an intermediate segment addresses a scalar.
pub fn remove_nested(target: &mut Value, key: &[KeySegment]) -> Result<Option<Value>> {
    let Some((last, parents)) = key.split_last() else {
        return Ok(Some(std::mem::take(target)));
    };

    let mut cursor = target;
    for segment in parents {
        cursor = match (cursor, segment) {
            (Value::Object(map), KeySegment::Field(name)) => match map.get_mut(name) {
                Some(next) => next,
                None => return Ok(None),
            },
            (Value::Array(items), KeySegment::Index(index)) => match items.get_mut(*index) {
                Some(next) => next,
                None => return Ok(None),
            },
            _ => return Err(unreachable_key(key)),
        };
    }

    match (cursor, last) {
        (Value::Object(map), KeySegment::Field(name)) => Ok(map.remove(name)),
        (Value::Array(items), KeySegment::Index(index)) if *index < items.len() => {
            Ok(Some(items.remove(*index)))
        }
        (Value::Array(_), KeySegment::Index(_)) => Ok(None),
        _ => Err(unreachable_key(key)),
    }
}

fn step_into<'v>(
    cursor: &'v mut Value,
    segment: &KeySegment,
    walked: &[KeySegment],
) -> Result<&'v mut Value> {
    if cursor.is_null() {
        *cursor = Value::Object(Map::new());
    }
    match (cursor, segment) {
        (Value::Object(map), KeySegment::Field(name)) => {
            Ok(map.entry(name.clone()).or_insert(Value::Null))
        }
        (Value::Array(items), KeySegment::Index(index)) => {
            items.get_mut(*index).ok_or_else(|| unreachable_key(walked))
        }
        _ => Err(unreachable_key(walked)),
    }
}

fn unreachable_key(key: &[KeySegment]) -> StatexError {
    StatexError::InvalidDocument {
        key: key
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("."),
        reason: "key does not address a container".to_string(),
    }
}
