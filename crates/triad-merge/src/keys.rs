//! Identity keys for array items.
//!
//! Array reconciliation matches "the same logical item" across states by a
//! string identity rather than by position. The identity comes from the
//! caller's extractor when one is supplied, otherwise from the canonical
//! textual form of a primitive item. Two items of one array resolving to
//! the same identity is a hard error, raised before any merge output
//! exists.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{MergeError, MergeResult};
use crate::path::Path;
use crate::tree_merge::ArrayItemKeyFn;

/// An array with a resolved identity key per item.
#[derive(Debug)]
pub struct KeyedItems<'a> {
    items: &'a [Value],
    keys: Vec<String>,
    by_key: HashMap<String, usize>,
}

impl<'a> KeyedItems<'a> {
    /// Resolve an identity key for every item of `items`.
    ///
    /// Fails with [`MergeError::DuplicateKey`] when two items share an
    /// identity, and with [`MergeError::Conflict`] when an item is a
    /// composite value and no extractor is supplied. `path` locates the
    /// array for error reporting.
    pub fn new(
        items: &'a [Value],
        key_fn: Option<&ArrayItemKeyFn>,
        path: &Path,
    ) -> MergeResult<Self> {
        let mut keys = Vec::with_capacity(items.len());
        let mut by_key = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let key = match key_fn {
                Some(f) => f(item),
                None => default_item_key(item, path)?,
            };
            if by_key.insert(key.clone(), idx).is_some() {
                return Err(MergeError::duplicate_key(key, path));
            }
            keys.push(key);
        }
        Ok(Self {
            items,
            keys,
            by_key,
        })
    }

    /// The identity keys, in item order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The identity key of the item at `idx`.
    pub fn key(&self, idx: usize) -> &str {
        &self.keys[idx]
    }

    /// The item at `idx`.
    pub fn item(&self, idx: usize) -> &'a Value {
        &self.items[idx]
    }

    /// The item carrying identity `key`, wherever it sits in the array.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.by_key.get(key).map(|&idx| &self.items[idx])
    }

    /// Returns `true` if any item carries identity `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Iterate `(key, item)` pairs in item order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &'a Value)> + '_ {
        self.keys
            .iter()
            .map(String::as_str)
            .zip(self.items.iter())
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` for an empty array.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The identity of an item when no extractor is supplied: the canonical
/// textual form of a primitive. Composite items have no guessable
/// identity, so they fail as a structural conflict at the array's path.
fn default_item_key(item: &Value, path: &Path) -> MergeResult<String> {
    match item {
        Value::Null => Ok("null".to_string()),
        Value::Bool(v) => Ok(v.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Array(_) | Value::Object(_) => Err(MergeError::conflict(path)),
    }
}
