//! Recursive three-way structural merge.
//!
//! Merges two tree values against a common ancestor, dispatching per node:
//! equality short-circuits first, objects merge by key, arrays merge by
//! item identity over [`diff3_merge_indices`], and anything else that
//! diverged on both sides is a located conflict.
//!
//! Inputs are only read; the merged result is freshly constructed and
//! shares no state with them. The whole computation is synchronous and
//! pure --- a failure is a property of the inputs.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{MergeError, MergeResult};
use crate::keys::KeyedItems;
use crate::path::Path;
use crate::sequence_merge::{diff3_merge_indices, MergeRegion, Side};
use triad_diff::Range;

/// Derives a stable identity key for an array item.
pub type ArrayItemKeyFn = dyn Fn(&Value) -> String;

/// Options controlling a structural merge.
#[derive(Default)]
pub struct MergeOptions<'a> {
    /// When present, computes the identity of array items so the same
    /// logical item can be matched across states even when its position
    /// changed. Without it, primitive items are their own identity and
    /// composite array items cannot be matched.
    pub array_item_key: Option<&'a ArrayItemKeyFn>,
}

impl<'a> MergeOptions<'a> {
    /// Options with no item key extractor.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Three-way merge of `a` and `b` against their common ancestor `o`.
///
/// Incorporates non-conflicting changes from both sides; fails with a
/// path-located [`MergeError`] when both sides changed the same element
/// incompatibly. No partial result is ever produced.
pub fn diff3(o: &Value, a: &Value, b: &Value) -> MergeResult<Value> {
    diff3_with(o, a, b, &MergeOptions::default())
}

/// [`diff3`] with explicit [`MergeOptions`].
pub fn diff3_with(
    o: &Value,
    a: &Value,
    b: &Value,
    options: &MergeOptions<'_>,
) -> MergeResult<Value> {
    merge_values(o, a, b, &Path::root(), options)
}

fn merge_values(
    o: &Value,
    a: &Value,
    b: &Value,
    path: &Path,
    options: &MergeOptions<'_>,
) -> MergeResult<Value> {
    // Unchanged or one-sided changes resolve without recursion; so do
    // identical changes on both sides.
    if a == o {
        return Ok(b.clone());
    }
    if b == o || a == b {
        return Ok(a.clone());
    }
    match (a, b) {
        (Value::Object(a_map), Value::Object(b_map)) => {
            merge_objects(o, a_map, b_map, path, options)
        }
        (Value::Array(a_items), Value::Array(b_items)) => {
            merge_arrays(o, a_items, b_items, path, options)
        }
        _ => Err(MergeError::conflict(path)),
    }
}

/// Merge two objects by key against the ancestor.
///
/// Output keys keep `o`'s order, followed by keys only `a` added, then
/// keys only `b` added. A key missing from a state takes part in the
/// three-way comparison like any other value.
fn merge_objects(
    o: &Value,
    a: &Map<String, Value>,
    b: &Map<String, Value>,
    path: &Path,
    options: &MergeOptions<'_>,
) -> MergeResult<Value> {
    let empty = Map::new();
    let o = o.as_object().unwrap_or(&empty);

    let keys = o
        .keys()
        .chain(a.keys().filter(|k| !o.contains_key(*k)))
        .chain(
            b.keys()
                .filter(|k| !o.contains_key(*k) && !a.contains_key(*k)),
        );

    let mut out = Map::new();
    for key in keys {
        let child = path.child(key);
        match (o.get(key), a.get(key), b.get(key)) {
            (Some(ov), Some(av), Some(bv)) => {
                out.insert(key.clone(), merge_values(ov, av, bv, &child, options)?);
            }
            // Removed on one side; the other side must not have touched it.
            (Some(ov), Some(av), None) => {
                if av != ov {
                    return Err(MergeError::conflict(&child));
                }
            }
            (Some(ov), None, Some(bv)) => {
                if bv != ov {
                    return Err(MergeError::conflict(&child));
                }
            }
            (Some(_), None, None) => {}
            // Added independently by both sides.
            (None, Some(av), Some(bv)) => {
                if av != bv {
                    return Err(MergeError::conflict(&child));
                }
                out.insert(key.clone(), av.clone());
            }
            (None, Some(av), None) => {
                out.insert(key.clone(), av.clone());
            }
            (None, None, Some(bv)) => {
                out.insert(key.clone(), bv.clone());
            }
            (None, None, None) => unreachable!("key comes from the union of the three maps"),
        }
    }
    Ok(Value::Object(out))
}

/// Merge two arrays by item identity against the ancestor.
///
/// Runs the sequence merge over the three identity-key sequences, then
/// reconstructs the output by walking the resulting regions. Each identity
/// is placed at most once; cross-side edits to the same identity are
/// reconciled recursively wherever it lands.
fn merge_arrays(
    o: &Value,
    a: &[Value],
    b: &[Value],
    path: &Path,
    options: &MergeOptions<'_>,
) -> MergeResult<Value> {
    let empty = Vec::new();
    let o_items = o.as_array().unwrap_or(&empty);

    // Resolve identities per state; duplicates fail before any output.
    let o_keyed = KeyedItems::new(o_items, options.array_item_key, path)?;
    let a_keyed = KeyedItems::new(a, options.array_item_key, path)?;
    let b_keyed = KeyedItems::new(b, options.array_item_key, path)?;

    let regions = diff3_merge_indices(o_keyed.keys(), a_keyed.keys(), b_keyed.keys());
    debug!(
        path = %path,
        regions = regions.len(),
        "reconciling diverged arrays"
    );

    let mut out: Vec<Value> = Vec::new();
    let mut handled: HashSet<String> = HashSet::new();

    for region in &regions {
        match *region {
            MergeRegion::OkA(range) => {
                for idx in range.location..range.upper_bound() {
                    place_item(
                        idx, Side::A, &a_keyed, &b_keyed, &o_keyed, path, options, &mut out,
                        &mut handled,
                    )?;
                }
            }
            MergeRegion::OkB(range) => {
                for idx in range.location..range.upper_bound() {
                    place_item(
                        idx, Side::B, &b_keyed, &a_keyed, &o_keyed, path, options, &mut out,
                        &mut handled,
                    )?;
                }
            }
            MergeRegion::Conflict { a: ar, o: or, b: br } => {
                merge_conflict_region(
                    ar, or, br, &a_keyed, &b_keyed, &o_keyed, path, options, &mut out,
                    &mut handled,
                )?;
            }
        }
    }

    // Identities no region placed were dropped by a deletion group. A
    // survivor that the other side modified is a conflict, not a drop.
    for (key, o_item) in o_keyed.entries() {
        if handled.contains(key) {
            continue;
        }
        match (a_keyed.get(key), b_keyed.get(key)) {
            (None, None) => {}
            (Some(item), None) | (None, Some(item)) => {
                if item != o_item {
                    return Err(MergeError::conflict(&path.child(key)));
                }
            }
            (Some(a_item), Some(b_item)) => {
                out.push(merge_values(o_item, a_item, b_item, &path.child(key), options)?);
            }
        }
    }

    Ok(Value::Array(out))
}

/// Place one item emitted by a non-conflicting region.
///
/// The item is taken from `this` side; if the same identity also exists
/// anywhere on the `other` side with a different value, the two are
/// reconciled as a three-way merge against `o`'s matching item (or its
/// absence). An identity the other side deleted survives only unmodified.
#[allow(clippy::too_many_arguments)]
fn place_item(
    idx: usize,
    side: Side,
    this: &KeyedItems<'_>,
    other: &KeyedItems<'_>,
    base: &KeyedItems<'_>,
    path: &Path,
    options: &MergeOptions<'_>,
    out: &mut Vec<Value>,
    handled: &mut HashSet<String>,
) -> MergeResult<()> {
    let key = this.key(idx);
    if handled.contains(key) {
        return Ok(());
    }
    let item = this.item(idx);
    let child = path.child(key);

    let placed = match other.get(key) {
        Some(other_item) if item == other_item => Some(item.clone()),
        Some(other_item) => {
            let (a_item, b_item) = match side {
                Side::A => (item, other_item),
                Side::B => (other_item, item),
            };
            match base.get(key) {
                Some(base_item) => Some(merge_values(base_item, a_item, b_item, &child, options)?),
                // Added independently by both sides with different values.
                None => return Err(MergeError::conflict(&child)),
            }
        }
        None => match base.get(key) {
            Some(base_item) => {
                // The other side deleted this identity everywhere.
                if item != base_item {
                    return Err(MergeError::conflict(&child));
                }
                None
            }
            None => Some(item.clone()),
        },
    };

    handled.insert(key.to_string());
    if let Some(value) = placed {
        out.push(value);
    }
    Ok(())
}

/// Reconcile one conflicting region by identity.
///
/// Identities replayed by both sides' spans merge pairwise; identities
/// based in the region but replayed by neither are removals (or
/// modify-versus-delete conflicts); everything else is a move or addition
/// placed through [`place_item`]. `a`'s span is walked first, then `b`'s.
#[allow(clippy::too_many_arguments)]
fn merge_conflict_region(
    a_range: Range,
    o_range: Range,
    b_range: Range,
    a_keyed: &KeyedItems<'_>,
    b_keyed: &KeyedItems<'_>,
    o_keyed: &KeyedItems<'_>,
    path: &Path,
    options: &MergeOptions<'_>,
    out: &mut Vec<Value>,
    handled: &mut HashSet<String>,
) -> MergeResult<()> {
    let o_sub: HashMap<&str, &Value> = (o_range.location..o_range.upper_bound())
        .map(|idx| (o_keyed.key(idx), o_keyed.item(idx)))
        .collect();
    let b_sub: HashSet<&str> = (b_range.location..b_range.upper_bound())
        .map(|idx| b_keyed.key(idx))
        .collect();

    for idx in a_range.location..a_range.upper_bound() {
        let key = a_keyed.key(idx);
        if handled.contains(key) {
            continue;
        }
        match o_sub.get(key) {
            Some(o_item) if !b_sub.contains(key) => {
                // Based here, not replayed by `b` in this region.
                match b_keyed.get(key) {
                    // Moved away by `b`; its destination region places it.
                    Some(_) => {}
                    None => {
                        if a_keyed.item(idx) != *o_item {
                            return Err(MergeError::conflict(&path.child(key)));
                        }
                        // Removal wins over an untouched survivor.
                        handled.insert(key.to_string());
                    }
                }
            }
            _ => {
                place_item(
                    idx, Side::A, a_keyed, b_keyed, o_keyed, path, options, out, handled,
                )?;
            }
        }
    }

    for idx in b_range.location..b_range.upper_bound() {
        let key = b_keyed.key(idx);
        if handled.contains(key) {
            continue;
        }
        match o_sub.get(key) {
            Some(o_item) => {
                // Based here, not replayed by `a` in this region.
                match a_keyed.get(key) {
                    Some(_) => {}
                    None => {
                        if b_keyed.item(idx) != *o_item {
                            return Err(MergeError::conflict(&path.child(key)));
                        }
                        handled.insert(key.to_string());
                    }
                }
            }
            None => {
                place_item(
                    idx, Side::B, b_keyed, a_keyed, o_keyed, path, options, out, handled,
                )?;
            }
        }
    }

    Ok(())
}
