//! Changed-region extraction over generic slices.
//!
//! Uses the `similar` crate (Myers diff algorithm) on the divergent middle
//! of the two inputs, after eliminating their common prefix and suffix.

use std::hash::Hash;

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffTag};

use crate::range::Range;

/// One contiguous changed region between two sequences.
///
/// `old` and `new` give the corresponding spans in each input. The equal
/// regions are the implicit gaps between successive records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRange {
    /// Span of the region in the old sequence.
    pub old: Range,
    /// Span of the region in the new sequence.
    pub new: Range,
}

impl DiffRange {
    /// Create a changed region from its two spans.
    pub fn new(old: Range, new: Range) -> Self {
        Self { old, new }
    }
}

/// Compute the changed regions between two slices.
///
/// Returns a base-ordered, non-overlapping list of changed regions only;
/// two equal slices produce an empty list. A region with an empty `old`
/// span is a pure insertion, one with an empty `new` span a pure deletion.
pub fn diff_indices<T>(old: &[T], new: &[T]) -> Vec<DiffRange>
where
    T: Eq + Hash + Ord,
{
    // Identity fast path.
    if std::ptr::eq(old, new) {
        return Vec::new();
    }

    // Strip the common prefix and suffix; the underlying algorithm only
    // needs to see the divergent middle.
    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(o, n)| o == n)
        .count();
    let old_rest = &old[prefix..];
    let new_rest = &new[prefix..];
    let suffix = old_rest
        .iter()
        .rev()
        .zip(new_rest.iter().rev())
        .take_while(|(o, n)| o == n)
        .count();
    let old_mid = &old_rest[..old_rest.len() - suffix];
    let new_mid = &new_rest[..new_rest.len() - suffix];

    if old_mid.is_empty() && new_mid.is_empty() {
        return Vec::new();
    }

    let ops = capture_diff_slices(Algorithm::Myers, old_mid, new_mid);
    collect_changed(
        ops.iter()
            .map(|op| (op.tag(), op.old_range(), op.new_range())),
        prefix,
    )
}

/// Fold diff ops into absolute changed regions, merging touching ones.
pub(crate) fn collect_changed<I>(ops: I, offset: usize) -> Vec<DiffRange>
where
    I: Iterator<Item = (DiffTag, std::ops::Range<usize>, std::ops::Range<usize>)>,
{
    let mut out: Vec<DiffRange> = Vec::new();
    for (tag, old_r, new_r) in ops {
        if tag == DiffTag::Equal {
            continue;
        }
        let old = Range::new(old_r.start + offset, old_r.len());
        let new = Range::new(new_r.start + offset, new_r.len());
        // A delete directly followed by an insert is one changed region.
        match out.last_mut() {
            Some(last)
                if last.old.upper_bound() == old.location
                    && last.new.upper_bound() == new.location =>
            {
                last.old.length += old.length;
                last.new.length += new.length;
            }
            _ => out.push(DiffRange::new(old, new)),
        }
    }
    out
}
