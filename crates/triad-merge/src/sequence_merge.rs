//! Three-way sequence merge: reconcile two diffs against a common base.
//!
//! Diffs the base against each derived side, then sweeps the combined
//! hunks left to right, grouping every maximal run of *touching* base
//! regions. Two edits are independent only if their base ranges do not
//! touch; a group fed by a single side merges cleanly, a group fed by both
//! is a conflict.

use std::hash::Hash;

use serde::{Deserialize, Serialize};
use triad_diff::{diff_indices, Range};

/// Which derived side a change came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// The left derived state.
    A,
    /// The right derived state.
    B,
}

/// One segment of a three-way sequence merge.
///
/// Concatenating the segments returned by [`diff3_merge_indices`] in order
/// yields the merged sequence: `OkA`/`OkB` spans are copied verbatim from
/// the named side, `Conflict` segments need explicit reconciliation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeRegion {
    /// Emit the items of `a` covered by the span --- an untouched common
    /// region, or a change only `a` made.
    OkA(Range),
    /// Emit the items of `b` covered by the span.
    OkB(Range),
    /// Both sides changed the same base region. The spans give each
    /// sequence's corresponding extent, for diagnostics or recursion.
    Conflict {
        /// Extent of the region in `a`.
        a: Range,
        /// Extent of the region in the base.
        o: Range,
        /// Extent of the region in `b`.
        b: Range,
    },
}

impl MergeRegion {
    /// Returns `true` for [`MergeRegion::Conflict`].
    pub fn is_conflict(&self) -> bool {
        matches!(self, MergeRegion::Conflict { .. })
    }
}

/// One contiguous change region from diffing the base against one side.
#[derive(Clone, Copy, Debug)]
struct Hunk {
    origin: Side,
    /// Span of the change in the base sequence.
    base: Range,
    /// Corresponding span in the changed side.
    edit: Range,
}

/// Merge two sequences derived from a common base into an ordered list of
/// regions spanning the whole base.
///
/// Every base position is accounted for exactly once, either by an emitted
/// region or by a pure deletion (an empty one-sided span, which is
/// skipped). Equality is positional; move-aware matching is layered on top
/// by the structural merge.
pub fn diff3_merge_indices<T>(o: &[T], a: &[T], b: &[T]) -> Vec<MergeRegion>
where
    T: Eq + Hash + Ord,
{
    let mut hunks: Vec<Hunk> = Vec::new();
    for d in diff_indices(o, a) {
        hunks.push(Hunk {
            origin: Side::A,
            base: d.old,
            edit: d.new,
        });
    }
    for d in diff_indices(o, b) {
        hunks.push(Hunk {
            origin: Side::B,
            base: d.old,
            edit: d.new,
        });
    }
    hunks.sort_by_key(|h| (h.base.location, h.origin));

    let mut regions = Vec::new();
    let mut o_pos = 0usize;
    let mut a_pos = 0usize;
    let mut b_pos = 0usize;

    let mut i = 0;
    while i < hunks.len() {
        // Grow a maximal run of touching base regions, regardless of which
        // side produced them. A zero-length base range (pure insertion)
        // directly adjacent to another hunk still joins the group.
        let group_start = hunks[i].base.location;
        let mut group_end = hunks[i].base.upper_bound();
        let mut j = i + 1;
        while j < hunks.len() && hunks[j].base.location <= group_end {
            group_end = group_end.max(hunks[j].base.upper_bound());
            j += 1;
        }
        let group = Range::new(group_start, group_end - group_start);

        // Copy the untouched common run since the previous group.
        let common = group_start - o_pos;
        if common > 0 {
            regions.push(MergeRegion::OkA(Range::new(a_pos, common)));
            o_pos += common;
            a_pos += common;
            b_pos += common;
        }

        let a_span = side_span(&hunks[i..j], Side::A, group);
        let b_span = side_span(&hunks[i..j], Side::B, group);
        match (a_span, b_span) {
            (Some(a_range), Some(b_range)) => {
                regions.push(MergeRegion::Conflict {
                    a: a_range,
                    o: group,
                    b: b_range,
                });
                a_pos = a_range.upper_bound();
                b_pos = b_range.upper_bound();
            }
            (Some(a_range), None) => {
                // Only `a` changed here; skip pure deletions.
                if !a_range.is_empty() {
                    regions.push(MergeRegion::OkA(a_range));
                }
                a_pos = a_range.upper_bound();
                b_pos += group.length;
            }
            (None, Some(b_range)) => {
                if !b_range.is_empty() {
                    regions.push(MergeRegion::OkB(b_range));
                }
                b_pos = b_range.upper_bound();
                a_pos += group.length;
            }
            (None, None) => unreachable!("group contains at least one hunk"),
        }
        o_pos = group.upper_bound();
        i = j;
    }

    // Untouched base suffix.
    if o_pos < o.len() {
        regions.push(MergeRegion::OkA(Range::new(a_pos, o.len() - o_pos)));
    }

    regions
}

/// The tightest span of `side` covering its hunks in the group, widened
/// outward by exactly the distance the group bounds extend past the side's
/// own hunk bounds (the sides' hunks need not align with the merged group
/// boundaries). `None` when the side contributed no hunks.
fn side_span(hunks: &[Hunk], side: Side, group: Range) -> Option<Range> {
    let mut edit_lo = usize::MAX;
    let mut edit_hi = 0usize;
    let mut base_lo = usize::MAX;
    let mut base_hi = 0usize;
    let mut found = false;
    for h in hunks.iter().filter(|h| h.origin == side) {
        found = true;
        edit_lo = edit_lo.min(h.edit.location);
        edit_hi = edit_hi.max(h.edit.upper_bound());
        base_lo = base_lo.min(h.base.location);
        base_hi = base_hi.max(h.base.upper_bound());
    }
    if !found {
        return None;
    }
    let lo = edit_lo - (base_lo - group.location);
    let hi = edit_hi + (group.upper_bound() - base_hi);
    Some(Range::new(lo, hi - lo))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reconstruct the merged sequence, panicking on conflicts.
    fn apply(regions: &[MergeRegion], a: &[i64], b: &[i64]) -> Vec<i64> {
        let mut out = Vec::new();
        for region in regions {
            match region {
                MergeRegion::OkA(r) => out.extend_from_slice(&a[r.location..r.upper_bound()]),
                MergeRegion::OkB(r) => out.extend_from_slice(&b[r.location..r.upper_bound()]),
                MergeRegion::Conflict { .. } => panic!("unexpected conflict: {region:?}"),
            }
        }
        out
    }

    #[test]
    fn identical_sequences_single_common_region() {
        let o = [1, 2, 3];
        let regions = diff3_merge_indices(&o, &o, &o);
        assert_eq!(regions, vec![MergeRegion::OkA(Range::new(0, 3))]);
    }

    #[test]
    fn change_on_one_side_only() {
        let o = [1, 2, 3];
        let a = [1, 9, 3];
        let regions = diff3_merge_indices(&o, &a, &o);
        assert_eq!(apply(&regions, &a, &o), vec![1, 9, 3]);

        let regions = diff3_merge_indices(&o, &o, &a);
        assert_eq!(apply(&regions, &o, &a), vec![1, 9, 3]);
    }

    #[test]
    fn independent_edits_merge() {
        // a removes the head, b inserts mid-sequence.
        let o = [1, 2, 3];
        let a = [2, 3];
        let b = [1, 2, 4, 3];
        let regions = diff3_merge_indices(&o, &a, &b);
        assert_eq!(apply(&regions, &a, &b), vec![2, 4, 3]);
    }

    #[test]
    fn pure_deletion_emits_no_region() {
        let o = [1, 2, 3];
        let a = [1, 3];
        let regions = diff3_merge_indices(&o, &a, &o);
        assert_eq!(
            regions,
            vec![
                MergeRegion::OkA(Range::new(0, 1)),
                MergeRegion::OkA(Range::new(1, 1)),
            ]
        );
    }

    #[test]
    fn overlapping_edits_conflict() {
        let o = [1, 2, 3];
        let a = [1, 8, 3];
        let b = [1, 9, 3];
        let regions = diff3_merge_indices(&o, &a, &b);
        assert_eq!(
            regions,
            vec![
                MergeRegion::OkA(Range::new(0, 1)),
                MergeRegion::Conflict {
                    a: Range::new(1, 1),
                    o: Range::new(1, 1),
                    b: Range::new(1, 1),
                },
                MergeRegion::OkA(Range::new(2, 1)),
            ]
        );
    }

    #[test]
    fn touching_hunks_group_into_one_conflict() {
        // a deletes base[1]; b inserts directly after it. The hunks touch,
        // so they fall into a single group rather than two independent
        // edits with ambiguous ordering.
        let o = [1, 2, 3];
        let a = [1, 3];
        let b = [1, 2, 9, 3];
        let regions = diff3_merge_indices(&o, &a, &b);
        assert_eq!(
            regions,
            vec![
                MergeRegion::OkA(Range::new(0, 1)),
                MergeRegion::Conflict {
                    a: Range::new(1, 0),
                    o: Range::new(1, 1),
                    b: Range::new(1, 2),
                },
                MergeRegion::OkA(Range::new(1, 1)),
            ]
        );
    }

    #[test]
    fn conflict_spans_are_skew_corrected() {
        // The grouped base region extends past each side's own hunks; the
        // reported side spans must widen by the same distance.
        let o = [1, 2, 3, 4, 5];
        let a = [1, 8, 8, 4, 5];
        let b = [1, 2, 9, 9, 5];
        let regions = diff3_merge_indices(&o, &a, &b);
        assert_eq!(
            regions,
            vec![
                MergeRegion::OkA(Range::new(0, 1)),
                MergeRegion::Conflict {
                    a: Range::new(1, 3),
                    o: Range::new(1, 3),
                    b: Range::new(1, 3),
                },
                MergeRegion::OkA(Range::new(4, 1)),
            ]
        );
    }

    #[test]
    fn opposite_moves_resolve_into_two_conflict_regions() {
        // a moves 5 toward the front; b moves the block [2, 3, 4] to the
        // front. Each move is a delete plus a distant insert, which the
        // sweep keeps as separate regions.
        let o = [1, 2, 3, 4, 5, 6];
        let a = [1, 5, 2, 3, 4, 6];
        let b = [2, 3, 4, 1, 5, 6];
        let regions = diff3_merge_indices(&o, &a, &b);
        assert_eq!(
            regions,
            vec![
                MergeRegion::Conflict {
                    a: Range::new(0, 2),
                    o: Range::new(0, 1),
                    b: Range::new(0, 0),
                },
                MergeRegion::OkA(Range::new(2, 3)),
                MergeRegion::Conflict {
                    a: Range::new(5, 0),
                    o: Range::new(4, 1),
                    b: Range::new(3, 2),
                },
                MergeRegion::OkA(Range::new(5, 1)),
            ]
        );
    }

    #[test]
    fn both_insert_into_empty_base() {
        let o: [i64; 0] = [];
        let a = [1];
        let b = [2];
        let regions = diff3_merge_indices(&o, &a, &b);
        assert_eq!(
            regions,
            vec![MergeRegion::Conflict {
                a: Range::new(0, 1),
                o: Range::new(0, 0),
                b: Range::new(0, 1),
            }]
        );
    }

    #[test]
    fn non_conflicting_regions_cover_base_exactly() {
        let o = [1, 2, 3, 4, 5, 6, 7, 8];
        let a = [1, 2, 9, 4, 5, 6, 7, 8];
        let b = [1, 2, 3, 4, 5, 6, 10, 8];
        let regions = diff3_merge_indices(&o, &a, &b);
        assert!(regions.iter().all(|r| !r.is_conflict()));
        assert_eq!(apply(&regions, &a, &b), vec![1, 2, 9, 4, 5, 6, 10, 8]);
    }
}
