//! Merge engine for Triad.
//!
//! Implements three-way merging: given a common ancestor `O` and two
//! independently derived states `A` and `B`, produces a merged state that
//! incorporates the non-conflicting changes from both sides and reports a
//! precise, path-located error when both sides changed the same element
//! incompatibly.
//!
//! Two levels are exposed. [`diff3_merge_indices`] reconciles two diffs
//! against a common base sequence into an ordered list of merge regions.
//! [`diff3`] is the recursive structural merge over JSON-shaped values,
//! built on top of it, with move-aware array reconciliation via item
//! identity keys.
//!
//! # Key Types
//!
//! - [`MergeRegion`] -- One segment of a sequence-level merge (`OkA`/`OkB`/`Conflict`)
//! - [`MergeError`] / [`MergeResult`] -- Conflict and duplicate-key failures
//! - [`MergeOptions`] -- Optional array item identity extractor
//! - [`Path`] -- `/`-joined location of a value inside the merged tree

pub mod error;
pub mod keys;
pub mod path;
pub mod sequence_merge;
pub mod tree_merge;

pub use error::{MergeError, MergeResult};
pub use keys::KeyedItems;
pub use path::Path;
pub use sequence_merge::{diff3_merge_indices, MergeRegion, Side};
pub use tree_merge::{diff3, diff3_with, ArrayItemKeyFn, MergeOptions};

// Re-exported so callers of the merge engine need a single dependency.
pub use triad_diff::{diff_indices, diff_text_indices, DiffRange, Range};
