//! Changed-region extraction over strings.
//!
//! The string counterpart of [`diff_indices`](crate::slice_diff::diff_indices):
//! ranges are expressed in character units, and the divergent middle is
//! handed to the `similar` text differ.

use similar::TextDiff;

use crate::slice_diff::{collect_changed, DiffRange};

/// Compute the changed regions between two strings, in char units.
///
/// Returns a base-ordered list of changed regions only; two equal strings
/// produce an empty list.
pub fn diff_text_indices(old: &str, new: &str) -> Vec<DiffRange> {
    if old == new {
        return Vec::new();
    }

    // Strip the common prefix and suffix, tracking both char and byte
    // positions: ranges are reported in chars, slicing needs bytes.
    let mut prefix_chars = 0usize;
    let mut prefix_bytes = 0usize;
    for (o, n) in old.chars().zip(new.chars()) {
        if o != n {
            break;
        }
        prefix_chars += 1;
        prefix_bytes += o.len_utf8();
    }
    let old_rest = &old[prefix_bytes..];
    let new_rest = &new[prefix_bytes..];

    let mut suffix_bytes = 0usize;
    for (o, n) in old_rest.chars().rev().zip(new_rest.chars().rev()) {
        if o != n {
            break;
        }
        suffix_bytes += o.len_utf8();
    }
    let old_mid = &old_rest[..old_rest.len() - suffix_bytes];
    let new_mid = &new_rest[..new_rest.len() - suffix_bytes];

    let diff = TextDiff::from_chars(old_mid, new_mid);
    collect_changed(
        diff.ops()
            .iter()
            .map(|op| (op.tag(), op.old_range(), op.new_range())),
        prefix_chars,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(diff: &[DiffRange]) -> Vec<(usize, usize, usize, usize)> {
        diff.iter()
            .map(|d| (d.old.location, d.old.length, d.new.location, d.new.length))
            .collect()
    }

    #[test]
    fn equal_strings_no_regions() {
        assert!(diff_text_indices("hello", "hello").is_empty());
        assert!(diff_text_indices("", "").is_empty());
    }

    #[test]
    fn single_char_replacement() {
        assert_eq!(
            ranges(&diff_text_indices("cat", "cut")),
            vec![(1, 1, 1, 1)]
        );
    }

    #[test]
    fn insertion_in_middle() {
        assert_eq!(
            ranges(&diff_text_indices("abcd", "abXcd")),
            vec![(2, 0, 2, 1)]
        );
    }

    #[test]
    fn deletion_at_start() {
        assert_eq!(
            ranges(&diff_text_indices("xabc", "abc")),
            vec![(0, 1, 0, 0)]
        );
    }

    #[test]
    fn multibyte_chars_use_char_offsets() {
        // The common prefix is two chars (five bytes); ranges must count chars.
        let diff = diff_text_indices("日本x", "日本y");
        assert_eq!(ranges(&diff), vec![(2, 1, 2, 1)]);
    }

    #[test]
    fn disjoint_edits() {
        let diff = diff_text_indices("one two three", "ONE two THREE");
        assert!(diff.len() >= 2);
        assert_eq!(diff[0].old.location, 0);
        for pair in diff.windows(2) {
            assert!(pair[0].old.upper_bound() < pair[1].old.location);
        }
    }
}
