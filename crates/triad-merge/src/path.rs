//! Paths locating values inside a merged tree.

use std::fmt;

/// The location of a value within a tree: an ordered list of field names
/// and, for items of keyed arrays, resolved identity keys.
///
/// Paths are immutable; [`child`](Path::child) returns an extended copy, so
/// sibling branches of a recursive merge never observe each other's
/// segments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The root path, rendered as `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// A copy of this path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Number of segments; the root has zero.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_renders_as_slash() {
        assert_eq!(Path::root().to_string(), "/");
        assert_eq!(Path::root().depth(), 0);
    }

    #[test]
    fn nested_path_renders_joined() {
        let path = Path::root().child("bar").child("value");
        assert_eq!(path.to_string(), "/bar/value");
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn child_does_not_mutate_parent() {
        let parent = Path::root().child("world");
        let _child = parent.child("deep");
        assert_eq!(parent.to_string(), "/world");
    }
}
