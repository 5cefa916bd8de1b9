//! Error types for the merge crate.
//!
//! Both kinds are fatal to the in-progress merge: the computation is pure
//! and deterministic, so a failure is a property of the inputs, never a
//! transient condition. Callers present the path to the end user for
//! manual resolution.

use crate::path::Path;

/// Errors that can occur during a three-way merge.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// Both sides diverged from the base incompatibly at `path`.
    #[error("Conflict at {path}")]
    Conflict {
        /// Location of the conflicting value in the merged tree.
        path: Path,
    },

    /// Two items of one input array resolve to the same identity key.
    #[error("Duplicate array key '{key}' at {path}")]
    DuplicateKey {
        /// The identity key shared by two items.
        key: String,
        /// Location of the offending array.
        path: Path,
    },
}

impl MergeError {
    /// Conflict at `path`.
    pub fn conflict(path: &Path) -> Self {
        Self::Conflict { path: path.clone() }
    }

    /// Duplicate identity `key` inside the array at `path`.
    pub fn duplicate_key(key: impl Into<String>, path: &Path) -> Self {
        Self::DuplicateKey {
            key: key.into(),
            path: path.clone(),
        }
    }
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
