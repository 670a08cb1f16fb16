//! Snapshot bookkeeping types.
//!
//! A snapshot records one [`PathInfo`] per tracked file. Comparing two
//! snapshots yields a [`ChangeSet`]; branches are described by
//! [`BranchInfo`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::layout;

// ---------------------------------------------------------------------------
// PathInfo
// ---------------------------------------------------------------------------

/// One file's identity at a point in time.
///
/// A `size` of `None` marks the file as deleted in that revision. Empty files
/// carry `Some(0)` and no content hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathInfo {
    /// SHA-256 of the relative path, used as the stored file name.
    pub name_hash: String,
    /// Byte size, or `None` if the file was deleted.
    pub size: Option<u64>,
    /// Modification time in milliseconds since the epoch.
    pub mtime: i64,
    /// Content digest, or `None` for deleted or empty files.
    pub hash: Option<String>,
}

impl PathInfo {
    /// Create a new path record.
    #[must_use]
    pub const fn new(name_hash: String, size: Option<u64>, mtime: i64, hash: Option<String>) -> Self {
        Self {
            name_hash,
            size,
            mtime,
            hash,
        }
    }

    /// Returns `true` if this record marks a deletion.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.size.is_none()
    }
}

// ---------------------------------------------------------------------------
// ChangeSet
// ---------------------------------------------------------------------------

/// Relative path → original path and new info, for detected moves.
pub type Moves = BTreeMap<String, (String, PathInfo)>;

/// The delta between two snapshots, keyed by relative path.
///
/// Maps are ordered so that every consumer (including move detection) sees
/// paths in the same sequence on every run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Paths present only in the newer snapshot.
    pub additions: BTreeMap<String, PathInfo>,
    /// Paths present only in the older snapshot, with their last known info.
    pub deletions: BTreeMap<String, PathInfo>,
    /// Paths present in both snapshots with different content.
    pub modifications: BTreeMap<String, PathInfo>,
    /// New path → (original path, info), filled by move detection.
    pub moves: Moves,
}

impl ChangeSet {
    /// Returns `true` if anything changed between the two snapshots.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        !(self.additions.is_empty()
            && self.deletions.is_empty()
            && self.modifications.is_empty()
            && self.moves.is_empty())
    }
}

// ---------------------------------------------------------------------------
// BranchInfo
// ---------------------------------------------------------------------------

/// One line of development.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    /// Branch number, also used for the `b<number>` folder.
    pub number: u32,
    /// Creation time in milliseconds since the epoch.
    pub ctime: i64,
    /// Optional human-readable name.
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the branch is in sync with its parent.
    #[serde(default)]
    pub in_sync: bool,
    /// Tracked file patterns.
    #[serde(default)]
    pub tracked: Vec<String>,
    /// Explicitly untracked file patterns.
    #[serde(default)]
    pub untracked: Vec<String>,
    /// Branch this one was created from.
    #[serde(default)]
    pub parent: Option<u32>,
    /// Revision of the parent this branch started at.
    #[serde(default)]
    pub revision: Option<u32>,
}

impl BranchInfo {
    /// A fresh, unnamed branch with no parent.
    #[must_use]
    pub const fn new(number: u32, ctime: i64) -> Self {
        Self {
            number,
            ctime,
            name: None,
            in_sync: false,
            tracked: Vec::new(),
            untracked: Vec::new(),
            parent: None,
            revision: None,
        }
    }

    /// Storage folder of this branch below the repository `root`.
    #[must_use]
    pub fn folder(&self, root: &Path) -> PathBuf {
        layout::branch_folder(root, self.number, None)
    }

    /// Storage folder of one of this branch's revisions.
    #[must_use]
    pub fn revision_folder(&self, root: &Path, revision: u32) -> PathBuf {
        layout::revision_folder(root, self.number, revision, None)
    }
}
