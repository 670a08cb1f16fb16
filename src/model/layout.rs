//! Revision storage layout.
//!
//! Stored snapshots live below the metadata folder of the repository root:
//!
//! ```text
//! <root>/.sos/b<branch>/r<revision>/<name-hash>
//! ```
//!
//! Only the folder naming is defined here; reading and writing the files is
//! up to the caller.

use std::path::{Path, PathBuf};

/// Metadata folder name at the repository root.
pub const META_FOLDER: &str = ".sos";

/// Folder of `branch`, optionally joined with a `file` inside it.
#[must_use]
pub fn branch_folder(root: &Path, branch: u32, file: Option<&str>) -> PathBuf {
    let folder = root.join(META_FOLDER).join(format!("b{branch}"));
    match file {
        Some(file) => folder.join(file),
        None => folder,
    }
}

/// Folder of `revision` on `branch`, optionally joined with a `file`.
#[must_use]
pub fn revision_folder(root: &Path, branch: u32, revision: u32, file: Option<&str>) -> PathBuf {
    let folder = branch_folder(root, branch, None).join(format!("r{revision}"));
    match file {
        Some(file) => folder.join(file),
        None => folder,
    }
}
