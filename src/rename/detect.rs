//! Move detection over a [`ChangeSet`].
//!
//! An addition is a move of a deletion when size, modification time and
//! content hash all agree. The first matching deletion (in path order) wins.
//! Matched deletions stay eligible: two additions with identical content
//! and timestamps both report the same source.

use tracing::debug;

use crate::model::{ChangeSet, Moves, PathInfo};

fn same_file(added: &PathInfo, deleted: &PathInfo) -> bool {
    !deleted.is_deleted()
        && added.size == deleted.size
        && added.mtime == deleted.mtime
        && added.hash == deleted.hash
}

/// New path → (old path, new info) for every addition that is a move.
///
/// Leaves `changes` untouched.
#[must_use]
pub fn detect_moves(changes: &ChangeSet) -> Moves {
    let mut moves = Moves::new();
    for (path, info) in &changes.additions {
        if let Some((old, _)) = changes
            .deletions
            .iter()
            .find(|(_, deleted)| same_file(info, deleted))
        {
            debug!(from = %old, to = %path, "detected move");
            moves.insert(path.clone(), (old.clone(), info.clone()));
        }
    }
    moves
}

/// Run [`detect_moves`] and record the result in `changes.moves`.
///
/// Additions and deletions are kept; returns the number of moves found.
pub fn apply_moves(changes: &mut ChangeSet) -> usize {
    let moves = detect_moves(changes);
    let found = moves.len();
    changes.moves.extend(moves);
    found
}
