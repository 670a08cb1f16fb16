//! Data model shared by the loader, differ, merger and rename planner.

pub mod block;
pub mod layout;
pub mod types;

pub use block::{MergeBlock, MergeBlockKind, MergePolicy, Range};
pub use types::{BranchInfo, ChangeSet, Moves, PathInfo};
