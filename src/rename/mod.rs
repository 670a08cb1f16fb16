//! File move detection and glob-based batch rename planning.

pub mod detect;
pub mod glob;
pub mod plan;

pub use detect::{apply_moves, detect_moves};
pub use glob::{GlobBlock, GlobBlock2, GlobError, match_filename, synthesize, tokenize, tokenize_pair};
pub use plan::{RenamePair, convert_filenames, plan_renames, reorder_renames};
