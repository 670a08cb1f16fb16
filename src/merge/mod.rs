//! Two-way text merge engine.
//!
//! Aligns the other side of a merge with the current side, classifies the
//! alignment into [`MergeBlock`](crate::model::MergeBlock)s and replays them
//! under a [`MergePolicy`](crate::model::MergePolicy).
//!
//! - **lines**: whole-file diff and merge ([`merge`], [`diff_lines`]).
//! - **chars**: intra-line merge for single-line replacements.
//! - **blocks**: shared folding and policy replay.
//! - **prompt**: the conflict port used by the `Ask` policy.
//!
//! # Determinism
//!
//! For fixed inputs and policies the output is byte-identical across runs:
//! the differ is deterministic and no step depends on iteration order of
//! unordered collections.

mod blocks;
pub mod chars;
pub mod lines;
pub mod prompt;

pub use chars::{char_blocks, merge_chars};
pub use lines::{MergeOptions, MergeOutcome, diff_lines, merge, merge_blocks};
pub use prompt::{ConflictPrompt, ConsolePrompt, NonInteractive, Resolution};

use crate::text::LoadError;

#[cfg(all(test, feature = "proptests"))]
mod determinism_tests;

/// Errors that abort a merge.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// One side could not be loaded.
    #[error("cannot merge {other} into {current}: {source}")]
    Load {
        /// Display form of the other side.
        other: String,
        /// Display form of the current side.
        current: String,
        /// What went wrong.
        #[source]
        source: LoadError,
    },

    /// A conflict needs a decision but no interactive prompt is attached.
    #[error("merge conflict needs a decision, but no interactive prompt is available")]
    PromptUnavailable,

    /// Prompt input ended before a valid answer was given.
    #[error("prompt input closed before a choice was made")]
    PromptClosed,

    /// Reading from or writing to the prompt failed.
    #[error("prompt I/O failed: {0}")]
    PromptIo(#[from] std::io::Error),
}
