//! Classified diff blocks and merge policies.
//!
//! The differ folds aligned lines (or characters) into [`MergeBlock`]s. A
//! [`MergeBlockKind::Replace`] block owns the block it replaces by value, so
//! block lists are plain trees that can be cloned, compared and serialized.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// MergeBlockKind
// ---------------------------------------------------------------------------

/// Classification of one contiguous span of aligned text.
///
/// Direction follows diff markers: `Insert` spans exist only in the current
/// side, `Remove` spans exist only in the other side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeBlockKind {
    /// Identical in both sides.
    Keep,
    /// Only in the current side.
    Insert,
    /// Only in the other side.
    Remove,
    /// Current-side span replacing an other-side span.
    Replace,
    /// Span relocated unchanged.
    Move,
}

impl fmt::Display for MergeBlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => write!(f, "keep"),
            Self::Insert => write!(f, "insert"),
            Self::Remove => write!(f, "remove"),
            Self::Replace => write!(f, "replace"),
            Self::Move => write!(f, "move"),
        }
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// Highlighted positions inside a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// What happened at these positions.
    pub kind: MergeBlockKind,
    /// Affected character (or line) indexes.
    pub indexes: Vec<usize>,
}

// ---------------------------------------------------------------------------
// MergeBlock
// ---------------------------------------------------------------------------

/// One contiguous span of aligned text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeBlock {
    /// Block classification.
    pub kind: MergeBlockKind,
    /// Lines (or, for character merges, one joined string) of this block.
    pub lines: Vec<String>,
    /// Start index in the current (target) text.
    pub line: usize,
    /// For `Replace` blocks: the other-side span being replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<Box<MergeBlock>>,
    /// Intra-line detail for single-line replacements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Range>,
}

impl MergeBlock {
    /// A block without replacement or intra-line detail.
    #[must_use]
    pub const fn new(kind: MergeBlockKind, lines: Vec<String>, line: usize) -> Self {
        Self {
            kind,
            lines,
            line,
            replaces: None,
            changes: None,
        }
    }

    /// A `Replace` block: `lines` from the current side replace `replaced`.
    ///
    /// The replaced block is re-anchored to `line`, so both halves report
    /// the same start position.
    #[must_use]
    pub fn replace(lines: Vec<String>, line: usize, mut replaced: Self) -> Self {
        replaced.line = line;
        Self {
            kind: MergeBlockKind::Replace,
            lines,
            line,
            replaces: Some(Box::new(replaced)),
            changes: None,
        }
    }

    /// Lines of the replaced other-side span (empty unless `Replace`).
    #[must_use]
    pub fn replaced_lines(&self) -> &[String] {
        self.replaces.as_deref().map_or(&[], |b| b.lines.as_slice())
    }

    /// Returns `true` for single-line-for-single-line replacements.
    #[must_use]
    pub fn is_one_line_replace(&self) -> bool {
        self.kind == MergeBlockKind::Replace
            && self.lines.len() == 1
            && self.replaced_lines().len() == 1
    }
}

// ---------------------------------------------------------------------------
// MergePolicy
// ---------------------------------------------------------------------------

/// How conflicting spans are resolved when merging the other side into the
/// current one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Bring other-only spans into the current side, keep current-only spans.
    Insert,
    /// Drop current-only spans, do not bring in other-only spans.
    Remove,
    /// Both of the above.
    #[default]
    Both,
    /// Ask per conflicting span.
    Ask,
}

impl MergePolicy {
    const INSERT_BIT: u8 = 1;
    const REMOVE_BIT: u8 = 2;

    const fn bits(self) -> u8 {
        match self {
            Self::Insert => Self::INSERT_BIT,
            Self::Remove => Self::REMOVE_BIT,
            Self::Both => Self::INSERT_BIT | Self::REMOVE_BIT,
            Self::Ask => 4,
        }
    }

    /// Whether spans found only in the current side survive the merge.
    #[must_use]
    pub const fn keeps_current_only(self) -> bool {
        self.bits() & Self::REMOVE_BIT == 0
    }

    /// Whether spans found only in the other side are brought in.
    #[must_use]
    pub const fn keeps_other_only(self) -> bool {
        self.bits() & Self::INSERT_BIT != 0
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Remove => write!(f, "remove"),
            Self::Both => write!(f, "both"),
            Self::Ask => write!(f, "ask"),
        }
    }
}

/// Error returned when parsing an unknown merge policy name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid merge policy '{0}'. Use: insert, remove, both, or ask")]
pub struct ParsePolicyError(String);

impl FromStr for MergePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "insert" => Ok(Self::Insert),
            "remove" => Ok(Self::Remove),
            "both" => Ok(Self::Both),
            "ask" => Ok(Self::Ask),
            _ => Err(ParsePolicyError(s.to_owned())),
        }
    }
}
