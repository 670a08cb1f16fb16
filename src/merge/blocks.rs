//! Folding diff operations into classified blocks, and replaying blocks
//! under a merge policy.
//!
//! Line and character merges share this code: both align two sequences
//! with Myers' algorithm, fold runs of the same tag into one block, and fuse
//! an adjacent remove/insert pair into a single replacement.

use std::hash::Hash;

use similar::{Algorithm, DiffTag};

use super::MergeError;
use crate::model::{MergeBlock, MergeBlockKind, MergePolicy};

/// Which input an aligned run belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    /// Present in both.
    Both,
    /// Only in the other side.
    Other,
    /// Only in the current side.
    Current,
}

#[derive(Debug)]
struct Pending {
    side: Side,
    line: usize,
    items: Vec<String>,
}

/// Accumulates tagged runs into [`MergeBlock`]s.
#[derive(Debug, Default)]
struct BlockBuilder {
    blocks: Vec<MergeBlock>,
    pending: Option<Pending>,
}

impl BlockBuilder {
    /// Append items tagged `side` starting at `line` of the current text.
    fn push<'a>(&mut self, side: Side, line: usize, items: impl IntoIterator<Item = &'a String>) {
        match &mut self.pending {
            Some(pending) if pending.side == side => pending.items.extend(items.into_iter().cloned()),
            _ => {
                self.close();
                self.pending = Some(Pending {
                    side,
                    line,
                    items: items.into_iter().cloned().collect(),
                });
            }
        }
    }

    fn close(&mut self) {
        let Some(Pending { side, line, items }) = self.pending.take() else {
            return;
        };
        if items.is_empty() {
            return;
        }
        match side {
            Side::Both => self
                .blocks
                .push(MergeBlock::new(MergeBlockKind::Keep, items, line)),
            Side::Other => self.close_change(MergeBlock::new(MergeBlockKind::Remove, items, line)),
            Side::Current => self.close_change(MergeBlock::new(MergeBlockKind::Insert, items, line)),
        }
    }

    /// Push a pure change, fusing it with an opposite neighbour into a
    /// `Replace` anchored at the current side's position.
    fn close_change(&mut self, block: MergeBlock) {
        let opposite = match block.kind {
            MergeBlockKind::Insert => MergeBlockKind::Remove,
            _ => MergeBlockKind::Insert,
        };
        let previous = match self.blocks.last() {
            Some(prev) if prev.kind == opposite => self.blocks.pop(),
            _ => None,
        };
        let Some(previous) = previous else {
            self.blocks.push(block);
            return;
        };
        let (current, other) = if block.kind == MergeBlockKind::Insert {
            (block, previous)
        } else {
            (previous, block)
        };
        self.blocks
            .push(MergeBlock::replace(current.lines, current.line, other));
    }

    fn finish(mut self) -> Vec<MergeBlock> {
        self.close();
        self.blocks
    }
}

/// Align `other_keys` with `current_keys` and classify the result.
///
/// Keys decide equality; block content is taken from `other` and `current`,
/// which must be index-parallel to their keys. Kept runs carry the current
/// side's items.
pub(crate) fn diff_blocks<K: Hash + Eq + Ord>(
    other_keys: &[K],
    current_keys: &[K],
    other: &[String],
    current: &[String],
) -> Vec<MergeBlock> {
    let mut builder = BlockBuilder::default();
    for op in similar::capture_diff_slices(Algorithm::Myers, other_keys, current_keys) {
        let (tag, old, new) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => builder.push(Side::Both, new.start, &current[new]),
            DiffTag::Delete => builder.push(Side::Other, new.start, &other[old]),
            DiffTag::Insert => builder.push(Side::Current, new.start, &current[new]),
            DiffTag::Replace => {
                builder.push(Side::Other, new.start, &other[old]);
                builder.push(Side::Current, new.start, &current[new]);
            }
        }
    }
    builder.finish()
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Replay `blocks` under `policy`, delegating `Replace` blocks to `replace`.
pub(crate) fn replay<F>(
    blocks: &[MergeBlock],
    policy: MergePolicy,
    out: &mut Vec<String>,
    mut replace: F,
) -> Result<(), MergeError>
where
    F: FnMut(&MergeBlock, &mut Vec<String>) -> Result<(), MergeError>,
{
    for block in blocks {
        match block.kind {
            MergeBlockKind::Keep | MergeBlockKind::Move => out.extend_from_slice(&block.lines),
            MergeBlockKind::Insert => {
                if policy.keeps_current_only() {
                    out.extend_from_slice(&block.lines);
                }
            }
            MergeBlockKind::Remove => {
                if policy.keeps_other_only() {
                    out.extend_from_slice(&block.lines);
                }
            }
            MergeBlockKind::Replace => replace(block, out)?,
        }
    }
    Ok(())
}

/// Resolve a replacement without asking. Returns `false` for `Ask`.
pub(crate) fn resolve_replace(
    policy: MergePolicy,
    block: &MergeBlock,
    out: &mut Vec<String>,
) -> bool {
    match policy {
        MergePolicy::Remove => {}
        MergePolicy::Both => out.extend_from_slice(&block.lines),
        MergePolicy::Insert => {
            out.extend_from_slice(block.replaced_lines());
            out.extend_from_slice(&block.lines);
        }
        MergePolicy::Ask => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    fn blocks(other: &[&str], current: &[&str]) -> Vec<MergeBlock> {
        let other = strings(other);
        let current = strings(current);
        diff_blocks(&other, &current, &other, &current)
    }

    fn kinds(blocks: &[MergeBlock]) -> Vec<MergeBlockKind> {
        blocks.iter().map(|b| b.kind).collect()
    }

    #[test]
    fn identical_input_is_one_keep_block() {
        let result = blocks(&["a", "b"], &["a", "b"]);
        assert_eq!(result, vec![MergeBlock::new(MergeBlockKind::Keep, strings(&["a", "b"]), 0)]);
    }

    #[test]
    fn empty_inputs_have_no_blocks() {
        assert!(blocks(&[], &[]).is_empty());
    }

    #[test]
    fn changed_line_fuses_into_replace() {
        let result = blocks(&["a", "b", "c"], &["a", "x", "c"]);
        assert_eq!(
            kinds(&result),
            vec![MergeBlockKind::Keep, MergeBlockKind::Replace, MergeBlockKind::Keep]
        );
        let replace = &result[1];
        assert_eq!(replace.line, 1);
        assert_eq!(replace.lines, strings(&["x"]));
        assert_eq!(replace.replaced_lines(), strings(&["b"]).as_slice());
        assert_eq!(replace.replaces.as_ref().map(|b| b.line), Some(1));
        assert_eq!(result[2].line, 2);
    }

    #[test]
    fn pure_insert_and_remove_keep_their_kind() {
        let inserted = blocks(&["a", "c"], &["a", "b", "c"]);
        assert_eq!(
            kinds(&inserted),
            vec![MergeBlockKind::Keep, MergeBlockKind::Insert, MergeBlockKind::Keep]
        );
        assert_eq!(inserted[1].line, 1);

        let removed = blocks(&["a", "b", "c"], &["a", "c"]);
        assert_eq!(
            kinds(&removed),
            vec![MergeBlockKind::Keep, MergeBlockKind::Remove, MergeBlockKind::Keep]
        );
        assert_eq!(removed[1].line, 1);
        assert_eq!(removed[2].line, 1);
    }

    #[test]
    fn every_line_is_covered_once() {
        let other = ["a", "b", "c", "d", "e"];
        let current = ["a", "x", "c", "e", "f"];
        let result = blocks(&other, &current);
        let current_count: usize = result
            .iter()
            .filter(|b| b.kind != MergeBlockKind::Remove)
            .map(|b| b.lines.len())
            .sum();
        let other_count: usize = result
            .iter()
            .map(|b| match b.kind {
                MergeBlockKind::Insert => 0,
                MergeBlockKind::Replace => b.replaced_lines().len(),
                _ => b.lines.len(),
            })
            .sum();
        assert_eq!(current_count, current.len());
        assert_eq!(other_count, other.len());
    }

    #[test]
    fn replay_applies_policy_to_pure_blocks() {
        let result = blocks(&["a", "gone", "c"], &["a", "c", "new"]);
        let merged = |policy| {
            let mut out = Vec::new();
            replay(&result, policy, &mut out, |_, _| Ok(())).unwrap();
            out
        };
        assert_eq!(merged(MergePolicy::Both), strings(&["a", "gone", "c"]));
        assert_eq!(merged(MergePolicy::Insert), strings(&["a", "gone", "c", "new"]));
        assert_eq!(merged(MergePolicy::Remove), strings(&["a", "c"]));
        assert_eq!(merged(MergePolicy::Ask), strings(&["a", "c", "new"]));
    }

    #[test]
    fn move_blocks_replay_like_keep() {
        let moved = vec![MergeBlock::new(MergeBlockKind::Move, strings(&["m"]), 0)];
        let mut out = Vec::new();
        replay(&moved, MergePolicy::Remove, &mut out, |_, _| Ok(())).unwrap();
        assert_eq!(out, strings(&["m"]));
    }

    #[test]
    fn resolve_replace_orders_other_before_current() {
        let block = MergeBlock::replace(
            strings(&["x1", "x2"]),
            0,
            MergeBlock::new(MergeBlockKind::Remove, strings(&["b1", "b2"]), 0),
        );
        let resolved = |policy| {
            let mut out = Vec::new();
            let handled = resolve_replace(policy, &block, &mut out);
            (handled, out)
        };
        assert_eq!(resolved(MergePolicy::Both), (true, strings(&["x1", "x2"])));
        assert_eq!(
            resolved(MergePolicy::Insert),
            (true, strings(&["b1", "b2", "x1", "x2"]))
        );
        assert_eq!(resolved(MergePolicy::Remove), (true, Vec::new()));
        assert_eq!(resolved(MergePolicy::Ask), (false, Vec::new()));
    }
}
