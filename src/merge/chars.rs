//! Character-level merge of two single lines.

use super::MergeError;
use super::blocks::{diff_blocks, replay, resolve_replace};
use super::prompt::{CharContext, Conflict, ConflictPrompt, Granularity};
use crate::model::{MergeBlock, MergeBlockKind, MergePolicy, Range};

/// Character blocks turning `other` into `current`.
///
/// Each block holds its span as one joined string; `line` is the
/// character position in `current`.
#[must_use]
pub fn char_blocks(other: &str, current: &str) -> Vec<MergeBlock> {
    let other_chars: Vec<char> = other.chars().collect();
    let current_chars: Vec<char> = current.chars().collect();
    let other_items: Vec<String> = other_chars.iter().map(char::to_string).collect();
    let current_items: Vec<String> = current_chars.iter().map(char::to_string).collect();
    diff_blocks(&other_chars, &current_chars, &other_items, &current_items)
        .into_iter()
        .map(join_block)
        .collect()
}

fn join_block(mut block: MergeBlock) -> MergeBlock {
    block.lines = vec![block.lines.concat()];
    if let Some(replaced) = block.replaces.as_mut() {
        replaced.lines = vec![replaced.lines.concat()];
    }
    block
}

/// Character positions in `current` that are new relative to `other`.
#[must_use]
pub fn changed_positions(other: &str, current: &str) -> Range {
    let mut indexes = Vec::new();
    for block in char_blocks(other, current) {
        if matches!(block.kind, MergeBlockKind::Insert | MergeBlockKind::Replace) {
            let len = block.lines.iter().map(|s| s.chars().count()).sum::<usize>();
            indexes.extend(block.line..block.line + len);
        }
    }
    Range {
        kind: MergeBlockKind::Replace,
        indexes,
    }
}

/// Merge line `other` into line `current` character by character.
///
/// # Errors
/// Only the `Ask` policy can fail, with the prompt's error.
pub fn merge_chars(
    other: &str,
    current: &str,
    policy: MergePolicy,
    prompt: &mut dyn ConflictPrompt,
) -> Result<String, MergeError> {
    let blocks = char_blocks(other, current);
    let mut out = Vec::with_capacity(blocks.len());
    replay(&blocks, policy, &mut out, |block, out| {
        if resolve_replace(policy, block, out) {
            return Ok(());
        }
        let conflict = Conflict {
            granularity: Granularity::Character,
            theirs: block.replaced_lines(),
            mine: &block.lines,
            context: Some(CharContext {
                other,
                current,
                column: block.line,
            }),
        };
        prompt.resolve(&conflict)?.apply(&conflict, out);
        Ok(())
    })?;
    Ok(out.concat())
}
