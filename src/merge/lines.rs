//! Line-level diff and merge of two texts.

use tracing::{debug, warn};

use super::MergeError;
use super::blocks::{diff_blocks, replay, resolve_replace};
use super::chars::{changed_positions, merge_chars};
use super::prompt::{Conflict, ConflictPrompt, Granularity};
use crate::model::{MergeBlock, MergePolicy};
use crate::text::{Eol, LoadedText, TextSource};

/// Knobs for [`merge`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Policy for line blocks.
    pub policy: MergePolicy,
    /// Policy for character spans inside single-line replacements.
    pub char_policy: MergePolicy,
    /// Return the blocks instead of merged content.
    pub diff_only: bool,
    /// Join output with the other side's EOL style.
    pub use_other_eol: bool,
    /// Compare lines with normalized whitespace.
    pub ignore_whitespace: bool,
}

/// What [`merge`] produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Merged content, encoded like the current side.
    Merged {
        /// Output bytes.
        content: Vec<u8>,
        /// EOL style chosen for output, `None` if neither side had one.
        eol: Option<Eol>,
    },
    /// Diff-only result.
    Blocks {
        /// The classified blocks.
        blocks: Vec<MergeBlock>,
        /// EOL style that a merge would have used.
        eol: Option<Eol>,
    },
}

impl MergeOutcome {
    /// The chosen EOL style.
    #[must_use]
    pub const fn eol(&self) -> Option<Eol> {
        match self {
            Self::Merged { eol, .. } | Self::Blocks { eol, .. } => *eol,
        }
    }

    /// The merged bytes, unless this is a diff-only result.
    #[must_use]
    pub fn into_content(self) -> Option<Vec<u8>> {
        match self {
            Self::Merged { content, .. } => Some(content),
            Self::Blocks { .. } => None,
        }
    }

    /// The blocks of a diff-only result.
    #[must_use]
    pub fn into_blocks(self) -> Option<Vec<MergeBlock>> {
        match self {
            Self::Merged { .. } => None,
            Self::Blocks { blocks, .. } => Some(blocks),
        }
    }
}

/// Line blocks turning `other` into `current`.
///
/// Single-line replacements carry the changed character positions of the
/// current line in [`MergeBlock::changes`].
#[must_use]
pub fn diff_lines(other: &LoadedText, current: &LoadedText, ignore_whitespace: bool) -> Vec<MergeBlock> {
    let mut blocks = diff_blocks(
        &other.comparison_keys(ignore_whitespace),
        &current.comparison_keys(ignore_whitespace),
        &other.lines,
        &current.lines,
    );
    for block in &mut blocks {
        if block.is_one_line_replace() {
            block.changes = Some(changed_positions(&block.replaced_lines()[0], &block.lines[0]));
        }
    }
    blocks
}

/// Replay line blocks into merged lines.
///
/// # Errors
/// Fails only if a conflict under `Ask` cannot be resolved by `prompt`.
pub fn merge_blocks(
    blocks: &[MergeBlock],
    policy: MergePolicy,
    char_policy: MergePolicy,
    prompt: &mut dyn ConflictPrompt,
) -> Result<Vec<String>, MergeError> {
    let mut out = Vec::new();
    replay(blocks, policy, &mut out, |block, out| {
        if block.is_one_line_replace() {
            let line = merge_chars(&block.replaced_lines()[0], &block.lines[0], char_policy, prompt)?;
            out.push(line);
            return Ok(());
        }
        if resolve_replace(policy, block, out) {
            return Ok(());
        }
        let conflict = Conflict {
            granularity: Granularity::Line,
            theirs: block.replaced_lines(),
            mine: &block.lines,
            context: None,
        };
        prompt.resolve(&conflict)?.apply(&conflict, out);
        Ok(())
    })?;
    Ok(out)
}

/// EOL style for merge output.
#[must_use]
pub const fn output_eol(other: Option<Eol>, current: Option<Eol>, use_other_eol: bool) -> Option<Eol> {
    if use_other_eol {
        other
    } else if current.is_some() {
        current
    } else {
        other
    }
}

/// Merge `other` into `current`.
///
/// Loads both sides, aligns them line by line and either returns the blocks
/// (`diff_only`) or the merged content joined with the chosen EOL style and
/// encoded like the current side.
///
/// # Errors
/// [`MergeError::Load`] if either side cannot be read; prompt errors under
/// the `Ask` policies.
#[tracing::instrument(level = "debug", skip_all, fields(other = %other, current = %current))]
pub fn merge(
    other: TextSource<'_>,
    current: TextSource<'_>,
    options: &MergeOptions,
    prompt: &mut dyn ConflictPrompt,
) -> Result<MergeOutcome, MergeError> {
    let load_error = |source| MergeError::Load {
        other: other.to_string(),
        current: current.to_string(),
        source,
    };
    let theirs = other.load().map_err(load_error)?;
    let mine = current.load().map_err(load_error)?;

    if let (Some(a), Some(b)) = (theirs.eol, mine.eol)
        && a != b
    {
        warn!(
            other = %a,
            current = %b,
            "differing EOL styles detected during merge; using current file's style for output"
        );
    }

    let blocks = diff_lines(&theirs, &mine, options.ignore_whitespace);
    let eol = output_eol(theirs.eol, mine.eol, options.use_other_eol);
    debug!(blocks = blocks.len(), "diff blocks computed");
    if options.diff_only {
        return Ok(MergeOutcome::Blocks { blocks, eol });
    }

    let lines = merge_blocks(&blocks, options.policy, options.char_policy, prompt)?;
    let text = lines.join(eol.unwrap_or(Eol::Lf).as_str());
    let content = mine.encoding.encode(&text);
    debug!(lines = lines.len(), bytes = content.len(), "merge output");
    Ok(MergeOutcome::Merged { content, eol })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::prompt::{NonInteractive, Resolution, Scripted};
    use crate::model::{MergeBlockKind, Range};

    fn run(other: &[u8], current: &[u8], options: &MergeOptions) -> MergeOutcome {
        merge(
            TextSource::Bytes(other),
            TextSource::Bytes(current),
            options,
            &mut NonInteractive,
        )
        .unwrap()
    }

    fn merged(other: &[u8], current: &[u8], policy: MergePolicy) -> String {
        let options = MergeOptions {
            policy,
            ..MergeOptions::default()
        };
        let content = run(other, current, &options).into_content().unwrap();
        String::from_utf8(content).unwrap()
    }

    #[test]
    fn single_line_change_is_one_replace_block() {
        let options = MergeOptions {
            diff_only: true,
            ..MergeOptions::default()
        };
        let outcome = run(b"a\nb\nc", b"a\nx\nc", &options);
        assert_eq!(outcome.eol(), Some(Eol::Lf));
        let blocks = outcome.into_blocks().unwrap();
        let replaces: Vec<_> = blocks
            .iter()
            .filter(|b| b.kind == MergeBlockKind::Replace)
            .collect();
        assert_eq!(replaces.len(), 1);
        assert_eq!(replaces[0].line, 1);
        assert_eq!(replaces[0].lines, vec!["x".to_owned()]);
        assert_eq!(replaces[0].replaced_lines(), ["b".to_owned()].as_slice());
        assert_eq!(
            replaces[0].changes,
            Some(Range {
                kind: MergeBlockKind::Replace,
                indexes: vec![0],
            })
        );
    }

    #[test]
    fn single_line_change_under_both_keeps_current() {
        assert_eq!(merged(b"a\nb\nc", b"a\nx\nc", MergePolicy::Both), "a\nx\nc");
    }

    #[test]
    fn self_merge_is_identity() {
        let text = b"one\r\ntwo\r\n\r\nfour";
        for policy in [
            MergePolicy::Insert,
            MergePolicy::Remove,
            MergePolicy::Both,
            MergePolicy::Ask,
        ] {
            let out = run(text, text, &MergeOptions { policy, ..MergeOptions::default() });
            assert_eq!(out.into_content().unwrap(), text.to_vec());
        }
    }

    #[test]
    fn multi_line_replace_follows_policy() {
        let other = b"a\nb1\nb2\nc";
        let current = b"a\nx1\nx2\nc";
        assert_eq!(merged(other, current, MergePolicy::Both), "a\nx1\nx2\nc");
        assert_eq!(merged(other, current, MergePolicy::Insert), "a\nb1\nb2\nx1\nx2\nc");
        assert_eq!(merged(other, current, MergePolicy::Remove), "a\nc");
    }

    #[test]
    fn ask_prompts_for_multi_line_replace() {
        let options = MergeOptions {
            policy: MergePolicy::Ask,
            ..MergeOptions::default()
        };
        let mut prompt = Scripted::new([Resolution::User(vec!["mine".to_owned()])]);
        let content = merge(
            TextSource::Bytes(b"a\nb1\nb2\nc"),
            TextSource::Bytes(b"a\nx1\nx2\nc"),
            &options,
            &mut prompt,
        )
        .unwrap()
        .into_content()
        .unwrap();
        assert_eq!(content, b"a\nmine\nc");
        assert_eq!(prompt.seen[0].0, Granularity::Line);
        assert_eq!(prompt.seen[0].1, vec!["b1".to_owned(), "b2".to_owned()]);
    }

    #[test]
    fn ask_without_prompt_aborts() {
        let options = MergeOptions {
            policy: MergePolicy::Ask,
            ..MergeOptions::default()
        };
        let err = merge(
            TextSource::Bytes(b"a\nb1\nb2"),
            TextSource::Bytes(b"a\nx1\nx2"),
            &options,
            &mut NonInteractive,
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::PromptUnavailable));
    }

    #[test]
    fn output_uses_current_eol_unless_asked() {
        let other = b"a\r\nb";
        let current = b"a\nb";
        let default = run(other, current, &MergeOptions::default());
        assert_eq!(default.eol(), Some(Eol::Lf));
        let theirs = run(
            other,
            current,
            &MergeOptions {
                use_other_eol: true,
                ..MergeOptions::default()
            },
        );
        assert_eq!(theirs.eol(), Some(Eol::CrLf));
        assert_eq!(theirs.into_content().unwrap(), b"a\r\nb");
    }

    #[test]
    fn output_eol_falls_back_to_other() {
        assert_eq!(output_eol(Some(Eol::Cr), None, false), Some(Eol::Cr));
        assert_eq!(output_eol(None, Some(Eol::Lf), true), None);
        assert_eq!(output_eol(Some(Eol::Cr), Some(Eol::Lf), false), Some(Eol::Lf));
    }

    #[test]
    fn whitespace_insensitive_keeps_current_text() {
        let options = MergeOptions {
            ignore_whitespace: true,
            ..MergeOptions::default()
        };
        let outcome = run(b"a\n  b\nc", b"a\n\tb \nc", &options);
        assert_eq!(outcome.into_content().unwrap(), b"a\n\tb \nc");

        let strict = run(
            b"a\n  b\nc",
            b"a\n\tb \nc",
            &MergeOptions {
                diff_only: true,
                ..MergeOptions::default()
            },
        );
        assert!(
            strict
                .into_blocks()
                .unwrap()
                .iter()
                .any(|b| b.kind == MergeBlockKind::Replace)
        );
    }

    #[test]
    fn output_keeps_current_encoding() {
        let current = b"caf\xE9 cr\xE8me\nend";
        let content = run(current, current, &MergeOptions::default())
            .into_content()
            .unwrap();
        assert_eq!(content, current.to_vec());
    }

    #[test]
    fn unreadable_side_aborts_with_load_error() {
        let err = merge(
            TextSource::Path(std::path::Path::new("/nonexistent/other.txt")),
            TextSource::Bytes(b"x"),
            &MergeOptions::default(),
            &mut NonInteractive,
        )
        .unwrap_err();
        assert!(matches!(err, MergeError::Load { .. }));
        assert!(err.to_string().contains("other.txt"));
    }
}
