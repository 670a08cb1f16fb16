//! Property tests for the merge engine.
//!
//! - Repeated merges of the same inputs produce identical bytes.
//! - Merging a text with itself returns it unchanged under every
//!   non-interactive policy (and under `Ask`, which never prompts).
//! - Diff blocks cover every line of both inputs exactly once.

#![allow(clippy::all, clippy::pedantic, clippy::nursery)]

use proptest::prelude::*;

use super::lines::{MergeOptions, diff_lines, merge};
use super::prompt::NonInteractive;
use crate::model::{MergeBlockKind, MergePolicy};
use crate::text::{TextSource, load_text};

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Small alphabet so that random texts share lines often.
fn arb_line() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "x", "  b", "b\t", "", "long line"])
        .prop_map(str::to_owned)
}

fn arb_text() -> impl Strategy<Value = Vec<u8>> {
    (prop::collection::vec(arb_line(), 0..12), prop::bool::ANY).prop_map(|(lines, crlf)| {
        lines.join(if crlf { "\r\n" } else { "\n" }).into_bytes()
    })
}

fn arb_policy() -> impl Strategy<Value = MergePolicy> {
    prop::sample::select(vec![
        MergePolicy::Insert,
        MergePolicy::Remove,
        MergePolicy::Both,
    ])
}

fn run(other: &[u8], current: &[u8], options: &MergeOptions) -> Vec<u8> {
    merge(
        TextSource::Bytes(other),
        TextSource::Bytes(current),
        options,
        &mut NonInteractive,
    )
    .expect("non-interactive merge must succeed")
    .into_content()
    .expect("not diff-only")
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn merge_is_deterministic(
        other in arb_text(),
        current in arb_text(),
        policy in arb_policy(),
        char_policy in arb_policy(),
        ignore_whitespace in prop::bool::ANY,
    ) {
        let options = MergeOptions {
            policy,
            char_policy,
            ignore_whitespace,
            ..MergeOptions::default()
        };
        let first = run(&other, &current, &options);
        let second = run(&other, &current, &options);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn self_merge_is_identity(text in arb_text(), policy in arb_policy()) {
        let options = MergeOptions {
            policy,
            char_policy: policy,
            ..MergeOptions::default()
        };
        prop_assert_eq!(run(&text, &text, &options), text.clone());

        let ask = MergeOptions {
            policy: MergePolicy::Ask,
            char_policy: MergePolicy::Ask,
            ..MergeOptions::default()
        };
        prop_assert_eq!(run(&text, &text, &ask), text);
    }

    #[test]
    fn blocks_cover_both_inputs(other in arb_text(), current in arb_text()) {
        let theirs = load_text(&other);
        let mine = load_text(&current);
        let blocks = diff_lines(&theirs, &mine, false);

        let mut rebuilt_current = Vec::new();
        let mut rebuilt_other = Vec::new();
        for block in &blocks {
            match block.kind {
                MergeBlockKind::Keep | MergeBlockKind::Move => {
                    rebuilt_current.extend(block.lines.iter().cloned());
                    rebuilt_other.extend(block.lines.iter().cloned());
                }
                MergeBlockKind::Insert => rebuilt_current.extend(block.lines.iter().cloned()),
                MergeBlockKind::Remove => rebuilt_other.extend(block.lines.iter().cloned()),
                MergeBlockKind::Replace => {
                    rebuilt_current.extend(block.lines.iter().cloned());
                    rebuilt_other.extend(block.replaced_lines().iter().cloned());
                }
            }
        }
        prop_assert_eq!(rebuilt_current, mine.lines);
        prop_assert_eq!(rebuilt_other, theirs.lines);
    }
}
