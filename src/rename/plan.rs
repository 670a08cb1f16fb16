//! Batch rename planning.
//!
//! Turns a source/target pattern pair and a list of matching filenames into
//! concrete `(old, new)` pairs, ordered so that no rename overwrites a file
//! that is still waiting to be renamed itself.

use std::collections::BTreeSet;

use tracing::{info, warn};

use super::glob::{GlobBlock, GlobError, match_filename, synthesize, tokenize_pair};

/// A planned rename: `(source, target)`.
pub type RenamePair = (String, String);

/// Translate each filename from `old` to `new`.
///
/// # Errors
/// The first [`GlobError`] raised by matching or synthesis.
pub fn convert_filenames<S: AsRef<str>>(
    filenames: &[S],
    old: &[GlobBlock],
    new: &[GlobBlock],
) -> Result<Vec<RenamePair>, GlobError> {
    filenames
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let matched = match_filename(name, old)?;
            Ok((name.to_owned(), synthesize(new, &matched)?))
        })
        .collect()
}

fn duplicate_target(pairs: &[RenamePair]) -> Option<&str> {
    let mut seen = BTreeSet::new();
    pairs
        .iter()
        .map(|(_, target)| target.as_str())
        .find(|target| !seen.insert(*target))
}

fn first_conflict(pairs: &[RenamePair]) -> Option<usize> {
    (1..pairs.len()).find(|&i| pairs[..i].iter().any(|(_, target)| *target == pairs[i].0))
}

/// Order renames so that no source appears among earlier targets.
///
/// Each pass moves a conflicting pair to just before the earliest pair that
/// targets its source; passes repeat until one makes no move. Cyclic plans
/// never settle and are cut off after `n * n` passes.
///
/// # Errors
/// [`GlobError::UnresolvableOrder`] if a conflict remains and
/// `exit_on_conflict` is set. Otherwise the remaining conflict is logged
/// and the best ordering found is returned.
pub fn reorder_renames(
    mut pairs: Vec<RenamePair>,
    exit_on_conflict: bool,
) -> Result<Vec<RenamePair>, GlobError> {
    let max_passes = pairs.len().saturating_mul(pairs.len());
    for _ in 0..max_passes {
        let mut clean = true;
        for i in 1..pairs.len() {
            let source = &pairs[i].0;
            if let Some(index) = pairs[..i].iter().position(|(_, target)| target == source) {
                let pair = pairs.remove(i);
                pairs.insert(index, pair);
                clean = false;
            }
        }
        if clean {
            break;
        }
    }

    if let Some(i) = first_conflict(&pairs) {
        let source = pairs[i].0.clone();
        if exit_on_conflict {
            return Err(GlobError::UnresolvableOrder { filename: source });
        }
        warn!(%source, "rename would overwrite a not-yet renamed file");
    }
    Ok(pairs)
}

/// Plan renaming `filenames` from pattern `old` to pattern `new`.
///
/// # Errors
/// Pattern errors, [`GlobError::DuplicateTarget`] if two files map to the
/// same name, and reorder errors as in [`reorder_renames`].
pub fn plan_renames<S: AsRef<str>>(
    filenames: &[S],
    old: &str,
    new: &str,
    exit_on_conflict: bool,
) -> Result<Vec<RenamePair>, GlobError> {
    let (old_tokens, new_tokens) = tokenize_pair(old, new)?;
    let pairs = convert_filenames(filenames, &old_tokens, &new_tokens)?;

    if let Some(target) = duplicate_target(&pairs) {
        return Err(GlobError::DuplicateTarget {
            target: target.to_owned(),
        });
    }

    let ordered = reorder_renames(pairs, exit_on_conflict)?;
    info!(count = ordered.len(), %old, %new, "planned renames");
    Ok(ordered)
}
