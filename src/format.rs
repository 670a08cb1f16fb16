//! Output formats and the textual diff listing.

use std::str::FromStr;

use anyhow::{Result, bail};
use serde::Serialize;

use crate::model::{MergeBlock, MergeBlockKind};
use crate::text::Eol;

/// Output format for structured data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text listing
    #[default]
    Text,
    /// JSON - machine-parseable
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => bail!("Invalid format '{s}'. Use: text or json"),
        }
    }
}

impl OutputFormat {
    /// Serialize data to the requested format
    pub fn serialize<T: Serialize>(self, data: &T) -> Result<String> {
        match self {
            Self::Json => serde_json::to_string_pretty(data)
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}")),
            Self::Text => bail!("Text format should not use serialize()"),
        }
    }
}

// ---------------------------------------------------------------------------
// Diff listing
// ---------------------------------------------------------------------------

/// Number of decimal digits needed to print `number` (at least 1).
#[must_use]
pub const fn required_decimal_digits(number: usize) -> usize {
    if number == 0 {
        1
    } else {
        number.ilog10() as usize + 1
    }
}

/// Display name of an EOL style; `None` means the text has no line break.
#[must_use]
pub const fn eol_name(eol: Option<Eol>) -> &'static str {
    match eol {
        None => "<No newline>",
        Some(Eol::Lf) => "<LF>",
        Some(Eol::Cr) => "<CR>",
        Some(Eol::CrLf) => "<CR+LF>",
    }
}

/// Header line for one file's diff listing.
///
/// A diff consisting of a single kept block differs only in timestamp or
/// line endings, which the header points out.
#[must_use]
pub fn render_header(path: &str, blocks: &[MergeBlock], eol: Option<Eol>) -> String {
    let unchanged = matches!(blocks, [only] if only.kind == MergeBlockKind::Keep);
    let hint = if unchanged { " <timestamp or newline>" } else { "" };
    format!("DIF {path}{hint}  {}", eol_name(eol))
}

/// Highest line number the listing prints for `block`, if it is shown.
fn last_line_number(block: &MergeBlock) -> Option<usize> {
    let last = |start: usize, count: usize| (start + count).checked_sub(1);
    match block.kind {
        MergeBlockKind::Keep | MergeBlockKind::Move => None,
        MergeBlockKind::Insert | MergeBlockKind::Remove => last(block.line, block.lines.len()),
        MergeBlockKind::Replace => {
            let start = block.replaces.as_deref().map_or(block.line, |r| r.line);
            last(start, block.replaced_lines().len()).max(last(block.line, block.lines.len()))
        }
    }
}

fn numbered<'a>(
    prefix: &'a str,
    start: usize,
    lines: &'a [String],
) -> impl Iterator<Item = (&'a str, usize, &'a str)> + 'a {
    lines
        .iter()
        .enumerate()
        .map(move |(no, line)| (prefix, start + no, line.as_str()))
}

/// Render blocks as a diff listing.
///
/// Lines only in the current side are prefixed `---`, lines only in the
/// other side `+++`; replacements list the replaced lines with `- |` and the
/// replacing lines with `+ |`. Kept blocks are not shown. Each shown block
/// is followed by an empty line. With `max_width`, lines are cut to that
/// many characters.
#[must_use]
pub fn render_blocks(blocks: &[MergeBlock], max_width: Option<usize>) -> String {
    let digits = required_decimal_digits(blocks.iter().filter_map(last_line_number).max().unwrap_or(0));
    let mut out = String::new();
    for block in blocks {
        let rows: Vec<(&str, usize, &str)> = match block.kind {
            MergeBlockKind::Keep | MergeBlockKind::Move => continue,
            MergeBlockKind::Insert => numbered("---", block.line, &block.lines).collect(),
            MergeBlockKind::Remove => numbered("+++", block.line, &block.lines).collect(),
            MergeBlockKind::Replace => {
                let start = block.replaces.as_deref().map_or(block.line, |r| r.line);
                numbered("- |", start, block.replaced_lines())
                    .chain(numbered("+ |", block.line, &block.lines))
                    .collect()
            }
        };
        for (prefix, number, line) in rows {
            let row = format!("{prefix} {number:0digits$} |{line}|");
            match max_width {
                Some(width) => out.extend(row.chars().take(width)),
                None => out.push_str(&row),
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
