//! Glob pattern tokenizing, matching and re-synthesis for batch renames.
//!
//! A pattern is split into literal text and wildcard tokens. Matching a
//! filename against the old pattern binds each wildcard to the text it
//! covered; replaying the new pattern with those bindings yields the target
//! name. Positions and lengths are counted in characters, not bytes.
//!
//! Supported wildcards: `*`, runs of `?`, and negated classes `[!...]`.
//! `[?]`, `[*]`, `[[]` and `[]]` escape a single character.

use std::fmt;

/// Escaped single characters.
const ESCAPES: [&str; 4] = ["[?]", "[*]", "[[]", "[]]"];

/// Errors from pattern translation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GlobError {
    /// A `[!` class has no closing `]`.
    #[error("unterminated character class at position {index} in pattern '{pattern}'")]
    UnterminatedClass {
        /// The offending pattern.
        pattern: String,
        /// Character position of the `[`.
        index: usize,
    },

    /// The target pattern has more wildcards than the source pattern.
    #[error(
        "source and target file patterns contain differing number of glob markers ({old} vs {new}) and can't be translated"
    )]
    WildcardCount {
        /// Wildcards in the source pattern.
        old: usize,
        /// Wildcards in the target pattern.
        new: usize,
    },

    /// Paired wildcards differ.
    #[error("source and target file patterns differ in semantics: '{old}' vs '{new}'")]
    WildcardMismatch {
        /// Wildcard in the source pattern.
        old: String,
        /// Wildcard at the same position in the target pattern.
        new: String,
    },

    /// A filename does not match the source pattern.
    #[error("'{filename}' does not match pattern '{pattern}'")]
    NoMatch {
        /// The filename.
        filename: String,
        /// The source pattern.
        pattern: String,
    },

    /// The target pattern needs more bindings than were matched.
    #[error("not enough matched wildcards to fill pattern '{pattern}'")]
    MissingBinding {
        /// The target pattern.
        pattern: String,
    },

    /// Two files would be renamed to the same name.
    #[error("more than one file would be renamed to '{target}'")]
    DuplicateTarget {
        /// The shared target.
        target: String,
    },

    /// No rename order avoids overwriting a not-yet-renamed source.
    #[error(
        "there is no order of renaming actions that avoids copying over not-yet renamed files: '{filename}' is contained in matching source filenames"
    )]
    UnresolvableOrder {
        /// The source that would be overwritten.
        filename: String,
    },
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// One token of a tokenized pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobBlock {
    /// Literal text (including escapes) rather than a wildcard.
    pub is_literal: bool,
    /// The token as written in the pattern.
    pub content: String,
    /// Character position of the token in the pattern.
    pub index: usize,
}

impl GlobBlock {
    fn literal(content: String, index: usize) -> Self {
        Self {
            is_literal: true,
            content,
            index,
        }
    }

    fn wildcard(content: String, index: usize) -> Self {
        Self {
            is_literal: false,
            content,
            index,
        }
    }

    /// Text this literal token stands for, with escapes resolved.
    #[must_use]
    pub fn literal_text(&self) -> &str {
        if self.is_literal && ESCAPES.contains(&self.content.as_str()) {
            &self.content[1..2]
        } else {
            &self.content
        }
    }

    /// Number of characters a fixed-width wildcard consumes; `None` for `*`.
    fn width(&self) -> Option<usize> {
        if self.content.starts_with('?') {
            Some(self.content.chars().count())
        } else if self.content.starts_with('[') {
            Some(1)
        } else {
            None
        }
    }
}

/// One token matched against a concrete filename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobBlock2 {
    /// Whether the pattern token was literal.
    pub is_literal: bool,
    /// The pattern token.
    pub content: String,
    /// The filename text it covered.
    pub matches: String,
}

/// Pattern text rebuilt from its tokens.
struct Rendered<'a>(&'a [GlobBlock]);

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|t| f.write_str(&t.content))
    }
}

/// Split `pattern` into tokens.
///
/// # Errors
/// [`GlobError::UnterminatedClass`] if a `[!` has no closing `]`.
pub fn tokenize(pattern: &str) -> Result<Vec<GlobBlock>, GlobError> {
    let chars: Vec<char> = pattern.chars().collect();
    let text = |range: std::ops::Range<usize>| chars[range].iter().collect::<String>();
    let mut tokens = Vec::new();
    let mut index = 0;
    while index < chars.len() {
        let rest = &chars[index..];
        if rest.len() >= 3 && ESCAPES.contains(&text(index..index + 3).as_str()) {
            tokens.push(GlobBlock::literal(text(index..index + 3), index));
            index += 3;
        } else if rest[0] == '*' {
            tokens.push(GlobBlock::wildcard("*".to_owned(), index));
            index += 1;
        } else if rest[0] == '?' {
            let count = rest.iter().take_while(|&&c| c == '?').count();
            tokens.push(GlobBlock::wildcard(text(index..index + count), index));
            index += count;
        } else if rest.starts_with(&['[', '!']) {
            let close = rest[2..]
                .iter()
                .position(|&c| c == ']')
                .ok_or_else(|| GlobError::UnterminatedClass {
                    pattern: pattern.to_owned(),
                    index,
                })?;
            let end = index + 2 + close + 1;
            tokens.push(GlobBlock::wildcard(text(index..end), index));
            index = end;
        } else {
            let count = 1 + rest[1..]
                .iter()
                .take_while(|c| !matches!(c, '*' | '?' | '['))
                .count();
            tokens.push(GlobBlock::literal(text(index..index + count), index));
            index += count;
        }
    }
    Ok(tokens)
}

/// Tokenize a source/target pattern pair and check they are compatible.
///
/// The target may drop trailing wildcards but not add any, and paired
/// wildcards must be identical.
///
/// # Errors
/// Tokenize errors, [`GlobError::WildcardCount`] or
/// [`GlobError::WildcardMismatch`].
pub fn tokenize_pair(old: &str, new: &str) -> Result<(Vec<GlobBlock>, Vec<GlobBlock>), GlobError> {
    let old_tokens = tokenize(old)?;
    let new_tokens = tokenize(new)?;
    let old_wild: Vec<&GlobBlock> = old_tokens.iter().filter(|t| !t.is_literal).collect();
    let new_wild: Vec<&GlobBlock> = new_tokens.iter().filter(|t| !t.is_literal).collect();
    if old_wild.len() < new_wild.len() {
        return Err(GlobError::WildcardCount {
            old: old_wild.len(),
            new: new_wild.len(),
        });
    }
    if let Some((o, n)) = old_wild
        .iter()
        .zip(&new_wild)
        .find(|(o, n)| o.content != n.content)
    {
        return Err(GlobError::WildcardMismatch {
            old: o.content.clone(),
            new: n.content.clone(),
        });
    }
    Ok((old_tokens, new_tokens))
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Match `filename` against tokenized `pattern`, binding every wildcard.
///
/// A `*` extends to the first occurrence of the next literal (leaving room
/// for fixed-width wildcards in between), or to the end of the name if no
/// literal follows. If the rest of the pattern cannot match from there, the
/// next occurrence is tried.
///
/// # Errors
/// [`GlobError::NoMatch`] if the filename does not fit the pattern.
pub fn match_filename(filename: &str, pattern: &[GlobBlock]) -> Result<Vec<GlobBlock2>, GlobError> {
    let chars: Vec<char> = filename.chars().collect();
    let mut extents = Vec::with_capacity(pattern.len());
    if !match_from(&chars, 0, pattern, &mut extents) {
        return Err(GlobError::NoMatch {
            filename: filename.to_owned(),
            pattern: Rendered(pattern).to_string(),
        });
    }

    let mut index = 0;
    Ok(pattern
        .iter()
        .zip(extents)
        .map(|(token, covered)| {
            let matches = chars[index..index + covered].iter().collect();
            index += covered;
            GlobBlock2 {
                is_literal: token.is_literal,
                content: token.content.clone(),
                matches,
            }
        })
        .collect())
}

/// Match `pattern` against `chars[index..]`, pushing the characters each
/// token covers onto `extents`. On failure `extents` is left as it was.
fn match_from(chars: &[char], index: usize, pattern: &[GlobBlock], extents: &mut Vec<usize>) -> bool {
    let Some((token, rest)) = pattern.split_first() else {
        return index == chars.len();
    };
    let candidates = if token.is_literal {
        let literal: Vec<char> = token.literal_text().chars().collect();
        if !chars[index..].starts_with(&literal) {
            return false;
        }
        vec![literal.len()]
    } else if let Some(width) = token.width() {
        if index + width > chars.len() {
            return false;
        }
        if let Some(class) = token.content.strip_prefix("[!") {
            let excluded = class.strip_suffix(']').unwrap_or(class);
            if excluded.contains(chars[index]) {
                return false;
            }
        }
        vec![width]
    } else {
        star_extents(chars, index, rest)
    };

    for covered in candidates {
        extents.push(covered);
        if match_from(chars, index + covered, rest, extents) {
            return true;
        }
        extents.pop();
    }
    false
}

/// Candidate extents of a `*` at `index`, shortest first.
fn star_extents(chars: &[char], index: usize, following: &[GlobBlock]) -> Vec<usize> {
    let next_literal = following.iter().position(|t| t.is_literal);
    let reserved: usize = following[..next_literal.unwrap_or(following.len())]
        .iter()
        .filter_map(GlobBlock::width)
        .sum();
    let start = index + reserved;
    if start > chars.len() {
        return Vec::new();
    }
    let Some(literal_pos) = next_literal else {
        return vec![chars.len() - index - reserved];
    };
    let literal: Vec<char> = following[literal_pos].literal_text().chars().collect();
    if literal.is_empty() {
        return vec![0];
    }
    chars[start..]
        .windows(literal.len())
        .enumerate()
        .filter(|(_, w)| *w == literal.as_slice())
        .map(|(found, _)| found)
        .collect()
}

/// Build a filename from tokenized `pattern`, filling wildcards with the
/// bindings of `matched` in order.
///
/// # Errors
/// [`GlobError::MissingBinding`] if `pattern` has more wildcards than
/// `matched` bound.
pub fn synthesize(pattern: &[GlobBlock], matched: &[GlobBlock2]) -> Result<String, GlobError> {
    let mut bindings = matched.iter().filter(|m| !m.is_literal);
    let mut out = String::new();
    for token in pattern {
        if token.is_literal {
            out.push_str(token.literal_text());
        } else {
            let binding = bindings.next().ok_or_else(|| GlobError::MissingBinding {
                pattern: Rendered(pattern).to_string(),
            })?;
            out.push_str(&binding.matches);
        }
    }
    Ok(out)
}
