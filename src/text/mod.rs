//! Text loading: encoding and EOL detection, line splitting.
//!
//! [`load_text`] turns a byte buffer into a [`LoadedText`]; [`TextSource`]
//! lets callers hand in either a buffer or a path. Loading never fails on
//! content (the encoding chain always finds a decoder), only on I/O.

pub mod encoding;
pub mod eol;

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

pub use encoding::{TextEncoding, detect_encoding};
pub use eol::{Eol, EolDetection, detect_eol};

/// Errors from reading text sources.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A decoded text buffer split into lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedText {
    /// Detected encoding, reused when writing merge output.
    pub encoding: TextEncoding,
    /// Detected EOL style, `None` if undetermined.
    pub eol: Option<Eol>,
    /// Decoded lines without terminators.
    pub lines: Vec<String>,
}

impl LoadedText {
    /// Lines as used for equality checks while diffing.
    ///
    /// With `ignore_whitespace`, tabs become two spaces and each line is
    /// trimmed. The stored lines are left untouched.
    #[must_use]
    pub fn comparison_keys(&self, ignore_whitespace: bool) -> Vec<Cow<'_, str>> {
        self.lines
            .iter()
            .map(|line| {
                if ignore_whitespace {
                    Cow::Owned(normalize_whitespace(line))
                } else {
                    Cow::Borrowed(line.as_str())
                }
            })
            .collect()
    }
}

/// Tabs to two spaces, then trim both ends.
#[must_use]
pub fn normalize_whitespace(line: &str) -> String {
    line.replace('\t', "  ").trim().to_owned()
}

/// Split `s` on `separator`, yielding nothing for an empty string.
#[must_use]
pub fn safe_split<'a>(s: &'a str, separator: &str) -> Vec<&'a str> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split(separator).collect()
    }
}

/// Detect encoding and EOL style of `content` and split it into lines.
///
/// Without a detectable EOL style the text is split on `\n`, which leaves a
/// single line for break-free content.
#[must_use]
pub fn load_text(content: &[u8]) -> LoadedText {
    let encoding = detect_encoding(content);
    let eol = detect_eol(content).eol;
    let text = encoding.decode(content);
    let separator = eol.unwrap_or(Eol::Lf).as_str();
    let lines = safe_split(&text, separator)
        .into_iter()
        .map(str::to_owned)
        .collect();
    LoadedText {
        encoding,
        eol,
        lines,
    }
}

/// Read and load a file.
///
/// # Errors
/// Returns [`LoadError::Read`] if the file cannot be read.
#[tracing::instrument(level = "debug")]
pub fn load_file(path: &Path) -> Result<LoadedText, LoadError> {
    let content = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_owned(),
        source,
    })?;
    Ok(load_text(&content))
}

// ---------------------------------------------------------------------------
// TextSource
// ---------------------------------------------------------------------------

/// Where one side of a diff or merge comes from.
#[derive(Clone, Copy, Debug)]
pub enum TextSource<'a> {
    /// An in-memory buffer.
    Bytes(&'a [u8]),
    /// A file on disk.
    Path(&'a Path),
}

impl TextSource<'_> {
    /// Load this source.
    ///
    /// # Errors
    /// Returns [`LoadError`] if a file source cannot be read.
    pub fn load(&self) -> Result<LoadedText, LoadError> {
        match self {
            Self::Bytes(content) => Ok(load_text(content)),
            Self::Path(path) => load_file(path),
        }
    }
}

impl fmt::Display for TextSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(content) => write!(f, "<{} bytes>", content.len()),
            Self::Path(path) => write!(f, "'{}'", path.display()),
        }
    }
}
