//! End-of-line style detection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A line terminator style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Eol {
    /// `\n` (Unix).
    Lf,
    /// `\r` (classic Mac and older 8-bit machines).
    Cr,
    /// `\r\n` (DOS/Windows).
    CrLf,
}

impl Eol {
    /// The terminator as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Cr => "\r",
            Self::CrLf => "\r\n",
        }
    }
}

impl fmt::Display for Eol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => write!(f, "<LF>"),
            Self::Cr => write!(f, "<CR>"),
            Self::CrLf => write!(f, "<CR+LF>"),
        }
    }
}

/// Outcome of [`detect_eol`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EolDetection {
    /// The dominant style, or `None` if the buffer has no line breaks.
    pub eol: Option<Eol>,
    /// Whether the buffer mixes styles.
    pub mixed: bool,
}

/// Determine the EOL style of a byte buffer.
///
/// Any `\r\n` pair makes the buffer CR+LF; stray `\r` or `\n` beside those
/// pairs flag it as mixed. Without pairs the more frequent of `\n` and `\r`
/// wins, and a tie (including zero of both) leaves the style unknown.
#[must_use]
pub fn detect_eol(content: &[u8]) -> EolDetection {
    let lf = content.iter().filter(|&&b| b == b'\n').count();
    let cr = content.iter().filter(|&&b| b == b'\r').count();
    let crlf = content.windows(2).filter(|w| w == b"\r\n").count();

    if crlf > 0 {
        let mixed = lf != crlf || cr != crlf;
        if mixed {
            tracing::warn!(
                lf,
                cr,
                crlf,
                "inconsistent CR/NL count with CR+NL; mixed EOL style may cause problems during merge"
            );
        }
        return EolDetection {
            eol: Some(Eol::CrLf),
            mixed,
        };
    }

    let mixed = lf != 0 && cr != 0;
    if mixed {
        tracing::warn!(
            lf,
            cr,
            "inconsistent CR/NL count without CR+NL; mixed EOL style may cause problems during merge"
        );
    }
    let eol = match lf.cmp(&cr) {
        std::cmp::Ordering::Greater => Some(Eol::Lf),
        std::cmp::Ordering::Less => Some(Eol::Cr),
        std::cmp::Ordering::Equal => None,
    };
    EolDetection { eol, mixed }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_newlines_are_lf() {
        let d = detect_eol(b"a\nb\nc\n");
        assert_eq!(d.eol, Some(Eol::Lf));
        assert!(!d.mixed);
    }

    #[test]
    fn consistent_pairs_are_crlf_without_warning() {
        let d = detect_eol(b"a\r\nb\r\n");
        assert_eq!(d.eol, Some(Eol::CrLf));
        assert!(!d.mixed);
    }

    #[test]
    fn lone_carriage_returns_are_cr() {
        assert_eq!(detect_eol(b"\ra\rb").eol, Some(Eol::Cr));
    }

    #[test]
    fn stray_newline_beside_pairs_is_mixed_crlf() {
        let d = detect_eol(b"\r\na\r\nb\n");
        assert_eq!(d.eol, Some(Eol::CrLf));
        assert!(d.mixed);
    }

    #[test]
    fn both_singles_without_pairs_is_mixed() {
        let d = detect_eol(b"\ra\nnb\n");
        assert_eq!(d.eol, Some(Eol::Lf));
        assert!(d.mixed);
    }

    #[test]
    fn no_breaks_is_unknown() {
        assert_eq!(detect_eol(b"").eol, None);
        assert_eq!(detect_eol(b"sdf").eol, None);
    }

    #[test]
    fn display_names() {
        assert_eq!(Eol::Lf.to_string(), "<LF>");
        assert_eq!(Eol::CrLf.to_string(), "<CR+LF>");
        assert_eq!(Eol::CrLf.as_str(), "\r\n");
    }
}
