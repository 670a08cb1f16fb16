//! Conflict prompt port.
//!
//! The merge engine never talks to a terminal. When the `Ask` policy meets
//! a replacement it hands a [`Conflict`] to a [`ConflictPrompt`] and applies
//! the returned [`Resolution`]. [`ConsolePrompt`] is the interactive
//! implementation; [`NonInteractive`] refuses every conflict.

use std::io::{self, BufRead, Write};

use super::MergeError;

/// Whether a conflict concerns whole lines or characters within one line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Granularity {
    /// A multi-line block replacement.
    Line,
    /// A character span inside a single-line replacement.
    Character,
}

/// The full lines around a character conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharContext<'a> {
    /// The other side's line.
    pub other: &'a str,
    /// The current side's line.
    pub current: &'a str,
    /// Character column of the conflicting span in the current line.
    pub column: usize,
}

/// One replacement the engine cannot resolve on its own.
#[derive(Clone, Copy, Debug)]
pub struct Conflict<'a> {
    /// Line or character level.
    pub granularity: Granularity,
    /// The other side's span.
    pub theirs: &'a [String],
    /// The current side's span.
    pub mine: &'a [String],
    /// Surrounding lines, for character conflicts.
    pub context: Option<CharContext<'a>>,
}

/// How to resolve a [`Conflict`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Take the other side's span.
    Theirs,
    /// Take the current side's span.
    Mine,
    /// Take the other side's span followed by the current side's.
    Both,
    /// Replace the span with user-supplied lines.
    User(Vec<String>),
}

impl Resolution {
    /// Append the chosen content to `out`.
    ///
    /// Character-level user input is joined into a single span.
    pub fn apply(self, conflict: &Conflict<'_>, out: &mut Vec<String>) {
        match self {
            Self::Theirs => out.extend_from_slice(conflict.theirs),
            Self::Mine => out.extend_from_slice(conflict.mine),
            Self::Both => {
                out.extend_from_slice(conflict.theirs);
                out.extend_from_slice(conflict.mine);
            }
            Self::User(lines) => match conflict.granularity {
                Granularity::Line => out.extend(lines),
                Granularity::Character => out.push(lines.concat()),
            },
        }
    }
}

/// Decides conflicts for the `Ask` merge policy.
pub trait ConflictPrompt {
    /// Resolve one conflict.
    ///
    /// # Errors
    /// Returns a [`MergeError`] if no decision can be obtained.
    fn resolve(&mut self, conflict: &Conflict<'_>) -> Result<Resolution, MergeError>;
}

/// A prompt for non-interactive callers: every conflict is an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonInteractive;

impl ConflictPrompt for NonInteractive {
    fn resolve(&mut self, _conflict: &Conflict<'_>) -> Result<Resolution, MergeError> {
        Err(MergeError::PromptUnavailable)
    }
}

// ---------------------------------------------------------------------------
// ConsolePrompt
// ---------------------------------------------------------------------------

/// Line-based interactive prompt.
///
/// Shows both sides, then reads one response per line: `t` theirs, `i`
/// mine, `b` both, `u` user input (lines up to the first empty line). Any
/// other response re-prompts.
#[derive(Debug)]
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stderr> {
    /// Read answers from stdin and show conflicts on stderr, leaving stdout
    /// to the merge output.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    /// Prompt reading from `input` and writing to `output`.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    fn show(&mut self, conflict: &Conflict<'_>) -> io::Result<()> {
        if let Some(ctx) = conflict.context {
            let pad = " ".repeat(ctx.column);
            writeln!(self.output, "- {}", ctx.other)?;
            writeln!(self.output, "- {pad}{}", conflict.theirs.concat())?;
            writeln!(self.output, "+ {pad}{}", conflict.mine.concat())?;
            writeln!(self.output, "+ {}", ctx.current)?;
        } else {
            for line in conflict.theirs {
                writeln!(self.output, "- {line}")?;
            }
            for line in conflict.mine {
                writeln!(self.output, "+ {line}")?;
            }
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, MergeError> {
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        let trimmed = buf.trim_end_matches(['\n', '\r']).len();
        buf.truncate(trimmed);
        Ok(Some(buf))
    }

    /// Lines until the first empty line or end of input.
    fn read_block(&mut self) -> Result<Vec<String>, MergeError> {
        writeln!(self.output, "Enter replacement, finish with an empty line:")?;
        self.output.flush()?;
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            if line.is_empty() {
                break;
            }
            lines.push(line);
        }
        Ok(lines)
    }
}

impl<R: BufRead, W: Write> ConflictPrompt for ConsolePrompt<R, W> {
    fn resolve(&mut self, conflict: &Conflict<'_>) -> Result<Resolution, MergeError> {
        self.show(conflict)?;
        let label = match conflict.granularity {
            Granularity::Line => "Line",
            Granularity::Character => "Character",
        };
        loop {
            write!(
                self.output,
                " {label} replacement: [T]heirs (-), M[I]ne (+), [B]oth, [U]ser input: "
            )?;
            self.output.flush()?;
            let Some(answer) = self.read_line()? else {
                return Err(MergeError::PromptClosed);
            };
            match answer.trim().to_lowercase().chars().next() {
                Some('t') => return Ok(Resolution::Theirs),
                Some('i') => return Ok(Resolution::Mine),
                Some('b') => return Ok(Resolution::Both),
                Some('u') => return self.read_block().map(Resolution::User),
                _ => {}
            }
        }
    }
}

/// Scripted prompt for tests: hands out queued resolutions in order.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Scripted {
    pub answers: std::collections::VecDeque<Resolution>,
    pub seen: Vec<(Granularity, Vec<String>, Vec<String>)>,
}

#[cfg(test)]
impl Scripted {
    pub(crate) fn new(answers: impl IntoIterator<Item = Resolution>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            seen: Vec::new(),
        }
    }
}

#[cfg(test)]
impl ConflictPrompt for Scripted {
    fn resolve(&mut self, conflict: &Conflict<'_>) -> Result<Resolution, MergeError> {
        self.seen.push((
            conflict.granularity,
            conflict.theirs.to_vec(),
            conflict.mine.to_vec(),
        ));
        self.answers.pop_front().ok_or(MergeError::PromptClosed)
    }
}
