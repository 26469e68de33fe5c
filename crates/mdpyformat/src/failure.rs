//! Structured description of a failed snippet.
//!
//! Interpreter errors are converted into these types right after execution so
//! that the rest of the crate (rendering, the document driver, the CLI) never
//! has to look at interpreter internals. Line numbers always refer to lines of
//! the snippet text itself, counted from 1.

use std::fmt;

use ouros::{Exception, ReplError, StackFrame};

/// Frame name the interpreter leaves empty for top-level code.
const MODULE_FRAME: &str = "<module>";

/// Why a snippet did not run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetFailure {
    /// The snippet could not be parsed.
    Syntax(SyntaxFailure),
    /// The snippet raised while executing.
    Runtime(RuntimeFailure),
    /// The interpreter refused to run or finish the snippet for a reason that is
    /// not a Python exception, e.g. a bytecode compilation error or an exceeded
    /// resource limit.
    Aborted { message: String },
}

/// Location and message of a parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxFailure {
    /// 1-based line of the snippet; 0 when the interpreter reported no position.
    pub line_number: usize,
    /// The offending line as written in the snippet.
    pub line_text: String,
    /// Exception summary, e.g. `SyntaxError: invalid syntax`.
    pub message: String,
}

/// Exception summary plus the call chain that led to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFailure {
    /// Frames from the outermost (the snippet's top level) to where the exception was raised.
    pub trace: Vec<TraceEntry>,
    /// Exception summary, e.g. `ValueError: boom`.
    pub message: String,
}

/// One frame of a runtime failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Function name, or `<module>` for top-level code.
    pub frame_name: String,
    /// 1-based line within the snippet.
    pub line_number: usize,
    /// Source text of that line.
    pub line_text: String,
}

impl SnippetFailure {
    /// Converts an interpreter error for `snippet` into a failure description.
    ///
    /// `earlier` holds the snippets run before it in the same namespace, oldest first.
    pub(crate) fn from_repl_error(error: ReplError, snippet: &str, script_name: &str, earlier: &[String]) -> Self {
        match error {
            ReplError::Parse(parse_error) => {
                let exception = parse_error.into_python_exc(script_name, snippet);
                Self::Syntax(SyntaxFailure::from_exception(&exception, snippet))
            }
            ReplError::Runtime(exception) => {
                Self::Runtime(RuntimeFailure::from_exception(&exception, snippet, earlier))
            }
            other => Self::Aborted {
                message: other.to_string(),
            },
        }
    }

    /// One-line summary, used in logs and CLI error messages.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Syntax(failure) => format!("{} (line {})", failure.message, failure.line_number),
            Self::Runtime(failure) => match failure.trace.last() {
                Some(entry) => format!("{} (line {})", failure.message, entry.line_number),
                None => failure.message.clone(),
            },
            Self::Aborted { message } => message.clone(),
        }
    }
}

impl SyntaxFailure {
    fn from_exception(exception: &Exception, snippet: &str) -> Self {
        let frame = exception.traceback().first();
        let line_number = frame.map_or(0, frame_line);
        let line_text = frame
            .map(|frame| pick_line(snippet_line(snippet, line_number), frame.preview_line.as_deref(), &[], line_number))
            .unwrap_or_default();
        Self {
            line_number,
            line_text,
            message: exception.summary(),
        }
    }
}

impl RuntimeFailure {
    fn from_exception(exception: &Exception, snippet: &str, earlier: &[String]) -> Self {
        let trace = exception
            .traceback()
            .iter()
            .map(|frame| {
                let line_number = frame_line(frame);
                TraceEntry {
                    frame_name: frame.frame_name.clone().unwrap_or_else(|| MODULE_FRAME.to_owned()),
                    line_number,
                    line_text: pick_line(
                        snippet_line(snippet, line_number),
                        frame.preview_line.as_deref(),
                        earlier,
                        line_number,
                    ),
                }
            })
            .collect();
        Self {
            trace,
            message: exception.summary(),
        }
    }
}

fn frame_line(frame: &StackFrame) -> usize {
    usize::try_from(frame.start.line).unwrap_or_default()
}

/// Chooses the text shown for a frame.
///
/// The snippet's own line (`own`) is used unless the interpreter's preview
/// disagrees with it, which means the frame runs code defined by an earlier
/// snippet. Without either, the most recent earlier snippet long enough to have
/// that line is used.
fn pick_line(own: Option<&str>, preview: Option<&str>, earlier: &[String], line_number: usize) -> String {
    match (own, preview) {
        (Some(own), Some(preview)) if own.trim() != preview.trim() => preview.to_owned(),
        (Some(own), _) => own.to_owned(),
        (None, Some(preview)) => preview.to_owned(),
        (None, None) => earlier
            .iter()
            .rev()
            .find_map(|source| snippet_line(source, line_number))
            .unwrap_or_default()
            .to_owned(),
    }
}

/// Returns line `line_number` (1-based) of `snippet`.
#[must_use]
pub fn snippet_line(snippet: &str, line_number: usize) -> Option<&str> {
    let index = line_number.checked_sub(1)?;
    snippet.split('\n').nth(index).map(|line| line.trim_end_matches('\r'))
}

impl fmt::Display for SnippetFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(failure) => write!(f, "{failure}"),
            Self::Runtime(failure) => write!(f, "{failure}"),
            Self::Aborted { message } => write!(f, "error: {message}"),
        }
    }
}

impl fmt::Display for SyntaxFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        write!(f, "  line {}: {}", self.line_number, self.line_text.trim())
    }
}

impl fmt::Display for RuntimeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Traceback (most recent call last):")?;
        for entry in &self.trace {
            writeln!(f, "  line {}, in {}", entry.line_number, entry.frame_name)?;
            if !entry.line_text.trim().is_empty() {
                writeln!(f, "    {}", entry.line_text.trim())?;
            }
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SnippetFailure {}
