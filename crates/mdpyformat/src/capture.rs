//! Output capture for a single snippet execution.
//!
//! The interpreter never writes to the process streams directly: everything a
//! snippet prints goes through the [`PrintWriter`] handed to it. A capture is
//! therefore just a pair of in-memory sinks that exist for exactly one
//! execution. [`with_capture`] creates them, lends them to the closure and turns
//! them into [`CapturedOutput`] once the closure returns, so no output can leak
//! from one snippet into the rendering of the next.

use std::borrow::Cow;

use ouros::{Exception, PrintWriter};

/// The two in-memory sinks receiving one snippet's output.
///
/// `print()` output (including `print(..., file=sys.stderr)`, which the
/// interpreter routes through the same writer) goes to stdout. The runner writes
/// its own diagnostics to stderr.
#[derive(Debug, Default)]
pub struct CaptureSinks {
    stdout: String,
    stderr: String,
}

impl CaptureSinks {
    /// Appends text to the stdout sink.
    pub fn write_stdout(&mut self, text: &str) {
        self.stdout.push_str(text);
    }

    /// Appends text to the stderr sink.
    pub fn write_stderr(&mut self, text: &str) {
        self.stderr.push_str(text);
    }

    fn into_output(self) -> CapturedOutput {
        CapturedOutput {
            stdout: self.stdout.trim_end().to_owned(),
            stderr: self.stderr.trim_end().to_owned(),
        }
    }
}

impl PrintWriter for CaptureSinks {
    fn stdout_write(&mut self, output: Cow<'_, str>) -> Result<(), Exception> {
        self.stdout.push_str(&output);
        Ok(())
    }

    fn stdout_push(&mut self, end: char) -> Result<(), Exception> {
        self.stdout.push(end);
        Ok(())
    }
}

/// Text captured during one execution, with trailing whitespace stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    stdout: String,
    stderr: String,
}

impl CapturedOutput {
    /// Captured standard output.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Captured standard error.
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// True when neither stream produced any visible text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// Runs `body` with a fresh pair of sinks and returns its result together with
/// everything it wrote.
///
/// The sinks are owned by this scope: they are released when `body` returns,
/// whatever it returns, and dropped if it unwinds.
pub fn with_capture<R>(body: impl FnOnce(&mut CaptureSinks) -> R) -> (R, CapturedOutput) {
    let mut sinks = CaptureSinks::default();
    let result = body(&mut sinks);
    (result, sinks.into_output())
}
