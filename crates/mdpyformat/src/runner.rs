//! The literate snippet runner.
//!
//! [`eval_and_quote`] is the heart of the crate: it writes a snippet as a fenced
//! source block, executes it against the shared [`Namespace`] while capturing
//! its output, and writes whatever was captured as result blocks below the
//! source. A failing snippet is rendered like any other, then reported back as
//! an error so the caller can stop the run.

use std::io::Write;

use crate::{
    capture::{CapturedOutput, with_capture},
    config::RenderConfig,
    document::RenderError,
    failure::SnippetFailure,
    markdown,
    namespace::Namespace,
};

/// Result of executing one snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Everything the snippet printed, plus the failure report on stderr if it failed.
    pub output: CapturedOutput,
    /// Set when the snippet failed to parse or raised.
    pub failure: Option<SnippetFailure>,
}

impl Outcome {
    /// True when the snippet ran to completion.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Converts the outcome into a `Result`, dropping the captured output.
    pub fn into_result(self) -> Result<(), SnippetFailure> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

/// Executes `snippet` in `namespace` and captures its output.
///
/// Nothing is rendered. On failure the diagnostic is written to the captured
/// stderr, which is where [`eval_and_quote`] picks it up.
pub fn run_snippet(namespace: &mut Namespace, snippet: &str) -> Outcome {
    let (failure, output) = with_capture(|sinks| match namespace.execute(snippet, sinks) {
        Ok(()) => None,
        Err(failure) => {
            sinks.write_stderr(&failure.to_string());
            Some(failure)
        }
    });

    match &failure {
        None => log::debug!(
            "snippet #{} ok ({} lines, {} bytes of output)",
            namespace.executed(),
            snippet.lines().count(),
            output.stdout().len()
        ),
        Some(failure) => log::warn!("snippet #{} failed: {}", namespace.executed(), failure.summary()),
    }

    Outcome { output, failure }
}

/// Renders `snippet`, executes it and renders its captured output.
///
/// Layout: a blank line, the verbatim source in a fence, then a prefixed result
/// block for stdout and one for stderr, each only when non-empty. The output is
/// flushed before a failure is returned.
pub fn eval_and_quote(
    out: &mut impl Write,
    namespace: &mut Namespace,
    snippet: &str,
    config: &RenderConfig,
) -> Result<(), RenderError> {
    writeln!(out)?;
    out.write_all(markdown::fenced(snippet).as_bytes())?;

    let outcome = run_snippet(namespace, snippet);
    write_results(out, &outcome.output, config)?;
    out.flush()?;

    outcome.into_result().map_err(RenderError::Snippet)
}

/// Writes the non-empty captured streams, stdout first.
fn write_results(out: &mut impl Write, output: &CapturedOutput, config: &RenderConfig) -> Result<(), RenderError> {
    for text in [output.stdout(), output.stderr()] {
        if text.is_empty() {
            continue;
        }
        writeln!(out)?;
        out.write_all(markdown::result_block(text, &config.result_prefix).as_bytes())?;
        writeln!(out)?;
    }
    Ok(())
}
