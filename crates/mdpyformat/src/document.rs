//! The document writer.
//!
//! A [`Document`] is one document-generation run: it owns the output stream,
//! the render configuration and the execution namespace every snippet of the
//! run shares. Prose and snippets are written in the order they are added.

use std::{fmt, io, io::Write};

use crate::{config::RenderConfig, failure::SnippetFailure, markdown, namespace::Namespace, runner};

/// Errors raised while writing a document.
#[derive(Debug)]
pub enum RenderError {
    /// Writing to the output stream failed.
    Io(io::Error),
    /// A snippet failed; its rendering has already been written.
    Snippet(SnippetFailure),
    /// A previous snippet failed, so the document accepts no further snippets.
    Halted,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "output error: {error}"),
            Self::Snippet(failure) => write!(f, "snippet failed: {}", failure.summary()),
            Self::Halted => f.write_str("document generation already stopped by a failed snippet"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Snippet(failure) => Some(failure),
            Self::Halted => None,
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

/// One document-generation run writing markdown to `W`.
pub struct Document<W: Write> {
    out: W,
    config: RenderConfig,
    namespace: Namespace,
    snippets_run: usize,
    halted: bool,
}

impl<W: Write> Document<W> {
    /// Starts a run with an empty namespace built from `config`.
    #[must_use]
    pub fn new(out: W, config: RenderConfig) -> Self {
        let namespace = Namespace::from_config(&config);
        Self {
            out,
            config,
            namespace,
            snippets_run: 0,
            halted: false,
        }
    }

    /// Writes a header of the given nesting level (1 is the document title).
    pub fn header_md(&mut self, text: &str, nesting: usize) -> Result<(), RenderError> {
        let header = markdown::header(text, nesting, self.config.escape_underscores);
        self.out.write_all(header.as_bytes())?;
        Ok(())
    }

    /// Writes prose; arguments are joined with spaces.
    pub fn print_md<S: AsRef<str>>(&mut self, args: &[S]) -> Result<(), RenderError> {
        let text = markdown::paragraph(&markdown::join_args(args), self.config.escape_underscores);
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Writes the arguments verbatim inside a code fence.
    pub fn print_quoted<S: AsRef<str>>(&mut self, args: &[S]) -> Result<(), RenderError> {
        let text = markdown::fenced(&markdown::join_args(args));
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Writes text as is.
    pub fn write_raw(&mut self, text: &str) -> Result<(), RenderError> {
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Renders, executes and quotes the output of a snippet.
    ///
    /// After a failure the document is halted and every further call returns
    /// [`RenderError::Halted`] without executing anything.
    pub fn eval_and_quote(&mut self, snippet: &str) -> Result<(), RenderError> {
        if self.halted {
            return Err(RenderError::Halted);
        }
        self.snippets_run += 1;
        let result = runner::eval_and_quote(&mut self.out, &mut self.namespace, snippet, &self.config);
        if result.is_err() {
            self.halted = true;
        }
        result
    }

    /// Render configuration of this run.
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Namespace shared by the snippets of this run.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Mutable access to the namespace, e.g. to bind values before the first snippet.
    pub fn namespace_mut(&mut self) -> &mut Namespace {
        &mut self.namespace
    }

    /// Number of snippets rendered so far, including a failed one.
    #[must_use]
    pub fn snippets_run(&self) -> usize {
        self.snippets_run
    }

    /// True once a snippet has failed.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Flushes and returns the output stream.
    pub fn finish(mut self) -> Result<W, RenderError> {
        self.out.flush()?;
        log::info!("rendered document with {} snippets", self.snippets_run);
        Ok(self.out)
    }

    /// Returns the output stream without flushing it, e.g. to salvage a partial document.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> fmt::Debug for Document<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("config", &self.config)
            .field("namespace", &self.namespace)
            .field("snippets_run", &self.snippets_run)
            .field("halted", &self.halted)
            .finish_non_exhaustive()
    }
}
