//! Literate-script driver.
//!
//! A literate script is an ordinary Python program that produces a tutorial by
//! calling four functions:
//!
//! ```python
//! header_md("Callable objects", nesting=2)
//! print_md("A class is callable if it defines __call__.")
//! eval_and_quote("""
//! class Greeter:
//!     def __call__(self):
//!         print("hello")
//! Greeter()()
//! """)
//! ```
//!
//! The script runs in its own interpreter session where those names are
//! external functions. Each call pauses the script, is carried out on the
//! [`Document`], and the script resumes with `None`. Anything the script prints
//! itself goes into the document unchanged.
//!
//! Snippet code passed to `eval_and_quote` runs in the document's namespace.
//! It sees the script's top-level imports and data globals, and can call
//! `header_md`, `print_md` and `print_quoted` itself; their markdown lands in
//! the snippet's result block.

use std::{borrow::Cow, fmt, io::Write};

use ouros::{ExcType, Exception, ExternalResult, Object, PrintWriter, ReplError, ReplProgress, ReplSession};

use crate::{
    call::{MarkdownCall, type_error},
    document::{Document, RenderError},
    globals::{self, SharedGlobals},
};

/// Functions a literate script can call.
pub const EXTERNAL_FUNCTIONS: [&str; 4] = ["header_md", "print_md", "print_quoted", "eval_and_quote"];

/// Errors raised while running a literate script.
#[derive(Debug)]
pub enum ScriptError {
    /// The script itself failed to parse or raised.
    Script(ReplError),
    /// Writing the document failed, or one of its snippets failed.
    Render(RenderError),
    /// The script used an interpreter feature the driver cannot serve.
    Unsupported(String),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script(_) => f.write_str("literate script failed"),
            Self::Render(_) => f.write_str("rendering stopped"),
            Self::Unsupported(what) => write!(f, "unsupported in literate scripts: {what}"),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Script(error) => Some(error),
            Self::Render(error) => Some(error),
            Self::Unsupported(_) => None,
        }
    }
}

impl From<ReplError> for ScriptError {
    fn from(error: ReplError) -> Self {
        Self::Script(error)
    }
}

impl From<RenderError> for ScriptError {
    fn from(error: RenderError) -> Self {
        Self::Render(error)
    }
}

/// Runs a literate script, writing the generated markdown into `document`.
///
/// Stops at the first failing snippet; everything rendered up to and including
/// that snippet is already in the document.
pub fn run_script<W: Write>(source: &str, script_name: &str, document: &mut Document<W>) -> Result<(), ScriptError> {
    let source = globals::strip_helper_imports(source);
    let external_functions = EXTERNAL_FUNCTIONS.iter().map(|name| (*name).to_owned()).collect();
    let mut session = ReplSession::new(external_functions, script_name);
    let mut shared = SharedGlobals::default();
    log::info!("running literate script {script_name}");
    globals::replay_imports(&source, document.namespace_mut());

    let mut progress = session.execute_interactive(&source, &mut DocumentPrint::new(document))?;
    loop {
        match progress {
            ReplProgress::Complete(_) => return Ok(()),
            ReplProgress::FunctionCall {
                function_name,
                args,
                kwargs,
                ..
            } => {
                let result = match MarkdownCall::parse(&function_name, &args, &kwargs) {
                    Ok(call) => {
                        if matches!(call, MarkdownCall::Snippet(_)) {
                            shared.share(&session, document.namespace_mut());
                        }
                        dispatch(document, call)?
                    }
                    Err(message) => type_error(message),
                };
                progress = session.resume(result, &mut DocumentPrint::new(document))?;
            }
            ReplProgress::ProxyCall { method, .. } => {
                return Err(ScriptError::Unsupported(format!("proxy call `{method}`")));
            }
            ReplProgress::ResolveFutures { pending_call_ids, .. } => {
                return Err(ScriptError::Unsupported(format!(
                    "awaiting external futures {pending_call_ids:?}"
                )));
            }
        }
    }
}

/// Carries out one external call; a failing snippet or an output error ends the run.
fn dispatch<W: Write>(document: &mut Document<W>, call: MarkdownCall) -> Result<ExternalResult, ScriptError> {
    match call {
        MarkdownCall::Header { text, nesting } => document.header_md(&text, nesting)?,
        MarkdownCall::Markdown(parts) => document.print_md(&parts)?,
        MarkdownCall::Quoted(parts) => document.print_quoted(&parts)?,
        MarkdownCall::Snippet(code) => document.eval_and_quote(&code)?,
    }
    Ok(ExternalResult::Return(Object::None))
}

/// Routes the script's own `print()` output into the document.
struct DocumentPrint<'a, W: Write> {
    document: &'a mut Document<W>,
}

impl<'a, W: Write> DocumentPrint<'a, W> {
    fn new(document: &'a mut Document<W>) -> Self {
        Self { document }
    }
}

impl<W: Write> PrintWriter for DocumentPrint<'_, W> {
    fn stdout_write(&mut self, output: Cow<'_, str>) -> Result<(), Exception> {
        self.document
            .write_raw(&output)
            .map_err(|err| Exception::new(ExcType::OSError, Some(err.to_string())))
    }

    fn stdout_push(&mut self, end: char) -> Result<(), Exception> {
        let mut buf = [0u8; 4];
        self.stdout_write(Cow::Borrowed(end.encode_utf8(&mut buf)))
    }
}
