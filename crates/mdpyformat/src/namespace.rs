//! The execution namespace shared by all snippets of one document.
//!
//! A `Namespace` owns a persistent interpreter session. Names bound by one
//! snippet (variables, functions, classes, imports) stay visible to every
//! snippet executed after it. It is created empty at the start of a run and
//! dropped with the document.
//!
//! Snippet code may itself call `header_md`, `print_md` and `print_quoted`.
//! Their markdown goes to the snippet's captured stdout, in order with its
//! `print()` output.

use std::fmt;

use ouros::{
    ExcType, Exception, ExternalResult, InvalidInputError, NoPrint, Object, ReplError, ReplProgress, ReplSession,
    ResourceLimits,
};

use crate::{
    call::{MarkdownCall, type_error},
    capture::CaptureSinks,
    config::{DEFAULT_SCRIPT_NAME, RenderConfig},
    failure::SnippetFailure,
};

/// Markdown functions snippet code can call.
pub const SNIPPET_FUNCTIONS: [&str; 3] = ["header_md", "print_md", "print_quoted"];

/// Persistent binding table snippets execute against.
pub struct Namespace {
    session: ReplSession,
    /// Number of snippets executed so far, successful or not.
    executed: usize,
    /// Sources of the snippets executed so far, for mapping frames of earlier code.
    history: Vec<String>,
    escape_underscores: bool,
}

impl Namespace {
    /// Creates an empty namespace without resource limits.
    #[must_use]
    pub fn new(script_name: &str) -> Self {
        Self::with_session(ReplSession::new(snippet_functions(), script_name))
    }

    /// Creates an empty namespace whose executions are bounded by `limits`.
    #[must_use]
    pub fn with_limits(script_name: &str, limits: ResourceLimits) -> Self {
        Self::with_session(ReplSession::new_with_resource_limits(
            snippet_functions(),
            script_name,
            limits,
        ))
    }

    /// Creates the namespace described by a render configuration.
    #[must_use]
    pub fn from_config(config: &RenderConfig) -> Self {
        let mut namespace = match config.resource_limits() {
            Some(limits) => Self::with_limits(&config.script_name, limits),
            None => Self::new(&config.script_name),
        };
        namespace.escape_underscores = config.escape_underscores;
        namespace
    }

    fn with_session(session: ReplSession) -> Self {
        Self {
            session,
            executed: 0,
            history: Vec::new(),
            escape_underscores: true,
        }
    }

    /// Script name reported in tracebacks.
    #[must_use]
    pub fn script_name(&self) -> &str {
        self.session.script_name()
    }

    /// Number of snippets executed in this namespace.
    #[must_use]
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Defined names and their Python type names, sorted by name.
    #[must_use]
    pub fn variables(&self) -> Vec<(String, String)> {
        self.session.list_variables()
    }

    /// True when `name` is currently bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.session.get_variable(name).is_some()
    }

    /// Current value of a bound name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Object> {
        self.session.get_variable(name)
    }

    /// Binds `name` to a host value.
    pub fn set(&mut self, name: &str, value: Object) -> Result<(), InvalidInputError> {
        self.session.set_variable(name, value)
    }

    /// Runs setup code that is not a snippet: nothing is counted, output is dropped.
    pub(crate) fn run_setup(&mut self, code: &str) -> Result<(), ReplError> {
        self.session.execute(code, &mut NoPrint).map(|_| ())
    }

    /// Executes a snippet, writing its output and markdown calls into `sinks`.
    pub(crate) fn execute(&mut self, code: &str, sinks: &mut CaptureSinks) -> Result<(), SnippetFailure> {
        self.executed += 1;
        let result = self.drive(code, sinks);
        let outcome = result
            .map_err(|error| SnippetFailure::from_repl_error(error, code, self.session.script_name(), &self.history));
        self.history.push(code.to_owned());
        outcome
    }

    fn drive(&mut self, code: &str, sinks: &mut CaptureSinks) -> Result<(), ReplError> {
        let mut progress = self.session.execute_interactive(code, sinks)?;
        loop {
            progress = match progress {
                ReplProgress::Complete(_) => return Ok(()),
                ReplProgress::FunctionCall {
                    function_name,
                    args,
                    kwargs,
                    ..
                } => {
                    let result = self.markdown_call(&function_name, &args, &kwargs, sinks);
                    self.session.resume(result, sinks)?
                }
                ReplProgress::ProxyCall { method, .. } => {
                    let result = type_error(format!("proxy call `{method}` is not supported in snippets"));
                    self.session.resume(result, sinks)?
                }
                ReplProgress::ResolveFutures { pending_call_ids, .. } => {
                    // no host call here ever returns a future
                    let message = format!("snippet awaits external futures {pending_call_ids:?}");
                    return Err(ReplError::Runtime(Exception::new(ExcType::RuntimeError, Some(message))));
                }
            };
        }
    }

    fn markdown_call(
        &self,
        function_name: &str,
        args: &[Object],
        kwargs: &[(Object, Object)],
        sinks: &mut CaptureSinks,
    ) -> ExternalResult {
        let call = match MarkdownCall::parse(function_name, args, kwargs) {
            Ok(call) => call,
            Err(message) => return type_error(message),
        };
        match call.render(self.escape_underscores) {
            Some(text) => {
                sinks.write_stdout(&text);
                ExternalResult::Return(Object::None)
            }
            None => type_error(format!("{function_name}() cannot be called from a snippet")),
        }
    }
}

fn snippet_functions() -> Vec<String> {
    SNIPPET_FUNCTIONS.iter().map(|name| (*name).to_owned()).collect()
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_NAME)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("script_name", &self.script_name())
            .field("executed", &self.executed)
            .field("escape_underscores", &self.escape_underscores)
            .finish_non_exhaustive()
    }
}
