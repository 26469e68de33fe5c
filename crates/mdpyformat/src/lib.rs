#![doc = include_str!("../../../README.md")]

mod call;
pub mod capture;
pub mod config;
pub mod document;
pub mod failure;
mod globals;
pub mod markdown;
pub mod namespace;
pub mod runner;
pub mod script;
pub mod toc;

pub use crate::{
    capture::{CaptureSinks, CapturedOutput, with_capture},
    config::{ConfigError, DEFAULT_RESULT_PREFIX, DEFAULT_SCRIPT_NAME, RenderConfig},
    document::{Document, RenderError},
    failure::{RuntimeFailure, SnippetFailure, SyntaxFailure, TraceEntry},
    namespace::{Namespace, SNIPPET_FUNCTIONS},
    runner::{Outcome, eval_and_quote, run_snippet},
    script::{EXTERNAL_FUNCTIONS, ScriptError, run_script},
    toc::{TOC_MARKER, TocError},
};
