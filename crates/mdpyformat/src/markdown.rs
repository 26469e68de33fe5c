//! Markdown emitters used by the document writer.
//!
//! Every function returns the rendered text including its trailing newline, so
//! callers can write the result straight into the output stream.

use std::borrow::Cow;

/// Code fence used for snippet sources and result blocks.
pub const FENCE: &str = "```";

/// Deepest header level markdown supports.
const MAX_HEADER_LEVEL: usize = 6;

/// Escapes underscores so that identifiers like `__init__` are not rendered as emphasis.
#[must_use]
pub fn escape(text: &str) -> Cow<'_, str> {
    if text.contains('_') {
        Cow::Owned(text.replace('_', "\\_"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Joins arguments with a single space, the way `print()` does.
#[must_use]
pub fn join_args<S: AsRef<str>>(args: &[S]) -> String {
    args.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ")
}

/// Renders a paragraph of prose.
#[must_use]
pub fn paragraph(text: &str, escape_underscores: bool) -> String {
    let mut out = if escape_underscores {
        escape(text).into_owned()
    } else {
        text.to_owned()
    };
    out.push('\n');
    out
}

/// Renders a header; `nesting` is clamped to the levels markdown supports.
#[must_use]
pub fn header(text: &str, nesting: usize, escape_underscores: bool) -> String {
    let level = nesting.clamp(1, MAX_HEADER_LEVEL);
    let mut out = "#".repeat(level);
    out.push(' ');
    out.push_str(&paragraph(text, escape_underscores));
    out
}

/// Wraps text verbatim in a code fence.
#[must_use]
pub fn fenced(text: &str) -> String {
    format!("{FENCE}\n{text}\n{FENCE}\n")
}

/// Renders captured output as a fenced block with every line prefixed by `prefix`.
#[must_use]
pub fn result_block(text: &str, prefix: &str) -> String {
    let body = text
        .split('\n')
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n");
    fenced(&body)
}
