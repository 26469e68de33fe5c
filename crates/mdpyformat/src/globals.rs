//! Carries the literate script's globals over to its snippets.
//!
//! The script and its snippets run in two interpreter sessions, because a
//! session paused at an `eval_and_quote` call cannot execute anything else. To
//! let snippets use what the script set up, the driver:
//!
//! - replays the script's top-level `import` statements in the snippet namespace
//!   before the script starts;
//! - copies every script global holding plain data (numbers, strings,
//!   containers) into the snippet namespace before each snippet runs, whenever
//!   its value changed since the last copy.
//!
//! Functions, classes and instances defined by the script are not copied; the
//! snippets that use them define them themselves.
//!
//! Imports of the helper module (`from mdformat import *` in older tutorials)
//! are blanked out, since the markdown functions are provided by the driver.

use std::{borrow::Cow, collections::HashMap};

use ouros::{Object, ReplSession};

use crate::namespace::Namespace;

/// Module names under which tutorials import the markdown helpers.
const HELPER_MODULES: [&str; 2] = ["mdformat", "mdpyformat"];

/// Values already copied from the script to the snippet namespace.
#[derive(Debug, Default)]
pub(crate) struct SharedGlobals {
    shared: HashMap<String, Object>,
}

impl SharedGlobals {
    /// Copies the script's changed data globals into `namespace`.
    pub(crate) fn share(&mut self, script: &ReplSession, namespace: &mut Namespace) {
        for (name, type_name) in script.list_variables() {
            if type_name == "module" {
                continue;
            }
            let Some(value) = script.get_variable(&name) else {
                continue;
            };
            if self.shared.get(&name) == Some(&value) {
                continue;
            }
            match namespace.set(&name, value.clone()) {
                Ok(()) => {
                    log::debug!("shared script global `{name}` ({type_name}) with snippets");
                    self.shared.insert(name, value);
                }
                Err(err) => log::debug!("script global `{name}` stays private: {err}"),
            }
        }
    }
}

/// Replays the script's top-level imports in `namespace`.
///
/// An import that fails here fails in the script too, so errors are only logged.
pub(crate) fn replay_imports(source: &str, namespace: &mut Namespace) {
    for statement in top_level_imports(source) {
        if let Err(err) = namespace.run_setup(&statement) {
            log::debug!("import `{statement}` not available to snippets: {err}");
        }
    }
}

/// Blanks out top-level imports of the helper module, keeping line numbers intact.
pub(crate) fn strip_helper_imports(source: &str) -> Cow<'_, str> {
    let helper_lines: Vec<usize> = top_level_lines(source)
        .filter(|(_, line)| imports_helper(line))
        .map(|(index, _)| index)
        .collect();
    if helper_lines.is_empty() {
        return Cow::Borrowed(source);
    }
    let stripped: Vec<&str> = source
        .split('\n')
        .enumerate()
        .map(|(index, line)| if helper_lines.contains(&index) { "" } else { line })
        .collect();
    Cow::Owned(stripped.join("\n"))
}

fn imports_helper(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["from", module, "import", ..] => HELPER_MODULES.contains(module),
        ["import", module, ..] => HELPER_MODULES.contains(&module.trim_end_matches(',')),
        _ => false,
    }
}

/// Top-level `import` and `from ... import` statements, continuation lines included.
pub(crate) fn top_level_imports(source: &str) -> Vec<String> {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut statements = Vec::new();
    for (index, line) in top_level_lines(source) {
        let is_import = line.starts_with("import ") || (line.starts_with("from ") && line.contains(" import "));
        if !is_import || imports_helper(line) {
            continue;
        }
        let mut statement = line.trim_end_matches('\r').to_owned();
        let mut next = index + 1;
        while continues(&statement) {
            let Some(more) = lines.get(next) else {
                break;
            };
            statement.push('\n');
            statement.push_str(more.trim_end_matches('\r'));
            next += 1;
        }
        statements.push(statement);
    }
    statements
}

/// True while a statement has an open parenthesis or ends in a backslash.
fn continues(statement: &str) -> bool {
    statement.ends_with('\\') || statement.matches('(').count() > statement.matches(')').count()
}

/// Unindented lines outside triple-quoted strings, with their 0-based index.
fn top_level_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut open_quote: Option<&'static str> = None;
    source.split('\n').enumerate().filter_map(move |(index, line)| {
        let top_level = open_quote.is_none() && !line.starts_with([' ', '\t']) && !line.trim().is_empty();
        open_quote = track_triple_quotes(line, open_quote);
        top_level.then_some((index, line))
    })
}

/// Returns the triple quote still open at the end of `line`.
fn track_triple_quotes(line: &str, mut open: Option<&'static str>) -> Option<&'static str> {
    let mut rest = line;
    loop {
        let next = match open {
            Some(quote) => rest.find(quote).map(|at| (at, quote)),
            None => ["\"\"\"", "'''"]
                .into_iter()
                .filter_map(|quote| rest.find(quote).map(|at| (at, quote)))
                .min_by_key(|(at, _)| *at),
        };
        let Some((at, quote)) = next else {
            return open;
        };
        open = if open.is_some() { None } else { Some(quote) };
        rest = &rest[at + quote.len()..];
    }
}
