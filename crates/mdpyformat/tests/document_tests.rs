//! Tests for the document writer.

use mdpyformat::{Document, RenderConfig, RenderError};
use ouros::Object;
use pretty_assertions::assert_eq;

fn document() -> Document<Vec<u8>> {
    Document::new(Vec::new(), RenderConfig::default())
}

fn text(document: Document<Vec<u8>>) -> String {
    String::from_utf8(document.finish().unwrap()).unwrap()
}

/// Prose, headers and snippets come out in the order they were added.
#[test]
fn mixed_document() {
    let mut doc = document();
    doc.header_md("Callable objects", 2).unwrap();
    doc.print_md(&["Any object defining", "__call__", "can be called."]).unwrap();
    doc.eval_and_quote("def greet(name):\n    print('hello', name)").unwrap();
    doc.eval_and_quote("greet('world')").unwrap();

    assert_eq!(doc.snippets_run(), 2);
    assert_eq!(
        text(doc),
        "## Callable objects\n\
         Any object defining \\_\\_call\\_\\_ can be called.\n\
         \n```\ndef greet(name):\n    print('hello', name)\n```\n\
         \n```\ngreet('world')\n```\n\
         \n```\n>> hello world\n```\n"
    );
}

/// Quoted text is fenced and never escaped.
#[test]
fn print_quoted_is_verbatim() {
    let mut doc = document();
    doc.print_quoted(&["__init__", "__new__"]).unwrap();
    assert_eq!(text(doc), "```\n__init__ __new__\n```\n");
}

/// Escaping can be turned off.
#[test]
fn escaping_is_configurable() {
    let config = RenderConfig {
        escape_underscores: false,
        ..RenderConfig::default()
    };
    let mut doc = Document::new(Vec::new(), config);
    doc.print_md(&["snake_case"]).unwrap();
    assert_eq!(text(doc), "snake_case\n");
}

/// A failed snippet halts the document; later snippets do not run.
#[test]
fn failure_halts_document() {
    let mut doc = document();
    let err = doc.eval_and_quote("raise TypeError('bad')").unwrap_err();
    assert!(matches!(err, RenderError::Snippet(_)), "got {err:?}");
    assert!(doc.is_halted());

    let err = doc.eval_and_quote("never_bound = 1").unwrap_err();
    assert!(matches!(err, RenderError::Halted), "got {err:?}");
    assert!(!doc.namespace().contains("never_bound"));
    assert_eq!(doc.snippets_run(), 1, "the refused snippet should not count");

    let out = String::from_utf8(doc.into_inner()).unwrap();
    assert!(out.contains(">> TypeError: bad"), "failure report should be rendered:\n{out}");
    assert!(!out.contains("never_bound"), "refused snippet should not be rendered:\n{out}");
}

/// The namespace can be inspected between snippets.
#[test]
fn namespace_inspection() {
    let mut doc = document();
    doc.eval_and_quote("answer = 6 * 7").unwrap();
    assert_eq!(doc.namespace().get("answer"), Some(Object::Int(42)));
    let names: Vec<String> = doc.namespace().variables().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["answer".to_owned()]);
}

/// Host values bound into the namespace are visible to later snippets.
#[test]
fn namespace_accepts_host_values() {
    let mut doc = document();
    doc.namespace_mut().set("limit", Object::Int(4)).unwrap();
    doc.eval_and_quote("print(sum(range(limit)))").unwrap();
    assert_eq!(doc.config().result_prefix, ">> ");
    assert!(text(doc).ends_with("```\n>> 6\n```\n"));
}

/// The failure's display is a one-line summary.
#[test]
fn render_error_display() {
    let mut doc = document();
    let err = doc.eval_and_quote("x = 1\ny = x / 0").unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("snippet failed: ZeroDivisionError"), "got {message}");
    assert!(message.ends_with("(line 2)"), "got {message}");
}
