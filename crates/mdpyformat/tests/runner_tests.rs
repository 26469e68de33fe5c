//! Tests for the literate snippet runner: rendering layout, namespace sharing,
//! output capture and failure reports.

use mdpyformat::{Namespace, RenderConfig, RenderError, SnippetFailure, eval_and_quote, run_snippet};
use pretty_assertions::assert_eq;

/// Renders `snippets` in order into one buffer, stopping at the first failure.
fn render_all(snippets: &[&str]) -> (String, Result<(), RenderError>) {
    let config = RenderConfig::default();
    let mut namespace = Namespace::from_config(&config);
    let mut out = Vec::new();
    let mut result = Ok(());
    for snippet in snippets {
        result = eval_and_quote(&mut out, &mut namespace, snippet, &config);
        if result.is_err() {
            break;
        }
    }
    (String::from_utf8(out).unwrap(), result)
}

// =============================================================================
// 1. Successful snippets
// =============================================================================

/// A snippet without output renders only its source.
#[test]
fn silent_snippet_has_no_result_block() {
    let (out, result) = render_all(&["x = 5"]);
    assert!(result.is_ok(), "assignment should succeed: {result:?}");
    assert_eq!(out, "\n```\nx = 5\n```\n");
}

/// Stdout follows the source as a prefixed, fenced block.
#[test]
fn printed_output_is_quoted_below_the_source() {
    let (out, result) = render_all(&["print('a')\nprint('b')"]);
    assert!(result.is_ok(), "printing should succeed: {result:?}");
    assert_eq!(out, "\n```\nprint('a')\nprint('b')\n```\n\n```\n>> a\n>> b\n```\n");
}

/// Bindings made by one snippet are visible to the next.
#[test]
fn namespace_is_shared_between_snippets() {
    let (out, result) = render_all(&["x = 5", "print(x)"]);
    assert!(result.is_ok(), "both snippets should succeed: {result:?}");
    assert_eq!(out, "\n```\nx = 5\n```\n\n```\nprint(x)\n```\n\n```\n>> 5\n```\n");
}

/// Functions and classes defined earlier can be used later.
#[test]
fn definitions_survive_across_snippets() {
    let (out, result) = render_all(&[
        "class Counter:\n    def __init__(self):\n        self.count = 0\n    def __call__(self):\n        self.count += 1\n        return self.count",
        "c = Counter()\nc()\nc()\nprint('count:', c.count)",
    ]);
    assert!(result.is_ok(), "class snippets should succeed: {result:?}");
    assert!(out.ends_with("```\n>> count: 2\n```\n"), "unexpected rendering:\n{out}");
}

/// A configured prefix replaces the default marker.
#[test]
fn custom_result_prefix() {
    let config = RenderConfig {
        result_prefix: "| ".to_owned(),
        ..RenderConfig::default()
    };
    let mut namespace = Namespace::from_config(&config);
    let mut out = Vec::new();
    eval_and_quote(&mut out, &mut namespace, "print(1 + 1)", &config).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "\n```\nprint(1 + 1)\n```\n\n```\n| 2\n```\n");
}

/// Trailing whitespace of captured output is not rendered.
#[test]
fn trailing_blank_lines_are_trimmed() {
    let (out, _) = render_all(&["print('x')\nprint()\nprint()"]);
    assert!(out.ends_with("```\n>> x\n```\n"), "unexpected rendering:\n{out}");
}

/// Snippet code can call the markdown functions; their text joins its stdout.
#[test]
fn markdown_calls_inside_snippets() {
    let snippet = "print('a')\nheader_md('Step __one__', 2)\nprint_md('from', 'snippet_code')\nprint_quoted('x = 1')\nprint('b')";
    let (out, result) = render_all(&[snippet]);
    assert!(result.is_ok(), "markdown calls should succeed: {result:?}");
    assert!(
        out.ends_with("```\n>> a\n>> ## Step \\_\\_one\\_\\_\n>> from snippet\\_code\n>> ```\n>> x = 1\n>> ```\n>> b\n```\n"),
        "markdown should be quoted in call order:\n{out}"
    );
}

/// A bad argument to a markdown function raises `TypeError` in the snippet.
#[test]
fn markdown_call_with_bad_argument() {
    let mut namespace = Namespace::default();
    let outcome = run_snippet(
        &mut namespace,
        "try:\n    header_md('T', nesting='deep')\nexcept TypeError as exc:\n    print('caught:', exc)",
    );
    assert!(outcome.is_success(), "the snippet handles the error: {:?}", outcome.failure);
    assert_eq!(outcome.output.stdout(), "caught: header_md() nesting must be int, not str");

    let outcome = run_snippet(&mut namespace, "eval_and_quote('x = 1')");
    let Some(SnippetFailure::Runtime(failure)) = outcome.failure else {
        panic!("snippets cannot nest snippets, got {:?}", outcome.failure);
    };
    assert!(failure.message.starts_with("NameError"), "got {}", failure.message);
}

// =============================================================================
// 2. Failures
// =============================================================================

/// A runtime error renders the output printed before it, then the failure report.
#[test]
fn runtime_error_after_output() {
    let snippet = "print('hi')\nraise ValueError('boom')";
    let (out, result) = render_all(&[snippet]);

    let Err(RenderError::Snippet(SnippetFailure::Runtime(failure))) = result else {
        panic!("expected a runtime failure, got {result:?}");
    };
    assert_eq!(failure.message, "ValueError: boom");
    let innermost = failure.trace.last().expect("trace should have at least one frame");
    assert_eq!(innermost.line_number, 2, "failure should point at the raise");
    assert_eq!(innermost.line_text, "raise ValueError('boom')");

    assert!(
        out.starts_with("\n```\nprint('hi')\nraise ValueError('boom')\n```\n\n```\n>> hi\n```\n\n```\n>> Traceback"),
        "source, stdout block and stderr block should appear in order:\n{out}"
    );
    assert!(out.contains(">> ValueError: boom\n```\n"), "report should end with the summary:\n{out}");
    assert!(out.contains(">>     raise ValueError('boom')"), "report should quote the line:\n{out}");
}

/// Each frame of a nested call maps back to a line of the snippet.
#[test]
fn trace_lists_each_frame() {
    let snippet = "def inner():\n    raise KeyError('k')\n\ndef outer():\n    inner()\n\nouter()";
    let mut namespace = Namespace::default();
    let outcome = run_snippet(&mut namespace, snippet);

    let Some(SnippetFailure::Runtime(failure)) = outcome.failure else {
        panic!("expected a runtime failure, got {:?}", outcome.failure);
    };
    let frames: Vec<(&str, usize, &str)> = failure
        .trace
        .iter()
        .map(|entry| (entry.frame_name.as_str(), entry.line_number, entry.line_text.trim()))
        .collect();
    assert_eq!(
        frames,
        vec![
            ("<module>", 7, "outer()"),
            ("outer", 5, "inner()"),
            ("inner", 2, "raise KeyError('k')"),
        ]
    );
    for entry in &failure.trace {
        let expected = snippet.lines().nth(entry.line_number - 1).unwrap();
        assert_eq!(entry.line_text, expected, "line text should be the snippet's own line");
    }
}

/// A frame inside a function from an earlier snippet quotes that snippet's line.
#[test]
fn trace_reaches_into_earlier_snippet() {
    let mut namespace = Namespace::default();
    let definition = run_snippet(&mut namespace, "a = 1\nb = 2\nc = 3\ndef f(): raise ValueError('x')");
    assert!(definition.is_success(), "definition should succeed: {:?}", definition.failure);

    let outcome = run_snippet(&mut namespace, "f()");
    let Some(SnippetFailure::Runtime(failure)) = outcome.failure else {
        panic!("expected a runtime failure, got {:?}", outcome.failure);
    };
    assert_eq!(failure.message, "ValueError: x");
    let frames: Vec<(&str, usize, &str)> = failure
        .trace
        .iter()
        .map(|entry| (entry.frame_name.as_str(), entry.line_number, entry.line_text.trim()))
        .collect();
    assert_eq!(
        frames,
        vec![("<module>", 1, "f()"), ("f", 4, "def f(): raise ValueError('x')")],
        "the inner frame's line lies beyond the one-line snippet"
    );
}

/// A parse error reports the 1-based line and its literal text.
#[test]
fn syntax_error_reports_line() {
    let snippet = "x = 1\ny = 2\nif x ==:\n    pass";
    let (out, result) = render_all(&[snippet]);

    let Err(RenderError::Snippet(SnippetFailure::Syntax(failure))) = result else {
        panic!("expected a syntax failure, got {result:?}");
    };
    assert_eq!(failure.line_number, 3);
    assert_eq!(failure.line_text, "if x ==:");
    assert!(failure.message.starts_with("SyntaxError"), "got {}", failure.message);
    assert!(out.contains(">>   line 3: if x ==:"), "report should name the line:\n{out}");
}

/// Nothing of a snippet that fails to parse is executed.
#[test]
fn syntax_error_runs_nothing() {
    let mut namespace = Namespace::default();
    let outcome = run_snippet(&mut namespace, "print('never')\nz = (");
    assert!(!outcome.is_success());
    assert_eq!(outcome.output.stdout(), "", "no statement should have run");
    assert!(!namespace.contains("z"));
}

/// A configured operation budget stops a runaway snippet.
#[test]
fn resource_limit_stops_snippet() {
    let config = RenderConfig {
        max_operations: Some(10_000),
        ..RenderConfig::default()
    };
    let mut namespace = Namespace::from_config(&config);
    let outcome = run_snippet(&mut namespace, "while True:\n    pass");
    assert!(!outcome.is_success(), "infinite loop should be stopped");
    assert!(!outcome.output.stderr().is_empty(), "the stop should be reported");
}

// =============================================================================
// 3. Capture isolation
// =============================================================================

/// Output of one snippet never shows up in another's result block.
#[test]
fn capture_is_per_snippet() {
    let mut namespace = Namespace::default();
    let first = run_snippet(&mut namespace, "print('A')");
    let second = run_snippet(&mut namespace, "print('B')");
    assert_eq!(first.output.stdout(), "A");
    assert_eq!(second.output.stdout(), "B");
}

/// After a failure the next snippet starts with clean sinks.
#[test]
fn capture_released_after_failure() {
    let mut namespace = Namespace::default();
    let failed = run_snippet(&mut namespace, "print('before')\n1 / 0");
    assert!(failed.failure.is_some());
    assert!(failed.output.stderr().contains("ZeroDivisionError"));

    let next = run_snippet(&mut namespace, "print('after')");
    assert!(next.is_success());
    assert_eq!(next.output.stdout(), "after");
    assert_eq!(next.output.stderr(), "", "no diagnostics should leak into the next snippet");
}

/// State created before a failure is still there afterwards.
#[test]
fn bindings_before_failure_persist() {
    let mut namespace = Namespace::default();
    let outcome = run_snippet(&mut namespace, "kept = 1\nraise RuntimeError('stop')\nlost = 2");
    assert!(!outcome.is_success());
    assert!(namespace.contains("kept"), "kept should be bound");
    assert!(!namespace.contains("lost"), "lost should never be bound");
    assert_eq!(namespace.executed(), 1);
}
