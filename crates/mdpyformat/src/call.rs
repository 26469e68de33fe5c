//! Argument checking for the markdown functions Python code can call.
//!
//! Both the literate script and the snippets it runs call these functions as
//! interpreter externals. A call arrives as positional and keyword [`Object`]s
//! and is checked here against the Python signature:
//!
//! ```python
//! header_md(text, nesting=1)
//! print_md(*args)
//! print_quoted(*args)
//! eval_and_quote(code)
//! ```
//!
//! A rejected call comes back as the message of the `TypeError` raised in the
//! caller's code.

use ouros::{ExcType, Exception, ExternalResult, Object};

use crate::markdown;

/// A validated call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MarkdownCall {
    Header { text: String, nesting: usize },
    Markdown(Vec<String>),
    Quoted(Vec<String>),
    Snippet(String),
}

impl MarkdownCall {
    pub(crate) fn parse(function_name: &str, args: &[Object], kwargs: &[(Object, Object)]) -> Result<Self, String> {
        match function_name {
            "header_md" => {
                let text = match args.first() {
                    Some(Object::String(text)) => text.clone(),
                    Some(other) => other.to_string(),
                    None => return Err("header_md() missing required argument: 'text'".to_owned()),
                };
                let nesting = match (args.get(1), keyword(kwargs, "nesting")) {
                    (Some(_), Some(_)) => {
                        return Err("header_md() got multiple values for argument 'nesting'".to_owned());
                    }
                    (Some(value), None) | (None, Some(value)) => nesting_level(value)?,
                    (None, None) => 1,
                };
                if args.len() > 2 {
                    return Err(format!("header_md() takes at most 2 arguments ({} given)", args.len()));
                }
                reject_other_keywords("header_md", kwargs, &["nesting"])?;
                Ok(Self::Header { text, nesting })
            }
            "print_md" => {
                reject_other_keywords("print_md", kwargs, &[])?;
                Ok(Self::Markdown(args.iter().map(ToString::to_string).collect()))
            }
            "print_quoted" => {
                reject_other_keywords("print_quoted", kwargs, &[])?;
                Ok(Self::Quoted(args.iter().map(ToString::to_string).collect()))
            }
            "eval_and_quote" => {
                reject_other_keywords("eval_and_quote", kwargs, &[])?;
                match args {
                    [Object::String(code)] => Ok(Self::Snippet(code.clone())),
                    [other] => Err(format!("eval_and_quote() argument must be str, not {}", type_label(other))),
                    _ => Err(format!("eval_and_quote() takes exactly 1 argument ({} given)", args.len())),
                }
            }
            other => Err(format!("'{other}' is not a literate script function")),
        }
    }

    /// Markdown text of a prose call; `None` for a snippet.
    pub(crate) fn render(&self, escape_underscores: bool) -> Option<String> {
        match self {
            Self::Header { text, nesting } => Some(markdown::header(text, *nesting, escape_underscores)),
            Self::Markdown(parts) => Some(markdown::paragraph(&markdown::join_args(parts), escape_underscores)),
            Self::Quoted(parts) => Some(markdown::fenced(&markdown::join_args(parts))),
            Self::Snippet(_) => None,
        }
    }
}

/// Result that raises `TypeError(message)` in the calling code.
pub(crate) fn type_error(message: String) -> ExternalResult {
    ExternalResult::Error(Exception::new(ExcType::TypeError, Some(message)))
}

fn keyword<'a>(kwargs: &'a [(Object, Object)], name: &str) -> Option<&'a Object> {
    kwargs.iter().find_map(|(key, value)| match key {
        Object::String(key) if key == name => Some(value),
        _ => None,
    })
}

fn reject_other_keywords(function: &str, kwargs: &[(Object, Object)], allowed: &[&str]) -> Result<(), String> {
    for (key, _) in kwargs {
        let key = key.to_string();
        if !allowed.contains(&key.as_str()) {
            return Err(format!("{function}() got an unexpected keyword argument '{key}'"));
        }
    }
    Ok(())
}

fn nesting_level(value: &Object) -> Result<usize, String> {
    match value {
        Object::Int(level) if *level >= 1 => usize::try_from(*level).map_err(|err| err.to_string()),
        Object::Int(level) => Err(format!("header_md() nesting must be at least 1, got {level}")),
        other => Err(format!("header_md() nesting must be int, not {}", type_label(other))),
    }
}

fn type_label(value: &Object) -> &'static str {
    match value {
        Object::None => "NoneType",
        Object::Bool(_) => "bool",
        Object::Int(_) | Object::BigInt(_) => "int",
        Object::Float(_) => "float",
        Object::String(_) => "str",
        Object::Bytes(_) => "bytes",
        Object::List(_) => "list",
        Object::Tuple(_) => "tuple",
        Object::Dict(_) => "dict",
        _ => "object",
    }
}
