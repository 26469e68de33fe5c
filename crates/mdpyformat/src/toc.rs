//! Table-of-contents generator for rendered markdown.
//!
//! Headers outside code fences get a numbered anchor (`s1`, `s1-2`, `s1-2-1`,
//! ...) and a matching TOC entry. The TOC goes right after the first line that
//! mentions `Table of Contents`, or at the very top when there is no such line.
//! A TOC left behind by an earlier run (the entry lines following the marker,
//! up to and including one blank line) is replaced, so running the generator
//! twice gives the same result.

use std::fmt;

use crate::markdown::FENCE;

/// Text that marks where the TOC is inserted.
pub const TOC_MARKER: &str = "Table of Contents";

/// Start of a TOC entry line.
const ENTRY_START: &str = "* [";

/// Deepest header level that gets a TOC entry.
const MAX_LEVEL: usize = 4;

/// Errors raised while generating a TOC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocError {
    /// A header is nested deeper than the generator supports.
    HeaderTooDeep { header: String },
}

impl fmt::Display for TocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderTooDeep { header } => {
                write!(f, "header levels greater than {MAX_LEVEL} are not supported: {header}")
            }
        }
    }
}

impl std::error::Error for TocError {}

/// Returns `markdown` with anchored headers and a table of contents.
pub fn generate(markdown: &str) -> Result<String, TocError> {
    let mut pieces: Vec<String> = Vec::new();
    let mut entries: Vec<String> = Vec::new();
    let mut numbering = Numbering::default();
    let mut insert_at: Option<usize> = None;
    let mut in_old_toc = false;

    let sections: Vec<&str> = markdown.split(FENCE).collect();
    for (index, section) in sections.iter().enumerate() {
        if index % 2 == 1 {
            // an unterminated fence runs to the end of the document
            if index + 1 == sections.len() {
                pieces.push(format!("{FENCE}{section}"));
            } else {
                pieces.push(format!("{FENCE}{section}{FENCE}"));
            }
            continue;
        }

        for line in section.split_inclusive('\n') {
            let content = line.trim_end_matches(['\n', '\r']);
            if in_old_toc {
                if content.trim_start().starts_with(ENTRY_START) {
                    continue;
                }
                in_old_toc = false;
                if content.trim().is_empty() {
                    continue;
                }
            }
            if insert_at.is_none() && content.contains(TOC_MARKER) {
                pieces.push(with_newline(line));
                insert_at = Some(pieces.len());
                in_old_toc = true;
            } else if content.starts_with('#') {
                let header = numbering.header(content)?;
                entries.push(header.entry());
                pieces.push(header.anchored_line(line.len() > content.len()));
            } else {
                pieces.push(line.to_owned());
            }
        }
    }

    if !entries.is_empty() || insert_at.is_some() {
        entries.push("\n".to_owned());
        let at = insert_at.unwrap_or(0);
        pieces.splice(at..at, entries);
    }
    Ok(pieces.concat())
}

fn with_newline(line: &str) -> String {
    if line.ends_with('\n') {
        line.to_owned()
    } else {
        format!("{line}\n")
    }
}

/// Per-level section counters.
#[derive(Debug, Default)]
struct Numbering {
    counters: [usize; MAX_LEVEL],
}

impl Numbering {
    fn header(&mut self, line: &str) -> Result<Header, TocError> {
        let clean = remove_anchors(line);
        let level = clean.chars().take_while(|c| *c == '#').count();
        if level > MAX_LEVEL {
            return Err(TocError::HeaderTooDeep { header: clean });
        }

        self.counters[level - 1] += 1;
        for deeper in &mut self.counters[level..] {
            *deeper = 0;
        }
        let id = self.counters[..level]
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("-");

        Ok(Header {
            level,
            id: format!("s{id}"),
            title: clean[level..].trim().to_owned(),
        })
    }
}

/// A numbered header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    level: usize,
    id: String,
    title: String,
}

impl Header {
    fn entry(&self) -> String {
        format!("{}* [{}](#{})\n", "  ".repeat(self.level - 1), self.title, self.id)
    }

    fn anchored_line(&self, newline: bool) -> String {
        let mut line = format!("{} <a id='{}' />{}", "#".repeat(self.level), self.id, self.title);
        if newline {
            line.push('\n');
        }
        line
    }
}

/// Strips `<...>` tags, e.g. anchors added by a previous run.
fn remove_anchors(text: &str) -> String {
    let mut out = text.to_owned();
    while let Some(open) = out.find('<') {
        let Some(close) = out[open..].find('>') else {
            break;
        };
        out.replace_range(open..=open + close, "");
    }
    out
}
