//! Header doc-comment parsing and representation
//!
//! This module provides types and parsing logic for the documentation
//! attached to header declarations. It extracts structured entries from
//! `\param name text` commands, and recognizes the `[out]`/`[in]`
//! direction markers that some headers place at the start of a parameter
//! description.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Regex for `\param` (or `@param`) doc commands.
    static ref PARAM_REGEX: Regex = Regex::new(
        r"[\\@]param\s+(\w+)\s+([^\\@]*)"
    ).unwrap();
}

/// Direction hint carried by a parameter's doc comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DirectionHint {
    /// First text block starts with the literal `[in]` marker.
    In,
    /// First text block starts with the literal `[out]` marker.
    Out,
}

/// Documentation for a single parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDoc {
    /// Parameter name as written in the doc command.
    pub name: String,

    /// Free-text body of the entry.
    #[serde(default)]
    pub text: String,
}

impl ParamDoc {
    /// Create a new parameter doc entry.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Direction marker at the start of the first text block, if any.
    ///
    /// Anything other than a leading `[out]` or `[in]` yields `None`,
    /// leaving the caller's conservative input-output default in place.
    pub fn direction(&self) -> Option<DirectionHint> {
        let text = self.text.trim_start();
        if text.starts_with("[out]") {
            Some(DirectionHint::Out)
        } else if text.starts_with("[in]") {
            Some(DirectionHint::In)
        } else {
            None
        }
    }
}

/// Parsed documentation for a header declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderDoc {
    /// Main description text.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,

    /// Parameter-comment entries, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub params: Vec<ParamDoc>,
}

impl HeaderDoc {
    /// Create an empty doc.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from description text only.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            params: Vec::new(),
        }
    }

    /// Parse a raw doc comment into description and parameter entries.
    ///
    /// Handles `/** ... */` blocks with leading `*` gutters as well as
    /// plain text. Everything before the first doc command becomes the
    /// description.
    pub fn parse(comment: &str) -> Self {
        let cleaned = clean_comment(comment);

        let text = match cleaned.find(|c| c == '\\' || c == '@') {
            Some(0) => None,
            Some(idx) => Some(cleaned[..idx].trim().to_string()).filter(|t| !t.is_empty()),
            None => Some(cleaned.trim().to_string()).filter(|t| !t.is_empty()),
        };

        let params = PARAM_REGEX
            .captures_iter(&cleaned)
            .map(|cap| ParamDoc::new(&cap[1], cap[2].trim()))
            .collect();

        Self { text, params }
    }

    /// Whether the doc carries no content.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.params.is_empty()
    }

    /// Look up the entry for a parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamDoc> {
        self.params.iter().find(|p| p.name == name)
    }

    /// First sentence of the description, for summaries.
    pub fn summary(&self) -> Option<&str> {
        self.text.as_ref().map(|t| {
            if let Some(idx) = t.find(". ") {
                &t[..=idx]
            } else if let Some(idx) = t.find(".\n") {
                &t[..=idx]
            } else {
                t.as_str()
            }
        })
    }
}

/// Strip comment delimiters and per-line `*` gutters.
fn clean_comment(comment: &str) -> String {
    let body = comment
        .trim()
        .trim_start_matches("/**")
        .trim_start_matches("/*")
        .trim_end_matches("*/");

    body.lines()
        .map(|line| {
            let line = line.trim_start();
            line.strip_prefix('*').map(str::trim_start).unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
