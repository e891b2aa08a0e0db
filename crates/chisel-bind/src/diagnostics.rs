//! Error types and diagnostics
//!
//! This module provides error handling for the binding generator, plus the
//! diagnostic messages reported by the header-parsing collaborator. Any
//! error-severity diagnostic suppresses emission for the whole run.

use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use thiserror::Error;

/// Result type for chisel-bind operations
pub type BindResult<T> = Result<T, BindError>;

/// Main error type for chisel-bind
#[derive(Debug, Error)]
pub enum BindError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Header AST document could not be deserialized
    #[error("AST error in {file}: {message}")]
    Ast {
        /// The document that failed to load.
        file: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The parser collaborator reported error-severity diagnostics
    #[error("header conversion failed with {0} error(s)")]
    Conversion(usize),

    /// A rule or macro rule carried an invalid regex pattern
    #[error("invalid rule pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// Regex compile error text.
        message: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Input file not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl BindError {
    /// Create an AST load error
    pub fn ast(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        BindError::Ast {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        BindError::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        BindError::Other(message.into())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticSeverity {
    /// Error - suppresses emission
    Error,
    /// Warning - generation continues
    Warning,
    /// Info - informational message
    Info,
    /// Hint - suggestion
    Hint,
}

impl DiagnosticSeverity {
    /// Get display string
    pub fn display(&self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
            DiagnosticSeverity::Hint => "hint",
        }
    }

    /// Terminal color for this severity
    fn color(&self) -> Color {
        match self {
            DiagnosticSeverity::Error => Color::Red,
            DiagnosticSeverity::Warning => Color::Yellow,
            DiagnosticSeverity::Info => Color::Blue,
            DiagnosticSeverity::Hint => Color::Cyan,
        }
    }
}

/// A diagnostic message from parsing or conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Message
    pub message: String,
    /// Source file
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file: Option<PathBuf>,
    /// Line number (1-indexed)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line: Option<usize>,
    /// Column number (0-indexed)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub col: Option<usize>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            file: None,
            line: None,
            col: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Error, message)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, message)
    }

    /// Create an info diagnostic
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Info, message)
    }

    /// Set the source file
    pub fn in_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the location
    pub fn at(mut self, line: usize, col: usize) -> Self {
        self.line = Some(line);
        self.col = Some(col);
        self
    }

    /// Format the diagnostic for display
    pub fn format(&self) -> String {
        let mut result = String::new();

        if let Some(ref file) = self.file {
            result.push_str(&file.display().to_string());
            if let Some(line) = self.line {
                result.push(':');
                result.push_str(&line.to_string());
                if let Some(col) = self.col {
                    result.push(':');
                    result.push_str(&col.to_string());
                }
            }
            result.push_str(": ");
        }

        result.push_str(self.severity.display());
        result.push_str(": ");
        result.push_str(&self.message);

        result
    }
}

/// Collection of diagnostics for a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    messages: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.messages.push(diagnostic);
    }

    /// All messages, in report order
    pub fn messages(&self) -> &[Diagnostic] {
        &self.messages
    }

    /// Error-severity messages only
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// Number of error-severity messages
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Whether any error-severity message is present
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Print every error-severity message to stderr, colored when the
    /// terminal supports it.
    pub fn print_errors(&self) {
        let mut stderr = StandardStream::stderr(ColorChoice::Auto);
        for diagnostic in self.errors() {
            if Self::write_colored(&mut stderr, diagnostic).is_err() {
                eprintln!("{}", diagnostic.format());
            }
        }
    }

    fn write_colored<W: WriteColor>(w: &mut W, diagnostic: &Diagnostic) -> std::io::Result<()> {
        if let Some(ref file) = diagnostic.file {
            w.set_color(ColorSpec::new().set_dimmed(true))?;
            write!(w, "{}", file.display())?;
            if let Some(line) = diagnostic.line {
                write!(w, ":{line}")?;
                if let Some(col) = diagnostic.col {
                    write!(w, ":{col}")?;
                }
            }
            write!(w, ": ")?;
            w.reset()?;
        }

        w.set_color(ColorSpec::new().set_fg(Some(diagnostic.severity.color())).set_bold(true))?;
        write!(w, "{}", diagnostic.severity.display())?;
        w.reset()?;
        writeln!(w, ": {}", diagnostic.message)?;
        Ok(())
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_diagnostic_format() {
        let d = Diagnostic::error("unexpected token").in_file("phonon.h").at(12, 4);
        assert_eq!(d.format(), "phonon.h:12:4: error: unexpected token");
    }

    #[test]
    fn test_diagnostic_format_no_location() {
        let d = Diagnostic::warning("deprecated declaration");
        assert_eq!(d.format(), "warning: deprecated declaration");
    }

    #[test]
    fn test_diagnostics_error_gate() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning("ignored"));
        assert!(!diagnostics.has_errors());

        diagnostics.push(Diagnostic::error("fatal"));
        diagnostics.push(Diagnostic::error("also fatal"));
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.error_count(), 2);
    }
}
