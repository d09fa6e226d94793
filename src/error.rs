//! Error types for the kcc compiler

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// kcc compilation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Source errors (accumulated as diagnostics)
    /// Lexical error encountered while scanning
    ///
    /// **Triggered by:** Unterminated block comments, bytes that start no token
    /// **Example:** `/* never closed`
    #[error("Lex error at line {line}, column {col}: {message}")]
    LexError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// Syntax error encountered during parsing
    ///
    /// **Triggered by:** Unexpected tokens, missing punctuation, malformed literals
    /// **Example:** `int main() { return 2 }` (missing `;`)
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// Semantic error encountered while resolving names and types
    ///
    /// **Triggered by:** Undefined type names, undefined identifiers, redefinitions
    /// **Example:** `int main() { int a; int a; }`
    /// **Prevention:** Declare each identifier once per scope; shadow in a nested block instead
    #[error("Semantic error at line {line}, column {col}: {message}")]
    SemanticError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    // Fatal errors
    /// Invariant violation in the parser's own bookkeeping
    #[error("Internal error: {0}")]
    InternalError(String),

    /// The emitter met a node it cannot lower
    #[error("Emit error: {0}")]
    EmitError(String),

    /// Compilation finished with diagnostics, so no assembly was produced
    #[error("Compilation failed with {} diagnostic(s)", .0.len())]
    CompilationFailed(Vec<Diagnostic>),

    /// Writing to the output sink failed
    #[error("I/O error: {0}")]
    Io(String),
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Fatal error that aborts the compilation immediately
    Fatal,
    /// Recoverable error recorded as a diagnostic while parsing continues
    Recoverable,
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::InternalError(msg.into())
    }

    /// Create an emit error with a message
    pub fn emit(msg: impl Into<String>) -> Self {
        Error::EmitError(msg.into())
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::LexError { .. } | Error::SyntaxError { .. } | Error::SemanticError { .. } => {
                ErrorSeverity::Recoverable
            }
            Error::InternalError(_)
            | Error::EmitError(_)
            | Error::CompilationFailed(_)
            | Error::Io(_) => ErrorSeverity::Fatal,
        }
    }

    /// Whether the parser may record this error and keep going
    pub fn is_recoverable(&self) -> bool {
        self.classify() == ErrorSeverity::Recoverable
    }

    /// Convert a recoverable error into a diagnostic for `module`.
    ///
    /// Returns `None` for fatal errors, which are never diagnostics.
    pub fn to_diagnostic(&self, module: &str) -> Option<Diagnostic> {
        let (kind, line, col, message) = match self {
            Error::LexError { line, col, message } => (DiagnosticKind::Lex, line, col, message),
            Error::SyntaxError { line, col, message } => {
                (DiagnosticKind::Syntax, line, col, message)
            }
            Error::SemanticError { line, col, message } => {
                (DiagnosticKind::Semantic, line, col, message)
            }
            _ => return None,
        };
        Some(Diagnostic {
            module: module.to_string(),
            line: *line,
            column: *col,
            kind,
            severity: Severity::Error,
            message: message.clone(),
        })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// Which compiler stage produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Produced by the scanner
    Lex,
    /// Produced by the parser's grammar rules
    Syntax,
    /// Produced by type/identifier resolution
    Semantic,
}

/// Whether a diagnostic fails the compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Fails the compilation
    Error,
    /// Reported, but does not fail the compilation
    Warning,
}

/// A reportable problem in the source, tagged with the module and line it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Module (translation unit) name
    pub module: String,
    /// Source line (1-indexed)
    pub line: usize,
    /// Source column (1-indexed)
    pub column: usize,
    /// Stage that produced the diagnostic
    pub kind: DiagnosticKind,
    /// Error or warning
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create a warning-level lexical diagnostic
    pub fn warning(module: &str, line: usize, column: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            module: module.to_string(),
            line,
            column,
            kind: DiagnosticKind::Lex,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiagnosticKind::Lex => write!(f, "lex"),
            DiagnosticKind::Syntax => write!(f, "syntax"),
            DiagnosticKind::Semantic => write!(f, "semantic"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{}:{}:{}: {} {}: {}",
            self.module, self.line, self.column, self.kind, level, self.message
        )
    }
}

/// Result type for kcc operations
pub type Result<T> = std::result::Result<T, Error>;
