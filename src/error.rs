//! Error types for the parser
//!
//! Every failure is fatal: the first error of any kind aborts the parse and
//! no partial AST is returned.

use serde::Serialize;
use thiserror::Error;

/// Source position carried by every error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorLocation {
    /// Byte offset into the source text.
    pub index: u32,
    /// 1-based line number.
    pub line: u32,
    /// 0-based column number.
    pub column: u32,
}

impl std::fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Main error type for the parser.
///
/// The taxonomy mirrors where in the pipeline the problem was detected:
/// malformed tokens, token sequences matching no production, grammatically
/// valid code violating a binding/mode rule, and recursion-depth exhaustion.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("SyntaxError: {message} ({location})")]
    Lexical {
        message: String,
        location: ErrorLocation,
    },

    #[error("SyntaxError: {message} ({location})")]
    Syntax {
        message: String,
        location: ErrorLocation,
    },

    #[error("SyntaxError: {message} ({location})")]
    Semantic {
        message: String,
        location: ErrorLocation,
    },

    #[error("RangeError: maximum parse depth exceeded ({location})")]
    DepthExceeded { location: ErrorLocation },
}

impl ParseError {
    pub fn lexical(message: impl Into<String>, location: ErrorLocation) -> Self {
        ParseError::Lexical {
            message: message.into(),
            location,
        }
    }

    pub fn syntax(message: impl Into<String>, location: ErrorLocation) -> Self {
        ParseError::Syntax {
            message: message.into(),
            location,
        }
    }

    pub fn semantic(message: impl Into<String>, location: ErrorLocation) -> Self {
        ParseError::Semantic {
            message: message.into(),
            location,
        }
    }

    /// The position at which the error was detected.
    pub fn location(&self) -> ErrorLocation {
        match self {
            ParseError::Lexical { location, .. }
            | ParseError::Syntax { location, .. }
            | ParseError::Semantic { location, .. }
            | ParseError::DepthExceeded { location } => *location,
        }
    }

    /// The human-readable message without the location suffix.
    pub fn message(&self) -> String {
        match self {
            ParseError::Lexical { message, .. }
            | ParseError::Syntax { message, .. }
            | ParseError::Semantic { message, .. } => message.clone(),
            ParseError::DepthExceeded { .. } => "maximum parse depth exceeded".to_string(),
        }
    }
}
