//! Error handling for basic2c

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Which pipeline phase an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    CodeGen,
    Io,
}

/// Compiler error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexer Errors ====================

    #[error("Unexpected character '{ch}' at position {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("Unterminated string literal starting at position {offset}")]
    UnterminatedString { offset: usize },

    #[error("Integer literal {text} does not fit in a target int")]
    IntegerOverflow { text: String, span: Span },

    // ==================== Parser Errors ====================

    #[error("Unexpected token: expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Expected line number, got {got}")]
    ExpectedLineNumber { got: String, span: Span },

    #[error("Unknown statement starting with {got}")]
    UnknownStatement { got: String, span: Span },

    #[error("FOR {var} at line {line} has no matching NEXT {var}")]
    UnterminatedFor { var: String, line: u32, span: Span },

    #[error("Nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize, span: Span },

    // ==================== Backend Errors ====================

    #[error("Code generation error: {0}")]
    CodeGen(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedChar { offset, .. } => Some(Span::new(*offset, *offset + 1)),
            Self::UnterminatedString { offset } => Some(Span::new(*offset, *offset + 1)),
            Self::IntegerOverflow { span, .. } => Some(*span),
            Self::UnexpectedToken { span, .. } => Some(*span),
            Self::ExpectedLineNumber { span, .. } => Some(*span),
            Self::UnknownStatement { span, .. } => Some(*span),
            Self::UnterminatedFor { span, .. } => Some(*span),
            Self::NestingTooDeep { span, .. } => Some(*span),
            Self::CodeGen(_) | Self::Io(_) => None,
        }
    }

    /// Classify the error by pipeline phase
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnexpectedChar { .. }
            | Self::UnterminatedString { .. }
            | Self::IntegerOverflow { .. } => ErrorKind::Lexical,
            Self::UnexpectedToken { .. }
            | Self::ExpectedLineNumber { .. }
            | Self::UnknownStatement { .. }
            | Self::UnterminatedFor { .. }
            | Self::NestingTooDeep { .. } => ErrorKind::Syntax,
            Self::CodeGen(_) => ErrorKind::CodeGen,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
