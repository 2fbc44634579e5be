use thiserror::Error;

use super::lexer::TokenKind;

/// Broad category of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A character no token pattern accepts.
    Lexical,
    /// The token stream violates the grammar.
    Syntax,
    /// A well-formed formula refers to the wrong variable.
    Semantic,
}

/// Failure to turn a formula into an expression tree.
///
/// Messages are meant to be shown to the user as is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Lexical error: unexpected token {found}")]
    Lexical { found: char, offset: usize },

    #[error("Unexpected token {found}")]
    UnexpectedToken { found: TokenKind, offset: usize },

    #[error("Unexpected end of input")]
    UnexpectedEnd,

    #[error("Expected {expected}, got {}", describe(.found))]
    Expected {
        expected: String,
        found: Option<TokenKind>,
        offset: usize,
    },

    #[error("Expected terminator, got {found}")]
    TrailingInput { found: TokenKind, offset: usize },

    #[error("Unexpected variable {found}, expected {expected}")]
    VariableMismatch {
        found: char,
        expected: char,
        offset: usize,
    },

    #[error("Expression nested too deeply")]
    TooDeep { offset: usize },
}

fn describe(found: &Option<TokenKind>) -> String {
    match found {
        Some(kind) => kind.to_string(),
        None => "end of input".to_string(),
    }
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Lexical { .. } => ErrorKind::Lexical,
            ParseError::VariableMismatch { .. } => ErrorKind::Semantic,
            ParseError::UnexpectedToken { .. }
            | ParseError::UnexpectedEnd
            | ParseError::Expected { .. }
            | ParseError::TrailingInput { .. }
            | ParseError::TooDeep { .. } => ErrorKind::Syntax,
        }
    }

    /// Byte offset of the offending input, when the error points at one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::Lexical { offset, .. }
            | ParseError::UnexpectedToken { offset, .. }
            | ParseError::Expected { offset, .. }
            | ParseError::TrailingInput { offset, .. }
            | ParseError::VariableMismatch { offset, .. }
            | ParseError::TooDeep { offset } => Some(*offset),
            ParseError::UnexpectedEnd => None,
        }
    }
}
