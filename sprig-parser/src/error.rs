// sprig-parser - Reader errors
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Errors raised while tokenizing and reading source text.

use std::fmt;

use thiserror::Error;

use crate::meta::SourcePos;

/// Result type for tokenizing and reading.
pub type Result<T> = std::result::Result<T, ReadError>;

/// Which stage rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadErrorKind {
    /// Malformed characters, such as an unterminated string or bad escape.
    Lex,
    /// Well-formed tokens in an invalid arrangement.
    Parse,
    /// Input ended inside a form. Tolerant readers recover from this one.
    Eof,
}

impl fmt::Display for ReadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReadErrorKind::Lex => "Lexer error",
            ReadErrorKind::Parse => "Parse error",
            ReadErrorKind::Eof => "EOF error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}: {message}", .pos.as_ref().map(|p| format!(" at {p}")).unwrap_or_default())]
pub struct ReadError {
    pub kind: ReadErrorKind,
    pub message: String,
    pub pos: Option<SourcePos>,
}

impl ReadError {
    pub fn lex(message: impl Into<String>, pos: SourcePos) -> Self {
        ReadError {
            kind: ReadErrorKind::Lex,
            message: message.into(),
            pos: Some(pos),
        }
    }

    pub fn parse(message: impl Into<String>, pos: Option<SourcePos>) -> Self {
        ReadError {
            kind: ReadErrorKind::Parse,
            message: message.into(),
            pos,
        }
    }

    pub fn eof(message: impl Into<String>, pos: Option<SourcePos>) -> Self {
        ReadError {
            kind: ReadErrorKind::Eof,
            message: message.into(),
            pos,
        }
    }

    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.kind == ReadErrorKind::Eof
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_display_with_position() {
        let err = ReadError::lex(
            "unterminated string",
            SourcePos::new(Arc::from("a.sprig"), 2, 5, 10),
        );
        assert_eq!(
            err.to_string(),
            "Lexer error at a.sprig:2:5: unterminated string"
        );
    }

    #[test]
    fn test_display_without_position() {
        let err = ReadError::eof("unexpected end of input", None);
        assert!(err.is_eof());
        assert_eq!(err.to_string(), "EOF error: unexpected end of input");
    }
}
