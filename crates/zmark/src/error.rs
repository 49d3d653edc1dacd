//! Error types for zmark

use std::fmt;
use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }

    /// True for spans that do not point into any source (tree edits)
    pub const fn is_empty(&self) -> bool {
        self.start.line == 0
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// An opening delimiter without its closing counterpart, or a construct
    /// shorter than its minimal legal form
    Malformed { construct: &'static str },
    InvalidName { name: String },
    DuplicateAttribute { name: String },
    /// A bare attribute key while key-only attributes are disabled
    InvalidAttribute { name: String },
    UnmatchedClosingTag { name: String },
    UnclosedElement { name: String },
    MisplacedDeclaration,
    MaxDepthExceeded { max: u16 },
    InvalidUtf8,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { construct } => write!(f, "malformed {construct}"),
            Self::InvalidName { name } => write!(f, "invalid name {}", quote(name)),
            Self::DuplicateAttribute { name } => {
                write!(f, "duplicate attribute {}", quote(name))
            }
            Self::InvalidAttribute { name } => {
                write!(f, "attribute {} has no value", quote(name))
            }
            Self::UnmatchedClosingTag { name } => {
                write!(f, "unmatched closing tag </{name}>")
            }
            Self::UnclosedElement { name } => write!(f, "unclosed element <{name}>"),
            Self::MisplacedDeclaration => write!(f, "misplaced declaration"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
        }
    }
}

/// Main error type for zmark
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
    fragment: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
            fragment: None,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
            fragment: None,
        }
    }

    /// Error raised by a tree edit rather than a parse
    pub fn detached(kind: ErrorKind) -> Self {
        Self::new(kind, Span::empty())
    }

    /// Attach the offending source text; only its first line is kept
    #[must_use]
    pub fn with_fragment(mut self, fragment: &str) -> Self {
        let first_line = fragment.lines().next().unwrap_or_default();
        self.fragment = Some(first_line.to_string());
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_empty() {
            write!(f, "error: {}", self.message)?;
        } else {
            write!(f, "error at {}: {}", self.span.start, self.message)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, " near {}", quote(fragment))?;
        }
        Ok(())
    }
}

/// Quote a string for an error message
pub fn quote(s: &str) -> String {
    format!("{s:?}")
}

/// Result type alias for zmark
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_display() {
        let pos = Pos::new(42, 10, 5);
        assert_eq!(pos.to_string(), "10:5");
    }

    #[test]
    fn test_error_display() {
        let pos = Pos::new(3, 1, 4);
        let err = Error::new(
            ErrorKind::UnmatchedClosingTag {
                name: "b".to_string(),
            },
            Span::new(pos, pos),
        )
        .with_fragment("</b>\n<c>");
        let display = err.to_string();
        assert!(display.contains("error at 1:4"));
        assert!(display.contains("unmatched closing tag </b>"));
        assert_eq!(err.fragment(), Some("</b>"));
    }

    #[test]
    fn test_detached_error() {
        let err = Error::detached(ErrorKind::InvalidName {
            name: "1abc".to_string(),
        });
        assert!(err.span().is_empty());
        assert_eq!(err.to_string(), "error: invalid name \"1abc\"");
    }
}
