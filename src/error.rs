//! Parse error types
//!
//! Every failure is fatal to the in-progress parse and carries the system ID
//! and line number of the stream position where it was detected.

use std::fmt;

/// All error conditions raised during an XML parse.
#[derive(Debug)]
#[non_exhaustive]
pub enum XmlError {
    /// Unexpected character at a grammar position (e.g. a stray byte before
    /// the root element, a missing `>`).
    InvalidInput {
        detail: String,
        system_id: String,
        line: u32,
    },
    /// Entity reference where none is syntactically allowed (e.g. in a tag
    /// name position).
    UnexpectedEntity {
        name: String,
        system_id: String,
        line: u32,
    },
    /// Named entity with no registered definition.
    UnresolvableEntity {
        name: String,
        system_id: String,
        line: u32,
    },
    /// Closing tag name differs from the currently open element.
    MismatchedTag {
        expected: String,
        found: String,
        system_id: String,
        line: u32,
    },
    /// Same attribute name declared twice on one element.
    DuplicateAttribute {
        name: String,
        system_id: String,
        line: u32,
    },
    /// CDATA section where the grammar does not permit one.
    UnexpectedCdata { system_id: String, line: u32 },
    /// Stream exhausted while more input was expected.
    UnexpectedEof { system_id: String, line: u32 },
    /// Failure opening or decoding an underlying byte stream.
    Io {
        detail: String,
        system_id: String,
        line: u32,
    },
    /// A builder or validator callback failed; the original cause is kept
    /// for diagnostics.
    Builder {
        source: Box<dyn std::error::Error + Send + Sync>,
        system_id: String,
        line: u32,
    },
}

impl XmlError {
    /// System ID of the stream in which the error was detected.
    pub fn system_id(&self) -> &str {
        match self {
            Self::InvalidInput { system_id, .. }
            | Self::UnexpectedEntity { system_id, .. }
            | Self::UnresolvableEntity { system_id, .. }
            | Self::MismatchedTag { system_id, .. }
            | Self::DuplicateAttribute { system_id, .. }
            | Self::UnexpectedCdata { system_id, .. }
            | Self::UnexpectedEof { system_id, .. }
            | Self::Io { system_id, .. }
            | Self::Builder { system_id, .. } => system_id,
        }
    }

    /// Line number (1-based) at which the error was detected.
    pub fn line(&self) -> u32 {
        match self {
            Self::InvalidInput { line, .. }
            | Self::UnexpectedEntity { line, .. }
            | Self::UnresolvableEntity { line, .. }
            | Self::MismatchedTag { line, .. }
            | Self::DuplicateAttribute { line, .. }
            | Self::UnexpectedCdata { line, .. }
            | Self::UnexpectedEof { line, .. }
            | Self::Io { line, .. }
            | Self::Builder { line, .. } => *line,
        }
    }
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { detail, .. } => write!(f, "invalid input: {detail}")?,
            Self::UnexpectedEntity { name, .. } => {
                write!(f, "unexpected entity reference '&{name};'")?
            }
            Self::UnresolvableEntity { name, .. } => {
                write!(f, "entity '{name}' cannot be resolved")?
            }
            Self::MismatchedTag { expected, found, .. } => {
                write!(f, "closing tag '{found}' does not match '{expected}'")?
            }
            Self::DuplicateAttribute { name, .. } => {
                write!(f, "attribute '{name}' declared twice")?
            }
            Self::UnexpectedCdata { .. } => write!(f, "CDATA section not allowed here")?,
            Self::UnexpectedEof { .. } => write!(f, "unexpected end of input")?,
            Self::Io { detail, .. } => write!(f, "stream error: {detail}")?,
            Self::Builder { source, .. } => write!(f, "builder callback failed: {source}")?,
        }
        let system_id = self.system_id();
        if system_id.is_empty() {
            write!(f, " (line {})", self.line())
        } else {
            write!(f, " ({}, line {})", system_id, self.line())
        }
    }
}

impl std::error::Error for XmlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Builder { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// A convenience `Result` type alias using [`XmlError`].
pub type Result<T> = std::result::Result<T, XmlError>;
