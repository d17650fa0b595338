use alloc::string::{String, ToString};
use core::fmt;

use thiserror::Error;

/// Failure to decode a tagged wire string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("strings must start with utf8: or alpha16:, unknown tagged string '{0}'")]
    UnknownPrefix(String),
    #[error("binary payload has odd length {len} in '{text}'")]
    OddLength { len: usize, text: String },
    #[error("invalid binary symbol '{symbol}' in '{text}'")]
    InvalidSymbol { symbol: char, text: String },
}

/// The kind of element an array context had no handler for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Bool,
    String,
    Binary,
    Object,
    Array,
}

impl ElementKind {
    fn article(self) -> &'static str {
        match self {
            ElementKind::Object | ElementKind::Array => "an",
            ElementKind::Bool | ElementKind::String | ElementKind::Binary => "a",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElementKind::Bool => "bool",
            ElementKind::String => "string",
            ElementKind::Binary => "binary",
            ElementKind::Object => "object",
            ElementKind::Array => "array",
        })
    }
}

/// The numeric type a number was being converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Int,
    UInt,
    Float,
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NumberKind::Int => "integer",
            NumberKind::UInt => "unsigned integer",
            NumberKind::Float => "float",
        })
    }
}

/// A document that is well-formed JSON but does not match the registered
/// handlers.
///
/// Handlers return this type as well; [`SchemaError::custom`] wraps any
/// message a handler wants to report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error("{0} element found in array that does not have {article} {0} handler", article = .0.article())]
    NoHandler(ElementKind),
    #[error("found number in restricted context with no numeric handler")]
    NoNumericHandler,
    #[error("unable to convert to {kind} '{text}'")]
    InvalidNumber { kind: NumberKind, text: String },
    #[error("keys may not appear in arrays")]
    KeyInArray,
    #[error("value with no key in object")]
    ValueWithoutKey,
    #[error("no type specified for polymorph")]
    PolymorphWithoutType,
    #[error("multiple types specified for polymorph")]
    PolymorphMultipleTypes,
    #[error("polymorph has no object")]
    PolymorphWithoutObject,
    #[error("{0}")]
    Custom(String),
}

impl SchemaError {
    /// Builds an error carrying a caller-supplied message.
    pub fn custom(message: impl fmt::Display) -> Self {
        SchemaError::Custom(message.to_string())
    }
}

/// Malformed JSON reported by the tokenizer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} at {line}:{column}")]
pub struct SyntaxError {
    pub(crate) message: String,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    /// The message without position information.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The result of a failed parse.
///
/// The first schema error stops dispatch; the tokenizer keeps running so a
/// syntax error further along in the input is reported too, after the schema
/// error.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}")]
    Schema(SchemaError),
    #[error("{0}")]
    Syntax(SyntaxError),
    #[error("{schema}\n{syntax}")]
    SchemaThenSyntax {
        schema: SchemaError,
        syntax: SyntaxError,
    },
    #[cfg(feature = "std")]
    #[error("unable to read input: {0}")]
    Io(#[source] std::io::Error),
    #[cfg(feature = "std")]
    #[error("unable to open {} to parse: {source}", .path.display())]
    Open {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    pub(crate) fn compose(schema: Option<SchemaError>, syntax: Option<SyntaxError>) -> Option<Self> {
        match (schema, syntax) {
            (None, None) => None,
            (Some(schema), None) => Some(ParseError::Schema(schema)),
            (None, Some(syntax)) => Some(ParseError::Syntax(syntax)),
            (Some(schema), Some(syntax)) => Some(ParseError::SchemaThenSyntax { schema, syntax }),
        }
    }

    /// The recorded schema error, if any.
    #[must_use]
    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self {
            ParseError::Schema(schema) | ParseError::SchemaThenSyntax { schema, .. } => Some(schema),
            _ => None,
        }
    }

    /// The tokenizer's syntax error, if any.
    #[must_use]
    pub fn syntax_error(&self) -> Option<&SyntaxError> {
        match self {
            ParseError::Syntax(syntax) | ParseError::SchemaThenSyntax { syntax, .. } => Some(syntax),
            _ => None,
        }
    }
}
