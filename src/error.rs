//! Crate-wide error taxonomy.
//!
//! [`ParseError`] unifies the XML tool-call parser's tagged error record (§4.5 of the
//! design doc) with the cursor layer's control-flow "not yet" signal and the
//! message builder's `finish()` invariant.

use thiserror::Error;

/// A position within the text a [`ParseError`] refers to, in bytes.
pub type Position = usize;

/// Hard and soft failures raised while parsing a chat message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An expected token was missing because the input simply hasn't arrived yet.
    /// Not a real error: callers retain the input and retry once more text arrives.
    #[error("partial: expected {0}")]
    Partial(String),

    /// `finish()` was called on a non-partial parse with unconsumed input left at the cursor.
    #[error("unconsumed input remaining at byte {0}")]
    UnconsumedInput(Position),

    /// XML/tool-call framing or schema violations, one variant per `type` in §3.
    #[error("input exceeds maximum size of {max} bytes")]
    InputTooLarge { max: usize },

    #[error("tag name exceeds maximum length of {max} bytes at byte {position}")]
    TagNameTooLong { position: Position, max: usize },

    #[error("attribute value exceeds maximum length of {max} bytes at byte {position}")]
    AttributeTooLong { position: Position, max: usize },

    #[error("more than {max} parameters in a single function call")]
    TooManyParameters { max: usize },

    #[error("more than {max} tool calls in a single message")]
    TooManyTools { max: usize },

    #[error("invalid xml structure at byte {position}: {message}")]
    InvalidXmlStructure { position: Position, message: String },

    #[error("invalid function name at byte {position}: {message}")]
    InvalidFunctionName { position: Position, message: String },

    #[error("function {name:?} is not in the supplied tool list")]
    FunctionNotFound { name: String },

    #[error("failed to convert parameter {key:?}: {message}")]
    ParameterConversionFailed { key: String, message: String },

    #[error("failed to serialize tool-call arguments: {0}")]
    JsonSerializationFailed(String),
}

/// Context carried alongside a hard [`ParseError`] for diagnostics (the "error slot").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// A short excerpt of the input surrounding the failure, for logs.
    pub context: String,
}

pub type ParseResult<T> = Result<T, ParseError>;
