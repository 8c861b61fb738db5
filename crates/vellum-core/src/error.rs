//! Error types for JSON lexing, reading, and object mapping.

use thiserror::Error;

/// Errors that can occur while tokenizing, parsing, or mapping JSON.
#[derive(Error, Debug)]
pub enum JsonError {
    /// No valid lexer transition exists for the character at the given
    /// position. Includes the 1-based line and column where the character
    /// (or the unexpected end of input) was found.
    #[error("lexical error at line {line}, column {column}: {message}")]
    Lex {
        line: usize,
        column: usize,
        message: String,
    },

    /// The token stream violates object/array nesting rules, a property was
    /// declared twice, or trailing content follows the root value.
    #[error("structural error: {message}")]
    Structural { message: String },

    /// Container nesting (reading) or object-graph recursion (writing)
    /// exceeded the configured limit. Fatal for the call.
    #[error("nesting depth exceeded the configured limit of {limit}")]
    DepthExceeded { limit: usize },

    /// A [`JsonValue`](crate::JsonValue) scalar accessor was used against
    /// the wrong active variant.
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// No viable path (direct assignment, enum conversion, registered
    /// importer, numeric/textual coercion) to map a JSON value onto the
    /// target type.
    #[error("cannot convert JSON {json_kind} value `{value}` to `{target}`")]
    Conversion {
        json_kind: &'static str,
        value: String,
        target: &'static str,
    },

    /// An object property has no corresponding member on the target record
    /// and `skip_unknown_members` is disabled.
    #[error("unknown member `{member}` for target `{target}`")]
    UnknownMember {
        member: String,
        target: &'static str,
    },

    /// The caller-supplied text writer failed.
    #[error("write error: {0}")]
    Write(#[from] std::fmt::Error),
}

/// Convenience alias used throughout vellum-core.
pub type Result<T> = std::result::Result<T, JsonError>;
