//! Error types for MIME tree operations.

use std::string::FromUtf8Error;

/// Result type alias for MIME tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME tree error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A header line is structurally invalid (no colon, colon at offset
    /// zero, non-printable bytes in the field name, or a continuation
    /// line with no preceding header).
    #[error("invalid header line: {0}")]
    InvalidHeaderLine(String),

    /// A multipart Content-Type without a boundary parameter.
    #[error("multipart but no boundary specified")]
    MissingBoundary,

    /// A child part terminated on something other than the enclosing
    /// boundary (mismatched delimiter or premature end of input).
    #[error("invalid boundary: expected delimiter for {0:?}")]
    BoundaryMismatch(String),

    /// Multipart nesting exceeded the parser's recursion bound.
    #[error("multipart nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    /// An API call that would violate the singlepart/multipart
    /// discriminator (e.g. setting a body on a multipart node).
    #[error("{0}")]
    Precondition(&'static str),

    /// A top-level message serialized with no headers.
    #[error("no headers specified")]
    EmptyTopLevelHeaders,

    /// The named character set is not supported.
    #[error("unsupported character set: {0}")]
    UnsupportedCharset(String),

    /// The byte sequence is invalid for the named character set.
    #[error("character set conversion failed: {0}")]
    CharsetConversion(String),

    /// Base64 decode error.
    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Invalid quoted-printable escape sequence.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),
}
