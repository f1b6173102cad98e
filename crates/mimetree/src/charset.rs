//! Character-set conversion collaborator.
//!
//! Invoked only by explicit caller request, never automatically during
//! parsing or serialization.

use crate::error::{Error, Result};
use encoding::DecoderTrap;
use encoding::label::encoding_from_whatwg_label;

/// Decodes bytes in the named character set into UTF-8 text.
///
/// The charset name is resolved as a WHATWG encoding label
/// (case-insensitive, e.g. `utf-8`, `iso-8859-1`, `windows-1252`).
///
/// # Errors
///
/// Returns [`Error::UnsupportedCharset`] for an unknown label and
/// [`Error::CharsetConversion`] when the byte sequence is invalid for
/// the named charset.
pub fn decode_charset(charset: &str, bytes: &[u8]) -> Result<String> {
    let codec = encoding_from_whatwg_label(charset)
        .ok_or_else(|| Error::UnsupportedCharset(charset.to_string()))?;
    codec
        .decode(bytes, DecoderTrap::Strict)
        .map_err(|reason| Error::CharsetConversion(reason.into_owned()))
}
