//! Transfer-encoding codecs and boundary token generation.
//!
//! Base64 and quoted-printable are pure functions invoked lazily when
//! a logical body is materialized; the stored body always stays in its
//! wire encoding.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Maximum line length for quoted-printable encoding.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes text using quoted-printable encoding (RFC 2045).
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::new();
    let mut line_length = 0;

    for byte in text.as_bytes() {
        if line_length >= MAX_LINE_LENGTH - 3 {
            result.push_str("=\r\n");
            line_length = 0;
        }

        match byte {
            // Printable ASCII except '=' and space
            b'!'..=b'<' | b'>'..=b'~' => {
                result.push(*byte as char);
                line_length += 1;
            }
            // Space only needs encoding at the end of a line
            b' ' => {
                if line_length >= MAX_LINE_LENGTH - 1 {
                    result.push_str("=20");
                    line_length += 3;
                } else {
                    result.push(' ');
                    line_length += 1;
                }
            }
            _ => {
                result.push('=');
                let _ = write!(result, "{byte:02X}");
                line_length += 3;
            }
        }
    }

    result
}

/// Decodes quoted-printable text (RFC 2045) into bytes.
///
/// # Errors
///
/// Returns an error if the input contains an invalid or incomplete
/// escape sequence.
pub fn decode_quoted_printable(text: &str) -> Result<Vec<u8>> {
    let mut decoded = Vec::with_capacity(text.len());
    let mut bytes = text.bytes().peekable();

    while let Some(byte) = bytes.next() {
        if byte != b'=' {
            decoded.push(byte);
            continue;
        }

        // Soft line break
        if bytes.peek() == Some(&b'\r') {
            bytes.next();
            if bytes.peek() == Some(&b'\n') {
                bytes.next();
            }
            continue;
        }
        if bytes.peek() == Some(&b'\n') {
            bytes.next();
            continue;
        }

        match (bytes.next(), bytes.next()) {
            (Some(high), Some(low)) => {
                let hex = [high, low];
                if !hex.iter().all(u8::is_ascii_hexdigit) {
                    return Err(Error::InvalidEncoding(format!(
                        "invalid escape sequence ={}{}",
                        high as char, low as char
                    )));
                }
                let hex = std::str::from_utf8(&hex)
                    .map_err(|_| Error::InvalidEncoding("invalid escape sequence".to_string()))?;
                let value = u8::from_str_radix(hex, 16)
                    .map_err(|e| Error::InvalidEncoding(format!("invalid hex: {e}")))?;
                decoded.push(value);
            }
            _ => {
                return Err(Error::InvalidEncoding(
                    "incomplete escape sequence".to_string(),
                ));
            }
        }
    }

    Ok(decoded)
}

/// Generates a fresh multipart boundary token: 24 bytes from the
/// thread-local CSPRNG, rendered as 32 base64 characters.
#[must_use]
pub fn generate_boundary() -> String {
    let nonce: [u8; 24] = rand::random();
    encode_base64(&nonce)
}
