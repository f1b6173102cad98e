//! The message tree node.

use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;

/// Line-ending convention of a single node, decided at parse time from
/// a majority vote over the node's own header lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    /// Bare line feed.
    Lf,
    /// Carriage return + line feed (the RFC2822 wire convention).
    #[default]
    Crlf,
}

impl LineEnding {
    /// The terminator as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
        }
    }
}

/// One node of a MIME message tree: either a leaf with a raw
/// (still transfer-encoded) body, or a multipart container with an
/// ordered sequence of child parts delimited by a boundary token.
///
/// Children are owned by value; cloning a part deep-copies its entire
/// subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Part {
    pub(crate) headers: Headers,
    pub(crate) preamble: String,
    pub(crate) body: String,
    pub(crate) epilogue: String,
    pub(crate) parts: Vec<Part>,
    pub(crate) boundary: String,
    pub(crate) multipart: bool,
    pub(crate) line_ending: LineEnding,
    pub(crate) message: bool,
}

impl Part {
    /// Creates a new empty part.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty top-level message. A message refuses to
    /// serialize with zero headers, and gains a `MIME-Version` header
    /// when multipart structure is first introduced.
    #[must_use]
    pub fn new_message() -> Self {
        Self {
            message: true,
            ..Self::default()
        }
    }

    /// True for parts created as top-level messages.
    #[must_use]
    pub const fn is_message(&self) -> bool {
        self.message
    }

    /// The header store.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to the header store.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// First value of a header field, case-insensitively.
    #[must_use]
    pub fn header(&self, field: &str) -> Option<&str> {
        self.headers.get(field)
    }

    /// Sets a header, updating the first match or appending.
    pub fn set_header(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.headers.set(field, value);
    }

    /// Appends a header entry, regardless of duplicates.
    pub fn append_header(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.headers.append(field, value);
    }

    /// Prepends a header entry, regardless of duplicates.
    pub fn prepend_header(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.headers.prepend(field, value);
    }

    /// Removes all entries for the field, case-insensitively.
    pub fn erase_header(&mut self, field: &str) {
        self.headers.erase(field);
    }

    /// Mutable handle to a header value, appending an empty entry if
    /// absent. Entries with empty values are omitted from output.
    pub fn header_entry(&mut self, field: &str) -> &mut String {
        self.headers.entry(field)
    }

    /// The value part of a header (before the first `;`), or the empty
    /// string if absent.
    #[must_use]
    pub fn header_value(&self, field: &str) -> &str {
        self.headers.value(field)
    }

    /// A `name=value` parameter within a header value.
    #[must_use]
    pub fn header_parameter(&self, field: &str, name: &str) -> Option<String> {
        self.headers.parameter(field, name)
    }

    /// Replaces a header's value part, keeping its parameters.
    pub fn set_header_value(&mut self, field: impl Into<String>, value: &str) {
        self.headers.set_value(field, value);
    }

    /// Sets a parameter within a header value, quoting as needed.
    pub fn set_header_parameter(&mut self, field: impl Into<String>, name: &str, value: &str) {
        self.headers.set_parameter(field, name, value);
    }

    /// The raw, still transfer-encoded body. Meaningful only for
    /// singlepart nodes.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Text before the first boundary of a multipart node.
    #[must_use]
    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// Text after the closing boundary of a multipart node.
    #[must_use]
    pub fn epilogue(&self) -> &str {
        &self.epilogue
    }

    /// The boundary token delimiting child parts.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The ordered child parts of a multipart node.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Mutable access to the child parts.
    pub fn parts_mut(&mut self) -> &mut Vec<Part> {
        &mut self.parts
    }

    /// Whether this node is a multipart container.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        self.multipart
    }

    /// Whether this node is `multipart/<subtype>`.
    #[must_use]
    pub fn is_multipart_subtype(&self, subtype: &str) -> bool {
        self.multipart
            && self
                .header_value("Content-Type")
                .eq_ignore_ascii_case(&format!("multipart/{subtype}"))
    }

    /// Whether this node is a leaf (non-multipart) part.
    #[must_use]
    pub const fn is_singlepart(&self) -> bool {
        !self.multipart
    }

    /// Whether this node is a leaf part of the given MIME type.
    #[must_use]
    pub fn is_singlepart_type(&self, mime_type: &str) -> bool {
        !self.multipart && types_match(self.header_value("Content-Type"), mime_type)
    }

    /// Whether this node carries `Content-Disposition: attachment`.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.header_value("Content-Disposition")
            .eq_ignore_ascii_case("attachment")
    }

    /// Whether this node carries `Content-Disposition: inline`.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.header_value("Content-Disposition")
            .eq_ignore_ascii_case("inline")
    }

    /// This node's line-ending convention.
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Overrides the line-ending convention used when serializing this
    /// node's headers and boundary lines.
    pub fn set_line_ending(&mut self, line_ending: LineEnding) {
        self.line_ending = line_ending;
    }

    /// Sets the raw body of a singlepart node.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Precondition`] on a multipart node, leaving
    /// it unmodified.
    pub fn set_body(&mut self, body: impl Into<String>) -> Result<()> {
        if self.multipart {
            return Err(Error::Precondition("cannot set body of a multipart part"));
        }
        self.body = body.into();
        Ok(())
    }

    /// Sets the preamble of a multipart node.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Precondition`] on a singlepart node.
    pub fn set_preamble(&mut self, preamble: impl Into<String>) -> Result<()> {
        if !self.multipart {
            return Err(Error::Precondition(
                "cannot set preamble of a non-multipart part",
            ));
        }
        self.preamble = preamble.into();
        Ok(())
    }

    /// Sets the epilogue of a multipart node.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Precondition`] on a singlepart node.
    pub fn set_epilogue(&mut self, epilogue: impl Into<String>) -> Result<()> {
        if !self.multipart {
            return Err(Error::Precondition(
                "cannot set epilogue of a non-multipart part",
            ));
        }
        self.epilogue = epilogue.into();
        Ok(())
    }

    /// Replaces the child parts of a multipart node.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Precondition`] on a singlepart node.
    pub fn set_parts(&mut self, parts: Vec<Part>) -> Result<()> {
        if !self.multipart {
            return Err(Error::Precondition(
                "cannot set parts of a non-multipart part",
            ));
        }
        self.parts = parts;
        Ok(())
    }

    /// Sets the boundary token, updating the `boundary` parameter of
    /// the Content-Type header if one is present.
    pub fn set_boundary(&mut self, boundary: impl Into<String>) {
        self.boundary = boundary.into();
        if self.has_mime_type() {
            let boundary = self.boundary.clone();
            self.headers
                .set_parameter("Content-Type", "boundary", &boundary);
        }
    }

    /// Appends a child part, returning a handle to the inserted copy.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Precondition`] on a singlepart node.
    pub fn append_part(&mut self, part: Part) -> Result<&mut Part> {
        if !self.multipart {
            return Err(Error::Precondition(
                "cannot append a part to a non-multipart part",
            ));
        }
        Ok(self.push_part(part))
    }

    /// Prepends a child part, returning a handle to the inserted copy.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Precondition`] on a singlepart node.
    pub fn prepend_part(&mut self, part: Part) -> Result<&mut Part> {
        if !self.multipart {
            return Err(Error::Precondition(
                "cannot prepend a part to a non-multipart part",
            ));
        }
        Ok(self.push_part_front(part))
    }

    pub(crate) fn push_part(&mut self, part: Part) -> &mut Part {
        let index = self.parts.len();
        self.parts.push(part);
        &mut self.parts[index]
    }

    pub(crate) fn push_part_front(&mut self, part: Part) -> &mut Part {
        self.parts.insert(0, part);
        &mut self.parts[0]
    }

    /// Clears everything except the top-level-message flag.
    pub fn clear(&mut self) {
        self.headers.clear();
        self.preamble.clear();
        self.body.clear();
        self.epilogue.clear();
        self.parts.clear();
        self.boundary.clear();
        self.multipart = false;
    }

    /// Clears the raw body.
    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    /// Removes all headers.
    pub fn clear_headers(&mut self) {
        self.headers.clear();
    }

    /// Removes all child parts, keeping the multipart discriminator.
    pub fn clear_parts(&mut self) {
        self.parts.clear();
    }

    /// The Content-Type value without parameters, or the empty string.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        self.header_value("Content-Type")
    }

    /// Replaces the Content-Type value, keeping its parameters.
    pub fn set_mime_type(&mut self, mime_type: &str) {
        self.set_header_value("Content-Type", mime_type);
    }

    /// Compares the Content-Type against `mime_type`; a bare top-level
    /// type token (no `/`) matches only the top-level token of the
    /// other side.
    #[must_use]
    pub fn is_mime_type(&self, mime_type: &str) -> bool {
        types_match(self.mime_type(), mime_type)
    }

    /// Whether a Content-Type header with a non-empty value is present.
    #[must_use]
    pub fn has_mime_type(&self) -> bool {
        !self.mime_type().is_empty()
    }

    /// Decodes the raw body according to its Content-Transfer-Encoding
    /// (`base64`, `quoted-printable`, identity otherwise).
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid for its declared
    /// transfer encoding.
    pub fn decoded_body(&self) -> Result<Vec<u8>> {
        let encoding = self.header_value("Content-Transfer-Encoding");
        if encoding.eq_ignore_ascii_case("base64") {
            let cleaned: String = self.body.chars().filter(|c| !c.is_whitespace()).collect();
            decode_base64(&cleaned)
        } else if encoding.eq_ignore_ascii_case("quoted-printable") {
            decode_quoted_printable(&self.body)
        } else {
            Ok(self.body.clone().into_bytes())
        }
    }

    /// The decoded body as text, converted from the character set named
    /// by the Content-Type `charset` parameter (UTF-8 if absent).
    ///
    /// # Errors
    ///
    /// Returns an error if transfer decoding fails, the character set is
    /// unknown, or the bytes are invalid for it.
    pub fn body_text(&self) -> Result<String> {
        let bytes = self.decoded_body()?;
        match self.header_parameter("Content-Type", "charset") {
            Some(charset) if !charset.eq_ignore_ascii_case("utf-8") => {
                crate::charset::decode_charset(&charset, &bytes)
            }
            _ => String::from_utf8(bytes).map_err(Into::into),
        }
    }
}

/// Structural MIME type comparison: if either side is a bare top-level
/// token, only the top-level tokens are compared; otherwise the full
/// type is compared, always ASCII case-insensitively.
pub(crate) fn types_match(a: &str, b: &str) -> bool {
    match (a.find('/'), b.find('/')) {
        (Some(_), Some(_)) => a.eq_ignore_ascii_case(b),
        (a_slash, b_slash) => {
            let a_top = &a[..a_slash.unwrap_or(a.len())];
            let b_top = &b[..b_slash.unwrap_or(b.len())];
            a_top.eq_ignore_ascii_case(b_top)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_types_match() {
        assert!(types_match("text/plain", "text/plain"));
        assert!(types_match("Text/Plain", "text/PLAIN"));
        assert!(types_match("text/plain", "text"));
        assert!(types_match("text", "text/html"));
        assert!(!types_match("text/plain", "text/html"));
        assert!(!types_match("image/png", "text"));
        assert!(types_match("", ""));
        assert!(!types_match("", "text"));
    }

    #[test]
    fn test_body_preconditions() {
        let mut part = Part::new();
        assert!(part.set_body("hello").is_ok());
        assert!(part.set_preamble("pre").is_err());
        assert!(part.set_epilogue("post").is_err());
        assert!(part.set_parts(vec![Part::new()]).is_err());
        assert!(part.append_part(Part::new()).is_err());
        assert_eq!(part.body(), "hello");
    }

    #[test]
    fn test_decoded_body_base64() {
        let mut part = Part::new();
        part.set_header("Content-Transfer-Encoding", "base64");
        part.set_body("SGVsbG8sIFdvcmxkIQ==").unwrap();
        assert_eq!(part.decoded_body().unwrap(), b"Hello, World!");
        assert_eq!(part.body_text().unwrap(), "Hello, World!");
    }

    #[test]
    fn test_decoded_body_quoted_printable() {
        let mut part = Part::new();
        part.set_header("Content-Transfer-Encoding", "quoted-printable");
        part.set_body("H=C3=A9llo").unwrap();
        assert_eq!(part.body_text().unwrap(), "Héllo");
    }

    #[test]
    fn test_body_text_with_charset() {
        let mut part = Part::new();
        part.set_header("Content-Type", "text/plain; charset=iso-8859-1");
        part.set_header("Content-Transfer-Encoding", "quoted-printable");
        part.set_body("caf=E9").unwrap();
        assert_eq!(part.body_text().unwrap(), "café");
    }

    #[test]
    fn test_decoded_body_identity() {
        let mut part = Part::new();
        part.set_body("plain text\r\n").unwrap();
        assert_eq!(part.decoded_body().unwrap(), b"plain text\r\n");
    }

    #[test]
    fn test_set_boundary_updates_content_type() {
        let mut part = Part::new();
        part.set_header("Content-Type", "multipart/mixed; boundary=old");
        part.set_boundary("new");
        assert_eq!(
            part.header("Content-Type"),
            Some("multipart/mixed; boundary=new")
        );
        assert_eq!(part.boundary(), "new");
    }

    #[test]
    fn test_clear_keeps_message_flag() {
        let mut message = Part::new_message();
        message.set_header("From", "me");
        message.clear();
        assert!(message.is_message());
        assert!(message.headers().is_empty());
    }
}
