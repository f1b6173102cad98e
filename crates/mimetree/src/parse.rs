//! Recursive boundary-aware message parsing.
//!
//! One invocation of the recursive routine populates one tree node,
//! watching for the *enclosing* multipart's boundary while doing so.
//! The terminating line is handed back to the caller, which decides
//! whether more siblings follow (opening delimiter) or the structure is
//! complete (closing delimiter).

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::part::{LineEnding, Part};

/// Maximum multipart nesting depth accepted by the parser. Input nested
/// deeper fails with [`Error::NestingTooDeep`] instead of exhausting
/// the call stack.
pub const MAX_NESTING_DEPTH: usize = 64;

/// One input line with its terminator stripped.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    text: &'a str,
    crlf: bool,
}

/// Splits input into lines at `\n`, recording whether each line was
/// CRLF-terminated. A final line without a terminator is still yielded.
struct Lines<'a> {
    rest: &'a str,
}

impl<'a> Lines<'a> {
    const fn new(input: &'a str) -> Self {
        Self { rest: input }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        if self.rest.is_empty() {
            return None;
        }
        let (raw, rest) = match self.rest.find('\n') {
            Some(index) => (&self.rest[..index], &self.rest[index + 1..]),
            None => (self.rest, ""),
        };
        self.rest = rest;
        raw.strip_suffix('\r').map_or(
            Some(Line {
                text: raw,
                crlf: false,
            }),
            |text| Some(Line { text, crlf: true }),
        )
    }
}

/// Whether the line opens a part delimited by `boundary` (`--token`
/// prefix; trailing text is not examined). An empty boundary never
/// matches.
fn is_boundary(line: &str, boundary: &str) -> bool {
    !boundary.is_empty() && line.starts_with("--") && line[2..].starts_with(boundary)
}

/// Whether the line is the closing delimiter (`--token--` prefix).
fn is_final_boundary(line: &str, boundary: &str) -> bool {
    is_boundary(line, boundary) && line[2 + boundary.len()..].starts_with("--")
}

fn push_line(buffer: &mut String, line: Line<'_>) {
    buffer.push_str(line.text);
    buffer.push_str(if line.crlf { "\r\n" } else { "\n" });
}

/// Parses one part from the line stream, returning it together with the
/// line that terminated it: a (possibly closing) `parent_boundary`
/// delimiter, or the empty string at end of input.
fn parse_part(lines: &mut Lines<'_>, parent_boundary: &str, depth: usize) -> Result<(Part, String)> {
    let mut part = Part::new();
    let mut crlf_lines = 0_u32;
    let mut lf_lines = 0_u32;

    // Header block: runs until a blank line, end of input, or the
    // enclosing boundary (a malformed or empty trailing part).
    loop {
        let Some(line) = lines.next() else { break };
        if is_boundary(line.text, parent_boundary) {
            return Ok((part, line.text.to_string()));
        }

        if line.crlf {
            crlf_lines += 1;
        } else {
            lf_lines += 1;
        }

        if line.text.is_empty() {
            break;
        }

        if line.text.chars().next().is_some_and(char::is_whitespace) {
            // Continuation of the previous header's value.
            match part.headers.last_value_mut() {
                Some(value) => value.push_str(line.text),
                None => return Err(Error::InvalidHeaderLine(line.text.to_string())),
            }
            continue;
        }

        let mut colon = None;
        for (index, byte) in line.text.bytes().enumerate() {
            if byte == b':' {
                colon = Some(index);
                break;
            }
            if !(33..=127).contains(&byte) {
                return Err(Error::InvalidHeaderLine(line.text.to_string()));
            }
        }
        let colon = match colon {
            None | Some(0) => return Err(Error::InvalidHeaderLine(line.text.to_string())),
            Some(index) => index,
        };

        let field = &line.text[..colon];
        let value = line.text[colon + 1..].trim_start_matches([' ', '\t']);
        part.headers.append(field, value);
    }

    part.line_ending = if crlf_lines > lf_lines {
        LineEnding::Crlf
    } else {
        LineEnding::Lf
    };

    if part.is_mime_type("multipart") {
        if depth >= MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        let boundary = part
            .header_parameter("Content-Type", "boundary")
            .unwrap_or_default();
        if boundary.is_empty() {
            return Err(Error::MissingBoundary);
        }
        part.boundary = boundary;
        part.multipart = true;
    }

    if !part.multipart {
        while let Some(line) = lines.next() {
            if is_boundary(line.text, parent_boundary) {
                return Ok((part, line.text.to_string()));
            }
            push_line(&mut part.body, line);
        }
        return Ok((part, String::new()));
    }

    trace!(boundary = %part.boundary, depth, "parsing multipart body");

    // Preamble, up to (not including) this part's opening delimiter.
    loop {
        let Some(line) = lines.next() else { break };
        if is_boundary(line.text, parent_boundary) {
            return Ok((part, line.text.to_string()));
        }
        if is_boundary(line.text, &part.boundary) {
            break;
        }
        push_line(&mut part.preamble, line);
    }

    loop {
        let (child, terminator) = parse_part(lines, &part.boundary, depth + 1)?;
        part.parts.push(child);
        if !is_boundary(&terminator, &part.boundary) {
            return Err(Error::BoundaryMismatch(part.boundary.clone()));
        }
        if is_final_boundary(&terminator, &part.boundary) {
            break;
        }
    }

    while let Some(line) = lines.next() {
        if is_boundary(line.text, parent_boundary) {
            return Ok((part, line.text.to_string()));
        }
        push_line(&mut part.epilogue, line);
    }

    Ok((part, String::new()))
}

impl Part {
    /// Parses a byte stream (as text) into a part tree.
    ///
    /// # Errors
    ///
    /// Fails on structurally invalid input: bad header lines, a
    /// multipart Content-Type without a boundary parameter, mismatched
    /// boundaries, or nesting beyond [`MAX_NESTING_DEPTH`]. The whole
    /// document is rejected; there is no partial recovery.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = Lines::new(text);
        let (part, _) = parse_part(&mut lines, "", 0)?;
        debug!(
            multipart = part.is_multipart(),
            parts = part.parts().len(),
            "parsed part"
        );
        Ok(part)
    }

    /// Parses a byte stream into a top-level message.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Part::parse`].
    pub fn parse_message(text: &str) -> Result<Self> {
        let mut part = Self::parse(text)?;
        part.message = true;
        Ok(part)
    }
}
