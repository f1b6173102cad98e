//! Ordered header store with structural value/parameter parsing.
//!
//! Headers are kept as an ordered sequence of `(field, value)` pairs.
//! Field names are compared ASCII case-insensitively, duplicates are
//! permitted, and insertion order is preserved exactly — the order is
//! observable in serialized output and must round-trip.

/// Characters allowed in an unquoted parameter token, besides
/// ASCII alphanumerics (RFC 2045 token set).
const TOKEN_EXTRA: &[u8] = b"!#$%&'*+-/=?^_`{|}~";

/// Ordered collection of message headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of header entries, counting duplicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The ordered entries, as parsed or inserted.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(field))
    }

    /// Gets the first value for a field, case-insensitively.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, value)| value.as_str())
    }

    /// Sets a field, updating the first match in place or appending a
    /// new entry if absent.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        match self.position(&field) {
            Some(index) => self.entries[index].1 = value.into(),
            None => self.entries.push((field, value.into())),
        }
    }

    /// Appends a new entry at the end, regardless of duplicates.
    pub fn append(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.entries.push((field.into(), value.into()));
    }

    /// Prepends a new entry at the start, regardless of duplicates.
    pub fn prepend(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(0, (field.into(), value.into()));
    }

    /// Removes all entries matching the field, case-insensitively.
    pub fn erase(&mut self, field: &str) {
        self.entries
            .retain(|(name, _)| !name.eq_ignore_ascii_case(field));
    }

    /// Mutable access to the first matching value; appends a new entry
    /// with an empty value if the field is absent.
    ///
    /// An entry left with an empty value keeps its ordering slot but is
    /// omitted from serialized output.
    pub fn entry(&mut self, field: &str) -> &mut String {
        let index = match self.position(field) {
            Some(index) => index,
            None => {
                self.entries.push((field.to_string(), String::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    /// The value of the first matching field up to (not including) the
    /// first `;`, or the empty string if the field is absent.
    #[must_use]
    pub fn value(&self, field: &str) -> &str {
        self.get(field).map_or("", value_part)
    }

    /// Replaces the value part of a field (the text before the first
    /// `;`), leaving any parameters intact. Appends the entry if the
    /// field is absent.
    pub fn set_value(&mut self, field: impl Into<String>, value: &str) {
        let field = field.into();
        match self.position(&field) {
            Some(index) => replace_value(&mut self.entries[index].1, value),
            None => self.entries.push((field, value.to_string())),
        }
    }

    /// Looks up a `;`-separated `name=value` parameter within the first
    /// matching field's value, case-insensitively. The parameter value
    /// may be a bare token or a double-quoted string with backslash
    /// escapes; the returned text is unquoted and unescaped.
    #[must_use]
    pub fn parameter(&self, field: &str, name: &str) -> Option<String> {
        let header = self.get(field)?;
        let (start, end) = parameter_range(header, name)?;
        Some(unquote(&header[start..end]))
    }

    /// Replaces an existing parameter's value, quoting it if needed, or
    /// appends `; name=value` — to the existing entry if the field is
    /// present, to a new entry with an empty value part otherwise.
    pub fn set_parameter(&mut self, field: impl Into<String>, name: &str, value: &str) {
        let field = field.into();
        match self.position(&field) {
            Some(index) => {
                let header = &mut self.entries[index].1;
                match parameter_range(header, name) {
                    Some((start, end)) => header.replace_range(start..end, &quote(value)),
                    None => {
                        header.push_str("; ");
                        header.push_str(name);
                        header.push('=');
                        header.push_str(&quote(value));
                    }
                }
            }
            None => self
                .entries
                .push((field, format!("; {name}={}", quote(value)))),
        }
    }

    /// Mutable access to the most recently inserted value, for header
    /// continuation lines during parsing.
    pub(crate) fn last_value_mut(&mut self) -> Option<&mut String> {
        self.entries.last_mut().map(|(_, value)| value)
    }

    /// Iterates over all entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// The text of a header value before the first `;`.
pub(crate) fn value_part(value: &str) -> &str {
    match value.find(';') {
        Some(semicolon) => &value[..semicolon],
        None => value,
    }
}

fn replace_value(header: &mut String, value: &str) {
    match header.find(';') {
        Some(semicolon) => header.replace_range(..semicolon, value),
        None => {
            header.clear();
            header.push_str(value);
        }
    }
}

/// Byte range of the raw value of the named parameter within a header
/// value, including surrounding quotes if present. Quoted substrings of
/// other parameters are skipped while scanning, so a `;` inside quotes
/// is not treated as a separator.
fn parameter_range(value: &str, name: &str) -> Option<(usize, usize)> {
    let bytes = value.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while let Some(offset) = value[i..].find(';') {
        i += offset + 1;
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let name_start = i;
        while i < len && bytes[i] != b'=' && bytes[i] != b';' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let attribute = &value[name_start..i];

        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= len || bytes[i] != b'=' {
            // Malformed parameter; resume scanning at the next ';'.
            continue;
        }
        i += 1;
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let start = i;
        if i < len && bytes[i] == b'"' {
            i += 1;
            while i < len && bytes[i] != b'"' {
                if bytes[i] == b'\\' && i + 1 < len {
                    i += 1;
                }
                i += 1;
            }
            if i < len {
                i += 1; // closing quote
            }
        } else {
            while i < len && bytes[i] != b';' && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
        }

        if attribute.eq_ignore_ascii_case(name) {
            return Some((start, i));
        }
    }

    None
}

fn needs_quoting(value: &str) -> bool {
    value
        .bytes()
        .any(|b| !(b.is_ascii_alphanumeric() || TOKEN_EXTRA.contains(&b)))
}

/// Quotes a parameter value iff it contains a character outside the
/// token set, backslash-escaping `"` and `\`.
fn quote(value: &str) -> String {
    if !needs_quoting(value) {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Undoes [`quote`]: strips surrounding quotes and backslash escapes.
/// A value not starting with `"` is returned verbatim.
fn unquote(value: &str) -> String {
    if !value.starts_with('"') {
        return value.to_string();
    }

    let mut unquoted = String::with_capacity(value.len());
    let mut chars = value[1..].chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    unquoted.push(escaped);
                }
            }
            '"' => break,
            _ => unquoted.push(c),
        }
    }
    unquoted
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_case_insensitive() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(headers.get("Subject"), None);
    }

    #[test]
    fn test_set_updates_first_match() {
        let mut headers = Headers::new();
        headers.append("To", "alice@example.com");
        headers.append("To", "bob@example.com");
        headers.set("to", "charlie@example.com");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("To"), Some("charlie@example.com"));
        assert_eq!(headers.entries()[1].1, "bob@example.com");
    }

    #[test]
    fn test_append_prepend_order() {
        let mut headers = Headers::new();
        headers.append("X-A", "1");
        headers.prepend("X-B", "2");
        headers.append("X-A", "3");
        let fields: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(fields, ["X-B", "X-A", "X-A"]);
    }

    #[test]
    fn test_erase_removes_all_matches() {
        let mut headers = Headers::new();
        headers.append("Received", "a");
        headers.append("Subject", "s");
        headers.append("received", "b");
        headers.erase("RECEIVED");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Subject"), Some("s"));
    }

    #[test]
    fn test_entry_appends_empty_slot() {
        let mut headers = Headers::new();
        *headers.entry("Subject") = "hello".to_string();
        assert_eq!(headers.get("Subject"), Some("hello"));
        headers.entry("Subject").clear();
        assert_eq!(headers.get("Subject"), Some(""));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_value_part() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/plain; charset=utf-8");
        assert_eq!(headers.value("Content-Type"), "text/plain");
        assert_eq!(headers.value("Missing"), "");
    }

    #[test]
    fn test_set_value_keeps_parameters() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/plain; charset=utf-8");
        headers.set_value("Content-Type", "text/html");
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/html; charset=utf-8")
        );
    }

    #[test]
    fn test_parameter_bare_and_quoted() {
        let mut headers = Headers::new();
        headers.set(
            "Content-Type",
            "multipart/mixed; boundary=\"--=_Part_1\"; charset=utf-8",
        );
        assert_eq!(
            headers.parameter("Content-Type", "boundary").as_deref(),
            Some("--=_Part_1")
        );
        assert_eq!(
            headers.parameter("Content-Type", "charset").as_deref(),
            Some("utf-8")
        );
        assert_eq!(headers.parameter("Content-Type", "name"), None);
    }

    #[test]
    fn test_parameter_skips_quoted_semicolons() {
        let mut headers = Headers::new();
        headers.set(
            "Content-Disposition",
            "attachment; filename=\"a;b.txt\"; size=42",
        );
        assert_eq!(
            headers
                .parameter("Content-Disposition", "filename")
                .as_deref(),
            Some("a;b.txt")
        );
        assert_eq!(
            headers.parameter("Content-Disposition", "size").as_deref(),
            Some("42")
        );
    }

    #[test]
    fn test_set_parameter_quotes_when_needed() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "multipart/mixed");
        headers.set_parameter("Content-Type", "boundary", "a;b c");
        assert_eq!(
            headers.get("Content-Type"),
            Some("multipart/mixed; boundary=\"a;b c\"")
        );
        assert_eq!(
            headers.parameter("Content-Type", "boundary").as_deref(),
            Some("a;b c")
        );
    }

    #[test]
    fn test_set_parameter_replaces_existing() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/plain; charset=us-ascii; format=flowed");
        headers.set_parameter("Content-Type", "charset", "utf-8");
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=utf-8; format=flowed")
        );
    }

    #[test]
    fn test_set_parameter_on_missing_field() {
        let mut headers = Headers::new();
        headers.set_parameter("Content-Disposition", "filename", "f.txt");
        assert_eq!(headers.get("Content-Disposition"), Some("; filename=f.txt"));
        assert_eq!(headers.value("Content-Disposition"), "");
    }

    #[test]
    fn test_quote_escapes_embedded_quotes() {
        let mut headers = Headers::new();
        headers.set("Content-Disposition", "attachment");
        headers.set_parameter("Content-Disposition", "filename", "a\"b\\c");
        assert_eq!(
            headers
                .parameter("Content-Disposition", "filename")
                .as_deref(),
            Some("a\"b\\c")
        );
    }
}
