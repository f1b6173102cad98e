//! Tree-rewriting and lookup operations.
//!
//! These transform the part tree while keeping its structural
//! invariants: exactly one of body/children active per node, a
//! non-empty boundary on every multipart node, and a Content-Type
//! header that agrees with the structure.

use tracing::debug;

use crate::encoding::generate_boundary;
use crate::error::Result;
use crate::part::{Part, types_match};

fn type_predicate(mime_type: &str) -> impl Fn(&Part) -> bool + '_ {
    move |part: &Part| {
        let part_type = part.mime_type();
        types_match(
            if part_type.is_empty() {
                "text/plain"
            } else {
                part_type
            },
            mime_type,
        )
    }
}

impl Part {
    /// Turns this part into a `multipart/<subtype>` container with a
    /// generated boundary. See [`Part::make_multipart_with_boundary`].
    pub fn make_multipart(&mut self, subtype: &str) {
        self.make_multipart_with_boundary(subtype, None);
    }

    /// Turns this part into a `multipart/<subtype>` container.
    ///
    /// No-op if it already is one of that subtype. An existing
    /// multipart of a *different* subtype is wrapped whole (children,
    /// boundary, preamble/epilogue, Content-Type/-Disposition) into a
    /// single child of the new container. A singlepart with a non-empty
    /// body has that body moved into a new child carrying the original
    /// Content-Type/-Disposition.
    ///
    /// The boundary is taken from `boundary` if given, kept if already
    /// set, and freshly generated otherwise. A top-level message also
    /// gains `MIME-Version: 1.0`.
    pub fn make_multipart_with_boundary(&mut self, subtype: &str, boundary: Option<&str>) {
        if self.multipart {
            if self.is_multipart_subtype(subtype) {
                return;
            }
            let mut inner = Part::new();
            inner.preamble = std::mem::take(&mut self.preamble);
            inner.epilogue = std::mem::take(&mut self.epilogue);
            inner.parts = std::mem::take(&mut self.parts);
            inner.boundary = std::mem::take(&mut self.boundary);
            inner.multipart = true;
            inner.line_ending = self.line_ending;
            inner
                .headers
                .set("Content-Type", self.header("Content-Type").unwrap_or_default());
            inner.headers.set(
                "Content-Disposition",
                self.header("Content-Disposition").unwrap_or_default(),
            );
            self.headers.erase("Content-Disposition");
            self.parts.push(inner);
        } else {
            self.multipart = true;

            if self.message {
                self.headers.set("MIME-Version", "1.0");
            }

            if !self.body.is_empty() {
                let mut inner = Part::new();
                inner
                    .headers
                    .set("Content-Type", self.header("Content-Type").unwrap_or_default());
                inner.headers.set(
                    "Content-Disposition",
                    self.header("Content-Disposition").unwrap_or_default(),
                );
                inner.body = std::mem::take(&mut self.body);
                self.headers.erase("Content-Disposition");
                self.parts.push(inner);
            }
        }

        if let Some(suggested) = boundary {
            if !suggested.is_empty() {
                self.set_boundary(suggested);
            }
        }
        if self.boundary.is_empty() {
            self.boundary = generate_boundary();
        }

        debug!(subtype, boundary = %self.boundary, "made multipart");
        let content_type = format!("multipart/{subtype}; boundary={}", self.boundary);
        self.headers.set("Content-Type", content_type);
    }

    /// Collapses unnecessary multipart wrapping.
    ///
    /// Succeeds trivially on a singlepart. With zero children the part
    /// becomes an empty singlepart; with exactly one child that child's
    /// Content-Type/-Disposition and body (or children and boundary)
    /// are absorbed. Returns `false`, leaving the tree unmodified, when
    /// more than one child is present.
    pub fn flatten(&mut self) -> bool {
        if !self.multipart {
            return true;
        }
        if self.parts.len() > 1 {
            return false;
        }

        let Some(child) = self.parts.pop() else {
            self.multipart = false;
            return true;
        };

        self.headers
            .set("Content-Type", child.header("Content-Type").unwrap_or_default());
        self.headers.set(
            "Content-Disposition",
            child.header("Content-Disposition").unwrap_or_default(),
        );

        if child.multipart {
            self.parts = child.parts;
            self.boundary = child.boundary;
        } else {
            self.multipart = false;
            self.body = child.body;
            self.boundary.clear();
            self.preamble.clear();
            self.epilogue.clear();
        }

        true
    }

    /// Post-order cleanup: recurses into every child, drops children
    /// that end up with no headers and an empty body, strips multipart
    /// markers once no children remain, and flattens a single remaining
    /// child. Never leaves a multipart node with exactly one child.
    pub fn simplify(&mut self) {
        if !self.multipart {
            return;
        }

        for part in &mut self.parts {
            part.simplify();
        }

        self.parts
            .retain(|part| !(part.headers.is_empty() && part.body.is_empty()));

        if self.parts.is_empty() {
            if self.message {
                // Keep a usable message object.
                self.headers.erase("Content-Type");
                self.headers.erase("Content-Disposition");
                self.multipart = false;
                self.boundary.clear();
                self.preamble.clear();
                self.epilogue.clear();
            } else {
                self.clear();
            }
        } else if self.parts.len() == 1 {
            self.flatten();
        }
    }

    /// Pre-order depth-first search for the first part matching the
    /// predicate. An empty singlepart node (no headers, no body) is
    /// treated as absent unless it is the search root, and a part
    /// flagged `Content-Disposition: attachment` is never matched.
    pub fn find_part<P>(&self, predicate: P) -> Option<&Part>
    where
        P: Fn(&Part) -> bool,
    {
        let path = self.find_path(&predicate)?;
        Some(self.descend(&path))
    }

    /// Mutable variant of [`Part::find_part`].
    pub fn find_part_mut<P>(&mut self, predicate: P) -> Option<&mut Part>
    where
        P: Fn(&Part) -> bool,
    {
        let path = self.find_path(&predicate)?;
        Some(self.descend_mut(&path))
    }

    /// Finds the first part matching a MIME type. A part without a
    /// Content-Type counts as `text/plain`; a bare top-level token
    /// (e.g. `text`) matches any subtype of it.
    #[must_use]
    pub fn find_type(&self, mime_type: &str) -> Option<&Part> {
        self.find_part(type_predicate(mime_type))
    }

    /// Mutable variant of [`Part::find_type`].
    pub fn find_type_mut(&mut self, mime_type: &str) -> Option<&mut Part> {
        self.find_part_mut(type_predicate(mime_type))
    }

    /// The decoded body of the first part matching a MIME type.
    ///
    /// # Errors
    ///
    /// Returns an error if the matched body cannot be transfer-decoded
    /// to UTF-8 text.
    pub fn find_body(&self, mime_type: &str) -> Result<Option<String>> {
        self.find_type(mime_type).map(Part::body_text).transpose()
    }

    fn find_path(&self, predicate: &dyn Fn(&Part) -> bool) -> Option<Vec<usize>> {
        fn walk(
            part: &Part,
            predicate: &dyn Fn(&Part) -> bool,
            is_root: bool,
            path: &mut Vec<usize>,
        ) -> bool {
            if !part.multipart {
                if !is_root && part.headers.is_empty() && part.body.is_empty() {
                    return false;
                }
                if part.is_attachment() {
                    return false;
                }
            }
            if predicate(part) {
                return true;
            }
            for (index, child) in part.parts.iter().enumerate() {
                path.push(index);
                if walk(child, predicate, false, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        walk(self, predicate, true, &mut path).then_some(path)
    }

    fn find_type_path(&self, mime_type: &str) -> Option<Vec<usize>> {
        self.find_path(&type_predicate(mime_type))
    }

    fn descend(&self, path: &[usize]) -> &Part {
        path.iter().fold(self, |part, &index| &part.parts[index])
    }

    fn descend_mut(&mut self, path: &[usize]) -> &mut Part {
        path.iter()
            .fold(self, |part, &index| &mut part.parts[index])
    }

    /// Inserts or replaces a `text/<subtype>` rendition of the content,
    /// creating `multipart/alternative` or `multipart/mixed` structure
    /// as needed, and returns the part that received the text.
    pub fn set_alternative(&mut self, subtype: &str, text: &str) -> &mut Part {
        let mime_type = format!("text/{subtype}");
        let (path, reuse) = self.alternative_slot(&mime_type);
        let part = self.descend_mut(&path);
        if reuse {
            // Keep the existing Content-Type parameters.
            part.set_mime_type(&mime_type);
        } else {
            part.headers.set("Content-Type", mime_type);
        }
        part.body = text.to_string();
        part
    }

    /// Decides where new alternative text goes, creating structure as
    /// needed, and returns the index path of the target part. `reuse`
    /// marks an existing part of the same type being overwritten in
    /// place.
    fn alternative_slot(&mut self, mime_type: &str) -> (Vec<usize>, bool) {
        if !self.multipart {
            // An empty or same-typed body is replaced directly.
            if self.body.is_empty() || self.is_mime_type(mime_type) {
                return (Vec::new(), false);
            }
            // Inline text gains an alternative rendition.
            if self.is_mime_type("text") && !self.is_attachment() {
                self.make_multipart("alternative");
                self.push_part(Part::new());
                return (vec![self.parts.len() - 1], false);
            }
            // Anything else becomes mixed, with the text up front.
            self.make_multipart("mixed");
            self.push_part_front(Part::new());
            return (vec![0], false);
        }

        // A part of the same type is reused in place.
        if let Some(path) = self.find_type_path(mime_type) {
            return (path, true);
        }

        // An existing alternative group with text gets one more member.
        if let Some(mut path) = self.find_path(&|part: &Part| {
            part.is_multipart_subtype("alternative")
                && !part.parts().is_empty()
                && part.find_type("text").is_some()
        }) {
            let group = self.descend_mut(&path);
            group.push_part(Part::new());
            path.push(group.parts.len() - 1);
            return (path, false);
        }

        // Existing inline text is converted to an alternative group.
        if let Some(mut path) = self.find_type_path("text") {
            let target = self.descend_mut(&path);
            target.make_multipart("alternative");
            target.push_part(Part::new());
            path.push(target.parts.len() - 1);
            return (path, false);
        }

        // Otherwise assume multipart/mixed and prepend.
        self.push_part_front(Part::new());
        (vec![0], false)
    }

    /// Sets the `text/plain` rendition, returning the part holding it.
    pub fn set_plain(&mut self, text: &str) -> &mut Part {
        self.set_alternative("plain", text)
    }

    /// Sets the `text/html` rendition, returning the part holding it.
    pub fn set_html(&mut self, html: &str) -> &mut Part {
        self.set_alternative("html", html)
    }

    /// The decoded body of the first text part of any subtype.
    ///
    /// # Errors
    ///
    /// Returns an error if the matched body cannot be decoded.
    pub fn text(&self) -> Result<Option<String>> {
        self.find_body("text")
    }

    /// The decoded body of the first `text/plain` part.
    ///
    /// # Errors
    ///
    /// Returns an error if the matched body cannot be decoded.
    pub fn plain(&self) -> Result<Option<String>> {
        self.find_body("text/plain")
    }

    /// The decoded body of the first `text/html` part.
    ///
    /// # Errors
    ///
    /// Returns an error if the matched body cannot be decoded.
    pub fn html(&self) -> Result<Option<String>> {
        self.find_body("text/html")
    }

    /// Whether any text part is present.
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.find_type("text").is_some()
    }

    /// Whether a `text/plain` part is present.
    #[must_use]
    pub fn has_plain(&self) -> bool {
        self.find_type("text/plain").is_some()
    }

    /// Whether a `text/html` part is present.
    #[must_use]
    pub fn has_html(&self) -> bool {
        self.find_type("text/html").is_some()
    }

    /// Attaches raw data as an `attachment`-disposition part of the
    /// given MIME type (defaulting to `text/plain`), with an optional
    /// `filename` parameter, and returns the part holding it.
    ///
    /// An empty singlepart is populated directly; otherwise the part
    /// becomes `multipart/mixed` and the attachment is appended.
    pub fn attach(
        &mut self,
        data: impl Into<String>,
        mime_type: &str,
        filename: Option<&str>,
    ) -> &mut Part {
        let data = data.into();
        if !self.multipart && self.body.is_empty() {
            self.fill_attachment(data, mime_type, filename);
            return self;
        }

        self.make_multipart("mixed");
        let part = self.push_part(Part::new());
        part.fill_attachment(data, mime_type, filename);
        part
    }

    fn fill_attachment(&mut self, data: String, mime_type: &str, filename: Option<&str>) {
        self.headers.set(
            "Content-Type",
            if mime_type.is_empty() {
                "text/plain"
            } else {
                mime_type
            },
        );
        self.headers.set("Content-Disposition", "attachment");
        if let Some(filename) = filename {
            self.headers
                .set_parameter("Content-Disposition", "filename", filename);
        }
        self.body = data;
    }

    /// Attaches a copy of another part. A part flagged as a top-level
    /// message is serialized and attached as `message/rfc822`; anything
    /// else contributes its Content-Type and raw body.
    ///
    /// # Errors
    ///
    /// Returns an error if an attached message fails to serialize.
    pub fn attach_part(&mut self, attachment: &Part) -> Result<&mut Part> {
        let (content_type, body) = if attachment.is_message() {
            ("message/rfc822".to_string(), attachment.render()?)
        } else {
            (
                attachment
                    .header("Content-Type")
                    .unwrap_or_default()
                    .to_string(),
                attachment.body().to_string(),
            )
        };

        if !self.multipart && self.body.is_empty() {
            self.headers.set("Content-Type", content_type);
            self.headers.set("Content-Disposition", "attachment");
            self.body = body;
            return Ok(self);
        }

        self.make_multipart("mixed");
        let part = self.push_part(Part::new());
        part.headers.set("Content-Type", content_type);
        part.headers.set("Content-Disposition", "attachment");
        part.body = body;
        Ok(part)
    }

    /// Collects every singlepart node, at any depth, whose
    /// Content-Disposition is `attachment`.
    #[must_use]
    pub fn attachments(&self) -> Vec<&Part> {
        let mut found = Vec::new();
        self.collect_attachments(&mut found);
        found
    }

    fn collect_attachments<'a>(&'a self, found: &mut Vec<&'a Part>) {
        if !self.multipart && self.is_attachment() {
            found.push(self);
            return;
        }
        for part in &self.parts {
            part.collect_attachments(found);
        }
    }

    /// Whether this part or any descendant is an attachment.
    #[must_use]
    pub fn has_attachments(&self) -> bool {
        self.is_attachment() || self.parts.iter().any(Part::has_attachments)
    }

    /// Removes every attachment part, then simplifies the remaining
    /// structure.
    pub fn clear_attachments(&mut self) {
        if !self.multipart {
            if self.is_attachment() {
                if self.message {
                    self.headers.erase("Content-Type");
                    self.headers.erase("Content-Disposition");
                    self.body.clear();
                } else {
                    self.clear();
                }
            }
        } else {
            for part in &mut self.parts {
                part.clear_attachments();
            }
            self.simplify();
        }
    }

    /// Clears every part matching the MIME type, then simplifies.
    pub fn clear_alternative(&mut self, mime_type: &str) {
        let mut cleared = false;
        while let Some(path) = self.find_type_path(mime_type) {
            let part = self.descend_mut(&path);
            if part.headers.is_empty() && part.body.is_empty() {
                // Only an already-cleared search root still matches.
                break;
            }
            part.clear();
            cleared = true;
        }

        if cleared {
            debug!(mime_type, "cleared alternative parts");
            self.simplify();
        }
    }

    /// Removes all text parts of any subtype.
    pub fn clear_text(&mut self) {
        self.clear_alternative("text");
    }

    /// Removes all `text/plain` parts.
    pub fn clear_plain(&mut self) {
        self.clear_alternative("text/plain");
    }

    /// Removes all `text/html` parts.
    pub fn clear_html(&mut self) {
        self.clear_alternative("text/html");
    }
}
