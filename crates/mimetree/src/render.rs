//! Serialization of a part tree back to wire bytes.

use crate::error::{Error, Result};
use crate::part::Part;

impl Part {
    /// Serializes this part (and recursively its children) using each
    /// node's own line-ending convention. Headers with an empty value
    /// are omitted from output.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::EmptyTopLevelHeaders`] if this part is a
    /// top-level message and no headers would be emitted. Nothing else
    /// can fail; on error the partial buffer is discarded.
    pub fn render(&self) -> Result<String> {
        let mut out = String::new();
        self.render_into(&mut out)?;
        Ok(out)
    }

    fn render_into(&self, out: &mut String) -> Result<()> {
        let eol = self.line_ending.as_str();

        let mut has_headers = false;
        for (field, value) in self.headers.iter() {
            if value.is_empty() {
                continue;
            }
            out.push_str(field);
            out.push_str(": ");
            out.push_str(value);
            out.push_str(eol);
            has_headers = true;
        }

        if self.message && !has_headers {
            return Err(Error::EmptyTopLevelHeaders);
        }

        out.push_str(eol);

        if self.parts.is_empty() {
            out.push_str(&self.body);
        } else {
            out.push_str(&self.preamble);
            for part in &self.parts {
                out.push_str("--");
                out.push_str(&self.boundary);
                out.push_str(eol);
                part.render_into(out)?;
            }
            out.push_str("--");
            out.push_str(&self.boundary);
            out.push_str("--");
            out.push_str(eol);
            out.push_str(&self.epilogue);
        }

        Ok(())
    }
}
