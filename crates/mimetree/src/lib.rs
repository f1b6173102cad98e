//! # mimetree
//!
//! RFC2822/MIME message tree library: recursive multipart parsing,
//! semantic rewriting, faithful serialization.
//!
//! ## Features
//!
//! - **Message parsing**: Recursive boundary-aware multipart parsing
//! - **Faithful output**: Bodies stay wire-encoded; per-part line
//!   endings and header order survive a parse/serialize round trip
//! - **Tree rewriting**: Promote parts to multipart, flatten, simplify,
//!   set alternative text renditions, attach and strip attachments
//! - **Header access**: Ordered case-insensitive header store with
//!   structured value/parameter editing
//! - **Encoding/Decoding**: Base64, Quoted-Printable, charset
//!   conversion for body text
//!
//! ## Quick Start
//!
//! ### Parsing Messages
//!
//! ```ignore
//! use mimetree::Part;
//!
//! let raw = "From: sender@example.com\r\n\
//!            Subject: Test\r\n\
//!            Content-Type: text/plain\r\n\
//!            \r\n\
//!            Hello, World!\r\n";
//!
//! let message = Part::parse_message(raw)?;
//! println!("Subject: {}", message.header_value("Subject"));
//! println!("Body: {}", message.text()?.unwrap_or_default());
//! ```
//!
//! ### Building Messages
//!
//! ```ignore
//! use mimetree::Part;
//!
//! let mut message = Part::new_message();
//! message.set_header("From", "sender@example.com");
//! message.set_header("To", "recipient@example.com");
//! message.set_header("Subject", "Test");
//! message.set_plain("Plain text version\r\n");
//! message.set_html("<p>HTML version</p>\r\n"); // multipart/alternative
//! message.attach("col1,col2\r\n", "text/csv", Some("data.csv"));
//!
//! println!("{}", message.render()?);
//! ```
//!
//! ### Rewriting the Tree
//!
//! ```ignore
//! use mimetree::Part;
//!
//! let mut message = Part::parse_message(&raw)?;
//! message.clear_html();
//! message.clear_attachments();
//! message.simplify(); // collapse now-redundant multipart nesting
//! ```

#![forbid(unsafe_code)]

mod error;
mod header;
mod ops;
mod parse;
mod part;
mod render;

pub mod charset;
pub mod encoding;

pub use error::{Error, Result};
pub use header::Headers;
pub use parse::MAX_NESTING_DEPTH;
pub use part::{LineEnding, Part};
