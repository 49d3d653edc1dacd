//! zmark - XML/HTML-like markup parser
//!
//! Parses markup into an owned [`Document`] tree, serializes it back, and
//! walks it with a filtered depth-first [`Search`].
//!
//! # Quick Start
//!
//! ```
//! use zmark::{parse, Filter, NodeKind};
//! # fn main() -> Result<(), zmark::Error> {
//! let doc = parse(r#"<hello abc="xyz" def="uvw"/>"#)?;
//! let hello = doc.find("hello").map(|el| el.num_attrs());
//! assert_eq!(hello, Some(2));
//! assert_eq!(doc.search(Filter::of_kind(NodeKind::Element)).count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! Lenient HTML-style input goes through [`Config::html`]:
//!
//! ```
//! use zmark::{parse_with_config, Config};
//! # fn main() -> Result<(), zmark::Error> {
//! let doc = parse_with_config("<P>one<BR>two</p>", Config::html())?;
//! assert_eq!(doc.outer(), "<p>one<br />two</p>");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod chars;

pub mod config;
pub use config::{is_void_element, Config, FormatConfig, DEFAULT_MAX_DEPTH, VOID_ELEMENTS};

pub mod entity;

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod lexer;

pub mod node;
pub use node::{Attributes, Document, Element, Leaf, Node, NodeKind, Text};

pub mod parser;
pub use parser::Parser;

pub mod search;
pub use search::{Filter, Search};

/// Parse markup with the strict XML preset
pub fn parse(input: &str) -> Result<Document> {
    Parser::new(input).parse()
}

/// Parse markup with a custom configuration
pub fn parse_with_config(input: &str, config: Config) -> Result<Document> {
    Parser::with_config(input, config).parse()
}

/// Parse markup from raw bytes, which must be UTF-8
pub fn from_bytes(bytes: &[u8], config: Config) -> Result<Document> {
    let input = std::str::from_utf8(bytes).map_err(|err| {
        let prefix = bytes.get(..err.valid_up_to()).unwrap_or_default();
        let mut cursor = lexer::Cursor::new(prefix);
        cursor.advance_by(prefix.len());
        let pos = cursor.position();
        Error::new(ErrorKind::InvalidUtf8, Span::new(pos, pos))
    })?;
    parse_with_config(input, config)
}
