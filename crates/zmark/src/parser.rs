//! Markup parser
//!
//! A single pass over the input. Each step looks at the next few bytes,
//! picks a construct (entity, comment, CDATA, declaration, processing
//! instruction, tag or text) and consumes it whole. Open elements live on an
//! explicit stack of owned [`Element`]s; closing one moves it into its
//! parent (or the document).

use tracing::{debug, instrument, trace};

use crate::chars::{is_name_start, is_space, is_special, name_len};
use crate::config::{is_void_element, Config};
use crate::entity::{decode_with, resolve, scan_reference};
use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::lexer::{balanced_len, Cursor, Quotes};
use crate::node::{validate_doctype, Attributes, Document, Element, Leaf, Node, Text};

/// An element whose closing tag has not been seen yet
#[derive(Debug)]
struct Open {
    element: Element,
    start: Pos,
}

/// How a tag delimits its element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TagKind {
    Opening,
    SelfClosing,
    Closing,
}

/// Markup parser producing a [`Document`]
#[derive(Debug)]
pub struct Parser<'a> {
    source: &'a str,
    cursor: Cursor<'a>,
    config: Config,
    doc: Document,
    stack: Vec<Open>,
}

impl<'a> Parser<'a> {
    /// Create a parser with the strict XML preset
    pub fn new(input: &'a str) -> Self {
        Self::with_config(input, Config::default())
    }

    pub fn with_config(input: &'a str, config: Config) -> Self {
        Self {
            source: input,
            cursor: Cursor::new(input.as_bytes()),
            config,
            doc: Document::empty(config),
            stack: Vec::new(),
        }
    }

    /// Parse the whole input into a document
    #[instrument(level = "debug", skip_all, fields(len = self.source.len()))]
    pub fn parse(&mut self) -> Result<Document> {
        while !self.cursor.is_eof() {
            self.step()?;
        }
        self.finish()
    }

    fn step(&mut self) -> Result<()> {
        let rest = self.cursor.remaining();
        match rest {
            [b'&', ..] => self.parse_entity(),
            _ if rest.starts_with(b"<!--") => self.parse_comment(),
            _ if rest.starts_with(b"<![") => self.parse_cdata(),
            [b'<', b'!', b'D' | b'd', ..] => self.parse_doctype(),
            _ if self.at_xml_decl() => self.parse_xml_decl(),
            [b'<', b'?', ..] => self.parse_processing_instruction(),
            [b'<', b'/', ..] => self.parse_tag(),
            [b'<', next, ..] if is_name_start(*next) => self.parse_tag(),
            [b, ..] if is_special(*b) => self.parse_lone_special(*b),
            _ => self.parse_text(),
        }
    }

    /// `<?xml` followed by whitespace, `?` or end of input
    fn at_xml_decl(&self) -> bool {
        self.cursor.starts_with_ignore_case(b"<?xml")
            && self
                .cursor
                .peek(5)
                .map_or(true, |b| is_space(b) || b == b'?')
    }

    fn parse_entity(&mut self) -> Result<()> {
        let Some((len, reference)) = scan_reference(self.cursor.remaining()) else {
            return self.parse_lone_special(b'&');
        };
        trace!(offset = self.cursor.pos(), "entity reference");

        let node = match resolve(reference, self.config.extended_entities) {
            Some(ch) => Node::Text(Text::new(ch.encode_utf8(&mut [0; 4]))),
            None => Node::EntityRef(Leaf::new(self.slice(len))),
        };
        self.append(node);
        self.cursor.advance_by(len);
        Ok(())
    }

    fn parse_comment(&mut self) -> Result<()> {
        let end = self
            .cursor
            .find(b"-->", 4)
            .ok_or_else(|| self.malformed("comment"))?;
        let len = end + 3;

        if self.config.keep_comments {
            let raw = self.slice(len);
            self.append(Node::Comment(Leaf::new(raw)));
        } else {
            debug!(offset = self.cursor.pos(), "dropping comment");
        }
        self.cursor.advance_by(len);
        Ok(())
    }

    fn parse_cdata(&mut self) -> Result<()> {
        if !self.cursor.starts_with(b"<![CDATA[") {
            return Err(self.malformed("CDATA section"));
        }
        let end = self
            .cursor
            .find(b"]]>", 9)
            .ok_or_else(|| self.malformed("CDATA section"))?;
        let len = end + 3;
        trace!(offset = self.cursor.pos(), "cdata");

        let raw = self.slice(len);
        self.append(Node::Cdata(Leaf::new(raw)));
        self.cursor.advance_by(len);
        Ok(())
    }

    fn parse_doctype(&mut self) -> Result<()> {
        if !self.cursor.starts_with_ignore_case(b"<!DOCTYPE") {
            return Err(self.malformed("declaration"));
        }
        let len = balanced_len(self.cursor.remaining(), Quotes::Double)
            .ok_or_else(|| self.malformed("document type declaration"))?;
        let raw = self.slice(len);

        let placed = self.stack.is_empty() && !self.doc.has_element() && self.doc.doctype().is_none();
        if !placed {
            return Err(self.error(ErrorKind::MisplacedDeclaration, raw));
        }
        validate_doctype(raw).map_err(|err| self.error(err.kind().clone(), raw))?;
        trace!(offset = self.cursor.pos(), "doctype");

        self.doc.push_child(Node::Dtd(Leaf::new(raw)));
        self.cursor.advance_by(len);
        self.cursor.consume_line_break();
        Ok(())
    }

    fn parse_xml_decl(&mut self) -> Result<()> {
        let len = balanced_len(self.cursor.remaining(), Quotes::Both)
            .ok_or_else(|| self.malformed("XML declaration"))?;
        let raw = self.slice(len);
        if !raw.ends_with("?>") || raw.len() < 7 {
            return Err(self.malformed("XML declaration"));
        }
        if !self.stack.is_empty() || !self.doc.children().is_empty() {
            return Err(self.error(ErrorKind::MisplacedDeclaration, raw));
        }
        trace!(offset = self.cursor.pos(), "xml declaration");

        self.doc.push_child(Node::XmlDecl(Leaf::new(raw)));
        self.cursor.advance_by(len);
        self.cursor.consume_line_break();
        Ok(())
    }

    fn parse_processing_instruction(&mut self) -> Result<()> {
        let end = self
            .cursor
            .find(b"?>", 2)
            .ok_or_else(|| self.malformed("processing instruction"))?;
        let len = end + 2;
        let raw = self.slice(len);

        let target_len = self.cursor.remaining().get(2..).map_or(0, name_len);
        if target_len == 0 {
            return Err(self.error(
                ErrorKind::InvalidName {
                    name: raw.get(2..end).unwrap_or_default().to_string(),
                },
                raw,
            ));
        }
        trace!(offset = self.cursor.pos(), "processing instruction");

        self.append(Node::ProcessingInstruction(Leaf::new(raw)));
        self.cursor.advance_by(len);
        Ok(())
    }

    fn parse_tag(&mut self) -> Result<()> {
        let len = balanced_len(self.cursor.remaining(), Quotes::Both)
            .ok_or_else(|| self.malformed("tag"))?;
        let raw = self.slice(len);
        let start = self.cursor.position();

        let (mut kind, body) = if let Some(body) = raw.strip_prefix("</") {
            (TagKind::Closing, body.strip_suffix('>').unwrap_or(body))
        } else if let Some(body) = raw.strip_suffix("/>") {
            (TagKind::SelfClosing, body.get(1..).unwrap_or_default())
        } else {
            let body = raw.strip_suffix('>').unwrap_or(raw);
            (TagKind::Opening, body.get(1..).unwrap_or_default())
        };

        let name_end = name_len(body.as_bytes());
        let (name, rest) = body.split_at(name_end);
        if name.is_empty() || rest.bytes().next().is_some_and(|b| !is_space(b)) {
            return Err(self.error(
                ErrorKind::InvalidName {
                    name: first_word(body).to_string(),
                },
                raw,
            ));
        }
        let name = self.fold_case(name);

        if kind == TagKind::Closing {
            if !rest.bytes().all(is_space) {
                return Err(self.malformed_at("closing tag", raw));
            }
            self.close(&name, raw)?;
            self.cursor.advance_by(len);
            return Ok(());
        }

        let attributes = self.parse_attributes(rest, raw)?;
        if kind == TagKind::Opening && self.config.self_closing_void && is_void_element(&name) {
            kind = TagKind::SelfClosing;
        }
        trace!(offset = start.offset, name = %name, "tag");

        let element = Element::from_parts(name, attributes);
        match kind {
            TagKind::Opening => {
                let max = self.config.max_depth;
                if max > 0 && self.stack.len() >= usize::from(max) {
                    return Err(self.error(ErrorKind::MaxDepthExceeded { max }, raw));
                }
                self.stack.push(Open { element, start });
            }
            _ => self.append(Node::Element(element)),
        }
        self.cursor.advance_by(len);
        Ok(())
    }

    /// Read `key` / `key=value` pairs from the part of a tag after its name
    fn parse_attributes(&self, mut rest: &str, raw: &str) -> Result<Attributes> {
        let mut attributes = Attributes::new();

        loop {
            rest = trim_space(rest);
            if rest.is_empty() {
                return Ok(attributes);
            }

            let key_len = name_len(rest.as_bytes());
            if key_len == 0 {
                return Err(self.error(
                    ErrorKind::InvalidName {
                        name: first_word(rest).to_string(),
                    },
                    raw,
                ));
            }
            let (key, after_key) = rest.split_at(key_len);
            let key = self.fold_case(key);
            let after_space = trim_space(after_key);

            let value = if let Some(after_eq) = after_space.strip_prefix('=') {
                let (value, remainder) = self.attribute_value(trim_space(after_eq), &key, raw)?;
                rest = remainder;
                decode_with(value, self.config.extended_entities).into_owned()
            } else {
                if after_key.bytes().next().is_some_and(|b| !is_space(b)) {
                    return Err(self.error(
                        ErrorKind::InvalidName {
                            name: first_word(rest).to_string(),
                        },
                        raw,
                    ));
                }
                if !self.config.key_only_attributes {
                    return Err(self.error(ErrorKind::InvalidAttribute { name: key }, raw));
                }
                rest = after_key;
                key.clone()
            };

            if !attributes.insert_unique(key.clone(), value) {
                return Err(self.error(ErrorKind::DuplicateAttribute { name: key }, raw));
            }
        }
    }

    /// Split a quoted or bare value off the front of `input`
    fn attribute_value<'s>(&self, input: &'s str, key: &str, raw: &str) -> Result<(&'s str, &'s str)> {
        match input.as_bytes().first() {
            Some(&quote @ (b'"' | b'\'')) => {
                let body = input.get(1..).unwrap_or_default();
                let end = body
                    .bytes()
                    .position(|b| b == quote)
                    .ok_or_else(|| self.malformed_at("attribute value", raw))?;
                let (value, tail) = body.split_at(end);
                Ok((value, tail.get(1..).unwrap_or_default()))
            }
            Some(_) => {
                let end = input.bytes().position(is_space).unwrap_or(input.len());
                Ok(input.split_at(end))
            }
            None => Err(self.error(
                ErrorKind::InvalidAttribute {
                    name: key.to_string(),
                },
                raw,
            )),
        }
    }

    fn close(&mut self, name: &str, raw: &str) -> Result<()> {
        if self.stack.last().is_some_and(|open| open.element.name() == name) {
            self.pop_into_parent();
            return Ok(());
        }

        if self.config.auto_close {
            if let Some(depth) = self.stack.iter().rposition(|open| open.element.name() == name) {
                while self.stack.len() > depth + 1 {
                    if let Some(open) = self.stack.last() {
                        debug!(name = open.element.name(), closed_by = name, "implicitly closing element");
                    }
                    self.pop_into_parent();
                }
                self.pop_into_parent();
                return Ok(());
            }
        }

        if self.config.self_closing_void && is_void_element(name) {
            debug!(name, "ignoring closing tag of void element");
            return Ok(());
        }

        Err(self.error(
            ErrorKind::UnmatchedClosingTag {
                name: name.to_string(),
            },
            raw,
        ))
    }

    fn parse_text(&mut self) -> Result<()> {
        let rest = self.cursor.remaining();
        let len = rest.iter().position(|&b| is_special(b)).unwrap_or(rest.len());
        let raw = self.slice(len);
        self.append(Node::Text(Text::from_encoded(raw)));
        self.cursor.advance_by(len);
        Ok(())
    }

    /// A `<` or `&` that starts no construct is escaped as text
    fn parse_lone_special(&mut self, b: u8) -> Result<()> {
        let escaped = if b == b'<' { "&lt;" } else { "&amp;" };
        self.append(Node::Text(Text::from_encoded(escaped)));
        self.cursor.advance();
        Ok(())
    }

    fn finish(&mut self) -> Result<Document> {
        if !self.config.auto_close {
            if let Some(open) = self.stack.last() {
                let name = open.element.name().to_string();
                let span = Span::new(open.start, self.cursor.position());
                return Err(Error::new(ErrorKind::UnclosedElement { name: name.clone() }, span)
                    .with_fragment(&format!("<{name}")));
            }
        }
        while let Some(open) = self.stack.last() {
            debug!(name = open.element.name(), "closing element at end of input");
            self.pop_into_parent();
        }

        let mut doc = std::mem::replace(&mut self.doc, Document::empty(self.config));
        if self.config.fold_whitespace {
            doc.fold_text();
        }
        if doc.seed_declaration() {
            debug!("added default XML declaration");
        }
        Ok(doc)
    }

    /// Append to the innermost open element, or the document
    fn append(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(open) => open.element.push_child(node),
            None => self.doc.push_child(node),
        }
    }

    /// Text is folded once an element is complete, so that runs split by
    /// entity references fold as one
    fn pop_into_parent(&mut self) {
        if let Some(mut open) = self.stack.pop() {
            if self.config.fold_whitespace {
                open.element.fold_text();
            }
            self.append(Node::Element(open.element));
        }
    }

    fn fold_case(&self, name: &str) -> String {
        if self.config.case_insensitive {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }

    /// `len` bytes of source from the cursor
    fn slice(&self, len: usize) -> &'a str {
        let start = self.cursor.pos();
        self.source.get(start..start + len).unwrap_or_default()
    }

    fn error(&self, kind: ErrorKind, fragment: &str) -> Error {
        let pos = self.cursor.position();
        Error::new(kind, Span::new(pos, pos)).with_fragment(fragment)
    }

    fn malformed(&self, construct: &'static str) -> Error {
        let rest = self.slice(self.cursor.remaining().len());
        self.malformed_at(construct, rest)
    }

    fn malformed_at(&self, construct: &'static str, fragment: &str) -> Error {
        self.error(ErrorKind::Malformed { construct }, fragment)
    }
}

fn trim_space(s: &str) -> &str {
    s.trim_start_matches([' ', '\t', '\r', '\n'])
}

/// Leading word of `s` for error reports; at least one character
fn first_word(s: &str) -> &str {
    let end = match s
        .bytes()
        .position(|b| is_space(b) || b == b'>' || b == b'/' || b == b'=')
    {
        Some(0) => s.chars().next().map_or(0, char::len_utf8),
        Some(end) => end,
        None => s.len(),
    };
    s.get(..end).unwrap_or_default()
}
