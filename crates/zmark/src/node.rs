//! Document tree
//!
//! A tree is a [`Document`] owning an ordered list of [`Node`]s; each
//! [`Element`] owns its children the same way. There are no parent links:
//! the tree is built top-down and only ever walked downwards.
//!
//! Leaf nodes keep their full delimited source form (`<!--x-->`, `&name;`,
//! ...) so `outer()` reproduces them unchanged. Text keeps its escaped form.

pub mod attributes;
pub mod document;
pub mod element;
pub mod text;

pub use attributes::Attributes;
pub use document::Document;
pub use element::Element;
pub use text::Text;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chars::{is_name, is_space, name_len};
use crate::config::{Config, FormatConfig};
use crate::entity::{scan_reference, Reference};
use crate::error::{Error, ErrorKind, Result};
use crate::lexer::{balanced_len, Quotes};

pub const DEFAULT_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Kind tag of a node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Cdata,
    Comment,
    EntityRef,
    ProcessingInstruction,
    XmlDecl,
    Dtd,
}

impl NodeKind {
    pub const ALL: [Self; 9] = [
        Self::Document,
        Self::Element,
        Self::Text,
        Self::Cdata,
        Self::Comment,
        Self::EntityRef,
        Self::ProcessingInstruction,
        Self::XmlDecl,
        Self::Dtd,
    ];

    /// Kinds that may only appear at the start of a document
    pub const fn is_prologue(self) -> bool {
        matches!(self, Self::XmlDecl | Self::Dtd)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Element => "element",
            Self::Text => "text",
            Self::Cdata => "cdata",
            Self::Comment => "comment",
            Self::EntityRef => "entity-ref",
            Self::ProcessingInstruction => "processing-instruction",
            Self::XmlDecl => "xml-decl",
            Self::Dtd => "dtd",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delimited source text of a non-text leaf, stored verbatim
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaf {
    raw: String,
}

impl Leaf {
    pub(crate) fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// A node in the document tree
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    XmlDecl(Leaf),
    Dtd(Leaf),
    Cdata(Leaf),
    Comment(Leaf),
    EntityRef(Leaf),
    ProcessingInstruction(Leaf),
    Text(Text),
    Element(Element),
}

impl Node {
    /// `<?xml ...?>` from either the full declaration or just its pseudo-attributes
    pub fn xml_decl(content: &str) -> Result<Self> {
        let trimmed = content.trim();
        let raw = if starts_with_ignore_case(trimmed, "<?xml") {
            trimmed.to_string()
        } else {
            format!("<?xml {trimmed}?>")
        };
        let separated = raw
            .as_bytes()
            .get(5)
            .is_some_and(|&b| is_space(b) || b == b'?');
        if !separated || !raw.ends_with("?>") || !is_balanced(&raw, Quotes::Both) {
            return Err(Error::detached(ErrorKind::Malformed {
                construct: "XML declaration",
            }));
        }
        Ok(Self::XmlDecl(Leaf::new(raw)))
    }

    pub fn default_decl() -> Self {
        Self::XmlDecl(Leaf::new(DEFAULT_DECLARATION))
    }

    /// `<!DOCTYPE ...>` from either the full declaration or its body
    pub fn dtd(content: &str) -> Result<Self> {
        let trimmed = content.trim();
        let raw = if starts_with_ignore_case(trimmed, "<!DOCTYPE") {
            trimmed.to_string()
        } else {
            format!("<!DOCTYPE {trimmed}>")
        };
        if !is_balanced(&raw, Quotes::Double) {
            return Err(Error::detached(ErrorKind::Malformed {
                construct: "document type declaration",
            }));
        }
        validate_doctype(&raw)?;
        Ok(Self::Dtd(Leaf::new(raw)))
    }

    /// CDATA section; an embedded `]]>` is split across two sections
    pub fn cdata(text: &str) -> Self {
        let delimited = text
            .strip_prefix("<![CDATA[")
            .and_then(|rest| rest.strip_suffix("]]>"))
            .is_some_and(|body| !body.contains("]]>"));
        if delimited {
            return Self::Cdata(Leaf::new(text));
        }
        let body = text.replace("]]>", "]]]]><![CDATA[>");
        Self::Cdata(Leaf::new(format!("<![CDATA[{body}]]>")))
    }

    /// Comment; `--` sequences are broken up so the result stays well formed
    pub fn comment(text: &str) -> Self {
        let delimited = text
            .strip_prefix("<!--")
            .and_then(|rest| rest.strip_suffix("-->"))
            .is_some_and(|body| !body.contains("--") && !body.ends_with('-'));
        if delimited {
            return Self::Comment(Leaf::new(text));
        }
        let mut body = text.to_string();
        while body.contains("--") {
            body = body.replace("--", "- -");
        }
        if body.ends_with('-') {
            body.push(' ');
        }
        Self::Comment(Leaf::new(format!("<!--{body}-->")))
    }

    /// Unresolved entity reference, from `name` or `&name;`
    pub fn entity_ref(name: &str) -> Result<Self> {
        let raw = if name.starts_with('&') && name.ends_with(';') {
            name.to_string()
        } else {
            format!("&{name};")
        };
        match scan_reference(raw.as_bytes()) {
            Some((len, Reference::Named(_))) if len == raw.len() => {
                Ok(Self::EntityRef(Leaf::new(raw)))
            }
            _ => Err(Error::detached(ErrorKind::InvalidName {
                name: name.to_string(),
            })),
        }
    }

    /// Processing instruction from `<?target data?>` or `target data`
    pub fn processing_instruction(content: &str) -> Result<Self> {
        let raw = if content.starts_with("<?") && content.ends_with("?>") && content.len() >= 4 {
            content.to_string()
        } else {
            format!("<?{content}?>")
        };
        let body = raw.get(2..).unwrap_or_default();
        let target = body.get(..name_len(body.as_bytes())).unwrap_or_default();
        if target.is_empty() || target.eq_ignore_ascii_case("xml") {
            return Err(Error::detached(ErrorKind::InvalidName {
                name: content.to_string(),
            }));
        }
        // the first `?>` must be the closing one
        if body.find("?>").map(|end| end + 4) != Some(raw.len()) {
            return Err(Error::detached(ErrorKind::Malformed {
                construct: "processing instruction",
            }));
        }
        Ok(Self::ProcessingInstruction(Leaf::new(raw)))
    }

    /// Text from plain (unescaped) content
    pub fn text(plain: &str) -> Self {
        Self::Text(Text::new(plain))
    }

    /// Text from content that is already escaped
    pub fn text_encoded(escaped: &str) -> Self {
        Self::Text(Text::from_encoded(escaped))
    }

    /// Text honouring the `already_encoded` option
    pub fn text_with(content: &str, config: &Config) -> Self {
        if config.already_encoded {
            Self::text_encoded(content)
        } else {
            Self::text(content)
        }
    }

    pub fn element(name: &str) -> Result<Self> {
        Element::new(name).map(Self::Element)
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::XmlDecl(_) => NodeKind::XmlDecl,
            Self::Dtd(_) => NodeKind::Dtd,
            Self::Cdata(_) => NodeKind::Cdata,
            Self::Comment(_) => NodeKind::Comment,
            Self::EntityRef(_) => NodeKind::EntityRef,
            Self::ProcessingInstruction(_) => NodeKind::ProcessingInstruction,
            Self::Text(_) => NodeKind::Text,
            Self::Element(_) => NodeKind::Element,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Text between the delimiters of a leaf; empty for elements
    pub fn content(&self) -> &str {
        match self {
            Self::XmlDecl(leaf) => strip(leaf.as_str(), 5, "?>").trim(),
            Self::Dtd(leaf) => strip(leaf.as_str(), 9, ">").trim(),
            Self::Cdata(leaf) => strip(leaf.as_str(), 9, "]]>"),
            Self::Comment(leaf) => strip(leaf.as_str(), 4, "-->"),
            Self::EntityRef(leaf) => strip(leaf.as_str(), 1, ";"),
            Self::ProcessingInstruction(leaf) => strip(leaf.as_str(), 2, "?>"),
            Self::Text(text) => text.as_str(),
            Self::Element(_) => "",
        }
    }

    /// Serialized children; empty for leaves
    pub fn inner(&self) -> String {
        match self {
            Self::Element(element) => element.inner(),
            _ => String::new(),
        }
    }

    pub fn outer(&self) -> String {
        self.outer_with(FormatConfig::default())
    }

    pub fn outer_with(&self, format: FormatConfig) -> String {
        let mut out = String::new();
        self.write_outer(&mut out, format);
        out
    }

    pub(crate) fn write_outer(&self, out: &mut String, format: FormatConfig) {
        match self {
            Self::XmlDecl(leaf)
            | Self::Dtd(leaf)
            | Self::Cdata(leaf)
            | Self::Comment(leaf)
            | Self::EntityRef(leaf)
            | Self::ProcessingInstruction(leaf) => out.push_str(leaf.as_str()),
            Self::Text(text) => out.push_str(text.as_str()),
            Self::Element(element) => element.write_outer(out, format),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Self::Text(text)
    }
}

fn strip<'s>(raw: &'s str, open: usize, close: &str) -> &'s str {
    raw.strip_suffix(close)
        .and_then(|s| s.get(open..))
        .unwrap_or_default()
}

/// Whether the balanced `<`/`>` scan spans all of `raw`
fn is_balanced(raw: &str, quotes: Quotes) -> bool {
    balanced_len(raw.as_bytes(), quotes) == Some(raw.len())
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Check that a `<!DOCTYPE name ...>` declaration names a valid root
pub(crate) fn validate_doctype(raw: &str) -> Result<()> {
    let after = raw.get(9..).unwrap_or_default();
    let body = after.trim_start();
    let len = name_len(body.as_bytes());
    let name = body.get(..len).unwrap_or_default();
    let separated = after.len() > body.len();
    if !separated || !is_name(name) {
        let word: String = body
            .chars()
            .take_while(|c| !c.is_whitespace() && !matches!(c, '>' | '['))
            .collect();
        return Err(Error::detached(ErrorKind::InvalidName { name: word }));
    }
    Ok(())
}

/// Fold whitespace in text children, dropping text that is only whitespace
pub(crate) fn fold_text(children: &mut Vec<Node>) {
    children.retain_mut(|node| match node {
        Node::Text(text) => {
            text.fold();
            !text.is_whitespace()
        }
        _ => true,
    });
}

/// Append keeping adjacent text leaves merged
pub(crate) fn append_child(children: &mut Vec<Node>, node: Node) {
    match (children.last_mut(), node) {
        (Some(Node::Text(last)), Node::Text(text)) => last.push_encoded(text.as_str()),
        (_, node) => children.push(node),
    }
}

/// Insert at `index` (clamped to the end), merging with neighbouring text
pub(crate) fn insert_child(children: &mut Vec<Node>, index: usize, node: Node) {
    let index = index.min(children.len());
    if index == children.len() {
        append_child(children, node);
        return;
    }

    match node {
        Node::Text(text) => {
            let merge_prev = index > 0 && matches!(children.get(index - 1), Some(Node::Text(_)));
            if merge_prev {
                if let Some(Node::Text(prev)) = children.get_mut(index - 1) {
                    prev.push_encoded(text.as_str());
                }
                merge_at(children, index - 1);
            } else if let Some(Node::Text(next)) = children.get_mut(index) {
                next.prepend_encoded(text.as_str());
            } else {
                children.insert(index, Node::Text(text));
            }
        }
        node => children.insert(index, node),
    }
}

/// Remove the node at `index`; texts that become adjacent are merged
pub(crate) fn remove_child(children: &mut Vec<Node>, index: usize) -> Option<Node> {
    if index >= children.len() {
        return None;
    }
    let removed = children.remove(index);
    if index > 0 {
        merge_at(children, index - 1);
    }
    Some(removed)
}

/// Merge the text at `index + 1` into a text at `index`
fn merge_at(children: &mut Vec<Node>, index: usize) {
    let both_text = matches!(
        (children.get(index), children.get(index + 1)),
        (Some(Node::Text(_)), Some(Node::Text(_)))
    );
    if !both_text {
        return;
    }
    if let Node::Text(next) = children.remove(index + 1) {
        if let Some(Node::Text(prev)) = children.get_mut(index) {
            prev.push_encoded(next.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_factories_wrap_raw_text() -> Result<()> {
        assert_eq!(Node::cdata("a<b").outer(), "<![CDATA[a<b]]>");
        assert_eq!(Node::comment(" note ").outer(), "<!-- note -->");
        assert_eq!(Node::xml_decl(r#"version="1.0""#)?.outer(), r#"<?xml version="1.0"?>"#);
        assert_eq!(Node::text("a & b").outer(), "a &amp; b");
        Ok(())
    }

    #[test]
    fn test_leaf_factories_keep_delimited_text() -> Result<()> {
        assert_eq!(Node::cdata("<![CDATA[x]]>").outer(), "<![CDATA[x]]>");
        assert_eq!(Node::comment("<!--x-->").outer(), "<!--x-->");
        assert_eq!(
            Node::xml_decl(DEFAULT_DECLARATION)?.outer(),
            DEFAULT_DECLARATION
        );
        Ok(())
    }

    /// Wrap `node` in `<a>`, serialize and parse the result again
    fn reparse_in_element(node: Node) -> Result<Document> {
        let mut doc = Document::with_config(Config::xml().with_keep_comments(true));
        let mut a = Element::new("a")?;
        a.append(node)?;
        doc.append(a)?;
        Document::parse_with_config(&doc.outer(), Config::xml().with_keep_comments(true))
    }

    fn element_count(doc: &Document) -> usize {
        doc.search(crate::search::Filter::of_kind(NodeKind::Element))
            .count()
    }

    #[test]
    fn test_delimited_cdata_with_early_terminator_is_escaped() -> Result<()> {
        let node = Node::cdata("<![CDATA[x]]><evil/><![CDATA[y]]>");
        assert!(node.outer().starts_with("<![CDATA[<![CDATA[x]]]]><![CDATA[>"));
        let doc = reparse_in_element(node)?;
        assert_eq!(element_count(&doc), 1);
        Ok(())
    }

    #[test]
    fn test_delimited_comment_with_early_terminator_is_escaped() -> Result<()> {
        let node = Node::comment("<!--x--><e/><!--y-->");
        assert_eq!(node.outer(), "<!--<!- -x- -><e/><!- -y- ->-->");
        let doc = reparse_in_element(node)?;
        assert_eq!(element_count(&doc), 1);
        assert_eq!(
            doc.search(crate::search::Filter::of_kind(NodeKind::Comment)).count(),
            1
        );
        Ok(())
    }

    #[test]
    fn test_processing_instruction_rejects_early_terminator() -> Result<()> {
        let err = Node::processing_instruction("pi ?><evil3/><?pi").err();
        assert!(matches!(
            err.as_ref().map(Error::kind),
            Some(ErrorKind::Malformed { .. })
        ));
        assert!(Node::processing_instruction("<?pi a?><b/><?pi c?>").is_err());

        let doc = reparse_in_element(Node::processing_instruction("pi a > b")?)?;
        assert_eq!(element_count(&doc), 1);
        Ok(())
    }

    #[test]
    fn test_dtd_rejects_unbalanced_body() -> Result<()> {
        let err = Node::dtd("a> <evil/").err();
        assert!(matches!(
            err.as_ref().map(Error::kind),
            Some(ErrorKind::Malformed { .. })
        ));
        assert!(Node::dtd("<!DOCTYPE a> <evil/>").is_err());
        assert_eq!(
            Node::dtd(r#"a [<!ENTITY b "<">]"#)?.outer(),
            r#"<!DOCTYPE a [<!ENTITY b "<">]>"#
        );
        Ok(())
    }

    #[test]
    fn test_xml_decl_rejects_injection() -> Result<()> {
        assert!(Node::xml_decl("version='1.0'?><evil/").is_err());
        assert!(Node::xml_decl("<?xml version='1.0'?><evil/><?xml ?>").is_err());
        assert!(Node::xml_decl("<?xmlfoo?>").is_err());
        assert_eq!(Node::xml_decl("a='?>'")?.outer(), "<?xml a='?>'?>");

        let mut doc = Document::with_config(Config::html());
        doc.append(Node::xml_decl(r#"version="1.0""#)?)?;
        doc.append(Element::new("a")?)?;
        let reparsed = Document::parse(&doc.outer())?;
        assert_eq!(reparsed.children(), doc.children());
        Ok(())
    }

    #[test]
    fn test_encoded_text_cannot_open_markup() -> Result<()> {
        let doc = reparse_in_element(Node::text_encoded("x<evil/>&y"))?;
        assert_eq!(element_count(&doc), 1);
        assert_eq!(doc.root().map(Element::text), Some("x<evil/>&y".to_string()));
        Ok(())
    }

    #[test]
    fn test_cdata_splits_terminator() {
        let node = Node::cdata("a]]>b");
        assert_eq!(node.outer(), "<![CDATA[a]]]]><![CDATA[>b]]>");
    }

    #[test]
    fn test_comment_breaks_double_dash() {
        assert_eq!(Node::comment("a--b-").outer(), "<!--a- -b- -->");
    }

    #[test]
    fn test_dtd_factory() -> Result<()> {
        assert_eq!(Node::dtd("html")?.outer(), "<!DOCTYPE html>");
        assert_eq!(Node::dtd("<!doctype html>")?.outer(), "<!doctype html>");
        assert!(Node::dtd("1html").is_err());
        Ok(())
    }

    #[test]
    fn test_entity_ref_factory() -> Result<()> {
        let node = Node::entity_ref("nbsp")?;
        assert_eq!(node.outer(), "&nbsp;");
        assert_eq!(node.content(), "nbsp");
        assert_eq!(Node::entity_ref("&copy;")?.outer(), "&copy;");
        assert!(Node::entity_ref("no space").is_err());
        Ok(())
    }

    #[test]
    fn test_processing_instruction_factory() -> Result<()> {
        let node = Node::processing_instruction("php echo 1; ")?;
        assert_eq!(node.outer(), "<?php echo 1; ?>");
        assert_eq!(node.kind(), NodeKind::ProcessingInstruction);
        assert!(Node::processing_instruction("xml version").is_err());
        assert!(Node::processing_instruction(" nope").is_err());
        Ok(())
    }

    #[test]
    fn test_text_with_config() {
        let encoded = Config::xml().with_already_encoded(true);
        assert_eq!(Node::text_with("&amp;", &encoded).outer(), "&amp;");
        assert_eq!(Node::text_with("&amp;", &Config::xml()).outer(), "&amp;amp;");
    }

    #[test]
    fn test_content() {
        assert_eq!(Node::cdata("x y").content(), "x y");
        assert_eq!(Node::default_decl().content(), r#"version="1.0" encoding="UTF-8""#);
        assert_eq!(Node::comment("c").content(), "c");
    }

    #[test]
    fn test_append_merges_text() {
        let mut children = Vec::new();
        append_child(&mut children, Node::text("a"));
        append_child(&mut children, Node::text("b"));
        assert_eq!(children.len(), 1);
        assert_eq!(children.first().map(Node::outer), Some("ab".to_string()));
    }

    #[test]
    fn test_insert_and_remove_merge_text() {
        let mut children = vec![Node::text("a"), Node::cdata("x"), Node::text("c")];
        insert_child(&mut children, 1, Node::text("b"));
        assert_eq!(children.len(), 3);
        assert_eq!(children.first().map(Node::outer), Some("ab".to_string()));

        let removed = remove_child(&mut children, 1);
        assert_eq!(removed.map(|n| n.kind()), Some(NodeKind::Cdata));
        assert_eq!(children.len(), 1);
        assert_eq!(children.first().map(Node::outer), Some("abc".to_string()));
    }

    #[test]
    fn test_insert_text_before_text() {
        let mut children = vec![Node::cdata("x"), Node::text("b")];
        insert_child(&mut children, 1, Node::text("a"));
        assert_eq!(children.len(), 2);
        assert_eq!(children.get(1).map(Node::outer), Some("ab".to_string()));
    }
}
