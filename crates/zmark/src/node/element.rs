//! Element nodes

use crate::chars::is_name;
use crate::config::{is_void_element, FormatConfig};
use crate::error::{Error, ErrorKind, Result};
use crate::node::{append_child, fold_text, insert_child, remove_child, Attributes, Node};
use crate::search::{Filter, Search};

/// A named element owning its attributes and children
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    name: String,
    attributes: Attributes,
    children: Vec<Node>,
}

impl Element {
    /// Create an empty element; `name` must satisfy the name grammar
    pub fn new(name: &str) -> Result<Self> {
        if !is_name(name) {
            return Err(Error::detached(ErrorKind::InvalidName {
                name: name.to_string(),
            }));
        }
        Ok(Self::from_parts(name.to_string(), Attributes::new()))
    }

    /// Name and attributes already validated by the caller
    pub(crate) fn from_parts(name: String, attributes: Attributes) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn num_attrs(&self) -> usize {
        self.attributes.len()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Set an attribute, returning its previous value
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) -> Result<Option<String>> {
        self.attributes.set(name, value)
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    pub fn clear_attrs(&mut self) {
        self.attributes.clear();
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.children.get_mut(index)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append a child, merging text into a preceding text child
    pub fn append(&mut self, node: impl Into<Node>) -> Result<()> {
        let node = node.into();
        reject_prologue(&node)?;
        append_child(&mut self.children, node);
        Ok(())
    }

    /// Insert a child at `index`; an index past the end appends
    pub fn insert(&mut self, index: usize, node: impl Into<Node>) -> Result<()> {
        let node = node.into();
        reject_prologue(&node)?;
        insert_child(&mut self.children, index, node);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Node> {
        remove_child(&mut self.children, index)
    }

    pub(crate) fn push_child(&mut self, node: Node) {
        append_child(&mut self.children, node);
    }

    pub(crate) fn fold_text(&mut self) {
        fold_text(&mut self.children);
    }

    /// Plain text of all descendant text and CDATA, in document order
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in self.search(Filter::any()) {
            match node {
                Node::Text(text) => out.push_str(&text.decoded()),
                Node::Cdata(_) => out.push_str(node.content()),
                _ => {}
            }
        }
        out
    }

    /// Depth-first walk over descendants matching `filter`
    pub fn search(&self, filter: Filter) -> Search<'_> {
        Search::new(&self.children, filter)
    }

    /// Descendant elements named `name` (case-sensitive)
    pub fn elements<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Element> + 'a {
        self.search(Filter::element(name))
            .filter_map(Node::as_element)
    }

    /// First descendant element named `name`
    pub fn find(&self, name: &str) -> Option<&Self> {
        self.elements(name).next()
    }

    pub fn inner(&self) -> String {
        self.inner_with(FormatConfig::default())
    }

    pub fn inner_with(&self, format: FormatConfig) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_outer(&mut out, format);
        }
        out
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
        out.push('<');
        out.push_str(&self.name);
        self.attributes.write_to(out, format);

        if self.children.is_empty() {
            if format.void_tags && is_void_element(&self.name) {
                out.push('>');
            } else {
                out.push_str(" />");
            }
            return;
        }

        out.push('>');
        for child in &self.children {
            child.write_outer(out, format);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn reject_prologue(node: &Node) -> Result<()> {
    if node.kind().is_prologue() {
        return Err(Error::detached(ErrorKind::MisplacedDeclaration));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Result<Element> {
        let mut root = Element::new("root")?;
        root.set_attr("b", "2")?;
        root.set_attr("a", "1")?;
        let mut child = Element::new("child")?;
        child.append(Node::text("hi & bye"))?;
        root.append(child)?;
        root.append(Element::new("empty")?)?;
        Ok(root)
    }

    #[test]
    fn test_new_validates_name() {
        assert!(Element::new("ok-name.1").is_ok());
        assert!(Element::new("1bad").is_err());
        assert!(Element::new("").is_err());
    }

    #[test]
    fn test_outer() -> Result<()> {
        let root = sample()?;
        assert_eq!(
            root.outer(),
            r#"<root a="1" b="2"><child>hi &amp; bye</child><empty /></root>"#
        );
        assert_eq!(root.inner(), "<child>hi &amp; bye</child><empty />");
        Ok(())
    }

    #[test]
    fn test_void_rendering() -> Result<()> {
        let br = Element::new("br")?;
        assert_eq!(br.outer(), "<br />");
        assert_eq!(br.outer_with(FormatConfig::html()), "<br>");
        let div = Element::new("div")?;
        assert_eq!(div.outer_with(FormatConfig::html()), "<div />");
        Ok(())
    }

    #[test]
    fn test_text_and_find() -> Result<()> {
        let root = sample()?;
        assert_eq!(root.text(), "hi & bye");
        assert_eq!(root.find("child").map(Element::name), Some("child"));
        assert!(root.find("missing").is_none());
        Ok(())
    }

    #[test]
    fn test_append_merges_text() -> Result<()> {
        let mut el = Element::new("p")?;
        el.append(Node::text("a"))?;
        el.append(Node::text("b"))?;
        assert_eq!(el.children().len(), 1);
        assert_eq!(el.inner(), "ab");
        Ok(())
    }

    #[test]
    fn test_append_rejects_prologue() -> Result<()> {
        let mut el = Element::new("p")?;
        assert!(el.append(Node::default_decl()).is_err());
        assert!(el.append(Node::dtd("html")?).is_err());
        Ok(())
    }

    #[test]
    fn test_attr_edits() -> Result<()> {
        let mut el = Element::new("p")?;
        el.set_attr("x", "1")?;
        assert_eq!(el.num_attrs(), 1);
        assert_eq!(el.remove_attr("x"), Some("1".to_string()));
        assert_eq!(el.num_attrs(), 0);
        assert!(el.set_attr("bad name", "1").is_err());
        Ok(())
    }
}
