//! Depth-first search over a document tree

use std::iter::FusedIterator;
use std::slice;

use crate::node::{Node, NodeKind};

/// Which nodes a [`Search`] yields
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    kind: Option<NodeKind>,
    name: Option<String>,
    case_insensitive: bool,
}

impl Filter {
    /// Match every node
    pub fn any() -> Self {
        Self::default()
    }

    /// Match nodes of a single kind
    pub fn of_kind(kind: NodeKind) -> Self {
        Self::any().kind(kind)
    }

    /// Match elements named `name`
    pub fn element(name: impl Into<String>) -> Self {
        Self::of_kind(NodeKind::Element).name(name)
    }

    #[must_use]
    pub fn kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restrict to elements with this name
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn case_insensitive(mut self, on: bool) -> Self {
        self.case_insensitive = on;
        self
    }

    pub fn matches(&self, node: &Node) -> bool {
        if self.kind.is_some_and(|kind| kind != node.kind()) {
            return false;
        }
        let Some(wanted) = &self.name else {
            return true;
        };
        match node {
            Node::Element(element) if self.case_insensitive => {
                element.name().eq_ignore_ascii_case(wanted)
            }
            Node::Element(element) => element.name() == wanted,
            _ => false,
        }
    }
}

/// Lazy pre-order walk over the descendants of a document or element.
///
/// Each stack frame is the remaining children of one open parent. The walk
/// borrows the tree, so the tree cannot change while it is in progress.
#[derive(Clone, Debug)]
pub struct Search<'a> {
    stack: Vec<slice::Iter<'a, Node>>,
    filter: Filter,
}

impl<'a> Search<'a> {
    pub fn new(children: &'a [Node], filter: Filter) -> Self {
        Self {
            stack: vec![children.iter()],
            filter,
        }
    }
}

impl<'a> Iterator for Search<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(node) = frame.next() else {
                self.stack.pop();
                continue;
            };
            if let Node::Element(element) = node {
                if !element.children().is_empty() {
                    self.stack.push(element.children().iter());
                }
            }
            if self.filter.matches(node) {
                return Some(node);
            }
        }
    }
}

impl FusedIterator for Search<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::node::Element;

    fn tree() -> Result<Element> {
        let mut root = Element::new("root")?;
        let mut a = Element::new("a")?;
        a.append(Node::text("one"))?;
        let mut b = Element::new("B")?;
        b.append(Node::text("two"))?;
        a.append(b)?;
        root.append(a)?;
        root.append(Node::comment("c"))?;
        root.append(Element::new("b")?)?;
        Ok(root)
    }

    #[test]
    fn test_preorder() -> Result<()> {
        let root = tree()?;
        let order: Vec<String> = root
            .search(Filter::any())
            .map(|node| match node {
                Node::Element(el) => el.name().to_string(),
                other => other.kind().to_string(),
            })
            .collect();
        assert_eq!(order, ["a", "text", "B", "text", "comment", "b"]);
        Ok(())
    }

    #[test]
    fn test_kind_filter() -> Result<()> {
        let root = tree()?;
        assert_eq!(root.search(Filter::of_kind(NodeKind::Text)).count(), 2);
        assert_eq!(root.search(Filter::of_kind(NodeKind::Element)).count(), 3);
        assert_eq!(root.search(Filter::of_kind(NodeKind::Cdata)).count(), 0);
        Ok(())
    }

    #[test]
    fn test_name_filter_case() -> Result<()> {
        let root = tree()?;
        assert_eq!(root.search(Filter::element("b")).count(), 1);
        assert_eq!(
            root.search(Filter::element("b").case_insensitive(true)).count(),
            2
        );
        Ok(())
    }

    #[test]
    fn test_restartable() -> Result<()> {
        let root = tree()?;
        let mut first = root.search(Filter::any());
        first.next();
        first.next();
        assert_eq!(root.search(Filter::any()).count(), 6);
        assert_eq!(first.count(), 4);
        Ok(())
    }

    #[test]
    fn test_empty() {
        let mut search = Search::new(&[], Filter::any());
        assert!(search.next().is_none());
        assert!(search.next().is_none());
    }
}
