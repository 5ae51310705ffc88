//! Parsed SVG document tree
//!
//! The tree is stored in an arena owned by [`Document`]. Nodes refer to their
//! children and parent by [`NodeId`], so the document owns every node top-down
//! and parent links are plain lookups.

mod parser;
mod select;

pub use select::{Selector, SelectorError};

use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;

/// Index of a node inside its document's arena
pub type NodeId = usize;

/// Error raised when the input is not a well-formed document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line})")]
pub struct ParseError {
    /// Underlying parser message
    pub message: String,
    /// Line where parsing stopped (1-based, 0 when unknown)
    pub line: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

/// Kind of a node in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Element => write!(f, "element"),
            NodeKind::Text => write!(f, "text"),
            NodeKind::Comment => write!(f, "comment"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) text: Option<String>,
    /// Byte range of the node in the source text
    pub(crate) span: Range<usize>,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

/// A parsed document with exactly one root element
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    source: String,
}

impl Document {
    /// Parse document text.
    ///
    /// Parsing is strict: end tags must match their start tags, every element
    /// must be closed, and there must be exactly one root element.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let (nodes, root) = parser::parse(source)?;
        Ok(Self {
            nodes,
            root,
            source: source.to_string(),
        })
    }

    /// The root element
    pub fn root(&self) -> Node<'_> {
        self.node(self.root)
    }

    /// Look up a node by id.
    ///
    /// Ids come from this document, so an out-of-range id is a caller bug.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        debug_assert!(id < self.nodes.len());
        Node { document: self, id }
    }

    /// Look up a node by id, returning `None` for unknown ids
    pub fn get(&self, id: NodeId) -> Option<Node<'_>> {
        (id < self.nodes.len()).then_some(Node { document: self, id })
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Original source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Iterate over all nodes below and including the root, depth-first in
    /// document order
    pub fn descendants(&self) -> impl Iterator<Item = Node<'_>> + '_ {
        self.root().descendants()
    }

    /// Iterate over all elements in document order
    pub fn elements(&self) -> impl Iterator<Item = Node<'_>> + '_ {
        self.descendants().filter(|n| n.is_element())
    }

    /// Find all elements matching a selector, in document order
    pub fn select(&self, selector: &Selector) -> Vec<Node<'_>> {
        self.elements().filter(|n| selector.matches(*n)).collect()
    }

    /// Find all elements matching a selector string
    pub fn query(&self, selector: &str) -> Result<Vec<Node<'_>>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.select(&selector))
    }

    /// Create an owned reference to a node, keeping the document alive
    pub fn node_ref(self: &Arc<Self>, id: NodeId) -> NodeRef {
        NodeRef {
            document: Arc::clone(self),
            id,
        }
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id]
    }
}

/// Borrowed view of one node
#[derive(Clone, Copy)]
pub struct Node<'a> {
    document: &'a Document,
    id: NodeId,
}

impl<'a> Node<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn kind(&self) -> NodeKind {
        self.document.data(self.id).kind
    }

    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    /// Tag name for elements, `#text` or `#comment` otherwise
    pub fn name(&self) -> &'a str {
        &self.document.data(self.id).name
    }

    /// Attribute value by name
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.document
            .data(self.id)
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Attributes in source order
    pub fn attributes(&self) -> &'a [(String, String)] {
        &self.document.data(self.id).attributes
    }

    /// Text content of text and comment nodes
    pub fn text(&self) -> Option<&'a str> {
        self.document.data(self.id).text.as_deref()
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.document
            .data(self.id)
            .parent
            .map(|id| self.document.node(id))
    }

    /// Child nodes in source order
    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let document = self.document;
        document
            .data(self.id)
            .children
            .iter()
            .map(move |&id| document.node(id))
    }

    /// Element children in source order
    pub fn element_children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        self.children().filter(|c| c.is_element())
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    /// This node and everything below it, depth-first
    pub fn descendants(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let document = self.document;
        let mut stack = vec![self.id];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(document.data(id).children.iter().rev());
            Some(document.node(id))
        })
    }

    /// 1-based line and column where the node starts
    pub fn location(&self) -> (usize, usize) {
        let data = self.document.data(self.id);
        (data.line, data.column)
    }

    /// Source fragment of the node, including its children
    pub fn outer_xml(&self) -> &'a str {
        let span = &self.document.data(self.id).span;
        self.document.source.get(span.clone()).unwrap_or("")
    }

    /// Source line the node starts on
    pub fn source_line(&self) -> Option<&'a str> {
        let (line, _) = self.location();
        self.document.source.lines().nth(line.checked_sub(1)?)
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, column) = self.location();
        write!(f, "<{}> at {}:{}", self.name(), line, column)
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.document, other.document) && self.id == other.id
    }
}

/// Owned reference to a node and the document it belongs to.
///
/// Diagnostics keep this instead of a rendered string so output formatters
/// decide how to present the node.
#[derive(Clone)]
pub struct NodeRef {
    document: Arc<Document>,
    id: NodeId,
}

impl NodeRef {
    pub fn node(&self) -> Node<'_> {
        self.document.node(self.id)
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.node(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = r#"<svg role="img" viewBox="0 0 24 24">
    <g id="foo">
        <path d="bar"></path>
    </g>
    <g></g>
    <circle/>
</svg>"#;

    #[test]
    fn test_tree_structure() {
        let doc = Document::parse(SVG).unwrap();
        let root = doc.root();
        assert_eq!(root.name(), "svg");
        assert_eq!(root.attr("role"), Some("img"));

        let names: Vec<_> = root.element_children().map(|n| n.name()).collect();
        assert_eq!(names, vec!["g", "g", "circle"]);
    }

    #[test]
    fn test_parent_lookup() {
        let doc = Document::parse(SVG).unwrap();
        let path = doc.elements().find(|n| n.name() == "path").unwrap();
        assert_eq!(path.parent().unwrap().attr("id"), Some("foo"));
        assert_eq!(path.ancestors().count(), 2);
        assert!(doc.root().parent().is_none());
    }

    #[test]
    fn test_attribute_order_preserved() {
        let doc = Document::parse(r#"<svg b="1" a="2" c="3"/>"#).unwrap();
        let keys: Vec<_> = doc.root().attributes().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_descendants_document_order() {
        let doc = Document::parse(SVG).unwrap();
        let names: Vec<_> = doc.elements().map(|n| n.name()).collect();
        assert_eq!(names, vec!["svg", "g", "path", "g", "circle"]);
    }

    #[test]
    fn test_outer_xml_and_location() {
        let doc = Document::parse(SVG).unwrap();
        let g = doc.elements().find(|n| n.attr("id") == Some("foo")).unwrap();
        assert!(g.outer_xml().starts_with("<g id=\"foo\">"));
        assert!(g.outer_xml().ends_with("</g>"));
        assert_eq!(g.location(), (2, 5));
        assert_eq!(g.source_line(), Some("    <g id=\"foo\">"));

        let circle = doc.elements().find(|n| n.name() == "circle").unwrap();
        assert_eq!(circle.outer_xml(), "<circle/>");
    }

    #[test]
    fn test_node_ref_keeps_document() {
        let doc = Arc::new(Document::parse(SVG).unwrap());
        let id = doc.elements().find(|n| n.name() == "circle").unwrap().id();
        let node_ref = doc.node_ref(id);
        drop(doc);
        assert_eq!(node_ref.node().name(), "circle");
    }

    #[test]
    fn test_query() {
        let doc = Document::parse(SVG).unwrap();
        assert_eq!(doc.query("g").unwrap().len(), 2);
        assert_eq!(doc.query("svg > g > path").unwrap().len(), 1);
        assert!(doc.query("svg >").is_err());
    }
}
