//! Strict XML reader building the node arena

use super::{NodeData, NodeId, NodeKind, ParseError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Maps byte offsets to 1-based line/column pairs, columns counted in chars
struct LineIndex<'a> {
    content: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(content: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            content,
            line_starts,
        }
    }

    fn line_col(&self, pos: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= pos);
        let start = self.line_starts.get(line.saturating_sub(1)).copied().unwrap_or(0);
        let col = match self.content.get(start..pos) {
            Some(prefix) => prefix.chars().count(),
            None => pos.saturating_sub(start),
        };
        (line, col + 1)
    }
}

struct TreeBuilder<'a> {
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
    root: Option<NodeId>,
    lines: LineIndex<'a>,
}

impl TreeBuilder<'_> {
    fn push(&mut self, mut node: NodeData) -> Result<NodeId, ParseError> {
        let id = self.nodes.len();
        match self.stack.last() {
            Some(&parent) => {
                node.parent = Some(parent);
                self.nodes[parent].children.push(id);
            }
            None if node.kind == NodeKind::Element => {
                if self.root.is_some() {
                    return Err(ParseError::new(
                        format!("multiple root elements, found <{}> after the root", node.name),
                        node.line,
                    ));
                }
                self.root = Some(id);
            }
            None if node.kind == NodeKind::Text => {
                return Err(ParseError::new(
                    "text content outside of the root element",
                    node.line,
                ));
            }
            // Comments before or after the root are kept but never reachable
            // from the root.
            None => {}
        }
        self.nodes.push(node);
        Ok(id)
    }

    fn element(&self, start: &BytesStart, span_start: usize) -> Result<NodeData, ParseError> {
        let (line, column) = self.lines.line_col(span_start);
        let name = String::from_utf8_lossy(start.name().as_ref()).to_string();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::new(e.to_string(), line))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::new(e.to_string(), line))?
                .to_string();
            attributes.push((key, value));
        }

        Ok(NodeData {
            kind: NodeKind::Element,
            name,
            attributes,
            children: Vec::new(),
            parent: None,
            text: None,
            span: span_start..span_start,
            line,
            column,
        })
    }

    fn leaf(&self, kind: NodeKind, text: String, span: std::ops::Range<usize>) -> NodeData {
        let (line, column) = self.lines.line_col(span.start);
        let name = match kind {
            NodeKind::Comment => "#comment",
            _ => "#text",
        };
        NodeData {
            kind,
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            parent: None,
            text: Some(text),
            span,
            line,
            column,
        }
    }
}

/// Parse `content` into a node arena, returning the arena and the root id
pub(super) fn parse(content: &str) -> Result<(Vec<NodeData>, NodeId), ParseError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = true;

    let mut builder = TreeBuilder {
        nodes: Vec::new(),
        stack: Vec::new(),
        root: None,
        lines: LineIndex::new(content),
    };

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| {
            let (line, _) = builder.lines.line_col(reader.buffer_position() as usize);
            ParseError::new(e.to_string(), line)
        })?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                let node = builder.element(&e, start)?;
                let id = builder.push(node)?;
                builder.stack.push(id);
            }

            Event::Empty(e) => {
                let mut node = builder.element(&e, start)?;
                node.span.end = end;
                builder.push(node)?;
            }

            Event::End(_) => {
                if let Some(id) = builder.stack.pop() {
                    builder.nodes[id].span.end = end;
                }
            }

            Event::Text(e) => {
                let (line, _) = builder.lines.line_col(start);
                let text = e
                    .unescape()
                    .map_err(|err| ParseError::new(err.to_string(), line))?;
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    let node = builder.leaf(NodeKind::Text, trimmed.to_string(), start..end);
                    builder.push(node)?;
                }
            }

            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).to_string();
                let node = builder.leaf(NodeKind::Text, text, start..end);
                builder.push(node)?;
            }

            Event::Comment(e) => {
                let text = String::from_utf8_lossy(&e).to_string();
                let node = builder.leaf(NodeKind::Comment, text, start..end);
                builder.push(node)?;
            }

            Event::Eof => break,

            _ => {}
        }
    }

    if let Some(&open) = builder.stack.last() {
        let node = &builder.nodes[open];
        return Err(ParseError::new(
            format!("unclosed element <{}>", node.name),
            node.line,
        ));
    }

    match builder.root {
        Some(root) => Ok((builder.nodes, root)),
        None => Err(ParseError::new("document has no root element", 0)),
    }
}
