//! Marked-event YAML parser building the owned node tree.
//!
//! The builder receives scanner events together with their markers and keeps
//! a stack of partially built collections, one frame per open sequence or
//! mapping. Anchored nodes are registered as they complete so that later
//! alias events can share them.
//!
//! The scanner does not surface comments, so head comments (contiguous `#`
//! lines above a node) and line comments (trailing `#` on the node's line)
//! are recovered from the source text while scalars are built.

use crate::node::{MappingEntry, Node, NodeKind, ScalarStyle, ScalarTag};
use std::collections::HashMap;
use std::sync::Arc;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, ScanError, TScalarStyle};

/// Parse a YAML stream into one node tree per document.
///
/// # Errors
///
/// Returns the scanner's error when the stream is not valid YAML. Documents
/// completed before the error are lost; use [`parse_stream`] to keep them.
pub fn parse_documents(src: &str) -> Result<Vec<Arc<Node>>, ScanError> {
    let (documents, err) = parse_stream(src);
    match err {
        Some(err) => Err(err),
        None => Ok(documents),
    }
}

/// Parse a YAML stream, returning every document completed before the first
/// scanner error alongside that error.
pub(crate) fn parse_stream(src: &str) -> (Vec<Arc<Node>>, Option<ScanError>) {
    let mut parser = Parser::new_from_str(src);
    let mut builder = TreeBuilder::new(src);
    let err = parser.load(&mut builder, true).err();
    (builder.documents, err)
}

/// A collection in the middle of being built.
enum Frame {
    Sequence {
        marker: Marker,
        anchor: usize,
        items: Vec<Arc<Node>>,
    },
    Mapping {
        marker: Marker,
        anchor: usize,
        /// Alternating key and value nodes, paired up on `MappingEnd`.
        nodes: Vec<Arc<Node>>,
    },
}

struct TreeBuilder<'a> {
    lines: Vec<&'a str>,
    documents: Vec<Arc<Node>>,
    stack: Vec<Frame>,
    doc_root: Option<Arc<Node>>,
    doc_marker: Option<Marker>,
    anchors: HashMap<usize, Arc<Node>>,
    /// Last line on which a node started; comments attach only to the first
    /// node of a line.
    last_line: usize,
}

impl<'a> TreeBuilder<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            lines: src.lines().collect(),
            documents: Vec::new(),
            stack: Vec::new(),
            doc_root: None,
            doc_marker: None,
            anchors: HashMap::new(),
            last_line: 0,
        }
    }

    fn push_complete(&mut self, anchor: usize, node: Arc<Node>) {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }

        match self.stack.last_mut() {
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping { nodes, .. }) => nodes.push(node),
            None => self.doc_root = Some(node),
        }
    }

    /// Head and line comments for a node starting at the given 1-based line,
    /// or nothing when the line already produced a node.
    fn comments_for(&mut self, line: usize) -> (Option<String>, Option<String>) {
        if line == self.last_line {
            return (None, None);
        }
        self.last_line = line;
        (
            head_comment_above(&self.lines, line),
            line_comment_on(&self.lines, line),
        )
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        match ev {
            Event::Nothing | Event::StreamStart | Event::StreamEnd => {}

            Event::DocumentStart => {
                self.doc_marker = Some(marker);
                self.doc_root = None;
            }

            Event::DocumentEnd => {
                let content = self.doc_root.take();
                let (line, column) = match (&content, self.doc_marker) {
                    (Some(node), _) => (node.line, node.column),
                    (None, Some(start)) => (start.line(), start.col() + 1),
                    (None, None) => (1, 1),
                };
                self.documents.push(Arc::new(Node::new(
                    line,
                    column,
                    NodeKind::Document { content },
                )));
            }

            Event::Scalar(value, style, anchor, tag) => {
                let style = scalar_style(style);
                let explicit = tag.as_ref().map(|t| (t.handle.as_str(), t.suffix.as_str()));
                let tag = ScalarTag::resolve(explicit, &value, style);

                let line = marker.line();
                let column = marker.col() + 1;
                let (head_comment, line_comment) = self.comments_for(line);

                let node = Node {
                    line,
                    column,
                    head_comment,
                    line_comment,
                    kind: NodeKind::Scalar { value, style, tag },
                };
                self.push_complete(anchor, Arc::new(node));
            }

            Event::SequenceStart(anchor, _tag) => {
                self.stack.push(Frame::Sequence {
                    marker,
                    anchor,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => {
                let frame = self.stack.pop().expect("SequenceEnd without SequenceStart");
                let Frame::Sequence {
                    marker: start,
                    anchor,
                    items,
                } = frame
                else {
                    panic!("SequenceEnd closed a mapping frame");
                };
                let node = Node::new(
                    start.line(),
                    start.col() + 1,
                    NodeKind::Sequence { items },
                );
                self.push_complete(anchor, Arc::new(node));
            }

            Event::MappingStart(anchor, _tag) => {
                self.stack.push(Frame::Mapping {
                    marker,
                    anchor,
                    nodes: Vec::new(),
                });
            }

            Event::MappingEnd => {
                let frame = self.stack.pop().expect("MappingEnd without MappingStart");
                let Frame::Mapping {
                    marker: start,
                    anchor,
                    nodes,
                } = frame
                else {
                    panic!("MappingEnd closed a sequence frame");
                };

                let mut entries = Vec::with_capacity(nodes.len() / 2);
                let mut nodes = nodes.into_iter();
                while let (Some(key), Some(value)) = (nodes.next(), nodes.next()) {
                    entries.push(MappingEntry { key, value });
                }

                let node = Node::new(
                    start.line(),
                    start.col() + 1,
                    NodeKind::Mapping { entries },
                );
                self.push_complete(anchor, Arc::new(node));
            }

            Event::Alias(anchor) => {
                let target = self.anchors.get(&anchor).cloned();
                let node = Node::new(marker.line(), marker.col() + 1, NodeKind::Alias { target });
                self.push_complete(0, Arc::new(node));
            }
        }
    }
}

fn scalar_style(style: TScalarStyle) -> ScalarStyle {
    match style {
        TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        TScalarStyle::Literal => ScalarStyle::Literal,
        TScalarStyle::Folded => ScalarStyle::Folded,
        _ => ScalarStyle::Plain,
    }
}

/// The trailing comment on a 1-based source line, if any.
fn line_comment_on(lines: &[&str], line: usize) -> Option<String> {
    let text = lines.get(line.checked_sub(1)?)?;
    comment_start(text).map(|idx| text[idx..].trim_end().to_string())
}

/// Contiguous comment-only lines immediately above a 1-based source line.
fn head_comment_above(lines: &[&str], line: usize) -> Option<String> {
    let mut collected: Vec<&str> = Vec::new();
    let mut idx = line.checked_sub(2)?;
    loop {
        let text = lines.get(idx)?.trim_start();
        if !text.starts_with('#') {
            break;
        }
        collected.push(text.trim_end());
        if idx == 0 {
            break;
        }
        idx -= 1;
    }

    if collected.is_empty() {
        None
    } else {
        collected.reverse();
        Some(collected.join("\n"))
    }
}

/// Byte index where a comment starts on a line: a `#` at the line start or
/// after whitespace, outside quoted scalars.
fn comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut in_single = false;
    let mut in_double = false;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'\'' if !in_double => in_single = !in_single,
            b'"' if !in_single => {
                if !(in_double && i > 0 && bytes[i - 1] == b'\\') {
                    in_double = !in_double;
                }
            }
            b'#' if !in_single && !in_double => {
                if i == 0 || bytes[i - 1] == b' ' || bytes[i - 1] == b'\t' {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
