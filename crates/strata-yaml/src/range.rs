//! Range computation from node coordinates.
//!
//! The scanner reports only where a node starts; end positions are derived
//! here. Scalar ends are start plus value length (plus the two quote
//! characters for quoted styles), collection ends recurse into the last
//! child. Block scalar styles (`|`, `>`) get the same length-based
//! approximation, which is not byte-exact for folded content but always
//! stays inside the file.

use crate::node::{Node, NodeKind};
use strata_lang::{Pos, Range};

/// The source range covered by a node.
pub fn node_range(node: &Node, filename: &str, src: &str) -> Range {
    let start_byte = byte_offset(src, node.line, node.column);
    let (end_line, end_column, end_byte) = end_pos(node, src, start_byte);

    Range::new(
        filename,
        Pos::new(node.line, node.column, start_byte),
        Pos::new(end_line, end_column, end_byte),
    )
}

/// A zero-width range at the start of a node, for pointing at where
/// something should have been.
pub fn node_start_range(node: &Node, filename: &str, src: &str) -> Range {
    let start_byte = byte_offset(src, node.line, node.column);
    let pos = Pos::new(node.line, node.column, start_byte);
    Range::new(filename, pos, pos)
}

/// A range spanning from the start of one node to the end of another, used
/// to cover a whole `key: value` entry.
pub fn range_between(start: &Node, end: &Node, filename: &str, src: &str) -> Range {
    let start_range = node_range(start, filename, src);
    let end_range = node_range(end, filename, src);
    Range::new(filename, start_range.start, end_range.end)
}

/// The byte offset of a 1-based line and column, clamped to the source
/// length. Invalid coordinates yield 0.
pub fn byte_offset(src: &str, line: usize, column: usize) -> usize {
    if line < 1 || column < 1 {
        return 0;
    }

    let bytes = src.as_bytes();
    if line == 1 {
        return (column - 1).min(bytes.len());
    }

    let mut current = 1;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            current += 1;
            if current == line {
                return (i + column).min(bytes.len());
            }
        }
    }

    bytes.len()
}

/// The 1-based line and column of a byte offset.
pub fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let bytes = src.as_bytes();
    let offset = offset.min(bytes.len());

    let mut line = 1;
    let mut line_start = 0;
    for (i, &b) in bytes.iter().enumerate().take(offset) {
        if b == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }

    (line, offset - line_start + 1)
}

fn end_pos(node: &Node, src: &str, start_byte: usize) -> (usize, usize, usize) {
    match &node.kind {
        NodeKind::Scalar { value, style, .. } => {
            let mut len = value.len();
            if style.is_quoted() {
                len += 2;
            }
            let end_byte = (start_byte + len).min(src.len());
            let (line, column) = line_col(src, end_byte);
            (line, column, end_byte)
        }

        NodeKind::Mapping { entries } => match entries.last() {
            Some(entry) => child_end(&entry.value, src),
            None => (node.line, node.column, start_byte),
        },

        NodeKind::Sequence { items } => match items.last() {
            Some(item) => child_end(item, src),
            None => (node.line, node.column, start_byte),
        },

        NodeKind::Document { content } => match content {
            Some(content) => child_end(content, src),
            None => (node.line, node.column, start_byte),
        },

        NodeKind::Alias { .. } => (node.line, node.column, start_byte),
    }
}

fn child_end(child: &Node, src: &str) -> (usize, usize, usize) {
    let child_start = byte_offset(src, child.line, child.column);
    end_pos(child, src, child_start)
}
