//! Owned YAML node tree with source coordinates.
//!
//! The tree is built once per document by the parser and shared read-only by
//! every body and expression wrapper derived from it, so children are held
//! behind `Arc`. `line` and `column` are 1-based and point at the start of
//! the node's content.

use std::sync::Arc;

/// How a scalar was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// Block scalar introduced with `|`.
    Literal,
    /// Block scalar introduced with `>`.
    Folded,
}

impl ScalarStyle {
    /// True for styles whose source form carries surrounding quote
    /// characters.
    pub fn is_quoted(self) -> bool {
        matches!(self, ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted)
    }
}

/// The resolved tag of a scalar.
///
/// Explicit core-schema tags resolve to their variant; untagged plain
/// scalars resolve implicitly from their lexical form; untagged non-plain
/// scalars are always strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarTag {
    Null,
    Bool,
    Int,
    Float,
    Str,
    /// Opaque binary content. Never interpreted as a template.
    Binary,
    /// An application-specific tag, kept verbatim.
    Other(String),
}

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

impl ScalarTag {
    /// Resolve the effective tag of a scalar from its explicit tag (handle
    /// and suffix, if any), its raw value, and its style.
    pub fn resolve(explicit: Option<(&str, &str)>, value: &str, style: ScalarStyle) -> ScalarTag {
        if let Some((handle, suffix)) = explicit {
            if handle == CORE_TAG_PREFIX || handle == "!!" {
                return match suffix {
                    "null" => ScalarTag::Null,
                    "bool" => ScalarTag::Bool,
                    "int" => ScalarTag::Int,
                    "float" => ScalarTag::Float,
                    "str" => ScalarTag::Str,
                    "binary" => ScalarTag::Binary,
                    other => ScalarTag::Other(format!("{CORE_TAG_PREFIX}{other}")),
                };
            }
            return ScalarTag::Other(format!("{handle}{suffix}"));
        }

        if style != ScalarStyle::Plain {
            return ScalarTag::Str;
        }

        implicit_tag(value)
    }
}

/// Implicit resolution for untagged plain scalars, following the YAML 1.1
/// lexical forms the toolchain accepts.
fn implicit_tag(value: &str) -> ScalarTag {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => return ScalarTag::Null,
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" | "false"
        | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => {
            return ScalarTag::Bool
        }
        _ => {}
    }

    if is_int_form(value) {
        ScalarTag::Int
    } else if is_float_form(value) {
        ScalarTag::Float
    } else {
        ScalarTag::Str
    }
}

fn is_int_form(value: &str) -> bool {
    let body = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);
    if body.is_empty() {
        return false;
    }
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        return !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit());
    }
    if let Some(oct) = body.strip_prefix("0o").or_else(|| body.strip_prefix("0O")) {
        return !oct.is_empty() && oct.bytes().all(|b| (b'0'..=b'7').contains(&b));
    }
    body.bytes().all(|b| b.is_ascii_digit())
}

fn is_float_form(value: &str) -> bool {
    matches!(
        value,
        ".inf" | "+.inf" | "-.inf" | ".Inf" | "+.Inf" | "-.Inf" | ".nan" | ".NaN"
    ) || value.parse::<f64>().is_ok()
}

/// One key/value pair of a mapping, in source order.
#[derive(Debug, Clone)]
pub struct MappingEntry {
    pub key: Arc<Node>,
    pub value: Arc<Node>,
}

/// A parsed YAML node.
#[derive(Debug, Clone)]
pub struct Node {
    /// 1-based line of the node's content.
    pub line: usize,
    /// 1-based column of the node's content.
    pub column: usize,
    /// Comment lines immediately above the node, joined with newlines.
    pub head_comment: Option<String>,
    /// Trailing comment on the node's own line.
    pub line_comment: Option<String>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Scalar {
        value: String,
        style: ScalarStyle,
        tag: ScalarTag,
    },
    Sequence {
        items: Vec<Arc<Node>>,
    },
    Mapping {
        entries: Vec<MappingEntry>,
    },
    /// A reference back to an anchored node. The target is absent only when
    /// the anchor was never defined.
    Alias {
        target: Option<Arc<Node>>,
    },
    /// A document wrapper; `content` is absent for empty documents.
    Document {
        content: Option<Arc<Node>>,
    },
}

impl Node {
    pub fn new(line: usize, column: usize, kind: NodeKind) -> Self {
        Self {
            line,
            column,
            head_comment: None,
            line_comment: None,
            kind,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.kind, NodeKind::Mapping { .. })
    }

    /// True when the node is a null scalar (`null`, `~`, or an empty plain
    /// scalar).
    pub fn is_null(&self) -> bool {
        match &self.kind {
            NodeKind::Scalar { value, tag, .. } => {
                *tag == ScalarTag::Null || value == "null" || value == "~" || value.is_empty()
            }
            _ => false,
        }
    }

    /// The scalar value, when the node is a scalar.
    pub fn scalar_value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }
}
