//! # strata-yaml
//!
//! YAML documents as strata configuration bodies.
//!
//! This crate lets the schema-driven decoder consume YAML files as if they
//! were written in the native syntax. A parsed document becomes a [`YamlBody`]
//! that answers `content`/`partial_content` queries; attribute values become
//! [`YamlExpression`]s that evaluate scalars by their YAML tags and run
//! string scalars through the native template engine for `${…}`
//! interpolation. Source positions stay byte-accurate for diagnostics, and
//! comments are preserved on the node tree for downstream tooling.
//!
//! YAML configuration is "configuration as data": functions, `for`
//! expressions, conditionals, `variable`/`locals` blocks, `count`/`for_each`
//! meta-arguments and `dynamic` blocks are rejected by the restriction
//! validator (see [`validate_block_type`] and friends).
//!
//! ## Example
//!
//! ```rust,no_run
//! use strata_yaml::parse_yaml;
//! use strata_lang::{Body, BodySchema, BlockHeaderSchema};
//!
//! let src = "resource:\n  aws_instance:\n    web:\n      ami: ami-12345\n";
//! let (files, diags) = parse_yaml(src, "main.tf.yaml");
//! assert!(!diags.has_errors());
//!
//! let schema = BodySchema {
//!     attributes: vec![],
//!     blocks: vec![BlockHeaderSchema::new("resource", ["type", "name"])],
//! };
//! let (content, _diags) = files[0].body.content(&schema);
//! assert_eq!(content.blocks[0].labels, vec!["aws_instance", "web"]);
//! ```

mod body;
mod expression;
mod node;
mod parser;
mod range;
mod restrictions;
mod template;

pub use body::YamlBody;
pub use expression::YamlExpression;
pub use node::{MappingEntry, Node, NodeKind, ScalarStyle, ScalarTag};
pub use parser::parse_documents;
pub use range::{node_range, node_start_range};
pub use restrictions::{
    is_yaml_body, is_yaml_expression, validate_block_type, validate_dynamic_block,
    validate_repetition_args,
};

use std::sync::Arc;
use strata_lang::{Diagnostic, Diagnostics};

/// An immutable source file, shared read-only by every body and expression
/// wrapper derived from it.
#[derive(Debug)]
pub struct SourceFile {
    pub filename: String,
    pub content: String,
}

/// One YAML document wrapped for schema-driven consumption.
///
/// All documents of a multi-document file share the same [`SourceFile`], so
/// diagnostic snippets resolve against the full original text.
pub struct File {
    pub body: YamlBody,
    pub source: Arc<SourceFile>,
}

/// Parse YAML source into one file per non-empty document.
///
/// A syntax error produces a single `Invalid YAML syntax` diagnostic and
/// stops the stream; documents completed before the error are still
/// returned. Empty documents (bare `---`, or a lone `~`) are skipped. When
/// nothing remains, a single file with an empty mapping is synthesized so
/// the schema consumer sees a valid but empty configuration.
pub fn parse_yaml(src: &str, filename: &str) -> (Vec<File>, Diagnostics) {
    let mut diags = Diagnostics::new();
    let source = Arc::new(SourceFile {
        filename: filename.to_string(),
        content: src.to_string(),
    });

    let (documents, scan_err) = parser::parse_stream(src);

    let mut files = Vec::new();
    for document in documents {
        if is_empty_document(&document) {
            continue;
        }
        files.push(File {
            body: YamlBody::new(document, source.clone()),
            source: source.clone(),
        });
    }

    if let Some(err) = scan_err {
        diags.push(Diagnostic::error("Invalid YAML syntax").with_detail(format!(
            "The file {filename:?} contains invalid YAML: {err}."
        )));
        return (files, diags);
    }

    if files.is_empty() {
        let empty = Arc::new(Node::new(1, 1, NodeKind::Mapping { entries: vec![] }));
        files.push(File {
            body: YamlBody::new(empty, source.clone()),
            source: source.clone(),
        });
    }

    tracing::debug!(file = filename, documents = files.len(), "parsed YAML configuration");
    (files, diags)
}

/// True when the path has a YAML extension, including compound extensions
/// such as `.tf.yaml` or `.tftest.yml`.
pub fn is_yaml_file(path: &str) -> bool {
    path.ends_with(".yaml") || path.ends_with(".yml")
}

fn is_empty_document(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Document { content: None } => true,
        NodeKind::Document {
            content: Some(content),
        } => content.is_null(),
        _ => node.is_null(),
    }
}
