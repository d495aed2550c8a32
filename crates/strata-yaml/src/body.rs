//! Body adapter over YAML mappings.
//!
//! A body wraps one mapping node and answers schema queries over it. Keys
//! matching schema attributes become attributes, keys matching block types
//! unpack into blocks (one nested mapping level per label), and everything
//! else is either reported as extraneous (full content) or left for a later
//! query (partial content). Bodies never mutate: the remainder returned by
//! `partial_content` is a fresh view with a larger hidden-name set.

use crate::expression::YamlExpression;
use crate::node::{MappingEntry, Node, NodeKind};
use crate::range::{node_range, node_start_range, range_between};
use crate::SourceFile;
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;
use strata_lang::{
    Attribute, Attributes, Block, Body, BodyContent, BodySchema, Diagnostic, Diagnostics, Range,
};

/// Mapping key treated as a comment line rather than an argument, matching
/// the JSON syntax's convention.
const COMMENT_KEY: &str = "//";

/// A [`Body`] view onto a single YAML mapping.
#[derive(Clone)]
pub struct YamlBody {
    node: Arc<Node>,
    file: Arc<SourceFile>,
    /// Attribute names consumed by earlier partial-content calls.
    hidden: HashSet<String>,
}

impl YamlBody {
    /// Wrap a node, unwrapping a document to its content first so that
    /// downstream code only ever sees the mapping.
    pub fn new(node: Arc<Node>, file: Arc<SourceFile>) -> Self {
        let node = match &node.kind {
            NodeKind::Document {
                content: Some(content),
            } => content.clone(),
            _ => node,
        };
        Self {
            node,
            file,
            hidden: HashSet::new(),
        }
    }

    fn wrap(&self, node: &Arc<Node>) -> YamlBody {
        YamlBody {
            node: node.clone(),
            file: self.file.clone(),
            hidden: HashSet::new(),
        }
    }

    fn entries(&self) -> &[MappingEntry] {
        match &self.node.kind {
            NodeKind::Mapping { entries } => entries,
            _ => &[],
        }
    }

    fn range_of(&self, node: &Node) -> Range {
        node_range(node, &self.file.filename, &self.file.content)
    }

    fn start_range_of(&self, node: &Node) -> Range {
        node_start_range(node, &self.file.filename, &self.file.content)
    }

    fn attribute_for(&self, entry: &MappingEntry, name: &str) -> Attribute {
        Attribute {
            name: name.to_string(),
            expr: Arc::new(YamlExpression::new(entry.value.clone(), self.file.clone())),
            range: range_between(&entry.key, &entry.value, &self.file.filename, &self.file.content),
            name_range: self.range_of(&entry.key),
        }
    }

    /// Shared implementation behind `content` and `partial_content`.
    fn partial(&self, schema: &BodySchema) -> (BodyContent, YamlBody, Diagnostics) {
        let mut diags = Diagnostics::new();
        let mut used: HashSet<String> = self.hidden.clone();
        let mut content = BodyContent::new(self.missing_item_range());

        for entry in self.entries() {
            let name = key_name(entry);
            if self.hidden.contains(name) {
                continue;
            }

            if let Some(attr_schema) = schema.attributes.iter().find(|a| a.name == name) {
                if let Some(existing) = content.attributes.get(name) {
                    diags.push(
                        Diagnostic::error("Duplicate argument")
                            .with_detail(format!(
                                "The argument {name:?} was already set at {}.",
                                existing.range
                            ))
                            .with_subject(self.range_of(&entry.key)),
                    );
                    continue;
                }

                content
                    .attributes
                    .insert(attr_schema.name.clone(), self.attribute_for(entry, name));
                used.insert(name.to_string());
            } else if let Some(block_schema) =
                schema.blocks.iter().find(|b| b.type_name == name)
            {
                let type_range = self.range_of(&entry.key);
                self.unpack_block(
                    &entry.value,
                    &block_schema.type_name,
                    &type_range,
                    &block_schema.label_names,
                    &[],
                    &[],
                    &mut content.blocks,
                    &mut diags,
                );
                used.insert(name.to_string());
            }
            // anything else stays in place under partial content
        }

        for attr_schema in &schema.attributes {
            if attr_schema.required && !content.attributes.contains_key(&attr_schema.name) {
                diags.push(
                    Diagnostic::error("Missing required argument")
                        .with_detail(format!(
                            "The argument {:?} is required, but no definition was found.",
                            attr_schema.name
                        ))
                        .with_subject(self.missing_item_range()),
                );
            }
        }

        let remainder = YamlBody {
            node: self.node.clone(),
            file: self.file.clone(),
            hidden: used,
        };
        (content, remainder, diags)
    }

    /// Recursively unpack a block value: while labels remain, each key of
    /// the mapping contributes one label; once they run out, the value is
    /// the block body.
    #[allow(clippy::too_many_arguments)]
    fn unpack_block(
        &self,
        value: &Arc<Node>,
        type_name: &str,
        type_range: &Range,
        labels_left: &[String],
        labels_used: &[String],
        label_ranges: &[Range],
        blocks: &mut Vec<Block>,
        diags: &mut Diagnostics,
    ) {
        if let Some((label_name, rest)) = labels_left.split_first() {
            let NodeKind::Mapping { entries } = &value.kind else {
                diags.push(
                    Diagnostic::error("Missing block label")
                        .with_detail(format!(
                            "At least one mapping property is required, whose name \
                             represents the {type_name} block's {label_name}."
                        ))
                        .with_subject(self.start_range_of(value)),
                );
                return;
            };

            for entry in entries {
                // fresh copies per branch; the descent reuses the buffers
                let mut used = labels_used.to_vec();
                used.push(key_name(entry).to_string());
                let mut ranges = label_ranges.to_vec();
                ranges.push(self.range_of(&entry.key));

                self.unpack_block(
                    &entry.value,
                    type_name,
                    type_range,
                    rest,
                    &used,
                    &ranges,
                    blocks,
                    diags,
                );
            }
            return;
        }

        match &value.kind {
            NodeKind::Scalar { .. } => {
                if value.is_null() {
                    // `resource: ...: name:` with nothing below it is a
                    // block with empty content
                    blocks.push(self.block_for(value, type_name, type_range, labels_used, label_ranges));
                } else {
                    diags.push(
                        Diagnostic::error("Incorrect YAML value type")
                            .with_detail("A YAML mapping is required here to define block content.")
                            .with_subject(self.start_range_of(value)),
                    );
                }
            }

            NodeKind::Mapping { .. } => {
                blocks.push(self.block_for(value, type_name, type_range, labels_used, label_ranges));
            }

            NodeKind::Sequence { items } => {
                // one block per element; element shape is validated lazily
                // when the block body is queried
                for item in items {
                    blocks.push(self.block_for(item, type_name, type_range, labels_used, label_ranges));
                }
            }

            _ => {}
        }
    }

    fn block_for(
        &self,
        body_node: &Arc<Node>,
        type_name: &str,
        type_range: &Range,
        labels: &[String],
        label_ranges: &[Range],
    ) -> Block {
        Block {
            block_type: type_name.to_string(),
            labels: labels.to_vec(),
            body: Box::new(self.wrap(body_node)),
            def_range: self.range_of(body_node),
            type_range: type_range.clone(),
            label_ranges: label_ranges.to_vec(),
        }
    }
}

impl Body for YamlBody {
    fn content(&self, schema: &BodySchema) -> (BodyContent, Diagnostics) {
        let (content, remainder, mut diags) = self.partial(schema);

        // Candidates for "did you mean": schema attributes that were not
        // set, plus every block type.
        let mut candidates: Vec<&str> = schema
            .attributes
            .iter()
            .filter(|a| !remainder.hidden.contains(&a.name))
            .map(|a| a.name.as_str())
            .collect();
        candidates.extend(schema.blocks.iter().map(|b| b.type_name.as_str()));

        for entry in self.entries() {
            let name = key_name(entry);
            if name == COMMENT_KEY || remainder.hidden.contains(name) {
                continue;
            }

            let suggestion = name_suggestion(name, &candidates)
                .map(|s| format!(" Did you mean {s:?}?"))
                .unwrap_or_default();
            diags.push(
                Diagnostic::error("Extraneous YAML property")
                    .with_detail(format!(
                        "No argument or block type is named {name:?}.{suggestion}"
                    ))
                    .with_subject(self.range_of(&entry.key)),
            );
        }

        (content, diags)
    }

    fn partial_content(&self, schema: &BodySchema) -> (BodyContent, Box<dyn Body>, Diagnostics) {
        let (content, remainder, diags) = self.partial(schema);
        (content, Box::new(remainder), diags)
    }

    fn just_attributes(&self) -> (Attributes, Diagnostics) {
        let mut diags = Diagnostics::new();
        let mut attrs = Attributes::new();

        if !self.node.is_mapping() {
            diags.push(
                Diagnostic::error("Incorrect YAML value type")
                    .with_detail(
                        "A YAML mapping is required here, setting the arguments for this block.",
                    )
                    .with_subject(self.start_range_of(&self.node)),
            );
            return (attrs, diags);
        }

        for entry in self.entries() {
            let name = key_name(entry);
            if name == COMMENT_KEY || self.hidden.contains(name) {
                continue;
            }

            if let Some(existing) = attrs.get(name) {
                diags.push(
                    Diagnostic::error("Duplicate argument")
                        .with_detail(format!(
                            "The argument {name:?} was already set at {}.",
                            existing.range
                        ))
                        .with_subject(self.range_of(&entry.key)),
                );
                continue;
            }

            attrs.insert(name.to_string(), self.attribute_for(entry, name));
        }

        (attrs, diags)
    }

    fn missing_item_range(&self) -> Range {
        // zero-width at the end of the mapping's content, where the missing
        // argument would have been written
        let range = self.range_of(&self.node);
        Range::new(&self.file.filename, range.end, range.end)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn key_name(entry: &MappingEntry) -> &str {
    entry.key.scalar_value().unwrap_or("")
}

/// The first candidate within edit distance 2 of the given name.
fn name_suggestion<'a>(given: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .find(|candidate| levenshtein_distance(given, candidate) <= 2)
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min((curr[j - 1] + 1).min(prev[j - 1] + cost));
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
