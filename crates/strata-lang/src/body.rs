//! The body contract consumed by the schema-driven decoder.

use crate::diagnostic::Diagnostics;
use crate::expression::Expression;
use crate::schema::BodySchema;
use crate::source::Range;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Attributes keyed by name, in source order.
pub type Attributes = IndexMap<String, Attribute>;

/// A named value extracted from a body.
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub expr: Arc<dyn Expression>,
    /// The whole definition, key through value.
    pub range: Range,
    /// Just the name.
    pub name_range: Range,
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("range", &self.range)
            .field("name_range", &self.name_range)
            .finish_non_exhaustive()
    }
}

/// A labeled nested container extracted from a body.
pub struct Block {
    pub block_type: String,
    pub labels: Vec<String>,
    pub body: Box<dyn Body>,
    /// The block's content in the source.
    pub def_range: Range,
    /// The block-defining key.
    pub type_range: Range,
    /// One range per label, in label order.
    pub label_ranges: Vec<Range>,
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("block_type", &self.block_type)
            .field("labels", &self.labels)
            .field("def_range", &self.def_range)
            .field("type_range", &self.type_range)
            .field("label_ranges", &self.label_ranges)
            .finish_non_exhaustive()
    }
}

/// The result of applying a schema to a body.
#[derive(Debug)]
pub struct BodyContent {
    pub attributes: Attributes,
    pub blocks: Vec<Block>,
    /// Where a missing item would have been, for "required but absent"
    /// diagnostics.
    pub missing_item_range: Range,
}

impl BodyContent {
    pub fn new(missing_item_range: Range) -> Self {
        Self {
            attributes: Attributes::new(),
            blocks: Vec::new(),
            missing_item_range,
        }
    }
}

/// A schema-queryable collection of attributes and blocks.
///
/// Bodies are cheap views: querying one never mutates it, and the body
/// returned by [`Body::partial_content`] is a new view that hides the names
/// the call consumed.
pub trait Body {
    /// Extract everything the schema names and report anything left over as
    /// extraneous.
    fn content(&self, schema: &BodySchema) -> (BodyContent, Diagnostics);

    /// Extract everything the schema names and return a remainder body for
    /// the rest.
    fn partial_content(&self, schema: &BodySchema) -> (BodyContent, Box<dyn Body>, Diagnostics);

    /// Treat every entry as an attribute, for bodies with open content.
    fn just_attributes(&self) -> (Attributes, Diagnostics);

    /// A zero-width range pointing at where a missing item would go.
    fn missing_item_range(&self) -> Range;

    /// Access to the concrete type, used at schema boundaries to detect a
    /// body's origin without naming the adapter in general code.
    fn as_any(&self) -> &dyn Any;
}
