//! # strata-lang
//!
//! The schema-consumer contract for strata configuration bodies.
//!
//! The strata decoder walks configuration as a tree of *bodies* (collections
//! of named attributes and labeled blocks) and *expressions* (evaluable
//! leaves). This crate defines that contract — source positions, diagnostics,
//! schemas, the [`Body`] and [`Expression`] traits, and the [`Value`] model —
//! so that syntax front-ends (native HCL, YAML, …) can implement it and the
//! decoder can stay syntax-agnostic.
//!
//! Template and traversal types are shared with the `hcl` crate, which is the
//! engine used for `${…}` interpolation across all front-ends.
//!
//! ## Example
//!
//! ```rust,no_run
//! use strata_lang::{Body, BodySchema, AttributeSchema};
//!
//! fn read_name(body: &dyn Body) {
//!     let schema = BodySchema {
//!         attributes: vec![AttributeSchema::required("name")],
//!         blocks: vec![],
//!     };
//!     let (content, diags) = body.content(&schema);
//!     if !diags.has_errors() {
//!         let attr = &content.attributes["name"];
//!         println!("name found at {}", attr.range);
//!     }
//! }
//! ```

mod body;
mod diagnostic;
mod expression;
mod schema;
mod source;
mod value;

pub use body::{Attribute, Attributes, Block, Body, BodyContent};
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use expression::{EvalContext, Expression, StaticCall, Traversal};
pub use schema::{AttributeSchema, BlockHeaderSchema, BodySchema};
pub use source::{Pos, Range};
pub use value::Value;
