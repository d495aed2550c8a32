//! The expression contract: lazily evaluable leaves of a body.

use crate::diagnostic::Diagnostics;
use crate::source::Range;
use crate::value::Value;
use std::any::Any;
use std::sync::Arc;

pub use hcl::eval::Context as EvalContext;
pub use hcl::Traversal;

/// A function call extracted from an expression without evaluating it.
///
/// Provided for API compatibility with the native syntax. Front-ends that
/// forbid function calls still surface the descriptor so callers can report
/// the call by name.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticCall {
    pub name: String,
    pub args: Vec<hcl::Expression>,
}

/// An evaluable leaf of a configuration body.
pub trait Expression {
    /// Evaluate to a [`Value`]. With a context, string content may be
    /// interpreted as a native template; without one it stays literal.
    fn value(&self, ctx: Option<&EvalContext<'_>>) -> (Value, Diagnostics);

    /// The variable traversals this expression references, e.g. `var.name`.
    fn variables(&self) -> Vec<Traversal>;

    fn range(&self) -> Range;

    /// A zero-width range at the start of the expression.
    fn start_range(&self) -> Range;

    /// Interpret the expression as an absolute traversal such as
    /// `aws_instance.web.id`.
    fn as_traversal(&self) -> Option<Traversal> {
        None
    }

    /// Interpret the expression as a static function call.
    fn expr_call(&self) -> Option<StaticCall> {
        None
    }

    /// The element expressions of a sequence-shaped expression.
    fn expr_list(&self) -> Option<Vec<Arc<dyn Expression>>> {
        None
    }

    /// The key/value expression pairs of a mapping-shaped expression.
    #[allow(clippy::type_complexity)]
    fn expr_map(&self) -> Option<Vec<(Arc<dyn Expression>, Arc<dyn Expression>)>> {
        None
    }

    /// Access to the concrete type, mirroring [`crate::Body::as_any`].
    fn as_any(&self) -> &dyn Any;
}
