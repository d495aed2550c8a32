//! Diagnostic messages returned by body and expression operations.
//!
//! Operations never abort: problems are reported as [`Diagnostic`] values
//! accumulated in a [`Diagnostics`] list that is returned alongside every
//! result.

use crate::source::Range;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How severe a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// A problem that prevents the configuration from being used.
    Error,
    /// A problem worth reporting that does not block decoding.
    Warning,
}

/// A single problem report with an optional source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Short, stable description of the problem kind, e.g.
    /// `Missing block label`. Suitable for grouping and testing.
    pub summary: String,

    /// Human-oriented phrasing with the specifics of this occurrence.
    pub detail: String,

    /// The source region the diagnostic is about, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Range>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: String::new(),
            subject: None,
        }
    }

    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(summary)
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_subject(mut self, subject: Range) -> Self {
        self.subject = Some(subject);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(subject) = &self.subject {
            write!(f, "{subject}: ")?;
        }
        write!(f, "{}", self.summary)?;
        if !self.detail.is_empty() {
            write!(f, "; {}", self.detail)?;
        }
        Ok(())
    }
}

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Pos;

    #[test]
    fn builder_chain() {
        let range = Range::new("test.yaml", Pos::new(2, 3, 10), Pos::new(2, 8, 15));
        let diag = Diagnostic::error("Extraneous YAML property")
            .with_detail("No argument or block type is named \"conut\".")
            .with_subject(range.clone());

        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.summary, "Extraneous YAML property");
        assert_eq!(diag.subject, Some(range));
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning("deprecated"));
        assert!(!diags.has_errors());

        diags.push(Diagnostic::error("Invalid YAML syntax"));
        assert!(diags.has_errors());
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn display_includes_subject() {
        let diag = Diagnostic::error("Duplicate argument")
            .with_detail("The argument \"ami\" was already set at test.yaml:2,1-4.")
            .with_subject(Range::new("test.yaml", Pos::new(3, 1, 20), Pos::new(3, 4, 23)));
        assert_eq!(
            diag.to_string(),
            "test.yaml:3,1-4: Duplicate argument; The argument \"ami\" was already set at test.yaml:2,1-4."
        );
    }
}
