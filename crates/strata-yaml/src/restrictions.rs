//! Schema-level restrictions for bodies that originate from YAML.
//!
//! The decoder calls these checks as it descends into configuration. They
//! only fire for bodies produced by this adapter; native-syntax bodies pass
//! through untouched, detected via [`is_yaml_body`] without the decoder ever
//! naming the adapter type.

use crate::body::YamlBody;
use crate::expression::YamlExpression;
use crate::template::restriction_error;
use strata_lang::{Block, Body, Diagnostic, Diagnostics, Expression, Range};

/// True when the body was produced by the YAML adapter.
pub fn is_yaml_body(body: &dyn Body) -> bool {
    body.as_any().is::<YamlBody>()
}

/// True when the expression was produced by the YAML adapter.
///
/// Like JSON-syntax expressions, YAML expressions evaluate string scalars as
/// native templates when a context is supplied and as literal strings when
/// it is absent.
pub fn is_yaml_expression(expr: &dyn Expression) -> bool {
    expr.as_any().is::<YamlExpression>()
}

/// Reject block types that have no meaning in configuration-as-data mode.
pub fn validate_block_type(block: &Block, parent: &dyn Body) -> Option<Diagnostic> {
    if !is_yaml_body(parent) {
        return None;
    }

    match block.block_type.as_str() {
        "variable" => Some(restriction_error(
            "Variables not supported in YAML",
            "\"variable\" block",
            block.type_range.clone(),
        )),
        "locals" => Some(restriction_error(
            "Locals not supported in YAML",
            "\"locals\" block",
            block.type_range.clone(),
        )),
        _ => None,
    }
}

/// Reject `count` and `for_each` meta-arguments on resources, data sources
/// and module calls. The ranges are the meta-argument names as found by the
/// decoder's schema query.
pub fn validate_repetition_args(
    body: &dyn Body,
    count_range: Option<&Range>,
    for_each_range: Option<&Range>,
) -> Diagnostics {
    let mut diags = Diagnostics::new();
    if !is_yaml_body(body) {
        return diags;
    }

    if let Some(range) = count_range {
        diags.push(restriction_error(
            "count not supported in YAML",
            "\"count\" meta-argument",
            range.clone(),
        ));
    }
    if let Some(range) = for_each_range {
        diags.push(restriction_error(
            "for_each not supported in YAML",
            "\"for_each\" meta-argument",
            range.clone(),
        ));
    }

    diags
}

/// Reject `dynamic` child blocks.
pub fn validate_dynamic_block(block: &Block, parent: &dyn Body) -> Option<Diagnostic> {
    if !is_yaml_body(parent) {
        return None;
    }

    if block.block_type == "dynamic" {
        return Some(restriction_error(
            "dynamic blocks not supported in YAML",
            "\"dynamic\" block",
            block.type_range.clone(),
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_yaml;
    use std::any::Any;
    use strata_lang::{
        Attributes, BlockHeaderSchema, BodyContent, BodySchema, Pos,
    };

    /// Stand-in for a native-syntax body; the gatekeeper must ignore it.
    struct NativeBody;

    impl Body for NativeBody {
        fn content(&self, _schema: &BodySchema) -> (BodyContent, Diagnostics) {
            (
                BodyContent::new(Range::unknown("native.tf")),
                Diagnostics::new(),
            )
        }

        fn partial_content(
            &self,
            _schema: &BodySchema,
        ) -> (BodyContent, Box<dyn Body>, Diagnostics) {
            (
                BodyContent::new(Range::unknown("native.tf")),
                Box::new(NativeBody),
                Diagnostics::new(),
            )
        }

        fn just_attributes(&self) -> (Attributes, Diagnostics) {
            (Attributes::new(), Diagnostics::new())
        }

        fn missing_item_range(&self) -> Range {
            Range::unknown("native.tf")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn yaml_block(src: &str, block_type: &str, labels: &[&str]) -> (Block, crate::YamlBody) {
        let (files, diags) = parse_yaml(src, "test.yaml");
        assert!(!diags.has_errors(), "unexpected diagnostics: {diags:?}");
        let body = files.into_iter().next().unwrap().body;

        let schema = BodySchema {
            attributes: vec![],
            blocks: vec![BlockHeaderSchema::new(block_type, labels.to_vec())],
        };
        let (mut content, diags) = body.content(&schema);
        assert!(!diags.has_errors(), "unexpected diagnostics: {diags:?}");
        (content.blocks.remove(0), body)
    }

    #[test]
    fn origin_predicates() {
        let (files, _) = parse_yaml("a: 1\n", "test.yaml");
        let body = &files[0].body;
        assert!(is_yaml_body(body));
        assert!(!is_yaml_body(&NativeBody));

        let (attrs, _) = body.just_attributes();
        assert!(is_yaml_expression(attrs["a"].expr.as_ref()));
    }

    #[test]
    fn variable_blocks_rejected() {
        let (block, body) = yaml_block("variable:\n  foo:\n    default: bar\n", "variable", &["name"]);
        let diag = validate_block_type(&block, &body).expect("diagnostic");
        assert_eq!(diag.summary, "Variables not supported in YAML");
        assert!(diag.detail.contains("\"variable\" block"));
        assert_eq!(diag.subject.as_ref().unwrap().start.line, 1);
    }

    #[test]
    fn locals_blocks_rejected_at_the_defining_key() {
        let (block, body) = yaml_block("locals:\n  foo: bar\n", "locals", &[]);
        let diag = validate_block_type(&block, &body).expect("diagnostic");
        assert_eq!(diag.summary, "Locals not supported in YAML");
        // the subject is the `locals` key itself, not the nested content
        assert_eq!(diag.subject.as_ref().unwrap().start.line, 1);
    }

    #[test]
    fn other_block_types_pass() {
        let (block, body) = yaml_block("output:\n  ip:\n    value: x\n", "output", &["name"]);
        assert!(validate_block_type(&block, &body).is_none());
    }

    #[test]
    fn native_bodies_pass_through() {
        let (block, _) = yaml_block("locals:\n  foo: bar\n", "locals", &[]);
        assert!(validate_block_type(&block, &NativeBody).is_none());
        assert!(validate_dynamic_block(&block, &NativeBody).is_none());

        let range = Range::new("native.tf", Pos::new(1, 1, 0), Pos::new(1, 6, 5));
        let diags = validate_repetition_args(&NativeBody, Some(&range), None);
        assert!(diags.is_empty());
    }

    #[test]
    fn repetition_meta_arguments_rejected() {
        let (files, _) = parse_yaml("count: 3\nfor_each: whatever\n", "test.yaml");
        let body = files.into_iter().next().unwrap().body;
        let (attrs, _) = body.just_attributes();

        let diags = validate_repetition_args(
            &body,
            Some(&attrs["count"].name_range),
            Some(&attrs["for_each"].name_range),
        );
        assert_eq!(diags.len(), 2);
        let summaries: Vec<&str> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec!["count not supported in YAML", "for_each not supported in YAML"]
        );
        assert_eq!(
            diags.iter().next().unwrap().subject.as_ref().unwrap().start.line,
            1
        );
    }

    #[test]
    fn dynamic_blocks_rejected() {
        let (block, body) = yaml_block("dynamic:\n  setting:\n    content:\n", "dynamic", &["name"]);
        let diag = validate_dynamic_block(&block, &body).expect("diagnostic");
        assert_eq!(diag.summary, "dynamic blocks not supported in YAML");
    }
}
