//! Restriction checks over parsed native templates.
//!
//! YAML configuration is data: interpolation may reference values, index
//! into them and concatenate strings, but function calls, `for` expressions
//! and conditionals are rejected. The walker descends into forbidden nodes
//! anyway so that nested violations all surface in a single pass.
//!
//! Two template representations are involved. The span-carrying `hcl-edit`
//! tree drives the restriction walk, so diagnostics can be anchored to the
//! offending construct inside the scalar. The value-level `hcl` tree drives
//! [`template_traversals`], which backs `Expression::variables`.

use hcl::template::{Directive, Element, Template};
use hcl::{Expression, Traversal, TraversalOperator};
use hcl_edit::expr as edit_expr;
use hcl_edit::template as edit_template;
use hcl_edit::Span;
use strata_lang::{Diagnostic, Diagnostics, Pos, Range};

use crate::range::line_col;

/// Builds the uniform configuration-as-data rejection diagnostic.
pub(crate) fn restriction_error(summary: &str, feature: &str, subject: Range) -> Diagnostic {
    Diagnostic::error(summary)
        .with_detail(format!(
            "The {feature} is not supported in strata YAML configuration files. \
             YAML configuration follows the \"Configuration as Data\" principle \
             and does not support HCL programming constructs."
        ))
        .with_subject(subject)
}

/// Maps byte spans of a parsed template back to absolute source ranges.
///
/// `base` is the byte offset of the template text within `src`; spans
/// reported by the template parser are relative to that text.
pub(crate) struct SpanMapper<'a> {
    pub filename: &'a str,
    pub src: &'a str,
    pub base: usize,
    /// Used when a node carries no span of its own.
    pub fallback: Range,
}

impl SpanMapper<'_> {
    fn range(&self, span: Option<std::ops::Range<usize>>) -> Range {
        let Some(span) = span else {
            return self.fallback.clone();
        };

        let start_byte = (self.base + span.start).min(self.src.len());
        let end_byte = (self.base + span.end).min(self.src.len());
        let (start_line, start_column) = line_col(self.src, start_byte);
        let (end_line, end_column) = line_col(self.src, end_byte);

        Range::new(
            self.filename,
            Pos::new(start_line, start_column, start_byte),
            Pos::new(end_line, end_column, end_byte),
        )
    }
}

/// Walk a parsed template and report every restricted construct.
pub(crate) fn check_template(
    template: &edit_template::Template,
    mapper: &SpanMapper<'_>,
    diags: &mut Diagnostics,
) {
    for element in template.iter() {
        check_element(element, mapper, diags);
    }
}

fn check_element(
    element: &edit_template::Element,
    mapper: &SpanMapper<'_>,
    diags: &mut Diagnostics,
) {
    match element {
        edit_template::Element::Literal(_) => {}

        edit_template::Element::Interpolation(interpolation) => {
            check_expr(&interpolation.expr, mapper, diags);
        }

        edit_template::Element::Directive(edit_template::Directive::If(directive)) => {
            diags.push(restriction_error(
                "Conditionals not supported in YAML",
                "\"if\" template directive",
                mapper.range(directive.if_expr.cond_expr.span()),
            ));
            check_expr(&directive.if_expr.cond_expr, mapper, diags);
            check_template(&directive.if_expr.template, mapper, diags);
            if let Some(else_expr) = &directive.else_expr {
                check_template(&else_expr.template, mapper, diags);
            }
        }

        edit_template::Element::Directive(edit_template::Directive::For(directive)) => {
            diags.push(restriction_error(
                "for expressions not supported in YAML",
                "\"for\" template directive",
                mapper.range(directive.for_expr.collection_expr.span()),
            ));
            check_expr(&directive.for_expr.collection_expr, mapper, diags);
            check_template(&directive.for_expr.template, mapper, diags);
        }
    }
}

fn check_expr(expr: &edit_expr::Expression, mapper: &SpanMapper<'_>, diags: &mut Diagnostics) {
    match expr {
        edit_expr::Expression::FuncCall(call) => {
            let mut name = String::new();
            for ns in &call.name.namespace {
                name.push_str(ns.as_str());
                name.push_str("::");
            }
            name.push_str(call.name.name.as_str());
            diags.push(restriction_error(
                "Functions not supported in YAML",
                &format!("function call \"{}()\"", name.trim()),
                mapper.range(expr.span()),
            ));
            for arg in call.args.iter() {
                check_expr(arg, mapper, diags);
            }
        }

        edit_expr::Expression::ForExpr(for_expr) => {
            diags.push(restriction_error(
                "for expressions not supported in YAML",
                "\"for\" expression",
                mapper.range(expr.span()),
            ));
            check_expr(&for_expr.intro.collection_expr, mapper, diags);
            if let Some(key_expr) = &for_expr.key_expr {
                check_expr(key_expr, mapper, diags);
            }
            check_expr(&for_expr.value_expr, mapper, diags);
            if let Some(cond) = &for_expr.cond {
                check_expr(&cond.expr, mapper, diags);
            }
        }

        edit_expr::Expression::Conditional(conditional) => {
            diags.push(restriction_error(
                "Conditionals not supported in YAML",
                "conditional (ternary) expression",
                mapper.range(expr.span()),
            ));
            check_expr(&conditional.cond_expr, mapper, diags);
            check_expr(&conditional.true_expr, mapper, diags);
            check_expr(&conditional.false_expr, mapper, diags);
        }

        edit_expr::Expression::StringTemplate(template) => {
            for element in template.iter() {
                check_element(element, mapper, diags);
            }
        }

        edit_expr::Expression::HeredocTemplate(heredoc) => {
            check_template(&heredoc.template, mapper, diags);
        }

        edit_expr::Expression::Parenthesis(parenthesis) => {
            check_expr(parenthesis.inner(), mapper, diags);
        }

        edit_expr::Expression::Traversal(traversal) => {
            check_expr(&traversal.expr, mapper, diags);
            for operator in &traversal.operators {
                if let edit_expr::TraversalOperator::Index(index) = operator.value() {
                    check_expr(index, mapper, diags);
                }
            }
        }

        edit_expr::Expression::UnaryOp(unary) => check_expr(&unary.expr, mapper, diags),
        edit_expr::Expression::BinaryOp(binary) => {
            check_expr(&binary.lhs_expr, mapper, diags);
            check_expr(&binary.rhs_expr, mapper, diags);
        }

        edit_expr::Expression::Array(array) => {
            for item in array.iter() {
                check_expr(item, mapper, diags);
            }
        }

        edit_expr::Expression::Object(object) => {
            for (key, value) in object.iter() {
                if let edit_expr::ObjectKey::Expression(key_expr) = key {
                    check_expr(key_expr, mapper, diags);
                }
                check_expr(value.expr(), mapper, diags);
            }
        }

        // literals, variables and splat markers are data
        _ => {}
    }
}

/// Collect the traversals referenced by a value-level template.
pub(crate) fn template_traversals(template: &Template, vars: &mut Vec<Traversal>) {
    for element in template.elements() {
        match element {
            Element::Literal(_) => {}
            Element::Interpolation(interpolation) => {
                expr_traversals(&interpolation.expr, vars);
            }
            Element::Directive(Directive::If(directive)) => {
                expr_traversals(&directive.cond_expr, vars);
                template_traversals(&directive.true_template, vars);
                if let Some(false_template) = &directive.false_template {
                    template_traversals(false_template, vars);
                }
            }
            Element::Directive(Directive::For(directive)) => {
                expr_traversals(&directive.collection_expr, vars);
                template_traversals(&directive.template, vars);
            }
        }
    }
}

/// Collect the traversals referenced by a value-level expression.
fn expr_traversals(expr: &Expression, vars: &mut Vec<Traversal>) {
    match expr {
        Expression::Variable(variable) => {
            // a bare variable is a traversal with no operators
            vars.push(Traversal::new(
                Expression::Variable(variable.clone()),
                Vec::<TraversalOperator>::new(),
            ));
        }

        Expression::Traversal(traversal) => {
            vars.push((**traversal).clone());
            for operator in &traversal.operators {
                if let TraversalOperator::Index(index) = operator {
                    expr_traversals(index, vars);
                }
            }
        }

        Expression::TemplateExpr(template_expr) => {
            if let Ok(template) = Template::from_expr(template_expr) {
                template_traversals(&template, vars);
            }
        }

        Expression::Array(array) => {
            for item in array {
                expr_traversals(item, vars);
            }
        }

        Expression::Object(object) => {
            for (key, value) in object.iter() {
                if let hcl::ObjectKey::Expression(key_expr) = key {
                    expr_traversals(key_expr, vars);
                }
                expr_traversals(value, vars);
            }
        }

        Expression::Parenthesis(inner) => expr_traversals(inner, vars),

        Expression::Conditional(conditional) => {
            expr_traversals(&conditional.cond_expr, vars);
            expr_traversals(&conditional.true_expr, vars);
            expr_traversals(&conditional.false_expr, vars);
        }

        Expression::Operation(operation) => match operation.as_ref() {
            hcl::Operation::Unary(unary) => expr_traversals(&unary.expr, vars),
            hcl::Operation::Binary(binary) => {
                expr_traversals(&binary.lhs_expr, vars);
                expr_traversals(&binary.rhs_expr, vars);
            }
        },

        Expression::FuncCall(call) => {
            for arg in &call.args {
                expr_traversals(arg, vars);
            }
        }

        Expression::ForExpr(for_expr) => {
            expr_traversals(&for_expr.collection_expr, vars);
            if let Some(key_expr) = &for_expr.key_expr {
                expr_traversals(key_expr, vars);
            }
            expr_traversals(&for_expr.value_expr, vars);
            if let Some(cond_expr) = &for_expr.cond_expr {
                expr_traversals(cond_expr, vars);
            }
        }

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcl::Variable;
    use strata_lang::Severity;

    fn check(template_src: &str) -> Diagnostics {
        let template =
            hcl_edit::parser::parse_template(template_src).expect("template must parse");
        let fallback = Range::new(
            "test.yaml",
            Pos::new(1, 1, 0),
            Pos::new(1, template_src.len() + 1, template_src.len()),
        );
        let mapper = SpanMapper {
            filename: "test.yaml",
            src: template_src,
            base: 0,
            fallback,
        };
        let mut diags = Diagnostics::new();
        check_template(&template, &mapper, &mut diags);
        diags
    }

    fn summaries(diags: &Diagnostics) -> Vec<&str> {
        diags.iter().map(|d| d.summary.as_str()).collect()
    }

    #[test]
    fn function_call_rejected() {
        let diags = check("${lower(var.name)}");
        assert_eq!(summaries(&diags), vec!["Functions not supported in YAML"]);
        let diag = diags.iter().next().unwrap();
        assert!(diag.detail.contains("function call \"lower()\""));
        assert!(diag.subject.is_some());
    }

    #[test]
    fn for_expression_rejected() {
        let diags = check("${[for k, v in var.map : v]}");
        assert_eq!(
            summaries(&diags),
            vec!["for expressions not supported in YAML"]
        );
    }

    #[test]
    fn conditional_rejected() {
        let diags = check("${var.enabled ? \"yes\" : \"no\"}");
        assert_eq!(summaries(&diags), vec!["Conditionals not supported in YAML"]);
    }

    #[test]
    fn template_directives_rejected() {
        let diags = check("%{ if var.enabled }on%{ endif }");
        assert_eq!(summaries(&diags), vec!["Conditionals not supported in YAML"]);

        let diags = check("%{ for item in var.items }${item}%{ endfor }");
        assert_eq!(
            summaries(&diags),
            vec!["for expressions not supported in YAML"]
        );
    }

    #[test]
    fn variable_references_allowed() {
        assert!(check("${var.name}").is_empty());
        assert!(check("${local.value}").is_empty());
        assert!(check("${aws_instance.web.id}").is_empty());
    }

    #[test]
    fn concatenation_and_indexing_allowed() {
        assert!(check("prefix-${var.name}-suffix").is_empty());
        assert!(check("${var.list[0]}").is_empty());
        assert!(check("${var.map[\"key\"]}").is_empty());
        assert!(check("just a plain string").is_empty());
    }

    #[test]
    fn nested_violations_all_reported() {
        let diags = check("${var.enabled ? lower(var.name) : \"default\"}");
        let found = summaries(&diags);
        assert!(found.contains(&"Conditionals not supported in YAML"));
        assert!(found.contains(&"Functions not supported in YAML"));
        assert_eq!(diags.len(), 2);
        assert!(diags.has_errors());
        assert!(diags.iter().all(|d| d.severity == Severity::Error));
    }

    #[test]
    fn violation_spans_point_into_the_template() {
        let src = "${var.enabled ? lower(var.name) : \"x\"}";
        let diags = check(src);
        let function = diags
            .iter()
            .find(|d| d.summary == "Functions not supported in YAML")
            .unwrap();
        let subject = function.subject.as_ref().unwrap();
        assert_eq!(
            &src[subject.start.byte..subject.end.byte],
            "lower(var.name)"
        );
    }

    #[test]
    fn collects_traversals_from_interpolation() {
        let template: Template = "Hello, ${var.name}!".parse().expect("template must parse");
        let mut vars = Vec::new();
        template_traversals(&template, &mut vars);

        let expected = Traversal::builder(Variable::unchecked("var"))
            .attr("name")
            .build();
        assert_eq!(vars, vec![expected]);
    }

    #[test]
    fn collects_bare_variables_and_index_keys() {
        let template: Template = "${name} ${var.map[local.key]}"
            .parse()
            .expect("template must parse");
        let mut vars = Vec::new();
        template_traversals(&template, &mut vars);

        assert_eq!(vars.len(), 3);
        assert_eq!(
            vars[0],
            Traversal::new(
                Expression::Variable(Variable::unchecked("name")),
                Vec::<TraversalOperator>::new()
            )
        );
    }
}
