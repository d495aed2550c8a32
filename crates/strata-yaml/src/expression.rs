//! Expression adapter over YAML nodes.
//!
//! Any node can be wrapped: scalars evaluate according to their resolved
//! tag, sequences become tuples, mappings become objects and aliases follow
//! their anchor. String scalars are special: with an evaluation context they
//! are re-parsed as native templates rooted at the scalar's source position,
//! so `${var.x}` interpolation works and inner diagnostics carry correct
//! ranges; without a context they stay literal.

use crate::node::{MappingEntry, Node, NodeKind, ScalarStyle, ScalarTag};
use crate::range::{node_range, node_start_range};
use crate::template::{self, SpanMapper};
use crate::SourceFile;
use hcl::eval::{Context, Evaluate};
use hcl::template::Element;
use hcl::Template;
use indexmap::IndexMap;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use strata_lang::{
    Diagnostic, Diagnostics, Expression, Range, StaticCall, Traversal, Value,
};

/// An [`Expression`] view onto a single YAML node.
#[derive(Clone)]
pub struct YamlExpression {
    node: Arc<Node>,
    file: Arc<SourceFile>,
}

impl YamlExpression {
    pub(crate) fn new(node: Arc<Node>, file: Arc<SourceFile>) -> Self {
        Self { node, file }
    }

    fn range_of(&self, node: &Node) -> Range {
        node_range(node, &self.file.filename, &self.file.content)
    }

    fn eval_node(&self, node: &Arc<Node>, ctx: Option<&Context<'_>>, diags: &mut Diagnostics) -> Value {
        match &node.kind {
            NodeKind::Scalar { value, style, tag } => {
                self.eval_scalar(node, value, *style, tag, ctx, diags)
            }

            NodeKind::Sequence { items } => Value::Tuple(
                items
                    .iter()
                    .map(|item| self.eval_node(item, ctx, diags))
                    .collect(),
            ),

            NodeKind::Mapping { entries } => self.eval_mapping(entries, ctx, diags),

            NodeKind::Alias { target } => match target {
                Some(target) => self.eval_node(target, ctx, diags),
                None => Value::Dynamic,
            },

            NodeKind::Document { .. } => Value::Dynamic,
        }
    }

    fn eval_scalar(
        &self,
        node: &Node,
        value: &str,
        style: ScalarStyle,
        tag: &ScalarTag,
        ctx: Option<&Context<'_>>,
        diags: &mut Diagnostics,
    ) -> Value {
        match tag {
            ScalarTag::Null => return Value::Null,
            ScalarTag::Bool => {
                if let Some(b) = parse_bool(value) {
                    return Value::Bool(b);
                }
            }
            ScalarTag::Int | ScalarTag::Float => {
                if let Some(n) = parse_number(value) {
                    return Value::Number(n);
                }
            }
            _ => {}
        }

        // Binary content is opaque: never interpolated, even with a context.
        if let Some(ctx) = ctx {
            if *tag != ScalarTag::Binary {
                return self.eval_template(node, value, style, ctx, diags);
            }
        }

        Value::String(value.to_string())
    }

    /// Parse a string scalar as a native template and evaluate it.
    fn eval_template(
        &self,
        node: &Node,
        value: &str,
        style: ScalarStyle,
        ctx: &Context<'_>,
        diags: &mut Diagnostics,
    ) -> Value {
        let range = self.range_of(node);

        let template: Template = match value.parse() {
            Ok(template) => template,
            Err(err) => {
                diags.push(
                    Diagnostic::error("Invalid template syntax")
                        .with_detail(format!(
                            "Cannot parse {value:?} as a native template: {err}."
                        ))
                        .with_subject(range),
                );
                return Value::Dynamic;
            }
        };

        // The span-carrying parse anchors restriction diagnostics inside the
        // scalar. Quoted styles shift the content one byte past the opening
        // quote.
        if let Ok(spanned) = hcl_edit::parser::parse_template(value) {
            let base = range.start.byte + usize::from(style.is_quoted());
            let mapper = SpanMapper {
                filename: &self.file.filename,
                src: &self.file.content,
                base,
                fallback: range.clone(),
            };
            template::check_template(&spanned, &mapper, diags);
        }

        // A template that is exactly one interpolation yields the value
        // itself; anything else concatenates to a string.
        if let [Element::Interpolation(interpolation)] = template.elements() {
            match interpolation.expr.evaluate(ctx) {
                Ok(value) => Value::from(value),
                Err(errors) => {
                    eval_errors(errors.into(), &range, diags);
                    Value::Dynamic
                }
            }
        } else {
            match template.evaluate(ctx) {
                Ok(rendered) => Value::String(rendered),
                Err(errors) => {
                    eval_errors(errors.into(), &range, diags);
                    Value::Dynamic
                }
            }
        }
    }

    fn eval_mapping(
        &self,
        entries: &[MappingEntry],
        ctx: Option<&Context<'_>>,
        diags: &mut Diagnostics,
    ) -> Value {
        let mut object: IndexMap<String, Value> = IndexMap::new();
        let mut defined_at: HashMap<String, Range> = HashMap::new();
        let mut known = true;

        for entry in entries {
            let key_value = self.eval_node(&entry.key, ctx, diags);
            let value = self.eval_node(&entry.value, ctx, diags);
            let key_range = self.range_of(&entry.key);

            if key_value.is_null() {
                diags.push(
                    Diagnostic::error("Invalid object key expression")
                        .with_detail("Cannot use a null value as an object key.")
                        .with_subject(key_range),
                );
                continue;
            }
            if key_value.is_dynamic() {
                known = false;
                continue;
            }
            let Some(name) = key_value.as_object_key() else {
                diags.push(
                    Diagnostic::error("Invalid object key expression")
                        .with_detail(
                            "Cannot use this expression as an object key: a string is required.",
                        )
                        .with_subject(key_range),
                );
                continue;
            };

            if object.contains_key(&name) {
                diags.push(
                    Diagnostic::error("Duplicate object attribute")
                        .with_detail(format!(
                            "An attribute named {name:?} was already defined at {}.",
                            defined_at[&name]
                        ))
                        .with_subject(key_range),
                );
                continue;
            }

            defined_at.insert(name.clone(), key_range);
            object.insert(name, value);
        }

        if !known {
            return Value::Dynamic;
        }
        Value::Object(object)
    }

    fn collect_variables(&self, node: &Arc<Node>, vars: &mut Vec<Traversal>) {
        match &node.kind {
            NodeKind::Scalar { value, tag, .. } => {
                if *tag == ScalarTag::Binary {
                    return;
                }
                if let Ok(template) = value.parse::<Template>() {
                    template::template_traversals(&template, vars);
                }
            }

            NodeKind::Sequence { items } => {
                for item in items {
                    self.collect_variables(item, vars);
                }
            }

            NodeKind::Mapping { entries } => {
                for entry in entries {
                    // keys can contain interpolation too
                    self.collect_variables(&entry.key, vars);
                    self.collect_variables(&entry.value, vars);
                }
            }

            NodeKind::Alias {
                target: Some(target),
            } => self.collect_variables(target, vars),

            _ => {}
        }
    }
}

impl Expression for YamlExpression {
    fn value(&self, ctx: Option<&Context<'_>>) -> (Value, Diagnostics) {
        let mut diags = Diagnostics::new();
        let node = self.node.clone();
        let value = self.eval_node(&node, ctx, &mut diags);
        (value, diags)
    }

    fn variables(&self) -> Vec<Traversal> {
        let mut vars = Vec::new();
        let node = self.node.clone();
        self.collect_variables(&node, &mut vars);
        vars
    }

    fn range(&self) -> Range {
        node_range(&self.node, &self.file.filename, &self.file.content)
    }

    fn start_range(&self) -> Range {
        node_start_range(&self.node, &self.file.filename, &self.file.content)
    }

    fn as_traversal(&self) -> Option<Traversal> {
        let value = self.node.scalar_value()?;
        let parsed = hcl_edit::parser::parse_expr(value).ok()?;

        match hcl::Expression::from(parsed) {
            hcl::Expression::Variable(variable) => Some(Traversal::new(
                hcl::Expression::Variable(variable),
                Vec::<hcl::TraversalOperator>::new(),
            )),
            hcl::Expression::Traversal(traversal) => {
                let traversal = *traversal;
                if !matches!(traversal.expr, hcl::Expression::Variable(_)) {
                    return None;
                }
                let absolute = traversal.operators.iter().all(|operator| {
                    matches!(
                        operator,
                        hcl::TraversalOperator::GetAttr(_)
                            | hcl::TraversalOperator::LegacyIndex(_)
                            | hcl::TraversalOperator::Index(
                                hcl::Expression::Number(_) | hcl::Expression::String(_)
                            )
                    )
                });
                absolute.then_some(traversal)
            }
            _ => None,
        }
    }

    fn expr_call(&self) -> Option<StaticCall> {
        let value = self.node.scalar_value()?;
        let parsed = hcl_edit::parser::parse_expr(value).ok()?;

        match hcl::Expression::from(parsed) {
            hcl::Expression::FuncCall(call) => Some(StaticCall {
                name: call.name.to_string(),
                args: call.args.clone(),
            }),
            _ => None,
        }
    }

    fn expr_list(&self) -> Option<Vec<Arc<dyn Expression>>> {
        let NodeKind::Sequence { items } = &self.node.kind else {
            return None;
        };
        Some(
            items
                .iter()
                .map(|item| {
                    Arc::new(YamlExpression::new(item.clone(), self.file.clone()))
                        as Arc<dyn Expression>
                })
                .collect(),
        )
    }

    fn expr_map(&self) -> Option<Vec<(Arc<dyn Expression>, Arc<dyn Expression>)>> {
        let NodeKind::Mapping { entries } = &self.node.kind else {
            return None;
        };
        Some(
            entries
                .iter()
                .map(|entry| {
                    (
                        Arc::new(YamlExpression::new(entry.key.clone(), self.file.clone()))
                            as Arc<dyn Expression>,
                        Arc::new(YamlExpression::new(entry.value.clone(), self.file.clone()))
                            as Arc<dyn Expression>,
                    )
                })
                .collect(),
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => Some(true),
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => Some(false),
        _ => None,
    }
}

/// Parse a numeric scalar. Decimal forms parse directly; hex, octal and
/// binary integer literals go through the radix fallback.
fn parse_number(value: &str) -> Option<hcl::Number> {
    if let Ok(i) = value.parse::<i64>() {
        return Some(hcl::Number::from(i));
    }
    if let Ok(u) = value.parse::<u64>() {
        return Some(hcl::Number::from(u));
    }
    if let Some(n) = parse_radix_int(value) {
        return Some(n);
    }
    hcl::Number::from_f64(value.parse::<f64>().ok()?)
}

fn parse_radix_int(value: &str) -> Option<hcl::Number> {
    let (negative, body) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let (radix, digits) = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (16, hex)
    } else if let Some(oct) = body.strip_prefix("0o").or_else(|| body.strip_prefix("0O")) {
        (8, oct)
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        (2, bin)
    } else {
        return None;
    };

    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(hcl::Number::from(if negative { -magnitude } else { magnitude }))
}

fn eval_errors(errors: hcl::eval::Errors, range: &Range, diags: &mut Diagnostics) {
    for error in errors.iter() {
        let summary = if matches!(error.kind(), hcl::eval::ErrorKind::UndefinedVar(_)) {
            "Unknown variable"
        } else {
            "Invalid template expression"
        };
        diags.push(
            Diagnostic::error(summary)
                .with_detail(error.to_string())
                .with_subject(range.clone()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_documents;
    use hcl::Variable;
    use pretty_assertions::assert_eq;

    fn file(src: &str) -> Arc<SourceFile> {
        Arc::new(SourceFile {
            filename: "test.yaml".to_string(),
            content: src.to_string(),
        })
    }

    fn value_expr(src: &str, key: &str) -> YamlExpression {
        let doc = parse_documents(src)
            .expect("source must parse")
            .into_iter()
            .next()
            .expect("one document");
        let NodeKind::Document {
            content: Some(root),
        } = &doc.kind
        else {
            panic!("expected document content");
        };
        let NodeKind::Mapping { entries } = &root.kind else {
            panic!("expected mapping root");
        };
        let entry = entries
            .iter()
            .find(|e| e.key.scalar_value() == Some(key))
            .expect("key present");
        YamlExpression::new(entry.value.clone(), file(src))
    }

    fn eval(src: &str, key: &str) -> Value {
        let (value, diags) = value_expr(src, key).value(None);
        assert!(!diags.has_errors(), "unexpected diagnostics: {diags:?}");
        value
    }

    #[test]
    fn scalar_values_without_context() {
        assert_eq!(eval("value: hello", "value"), Value::from("hello"));
        assert_eq!(eval("value: 42", "value"), Value::from(42));
        assert_eq!(eval("value: true", "value"), Value::Bool(true));
        assert_eq!(eval("value: false", "value"), Value::Bool(false));
        assert_eq!(eval("value: null", "value"), Value::Null);
        assert_eq!(eval("value: ~", "value"), Value::Null);
        assert_eq!(
            eval("value: 3.25", "value"),
            Value::Number(hcl::Number::from_f64(3.25).unwrap())
        );
        assert_eq!(
            eval("value: 0x1F", "value"),
            Value::from(31)
        );
        assert_eq!(eval("value: \"42\"", "value"), Value::from("42"));
    }

    #[test]
    fn interpolation_stays_literal_without_context() {
        assert_eq!(
            eval("value: \"Hello, ${var.name}!\"", "value"),
            Value::from("Hello, ${var.name}!")
        );
    }

    #[test]
    fn sequence_evaluates_to_tuple() {
        let value = eval("items:\n  - one\n  - 2\n  - true\n", "items");
        assert_eq!(
            value,
            Value::Tuple(vec![Value::from("one"), Value::from(2), Value::Bool(true)])
        );
    }

    #[test]
    fn mapping_evaluates_to_object() {
        let value = eval("config:\n  key1: value1\n  key2: 2\n", "config");
        let object = value.as_object().expect("object value");
        assert_eq!(object["key1"], Value::from("value1"));
        assert_eq!(object["key2"], Value::from(2));
    }

    #[test]
    fn duplicate_object_keys_diagnose_with_earlier_range() {
        let expr = value_expr("config:\n  a: 1\n  a: 2\n", "config");
        let (value, diags) = expr.value(None);

        assert!(diags.has_errors());
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.summary, "Duplicate object attribute");
        assert!(diag.detail.contains("test.yaml:2"));
        assert_eq!(diag.subject.as_ref().unwrap().start.line, 3);

        // the earlier definition wins
        assert_eq!(value.as_object().unwrap()["a"], Value::from(1));
    }

    #[test]
    fn alias_follows_anchor() {
        let value = eval("base: &ami ami-12345\ncopy: *ami\n", "copy");
        assert_eq!(value, Value::from("ami-12345"));
    }

    #[test]
    fn interpolation_with_context() {
        let mut ctx = Context::new();
        let mut var = hcl::value::Map::new();
        var.insert("name".to_string(), hcl::Value::from("World"));
        ctx.declare_var("var", hcl::Value::Object(var));

        let expr = value_expr("value: \"Hello, ${var.name}!\"", "value");
        let (value, diags) = expr.value(Some(&ctx));
        assert!(!diags.has_errors(), "unexpected diagnostics: {diags:?}");
        assert_eq!(value, Value::from("Hello, World!"));
    }

    #[test]
    fn single_interpolation_yields_value_itself() {
        let mut ctx = Context::new();
        let mut var = hcl::value::Map::new();
        var.insert(
            "list".to_string(),
            hcl::Value::Array(vec![hcl::Value::from(1), hcl::Value::from(2)]),
        );
        ctx.declare_var("var", hcl::Value::Object(var));

        let expr = value_expr("value: \"${var.list}\"", "value");
        let (value, diags) = expr.value(Some(&ctx));
        assert!(!diags.has_errors(), "unexpected diagnostics: {diags:?}");
        assert_eq!(value, Value::Tuple(vec![Value::from(1), Value::from(2)]));
    }

    #[test]
    fn plain_string_with_context_stays_itself() {
        let ctx = Context::new();
        let expr = value_expr("value: hello world", "value");
        let (value, diags) = expr.value(Some(&ctx));
        assert!(!diags.has_errors());
        assert_eq!(value, Value::from("hello world"));
    }

    #[test]
    fn unknown_variable_diagnoses() {
        let ctx = Context::new();
        let expr = value_expr("value: \"${var.missing}\"", "value");
        let (value, diags) = expr.value(Some(&ctx));
        assert!(diags.has_errors());
        assert_eq!(value, Value::Dynamic);
        assert_eq!(diags.iter().next().unwrap().summary, "Unknown variable");
    }

    #[test]
    fn forbidden_function_reported_during_evaluation() {
        let mut ctx = Context::new();
        let mut var = hcl::value::Map::new();
        var.insert("name".to_string(), hcl::Value::from("x"));
        ctx.declare_var("var", hcl::Value::Object(var));

        let expr = value_expr("value: \"${lower(var.name)}\"", "value");
        let (_, diags) = expr.value(Some(&ctx));
        assert!(diags
            .iter()
            .any(|d| d.summary == "Functions not supported in YAML"));
    }

    #[test]
    fn variables_from_scalar() {
        let expr = value_expr("value: \"Hello, ${var.name}!\"", "value");
        let vars = expr.variables();
        let expected = Traversal::builder(Variable::unchecked("var"))
            .attr("name")
            .build();
        assert_eq!(vars, vec![expected]);
    }

    #[test]
    fn variables_recurse_into_collections() {
        let expr = value_expr(
            "value:\n  - \"${var.a}\"\n  - nested:\n      x: \"${local.b}\"\n",
            "value",
        );
        let vars = expr.variables();
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn as_traversal_parses_dotted_references() {
        let expr = value_expr("value: aws_instance.web.id", "value");
        let traversal = expr.as_traversal().expect("traversal");
        let expected = Traversal::builder(Variable::unchecked("aws_instance"))
            .attr("web")
            .attr("id")
            .build();
        assert_eq!(traversal, expected);
    }

    #[test]
    fn as_traversal_rejects_non_references() {
        assert!(value_expr("value: \"not a ref!\"", "value")
            .as_traversal()
            .is_none());
        assert!(value_expr("value: 42", "value").as_traversal().is_none());
        assert!(value_expr("items:\n  - a\n", "items").as_traversal().is_none());
    }

    #[test]
    fn expr_call_extracts_static_calls() {
        let call = value_expr("value: lower(\"X\")", "value")
            .expr_call()
            .expect("static call");
        assert_eq!(call.name, "lower");
        assert_eq!(call.args.len(), 1);

        assert!(value_expr("value: plain", "value").expr_call().is_none());
    }

    #[test]
    fn expr_list_and_map_expose_children() {
        let list = value_expr("items:\n  - a\n  - b\n", "items")
            .expr_list()
            .expect("list");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].value(None).0, Value::from("a"));

        let map = value_expr("config:\n  k: v\n", "config")
            .expr_map()
            .expect("map");
        assert_eq!(map.len(), 1);
        assert_eq!(map[0].0.value(None).0, Value::from("k"));
        assert_eq!(map[0].1.value(None).0, Value::from("v"));
    }

    #[test]
    fn number_parsing_forms() {
        assert_eq!(parse_number("42"), Some(hcl::Number::from(42)));
        assert_eq!(parse_number("-7"), Some(hcl::Number::from(-7)));
        assert_eq!(parse_number("0x10"), Some(hcl::Number::from(16)));
        assert_eq!(parse_number("0o17"), Some(hcl::Number::from(15)));
        assert_eq!(parse_number("0b101"), Some(hcl::Number::from(5)));
        assert_eq!(parse_number("2.5"), hcl::Number::from_f64(2.5));
        assert_eq!(parse_number("nope"), None);
    }
}
