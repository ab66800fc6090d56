// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Recognition of desugared comprehension macros and their lowering into
//! PostgreSQL subqueries.
//!
//! The CEL macro expander reduces `all`, `exists`, `exists_one`, `map` and
//! `filter` to one canonical fold shape (iter-range, iter-var, accumulator,
//! init, loop-condition, loop-step, result). The macro identity is not kept
//! on the AST, so it is recovered here by structural pattern matching on
//! the accumulator init, the loop step, and the result.

use crate::cel::expr::{Comprehension, Constant, Expr, ExprKind};
use crate::cel::operators;
use crate::error::{ConvertError, ConvertResult};

use super::converter::{Converter, IterBinding};
use super::json_path::JsonChain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComprehensionKind {
    All,
    Exists,
    ExistsOne,
    Map,
    MapFilter,
    Filter,
}

pub(crate) struct ComprehensionInfo<'e> {
    pub kind: ComprehensionKind,
    /// Membership/quantifier predicate (`all`, `exists`, `exists_one`,
    /// `filter`).
    pub predicate: Option<&'e Expr>,
    /// Filter condition of a filtering `map`.
    pub filter: Option<&'e Expr>,
    /// Element transform of `map`.
    pub transform: Option<&'e Expr>,
}

/// Classifies the desugared fold back into the originating macro. The
/// extracted sub-expressions are the ones not referring to the accumulator
/// variable.
pub(crate) fn classify(comp: &Comprehension) -> Option<ComprehensionInfo<'_>> {
    let accu = comp.accu_var.as_str();

    // all(x, P): init TRUE, step `accu && P`, result `accu`
    if is_bool_const(&comp.accu_init, true) && is_ident(&comp.result, accu) {
        if let Some(predicate) = logical_step(&comp.loop_step, operators::LOGICAL_AND, accu) {
            return Some(ComprehensionInfo {
                kind: ComprehensionKind::All,
                predicate: Some(predicate),
                filter: None,
                transform: None,
            });
        }
    }

    // exists(x, P): init FALSE, step `accu || P`, result `accu`
    if is_bool_const(&comp.accu_init, false) && is_ident(&comp.result, accu) {
        if let Some(predicate) = logical_step(&comp.loop_step, operators::LOGICAL_OR, accu) {
            return Some(ComprehensionInfo {
                kind: ComprehensionKind::Exists,
                predicate: Some(predicate),
                filter: None,
                transform: None,
            });
        }
    }

    // exists_one(x, P): init 0, step `P ? accu + 1 : accu`, result `accu == 1`
    if is_int_const(&comp.accu_init, 0) && is_equals_one(&comp.result, accu) {
        if let Some((condition, then_branch, else_branch)) = conditional_parts(&comp.loop_step) {
            if is_accu_increment(then_branch, accu) && is_ident(else_branch, accu) {
                return Some(ComprehensionInfo {
                    kind: ComprehensionKind::ExistsOne,
                    predicate: Some(condition),
                    filter: None,
                    transform: None,
                });
            }
        }
    }

    if is_empty_list(&comp.accu_init) && is_ident(&comp.result, accu) {
        // map(x, T): step `accu + [T]`
        if let Some(transform) = append_step(&comp.loop_step, accu) {
            return Some(ComprehensionInfo {
                kind: ComprehensionKind::Map,
                predicate: None,
                filter: None,
                transform: Some(transform),
            });
        }

        // filter(x, P): step `P ? accu + [x] : accu`
        // map(x, F, T):  step `F ? accu + [T] : accu`
        if let Some((condition, then_branch, else_branch)) = conditional_parts(&comp.loop_step) {
            if is_ident(else_branch, accu) {
                if let Some(element) = append_step(then_branch, accu) {
                    if is_ident(element, &comp.iter_var) {
                        return Some(ComprehensionInfo {
                            kind: ComprehensionKind::Filter,
                            predicate: Some(condition),
                            filter: None,
                            transform: None,
                        });
                    }
                    return Some(ComprehensionInfo {
                        kind: ComprehensionKind::MapFilter,
                        predicate: None,
                        filter: Some(condition),
                        transform: Some(element),
                    });
                }
            }
        }
    }

    None
}

fn is_ident(expr: &Expr, name: &str) -> bool {
    expr.as_ident() == Some(name)
}

fn is_bool_const(expr: &Expr, value: bool) -> bool {
    matches!(expr.as_const(), Some(Constant::Bool(b)) if *b == value)
}

fn is_int_const(expr: &Expr, value: i64) -> bool {
    matches!(expr.as_const(), Some(Constant::Int(i)) if *i == value)
}

fn is_empty_list(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::List(elements) if elements.is_empty())
}

/// `accu <op> P` or `P <op> accu`; returns `P`.
fn logical_step<'e>(step: &'e Expr, op: &str, accu: &str) -> Option<&'e Expr> {
    let (_, function, args) = step.as_call()?;
    if function != op || args.len() != 2 {
        return None;
    }
    args.iter().any(|arg| is_ident(arg, accu)).then_some(())?;
    args.iter().find(|arg| !is_ident(arg, accu))
}

fn conditional_parts(expr: &Expr) -> Option<(&Expr, &Expr, &Expr)> {
    let (_, function, args) = expr.as_call()?;
    if function != operators::CONDITIONAL || args.len() != 3 {
        return None;
    }
    Some((&args[0], &args[1], &args[2]))
}

/// `accu + 1`
fn is_accu_increment(expr: &Expr, accu: &str) -> bool {
    match expr.as_call() {
        Some((_, function, args)) if function == operators::ADD && args.len() == 2 => {
            args.iter().any(|arg| is_ident(arg, accu))
                && args.iter().any(|arg| is_int_const(arg, 1))
        }
        _ => false,
    }
}

/// `accu + [element]`; returns the element.
fn append_step<'e>(step: &'e Expr, accu: &str) -> Option<&'e Expr> {
    let (_, function, args) = step.as_call()?;
    if function != operators::ADD || args.len() != 2 {
        return None;
    }
    args.iter().any(|arg| is_ident(arg, accu)).then_some(())?;
    args.iter().find_map(|arg| match &arg.kind {
        ExprKind::List(elements) if elements.len() == 1 => Some(&elements[0]),
        _ => None,
    })
}

/// `accu == 1`
fn is_equals_one(expr: &Expr, accu: &str) -> bool {
    match expr.as_call() {
        Some((_, function, args)) if function == operators::EQUALS && args.len() == 2 => {
            args.iter().any(|arg| is_ident(arg, accu))
                && args.iter().any(|arg| is_int_const(arg, 1))
        }
        _ => false,
    }
}

impl<'a> Converter<'a> {
    pub(crate) fn visit_comprehension(
        &mut self,
        expr: &Expr,
        comp: &Comprehension,
    ) -> ConvertResult<()> {
        let info =
            classify(comp).ok_or(ConvertError::UnrecognizedComprehension(expr.id))?;

        let chain = self.resolve_json_chain(&comp.iter_range);
        let binding = chain.as_ref().map(|chain| IterBinding {
            var: comp.iter_var.clone(),
            elements: self.json_element_shape(chain),
            jsonb: chain.jsonb(),
        });

        match info.kind {
            ComprehensionKind::All => {
                let predicate = info
                    .predicate
                    .ok_or(ConvertError::UnrecognizedComprehension(expr.id))?;
                self.sql.push_str("NOT EXISTS (SELECT 1 FROM ");
                self.push_iter_source(chain.as_ref(), &comp.iter_range)?;
                self.sql.push_str(" AS ");
                self.sql.push_str(&comp.iter_var);
                self.sql.push_str(" WHERE ");
                self.push_array_guard(chain.as_ref());
                self.sql.push_str("NOT (");
                self.with_binding(binding, |con| con.visit(predicate))?;
                self.sql.push_str("))");
            }
            ComprehensionKind::Exists => {
                let predicate = info
                    .predicate
                    .ok_or(ConvertError::UnrecognizedComprehension(expr.id))?;
                self.sql.push_str("EXISTS (SELECT 1 FROM ");
                self.push_iter_source(chain.as_ref(), &comp.iter_range)?;
                self.sql.push_str(" AS ");
                self.sql.push_str(&comp.iter_var);
                self.sql.push_str(" WHERE ");
                self.push_array_guard(chain.as_ref());
                self.with_binding(binding, |con| con.visit(predicate))?;
                self.sql.push(')');
            }
            ComprehensionKind::ExistsOne => {
                let predicate = info
                    .predicate
                    .ok_or(ConvertError::UnrecognizedComprehension(expr.id))?;
                self.sql.push_str("(SELECT COUNT(*) FROM ");
                self.push_iter_source(chain.as_ref(), &comp.iter_range)?;
                self.sql.push_str(" AS ");
                self.sql.push_str(&comp.iter_var);
                self.sql.push_str(" WHERE ");
                self.push_array_guard(chain.as_ref());
                self.with_binding(binding, |con| con.visit(predicate))?;
                self.sql.push_str(") = 1");
            }
            ComprehensionKind::Filter => {
                let predicate = info
                    .predicate
                    .ok_or(ConvertError::UnrecognizedComprehension(expr.id))?;
                self.sql.push_str("ARRAY(SELECT ");
                self.sql.push_str(&comp.iter_var);
                self.sql.push_str(" FROM ");
                self.push_iter_source(chain.as_ref(), &comp.iter_range)?;
                self.sql.push_str(" AS ");
                self.sql.push_str(&comp.iter_var);
                self.sql.push_str(" WHERE ");
                self.push_array_guard(chain.as_ref());
                self.with_binding(binding, |con| con.visit(predicate))?;
                self.sql.push(')');
            }
            ComprehensionKind::Map | ComprehensionKind::MapFilter => {
                let transform = info
                    .transform
                    .ok_or(ConvertError::UnrecognizedComprehension(expr.id))?;
                self.sql.push_str("ARRAY(SELECT ");
                // The transform sees the iteration variable, so the binding
                // covers it as well as the filter.
                self.with_binding(binding, |con| {
                    con.visit(transform)?;
                    con.sql.push_str(" FROM ");
                    con.push_iter_source(chain.as_ref(), &comp.iter_range)?;
                    con.sql.push_str(" AS ");
                    con.sql.push_str(&comp.iter_var);
                    if let Some(filter) = info.filter {
                        con.sql.push_str(" WHERE ");
                        con.push_array_guard(chain.as_ref());
                        con.visit(filter)?;
                    }
                    Ok(())
                })?;
                self.sql.push(')');
            }
        }
        Ok(())
    }

    /// `UNNEST(range)` for SQL arrays; the JSON element expander over the
    /// JSON-preserving path for JSON/JSONB ranges.
    fn push_iter_source(
        &mut self,
        chain: Option<&JsonChain>,
        range: &Expr,
    ) -> ConvertResult<()> {
        match chain {
            Some(chain) => {
                let elements_fn = self.array_elements_fn(chain);
                self.sql.push_str(elements_fn);
                self.sql.push('(');
                self.push_json_preserve_path(chain);
                self.sql.push(')');
                Ok(())
            }
            None => {
                self.sql.push_str("UNNEST(");
                self.visit(range)?;
                self.sql.push(')');
                Ok(())
            }
        }
    }

    /// For JSON ranges, guards the subquery against NULL and non-array
    /// values: `<range> IS NOT NULL AND <typeof>(<range>) = 'array' AND `.
    fn push_array_guard(&mut self, chain: Option<&JsonChain>) {
        if let Some(chain) = chain {
            let typeof_fn = self.typeof_fn(chain);
            self.push_json_preserve_path(chain);
            self.sql.push_str(" IS NOT NULL AND ");
            self.sql.push_str(typeof_fn);
            self.sql.push('(');
            self.push_json_preserve_path(chain);
            self.sql.push_str(") = 'array' AND ");
        }
    }

    fn with_binding<F>(&mut self, binding: Option<IterBinding>, f: F) -> ConvertResult<()>
    where
        F: FnOnce(&mut Self) -> ConvertResult<()>,
    {
        let pushed = binding.is_some();
        if let Some(binding) = binding {
            self.iter_bindings.push(binding);
        }
        let result = f(self);
        if pushed {
            self.iter_bindings.pop();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cel::types::CelType;
    use crate::transform::convert;
    use crate::transform::test_util::{test_provider, AstBuilder};

    fn assert_sql(builder: &AstBuilder, expr: &Expr, expected: &str) {
        let provider = test_provider();
        let sql = convert(expr, &builder.type_map(), &provider).unwrap();
        assert_eq!(sql, expected);
    }

    fn json_users(b: &AstBuilder) -> Expr {
        b.ident("json_users", CelType::Object("json_users".to_owned()))
    }

    #[test]
    fn classify_recovers_macro_kinds() {
        let b = AstBuilder::new();
        let range = |b: &AstBuilder| b.ident("string_list", CelType::list(CelType::String));
        let pred = |b: &AstBuilder| {
            b.binary(
                operators::EQUALS,
                b.ident("v", CelType::String),
                b.str_("a"),
                CelType::Bool,
            )
        };

        let cases: Vec<(Expr, ComprehensionKind)> = vec![
            (b.all_macro(range(&b), "v", pred(&b)), ComprehensionKind::All),
            (
                b.exists_macro(range(&b), "v", pred(&b)),
                ComprehensionKind::Exists,
            ),
            (
                b.exists_one_macro(range(&b), "v", pred(&b)),
                ComprehensionKind::ExistsOne,
            ),
            (
                b.map_macro(range(&b), "v", b.ident("v", CelType::String)),
                ComprehensionKind::Map,
            ),
            (
                b.map_filter_macro(
                    range(&b),
                    "v",
                    pred(&b),
                    b.method(
                        b.ident("v", CelType::String),
                        "lower",
                        vec![],
                        CelType::String,
                    ),
                ),
                ComprehensionKind::MapFilter,
            ),
            (
                b.filter_macro(range(&b), "v", pred(&b)),
                ComprehensionKind::Filter,
            ),
        ];

        for (expr, expected) in cases {
            let ExprKind::Comprehension(comp) = &expr.kind else {
                unreachable!()
            };
            assert_eq!(classify(comp).unwrap().kind, expected, "{expected:?}");
        }
    }

    #[test]
    fn unrecognized_shape_is_an_error() {
        let b = AstBuilder::new();
        // accumulator initialized to 5 matches no macro
        let step = b.binary(
            operators::ADD,
            b.ident("__result__", CelType::Int),
            b.int(2),
            CelType::Int,
        );
        let comp = b.node(
            ExprKind::Comprehension(Box::new(Comprehension {
                iter_range: b.ident("string_list", CelType::list(CelType::String)),
                iter_var: "v".to_owned(),
                iter_var2: None,
                accu_var: "__result__".to_owned(),
                accu_init: b.int(5),
                loop_condition: b.bool_(true),
                loop_step: step,
                result: b.ident("__result__", CelType::Int),
            })),
            CelType::Int,
        );
        let provider = test_provider();
        assert!(matches!(
            convert(&comp, &b.type_map(), &provider),
            Err(ConvertError::UnrecognizedComprehension(_))
        ));
    }

    #[test]
    fn all_over_json_scalar_array() {
        let b = AstBuilder::new();
        let scores = b.select(json_users(&b), "scores", CelType::Dyn);
        let pred = b.binary(
            operators::GREATER,
            b.ident("score", CelType::Dyn),
            b.int(70),
            CelType::Bool,
        );
        let expr = b.all_macro(scores, "score", pred);
        assert_sql(
            &b,
            &expr,
            "NOT EXISTS (SELECT 1 FROM jsonb_array_elements_text(json_users.scores) AS score \
             WHERE json_users.scores IS NOT NULL AND jsonb_typeof(json_users.scores) = 'array' \
             AND NOT ((score)::numeric > 70))",
        );
    }

    #[test]
    fn exists_over_sql_array() {
        let b = AstBuilder::new();
        let range = b.ident("string_list", CelType::list(CelType::String));
        let pred = b.binary(
            operators::EQUALS,
            b.ident("v", CelType::String),
            b.str_("a"),
            CelType::Bool,
        );
        let expr = b.exists_macro(range, "v", pred);
        assert_sql(
            &b,
            &expr,
            "EXISTS (SELECT 1 FROM UNNEST(string_list) AS v WHERE v = 'a')",
        );
    }

    #[test]
    fn exists_one_over_json_array() {
        let b = AstBuilder::new();
        let tags = b.select(json_users(&b), "tags", CelType::Dyn);
        let pred = b.binary(
            operators::EQUALS,
            b.ident("tag", CelType::Dyn),
            b.str_("rust"),
            CelType::Bool,
        );
        let expr = b.exists_one_macro(tags, "tag", pred);
        assert_sql(
            &b,
            &expr,
            "(SELECT COUNT(*) FROM jsonb_array_elements_text(json_users.tags) AS tag \
             WHERE json_users.tags IS NOT NULL AND jsonb_typeof(json_users.tags) = 'array' \
             AND tag = 'rust') = 1",
        );
    }

    #[test]
    fn filter_over_json_array() {
        let b = AstBuilder::new();
        let tags = b.select(json_users(&b), "tags", CelType::Dyn);
        let pred = b.binary(
            operators::NOT_EQUALS,
            b.ident("t", CelType::Dyn),
            b.str_("legacy"),
            CelType::Bool,
        );
        let expr = b.filter_macro(tags, "t", pred);
        assert_sql(
            &b,
            &expr,
            "ARRAY(SELECT t FROM jsonb_array_elements_text(json_users.tags) AS t \
             WHERE json_users.tags IS NOT NULL AND jsonb_typeof(json_users.tags) = 'array' \
             AND t != 'legacy')",
        );
    }

    #[test]
    fn map_over_json_object_array() {
        let b = AstBuilder::new();
        let attributes = b.select(json_users(&b), "attributes", CelType::Dyn);
        let transform = b.select(b.ident("attr", CelType::Dyn), "name", CelType::Dyn);
        let expr = b.map_macro(attributes, "attr", transform);
        assert_sql(
            &b,
            &expr,
            "ARRAY(SELECT attr->>'name' FROM jsonb_array_elements(json_users.attributes) AS attr)",
        );
    }

    #[test]
    fn map_with_filter_over_sql_array() {
        let b = AstBuilder::new();
        let range = b.ident("string_list", CelType::list(CelType::String));
        let filter = b.binary(
            operators::NOT_EQUALS,
            b.ident("v", CelType::String),
            b.str_(""),
            CelType::Bool,
        );
        let transform = b.binary(
            operators::ADD,
            b.ident("v", CelType::String),
            b.str_("!"),
            CelType::String,
        );
        let expr = b.map_filter_macro(range, "v", filter, transform);
        assert_sql(
            &b,
            &expr,
            "ARRAY(SELECT v || '!' FROM UNNEST(string_list) AS v WHERE v != '')",
        );
    }

    #[test]
    fn object_binding_selects_use_json_operators() {
        let b = AstBuilder::new();
        let reviews = b.select(
            b.ident("json_products", CelType::Object("json_products".to_owned())),
            "reviews",
            CelType::Dyn,
        );
        let helpful = b.select(b.ident("review", CelType::Dyn), "helpful", CelType::Dyn);
        let pred = b.binary(operators::GREATER, helpful, b.int(10), CelType::Bool);
        let expr = b.exists_macro(reviews, "review", pred);
        assert_sql(
            &b,
            &expr,
            "EXISTS (SELECT 1 FROM json_array_elements(json_products.reviews) AS review \
             WHERE json_products.reviews IS NOT NULL AND json_typeof(json_products.reviews) = 'array' \
             AND (review->>'helpful')::numeric > 10)",
        );
    }

    #[test]
    fn comprehension_over_nested_json_array() {
        let b = AstBuilder::new();
        let assets = b.ident(
            "information_assets",
            CelType::Object("information_assets".to_owned()),
        );
        let metadata = b.select(assets, "metadata", CelType::Dyn);
        let corpus = b.select(metadata, "corpus", CelType::Dyn);
        let tags = b.select(corpus, "tags", CelType::Dyn);
        let pred = b.binary(
            operators::EQUALS,
            b.ident("tag", CelType::Dyn),
            b.str_("documentation"),
            CelType::Bool,
        );
        let expr = b.exists_macro(tags, "tag", pred);
        assert_sql(
            &b,
            &expr,
            "EXISTS (SELECT 1 FROM jsonb_array_elements_text(information_assets.metadata->'corpus'->'tags') AS tag \
             WHERE information_assets.metadata->'corpus'->'tags' IS NOT NULL \
             AND jsonb_typeof(information_assets.metadata->'corpus'->'tags') = 'array' \
             AND tag = 'documentation')",
        );
    }

    #[test]
    fn binding_does_not_leak_out_of_the_comprehension() {
        let b = AstBuilder::new();
        let scores = b.select(json_users(&b), "scores", CelType::Dyn);
        let pred = b.binary(
            operators::GREATER,
            b.ident("score", CelType::Dyn),
            b.int(70),
            CelType::Bool,
        );
        let comprehension = b.all_macro(scores, "score", pred);
        // The same identifier outside the comprehension is not cast.
        let outer = b.binary(
            operators::GREATER,
            b.ident("score", CelType::Int),
            b.int(1),
            CelType::Bool,
        );
        let expr = b.binary(operators::LOGICAL_AND, comprehension, outer, CelType::Bool);
        let provider = test_provider();
        let sql = convert(&expr, &b.type_map(), &provider).unwrap();
        assert!(sql.ends_with("AND score > 1"), "{sql}");
    }
}
