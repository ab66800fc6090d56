// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The lowering walker: a single-pass, type-directed visitor from a checked
//! CEL AST to PostgreSQL text.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::cel::expr::{Constant, Expr, ExprKind, StructEntry, StructKey};
use crate::cel::types::{CelType, TypeMap};
use crate::cel::{functions, operators};
use crate::error::{ConvertError, ConvertResult};
use crate::schema::column_type::JsonShape;
use crate::schema::provider::TypeProvider;
use crate::sql::SQLBuilder;

use super::regex::translate_pattern;

/// Lowers a type-checked CEL expression into a single PostgreSQL expression
/// suitable for a `WHERE` clause.
///
/// The walk is strictly sequential and performs no I/O; the provider is only
/// consulted for (pre-loaded) schema metadata. On any error no partial
/// output is returned.
pub fn convert(
    expr: &Expr,
    type_map: &TypeMap,
    provider: &dyn TypeProvider,
) -> Result<String, ConvertError> {
    let mut converter = Converter::new(type_map, provider);
    converter.visit(expr)?;
    let sql = converter.into_sql();
    debug!(%sql, "lowered CEL expression");
    Ok(sql)
}

/// A comprehension variable currently in scope, bound to the elements of a
/// JSON/JSONB array range.
pub(crate) struct IterBinding {
    pub var: String,
    /// What the element expander yields: text (scalar arrays) or JSON
    /// values (object arrays).
    pub elements: JsonShape,
    pub jsonb: bool,
}

pub(crate) struct Converter<'a> {
    pub(crate) sql: SQLBuilder,
    type_map: &'a TypeMap,
    pub(crate) provider: &'a dyn TypeProvider,
    pub(crate) iter_bindings: Vec<IterBinding>,
}

impl<'a> Converter<'a> {
    pub(crate) fn new(type_map: &'a TypeMap, provider: &'a dyn TypeProvider) -> Self {
        Self {
            sql: SQLBuilder::new(),
            type_map,
            provider,
            iter_bindings: Vec::new(),
        }
    }

    pub(crate) fn into_sql(self) -> String {
        self.sql.into_sql()
    }

    /// The checked type of a node. Ids missing from the map are treated as
    /// dynamic, which makes the walker behave as if nothing is known about
    /// the operand (no JSON handling, no array handling).
    pub(crate) fn get_type(&self, expr: &Expr) -> &CelType {
        static DYN: CelType = CelType::Dyn;
        self.type_map.get(&expr.id).unwrap_or(&DYN)
    }

    pub(crate) fn visit(&mut self, expr: &Expr) -> ConvertResult<()> {
        match &expr.kind {
            ExprKind::Call { .. } => self.visit_call(expr),
            ExprKind::Comprehension(comp) => self.visit_comprehension(expr, comp),
            ExprKind::Const(constant) => self.visit_const(constant),
            ExprKind::Ident(name) => {
                self.sql.push_str(name);
                Ok(())
            }
            ExprKind::List(elements) => self.visit_list(elements),
            ExprKind::Select { .. } => self.visit_select(expr),
            ExprKind::Struct { .. } => self.visit_struct(expr),
        }
    }

    pub(crate) fn visit_maybe_nested(&mut self, expr: &Expr, nested: bool) -> ConvertResult<()> {
        if nested {
            self.sql.push('(');
        }
        self.visit(expr)?;
        if nested {
            self.sql.push(')');
        }
        Ok(())
    }

    fn visit_call(&mut self, expr: &Expr) -> ConvertResult<()> {
        let ExprKind::Call {
            target,
            function,
            args,
        } = &expr.kind
        else {
            return Err(ConvertError::UnsupportedNode(expr.id));
        };

        match function.as_str() {
            operators::CONDITIONAL => self.visit_call_conditional(function, args),
            operators::INDEX => self.visit_call_index(function, args),
            operators::LOGICAL_NOT | operators::NEGATE => self.visit_call_unary(function, args),
            operators::ADD
            | operators::DIVIDE
            | operators::EQUALS
            | operators::GREATER
            | operators::GREATER_EQUALS
            | operators::IN
            | operators::OLD_IN
            | operators::LESS
            | operators::LESS_EQUALS
            | operators::LOGICAL_AND
            | operators::LOGICAL_OR
            | operators::MULTIPLY
            | operators::NOT_EQUALS
            | operators::SUBTRACT => self.visit_call_binary(function, args),
            _ => self.visit_call_func(target.as_deref(), function, args),
        }
    }

    /// Ternary conditional. A failure in any of the three argument visits
    /// propagates; no partial `IF(...)` is emitted.
    fn visit_call_conditional(&mut self, function: &str, args: &[Expr]) -> ConvertResult<()> {
        let [condition, then_value, else_value] = args else {
            return Err(ConvertError::BadArgumentCount {
                function: function.to_owned(),
                expected: "3",
                found: args.len(),
            });
        };
        self.sql.push_str("IF(");
        self.visit(condition)?;
        self.sql.push_str(", ");
        self.visit(then_value)?;
        self.sql.push_str(", ");
        self.visit(else_value)?;
        self.sql.push(')');
        Ok(())
    }

    fn visit_call_index(&mut self, function: &str, args: &[Expr]) -> ConvertResult<()> {
        let [operand, index] = args else {
            return Err(ConvertError::BadArgumentCount {
                function: function.to_owned(),
                expected: "2",
                found: args.len(),
            });
        };

        let nested = is_binary_or_ternary_operator(operand);
        self.visit_maybe_nested(operand, nested)?;

        if self.get_type(operand).is_map() {
            let field = extract_field_name(index)?;
            self.sql.push('.');
            self.sql.push_str(field);
            return Ok(());
        }

        // PostgreSQL arrays are one-based; constant indices are folded.
        self.sql.push('[');
        match index.as_const() {
            Some(Constant::Int(i)) => self.sql.push_display(i + 1),
            Some(Constant::Uint(u)) => self.sql.push_display(u + 1),
            _ => {
                self.visit(index)?;
                self.sql.push_str(" + 1");
            }
        }
        self.sql.push(']');
        Ok(())
    }

    fn visit_call_unary(&mut self, function: &str, args: &[Expr]) -> ConvertResult<()> {
        let [operand] = args else {
            return Err(ConvertError::BadArgumentCount {
                function: function.to_owned(),
                expected: "1",
                found: args.len(),
            });
        };
        let operator = match function {
            operators::LOGICAL_NOT => "NOT ",
            operators::NEGATE => "-",
            _ => return Err(ConvertError::UnsupportedOperator(function.to_owned())),
        };
        self.sql.push_str(operator);
        self.visit_maybe_nested(operand, is_complex_operator(operand))
    }

    fn visit_call_binary(&mut self, function: &str, args: &[Expr]) -> ConvertResult<()> {
        let [lhs, rhs] = args else {
            return Err(ConvertError::BadArgumentCount {
                function: function.to_owned(),
                expected: "2",
                found: args.len(),
            });
        };
        let lhs_type = self.get_type(lhs).clone();
        let rhs_type = self.get_type(rhs).clone();

        // Date arithmetic has its own normalization (timestamp side first).
        if (lhs_type.is_timestamp_related() && rhs_type.is_duration_related())
            || (rhs_type.is_timestamp_related() && lhs_type.is_duration_related())
        {
            return self.call_timestamp_operation(function, lhs, rhs);
        }

        let lhs_paren = is_complex_operator_with_respect_to(function, lhs);
        let mut rhs_paren = is_complex_operator_with_respect_to(function, rhs);
        // Left-recursive operators need parens around a right operand of the
        // same precedence (`a - (b + c)`).
        if !rhs_paren && operators::is_left_recursive(function) {
            rhs_paren = is_same_precedence(function, rhs);
        }

        // JSON text extractions compared against (or combined with) numeric
        // operands get a numeric cast, driven by the checked type of the
        // other side.
        let casting = is_numeric_cast_operator(function);
        let lhs_cast = casting && rhs_type.is_numeric() && self.lowers_to_json_text(lhs);
        let rhs_cast = casting && lhs_type.is_numeric() && self.lowers_to_json_text(rhs);

        if lhs_cast {
            self.sql.push('(');
            self.visit(lhs)?;
            self.sql.push_str(")::numeric");
        } else {
            self.visit_maybe_nested(lhs, lhs_paren)?;
        }

        let operator = sql_binary_operator(function, lhs, rhs, &lhs_type, &rhs_type)?;
        self.sql.push_space();
        self.sql.push_str(operator);
        self.sql.push_space();

        let in_operator = function == operators::IN || function == operators::OLD_IN;
        if in_operator && (rhs_type.is_list() || rhs.is_field_access()) {
            // Membership over a JSON array expands the array into a
            // subquery; over a SQL array (column or literal) a plain ANY
            // suffices.
            if let Some(chain) = self.resolve_json_chain(rhs) {
                let elements_fn = self.array_elements_fn(&chain);
                self.sql.push_str("ANY(ARRAY(SELECT ");
                self.sql.push_str(elements_fn);
                self.sql.push('(');
                self.push_json_preserve_path(&chain);
                self.sql.push_str(")))");
                return Ok(());
            }
            self.sql.push_str("ANY(");
            self.visit_maybe_nested(rhs, rhs_paren)?;
            self.sql.push(')');
            return Ok(());
        }

        if rhs_cast {
            self.sql.push('(');
            self.visit(rhs)?;
            self.sql.push_str(")::numeric");
        } else {
            self.visit_maybe_nested(rhs, rhs_paren)?;
        }
        Ok(())
    }

    fn visit_call_func(
        &mut self,
        target: Option<&Expr>,
        function: &str,
        args: &[Expr],
    ) -> ConvertResult<()> {
        match function {
            functions::CONTAINS => self.call_contains(target, args),
            functions::TYPE_CONVERT_DURATION => self.call_duration(args),
            functions::INTERVAL => self.call_interval(args),
            functions::TYPE_CONVERT_TIMESTAMP => self.call_timestamp_from_string(args),
            functions::MATCHES => self.call_matches(target, function, args),
            functions::SIZE => self.call_size(target, function, args),
            functions::TIME_GET_FULL_YEAR
            | functions::TIME_GET_MONTH
            | functions::TIME_GET_DATE
            | functions::TIME_GET_HOURS
            | functions::TIME_GET_MINUTES
            | functions::TIME_GET_SECONDS
            | functions::TIME_GET_MILLISECONDS
            | functions::TIME_GET_DAY_OF_YEAR
            | functions::TIME_GET_DAY_OF_MONTH
            | functions::TIME_GET_DAY_OF_WEEK => self.call_extract(function, target, args),
            functions::TYPE_CONVERT_BOOL
            | functions::TYPE_CONVERT_BYTES
            | functions::TYPE_CONVERT_DOUBLE
            | functions::TYPE_CONVERT_INT
            | functions::TYPE_CONVERT_STRING
            | functions::TYPE_CONVERT_UINT => self.call_casting(function, args),
            _ => {
                let name = match function {
                    operators::MODULO => "MOD".to_owned(),
                    functions::STARTS_WITH => "STARTS_WITH".to_owned(),
                    functions::ENDS_WITH => "ENDS_WITH".to_owned(),
                    _ => function.to_uppercase(),
                };
                self.push_function_call(&name, target, args)
            }
        }
    }

    /// Generic function emission: `NAME(target, arg, ...)`.
    fn push_function_call(
        &mut self,
        name: &str,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> ConvertResult<()> {
        self.sql.push_str(name);
        self.sql.push('(');
        if let Some(target) = target {
            let nested = is_binary_or_ternary_operator(target);
            self.visit_maybe_nested(target, nested)?;
            if !args.is_empty() {
                self.sql.push_str(", ");
            }
        }
        for (i, arg) in args.iter().enumerate() {
            self.visit(arg)?;
            if i < args.len() - 1 {
                self.sql.push_str(", ");
            }
        }
        self.sql.push(')');
        Ok(())
    }

    fn call_contains(&mut self, target: Option<&Expr>, args: &[Expr]) -> ConvertResult<()> {
        // Containment in a JSON array uses the key-existence operator.
        if let Some(target) = target {
            if let Some(chain) = self.resolve_json_chain(target) {
                self.push_json_preserve_path(&chain);
                self.sql.push_str(" ? ");
                if let Some(arg) = args.first() {
                    self.visit(arg)?;
                }
                return Ok(());
            }
        }

        self.sql.push_str("POSITION(");
        for (i, arg) in args.iter().enumerate() {
            self.visit(arg)?;
            if i < args.len() - 1 {
                self.sql.push_str(" IN ");
            }
        }
        if let Some(target) = target {
            self.sql.push_str(" IN ");
            let nested = is_binary_or_ternary_operator(target);
            self.visit_maybe_nested(target, nested)?;
        }
        self.sql.push_str(") > 0");
        Ok(())
    }

    fn call_matches(
        &mut self,
        target: Option<&Expr>,
        function: &str,
        args: &[Expr],
    ) -> ConvertResult<()> {
        let (subject, pattern) = match target {
            Some(target) => {
                let [pattern] = args else {
                    return Err(ConvertError::BadArgumentCount {
                        function: function.to_owned(),
                        expected: "1",
                        found: args.len(),
                    });
                };
                (target, pattern)
            }
            None => {
                let [subject, pattern] = args else {
                    return Err(ConvertError::BadArgumentCount {
                        function: function.to_owned(),
                        expected: "2",
                        found: args.len(),
                    });
                };
                (subject, pattern)
            }
        };

        let nested = is_binary_or_ternary_operator(subject);
        self.visit_maybe_nested(subject, nested)?;

        match pattern.as_const() {
            Some(Constant::String(pattern)) => {
                let translated = translate_pattern(pattern)?;
                self.sql.push_str(if translated.case_insensitive {
                    " ~* "
                } else {
                    " ~ "
                });
                self.sql.push_quoted(&translated.pattern);
            }
            // Non-literal patterns are emitted untranslated.
            _ => {
                self.sql.push_str(" ~ ");
                self.visit(pattern)?;
            }
        }
        Ok(())
    }

    fn call_size(
        &mut self,
        target: Option<&Expr>,
        function: &str,
        args: &[Expr],
    ) -> ConvertResult<()> {
        let subject = match target {
            Some(target) => target,
            None => args.first().ok_or(ConvertError::BadArgumentCount {
                function: function.to_owned(),
                expected: "1",
                found: 0,
            })?,
        };

        if let Some(chain) = self.resolve_json_chain(subject) {
            self.sql.push_str("jsonb_array_length(");
            self.push_json_preserve_path(&chain);
            self.sql.push(')');
            return Ok(());
        }

        match self.get_type(subject).clone() {
            CelType::String | CelType::Bytes => {
                self.sql.push_str("LENGTH(");
                self.visit(subject)?;
                self.sql.push(')');
                Ok(())
            }
            CelType::List(_) => {
                self.sql.push_str("ARRAY_LENGTH(");
                self.visit(subject)?;
                self.sql.push_str(", 1)");
                Ok(())
            }
            other => Err(ConvertError::UnsupportedType {
                context: "size()",
                found: format!("{other:?}"),
            }),
        }
    }

    fn call_casting(&mut self, function: &str, args: &[Expr]) -> ConvertResult<()> {
        let [arg] = args else {
            return Err(ConvertError::BadArgumentCount {
                function: function.to_owned(),
                expected: "1",
                found: args.len(),
            });
        };

        if function == functions::TYPE_CONVERT_INT && self.get_type(arg).is_timestamp() {
            self.sql.push_str("UNIX_SECONDS(");
            self.visit(arg)?;
            self.sql.push(')');
            return Ok(());
        }

        self.sql.push_str("CAST(");
        self.visit(arg)?;
        self.sql.push_str(" AS ");
        let sql_type = match function {
            functions::TYPE_CONVERT_BOOL => "BOOL",
            functions::TYPE_CONVERT_BYTES => "BYTES",
            functions::TYPE_CONVERT_DOUBLE => "FLOAT64",
            functions::TYPE_CONVERT_INT => "INT64",
            functions::TYPE_CONVERT_STRING => "STRING",
            functions::TYPE_CONVERT_UINT => "INT64",
            _ => return Err(ConvertError::UnsupportedOperator(function.to_owned())),
        };
        self.sql.push_str(sql_type);
        self.sql.push(')');
        Ok(())
    }

    fn visit_const(&mut self, constant: &Constant) -> ConvertResult<()> {
        match constant {
            Constant::Bool(true) => self.sql.push_str("TRUE"),
            Constant::Bool(false) => self.sql.push_str("FALSE"),
            Constant::Null => self.sql.push_str("NULL"),
            Constant::Int(i) => self.sql.push_display(i),
            Constant::Uint(u) => self.sql.push_display(u),
            Constant::Double(d) => self.sql.push_display(d),
            Constant::String(s) => self.sql.push_quoted(s),
            Constant::Bytes(bytes) => {
                self.sql.push_str("b\"");
                let mut encoded = String::with_capacity(bytes.len() * 4);
                for byte in bytes {
                    let _ = write!(encoded, "\\{byte:03o}");
                }
                self.sql.push_str(&encoded);
                self.sql.push('"');
            }
        }
        Ok(())
    }

    fn visit_list(&mut self, elements: &[Expr]) -> ConvertResult<()> {
        self.sql.push_str("ARRAY[");
        for (i, element) in elements.iter().enumerate() {
            self.visit(element)?;
            if i < elements.len() - 1 {
                self.sql.push_str(", ");
            }
        }
        self.sql.push(']');
        Ok(())
    }

    fn visit_select(&mut self, expr: &Expr) -> ConvertResult<()> {
        let ExprKind::Select {
            operand,
            field,
            test_only,
        } = &expr.kind
        else {
            return Err(ConvertError::UnsupportedNode(expr.id));
        };

        // `has()` presence tests.
        if *test_only {
            if let Some(chain) = self.resolve_json_chain(expr) {
                if !chain.segments.is_empty() {
                    return self.push_json_has(&chain);
                }
            }
            let nested = is_binary_or_ternary_operator(operand);
            self.visit_maybe_nested(operand, nested)?;
            self.sql.push('.');
            self.sql.push_str(field);
            self.sql.push_str(" IS NOT NULL");
            return Ok(());
        }

        // Chains into a JSON document navigate with JSON path operators.
        if let Some(chain) = self.resolve_json_chain(expr) {
            if !chain.segments.is_empty() {
                self.push_json_value_path(&chain);
                return Ok(());
            }
        }

        let nested = is_binary_or_ternary_operator(operand);
        self.visit_maybe_nested(operand, nested)?;
        self.sql.push('.');
        self.sql.push_str(field);
        Ok(())
    }

    fn visit_struct(&mut self, expr: &Expr) -> ConvertResult<()> {
        let ExprKind::Struct {
            message_name,
            entries,
        } = &expr.kind
        else {
            return Err(ConvertError::UnsupportedNode(expr.id));
        };
        match message_name {
            Some(name) => self.visit_struct_message(name, entries),
            None => self.visit_struct_map(entries),
        }
    }

    fn visit_struct_message(&mut self, name: &str, entries: &[StructEntry]) -> ConvertResult<()> {
        self.sql.push_str(name);
        self.sql.push('{');
        for (i, entry) in entries.iter().enumerate() {
            let field = match &entry.key {
                StructKey::Field(field) => field.as_str(),
                StructKey::Key(key) => extract_field_name(key)?,
            };
            self.sql.push_str(field);
            self.sql.push_str(": ");
            self.visit(&entry.value)?;
            if i < entries.len() - 1 {
                self.sql.push_str(", ");
            }
        }
        self.sql.push('}');
        Ok(())
    }

    fn visit_struct_map(&mut self, entries: &[StructEntry]) -> ConvertResult<()> {
        self.sql.push_str("STRUCT(");
        for (i, entry) in entries.iter().enumerate() {
            self.visit(&entry.value)?;
            self.sql.push_str(" AS ");
            let field = match &entry.key {
                StructKey::Field(field) => {
                    validate_field_name(field)?;
                    field.as_str()
                }
                StructKey::Key(key) => extract_field_name(key)?,
            };
            self.sql.push_str(field);
            if i < entries.len() - 1 {
                self.sql.push_str(", ");
            }
        }
        self.sql.push(')');
        Ok(())
    }
}

static FIELD_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-zA-Z_][a-zA-Z0-9_]{0,127}$").expect("invalid field name pattern")
});

fn validate_field_name(name: &str) -> ConvertResult<()> {
    if FIELD_NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(ConvertError::BadFieldName(name.to_owned()))
    }
}

/// A map key / struct field must be a string literal that is also a valid
/// SQL identifier.
fn extract_field_name(expr: &Expr) -> ConvertResult<&str> {
    match expr.as_const() {
        Some(Constant::String(name)) => {
            validate_field_name(name)?;
            Ok(name)
        }
        Some(other) => Err(ConvertError::UnsupportedType {
            context: "field key",
            found: other.kind_name().to_owned(),
        }),
        None => Err(ConvertError::UnsupportedType {
            context: "field key",
            found: "non-constant expression".to_owned(),
        }),
    }
}

fn sql_binary_operator(
    function: &str,
    lhs: &Expr,
    rhs: &Expr,
    lhs_type: &CelType,
    rhs_type: &CelType,
) -> ConvertResult<&'static str> {
    if function == operators::ADD {
        let concatenation = (*lhs_type == CelType::String && *rhs_type == CelType::String)
            || (*lhs_type == CelType::Bytes && *rhs_type == CelType::Bytes)
            || (lhs_type.is_list() && rhs_type.is_list())
            // A string literal on either side makes `+` a concatenation even
            // when the other side is dynamically typed.
            || lhs.is_string_literal()
            || rhs.is_string_literal();
        return Ok(if concatenation { "||" } else { "+" });
    }

    // NULL and boolean literals compare with IS / IS NOT.
    if function == operators::EQUALS && (rhs.is_null_literal() || rhs.is_bool_literal()) {
        return Ok("IS");
    }
    if function == operators::NOT_EQUALS && (rhs.is_null_literal() || rhs.is_bool_literal()) {
        return Ok("IS NOT");
    }

    if function == operators::IN || function == operators::OLD_IN {
        // Membership in a list or an array-valued field becomes `= ANY`.
        return Ok(if rhs_type.is_list() || rhs.is_field_access() {
            "="
        } else {
            "IN"
        });
    }

    match function {
        operators::LOGICAL_AND => Ok("AND"),
        operators::LOGICAL_OR => Ok("OR"),
        operators::EQUALS => Ok("="),
        operators::NOT_EQUALS => Ok("!="),
        operators::LESS => Ok("<"),
        operators::LESS_EQUALS => Ok("<="),
        operators::GREATER => Ok(">"),
        operators::GREATER_EQUALS => Ok(">="),
        operators::SUBTRACT => Ok("-"),
        operators::MULTIPLY => Ok("*"),
        operators::DIVIDE => Ok("/"),
        _ => Err(ConvertError::UnsupportedOperator(function.to_owned())),
    }
}

/// Operators whose JSON-text operands are candidates for a `::numeric`
/// cast: comparisons and arithmetic.
fn is_numeric_cast_operator(function: &str) -> bool {
    matches!(
        function,
        operators::EQUALS
            | operators::NOT_EQUALS
            | operators::LESS
            | operators::LESS_EQUALS
            | operators::GREATER
            | operators::GREATER_EQUALS
            | operators::ADD
            | operators::SUBTRACT
            | operators::MULTIPLY
            | operators::DIVIDE
    )
}

fn expr_precedence(expr: &Expr) -> u8 {
    expr.as_call()
        .map(|(_, function, _)| operators::precedence(function))
        .unwrap_or(0)
}

/// A call expression with two or more arguments.
pub(crate) fn is_complex_operator(expr: &Expr) -> bool {
    matches!(expr.as_call(), Some((_, _, args)) if args.len() >= 2)
}

/// Whether `expr`, as an operand of `op`, binds more loosely than `op` and
/// therefore needs parentheses.
pub(crate) fn is_complex_operator_with_respect_to(op: &str, expr: &Expr) -> bool {
    is_complex_operator(expr) && operators::precedence(op) < expr_precedence(expr)
}

fn is_same_precedence(op: &str, expr: &Expr) -> bool {
    expr.as_call().is_some() && operators::precedence(op) == expr_precedence(expr)
}

pub(crate) fn is_binary_or_ternary_operator(expr: &Expr) -> bool {
    match expr.as_call() {
        Some((_, function, args)) if args.len() >= 2 => {
            operators::find_reverse_binary(function).is_some()
                || function == operators::CONDITIONAL
        }
        _ => false,
    }
}
