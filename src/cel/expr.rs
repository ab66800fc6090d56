// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::cel::operators;

/// Stable id of an AST node, used to look up its checked type in a
/// [`TypeMap`](crate::cel::types::TypeMap).
pub type ExprId = i64;

/// A node of a type-checked CEL expression tree.
///
/// Instances are produced by bridging from a CEL front end (parser, type
/// checker, macro expander); this crate only consumes them. Comprehension
/// macros arrive in their fully desugared accumulator-and-step form.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Const(Constant),
    Ident(String),
    List(Vec<Expr>),
    Struct {
        /// Non-empty for named-message construction, `None` for map literals.
        message_name: Option<String>,
        entries: Vec<StructEntry>,
    },
    Select {
        operand: Box<Expr>,
        field: String,
        /// Set iff the node was emitted by the `has()` macro.
        test_only: bool,
    },
    Call {
        /// Receiver for method-style calls (`name.startsWith(...)`).
        target: Option<Box<Expr>>,
        function: String,
        args: Vec<Expr>,
    },
    Comprehension(Box<Comprehension>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Constant {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constant::Null => "null",
            Constant::Bool(_) => "bool",
            Constant::Int(_) => "int",
            Constant::Uint(_) => "uint",
            Constant::Double(_) => "double",
            Constant::String(_) => "string",
            Constant::Bytes(_) => "bytes",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructEntry {
    pub key: StructKey,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructKey {
    /// Field name of a named-message entry.
    Field(String),
    /// Key expression of a map-literal entry.
    Key(Expr),
}

/// The desugared form every comprehension macro is reduced to by the CEL
/// macro expander: a fold with an accumulator, a per-element step, and a
/// result expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub iter_range: Expr,
    pub iter_var: String,
    /// Second iteration variable of two-variable comprehensions (the index).
    pub iter_var2: Option<String>,
    pub accu_var: String,
    pub accu_init: Expr,
    pub loop_condition: Expr,
    pub loop_step: Expr,
    pub result: Expr,
}

impl Expr {
    pub fn as_call(&self) -> Option<(Option<&Expr>, &str, &[Expr])> {
        match &self.kind {
            ExprKind::Call {
                target,
                function,
                args,
            } => Some((target.as_deref(), function.as_str(), args.as_slice())),
            _ => None,
        }
    }

    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<&Constant> {
        match &self.kind {
            ExprKind::Const(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self.as_const(), Some(Constant::Null))
    }

    pub fn is_bool_literal(&self) -> bool {
        matches!(self.as_const(), Some(Constant::Bool(_)))
    }

    pub fn is_string_literal(&self) -> bool {
        matches!(self.as_const(), Some(Constant::String(_)))
    }

    /// A field access in the broad sense: a select chain or an index
    /// operation (e.g. `trigram.cell[0].value`).
    pub fn is_field_access(&self) -> bool {
        match &self.kind {
            ExprKind::Select { .. } => true,
            ExprKind::Call { function, .. } => function == operators::INDEX,
            _ => false,
        }
    }
}
