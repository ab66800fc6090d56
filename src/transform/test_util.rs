// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![cfg(test)]

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::cel::expr::{Comprehension, Constant, Expr, ExprId, ExprKind, StructEntry, StructKey};
use crate::cel::operators;
use crate::cel::types::{CelType, TypeMap};
use crate::schema::column_type::{ColumnType, FieldSpec, JsonShape};
use crate::schema::provider::PgTypeProvider;

/// Builds checked ASTs for tests: hands out fresh node ids and records each
/// node's type in the map the checker would have produced.
pub struct AstBuilder {
    next_id: RefCell<ExprId>,
    types: RefCell<TypeMap>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            next_id: RefCell::new(0),
            types: RefCell::new(TypeMap::new()),
        }
    }

    pub fn type_map(&self) -> TypeMap {
        self.types.borrow().clone()
    }

    pub fn node(&self, kind: ExprKind, typ: CelType) -> Expr {
        let mut next_id = self.next_id.borrow_mut();
        *next_id += 1;
        let id = *next_id;
        self.types.borrow_mut().insert(id, typ);
        Expr { id, kind }
    }

    pub fn int(&self, value: i64) -> Expr {
        self.node(ExprKind::Const(Constant::Int(value)), CelType::Int)
    }

    pub fn uint(&self, value: u64) -> Expr {
        self.node(ExprKind::Const(Constant::Uint(value)), CelType::Uint)
    }

    pub fn double(&self, value: f64) -> Expr {
        self.node(ExprKind::Const(Constant::Double(value)), CelType::Double)
    }

    pub fn str_(&self, value: &str) -> Expr {
        self.node(
            ExprKind::Const(Constant::String(value.to_owned())),
            CelType::String,
        )
    }

    pub fn bytes(&self, value: &[u8]) -> Expr {
        self.node(
            ExprKind::Const(Constant::Bytes(value.to_vec())),
            CelType::Bytes,
        )
    }

    pub fn bool_(&self, value: bool) -> Expr {
        self.node(ExprKind::Const(Constant::Bool(value)), CelType::Bool)
    }

    pub fn null(&self) -> Expr {
        self.node(ExprKind::Const(Constant::Null), CelType::Null)
    }

    pub fn ident(&self, name: &str, typ: CelType) -> Expr {
        self.node(ExprKind::Ident(name.to_owned()), typ)
    }

    pub fn select(&self, operand: Expr, field: &str, typ: CelType) -> Expr {
        self.node(
            ExprKind::Select {
                operand: Box::new(operand),
                field: field.to_owned(),
                test_only: false,
            },
            typ,
        )
    }

    pub fn has(&self, operand: Expr, field: &str) -> Expr {
        self.node(
            ExprKind::Select {
                operand: Box::new(operand),
                field: field.to_owned(),
                test_only: true,
            },
            CelType::Bool,
        )
    }

    pub fn call(&self, function: &str, args: Vec<Expr>, typ: CelType) -> Expr {
        self.node(
            ExprKind::Call {
                target: None,
                function: function.to_owned(),
                args,
            },
            typ,
        )
    }

    pub fn method(&self, target: Expr, function: &str, args: Vec<Expr>, typ: CelType) -> Expr {
        self.node(
            ExprKind::Call {
                target: Some(Box::new(target)),
                function: function.to_owned(),
                args,
            },
            typ,
        )
    }

    pub fn binary(&self, op: &str, lhs: Expr, rhs: Expr, typ: CelType) -> Expr {
        self.call(op, vec![lhs, rhs], typ)
    }

    pub fn list(&self, elements: Vec<Expr>, element_type: CelType) -> Expr {
        self.node(ExprKind::List(elements), CelType::list(element_type))
    }

    pub fn map_literal(&self, entries: Vec<(Expr, Expr)>, typ: CelType) -> Expr {
        let entries = entries
            .into_iter()
            .map(|(key, value)| StructEntry {
                key: StructKey::Key(key),
                value,
            })
            .collect();
        self.node(
            ExprKind::Struct {
                message_name: None,
                entries,
            },
            typ,
        )
    }

    pub fn message(&self, name: &str, entries: Vec<(&str, Expr)>, typ: CelType) -> Expr {
        let entries = entries
            .into_iter()
            .map(|(field, value)| StructEntry {
                key: StructKey::Field(field.to_owned()),
                value,
            })
            .collect();
        self.node(
            ExprKind::Struct {
                message_name: Some(name.to_owned()),
                entries,
            },
            typ,
        )
    }

    fn accu(&self) -> Expr {
        self.ident("__result__", CelType::Dyn)
    }

    fn comprehension(
        &self,
        iter_range: Expr,
        iter_var: &str,
        accu_init: Expr,
        loop_step: Expr,
        result: Expr,
        typ: CelType,
    ) -> Expr {
        let loop_condition = self.accu();
        self.node(
            ExprKind::Comprehension(Box::new(Comprehension {
                iter_range,
                iter_var: iter_var.to_owned(),
                iter_var2: None,
                accu_var: "__result__".to_owned(),
                accu_init,
                loop_condition,
                loop_step,
                result,
            })),
            typ,
        )
    }

    /// `range.all(var, predicate)` in its desugared form.
    pub fn all_macro(&self, iter_range: Expr, iter_var: &str, predicate: Expr) -> Expr {
        let step = self.binary(
            operators::LOGICAL_AND,
            self.accu(),
            predicate,
            CelType::Bool,
        );
        self.comprehension(
            iter_range,
            iter_var,
            self.bool_(true),
            step,
            self.accu(),
            CelType::Bool,
        )
    }

    /// `range.exists(var, predicate)` in its desugared form.
    pub fn exists_macro(&self, iter_range: Expr, iter_var: &str, predicate: Expr) -> Expr {
        let step = self.binary(operators::LOGICAL_OR, self.accu(), predicate, CelType::Bool);
        self.comprehension(
            iter_range,
            iter_var,
            self.bool_(false),
            step,
            self.accu(),
            CelType::Bool,
        )
    }

    /// `range.exists_one(var, predicate)` in its desugared form.
    pub fn exists_one_macro(&self, iter_range: Expr, iter_var: &str, predicate: Expr) -> Expr {
        let increment = self.binary(operators::ADD, self.accu(), self.int(1), CelType::Int);
        let step = self.call(
            operators::CONDITIONAL,
            vec![predicate, increment, self.accu()],
            CelType::Int,
        );
        let result = self.binary(operators::EQUALS, self.accu(), self.int(1), CelType::Bool);
        self.comprehension(
            iter_range,
            iter_var,
            self.int(0),
            step,
            result,
            CelType::Bool,
        )
    }

    /// `range.map(var, transform)` in its desugared form.
    pub fn map_macro(&self, iter_range: Expr, iter_var: &str, transform: Expr) -> Expr {
        let singleton = self.node(
            ExprKind::List(vec![transform]),
            CelType::list(CelType::Dyn),
        );
        let step = self.binary(
            operators::ADD,
            self.accu(),
            singleton,
            CelType::list(CelType::Dyn),
        );
        self.comprehension(
            iter_range,
            iter_var,
            self.empty_list(),
            step,
            self.accu(),
            CelType::list(CelType::Dyn),
        )
    }

    /// `range.map(var, filter, transform)` in its desugared form.
    pub fn map_filter_macro(
        &self,
        iter_range: Expr,
        iter_var: &str,
        filter: Expr,
        transform: Expr,
    ) -> Expr {
        let singleton = self.node(
            ExprKind::List(vec![transform]),
            CelType::list(CelType::Dyn),
        );
        let append = self.binary(
            operators::ADD,
            self.accu(),
            singleton,
            CelType::list(CelType::Dyn),
        );
        let step = self.call(
            operators::CONDITIONAL,
            vec![filter, append, self.accu()],
            CelType::list(CelType::Dyn),
        );
        self.comprehension(
            iter_range,
            iter_var,
            self.empty_list(),
            step,
            self.accu(),
            CelType::list(CelType::Dyn),
        )
    }

    /// `range.filter(var, predicate)` in its desugared form.
    pub fn filter_macro(&self, iter_range: Expr, iter_var: &str, predicate: Expr) -> Expr {
        let element = self.ident(iter_var, CelType::Dyn);
        let singleton = self.node(ExprKind::List(vec![element]), CelType::list(CelType::Dyn));
        let append = self.binary(
            operators::ADD,
            self.accu(),
            singleton,
            CelType::list(CelType::Dyn),
        );
        let step = self.call(
            operators::CONDITIONAL,
            vec![predicate, append, self.accu()],
            CelType::list(CelType::Dyn),
        );
        self.comprehension(
            iter_range,
            iter_var,
            self.empty_list(),
            step,
            self.accu(),
            CelType::list(CelType::Dyn),
        )
    }

    fn empty_list(&self) -> Expr {
        self.node(ExprKind::List(vec![]), CelType::list(CelType::Dyn))
    }
}

/// The schema every walker test runs against.
pub fn test_provider() -> PgTypeProvider {
    let json_users = vec![
        FieldSpec::new("id", ColumnType::Int),
        FieldSpec::new("name", ColumnType::String),
        FieldSpec::new("settings", ColumnType::Jsonb { shape: None }),
        FieldSpec::new(
            "tags",
            ColumnType::Jsonb {
                shape: Some(JsonShape::ScalarArray),
            },
        ),
        FieldSpec::new(
            "scores",
            ColumnType::Jsonb {
                shape: Some(JsonShape::ScalarArray),
            },
        ),
        FieldSpec::new(
            "attributes",
            ColumnType::Jsonb {
                shape: Some(JsonShape::ObjectArray),
            },
        ),
    ];

    let json_products = vec![
        FieldSpec::new("name", ColumnType::String),
        FieldSpec::new(
            "features",
            ColumnType::Jsonb {
                shape: Some(JsonShape::ObjectArray),
            },
        ),
        FieldSpec::new(
            "reviews",
            ColumnType::Json {
                shape: Some(JsonShape::ObjectArray),
            },
        ),
        FieldSpec::new(
            "categories",
            ColumnType::Json {
                shape: Some(JsonShape::ScalarArray),
            },
        ),
        FieldSpec::new("properties", ColumnType::Jsonb { shape: None }),
    ];

    let information_assets = vec![
        FieldSpec::new("id", ColumnType::Int),
        FieldSpec::new("name", ColumnType::String),
        FieldSpec::new("metadata", ColumnType::Jsonb { shape: None }),
        FieldSpec::new("properties", ColumnType::Json { shape: None }),
    ];

    let users = vec![
        FieldSpec::new("name", ColumnType::String),
        FieldSpec::new("age", ColumnType::Int),
        FieldSpec::repeated("nicknames", ColumnType::String),
        FieldSpec::new(
            "address",
            ColumnType::Composite(vec![
                FieldSpec::new("city", ColumnType::String),
                FieldSpec::new("zip", ColumnType::String),
            ]),
        ),
    ];

    PgTypeProvider::new(IndexMap::from([
        ("json_users".to_owned(), json_users),
        ("json_products".to_owned(), json_products),
        ("information_assets".to_owned(), information_assets),
        ("users".to_owned(), users),
    ]))
}
