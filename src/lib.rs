// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Compiles type-checked CEL expressions into PostgreSQL `WHERE`-clause
//! fragments.
//!
//! The central entry point is [`convert`]: it takes the root of a checked
//! CEL AST ([`Expr`]), the node-id to type map the checker produced
//! ([`TypeMap`]), and a [`TypeProvider`] describing the table schemas the
//! expression refers to, and returns one PostgreSQL expression as text.
//! The caller splices that fragment into its own
//! `SELECT ... FROM ... WHERE ...` skeleton; no SQL is executed here and no
//! parameters are bound. Constant literals are emitted inline with
//! single-quote escaping.
//!
//! Lowering is type-directed: the same CEL operator compiles differently
//! depending on the checked types of its operands (string `+` becomes `||`,
//! timestamp arithmetic keeps `+`/`-`, membership over a JSON array becomes
//! an `ANY(ARRAY(SELECT ...))` subquery, and so on). Schema knowledge,
//! that is which columns are JSON or JSONB and which are arrays, comes from
//! the provider, either declared statically or introspected from a live
//! database over a pooled connection ([`PgTypeProvider`]).

pub mod cel;
pub mod schema;
mod sql;
mod transform;

pub mod error;

pub use cel::{
    expr::{Comprehension, Constant, Expr, ExprId, ExprKind, StructEntry, StructKey},
    types::{CelType, TypeMap},
};
pub use error::{ConvertError, ProviderError};
pub use schema::{
    column_type::{ColumnType, FieldSpec, JsonShape, Schema},
    provider::{PgTypeProvider, TypeProvider},
};
pub use transform::convert;
