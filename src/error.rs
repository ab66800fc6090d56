// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

use crate::cel::expr::ExprId;

/// Errors produced while lowering a CEL expression to SQL.
///
/// Every error short-circuits the walk; no partial SQL is ever returned.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("unsupported expression node (id {0})")]
    UnsupportedNode(ExprId),

    #[error("cannot unmangle operator `{0}`")]
    UnsupportedOperator(String),

    #[error("unsupported operand type for {context}: {found}")]
    UnsupportedType {
        context: &'static str,
        found: String,
    },

    #[error("unrecognized comprehension shape (id {0})")]
    UnrecognizedComprehension(ExprId),

    #[error("invalid field name \"{0}\"")]
    BadFieldName(String),

    #[error("expected {expected}, found {found} (id {id})")]
    BadConstantKind {
        expected: &'static str,
        found: String,
        id: ExprId,
    },

    #[error("`{function}` expects {expected} arguments, got {found}")]
    BadArgumentCount {
        function: String,
        expected: &'static str,
        found: usize,
    },

    #[error("invalid duration literal \"{0}\"")]
    BadDurationLiteral(String),

    #[error("regex construct `{0}` has no POSIX ERE equivalent")]
    UnsupportedRegex(String),
}

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors produced by the schema provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("no database connection configured")]
    Unconfigured,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delegate: {0}")]
    Delegate(#[from] tokio_postgres::Error),

    #[error("Pool: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("{0} {1}")]
    WithContext(String, #[source] Box<ProviderError>),
}

impl ProviderError {
    pub fn with_context(self, context: String) -> ProviderError {
        ProviderError::WithContext(context, Box::new(self))
    }
}

pub trait WithContext {
    fn with_context(self, context: String) -> Self;
}

impl<T> WithContext for Result<T, ProviderError> {
    fn with_context(self, context: String) -> Result<T, ProviderError> {
        self.map_err(|e| e.with_context(context))
    }
}
