// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Mangled CEL operator names and the canonical precedence table.
//!
//! The names match the internal function names the CEL parser assigns to
//! operator expressions (`a && b` becomes a call to `_&&_`, and so on).

pub const CONDITIONAL: &str = "_?_:_";
pub const LOGICAL_AND: &str = "_&&_";
pub const LOGICAL_OR: &str = "_||_";
pub const LOGICAL_NOT: &str = "!_";
pub const EQUALS: &str = "_==_";
pub const NOT_EQUALS: &str = "_!=_";
pub const LESS: &str = "_<_";
pub const LESS_EQUALS: &str = "_<=_";
pub const GREATER: &str = "_>_";
pub const GREATER_EQUALS: &str = "_>=_";
pub const ADD: &str = "_+_";
pub const SUBTRACT: &str = "_-_";
pub const MULTIPLY: &str = "_*_";
pub const DIVIDE: &str = "_/_";
pub const MODULO: &str = "_%_";
pub const NEGATE: &str = "-_";
pub const INDEX: &str = "_[_]";
pub const IN: &str = "@in";
/// Pre-v0.5 spelling of the membership operator, still produced by some
/// front ends.
pub const OLD_IN: &str = "_in_";

/// Canonical CEL precedence. Higher values bind more loosely; `0` means the
/// name is not an operator.
pub fn precedence(op: &str) -> u8 {
    match op {
        CONDITIONAL => 8,
        LOGICAL_OR => 7,
        LOGICAL_AND => 6,
        EQUALS | NOT_EQUALS | LESS | LESS_EQUALS | GREATER | GREATER_EQUALS | IN | OLD_IN => 5,
        ADD | SUBTRACT => 4,
        MULTIPLY | DIVIDE | MODULO => 3,
        LOGICAL_NOT | NEGATE => 2,
        INDEX => 1,
        _ => 0,
    }
}

/// Display form of a binary operator, for the operators whose CEL spelling
/// doubles as valid SQL. Returns `None` for unary operators, indexing, and
/// the conditional.
pub fn find_reverse_binary(op: &str) -> Option<&'static str> {
    match op {
        LOGICAL_AND => Some("&&"),
        LOGICAL_OR => Some("||"),
        EQUALS => Some("=="),
        NOT_EQUALS => Some("!="),
        LESS => Some("<"),
        LESS_EQUALS => Some("<="),
        GREATER => Some(">"),
        GREATER_EQUALS => Some(">="),
        ADD => Some("+"),
        SUBTRACT => Some("-"),
        MULTIPLY => Some("*"),
        DIVIDE => Some("/"),
        MODULO => Some("%"),
        IN | OLD_IN => Some("in"),
        _ => None,
    }
}

/// Whether the parser resolves the operator left-recursively. Affects when
/// a right operand of equal precedence needs parentheses.
pub fn is_left_recursive(op: &str) -> bool {
    op != LOGICAL_AND && op != LOGICAL_OR
}
