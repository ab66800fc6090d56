// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Write;

/// Accumulates the SQL fragment while an expression is being lowered.
///
/// The walker writes in strict pre-order; there is no second pass and no
/// re-ordering, so a plain growable string is all the state needed. One
/// builder lives for exactly one [`convert`](crate::convert) call.
pub struct SQLBuilder {
    sql: String,
}

impl SQLBuilder {
    pub fn new() -> Self {
        Self { sql: String::new() }
    }

    /// Push a string
    pub fn push_str<T: AsRef<str>>(&mut self, s: T) {
        self.sql.push_str(s.as_ref());
    }

    /// Push a character
    pub fn push(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Push a space. This is a common operation, so it is provided as a
    /// separate method.
    pub fn push_space(&mut self) {
        self.sql.push(' ');
    }

    /// Push a single-quoted SQL string literal, doubling any embedded single
    /// quotes.
    pub fn push_quoted<T: AsRef<str>>(&mut self, s: T) {
        self.sql.push('\'');
        for c in s.as_ref().chars() {
            if c == '\'' {
                self.sql.push('\'');
            }
            self.sql.push(c);
        }
        self.sql.push('\'');
    }

    /// Push a formatted integer or float without allocation churn.
    pub fn push_display<T: std::fmt::Display>(&mut self, value: T) {
        // Writing to a String cannot fail.
        let _ = write!(self.sql, "{value}");
    }

    /// Get the SQL string. Calling this method is the final step in building
    /// an SQL expression, and thus it consumes `self`.
    pub fn into_sql(self) -> String {
        self.sql
    }
}

impl Default for SQLBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_literal_doubles_single_quotes() {
        let mut builder = SQLBuilder::new();
        builder.push_quoted("O'Reilly's");
        assert_eq!(builder.into_sql(), "'O''Reilly''s'");
    }

    #[test]
    fn display_values() {
        let mut builder = SQLBuilder::new();
        builder.push_display(42);
        builder.push_space();
        builder.push_display(1.5);
        assert_eq!(builder.into_sql(), "42 1.5");
    }
}
