// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Translation of RE2-style patterns (the dialect of CEL's `matches`) into
//! the POSIX ERE dialect accepted by PostgreSQL's `~` operator.

use crate::error::{ConvertError, ConvertResult};

pub(crate) struct TranslatedPattern {
    pub pattern: String,
    /// Set when a leading `(?i)` was stripped; the caller emits `~*`
    /// instead of `~`.
    pub case_insensitive: bool,
}

/// Rewrites the Perl-style character classes RE2 supports into their POSIX
/// bracket equivalents and strips a leading `(?i)` flag. Constructs with no
/// POSIX ERE counterpart (look-around, named groups, other inline flags)
/// are rejected rather than passed through to fail inside PostgreSQL.
pub(crate) fn translate_pattern(pattern: &str) -> ConvertResult<TranslatedPattern> {
    let mut source = pattern;
    let mut case_insensitive = false;
    if let Some(rest) = source.strip_prefix("(?i)") {
        case_insensitive = true;
        source = rest;
    }

    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('b') => out.push_str("\\y"),
                Some('B') => out.push_str("[^[:alnum:]_]"),
                Some('d') => out.push_str("[[:digit:]]"),
                Some('D') => out.push_str("[^[:digit:]]"),
                Some('w') => out.push_str("[[:alnum:]_]"),
                Some('W') => out.push_str("[^[:alnum:]_]"),
                Some('s') => out.push_str("[[:space:]]"),
                Some('S') => out.push_str("[^[:space:]]"),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '(' if chars.peek() == Some(&'?') => {
                chars.next();
                match chars.peek() {
                    // A non-capturing group matches the same inputs as a
                    // capturing one; only the group numbering differs, which
                    // a boolean match never observes.
                    Some(':') => {
                        chars.next();
                        out.push('(');
                    }
                    Some(&flag) => {
                        return Err(ConvertError::UnsupportedRegex(format!("(?{flag}")));
                    }
                    None => return Err(ConvertError::UnsupportedRegex("(?".to_owned())),
                }
            }
            _ => out.push(c),
        }
    }

    Ok(TranslatedPattern {
        pattern: out,
        case_insensitive,
    })
}
