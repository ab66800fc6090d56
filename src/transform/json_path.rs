// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! JSON/JSONB navigation: resolving select chains against the schema and
//! emitting `->`/`->>` paths, `has()` tests, and array-expander choices.

use crate::cel::expr::{Expr, ExprKind};
use crate::error::ConvertResult;
use crate::schema::column_type::JsonShape;

use super::converter::Converter;

/// Field names that, absent a declared [`JsonShape`], are assumed to hold
/// arrays of scalars (expanded with the `_text` variants). Every other name
/// (`attributes`, `features`, `reviews`, ...) keeps object elements.
const SIMPLE_ARRAY_FIELDS: [&str; 3] = ["tags", "scores", "categories"];

/// Where a JSON navigation chain starts.
pub(crate) enum JsonRoot<'e> {
    /// A JSON/JSONB table column, possibly below composite fields
    /// (`qualified` is the full dotted SQL path, e.g. `assets.metadata`).
    Column {
        qualified: String,
        jsonb: bool,
        shape: Option<JsonShape>,
    },
    /// A comprehension variable bound to the object elements of a JSON
    /// array.
    IterVar { name: &'e str, jsonb: bool },
}

/// A select chain whose outermost operand resolved to a JSON value:
/// the root plus the field segments navigated inside the JSON document.
pub(crate) struct JsonChain<'e> {
    pub root: JsonRoot<'e>,
    pub segments: Vec<&'e str>,
}

impl JsonChain<'_> {
    pub fn jsonb(&self) -> bool {
        match &self.root {
            JsonRoot::Column { jsonb, .. } => *jsonb,
            JsonRoot::IterVar { jsonb, .. } => *jsonb,
        }
    }

    /// The field whose value gets expanded when the chain is used in array
    /// position: the last segment, or the column itself for direct access.
    fn array_field(&self) -> &str {
        if let Some(last) = self.segments.last() {
            return last;
        }
        match &self.root {
            JsonRoot::Column { qualified, .. } => {
                qualified.rsplit('.').next().unwrap_or(qualified)
            }
            JsonRoot::IterVar { name, .. } => name,
        }
    }
}

impl<'a> Converter<'a> {
    /// Resolves a select chain to a [`JsonChain`] if its outermost operand
    /// is a JSON/JSONB column (or a JSON-bound comprehension variable).
    /// Returns `None` for anything else, in which case the chain is plain
    /// `.`-navigation.
    pub(crate) fn resolve_json_chain<'e>(&self, expr: &'e Expr) -> Option<JsonChain<'e>> {
        let mut fields: Vec<&'e str> = vec![];
        let mut current = expr;
        loop {
            match &current.kind {
                ExprKind::Select { operand, field, .. } => {
                    fields.push(field);
                    current = operand;
                }
                ExprKind::Ident(name) => {
                    fields.reverse();
                    return self.chain_from_root(name, fields);
                }
                _ => return None,
            }
        }
    }

    fn chain_from_root<'e>(
        &self,
        root: &'e str,
        fields: Vec<&'e str>,
    ) -> Option<JsonChain<'e>> {
        // A select on a comprehension variable stays inside the element's
        // JSON document.
        if let Some(binding) = self.iter_bindings.iter().rev().find(|b| b.var == root) {
            if binding.elements == JsonShape::ObjectArray && !fields.is_empty() {
                return Some(JsonChain {
                    root: JsonRoot::IterVar {
                        name: root,
                        jsonb: binding.jsonb,
                    },
                    segments: fields,
                });
            }
            return None;
        }

        let mut struct_path = root.to_owned();
        for (i, field) in fields.iter().enumerate() {
            let spec = self.provider.find_field_spec(&struct_path, field)?;
            if spec.typ.is_json() {
                return Some(JsonChain {
                    root: JsonRoot::Column {
                        qualified: format!("{struct_path}.{field}"),
                        jsonb: spec.typ.is_jsonb(),
                        shape: spec.typ.json_shape(),
                    },
                    segments: fields[i + 1..].to_vec(),
                });
            }
            match &spec.typ {
                crate::schema::column_type::ColumnType::Composite(_) => {
                    struct_path = format!("{struct_path}.{field}");
                }
                _ => return None,
            }
        }
        None
    }

    /// Element shape of the chain's array field: the declared schema shape
    /// when the array is the column itself, otherwise the field-name
    /// heuristic inherited from the schema conventions.
    pub(crate) fn json_element_shape(&self, chain: &JsonChain) -> JsonShape {
        if chain.segments.is_empty() {
            if let JsonRoot::Column {
                shape: Some(shape), ..
            } = &chain.root
            {
                return *shape;
            }
        }
        if SIMPLE_ARRAY_FIELDS.contains(&chain.array_field()) {
            JsonShape::ScalarArray
        } else {
            JsonShape::ObjectArray
        }
    }

    /// The `json[b]_array_elements[_text]` expander for the chain.
    pub(crate) fn array_elements_fn(&self, chain: &JsonChain) -> &'static str {
        match (chain.jsonb(), self.json_element_shape(chain)) {
            (true, JsonShape::ScalarArray) => "jsonb_array_elements_text",
            (true, JsonShape::ObjectArray) => "jsonb_array_elements",
            (false, JsonShape::ScalarArray) => "json_array_elements_text",
            (false, JsonShape::ObjectArray) => "json_array_elements",
        }
    }

    pub(crate) fn typeof_fn(&self, chain: &JsonChain) -> &'static str {
        if chain.jsonb() {
            "jsonb_typeof"
        } else {
            "json_typeof"
        }
    }

    fn push_json_root(&mut self, chain: &JsonChain) {
        match &chain.root {
            JsonRoot::Column { qualified, .. } => self.sql.push_str(qualified),
            JsonRoot::IterVar { name, .. } => self.sql.push_str(name),
        }
    }

    /// Value navigation: `->` for every intermediate segment, `->>` (text
    /// extraction) for the last. Requires at least one segment.
    pub(crate) fn push_json_value_path(&mut self, chain: &JsonChain) {
        self.push_json_root(chain);
        if let Some((last, intermediate)) = chain.segments.split_last() {
            for segment in intermediate {
                self.sql.push_str("->'");
                self.sql.push_str(segment);
                self.sql.push('\'');
            }
            self.sql.push_str("->>'");
            self.sql.push_str(last);
            self.sql.push('\'');
        }
    }

    /// Array navigation: `->` throughout so the result stays JSON/JSONB and
    /// can feed `json[b]_array_elements[_text]`.
    pub(crate) fn push_json_preserve_path(&mut self, chain: &JsonChain) {
        self.push_json_root(chain);
        for segment in &chain.segments {
            self.sql.push_str("->'");
            self.sql.push_str(segment);
            self.sql.push('\'');
        }
    }

    /// `has()` over a JSON chain: key-existence `?` for a single JSONB
    /// segment, `-> ... IS NOT NULL` for a single JSON segment,
    /// `jsonb_extract_path_text(...) IS NOT NULL` for deeper chains.
    pub(crate) fn push_json_has(&mut self, chain: &JsonChain) -> ConvertResult<()> {
        match chain.segments.as_slice() {
            [segment] => {
                if chain.jsonb() {
                    self.push_json_root(chain);
                    self.sql.push_str(" ? ");
                    self.sql.push_quoted(segment);
                } else {
                    self.push_json_root(chain);
                    self.sql.push_str(" -> ");
                    self.sql.push_quoted(segment);
                    self.sql.push_str(" IS NOT NULL");
                }
            }
            segments => {
                self.sql.push_str("jsonb_extract_path_text(");
                self.push_json_root(chain);
                for segment in segments {
                    self.sql.push_str(", ");
                    self.sql.push_quoted(segment);
                }
                self.sql.push_str(") IS NOT NULL");
            }
        }
        Ok(())
    }

    /// Whether the visit of `expr` will end in a JSON text extraction
    /// (`->>` chain or a text-element comprehension variable). Such values
    /// need a `::numeric` cast before numeric comparison or arithmetic.
    pub(crate) fn lowers_to_json_text(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Ident(name) => self
                .iter_bindings
                .iter()
                .rev()
                .any(|b| b.var == *name && b.elements == JsonShape::ScalarArray),
            ExprKind::Select { .. } => self
                .resolve_json_chain(expr)
                .is_some_and(|chain| !chain.segments.is_empty()),
            _ => false,
        }
    }
}
