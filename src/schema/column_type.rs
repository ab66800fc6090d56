// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use crate::cel::types::{abstract_types, CelType};

/// Declared element shape of a JSON/JSONB array column. Drives the choice
/// between the `_text` and object variants of `json[b]_array_elements` when
/// the column is expanded into a subquery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JsonShape {
    /// Elements are scalars (strings, numbers); extracted as text.
    ScalarArray,
    /// Elements are objects; kept as JSON so fields stay addressable.
    ObjectArray,
}

/// Storage class of a table column, the schema-level counterpart of a
/// PostgreSQL type token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnType {
    String,
    Bytes,
    Boolean,
    Int,
    Double,
    Timestamp,
    Date,
    Time,
    Json { shape: Option<JsonShape> },
    Jsonb { shape: Option<JsonShape> },
    Composite(Vec<FieldSpec>),
}

/// A single column of a table (or field of a composite), as the type
/// provider sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub typ: ColumnType,
    /// True for array-valued columns; `typ` then describes the element.
    pub repeated: bool,
}

/// Ordered field list of one table or composite. Fields are resolved by
/// linear search; tables are small enough that no index is kept.
pub type Schema = Vec<FieldSpec>;

impl FieldSpec {
    pub fn new(name: impl Into<String>, typ: ColumnType) -> Self {
        Self {
            name: name.into(),
            typ,
            repeated: false,
        }
    }

    pub fn repeated(name: impl Into<String>, typ: ColumnType) -> Self {
        Self {
            name: name.into(),
            typ,
            repeated: true,
        }
    }

    /// The CEL-level type of this field, with the list wrapper applied for
    /// repeated columns. `struct_name` is the dotted name of the enclosing
    /// table/composite, used to name nested object types.
    pub fn cel_type(&self, struct_name: &str) -> CelType {
        let base = self.typ.cel_type(struct_name, &self.name);
        if self.repeated {
            CelType::list(base)
        } else {
            base
        }
    }
}

impl ColumnType {
    /// Parses a catalogue type token (`information_schema.columns.data_type`
    /// or a caller-supplied storage type name). Unknown tokens default to
    /// the string class.
    pub fn from_db_token(token: &str) -> Self {
        let token = token.to_lowercase();
        match token.as_str() {
            "text" | "varchar" | "char" | "character varying" | "character" => ColumnType::String,
            "bytea" => ColumnType::Bytes,
            "boolean" | "bool" => ColumnType::Boolean,
            "integer" | "int" | "int2" | "int4" | "int8" | "bigint" | "smallint" => ColumnType::Int,
            "real" | "float4" | "double precision" | "float8" | "numeric" | "decimal" => {
                ColumnType::Double
            }
            "date" => ColumnType::Date,
            "json" => ColumnType::Json { shape: None },
            "jsonb" => ColumnType::Jsonb { shape: None },
            _ => {
                // Parameterized and zoned tokens ("timestamp with time
                // zone", "character varying(255)", "time(3)").
                if token.starts_with("timestamp") {
                    ColumnType::Timestamp
                } else if token.starts_with("time") {
                    ColumnType::Time
                } else {
                    ColumnType::String
                }
            }
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ColumnType::Json { .. } | ColumnType::Jsonb { .. })
    }

    pub fn is_jsonb(&self) -> bool {
        matches!(self, ColumnType::Jsonb { .. })
    }

    pub fn json_shape(&self) -> Option<JsonShape> {
        match self {
            ColumnType::Json { shape } | ColumnType::Jsonb { shape } => *shape,
            _ => None,
        }
    }

    /// Maps the storage class to a CEL type, per the fixed table of the
    /// provider contract.
    pub fn cel_type(&self, struct_name: &str, field_name: &str) -> CelType {
        match self {
            ColumnType::String => CelType::String,
            ColumnType::Bytes => CelType::Bytes,
            ColumnType::Boolean => CelType::Bool,
            ColumnType::Int => CelType::Int,
            ColumnType::Double => CelType::Double,
            ColumnType::Timestamp => CelType::Timestamp,
            ColumnType::Date => CelType::abstract_named(abstract_types::DATE),
            ColumnType::Time => CelType::abstract_named(abstract_types::TIME),
            ColumnType::Json { .. } | ColumnType::Jsonb { .. } => CelType::Dyn,
            ColumnType::Composite(_) => CelType::Object(format!("{struct_name}.{field_name}")),
        }
    }
}
