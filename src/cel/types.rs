// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use crate::cel::expr::ExprId;

/// Abstract type names used by the SQL-flavored CEL environment.
pub mod abstract_types {
    pub const DATE: &str = "DATE";
    pub const TIME: &str = "TIME";
    pub const DATETIME: &str = "DATETIME";
    pub const INTERVAL: &str = "INTERVAL";
    pub const DATE_PART: &str = "date_part";
}

/// The checked type of a CEL expression node. Equality is structural.
#[derive(Debug, Clone, PartialEq)]
pub enum CelType {
    Bool,
    Int,
    Uint,
    Double,
    String,
    Bytes,
    Null,
    Timestamp,
    Duration,
    /// Type-erased (JSON/JSONB columns surface as this).
    Dyn,
    /// A named abstract type opaque to primitive handling (DATE, TIME,
    /// DATETIME, INTERVAL, date_part).
    Abstract(String),
    List(Box<CelType>),
    Map(Box<CelType>, Box<CelType>),
    /// A named composite (table or nested record).
    Object(String),
}

/// Node-id to checked-type map, total over the ids reachable from the root
/// of the expression handed to [`convert`](crate::convert).
pub type TypeMap = HashMap<ExprId, CelType>;

impl CelType {
    pub fn abstract_named(name: &str) -> Self {
        CelType::Abstract(name.to_owned())
    }

    pub fn list(elem: CelType) -> Self {
        CelType::List(Box::new(elem))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, CelType::Int | CelType::Uint | CelType::Double)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, CelType::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, CelType::Map(..))
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, CelType::Timestamp)
    }

    /// Timestamp or one of the point-in-time abstract types, i.e. anything
    /// that participates in date arithmetic on the timestamp side.
    pub fn is_timestamp_related(&self) -> bool {
        match self {
            CelType::Timestamp => true,
            CelType::Abstract(name) => {
                name == abstract_types::DATE
                    || name == abstract_types::TIME
                    || name == abstract_types::DATETIME
            }
            _ => false,
        }
    }

    /// Duration or the INTERVAL abstract type.
    pub fn is_duration_related(&self) -> bool {
        match self {
            CelType::Duration => true,
            CelType::Abstract(name) => name == abstract_types::INTERVAL,
            _ => false,
        }
    }
}
