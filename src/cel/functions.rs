// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Names of the CEL standard functions and overloads the walker recognizes.

pub const CONTAINS: &str = "contains";
pub const STARTS_WITH: &str = "startsWith";
pub const ENDS_WITH: &str = "endsWith";
pub const MATCHES: &str = "matches";
pub const SIZE: &str = "size";

pub const TYPE_CONVERT_BOOL: &str = "bool";
pub const TYPE_CONVERT_BYTES: &str = "bytes";
pub const TYPE_CONVERT_DOUBLE: &str = "double";
pub const TYPE_CONVERT_INT: &str = "int";
pub const TYPE_CONVERT_STRING: &str = "string";
pub const TYPE_CONVERT_UINT: &str = "uint";
pub const TYPE_CONVERT_DURATION: &str = "duration";
pub const TYPE_CONVERT_TIMESTAMP: &str = "timestamp";

/// SQL-flavored interval constructor: `interval(1, MONTH)`.
pub const INTERVAL: &str = "interval";

pub const TIME_GET_FULL_YEAR: &str = "getFullYear";
pub const TIME_GET_MONTH: &str = "getMonth";
pub const TIME_GET_DATE: &str = "getDate";
pub const TIME_GET_HOURS: &str = "getHours";
pub const TIME_GET_MINUTES: &str = "getMinutes";
pub const TIME_GET_SECONDS: &str = "getSeconds";
pub const TIME_GET_MILLISECONDS: &str = "getMilliseconds";
pub const TIME_GET_DAY_OF_YEAR: &str = "getDayOfYear";
pub const TIME_GET_DAY_OF_MONTH: &str = "getDayOfMonth";
pub const TIME_GET_DAY_OF_WEEK: &str = "getDayOfWeek";
