// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Temporal lowering: duration literals, `interval()`, timestamp
//! arithmetic, and the `get*` date-part accessors.

use crate::cel::expr::{Constant, Expr};
use crate::cel::{functions, operators};
use crate::error::{ConvertError, ConvertResult};

use super::converter::{is_complex_operator_with_respect_to, Converter};

const NANOS_PER_MICROSECOND: i64 = 1_000;
const NANOS_PER_MILLISECOND: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;

/// Parses a Go-style duration literal ("300ms", "1h1m", "-1.5h") into
/// nanoseconds. Accepted units: ns, us/µs, ms, s, m, h.
fn parse_duration(input: &str) -> Option<i64> {
    let mut rest = input;
    let mut negative = false;
    if let Some(r) = rest.strip_prefix('-') {
        negative = true;
        rest = r;
    } else if let Some(r) = rest.strip_prefix('+') {
        rest = r;
    }

    if rest == "0" {
        return Some(0);
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let int_len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (int_part, after_int) = rest.split_at(int_len);

        let (frac_part, after_frac) = match after_int.strip_prefix('.') {
            Some(r) => {
                let frac_len = r.find(|c: char| !c.is_ascii_digit()).unwrap_or(r.len());
                r.split_at(frac_len)
            }
            None => ("", after_int),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let (scale, after_unit) = if let Some(r) = after_frac.strip_prefix("ns") {
            (1, r)
        } else if let Some(r) = after_frac.strip_prefix("us") {
            (NANOS_PER_MICROSECOND, r)
        } else if let Some(r) = after_frac.strip_prefix("µs") {
            (NANOS_PER_MICROSECOND, r)
        } else if let Some(r) = after_frac.strip_prefix("ms") {
            (NANOS_PER_MILLISECOND, r)
        } else if let Some(r) = after_frac.strip_prefix('s') {
            (NANOS_PER_SECOND, r)
        } else if let Some(r) = after_frac.strip_prefix('m') {
            (NANOS_PER_MINUTE, r)
        } else if let Some(r) = after_frac.strip_prefix('h') {
            (NANOS_PER_HOUR, r)
        } else {
            return None;
        };

        if !int_part.is_empty() {
            total += int_part.parse::<i128>().ok()? * scale as i128;
        }
        if !frac_part.is_empty() {
            let fraction: f64 = format!("0.{frac_part}").parse().ok()?;
            total += (fraction * scale as f64) as i128;
        }

        rest = after_unit;
    }

    if negative {
        total = -total;
    }
    i64::try_from(total).ok()
}

impl<'a> Converter<'a> {
    /// `duration("<literal>")` becomes `INTERVAL N <unit>` where the unit is
    /// the coarsest of HOUR/MINUTE/SECOND/MILLISECOND that represents the
    /// duration exactly, falling back to truncated MICROSECOND.
    pub(crate) fn call_duration(&mut self, args: &[Expr]) -> ConvertResult<()> {
        let [arg] = args else {
            return Err(ConvertError::BadArgumentCount {
                function: functions::TYPE_CONVERT_DURATION.to_owned(),
                expected: "1",
                found: args.len(),
            });
        };
        let literal = match arg.as_const() {
            Some(Constant::String(s)) => s,
            Some(other) => {
                return Err(ConvertError::BadConstantKind {
                    expected: "string literal",
                    found: other.kind_name().to_owned(),
                    id: arg.id,
                })
            }
            None => return Err(ConvertError::UnsupportedNode(arg.id)),
        };

        let nanos = parse_duration(literal)
            .ok_or_else(|| ConvertError::BadDurationLiteral(literal.clone()))?;

        self.sql.push_str("INTERVAL ");
        let (value, unit) = if nanos % NANOS_PER_HOUR == 0 {
            (nanos / NANOS_PER_HOUR, "HOUR")
        } else if nanos % NANOS_PER_MINUTE == 0 {
            (nanos / NANOS_PER_MINUTE, "MINUTE")
        } else if nanos % NANOS_PER_SECOND == 0 {
            (nanos / NANOS_PER_SECOND, "SECOND")
        } else if nanos % NANOS_PER_MILLISECOND == 0 {
            (nanos / NANOS_PER_MILLISECOND, "MILLISECOND")
        } else {
            (nanos / NANOS_PER_MICROSECOND, "MICROSECOND")
        };
        self.sql.push_display(value);
        self.sql.push_space();
        self.sql.push_str(unit);
        Ok(())
    }

    /// `interval(n, DAY)` becomes `INTERVAL n DAY`. The date part must be an
    /// identifier (the date_part constants of the CEL environment).
    pub(crate) fn call_interval(&mut self, args: &[Expr]) -> ConvertResult<()> {
        let [amount, date_part] = args else {
            return Err(ConvertError::BadArgumentCount {
                function: functions::INTERVAL.to_owned(),
                expected: "2",
                found: args.len(),
            });
        };
        self.sql.push_str("INTERVAL ");
        self.visit(amount)?;
        self.sql.push_space();
        let part = date_part
            .as_ident()
            .ok_or(ConvertError::UnsupportedNode(date_part.id))?;
        self.sql.push_str(part);
        Ok(())
    }

    /// Arithmetic between a timestamp-family and a duration-family operand.
    /// PostgreSQL date arithmetic keeps plain `+`/`-`, with the temporal
    /// operand normalized to the left-hand side.
    pub(crate) fn call_timestamp_operation(
        &mut self,
        fun: &str,
        lhs: &Expr,
        rhs: &Expr,
    ) -> ConvertResult<()> {
        let lhs_paren = is_complex_operator_with_respect_to(fun, lhs);
        let rhs_paren = is_complex_operator_with_respect_to(fun, rhs);

        let (timestamp, timestamp_paren, duration, duration_paren) =
            if self.get_type(lhs).is_timestamp_related() {
                (lhs, lhs_paren, rhs, rhs_paren)
            } else {
                (rhs, rhs_paren, lhs, lhs_paren)
            };

        let sql_op = match fun {
            operators::ADD => "+",
            operators::SUBTRACT => "-",
            _ => return Err(ConvertError::UnsupportedOperator(fun.to_owned())),
        };

        self.visit_maybe_nested(timestamp, timestamp_paren)?;
        self.sql.push_space();
        self.sql.push_str(sql_op);
        self.sql.push_space();
        self.visit_maybe_nested(duration, duration_paren)
    }

    /// The `get*` date-part accessors become `EXTRACT(<part> FROM x)`, with
    /// an `AT <tz>` qualifier when a timestamp-typed operand carries a time
    /// zone argument.
    ///
    /// `getMonth`, `getDayOfYear`, `getDayOfMonth` and `getDayOfWeek` are
    /// zero-based in CEL, so the extraction is post-fixed with ` - 1`. Note
    /// that this follows CEL semantics, not PostgreSQL's one-based months
    /// and days.
    pub(crate) fn call_extract(
        &mut self,
        function: &str,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> ConvertResult<()> {
        let (subject, timezone) = match target {
            Some(target) => (target, args.first()),
            None => (
                args.first().ok_or(ConvertError::BadArgumentCount {
                    function: function.to_owned(),
                    expected: "1",
                    found: 0,
                })?,
                args.get(1),
            ),
        };

        let part = match function {
            functions::TIME_GET_FULL_YEAR => "YEAR",
            functions::TIME_GET_MONTH => "MONTH",
            functions::TIME_GET_DATE => "DAY",
            functions::TIME_GET_HOURS => "HOUR",
            functions::TIME_GET_MINUTES => "MINUTE",
            functions::TIME_GET_SECONDS => "SECOND",
            functions::TIME_GET_MILLISECONDS => "MILLISECOND",
            functions::TIME_GET_DAY_OF_YEAR => "DOY",
            functions::TIME_GET_DAY_OF_MONTH => "DAY",
            functions::TIME_GET_DAY_OF_WEEK => "DOW",
            _ => return Err(ConvertError::UnsupportedOperator(function.to_owned())),
        };

        self.sql.push_str("EXTRACT(");
        self.sql.push_str(part);
        self.sql.push_str(" FROM ");
        self.visit(subject)?;
        if let Some(timezone) = timezone {
            if self.get_type(subject).is_timestamp() {
                self.sql.push_str(" AT ");
                self.visit(timezone)?;
            }
        }
        self.sql.push(')');

        if matches!(
            function,
            functions::TIME_GET_MONTH
                | functions::TIME_GET_DAY_OF_YEAR
                | functions::TIME_GET_DAY_OF_MONTH
                | functions::TIME_GET_DAY_OF_WEEK
        ) {
            self.sql.push_str(" - 1");
        }
        Ok(())
    }

    /// `timestamp(s)` casts a string; `timestamp(dt, tz)` builds a zoned
    /// timestamp from a DATETIME.
    pub(crate) fn call_timestamp_from_string(&mut self, args: &[Expr]) -> ConvertResult<()> {
        match args {
            [value] => {
                self.sql.push_str("CAST(");
                self.visit(value)?;
                self.sql.push_str(" AS TIMESTAMP WITH TIME ZONE)");
                Ok(())
            }
            [datetime, timezone] => {
                self.sql.push_str("TIMESTAMP(");
                self.visit(datetime)?;
                self.sql.push_str(", ");
                self.visit(timezone)?;
                self.sql.push(')');
                Ok(())
            }
            _ => Err(ConvertError::BadArgumentCount {
                function: functions::TYPE_CONVERT_TIMESTAMP.to_owned(),
                expected: "1 or 2",
                found: args.len(),
            }),
        }
    }
}
