// Copyright 2026 The Query Optimizer Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Predicate selectivity estimation (spec §4.B). Every public entry point
//! returns a value in `[0, 1]` (spec §8 property 7) — clamping happens at
//! the lowest level so composition (`AND`/`OR`/`NOT`) can never escape the
//! bound.

use super::ColumnStatistics;
use crate::expr::{ExprNode, Literal, Op};

const EQ_DEFAULT: f64 = 0.1;
const EQ_MIN: f64 = 1e-4;
const EQ_MAX: f64 = 0.5;
const NEQ_DEFAULT: f64 = 0.9;
const RANGE_DEFAULT: f64 = 0.3;
const IN_DEFAULT: f64 = 0.2;
const BETWEEN_DEFAULT: f64 = 0.3;
const LIKE_SELECTIVITY: f64 = 0.25;

/// A column lookup as seen by the selectivity estimator: the column's
/// statistics (if known) and the table's row count (for null fraction).
pub trait ColumnLookup {
    fn column_stats(&self, column: &str) -> Option<ColumnStatistics>;
    fn row_count(&self) -> u64;
}

/// Estimate the selectivity of `expr` (a boolean-valued expression tree),
/// combining sub-selectivities per spec §4.B:
/// `AND` = product, `OR` = `1 - Π(1 - s_i)`, `NOT` = `1 - s`.
pub fn selectivity(expr: &ExprNode, lookup: &dyn ColumnLookup) -> f64 {
    let raw = match expr {
        ExprNode::Operator {
            op: Op::And,
            left: Some(l),
            right: Some(r),
            ..
        } => selectivity(l, lookup) * selectivity(r, lookup),
        ExprNode::Operator {
            op: Op::Or,
            left: Some(l),
            right: Some(r),
            ..
        } => {
            let sl = selectivity(l, lookup);
            let sr = selectivity(r, lookup);
            1.0 - (1.0 - sl) * (1.0 - sr)
        }
        ExprNode::Operator {
            op: Op::Not,
            left: Some(l),
            right: None,
            ..
        } => 1.0 - selectivity(l, lookup),
        ExprNode::Value(Literal::Bool(true)) => 1.0,
        ExprNode::Value(Literal::Bool(false)) => 0.0,
        atom => atom_selectivity(atom, lookup),
    };
    raw.clamp(0.0, 1.0)
}

fn column_name(expr: &ExprNode) -> Option<&str> {
    match expr {
        ExprNode::Column { name, .. } => Some(name),
        _ => None,
    }
}

fn literal_value(expr: &ExprNode) -> Option<&Literal> {
    match expr {
        ExprNode::Value(lit) => Some(lit),
        _ => None,
    }
}

fn atom_selectivity(expr: &ExprNode, lookup: &dyn ColumnLookup) -> f64 {
    let ExprNode::Operator {
        op, left, right, args,
    } = expr
    else {
        return RANGE_DEFAULT;
    };

    match op {
        Op::IsNull | Op::IsNotNull => {
            let Some(col) = left.as_deref().and_then(column_name) else {
                return RANGE_DEFAULT;
            };
            let null_fraction = lookup
                .column_stats(col)
                .map(|s| s.null_fraction(lookup.row_count()))
                .unwrap_or(0.0);
            if *op == Op::IsNull {
                null_fraction
            } else {
                1.0 - null_fraction
            }
        }
        Op::Eq | Op::Neq | Op::Gt | Op::Gte | Op::Lt | Op::Lte => {
            let (Some(col), Some(lit)) = (
                left.as_deref().and_then(column_name).or_else(|| right.as_deref().and_then(column_name)),
                left.as_deref().and_then(literal_value).or_else(|| right.as_deref().and_then(literal_value)),
            ) else {
                return RANGE_DEFAULT;
            };
            comparison_selectivity(*op, col, lit, lookup)
        }
        Op::In => {
            let Some(col) = left.as_deref().and_then(column_name) else {
                return IN_DEFAULT;
            };
            let k = args.len().max(1) as f64;
            match lookup.column_stats(col) {
                Some(stats) if stats.ndv > 0 => (k / stats.ndv as f64).min(1.0),
                _ => IN_DEFAULT,
            }
        }
        Op::Between => BETWEEN_DEFAULT,
        Op::Like => LIKE_SELECTIVITY,
        _ => RANGE_DEFAULT,
    }
}

fn comparison_selectivity(op: Op, col: &str, lit: &Literal, lookup: &dyn ColumnLookup) -> f64 {
    let stats = lookup.column_stats(col);
    match op {
        Op::Eq => {
            let s = stats
                .filter(|s| s.ndv > 0)
                .map(|s| 1.0 / s.ndv as f64)
                .unwrap_or(EQ_DEFAULT);
            s.clamp(EQ_MIN, EQ_MAX)
        }
        Op::Neq => {
            let eq = stats
                .filter(|s| s.ndv > 0)
                .map(|s| (1.0 / s.ndv as f64).clamp(EQ_MIN, EQ_MAX))
                .unwrap_or(1.0 - NEQ_DEFAULT);
            (1.0 - eq).clamp(0.0, 1.0)
        }
        Op::Gt | Op::Gte => range_selectivity(stats, lit, op, true),
        Op::Lt | Op::Lte => range_selectivity(stats, lit, op, false),
        _ => unreachable!(),
    }
}

/// `ascending = true` for `>`/`>=` (fraction of the range above `v`),
/// `false` for `<`/`<=` (fraction below `v`). Boundary semantics per spec
/// §4.B / §8 property 7: with `v <= min` a `>` predicate is ~1.0, with
/// `v >= max` it's ~0.0 (and symmetric for `<`).
fn range_selectivity(stats: Option<ColumnStatistics>, lit: &Literal, op: Op, ascending: bool) -> f64 {
    let Some(v) = lit.as_f64() else {
        return RANGE_DEFAULT;
    };
    let Some(stats) = stats else {
        return RANGE_DEFAULT;
    };
    let (Some(min), Some(max)) = (stats.min, stats.max) else {
        return RANGE_DEFAULT;
    };
    if max <= min {
        return RANGE_DEFAULT;
    }
    let strict = matches!(op, Op::Gt | Op::Lt);
    // A tiny epsilon nudges strict comparisons away from their non-strict
    // siblings without materially changing the estimate (spec §4.B).
    const EPS: f64 = 1e-9;
    let frac_above = ((max - v) / (max - min)).clamp(0.0, 1.0);
    let frac_below = ((v - min) / (max - min)).clamp(0.0, 1.0);
    let raw = if ascending { frac_above } else { frac_below };
    if strict {
        (raw - EPS).clamp(0.0, 1.0)
    } else {
        raw
    }
}
