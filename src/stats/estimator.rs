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

//! Bottom-up row-count estimation over a whole `LogicalPlan` (spec §4.B).
//! `cardinality` supplies the per-node-kind arithmetic and `selectivity`
//! the predicate-based reduction; this module is the tree walker that
//! threads one into the other, the way the teacher's `PlanBase::new`
//! derives a node's `rows()` from its children at construction time
//! (`plan_base.rs`), except computed on demand rather than cached on the
//! node (spec §3 invariant 1: schema/cost/rows are pure functions, never
//! stored state that a rewrite could leave stale).

use super::selectivity::{self, ColumnLookup};
use super::{cardinality, ColumnStatistics, StatsCache};
use crate::expr::{ExprNode, Op};
use crate::plan::logical::{DataSource, LogicalPlan, SetOpKind};

/// An aggregate with no statistics on its `GROUP BY` columns is assumed to
/// produce a moderate number of groups — enough not to collapse every
/// `GROUP BY` to one row by default, but far below a worst-case NDV.
const DEFAULT_GROUP_NDV: u64 = 100;

/// Estimate the number of rows `plan` produces (spec §4.B, §8 property 6:
/// "every estimate >= 1").
pub fn estimate_rows(plan: &LogicalPlan, stats: &StatsCache<'_>) -> u64 {
    match plan {
        LogicalPlan::DataSource(ds) => stats.row_count(&ds.table.name),
        LogicalPlan::Selection(s) => {
            let child_rows = estimate_rows(&s.input, stats);
            let sel = selectivity_of(&s.condition.to_expr(), &s.input, child_rows, stats);
            cardinality::selection_rows(child_rows, sel)
        }
        LogicalPlan::Projection(p) => estimate_rows(&p.input, stats),
        LogicalPlan::Join(j) => {
            let left_rows = estimate_rows(&j.left, stats);
            let right_rows = estimate_rows(&j.right, stats);
            let ndv = equi_join_key_ndv(&j.condition.to_expr(), &j.left, &j.right, stats);
            cardinality::join_rows(j.kind, left_rows, right_rows, ndv)
        }
        LogicalPlan::Apply(a) => {
            let left_rows = estimate_rows(&a.left, stats);
            let right_rows = estimate_rows(&a.right, stats);
            cardinality::join_rows(a.kind, left_rows, right_rows, None)
        }
        LogicalPlan::Aggregate(a) => {
            let child_rows = estimate_rows(&a.input, stats);
            let leaves = collect_data_sources(&a.input);
            let ndvs: Vec<u64> = a
                .group_by
                .iter()
                .map(|e| group_column_ndv(e, &leaves, stats))
                .collect();
            cardinality::aggregate_rows(child_rows, &ndvs)
        }
        LogicalPlan::Sort(s) => estimate_rows(&s.input, stats),
        LogicalPlan::TopN(t) => cardinality::limit_rows(t.limit, estimate_rows(&t.input, stats)),
        LogicalPlan::Limit(l) => cardinality::limit_rows(l.limit, estimate_rows(&l.input, stats)),
        LogicalPlan::Window(w) => estimate_rows(&w.input, stats),
        LogicalPlan::SetOp(s) => {
            let left_rows = estimate_rows(&s.left, stats);
            let right_rows = estimate_rows(&s.right, stats);
            match s.kind {
                SetOpKind::Union => left_rows.saturating_add(right_rows),
                SetOpKind::Intersect => left_rows.min(right_rows),
                SetOpKind::Except => left_rows,
            }
        }
        LogicalPlan::Dml(d) => d
            .source
            .as_deref()
            .map(|s| estimate_rows(s, stats))
            .unwrap_or(0),
    }
}

/// Every `DataSource` leaf beneath `plan`, in traversal order. Used to
/// resolve a bare column name back to the base table that owns it, since
/// `Selection`/`Aggregate` only see a schema, not which table each column
/// originally came from. `pub(crate)` so `rule::physicalize` can reuse the
/// same base-table lookup instead of re-deriving it.
pub(crate) fn collect_data_sources(plan: &LogicalPlan) -> Vec<&DataSource> {
    match plan {
        LogicalPlan::DataSource(ds) => vec![ds],
        other => other.children().into_iter().flat_map(collect_data_sources).collect(),
    }
}

fn column_ndv_in(name: &str, leaves: &[&DataSource], stats: &StatsCache<'_>) -> Option<u64> {
    for ds in leaves {
        if ds.table.column_index(name).is_some() {
            return stats.get(&ds.table.name).and_then(|s| s.column(name).map(|c| c.ndv));
        }
    }
    None
}

/// A `ColumnLookup` over an arbitrary subtree: column statistics resolve by
/// finding which leaf `DataSource` owns the column; `row_count` reports the
/// owning table's true row count when there is exactly one leaf (so null
/// fractions stay meaningful), falling back to the subtree's own estimate
/// when multiple base tables are in scope (a `Selection` sitting above a
/// `Join`, for instance).
struct SubtreeLookup<'p, 's> {
    fallback_rows: u64,
    leaves: &'p [&'p DataSource],
    stats: &'s StatsCache<'s>,
}

/// The selectivity of `condition`, evaluated against the base tables
/// beneath `subtree` (spec §4.B). Shared by [`estimate_rows`]'s `Selection`
/// arm and `rule::physicalize`'s `Filter` costing so both agree on exactly
/// the same estimate for the same node.
pub(crate) fn selectivity_of(
    condition: &ExprNode,
    subtree: &LogicalPlan,
    child_rows: u64,
    stats: &StatsCache<'_>,
) -> f64 {
    let leaves = collect_data_sources(subtree);
    let lookup = SubtreeLookup {
        fallback_rows: child_rows,
        leaves: &leaves,
        stats,
    };
    selectivity::selectivity(condition, &lookup)
}

impl ColumnLookup for SubtreeLookup<'_, '_> {
    fn column_stats(&self, column: &str) -> Option<ColumnStatistics> {
        for ds in self.leaves {
            if ds.table.column_index(column).is_some() {
                return self
                    .stats
                    .get(&ds.table.name)
                    .and_then(|s| s.column(column).copied());
            }
        }
        None
    }

    fn row_count(&self) -> u64 {
        match self.leaves {
            [single] => self.stats.row_count(&single.table.name),
            _ => self.fallback_rows,
        }
    }
}

/// The NDV of an equi-join's key, when every `Eq` conjunct resolves a plain
/// column on each side back to a known base table (spec §4.B "join key NDV,
/// when known"). When multiple equi-join conjuncts qualify, the most
/// selective (smallest NDV) bound wins — ties have to hold over every
/// conjunct jointly, not just one.
pub(crate) fn equi_join_key_ndv(
    condition: &ExprNode,
    left: &LogicalPlan,
    right: &LogicalPlan,
    stats: &StatsCache<'_>,
) -> Option<u64> {
    let left_leaves = collect_data_sources(left);
    let right_leaves = collect_data_sources(right);
    let mut best: Option<u64> = None;

    for conjunct in condition.conjuncts() {
        let ExprNode::Operator {
            op: Op::Eq,
            left: Some(l),
            right: Some(r),
            ..
        } = conjunct
        else {
            continue;
        };
        let (ExprNode::Column { name: ln, .. }, ExprNode::Column { name: rn, .. }) =
            (l.as_ref(), r.as_ref())
        else {
            continue;
        };
        let left_ndv = column_ndv_in(ln, &left_leaves, stats);
        let right_ndv = column_ndv_in(rn, &right_leaves, stats);
        let candidate = match (left_ndv, right_ndv) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        };
        if let Some(c) = candidate {
            best = Some(best.map_or(c, |b| b.min(c)));
        }
    }
    best
}

pub(crate) fn group_column_ndv(expr: &ExprNode, leaves: &[&DataSource], stats: &StatsCache<'_>) -> u64 {
    if let ExprNode::Column { name, .. } = expr {
        if let Some(ndv) = column_ndv_in(name, leaves, stats) {
            return ndv.max(1);
        }
    }
    DEFAULT_GROUP_NDV
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, DataType, TableMeta, TableMetaRef};
    use crate::expr::{Condition, Literal};
    use crate::plan::logical::{Aggregate, Join, Limit, Selection};
    use crate::stats::cardinality::JoinKind;
    use crate::stats::{NoStatistics, StatisticsProvider, TableStatistics};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn table(name: &str, cols: &[&str]) -> TableMetaRef {
        Arc::new(TableMeta::new(
            name,
            cols.iter()
                .map(|c| ColumnMeta::new(*c, DataType::Int64, false))
                .collect(),
            vec![],
        ))
    }

    struct FixedStats(HashMap<String, TableStatistics>);
    impl StatisticsProvider for FixedStats {
        fn get_statistics(&self, table: &str) -> Option<TableStatistics> {
            self.0.get(table).cloned()
        }
    }

    #[test]
    fn data_source_uses_provider_row_count() {
        let mut m = HashMap::new();
        m.insert(
            "t".to_string(),
            TableStatistics {
                row_count: 500,
                columns: Default::default(),
            },
        );
        let provider = FixedStats(m);
        let stats = StatsCache::new(&provider);
        let plan = LogicalPlan::DataSource(DataSource::new(table("t", &["a"])));
        assert_eq!(estimate_rows(&plan, &stats), 500);
    }

    #[test]
    fn data_source_without_stats_uses_default() {
        let stats = StatsCache::new(&NoStatistics);
        let plan = LogicalPlan::DataSource(DataSource::new(table("t", &["a"])));
        assert_eq!(estimate_rows(&plan, &stats), super::super::DEFAULT_ROW_COUNT);
    }

    #[test]
    fn selection_reduces_rows_by_selectivity() {
        let mut columns = HashMap::new();
        columns.insert(
            "a".to_string(),
            ColumnStatistics {
                data_type: DataType::Int64,
                ndv: 100,
                null_count: 0,
                min: Some(0.0),
                max: Some(99.0),
                average_width: 8.0,
            },
        );
        let mut m = HashMap::new();
        m.insert(
            "t".to_string(),
            TableStatistics {
                row_count: 1000,
                columns,
            },
        );
        let provider = FixedStats(m);
        let stats = StatsCache::new(&provider);
        let plan = LogicalPlan::Selection(Selection {
            input: Box::new(LogicalPlan::DataSource(DataSource::new(table("t", &["a"])))),
            condition: Condition::with_expr(ExprNode::binary(
                Op::Eq,
                ExprNode::col("a"),
                ExprNode::value(Literal::Int(1)),
            )),
        });
        let rows = estimate_rows(&plan, &stats);
        assert!(rows < 1000 && rows >= 1);
    }

    #[test]
    fn inner_join_uses_key_ndv_from_base_tables() {
        let mut left_cols = HashMap::new();
        left_cols.insert(
            "id".to_string(),
            ColumnStatistics {
                data_type: DataType::Int64,
                ndv: 100,
                null_count: 0,
                min: Some(0.0),
                max: Some(99.0),
                average_width: 8.0,
            },
        );
        let mut right_cols = HashMap::new();
        right_cols.insert(
            "user_id".to_string(),
            ColumnStatistics {
                data_type: DataType::Int64,
                ndv: 100,
                null_count: 0,
                min: Some(0.0),
                max: Some(99.0),
                average_width: 8.0,
            },
        );
        let mut m = HashMap::new();
        m.insert(
            "users".to_string(),
            TableStatistics {
                row_count: 100,
                columns: left_cols,
            },
        );
        m.insert(
            "orders".to_string(),
            TableStatistics {
                row_count: 1000,
                columns: right_cols,
            },
        );
        let provider = FixedStats(m);
        let stats = StatsCache::new(&provider);
        let plan = LogicalPlan::Join(Join {
            kind: JoinKind::Inner,
            left: Box::new(LogicalPlan::DataSource(DataSource::new(table("users", &["id"])))),
            right: Box::new(LogicalPlan::DataSource(DataSource::new(table(
                "orders",
                &["user_id"],
            )))),
            condition: Condition::with_expr(ExprNode::binary(
                Op::Eq,
                ExprNode::col("id"),
                ExprNode::col("user_id"),
            )),
            applied_hints: vec![],
        });
        // 100 * 1000 / max(100, 100) = 1000
        assert_eq!(estimate_rows(&plan, &stats), 1000);
    }

    #[test]
    fn aggregate_with_no_group_by_stats_falls_back_to_default_ndv() {
        let stats = StatsCache::new(&NoStatistics);
        let plan = LogicalPlan::Aggregate(Aggregate {
            input: Box::new(LogicalPlan::DataSource(DataSource::new(table("t", &["a"])))),
            group_by: vec![ExprNode::col("a")],
            items: vec![],
            algorithm: None,
            applied_hints: vec![],
        });
        assert_eq!(estimate_rows(&plan, &stats), DEFAULT_GROUP_NDV.min(super::super::DEFAULT_ROW_COUNT));
    }

    #[test]
    fn limit_is_bounded_by_child_rows() {
        let stats = StatsCache::new(&NoStatistics);
        let plan = LogicalPlan::Limit(Limit {
            input: Box::new(LogicalPlan::DataSource(DataSource::new(table("t", &["a"])))),
            limit: 10,
            offset: 0,
        });
        assert_eq!(estimate_rows(&plan, &stats), 10);
    }
}
