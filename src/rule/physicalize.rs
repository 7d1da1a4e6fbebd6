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

//! Turns an already-rewritten `LogicalPlan` into an executable `PhysicalPlan`
//! (spec §4.G step 3c). Every node gets a concrete algorithm and a computed
//! cost; joins and aggregates consult hints before falling back to
//! `stats::cost`, the way `JoinReorder` (`rule/rules/join_reorder.rs`)
//! consults `ctx.hints`/records `ctx.diagnostics` before falling back to its
//! own cost-based ordering. Runs once, bottom-up, after the rule engine has
//! reached fixpoint — not itself a `Rule`, since it changes the plan's type
//! rather than rewriting within `LogicalPlan`.

use crate::catalog::TableMeta;
use crate::error::{OptimizerError, Result};
use crate::hint::{AggAlgo, HintOutcome, JoinAlgo};
use crate::plan::logical::{DataSource, LogicalPlan, SetOpKind};
use crate::plan::physical::{
    AggregateOp, BuildSide, Dml as PhysicalDml, Filter, JoinOp, LimitOp, PhysicalPlan, Project,
    Scan, SetOp as PhysicalSetOp, SortOp, TopNOp, WindowOp,
};
use crate::plan::schema::{infer_type, Field, Schema};
use crate::rule::context::RuleContext;
use crate::stats::cost::{self, Cost};
use crate::stats::estimator;
use crate::stats::{cardinality, StatsCache};

/// A table with no column statistics is assumed to have this average row
/// width (bytes) per column, so `Scan` still has a nonzero I/O term.
const DEFAULT_COLUMN_WIDTH: f64 = 8.0;

pub fn physicalize(plan: &LogicalPlan, ctx: &mut RuleContext<'_>) -> Result<PhysicalPlan> {
    match plan {
        LogicalPlan::DataSource(ds) => Ok(physicalize_scan(ds, ctx)),

        LogicalPlan::Selection(s) => {
            let input = physicalize(&s.input, ctx)?;
            let child_rows = input.rows();
            let condition_expr = s.condition.to_expr();
            let sel = estimator::selectivity_of(&condition_expr, &s.input, child_rows, ctx.stats);
            let rows = cardinality::selection_rows(child_rows, sel);
            let cost = cost::filter(child_rows, ctx.config);
            Ok(PhysicalPlan::Filter(Filter {
                input: Box::new(input),
                condition: s.condition.clone(),
                rows,
                cost,
            }))
        }

        LogicalPlan::Projection(p) => {
            let input = physicalize(&p.input, ctx)?;
            let input_schema = input.schema();
            let schema = Schema::new(
                p.items
                    .iter()
                    .map(|item| Field::new(item.name(), infer_type(&item.expr, &input_schema), true))
                    .collect(),
            );
            let rows = input.rows();
            let cost = cost::projection(rows, p.items.len(), ctx.config);
            Ok(PhysicalPlan::Project(Project {
                input: Box::new(input),
                items: p.items.clone(),
                schema,
                rows,
                cost,
            }))
        }

        LogicalPlan::Join(j) => {
            let left = physicalize(&j.left, ctx)?;
            let right = physicalize(&j.right, ctx)?;
            let left_rows = left.rows();
            let right_rows = right.rows();
            let tables = leaf_table_names(&j.left, &j.right);
            let ndv = estimator::equi_join_key_ndv(&j.condition.to_expr(), &j.left, &j.right, ctx.stats);
            let rows = cardinality::join_rows(j.kind, left_rows, right_rows, ndv);
            let (algo, mut applied_hints) = resolve_join_algo(&tables, left_rows, right_rows, ctx);
            applied_hints.extend(j.applied_hints.iter().cloned());
            let cost = join_cost(algo, left_rows, right_rows, ctx.config);
            let build_side = join_build_side(algo, left_rows, right_rows);
            let schema = Schema::join(&left.schema(), &right.schema());
            Ok(PhysicalPlan::Join(JoinOp {
                kind: j.kind,
                algo,
                left: Box::new(left),
                right: Box::new(right),
                condition: j.condition.clone(),
                build_side,
                schema,
                rows,
                cost,
                applied_hints,
            }))
        }

        LogicalPlan::Apply(_) => Err(OptimizerError::RuleFailure {
            rule: "physicalize".to_string(),
            cause: "an Apply node survived rule application; Decorrelate/SemiJoinRewrite \
                    should have removed every occurrence before physicalization"
                .to_string(),
        }),

        LogicalPlan::Aggregate(a) => {
            let input = physicalize(&a.input, ctx)?;
            let rows = input.rows();
            let leaves = estimator::collect_data_sources(&a.input);
            let group_ndvs: Vec<u64> = a
                .group_by
                .iter()
                .map(|e| estimator::group_column_ndv(e, &leaves, ctx.stats))
                .collect();
            let out_rows = cardinality::aggregate_rows(rows, &group_ndvs);
            let (algorithm, mut applied_hints) = resolve_agg_algo(a.algorithm, ctx);
            applied_hints.extend(a.applied_hints.iter().cloned());
            let cost = cost::aggregate(rows, a.group_by.len(), ctx.config);
            let schema = plan.schema();
            Ok(PhysicalPlan::Aggregate(AggregateOp {
                input: Box::new(input),
                group_by: a.group_by.clone(),
                items: a.items.clone(),
                algorithm,
                schema,
                rows: out_rows,
                cost,
                applied_hints,
            }))
        }

        LogicalPlan::Sort(s) => {
            let input = physicalize(&s.input, ctx)?;
            let rows = input.rows();
            let cost = cost::sort(rows, ctx.config);
            Ok(PhysicalPlan::Sort(SortOp {
                input: Box::new(input),
                items: s.items.clone(),
                rows,
                cost,
            }))
        }

        LogicalPlan::TopN(t) => {
            let input = physicalize(&t.input, ctx)?;
            let child_rows = input.rows();
            let rows = cardinality::limit_rows(t.limit, child_rows);
            let cost = cost::top_n(child_rows, t.limit, ctx.config);
            Ok(PhysicalPlan::TopN(TopNOp {
                input: Box::new(input),
                items: t.items.clone(),
                limit: t.limit,
                offset: t.offset,
                rows,
                cost,
            }))
        }

        LogicalPlan::Limit(l) => {
            let input = physicalize(&l.input, ctx)?;
            let child_rows = input.rows();
            let rows = cardinality::limit_rows(l.limit, child_rows);
            let cost = cost::limit(l.offset, l.limit, ctx.config);
            Ok(PhysicalPlan::Limit(LimitOp {
                input: Box::new(input),
                limit: l.limit,
                offset: l.offset,
                rows,
                cost,
            }))
        }

        LogicalPlan::Window(w) => {
            let input = physicalize(&w.input, ctx)?;
            let rows = input.rows();
            let cost = cost::window(rows, w.items.len(), ctx.config);
            let schema = plan.schema();
            Ok(PhysicalPlan::Window(WindowOp {
                input: Box::new(input),
                items: w.items.clone(),
                schema,
                rows,
                cost,
            }))
        }

        LogicalPlan::SetOp(s) => {
            let left = physicalize(&s.left, ctx)?;
            let right = physicalize(&s.right, ctx)?;
            let left_rows = left.rows();
            let right_rows = right.rows();
            let rows = match s.kind {
                SetOpKind::Union => left_rows.saturating_add(right_rows),
                SetOpKind::Intersect => left_rows.min(right_rows),
                SetOpKind::Except => left_rows,
            };
            let cost = cost::set_op(left_rows, right_rows, ctx.config);
            Ok(PhysicalPlan::SetOp(PhysicalSetOp {
                kind: s.kind,
                left: Box::new(left),
                right: Box::new(right),
                rows,
                cost,
            }))
        }

        LogicalPlan::Dml(d) => {
            let source = d
                .source
                .as_deref()
                .map(|s| physicalize(s, ctx))
                .transpose()?
                .map(Box::new);
            let affected_rows = source.as_deref().map(PhysicalPlan::rows).unwrap_or(0);
            let cost = cost::dml(affected_rows, ctx.config);
            Ok(PhysicalPlan::Dml(PhysicalDml {
                kind: d.kind,
                target: d.target.clone(),
                source,
                cost,
            }))
        }
    }
}

fn physicalize_scan(ds: &DataSource, ctx: &mut RuleContext<'_>) -> PhysicalPlan {
    let rows = ctx.stats.row_count(&ds.table.name);
    let width = avg_row_width(&ds.table, ctx.stats);
    let (chosen_index, mut applied_hints) = resolve_index(ds, ctx);
    applied_hints.extend(ds.applied_hints.iter().cloned());
    let schema = ds.schema();
    let cost = cost::scan(rows, width, ctx.config);
    PhysicalPlan::Scan(Scan {
        table: ds.table.clone(),
        pushed_filters: ds.pushed_filters.clone(),
        pushed_sort: ds.pushed_topn.as_ref().map(|p| p.sort.clone()).unwrap_or_default(),
        pushed_limit: ds.pushed_topn.as_ref().map(|p| p.limit),
        pushed_offset: ds.pushed_topn.as_ref().map(|p| p.offset).unwrap_or(0),
        chosen_index,
        schema,
        rows,
        cost,
        applied_hints,
    })
}

fn avg_row_width(table: &TableMeta, stats: &StatsCache<'_>) -> f64 {
    match stats.get(&table.name) {
        Some(s) if !s.columns.is_empty() => table
            .columns
            .iter()
            .map(|c| s.column(&c.name).map(|cs| cs.average_width).unwrap_or(DEFAULT_COLUMN_WIDTH))
            .sum::<f64>()
            .max(1.0),
        _ => (table.columns.len().max(1) as f64) * DEFAULT_COLUMN_WIDTH,
    }
}

/// Index selection (spec §4.E priorities 1-4). Only `FORCE_INDEX` has
/// anywhere to land without an index-scan cost model (spec §4.B names no
/// per-index cost function): absent a forced index every scan stays a full
/// table scan, so `USE_INDEX`/`IGNORE_INDEX`/`ORDER_INDEX`/`NO_ORDER_INDEX`
/// are always recorded `NotApplicable` rather than silently ignored.
fn resolve_index(ds: &DataSource, ctx: &mut RuleContext<'_>) -> (Option<String>, Vec<String>) {
    let table = &ds.table.name;
    let mut applied_hints = Vec::new();

    if let Some(idx) = ctx.hints.index.force.get(table) {
        if ds.table.has_index(idx) && !ds.forbidden_indexes.contains(idx) {
            ctx.diagnostics.record(
                format!("FORCE_INDEX({table}, {idx})"),
                HintOutcome::Applied,
                "forced regardless of cost",
            );
            applied_hints.push("FORCE_INDEX".to_string());
            return (Some(idx.clone()), applied_hints);
        }
        ctx.diagnostics.record(
            format!("FORCE_INDEX({table}, {idx})"),
            HintOutcome::NotApplicable,
            format!("index `{idx}` does not exist on, or is forbidden on, `{table}`"),
        );
    }

    if ctx.hints.index.use_list.contains_key(table) {
        ctx.diagnostics.record(
            format!("USE_INDEX({table})"),
            HintOutcome::NotApplicable,
            "no cost-based index selection is performed without FORCE_INDEX; scan stays a full table scan",
        );
    }
    if ctx.hints.index.ignore.contains_key(table) {
        ctx.diagnostics.record(
            format!("IGNORE_INDEX({table})"),
            HintOutcome::NotApplicable,
            "no index was ever a candidate for this scan, so nothing to exclude",
        );
    }
    if ctx.hints.index.order_index.contains(table) {
        ctx.diagnostics.record(
            format!("ORDER_INDEX({table})"),
            HintOutcome::NotApplicable,
            "no index chosen for this scan",
        );
    }
    if ctx.hints.index.no_order_index.contains(table) {
        ctx.diagnostics.record(
            format!("NO_ORDER_INDEX({table})"),
            HintOutcome::NotApplicable,
            "no index chosen for this scan",
        );
    }

    (ds.chosen_index.clone(), applied_hints)
}

fn leaf_table_names(left: &LogicalPlan, right: &LogicalPlan) -> Vec<String> {
    estimator::collect_data_sources(left)
        .into_iter()
        .chain(estimator::collect_data_sources(right))
        .map(|ds| ds.table.name.clone())
        .collect()
}

fn join_algo_label(algo: JoinAlgo) -> &'static str {
    match algo {
        JoinAlgo::Hash => "HASH_JOIN",
        JoinAlgo::Merge => "MERGE_JOIN",
        JoinAlgo::IndexNestedLoop => "INL_JOIN",
        JoinAlgo::IndexNestedLoopHash => "INL_HASH_JOIN",
        JoinAlgo::IndexNestedLoopMerge => "INL_MERGE_JOIN",
    }
}

/// Join-algorithm resolution (spec §4.E priorities 3-5; priorities 1-2,
/// `LEADING`/`STRAIGHT_JOIN`, are table-ordering concerns already settled by
/// `JoinReorder` before the plan reaches physicalization).
fn resolve_join_algo(
    tables: &[String],
    left_rows: u64,
    right_rows: u64,
    ctx: &mut RuleContext<'_>,
) -> (JoinAlgo, Vec<String>) {
    let mut applied_hints = Vec::new();

    if let Some(algo) = ctx.hints.join_algo_for(tables) {
        let label = join_algo_label(algo);
        ctx.diagnostics.record(label, HintOutcome::Applied, format!("positive algorithm hint over {tables:?}"));
        applied_hints.push(label.to_string());
        return (algo, applied_hints);
    }

    let hash_forbidden = ctx.hints.is_algo_forbidden(tables, JoinAlgo::Hash);
    let merge_forbidden = ctx.hints.is_algo_forbidden(tables, JoinAlgo::Merge);
    if hash_forbidden {
        ctx.diagnostics.record("NO_HASH_JOIN", HintOutcome::Applied, format!("excluded over {tables:?}"));
    }
    if merge_forbidden {
        ctx.diagnostics.record("NO_MERGE_JOIN", HintOutcome::Applied, format!("excluded over {tables:?}"));
    }

    let algo = match (hash_forbidden, merge_forbidden) {
        (true, false) => JoinAlgo::Merge,
        (false, true) => JoinAlgo::Hash,
        // Both forbidden, or neither: fall back to cost, hash is still the
        // most conservative default when there is nothing left to compare.
        (true, true) => JoinAlgo::Hash,
        (false, false) => {
            let hash_cost = cost::hash_join(left_rows.min(right_rows), left_rows.max(right_rows), ctx.config);
            let merge_cost = cost::merge_join(left_rows, right_rows, ctx.config);
            if hash_cost.0 <= merge_cost.0 {
                JoinAlgo::Hash
            } else {
                JoinAlgo::Merge
            }
        }
    };
    (algo, applied_hints)
}

/// `stats::cost` names a cost function for `HashJoin` and `MergeJoin` only
/// (spec §4.B); the three index-nested-loop variants have no dedicated
/// formula, so they are costed via the algorithm they most resemble
/// (`IndexNestedLoopMerge` like a merge join over pre-ordered input,
/// the other two like a hash join), documented here rather than invented
/// silently.
fn join_cost(algo: JoinAlgo, left_rows: u64, right_rows: u64, config: &crate::config::OptimizerConfig) -> Cost {
    match algo {
        JoinAlgo::Hash | JoinAlgo::IndexNestedLoop | JoinAlgo::IndexNestedLoopHash => {
            cost::hash_join(left_rows.min(right_rows), left_rows.max(right_rows), config)
        }
        JoinAlgo::Merge | JoinAlgo::IndexNestedLoopMerge => cost::merge_join(left_rows, right_rows, config),
    }
}

fn join_build_side(algo: JoinAlgo, left_rows: u64, right_rows: u64) -> BuildSide {
    match algo {
        JoinAlgo::Hash | JoinAlgo::IndexNestedLoop | JoinAlgo::IndexNestedLoopHash => {
            if left_rows <= right_rows {
                BuildSide::Left
            } else {
                BuildSide::Right
            }
        }
        JoinAlgo::Merge | JoinAlgo::IndexNestedLoopMerge => BuildSide::NotApplicable,
    }
}

/// Aggregation-algorithm resolution (spec §4.E: `HASH_AGG` > `STREAM_AGG` >
/// `MPP_1PHASE_AGG` > `MPP_2PHASE_AGG`). `HintSet.agg_algo` is already the
/// single highest-priority flag (priority resolution among several raw
/// flags in the same statement is the binder's job, upstream of this
/// crate); an algorithm already committed on the logical node (unused by
/// any rule today, but part of the node's shape per spec §3) takes
/// precedence over a hint arriving late.
fn resolve_agg_algo(existing: Option<AggAlgo>, ctx: &mut RuleContext<'_>) -> (AggAlgo, Vec<String>) {
    if let Some(algo) = existing.or(ctx.hints.agg_algo) {
        ctx.diagnostics.record(algo.label(), HintOutcome::Applied, "aggregation algorithm hint");
        return (algo, vec![algo.label().to_string()]);
    }
    (AggAlgo::HashAgg, Vec::new())
}
