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

//! The single entry point (spec §4.G): [`Optimizer::optimize`] turns a
//! [`Statement`] into a cached, hint-aware [`PhysicalPlan`]. Staged the way
//! the teacher's `PlanRoot::gen_optimized_logical_plan` runs a fixed
//! sequence of passes over one statement (`optimizer/mod.rs`): build an
//! initial plan, rewrite it, physicalize it, remember it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, instrument, trace, warn};

use crate::cache::PlanCache;
use crate::catalog::{CatalogProvider, ColumnMeta, TableMeta, TableMetaRef};
use crate::config::OptimizerConfig;
use crate::error::{OptimizerError, Result};
use crate::expr::{Condition, ExprNode};
use crate::hint::{HintDiagnostics, HintSet};
use crate::plan::fingerprint::fingerprint_statement;
use crate::plan::logical::{
    AggFunc, AggItem, Aggregate, DataSource, Dml, Join, Limit, LogicalPlan, ProjectItem,
    Projection, Selection, Sort, SortItem,
};
use crate::plan::physical::PhysicalPlan;
use crate::plan::schema::Schema;
use crate::rule::context::RuleContext;
use crate::rule::rules::{self, standard_rule_set};
use crate::rule::{physicalize, RuleSet, MAX_ITERATIONS};
use crate::stats::{StatisticsProvider, StatsCache};
use crate::stmt::{DmlStmt, SelectItem, SelectStmt, Statement};

/// The table name a no-`FROM` `SELECT` is planned against (spec.md's data
/// model has no "values"/"one-row" primitive to spare; see `DESIGN.md`).
const DUAL_TABLE: &str = "__dual__";

/// A cheap, cloneable cancellation handle (spec §5 "Cancellation...
/// checked at each rule-engine iteration boundary"). A caller holds one
/// side, calls [`Self::cancel`] from wherever it observes a timeout or a
/// client disconnect, and passes `|| token.is_cancelled()` (or
/// [`Optimizer::optimize_with_token`]) into the optimizer. Plain
/// `Arc<AtomicBool>`, matching the monotonic/no-wall-clock discipline the
/// rest of this crate uses for timing (`cache`'s `Instant`-based staleness
/// check, not a calendar clock).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What [`Optimizer::optimize`] produced for one statement. `Create`/`Drop`/
/// `Alter`/`Show` never reach the rule engine at all (spec §1 "SHOW/DDL
/// passthrough" is out of scope) — they come back as [`Outcome::Passthrough`]
/// rather than an error, since passing them on to the external DDL/session
/// layer is itself the correct outcome, not a failure of this crate.
#[derive(Debug)]
pub enum Outcome {
    Passthrough,
    Optimized(OptimizedPlan),
}

#[derive(Debug, Clone)]
pub struct OptimizedPlan {
    pub plan: Arc<PhysicalPlan>,
    pub diagnostics: Arc<HintDiagnostics>,
    /// The plan-cache key this result was stored (or found) under; pass it
    /// back to [`PlanCache::update_cost`] once the execution engine reports
    /// an observed cost.
    pub fingerprint: u64,
    pub cache_hit: bool,
}

/// The optimizer core's single entry point (spec §4.G). Stateless beyond the
/// fixed [`RuleSet`] it runs to fixpoint; every other collaborator (catalog,
/// statistics, hints, config, cache) is passed in per call rather than held,
/// matching [`crate::rule::context::RuleContext`]'s own "injected, not a
/// singleton" discipline (spec §9 "Global state").
#[derive(Clone)]
pub struct Optimizer {
    rule_set: RuleSet,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    pub fn new() -> Self {
        Self {
            rule_set: standard_rule_set(),
        }
    }

    /// Run the full pipeline in spec §4.G: passthrough/rejection checks,
    /// cache lookup, initial-plan construction (step 3a), subquery
    /// materialization tagging, the fixpoint rule engine (step 3b),
    /// physicalization (step 3c), and cache insertion.
    #[instrument(skip_all)]
    pub fn optimize(
        &self,
        stmt: &Statement,
        catalog: &dyn CatalogProvider,
        stats: &dyn StatisticsProvider,
        config: &OptimizerConfig,
        cache: &PlanCache,
        mut cancelled: impl FnMut() -> bool,
    ) -> Result<Outcome> {
        if stmt.is_ddl_passthrough() {
            trace!("statement is DDL/SHOW passthrough, skipping the rule engine");
            return Ok(Outcome::Passthrough);
        }
        if let Some(schema) = stmt.targets_information_schema() {
            return Err(OptimizerError::WriteToReadOnlyVirtualSchema(schema.to_string()));
        }

        let fingerprint = fingerprint_statement(stmt);
        if let Some(plan) = cache.get(fingerprint) {
            debug!(fingerprint, "plan cache hit");
            return Ok(Outcome::Optimized(OptimizedPlan {
                plan,
                diagnostics: Arc::new(HintDiagnostics::default()),
                fingerprint,
                cache_hit: true,
            }));
        }
        debug!(fingerprint, "plan cache miss, running the rule engine");

        if cancelled() {
            return Err(OptimizerError::Cancelled);
        }

        let hints = hints_of(stmt);
        let initial = build_initial_plan(stmt, catalog)?;
        let tagged = rules::materialize_repeated_subqueries(&initial);

        let stats_cache = StatsCache::new(stats);
        let mut diagnostics = HintDiagnostics::default();
        let mut ctx = RuleContext::new(&stats_cache, &hints, &mut diagnostics, config);

        let (rewritten, rule_stats) = self.rule_set.apply_with_stats(tagged, &mut ctx, &mut cancelled)?;
        if rule_stats.guard_hit {
            warn!(
                fingerprint,
                iterations = rule_stats.iterations,
                rules_fired = rule_stats.rules_fired,
                "rule engine exhausted MAX_ITERATIONS ({}) without reaching a fixpoint",
                MAX_ITERATIONS
            );
        } else if rule_stats.iterations + 1 >= MAX_ITERATIONS {
            debug!(
                fingerprint,
                iterations = rule_stats.iterations,
                "rule engine nearly exhausted its iteration guard"
            );
        }
        if cancelled() {
            return Err(OptimizerError::Cancelled);
        }
        let physical = physicalize(&rewritten, &mut ctx)?;

        let plan = cache.put(fingerprint, physical);
        Ok(Outcome::Optimized(OptimizedPlan {
            plan,
            diagnostics: Arc::new(diagnostics),
            fingerprint,
            cache_hit: false,
        }))
    }

    /// Convenience wrapper over [`Self::optimize`] for callers that prefer a
    /// shareable [`CancellationToken`] handle over a raw closure.
    pub fn optimize_with_token(
        &self,
        stmt: &Statement,
        catalog: &dyn CatalogProvider,
        stats: &dyn StatisticsProvider,
        config: &OptimizerConfig,
        cache: &PlanCache,
        token: &CancellationToken,
    ) -> Result<Outcome> {
        self.optimize(stmt, catalog, stats, config, cache, || token.is_cancelled())
    }
}

fn hints_of(stmt: &Statement) -> HintSet {
    match stmt {
        Statement::Select(s) => s.hints.clone().unwrap_or_else(HintSet::none),
        Statement::Dml(d) => d
            .source
            .as_ref()
            .and_then(|s| s.hints.clone())
            .unwrap_or_else(HintSet::none),
        _ => HintSet::none(),
    }
}

fn build_initial_plan(stmt: &Statement, catalog: &dyn CatalogProvider) -> Result<LogicalPlan> {
    match stmt {
        Statement::Select(s) => build_select_plan(s, catalog),
        Statement::Dml(d) => build_dml_plan(d, catalog),
        _ => unreachable!("DDL passthrough is handled before build_initial_plan is called"),
    }
}

fn dual_table() -> TableMetaRef {
    Arc::new(TableMeta::new(DUAL_TABLE, Vec::<ColumnMeta>::new(), vec![]))
}

fn resolve_table(name: &str, catalog: &dyn CatalogProvider) -> Result<TableMetaRef> {
    catalog
        .get_table(name)
        .ok_or_else(|| OptimizerError::UnknownTable(name.to_string()))
}

/// Build the step-3a chain documented on [`SelectStmt`]: `DataSource(s) ->
/// Join -> Selection(where) -> Aggregate(group+agg) -> Selection(having) ->
/// Projection(select list) -> Sort(order-by) -> Limit`.
fn build_select_plan(stmt: &SelectStmt, catalog: &dyn CatalogProvider) -> Result<LogicalPlan> {
    let mut plan = match &stmt.from {
        Some(name) => LogicalPlan::DataSource(DataSource::new(resolve_table(name, catalog)?)),
        None => LogicalPlan::DataSource(DataSource::new(dual_table())),
    };

    for join in &stmt.joins {
        let right = LogicalPlan::DataSource(DataSource::new(resolve_table(&join.table, catalog)?));
        let condition = match &join.on {
            Some(expr) => Condition::with_expr(expr.clone()),
            None => Condition::true_cond(),
        };
        plan = LogicalPlan::Join(Join {
            kind: join.kind.into(),
            left: Box::new(plan),
            right: Box::new(right),
            condition,
            applied_hints: Vec::new(),
        });
    }

    if let Some(where_expr) = &stmt.where_clause {
        plan = LogicalPlan::Selection(Selection {
            input: Box::new(plan),
            condition: Condition::with_expr(where_expr.clone()),
        });
    }

    // Approximate what a real SQL binder does: fold every aggregate-function
    // call found in the projection/having expressions into a deduplicated
    // `Aggregate` item list, then rewrite those subexpressions into column
    // references against the aggregate's output (`rewrite_post_agg`). This
    // does not model `DISTINCT` inside an aggregate argument — `ExprNode`
    // has no such flag, and none of the statements this crate is exercised
    // against need it.
    let mut agg_items: Vec<AggItem> = Vec::new();
    for item in &stmt.projection {
        if let SelectItem::Expr { expr, .. } = item {
            collect_aggregates(expr, &mut agg_items);
        }
    }
    if let Some(having) = &stmt.having {
        collect_aggregates(having, &mut agg_items);
    }

    let is_aggregated = !stmt.group_by.is_empty() || !agg_items.is_empty();
    if is_aggregated {
        plan = LogicalPlan::Aggregate(Aggregate {
            input: Box::new(plan),
            group_by: stmt.group_by.clone(),
            items: agg_items.clone(),
            algorithm: None,
            applied_hints: Vec::new(),
        });
    }

    if let Some(having) = &stmt.having {
        let rewritten = rewrite_post_agg(having, &agg_items);
        plan = LogicalPlan::Selection(Selection {
            input: Box::new(plan),
            condition: Condition::with_expr(rewritten),
        });
    }

    let input_schema = plan.schema();
    plan = LogicalPlan::Projection(Projection {
        input: Box::new(plan),
        items: build_projection_items(&stmt.projection, &input_schema, &agg_items),
    });

    if !stmt.order_by.is_empty() {
        plan = LogicalPlan::Sort(Sort {
            input: Box::new(plan),
            items: stmt
                .order_by
                .iter()
                .map(|o| SortItem {
                    expr: o.expr.clone(),
                    direction: o.direction.into(),
                })
                .collect(),
        });
    }

    if stmt.limit.is_some() || stmt.offset.is_some() {
        plan = LogicalPlan::Limit(Limit {
            input: Box::new(plan),
            limit: stmt.limit.unwrap_or(u64::MAX),
            offset: stmt.offset.unwrap_or(0),
        });
    }

    Ok(plan)
}

fn build_dml_plan(stmt: &DmlStmt, catalog: &dyn CatalogProvider) -> Result<LogicalPlan> {
    let target = resolve_table(&stmt.table, catalog)?;
    let source = match &stmt.source {
        Some(select) => Some(Box::new(build_select_plan(select, catalog)?)),
        None => None,
    };
    Ok(LogicalPlan::Dml(Dml {
        kind: stmt.kind.into(),
        target,
        source,
    }))
}

fn build_projection_items(
    items: &[SelectItem],
    input_schema: &Schema,
    agg_items: &[AggItem],
) -> Vec<ProjectItem> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            SelectItem::Wildcard => {
                for field in &input_schema.fields {
                    out.push(ProjectItem {
                        expr: ExprNode::col(field.name.clone()),
                        alias: None,
                    });
                }
            }
            SelectItem::Expr { expr, alias } => out.push(ProjectItem {
                expr: rewrite_post_agg(expr, agg_items),
                alias: alias.clone(),
            }),
        }
    }
    out
}

fn agg_func_named(name: &str) -> Option<AggFunc> {
    match name.to_ascii_lowercase().as_str() {
        "count" => Some(AggFunc::Count),
        "sum" => Some(AggFunc::Sum),
        "avg" => Some(AggFunc::Avg),
        "min" => Some(AggFunc::Min),
        "max" => Some(AggFunc::Max),
        _ => None,
    }
}

/// Recursively collect every distinct aggregate-function call in `expr` into
/// `out`, so `SUM(x) + 1` and a bare `SUM(x)` reference the same `AggItem`.
fn collect_aggregates(expr: &ExprNode, out: &mut Vec<AggItem>) {
    match expr {
        ExprNode::Function { name, args } => {
            if let Some(func) = agg_func_named(name) {
                let arg = args.first().cloned();
                if !out.iter().any(|item| item.func == func && item.arg == arg) {
                    out.push(AggItem {
                        func,
                        arg,
                        alias: None,
                        distinct: false,
                    });
                }
            } else {
                for a in args {
                    collect_aggregates(a, out);
                }
            }
        }
        ExprNode::Operator { left, right, args, .. } => {
            if let Some(l) = left {
                collect_aggregates(l, out);
            }
            if let Some(r) = right {
                collect_aggregates(r, out);
            }
            for a in args {
                collect_aggregates(a, out);
            }
        }
        ExprNode::Column { .. } | ExprNode::CorrelatedColumn { .. } | ExprNode::Value(_) => {}
    }
}

/// Rewrite every aggregate-function subexpression in `expr` into a reference
/// to its `Aggregate` output column, leaving everything else untouched.
fn rewrite_post_agg(expr: &ExprNode, agg_items: &[AggItem]) -> ExprNode {
    if let ExprNode::Function { name, args } = expr {
        if let Some(func) = agg_func_named(name) {
            let arg = args.first().cloned();
            if let Some(item) = agg_items.iter().find(|i| i.func == func && i.arg == arg) {
                return ExprNode::col(item.name());
            }
        }
    }
    match expr {
        ExprNode::Operator { op, left, right, args } => ExprNode::Operator {
            op: *op,
            left: left.as_deref().map(|e| Box::new(rewrite_post_agg(e, agg_items))),
            right: right.as_deref().map(|e| Box::new(rewrite_post_agg(e, agg_items))),
            args: args.iter().map(|a| rewrite_post_agg(a, agg_items)).collect(),
        },
        ExprNode::Function { name, args } => ExprNode::Function {
            name: name.clone(),
            args: args.iter().map(|a| rewrite_post_agg(a, agg_items)).collect(),
        },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DataType as Ty, StaticCatalog};
    use crate::expr::{Literal, Op};
    use crate::stats::NoStatistics;
    use crate::stmt::{DmlTarget, JoinClause, JoinKind as StmtJoinKind, OrderByItem, OrderDirection};

    fn users_orders_catalog() -> StaticCatalog {
        StaticCatalog::new()
            .with_table(Arc::new(TableMeta::new(
                "users",
                vec![
                    ColumnMeta::new("id", Ty::Int64, false),
                    ColumnMeta::new("name", Ty::Varchar, true),
                ],
                vec![],
            )))
            .with_table(Arc::new(TableMeta::new(
                "orders",
                vec![
                    ColumnMeta::new("id", Ty::Int64, false),
                    ColumnMeta::new("user_id", Ty::Int64, false),
                    ColumnMeta::new("amount", Ty::Float64, false),
                ],
                vec![],
            )))
    }

    fn select_star(from: &str) -> Statement {
        Statement::Select(SelectStmt {
            from: Some(from.to_string()),
            projection: vec![SelectItem::Wildcard],
            ..Default::default()
        })
    }

    #[test]
    fn simple_select_star_optimizes_to_a_scan() {
        let catalog = users_orders_catalog();
        let optimizer = Optimizer::new();
        let cache = PlanCache::new(8);
        let stmt = select_star("users");

        let outcome = optimizer
            .optimize(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, || false)
            .unwrap();

        let Outcome::Optimized(result) = outcome else {
            panic!("expected Optimized");
        };
        assert!(!result.cache_hit);
        assert!(matches!(result.plan.as_ref(), PhysicalPlan::Scan(_) | PhysicalPlan::Project(_)));
    }

    #[test]
    fn identical_statement_hits_the_cache_on_the_second_call() {
        let catalog = users_orders_catalog();
        let optimizer = Optimizer::new();
        let cache = PlanCache::new(8);
        let stmt = select_star("users");

        let first = optimizer
            .optimize(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, || false)
            .unwrap();
        let second = optimizer
            .optimize(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, || false)
            .unwrap();

        let Outcome::Optimized(first) = first else { panic!("expected Optimized") };
        let Outcome::Optimized(second) = second else { panic!("expected Optimized") };
        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert!(Arc::ptr_eq(&first.plan, &second.plan));
    }

    #[test]
    fn unknown_table_is_rejected() {
        let catalog = StaticCatalog::new();
        let optimizer = Optimizer::new();
        let cache = PlanCache::new(8);
        let stmt = select_star("missing");

        let err = optimizer
            .optimize(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, || false)
            .unwrap_err();
        assert_eq!(err, OptimizerError::UnknownTable("missing".to_string()));
    }

    #[test]
    fn ddl_statement_passes_through_untouched() {
        let catalog = StaticCatalog::new();
        let optimizer = Optimizer::new();
        let cache = PlanCache::new(8);
        let stmt = Statement::Create("CREATE TABLE t (id INT)".to_string());

        let outcome = optimizer
            .optimize(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, || false)
            .unwrap();
        assert!(matches!(outcome, Outcome::Passthrough));
    }

    #[test]
    fn write_to_information_schema_is_rejected() {
        let catalog = StaticCatalog::new();
        let optimizer = Optimizer::new();
        let cache = PlanCache::new(8);
        let stmt = Statement::Dml(DmlStmt {
            kind: DmlTarget::Delete,
            table: "information_schema.tables".to_string(),
            source: None,
        });

        let err = optimizer
            .optimize(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, || false)
            .unwrap_err();
        assert_eq!(
            err,
            OptimizerError::WriteToReadOnlyVirtualSchema("information_schema.tables".to_string())
        );
    }

    #[test]
    fn cancellation_before_the_rule_engine_starts_is_observed() {
        let catalog = users_orders_catalog();
        let optimizer = Optimizer::new();
        let cache = PlanCache::new(8);
        let stmt = select_star("users");

        let err = optimizer
            .optimize(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, || true)
            .unwrap_err();
        assert_eq!(err, OptimizerError::Cancelled);
    }

    #[test]
    fn group_by_with_aggregate_builds_an_aggregate_node() {
        let catalog = users_orders_catalog();
        let optimizer = Optimizer::new();
        let cache = PlanCache::new(8);

        let stmt = Statement::Select(SelectStmt {
            from: Some("orders".to_string()),
            projection: vec![
                SelectItem::Expr {
                    expr: ExprNode::col("user_id"),
                    alias: None,
                },
                SelectItem::Expr {
                    expr: ExprNode::Function {
                        name: "sum".to_string(),
                        args: vec![ExprNode::col("amount")],
                    },
                    alias: Some("total".to_string()),
                },
            ],
            group_by: vec![ExprNode::col("user_id")],
            ..Default::default()
        });

        let outcome = optimizer
            .optimize(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, || false)
            .unwrap();
        let Outcome::Optimized(result) = outcome else {
            panic!("expected Optimized");
        };
        assert!(result.plan.schema().contains("total"));
    }

    #[test]
    fn join_select_with_where_and_order_by_and_limit_optimizes() {
        let catalog = users_orders_catalog();
        let optimizer = Optimizer::new();
        let cache = PlanCache::new(8);

        let stmt = Statement::Select(SelectStmt {
            from: Some("users".to_string()),
            projection: vec![SelectItem::Wildcard],
            joins: vec![JoinClause {
                kind: StmtJoinKind::Inner,
                table: "orders".to_string(),
                on: Some(ExprNode::binary(
                    Op::Eq,
                    ExprNode::col("id"),
                    ExprNode::col("user_id"),
                )),
            }],
            where_clause: Some(ExprNode::binary(
                Op::Gt,
                ExprNode::col("amount"),
                ExprNode::value(Literal::Int(100)),
            )),
            order_by: vec![OrderByItem {
                expr: ExprNode::col("id"),
                direction: OrderDirection::Asc,
            }],
            limit: Some(10),
            ..Default::default()
        });

        let outcome = optimizer
            .optimize(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, || false)
            .unwrap();
        assert!(matches!(outcome, Outcome::Optimized(_)));
    }

    #[test]
    fn constant_only_select_with_no_from_uses_the_dual_table() {
        let catalog = StaticCatalog::new();
        let optimizer = Optimizer::new();
        let cache = PlanCache::new(8);

        let stmt = Statement::Select(SelectStmt {
            from: None,
            projection: vec![SelectItem::Expr {
                expr: ExprNode::value(Literal::Int(1)),
                alias: Some("one".to_string()),
            }],
            ..Default::default()
        });

        let outcome = optimizer
            .optimize(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, || false)
            .unwrap();
        let Outcome::Optimized(result) = outcome else {
            panic!("expected Optimized");
        };
        assert!(result.plan.schema().contains("one"));
    }

    #[test]
    fn cancellation_token_cancelled_before_the_call_is_observed() {
        let catalog = users_orders_catalog();
        let optimizer = Optimizer::new();
        let cache = PlanCache::new(8);
        let stmt = select_star("users");
        let token = CancellationToken::new();
        token.cancel();

        let err = optimizer
            .optimize_with_token(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, &token)
            .unwrap_err();
        assert_eq!(err, OptimizerError::Cancelled);
    }

    #[test]
    fn cancellation_token_left_uncancelled_optimizes_normally() {
        let catalog = users_orders_catalog();
        let optimizer = Optimizer::new();
        let cache = PlanCache::new(8);
        let stmt = select_star("users");
        let token = CancellationToken::new();

        let outcome = optimizer
            .optimize_with_token(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, &token)
            .unwrap();
        assert!(matches!(outcome, Outcome::Optimized(_)));
    }

    #[test]
    fn insert_select_dml_resolves_both_tables() {
        let catalog = users_orders_catalog();
        let optimizer = Optimizer::new();
        let cache = PlanCache::new(8);

        let stmt = Statement::Dml(DmlStmt {
            kind: DmlTarget::Insert,
            table: "orders".to_string(),
            source: Some(Box::new(SelectStmt {
                from: Some("users".to_string()),
                projection: vec![SelectItem::Wildcard],
                ..Default::default()
            })),
        });

        let outcome = optimizer
            .optimize(&stmt, &catalog, &NoStatistics, &OptimizerConfig::default(), &cache, || false)
            .unwrap();
        assert!(matches!(outcome, Outcome::Optimized(_)));
    }
}
