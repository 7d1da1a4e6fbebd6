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

//! `Decorrelate` (spec §4.D): eight strategies, tried in a fixed order, for
//! turning an `Apply` (a correlated subquery) into a plain `Join`. Each
//! strategy either strips one layer of correlation-specific structure or,
//! once the correlated-column set is empty, commits to `Join` outright
//! (the "uncorrelated" strategy). Because the fixpoint engine revisits
//! every rewritten node, the strategies compose across iterations: a
//! `Selection`-merge in one pass can make the node `Join`-eligible on the
//! next.

use crate::error::Result;
use crate::expr::{Condition, ExprNode};
use crate::plan::logical::{Aggregate, Apply, Join, Limit, LogicalPlan, Selection, Sort};
use crate::rule::{Rule, RuleContext};

#[derive(Clone)]
pub struct Decorrelate;

/// Resolve a nesting-level-0 correlated reference to a plain column: once
/// `Apply` becomes a `Join`, the outer value is simply the left schema's
/// own column (spec §3: "correlated columns... resolve to an enclosing
/// Apply's left child"). Level-1+ references belong to an Apply further
/// out and are left untouched here.
fn resolve_correlated(expr: &ExprNode) -> ExprNode {
    match expr {
        ExprNode::CorrelatedColumn { name, nesting_level: 0 } => ExprNode::Column {
            name: name.clone(),
            table: None,
        },
        ExprNode::Operator { op, left, right, args } => ExprNode::Operator {
            op: *op,
            left: left.as_deref().map(|e| Box::new(resolve_correlated(e))),
            right: right.as_deref().map(|e| Box::new(resolve_correlated(e))),
            args: args.iter().map(resolve_correlated).collect(),
        },
        ExprNode::Function { name, args } => ExprNode::Function {
            name: name.clone(),
            args: args.iter().map(resolve_correlated).collect(),
        },
        other => other.clone(),
    }
}

fn as_plain_join(a: &Apply) -> LogicalPlan {
    LogicalPlan::Join(Join {
        kind: a.kind,
        left: a.left.clone(),
        right: a.right.clone(),
        condition: Condition {
            conjunctions: a.condition.conjunctions.iter().map(resolve_correlated).collect(),
        },
        applied_hints: Vec::new(),
    })
}

impl Rule for Decorrelate {
    fn name(&self) -> &'static str {
        "Decorrelate"
    }

    fn matches(&self, node: &LogicalPlan) -> bool {
        matches!(node, LogicalPlan::Apply(_))
    }

    fn apply(&self, node: &LogicalPlan, _ctx: &mut RuleContext<'_>) -> Result<LogicalPlan> {
        let LogicalPlan::Apply(a) = node else {
            return Ok(node.clone());
        };

        // (1) prune: a condition that is trivially true contributes
        // nothing; the subquery degenerates to the outer rows alone.
        if a.condition.is_true() && a.correlated_columns.is_empty() {
            return Ok((*a.left).clone());
        }

        // (2) uncorrelated: nothing left to resolve against the outer
        // scope, so this is already an ordinary join.
        if a.correlated_columns.is_empty() {
            return Ok(as_plain_join(a));
        }

        // (3) selection-subquery: fold a Selection directly beneath Apply
        // into the Apply's own condition, resolving any correlated
        // references it carries.
        if let LogicalPlan::Selection(s) = a.right.as_ref() {
            let merged: Vec<ExprNode> = a
                .condition
                .conjunctions
                .iter()
                .cloned()
                .chain(s.condition.conjunctions.iter().map(resolve_correlated))
                .collect();
            let remaining_correlated: Vec<_> = a
                .correlated_columns
                .iter()
                .filter(|c| {
                    !s.condition
                        .conjunctions
                        .iter()
                        .any(|e| references_correlated(e, &c.name, c.nesting_level))
                })
                .cloned()
                .collect();
            return Ok(LogicalPlan::Apply(Apply {
                kind: a.kind,
                left: a.left.clone(),
                right: s.input.clone(),
                condition: Condition { conjunctions: merged },
                correlated_columns: remaining_correlated,
                right_max_one_row: a.right_max_one_row,
                materialize: a.materialize,
            }));
        }

        // (4) max-one-row: a LeftOuter join already tolerates a missing
        // right-side row, so the scalar-subquery cardinality guard is
        // redundant once the kind is fixed.
        if a.kind == crate::stats::cardinality::JoinKind::LeftOuter && a.right_max_one_row {
            return Ok(LogicalPlan::Apply(Apply {
                right_max_one_row: false,
                ..a.clone()
            }));
        }

        // (5) projection: resolve correlated references used inside a
        // Projection directly beneath Apply; they become ordinary column
        // reads once the join is in place.
        if let LogicalPlan::Projection(p) = a.right.as_ref() {
            let resolved_items: Vec<_> = p
                .items
                .iter()
                .map(|item| crate::plan::logical::ProjectItem {
                    expr: resolve_correlated(&item.expr),
                    alias: item.alias.clone(),
                })
                .collect();
            let remaining_correlated: Vec<_> = a
                .correlated_columns
                .iter()
                .filter(|c| {
                    !p.items
                        .iter()
                        .any(|item| references_correlated(&item.expr, &c.name, c.nesting_level))
                })
                .cloned()
                .collect();
            return Ok(LogicalPlan::Apply(Apply {
                kind: a.kind,
                left: a.left.clone(),
                right: Box::new(LogicalPlan::Projection(crate::plan::logical::Projection {
                    input: p.input.clone(),
                    items: resolved_items,
                })),
                condition: a.condition.clone(),
                correlated_columns: remaining_correlated,
                right_max_one_row: a.right_max_one_row,
                materialize: a.materialize,
            }));
        }

        // (6) limit: an EXISTS/IN existence check is unaffected by how
        // many matching rows the subquery would have produced.
        if matches!(
            a.kind,
            crate::stats::cardinality::JoinKind::Semi | crate::stats::cardinality::JoinKind::AntiSemi
        ) {
            if let LogicalPlan::Limit(Limit { input, .. }) = a.right.as_ref() {
                return Ok(LogicalPlan::Apply(Apply {
                    right: input.clone(),
                    ..a.clone()
                }));
            }
        }

        // (7) aggregation pull-up: every correlated reference is itself a
        // grouping key, so grouping by it after the join reproduces the
        // same per-outer-row result the correlated subquery computed.
        if let LogicalPlan::Aggregate(agg) = a.right.as_ref() {
            let all_in_group_by = a.correlated_columns.iter().all(|c| {
                agg.group_by.iter().any(|e| {
                    matches!(e, ExprNode::CorrelatedColumn { name, nesting_level } if name == &c.name && *nesting_level == c.nesting_level)
                })
            });
            if all_in_group_by {
                let join = LogicalPlan::Join(Join {
                    kind: crate::stats::cardinality::JoinKind::LeftOuter,
                    left: a.left.clone(),
                    right: agg.input.clone(),
                    condition: Condition {
                        conjunctions: a.condition.conjunctions.iter().map(resolve_correlated).collect(),
                    },
                    applied_hints: Vec::new(),
                });
                return Ok(LogicalPlan::Aggregate(Aggregate {
                    input: Box::new(join),
                    group_by: agg.group_by.iter().map(resolve_correlated).collect(),
                    items: agg
                        .items
                        .iter()
                        .map(|item| crate::plan::logical::AggItem {
                            func: item.func,
                            arg: item.arg.as_ref().map(resolve_correlated),
                            alias: item.alias.clone(),
                            distinct: item.distinct,
                        })
                        .collect(),
                    algorithm: agg.algorithm,
                    applied_hints: agg.applied_hints.clone(),
                }));
            }
        }

        // (8) sort: ordering inside a subquery that isn't itself bounded
        // by a Limit can never be observed outside it.
        if let LogicalPlan::Sort(Sort { input, .. }) = a.right.as_ref() {
            return Ok(LogicalPlan::Apply(Apply {
                right: input.clone(),
                ..a.clone()
            }));
        }

        Ok(node.clone())
    }
}

fn references_correlated(expr: &ExprNode, name: &str, nesting_level: usize) -> bool {
    match expr {
        ExprNode::CorrelatedColumn {
            name: n,
            nesting_level: l,
        } => n == name && *l == nesting_level,
        ExprNode::Operator { left, right, args, .. } => {
            left.as_deref().is_some_and(|e| references_correlated(e, name, nesting_level))
                || right.as_deref().is_some_and(|e| references_correlated(e, name, nesting_level))
                || args.iter().any(|a| references_correlated(a, name, nesting_level))
        }
        ExprNode::Function { args, .. } => args.iter().any(|a| references_correlated(a, name, nesting_level)),
        _ => false,
    }
}
