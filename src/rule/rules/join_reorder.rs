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

//! `JoinReorder` (spec §4.D, §4.E): flattens a chain of `Inner` joins into
//! its leaves and a set of join predicates, then rebuilds a left-deep tree
//! ordered to minimize the sum of intermediate cardinalities — unless
//! `LEADING` or `STRAIGHT_JOIN` hints are present, which this rule honors
//! unconditionally ahead of any cost-based choice (spec §4.E priorities
//! 1-2). The connectivity graph between leaves is modeled with
//! `petgraph::UnGraph` so the greedy expansion can ask "does a predicate
//! connect the leaf I'm about to add to what I've already joined" in one
//! lookup rather than re-scanning the whole predicate list each step.

use std::collections::{BTreeSet, HashSet};

use petgraph::graph::{NodeIndex, UnGraph};

use crate::error::Result;
use crate::expr::{Condition, ExprNode};
use crate::hint::HintOutcome;
use crate::plan::logical::{DataSource, Join, LogicalPlan, Selection};
use crate::rule::{Rule, RuleContext};
use crate::stats::cardinality::{self, JoinKind};

#[derive(Clone)]
pub struct JoinReorder;

/// Recursively flatten an `Inner`-only join chain into its leaves and the
/// union of all join conditions along the spine.
fn flatten(plan: &LogicalPlan, leaves: &mut Vec<LogicalPlan>, conditions: &mut Vec<ExprNode>) {
    match plan {
        LogicalPlan::Join(j) if j.kind == JoinKind::Inner => {
            flatten(&j.left, leaves, conditions);
            flatten(&j.right, leaves, conditions);
            conditions.extend(j.condition.conjunctions.clone());
        }
        other => leaves.push(other.clone()),
    }
}

fn leaf_table_name(plan: &LogicalPlan) -> Option<String> {
    match plan {
        LogicalPlan::DataSource(ds) => Some(ds.table.name.clone()),
        LogicalPlan::Selection(s) => leaf_table_name(&s.input),
        _ => None,
    }
}

fn leaf_rows(plan: &LogicalPlan, ctx: &RuleContext<'_>) -> u64 {
    match plan {
        LogicalPlan::DataSource(ds) => ctx.stats.row_count(&ds.table.name),
        LogicalPlan::Selection(s) => leaf_rows(&s.input, ctx),
        _ => cardinality::data_source_default_rows(),
    }
}

/// Build the connectivity graph: one node per leaf, one edge per
/// condition that references columns from exactly two distinct leaves.
fn build_graph(
    leaves: &[LogicalPlan],
    conditions: &[ExprNode],
) -> (UnGraph<usize, Vec<ExprNode>>, Vec<NodeIndex>) {
    let mut graph = UnGraph::new_undirected();
    let nodes: Vec<NodeIndex> = (0..leaves.len()).map(|i| graph.add_node(i)).collect();
    let schemas: Vec<_> = leaves.iter().map(LogicalPlan::schema).collect();

    for cond in conditions {
        let cols = cond.referenced_columns();
        let touched: Vec<usize> = schemas
            .iter()
            .enumerate()
            .filter(|(_, s)| cols.iter().any(|c| s.contains(c)))
            .map(|(i, _)| i)
            .collect();
        if touched.len() == 2 {
            let (a, b) = (touched[0], touched[1]);
            if let Some(edge) = graph.find_edge(nodes[a], nodes[b]) {
                graph[edge].push(cond.clone());
            } else {
                graph.add_edge(nodes[a], nodes[b], vec![cond.clone()]);
            }
        }
    }
    (graph, nodes)
}

/// Greedily grow a left-deep order: start from the smallest leaf, then
/// repeatedly add whichever remaining leaf yields the smallest estimated
/// intermediate row count (connected leaves via the known join-size
/// formula, disconnected ones via a cross product), matching spec §4.B's
/// per-kind row formulas.
fn greedy_order(leaves: &[LogicalPlan], rows: &[u64], graph: &UnGraph<usize, Vec<ExprNode>>, nodes: &[NodeIndex]) -> Vec<usize> {
    let n = leaves.len();
    // `BTreeSet`, not `HashSet`: both this and the candidate scan below break
    // ties on estimated rows by iteration order, and a `BTreeSet` iterates
    // its elements in ascending order deterministically (lowest index first)
    // rather than `std`'s per-instance random `HashSet` seed, so ties always
    // resolve the same way across repeated `apply` calls (spec §8 property 1).
    let mut remaining: BTreeSet<usize> = (0..n).collect();
    let start = *remaining.iter().min_by_key(|&&i| rows[i]).unwrap();
    remaining.remove(&start);
    let mut order = vec![start];
    let mut current_rows = rows[start];

    while !remaining.is_empty() {
        let mut best: Option<(usize, u64)> = None;
        for &candidate in &remaining {
            let connected = order
                .iter()
                .any(|&o| graph.find_edge(nodes[o], nodes[candidate]).is_some());
            let estimated = if connected {
                cardinality::join_rows(JoinKind::Inner, current_rows, rows[candidate], None)
            } else {
                cardinality::join_rows(JoinKind::Cross, current_rows, rows[candidate], None)
            };
            if best.is_none_or_worse(estimated) {
                best = Some((candidate, estimated));
            }
        }
        let (chosen, new_rows) = best.expect("remaining is non-empty");
        order.push(chosen);
        remaining.remove(&chosen);
        current_rows = new_rows;
    }
    order
}

trait BestTracker {
    fn is_none_or_worse(&self, candidate_rows: u64) -> bool;
}

impl BestTracker for Option<(usize, u64)> {
    fn is_none_or_worse(&self, candidate_rows: u64) -> bool {
        match self {
            None => true,
            Some((_, best_rows)) => candidate_rows < *best_rows,
        }
    }
}

/// Rebuild a left-deep join tree over `order`, attaching whichever
/// conditions connect the newly added leaf to anything already joined
/// (found via the connectivity graph), falling back to `true` (a cross
/// join) when nothing connects them.
fn rebuild(
    leaves: Vec<LogicalPlan>,
    order: &[usize],
    graph: &UnGraph<usize, Vec<ExprNode>>,
    nodes: &[NodeIndex],
) -> LogicalPlan {
    let mut leaves: Vec<Option<LogicalPlan>> = leaves.into_iter().map(Some).collect();
    let mut current = leaves[order[0]].take().unwrap();
    let mut joined = vec![order[0]];

    for &next in &order[1..] {
        let mut conjuncts = Vec::new();
        for &already in &joined {
            if let Some(edge) = graph.find_edge(nodes[already], nodes[next]) {
                conjuncts.extend(graph[edge].clone());
            }
        }
        let right = leaves[next].take().unwrap();
        current = LogicalPlan::Join(Join {
            kind: JoinKind::Inner,
            left: Box::new(current),
            right: Box::new(right),
            condition: Condition {
                conjunctions: conjuncts,
            },
            applied_hints: Vec::new(),
        });
        joined.push(next);
    }
    current
}

impl Rule for JoinReorder {
    fn name(&self) -> &'static str {
        "JoinReorder"
    }

    fn matches(&self, node: &LogicalPlan) -> bool {
        match node {
            LogicalPlan::Join(j) if j.kind == JoinKind::Inner => {
                let mut leaves = Vec::new();
                let mut conds = Vec::new();
                flatten(node, &mut leaves, &mut conds);
                // Only worth reordering a chain of at least three leaves;
                // a plain two-table join has exactly one possible order.
                leaves.len() >= 3
            }
            _ => false,
        }
    }

    fn apply(&self, node: &LogicalPlan, ctx: &mut RuleContext<'_>) -> Result<LogicalPlan> {
        let LogicalPlan::Join(_) = node else {
            return Ok(node.clone());
        };
        let mut leaves = Vec::new();
        let mut conditions = Vec::new();
        flatten(node, &mut leaves, &mut conditions);

        let names: Vec<Option<String>> = leaves.iter().map(leaf_table_name).collect();

        if ctx.hints.join.straight_join {
            ctx.diagnostics.record(
                "STRAIGHT_JOIN",
                HintOutcome::Applied,
                "preserved left-deep order as written",
            );
            return Ok(node.clone());
        }

        if !ctx.hints.join.leading.is_empty() {
            let present: HashSet<&String> = names.iter().flatten().collect();
            let leading_set: HashSet<&String> = ctx.hints.join.leading.iter().collect();
            if leading_set.is_superset(&present) && present.len() == names.len() {
                let order: Vec<usize> = ctx
                    .hints
                    .join
                    .leading
                    .iter()
                    .filter_map(|name| names.iter().position(|n| n.as_ref() == Some(name)))
                    .collect();
                if order.len() == leaves.len() {
                    ctx.diagnostics
                        .record("LEADING", HintOutcome::Applied, "forced table order");
                    let (graph, nodes) = build_graph(&leaves, &conditions);
                    return Ok(rebuild(leaves, &order, &graph, &nodes));
                }
            }
            ctx.diagnostics.record(
                "LEADING",
                HintOutcome::NotApplicable,
                "leading set is not a superset of the involved tables",
            );
        }

        let rows: Vec<u64> = leaves.iter().map(|l| leaf_rows(l, ctx)).collect();
        let (graph, nodes) = build_graph(&leaves, &conditions);
        let order = greedy_order(&leaves, &rows, &graph, &nodes);
        Ok(rebuild(leaves, &order, &graph, &nodes))
    }
}
