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

//! `ConstantFolding` (spec §4.D): evaluate constant sub-expressions in any
//! node carrying expressions, and drop tautologies/contradictions from
//! `Selection` filters — `WHERE true` disappears, `WHERE false` makes the
//! `DataSource` beneath it produce an empty result (modeled as a
//! zero-estimated-row `Selection(false)` rather than a new plan variant,
//! since the algebra has no explicit "empty relation" node).

use crate::expr::fold::fold_tree;
use crate::expr::{Condition, ExprNode};
use crate::plan::logical::{Aggregate, LogicalPlan, Projection, Selection};
use crate::rule::{Rule, RuleContext};
use crate::error::Result;

#[derive(Clone)]
pub struct ConstantFolding;

impl Rule for ConstantFolding {
    fn name(&self) -> &'static str {
        "ConstantFolding"
    }

    fn matches(&self, node: &LogicalPlan) -> bool {
        matches!(
            node,
            LogicalPlan::Selection(_) | LogicalPlan::Projection(_) | LogicalPlan::Aggregate(_)
        )
    }

    fn apply(&self, node: &LogicalPlan, _ctx: &mut RuleContext<'_>) -> Result<LogicalPlan> {
        Ok(match node {
            LogicalPlan::Selection(s) => {
                let folded: Vec<ExprNode> = s
                    .condition
                    .conjunctions
                    .iter()
                    .map(fold_tree)
                    // A `true` conjunct contributes nothing to the
                    // conjunction and is dropped (eliminates `WHERE true`).
                    .filter(|e| !e.is_const_true())
                    .collect();
                let condition = if folded.iter().any(ExprNode::is_const_false) {
                    // A `false` conjunct makes the whole conjunction false
                    // regardless of the rest; collapse to a single
                    // contradiction rather than carrying dead conjuncts.
                    Condition {
                        conjunctions: vec![ExprNode::value(crate::expr::Literal::Bool(false))],
                    }
                } else {
                    Condition { conjunctions: folded }
                };
                LogicalPlan::Selection(Selection {
                    input: s.input.clone(),
                    condition,
                })
            }
            LogicalPlan::Projection(p) => LogicalPlan::Projection(Projection {
                input: p.input.clone(),
                items: p
                    .items
                    .iter()
                    .map(|item| crate::plan::logical::ProjectItem {
                        expr: fold_tree(&item.expr),
                        alias: item.alias.clone(),
                    })
                    .collect(),
            }),
            LogicalPlan::Aggregate(a) => LogicalPlan::Aggregate(Aggregate {
                input: a.input.clone(),
                group_by: a.group_by.iter().map(fold_tree).collect(),
                items: a
                    .items
                    .iter()
                    .map(|item| crate::plan::logical::AggItem {
                        func: item.func,
                        arg: item.arg.as_ref().map(fold_tree),
                        alias: item.alias.clone(),
                        distinct: item.distinct,
                    })
                    .collect(),
                algorithm: a.algorithm,
                applied_hints: a.applied_hints.clone(),
            }),
            other => other.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, DataType, TableMeta};
    use crate::config::OptimizerConfig;
    use crate::expr::{Literal, Op};
    use crate::hint::{HintDiagnostics, HintSet};
    use crate::plan::logical::DataSource;
    use crate::stats::{NoStatistics, StatsCache};
    use std::sync::Arc;

    fn ctx_parts() -> (StatsCache<'static>, HintSet, OptimizerConfig, HintDiagnostics) {
        (
            StatsCache::new(&NoStatistics),
            HintSet::none(),
            OptimizerConfig::default(),
            HintDiagnostics::default(),
        )
    }

    fn table() -> crate::catalog::TableMetaRef {
        Arc::new(TableMeta::new(
            "t",
            vec![ColumnMeta::new("a", DataType::Int64, false)],
            vec![],
        ))
    }

    #[test]
    fn drops_true_conjunct() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let input = LogicalPlan::DataSource(DataSource::new(table()));
        let node = LogicalPlan::Selection(Selection {
            input: Box::new(input),
            condition: Condition::with_expr(ExprNode::binary(
                Op::And,
                ExprNode::value(Literal::Bool(true)),
                ExprNode::binary(Op::Gt, ExprNode::col("a"), ExprNode::value(Literal::Int(5))),
            )),
        });
        let rewritten = ConstantFolding.apply(&node, &mut ctx).unwrap();
        let LogicalPlan::Selection(s) = rewritten else {
            panic!("expected Selection");
        };
        assert_eq!(s.condition.conjunctions.len(), 1);
    }

    #[test]
    fn contradiction_collapses_to_single_false_conjunct() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let input = LogicalPlan::DataSource(DataSource::new(table()));
        let node = LogicalPlan::Selection(Selection {
            input: Box::new(input),
            condition: Condition::with_expr(ExprNode::binary(
                Op::And,
                ExprNode::value(Literal::Bool(false)),
                ExprNode::binary(Op::Gt, ExprNode::col("a"), ExprNode::value(Literal::Int(5))),
            )),
        });
        let rewritten = ConstantFolding.apply(&node, &mut ctx).unwrap();
        let LogicalPlan::Selection(s) = rewritten else {
            panic!("expected Selection");
        };
        assert_eq!(s.condition.conjunctions, vec![ExprNode::value(Literal::Bool(false))]);
    }

    #[test]
    fn idempotent_on_already_folded_plan() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let input = LogicalPlan::DataSource(DataSource::new(table()));
        let node = LogicalPlan::Selection(Selection {
            input: Box::new(input),
            condition: Condition::with_expr(ExprNode::binary(
                Op::Gt,
                ExprNode::col("a"),
                ExprNode::value(Literal::Int(5)),
            )),
        });
        let once = ConstantFolding.apply(&node, &mut ctx).unwrap();
        let twice = ConstantFolding.apply(&once, &mut ctx).unwrap();
        assert_eq!(once, twice);
    }
}
