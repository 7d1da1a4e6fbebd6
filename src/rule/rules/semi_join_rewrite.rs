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

//! `SemiJoinRewrite` (spec §4.D): `EXISTS`/`IN`/`NOT EXISTS`/`NOT IN` bind
//! directly to a `Semi`/`AntiSemi` `Apply` — an existence check never needs
//! the general eight-strategy decorrelation `Decorrelate` runs for scalar
//! subqueries, since only row *presence* is observed, not any column of the
//! right side. Converting straight to a `Join` here is what lets
//! `JoinReorder` see these table sets at all (spec §4.D `JoinReorder` only
//! operates on an already-flattened `Join` chain).
//!
//! The rule-engine traversal (`RuleSet::apply_once`, spec §4.C step 2c)
//! already visits every child unconditionally, so two sibling `EXISTS`
//! subqueries under a shared parent both rewrite in the same pass (spec §8
//! property 2) without this file doing anything special to ensure it.

use crate::expr::Condition;
use crate::error::Result;
use crate::plan::logical::{Apply, Join, LogicalPlan};
use crate::rule::{Rule, RuleContext};
use crate::stats::cardinality::JoinKind;

#[derive(Clone)]
pub struct SemiJoinRewrite;

fn resolve_correlated(expr: &crate::expr::ExprNode) -> crate::expr::ExprNode {
    use crate::expr::ExprNode;
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

impl Rule for SemiJoinRewrite {
    fn name(&self) -> &'static str {
        "SemiJoinRewrite"
    }

    fn matches(&self, node: &LogicalPlan) -> bool {
        matches!(node, LogicalPlan::Apply(a) if matches!(a.kind, JoinKind::Semi | JoinKind::AntiSemi))
    }

    fn apply(&self, node: &LogicalPlan, _ctx: &mut RuleContext<'_>) -> Result<LogicalPlan> {
        let LogicalPlan::Apply(a) = node else {
            return Ok(node.clone());
        };
        Ok(LogicalPlan::Join(Join {
            kind: a.kind,
            left: a.left.clone(),
            right: a.right.clone(),
            condition: Condition {
                conjunctions: a.condition.conjunctions.iter().map(resolve_correlated).collect(),
            },
            applied_hints: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, DataType, TableMeta};
    use crate::config::OptimizerConfig;
    use crate::expr::{ExprNode, Op};
    use crate::hint::{HintDiagnostics, HintSet};
    use crate::plan::logical::{CorrelatedColumnRef, DataSource, Selection};
    use crate::rule::{RuleSet, MAX_ITERATIONS};
    use crate::stats::{NoStatistics, StatsCache};
    use std::sync::Arc;

    fn t(name: &str) -> crate::catalog::TableMetaRef {
        Arc::new(TableMeta::new(
            name,
            vec![ColumnMeta::new("a", DataType::Int64, false)],
            vec![],
        ))
    }

    fn ctx_parts() -> (StatsCache<'static>, HintSet, OptimizerConfig, HintDiagnostics) {
        (
            StatsCache::new(&NoStatistics),
            HintSet::none(),
            OptimizerConfig::default(),
            HintDiagnostics::default(),
        )
    }

    fn exists_apply(right_table: &str) -> LogicalPlan {
        LogicalPlan::Apply(Apply {
            kind: JoinKind::Semi,
            left: Box::new(LogicalPlan::DataSource(DataSource::new(t("outer")))),
            right: Box::new(LogicalPlan::Selection(Selection {
                input: Box::new(LogicalPlan::DataSource(DataSource::new(t(right_table)))),
                condition: Condition::with_expr(ExprNode::binary(
                    Op::Eq,
                    ExprNode::col("a"),
                    ExprNode::CorrelatedColumn {
                        name: "a".to_string(),
                        nesting_level: 0,
                    },
                )),
            })),
            condition: Condition::true_cond(),
            correlated_columns: vec![CorrelatedColumnRef {
                name: "a".to_string(),
                nesting_level: 0,
            }],
            right_max_one_row: false,
            materialize: false,
        })
    }

    #[test]
    fn rewrites_semi_apply_to_semi_join() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let node = exists_apply("inner1");
        assert!(SemiJoinRewrite.matches(&node));
        let rewritten = SemiJoinRewrite.apply(&node, &mut ctx).unwrap();
        assert!(matches!(rewritten, LogicalPlan::Join(j) if j.kind == JoinKind::Semi));
    }

    #[test]
    fn does_not_match_inner_apply() {
        let mut node = exists_apply("inner1");
        if let LogicalPlan::Apply(a) = &mut node {
            a.kind = JoinKind::Inner;
        }
        assert!(!SemiJoinRewrite.matches(&node));
    }

    #[test]
    fn sibling_exists_subqueries_both_rewrite_in_one_pass() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let parent = LogicalPlan::Join(Join {
            kind: JoinKind::Inner,
            left: Box::new(exists_apply("inner1")),
            right: Box::new(exists_apply("inner2")),
            condition: Condition::true_cond(),
            applied_hints: vec![],
        });
        let rule_set = RuleSet::new(vec![Box::new(SemiJoinRewrite)]);
        let rewritten = rule_set.apply(parent, &mut ctx, || false).unwrap();
        let LogicalPlan::Join(top) = rewritten else {
            panic!("expected top-level Join");
        };
        assert!(matches!(top.left.as_ref(), LogicalPlan::Join(j) if j.kind == JoinKind::Semi));
        assert!(matches!(top.right.as_ref(), LogicalPlan::Join(j) if j.kind == JoinKind::Semi));
    }

    #[test]
    fn applying_twice_is_idempotent_within_max_iterations() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let node = exists_apply("inner1");
        let rule_set = RuleSet::new(vec![Box::new(SemiJoinRewrite)]);
        let once = rule_set.clone().apply(node, &mut ctx, || false).unwrap();
        let twice = rule_set.apply(once.clone(), &mut ctx, || false).unwrap();
        assert_eq!(once, twice);
        assert!(MAX_ITERATIONS >= 1);
    }
}
