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

//! `MaxMinElimination` (spec §4.D): `SELECT MAX(a) FROM t` (no `GROUP BY`)
//! needs only the single largest/smallest value of `a`, not a full
//! aggregation pass over every row. When `a` leads a known index, an
//! index-ordered scan can stop after the first row, so the rewrite to
//! `Sort + Limit 1` is only profitable in that case — without a
//! supporting index, a full-table `Sort` is strictly worse than the
//! single-pass `Aggregate` it would replace, so the rule leaves the plan
//! untouched (spec: "when an index-order pushdown would be cheaper;
//! otherwise leave").

use crate::error::Result;
use crate::plan::logical::{
    AggFunc, Aggregate, DataSource, Limit, LogicalPlan, ProjectItem, Projection, Selection,
    SortItem, TopN,
};
use crate::rule::{Rule, RuleContext};

#[derive(Clone)]
pub struct MaxMinElimination;

fn find_leading_index_source(plan: &LogicalPlan, column: &str) -> Option<&DataSource> {
    match plan {
        LogicalPlan::DataSource(ds) => ds
            .table
            .indexes
            .iter()
            .any(|idx| idx.columns.first().map(|c| c.as_str()) == Some(column))
            .then_some(ds),
        LogicalPlan::Selection(Selection { input, .. }) => find_leading_index_source(input, column),
        _ => None,
    }
}

impl Rule for MaxMinElimination {
    fn name(&self) -> &'static str {
        "MaxMinElimination"
    }

    fn matches(&self, node: &LogicalPlan) -> bool {
        let LogicalPlan::Aggregate(a) = node else {
            return false;
        };
        a.group_by.is_empty()
            && a.items.len() == 1
            && matches!(a.items[0].func, AggFunc::Max | AggFunc::Min)
            && a.items[0].arg.is_some()
    }

    fn apply(&self, node: &LogicalPlan, _ctx: &mut RuleContext<'_>) -> Result<LogicalPlan> {
        let LogicalPlan::Aggregate(a) = node else {
            return Ok(node.clone());
        };
        let item = &a.items[0];
        let Some(crate::expr::ExprNode::Column { name: column, .. }) = &item.arg else {
            return Ok(node.clone());
        };

        if find_leading_index_source(&a.input, column).is_none() {
            return Ok(node.clone());
        }

        let direction = match item.func {
            AggFunc::Max => crate::plan::logical::SortDirection::Desc,
            AggFunc::Min => crate::plan::logical::SortDirection::Asc,
            _ => unreachable!("matches() only admits Max/Min"),
        };

        Ok(LogicalPlan::Projection(Projection {
            input: Box::new(LogicalPlan::Limit(Limit {
                input: Box::new(LogicalPlan::TopN(TopN {
                    input: a.input.clone(),
                    items: vec![SortItem {
                        expr: item.arg.clone().unwrap(),
                        direction,
                    }],
                    limit: 1,
                    offset: 0,
                })),
                limit: 1,
                offset: 0,
            })),
            items: vec![ProjectItem {
                expr: crate::expr::ExprNode::col(column.clone()),
                alias: Some(item.name()),
            }],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, DataType, IndexMeta, TableMeta};
    use crate::config::OptimizerConfig;
    use crate::hint::{HintDiagnostics, HintSet};
    use crate::plan::logical::AggItem;
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

    fn table_with_index() -> crate::catalog::TableMetaRef {
        Arc::new(TableMeta::new(
            "t",
            vec![ColumnMeta::new("a", DataType::Int64, false)],
            vec![IndexMeta {
                name: "idx_a".to_string(),
                columns: vec!["a".to_string()],
            }],
        ))
    }

    fn table_without_index() -> crate::catalog::TableMetaRef {
        Arc::new(TableMeta::new(
            "t",
            vec![ColumnMeta::new("a", DataType::Int64, false)],
            vec![],
        ))
    }

    fn max_agg(table: crate::catalog::TableMetaRef) -> LogicalPlan {
        LogicalPlan::Aggregate(Aggregate {
            input: Box::new(LogicalPlan::DataSource(DataSource::new(table))),
            group_by: vec![],
            items: vec![AggItem {
                func: AggFunc::Max,
                arg: Some(crate::expr::ExprNode::col("a")),
                alias: None,
                distinct: false,
            }],
            algorithm: None,
            applied_hints: vec![],
        })
    }

    #[test]
    fn rewrites_to_sort_limit_when_index_available() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let node = max_agg(table_with_index());
        assert!(MaxMinElimination.matches(&node));
        let rewritten = MaxMinElimination.apply(&node, &mut ctx).unwrap();
        let LogicalPlan::Projection(p) = rewritten else {
            panic!("expected Projection wrapper");
        };
        assert!(matches!(p.input.as_ref(), LogicalPlan::Limit(_)));
    }

    #[test]
    fn leaves_plan_unchanged_without_supporting_index() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let node = max_agg(table_without_index());
        let rewritten = MaxMinElimination.apply(&node, &mut ctx).unwrap();
        assert_eq!(rewritten, node);
    }

    #[test]
    fn does_not_match_with_group_by() {
        let mut node = max_agg(table_with_index());
        if let LogicalPlan::Aggregate(a) = &mut node {
            a.group_by.push(crate::expr::ExprNode::col("a"));
        }
        assert!(!MaxMinElimination.matches(&node));
    }
}
