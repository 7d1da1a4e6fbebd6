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

//! `TopNPushdown` (spec §4.D): unlike plain `LimitPushdown`, a `TopN`
//! carries sort keys, so pushing it past a `Projection` is only sound
//! when every sort key references a column that exists unchanged in the
//! projection's own input (a computed expression could reorder rows in a
//! way the pushed-down sort wouldn't replicate). Pushing past a
//! `Selection` is never sound: the order of the filtered rows that
//! survive depends on the filter itself.

use crate::error::Result;
use crate::plan::logical::{DataSource, LogicalPlan, Projection, PushedTopN, TopN};
use crate::rule::{Rule, RuleContext};

#[derive(Clone)]
pub struct TopNPushdown;

impl Rule for TopNPushdown {
    fn name(&self) -> &'static str {
        "TopNPushdown"
    }

    fn matches(&self, node: &LogicalPlan) -> bool {
        matches!(node, LogicalPlan::TopN(t) if matches!(
            t.input.as_ref(),
            LogicalPlan::DataSource(_) | LogicalPlan::Projection(_)
        ))
    }

    fn apply(&self, node: &LogicalPlan, _ctx: &mut RuleContext<'_>) -> Result<LogicalPlan> {
        let LogicalPlan::TopN(t) = node else {
            return Ok(node.clone());
        };

        match t.input.as_ref() {
            LogicalPlan::DataSource(ds) if ds.pushed_topn.is_none() => {
                let mut ds = ds.clone();
                ds.pushed_topn = Some(PushedTopN {
                    sort: t.items.clone(),
                    limit: t.limit,
                    offset: t.offset,
                });
                Ok(LogicalPlan::DataSource(ds))
            }
            LogicalPlan::Projection(p) => {
                let child_schema = p.input.schema();
                let sort_cols_safe = t
                    .items
                    .iter()
                    .all(|item| item.expr.referenced_columns().iter().all(|c| child_schema.contains(c)));
                if !sort_cols_safe {
                    return Ok(node.clone());
                }
                Ok(LogicalPlan::Projection(Projection {
                    input: Box::new(LogicalPlan::TopN(TopN {
                        input: p.input.clone(),
                        items: t.items.clone(),
                        limit: t.limit,
                        offset: t.offset,
                    })),
                    items: p.items.clone(),
                }))
            }
            _ => Ok(node.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, DataType, TableMeta};
    use crate::config::OptimizerConfig;
    use crate::expr::{Condition, ExprNode};
    use crate::hint::{HintDiagnostics, HintSet};
    use crate::plan::logical::{ProjectItem, Selection, SortItem};
    use crate::stats::{NoStatistics, StatsCache};
    use std::sync::Arc;

    fn table() -> crate::catalog::TableMetaRef {
        Arc::new(TableMeta::new(
            "t",
            vec![
                ColumnMeta::new("a", DataType::Int64, false),
                ColumnMeta::new("b", DataType::Int64, false),
            ],
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

    #[test]
    fn pushes_sort_and_limit_into_datasource() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let node = LogicalPlan::TopN(TopN {
            input: Box::new(LogicalPlan::DataSource(DataSource::new(table()))),
            items: vec![SortItem::asc(ExprNode::col("a"))],
            limit: 10,
            offset: 0,
        });
        let rewritten = TopNPushdown.apply(&node, &mut ctx).unwrap();
        let LogicalPlan::DataSource(ds) = rewritten else {
            panic!("expected DataSource");
        };
        assert_eq!(ds.pushed_topn.unwrap().sort.len(), 1);
    }

    #[test]
    fn pushes_through_projection_when_sort_key_survives() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let node = LogicalPlan::TopN(TopN {
            input: Box::new(LogicalPlan::Projection(Projection {
                input: Box::new(LogicalPlan::DataSource(DataSource::new(table()))),
                items: vec![ProjectItem {
                    expr: ExprNode::col("a"),
                    alias: None,
                }],
            })),
            items: vec![SortItem::asc(ExprNode::col("a"))],
            limit: 10,
            offset: 0,
        });
        let rewritten = TopNPushdown.apply(&node, &mut ctx).unwrap();
        let LogicalPlan::Projection(p) = rewritten else {
            panic!("expected Projection on top");
        };
        assert!(matches!(p.input.as_ref(), LogicalPlan::TopN(_)));
    }

    #[test]
    fn does_not_push_through_selection() {
        let node = LogicalPlan::TopN(TopN {
            input: Box::new(LogicalPlan::Selection(Selection {
                input: Box::new(LogicalPlan::DataSource(DataSource::new(table()))),
                condition: Condition::true_cond(),
            })),
            items: vec![SortItem::asc(ExprNode::col("a"))],
            limit: 10,
            offset: 0,
        });
        assert!(!TopNPushdown.matches(&node));
    }
}
