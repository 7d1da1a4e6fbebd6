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

//! `LimitPushdown` (spec §4.D): a plain `Limit` (no sort key, unlike
//! `TopN`) pushes through a `Projection` freely — row-wise projection
//! can't change which rows survive a count cutoff — and into a
//! `DataSource` as pushed-down state. Pushing through a `Selection` is
//! forbidden: the filtered row count is unknown ahead of evaluating the
//! filter, so cutting rows before it changes the result.

use crate::error::Result;
use crate::plan::logical::{DataSource, Limit, LogicalPlan, Projection, PushedTopN};
use crate::rule::{Rule, RuleContext};

#[derive(Clone)]
pub struct LimitPushdown;

impl Rule for LimitPushdown {
    fn name(&self) -> &'static str {
        "LimitPushdown"
    }

    fn matches(&self, node: &LogicalPlan) -> bool {
        matches!(node, LogicalPlan::Limit(l) if matches!(
            l.input.as_ref(),
            LogicalPlan::Projection(_) | LogicalPlan::DataSource(_)
        ))
    }

    fn apply(&self, node: &LogicalPlan, _ctx: &mut RuleContext<'_>) -> Result<LogicalPlan> {
        let LogicalPlan::Limit(l) = node else {
            return Ok(node.clone());
        };

        match l.input.as_ref() {
            LogicalPlan::DataSource(ds) if ds.pushed_topn.is_none() => {
                let mut ds = ds.clone();
                ds.pushed_topn = Some(PushedTopN {
                    sort: Vec::new(),
                    limit: l.limit,
                    offset: l.offset,
                });
                Ok(LogicalPlan::DataSource(ds))
            }
            LogicalPlan::Projection(p) => Ok(LogicalPlan::Projection(Projection {
                input: Box::new(LogicalPlan::Limit(Limit {
                    input: p.input.clone(),
                    limit: l.limit,
                    offset: l.offset,
                })),
                items: p.items.clone(),
            })),
            _ => Ok(node.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, DataType, TableMeta};
    use crate::config::OptimizerConfig;
    use crate::expr::ExprNode;
    use crate::hint::{HintDiagnostics, HintSet};
    use crate::plan::logical::{ProjectItem, Selection};
    use crate::stats::{NoStatistics, StatsCache};
    use std::sync::Arc;

    fn table() -> crate::catalog::TableMetaRef {
        Arc::new(TableMeta::new(
            "t",
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

    #[test]
    fn pushes_into_datasource_as_pushed_topn_with_no_sort() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let node = LogicalPlan::Limit(Limit {
            input: Box::new(LogicalPlan::DataSource(DataSource::new(table()))),
            limit: 10,
            offset: 0,
        });
        let rewritten = LimitPushdown.apply(&node, &mut ctx).unwrap();
        let LogicalPlan::DataSource(ds) = rewritten else {
            panic!("expected DataSource");
        };
        let pushed = ds.pushed_topn.unwrap();
        assert!(pushed.sort.is_empty());
        assert_eq!(pushed.limit, 10);
    }

    #[test]
    fn pushes_through_projection() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let node = LogicalPlan::Limit(Limit {
            input: Box::new(LogicalPlan::Projection(Projection {
                input: Box::new(LogicalPlan::DataSource(DataSource::new(table()))),
                items: vec![ProjectItem {
                    expr: ExprNode::col("a"),
                    alias: None,
                }],
            })),
            limit: 5,
            offset: 0,
        });
        let rewritten = LimitPushdown.apply(&node, &mut ctx).unwrap();
        let LogicalPlan::Projection(p) = rewritten else {
            panic!("expected Projection on top");
        };
        assert!(matches!(p.input.as_ref(), LogicalPlan::Limit(_)));
    }

    #[test]
    fn does_not_match_above_selection() {
        let node = LogicalPlan::Limit(Limit {
            input: Box::new(LogicalPlan::Selection(Selection {
                input: Box::new(LogicalPlan::DataSource(DataSource::new(table()))),
                condition: crate::expr::Condition::true_cond(),
            })),
            limit: 5,
            offset: 0,
        });
        assert!(!LimitPushdown.matches(&node));
    }
}
