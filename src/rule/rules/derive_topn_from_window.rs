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

//! `DeriveTopNFromWindow` (spec §4.D): `Limit(N)` directly above a
//! `Window` whose only item is `ROW_NUMBER() OVER (ORDER BY K)` (optionally
//! with one `Projection` in between) is exactly the "top N rows per
//! ordering" idiom, which `TopN` already expresses without materializing
//! a row-number column. `RANK`/`DENSE_RANK` are excluded: ties rank
//! identically under them but `TopN` has no notion of ties, so the
//! rewrite would silently change which rows are returned.

use crate::error::Result;
use crate::plan::logical::{Limit, LogicalPlan, Projection, TopN, Window, WindowItem};
use crate::rule::{Rule, RuleContext};

#[derive(Clone)]
pub struct DeriveTopNFromWindow;

fn row_number_order(window: &Window) -> Option<&WindowItem> {
    match window.items.as_slice() {
        [item] if item.is_row_number() && !item.order_by.is_empty() => Some(item),
        _ => None,
    }
}

impl Rule for DeriveTopNFromWindow {
    fn name(&self) -> &'static str {
        "DeriveTopNFromWindow"
    }

    fn matches(&self, node: &LogicalPlan) -> bool {
        let LogicalPlan::Limit(l) = node else {
            return false;
        };
        match l.input.as_ref() {
            LogicalPlan::Window(w) => row_number_order(w).is_some(),
            LogicalPlan::Projection(p) => matches!(
                p.input.as_ref(),
                LogicalPlan::Window(w) if row_number_order(w).is_some()
            ),
            _ => false,
        }
    }

    fn apply(&self, node: &LogicalPlan, _ctx: &mut RuleContext<'_>) -> Result<LogicalPlan> {
        let LogicalPlan::Limit(l) = node else {
            return Ok(node.clone());
        };

        match l.input.as_ref() {
            LogicalPlan::Window(w) => {
                let Some(item) = row_number_order(w) else {
                    return Ok(node.clone());
                };
                Ok(LogicalPlan::TopN(TopN {
                    input: w.input.clone(),
                    items: item.order_by.clone(),
                    limit: l.limit,
                    offset: l.offset,
                }))
            }
            LogicalPlan::Projection(p) => {
                let LogicalPlan::Window(w) = p.input.as_ref() else {
                    return Ok(node.clone());
                };
                let Some(item) = row_number_order(w) else {
                    return Ok(node.clone());
                };
                Ok(LogicalPlan::Projection(Projection {
                    input: Box::new(LogicalPlan::TopN(TopN {
                        input: w.input.clone(),
                        items: item.order_by.clone(),
                        limit: l.limit,
                        offset: l.offset,
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
    use crate::expr::ExprNode;
    use crate::hint::{HintDiagnostics, HintSet};
    use crate::plan::logical::{DataSource, SortItem};
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

    fn row_number_window() -> Window {
        Window {
            input: Box::new(LogicalPlan::DataSource(DataSource::new(table()))),
            items: vec![WindowItem {
                func: "row_number".to_string(),
                args: vec![],
                partition_by: vec![],
                order_by: vec![SortItem::desc(ExprNode::col("a"))],
                frame: None,
            }],
        }
    }

    #[test]
    fn rewrites_limit_directly_above_window() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let node = LogicalPlan::Limit(Limit {
            input: Box::new(LogicalPlan::Window(row_number_window())),
            limit: 5,
            offset: 0,
        });
        assert!(DeriveTopNFromWindow.matches(&node));
        let rewritten = DeriveTopNFromWindow.apply(&node, &mut ctx).unwrap();
        let LogicalPlan::TopN(t) = rewritten else {
            panic!("expected TopN");
        };
        assert_eq!(t.limit, 5);
        assert_eq!(t.items.len(), 1);
    }

    #[test]
    fn does_not_match_rank() {
        let mut window = row_number_window();
        window.items[0].func = "rank".to_string();
        let node = LogicalPlan::Limit(Limit {
            input: Box::new(LogicalPlan::Window(window)),
            limit: 5,
            offset: 0,
        });
        assert!(!DeriveTopNFromWindow.matches(&node));
    }

    #[test]
    fn does_not_match_missing_order_by() {
        let mut window = row_number_window();
        window.items[0].order_by = vec![];
        let node = LogicalPlan::Limit(Limit {
            input: Box::new(LogicalPlan::Window(window)),
            limit: 5,
            offset: 0,
        });
        assert!(!DeriveTopNFromWindow.matches(&node));
    }
}
