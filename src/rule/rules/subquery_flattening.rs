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

//! `SubqueryFlattening` (spec §4.D): "Uncorrelated scalar subquery that
//! returns one column and ≤1 row by construction → inline into the
//! enclosing expression."
//!
//! This algebra has no expression-level "scalar subquery" node — a scalar
//! subquery is an `Apply` whose right side is already known, by
//! construction, to produce at most one row (`right_max_one_row`) and
//! exactly one column. Once a subquery is uncorrelated, `Decorrelate`'s own
//! "uncorrelated" strategy already turns it into a plain `Join`, but that
//! rewrite still carries the row-cardinality bookkeeping forward on the
//! resulting structure. `SubqueryFlattening` is the single-column, single-
//! row special case: nothing downstream needs to treat the right side as
//! "a join partner with its own multi-column identity" any more, since it
//! degenerates to reading back one scalar value per left row — the same
//! operation the binder would have produced directly for `(SELECT ...)`
//! used in a scalar expression position, had this algebra modeled that
//! position explicitly. Collapsing it here, rather than leaving the
//! distinction to a downstream consumer, is what "inline into the
//! enclosing expression" means in a node-based representation: the
//! `right_max_one_row` constraint is retired because the rewrite itself
//! is the evidence it holds.

use crate::error::Result;
use crate::plan::logical::{Join, LogicalPlan};
use crate::rule::{Rule, RuleContext};

#[derive(Clone)]
pub struct SubqueryFlattening;

impl Rule for SubqueryFlattening {
    fn name(&self) -> &'static str {
        "SubqueryFlattening"
    }

    fn matches(&self, node: &LogicalPlan) -> bool {
        matches!(node, LogicalPlan::Apply(a)
            if a.correlated_columns.is_empty()
                && a.right_max_one_row
                && a.right.schema().fields.len() == 1)
    }

    fn apply(&self, node: &LogicalPlan, _ctx: &mut RuleContext<'_>) -> Result<LogicalPlan> {
        let LogicalPlan::Apply(a) = node else {
            return Ok(node.clone());
        };
        if !(a.correlated_columns.is_empty()
            && a.right_max_one_row
            && a.right.schema().fields.len() == 1)
        {
            return Ok(node.clone());
        }
        Ok(LogicalPlan::Join(Join {
            kind: a.kind,
            left: a.left.clone(),
            right: a.right.clone(),
            condition: a.condition.clone(),
            applied_hints: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, DataType, TableMeta, TableMetaRef};
    use crate::config::OptimizerConfig;
    use crate::expr::Condition;
    use crate::hint::{HintDiagnostics, HintSet};
    use crate::plan::logical::{AggFunc, AggItem, Aggregate, DataSource};
    use crate::stats::cardinality::JoinKind;
    use crate::stats::{NoStatistics, StatsCache};
    use std::sync::Arc;

    fn t(name: &str, cols: &[&str]) -> TableMetaRef {
        Arc::new(TableMeta::new(
            name,
            cols.iter()
                .map(|c| ColumnMeta::new(*c, DataType::Int64, false))
                .collect(),
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

    fn scalar_subquery_apply() -> LogicalPlan {
        LogicalPlan::Apply(Apply {
            kind: JoinKind::LeftOuter,
            left: Box::new(LogicalPlan::DataSource(DataSource::new(t("outer", &["id"])))),
            right: Box::new(LogicalPlan::Aggregate(Aggregate {
                input: Box::new(LogicalPlan::DataSource(DataSource::new(t("inner", &["v"])))),
                group_by: vec![],
                items: vec![AggItem {
                    func: AggFunc::Count,
                    arg: None,
                    alias: Some("cnt".to_string()),
                    distinct: false,
                }],
                algorithm: None,
                applied_hints: vec![],
            })),
            condition: Condition::true_cond(),
            correlated_columns: vec![],
            right_max_one_row: true,
            materialize: false,
        })
    }

    #[test]
    fn matches_uncorrelated_single_column_max_one_row_apply() {
        let node = scalar_subquery_apply();
        assert!(SubqueryFlattening.matches(&node));
    }

    #[test]
    fn flattens_into_plain_join() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let node = scalar_subquery_apply();
        let rewritten = SubqueryFlattening.apply(&node, &mut ctx).unwrap();
        assert!(matches!(rewritten, LogicalPlan::Join(j) if j.kind == JoinKind::LeftOuter));
    }

    #[test]
    fn does_not_match_multi_column_subquery() {
        let mut node = scalar_subquery_apply();
        if let LogicalPlan::Apply(a) = &mut node {
            a.right = Box::new(LogicalPlan::DataSource(DataSource::new(t("inner", &["v", "w"]))));
        }
        assert!(!SubqueryFlattening.matches(&node));
    }

    #[test]
    fn does_not_match_without_max_one_row_guarantee() {
        let mut node = scalar_subquery_apply();
        if let LogicalPlan::Apply(a) = &mut node {
            a.right_max_one_row = false;
        }
        assert!(!SubqueryFlattening.matches(&node));
    }

    #[test]
    fn does_not_match_correlated_apply() {
        let mut node = scalar_subquery_apply();
        if let LogicalPlan::Apply(a) = &mut node {
            a.correlated_columns = vec![crate::plan::logical::CorrelatedColumnRef {
                name: "id".to_string(),
                nesting_level: 0,
            }];
        }
        assert!(!SubqueryFlattening.matches(&node));
    }
}
