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

//! `PredicatePushdown (enhanced)` (spec §4.D, §8 properties 4-5). Splits a
//! `Selection`'s conjuncts and moves each one as close to the data as its
//! referenced columns allow: into a `Join` child only when **all** of the
//! predicate's columns belong to that child's schema (a partial match is
//! never pushed — spec §8 property 5, the `users.id = orders.user_id`
//! cross-table case), below a `Projection` only when every referenced
//! column passes through unchanged, and into a `DataSource` as a native
//! filter.

use std::collections::HashMap;

use crate::error::Result;
use crate::expr::{Condition, ExprNode};
use crate::plan::logical::{DataSource, Join, LogicalPlan, Projection, Selection};
use crate::rule::{Rule, RuleContext};

#[derive(Clone)]
pub struct PredicatePushdown;

fn substitute_columns(expr: &ExprNode, mapping: &HashMap<String, String>) -> ExprNode {
    match expr {
        ExprNode::Column { name, table } => match mapping.get(name) {
            Some(renamed) => ExprNode::Column {
                name: renamed.clone(),
                table: table.clone(),
            },
            None => expr.clone(),
        },
        ExprNode::CorrelatedColumn { .. } | ExprNode::Value(_) => expr.clone(),
        ExprNode::Operator {
            op,
            left,
            right,
            args,
        } => ExprNode::Operator {
            op: *op,
            left: left.as_deref().map(|e| Box::new(substitute_columns(e, mapping))),
            right: right.as_deref().map(|e| Box::new(substitute_columns(e, mapping))),
            args: args.iter().map(|a| substitute_columns(a, mapping)).collect(),
        },
        ExprNode::Function { name, args } => ExprNode::Function {
            name: name.clone(),
            args: args.iter().map(|a| substitute_columns(a, mapping)).collect(),
        },
    }
}

/// A `Projection` item that is a plain pass-through column reference (not a
/// computed expression), so a predicate on its output name can be
/// translated back to the input column and pushed below.
fn pass_through_mapping(proj: &Projection) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for item in &proj.items {
        if let ExprNode::Column { name, .. } = &item.expr {
            map.insert(item.name(), name.clone());
        }
    }
    map
}

impl Rule for PredicatePushdown {
    fn name(&self) -> &'static str {
        "PredicatePushdown"
    }

    fn matches(&self, node: &LogicalPlan) -> bool {
        matches!(node, LogicalPlan::Selection(s) if matches!(
            s.input.as_ref(),
            LogicalPlan::Join(_) | LogicalPlan::Projection(_) | LogicalPlan::DataSource(_)
        ))
    }

    fn apply(&self, node: &LogicalPlan, _ctx: &mut RuleContext<'_>) -> Result<LogicalPlan> {
        let LogicalPlan::Selection(sel) = node else {
            return Ok(node.clone());
        };

        match sel.input.as_ref() {
            LogicalPlan::DataSource(ds) => {
                let mut ds = ds.clone();
                ds.pushed_filters.extend(sel.condition.conjunctions.clone());
                Ok(LogicalPlan::DataSource(ds))
            }
            LogicalPlan::Join(j) => {
                let left_schema = j.left.schema();
                let right_schema = j.right.schema();
                let mut left_pushed = Vec::new();
                let mut right_pushed = Vec::new();
                let mut remaining = Vec::new();

                for conjunct in &sel.condition.conjunctions {
                    let cols = conjunct.referenced_columns();
                    if left_schema.contains_all(&cols) {
                        left_pushed.push(conjunct.clone());
                    } else if right_schema.contains_all(&cols) {
                        right_pushed.push(conjunct.clone());
                    } else {
                        // Mixed reference (spec §8 property 5): never split
                        // a predicate across both sides.
                        remaining.push(conjunct.clone());
                    }
                }

                if left_pushed.is_empty() && right_pushed.is_empty() {
                    return Ok(node.clone());
                }

                let new_left = if left_pushed.is_empty() {
                    (*j.left).clone()
                } else {
                    LogicalPlan::Selection(Selection {
                        input: j.left.clone(),
                        condition: Condition {
                            conjunctions: left_pushed,
                        },
                    })
                };
                let new_right = if right_pushed.is_empty() {
                    (*j.right).clone()
                } else {
                    LogicalPlan::Selection(Selection {
                        input: j.right.clone(),
                        condition: Condition {
                            conjunctions: right_pushed,
                        },
                    })
                };
                let new_join = LogicalPlan::Join(Join {
                    kind: j.kind,
                    left: Box::new(new_left),
                    right: Box::new(new_right),
                    condition: j.condition.clone(),
                    applied_hints: j.applied_hints.clone(),
                });

                Ok(if remaining.is_empty() {
                    new_join
                } else {
                    LogicalPlan::Selection(Selection {
                        input: Box::new(new_join),
                        condition: Condition {
                            conjunctions: remaining,
                        },
                    })
                })
            }
            LogicalPlan::Projection(p) => {
                let mapping = pass_through_mapping(p);
                let mut pushed = Vec::new();
                let mut remaining = Vec::new();
                for conjunct in &sel.condition.conjunctions {
                    let cols = conjunct.referenced_columns();
                    if cols.iter().all(|c| mapping.contains_key(c)) {
                        pushed.push(substitute_columns(conjunct, &mapping));
                    } else {
                        remaining.push(conjunct.clone());
                    }
                }
                if pushed.is_empty() {
                    return Ok(node.clone());
                }
                let new_input = LogicalPlan::Selection(Selection {
                    input: p.input.clone(),
                    condition: Condition { conjunctions: pushed },
                });
                let new_proj = LogicalPlan::Projection(Projection {
                    input: Box::new(new_input),
                    items: p.items.clone(),
                });
                Ok(if remaining.is_empty() {
                    new_proj
                } else {
                    LogicalPlan::Selection(Selection {
                        input: Box::new(new_proj),
                        condition: Condition {
                            conjunctions: remaining,
                        },
                    })
                })
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
    use crate::expr::{Literal, Op};
    use crate::hint::{HintDiagnostics, HintSet};
    use crate::stats::cardinality::JoinKind;
    use crate::stats::{NoStatistics, StatsCache};
    use std::sync::Arc;

    fn users() -> crate::catalog::TableMetaRef {
        Arc::new(TableMeta::new(
            "users",
            vec![
                ColumnMeta::new("id", DataType::Int64, false),
                ColumnMeta::new("age", DataType::Int32, true),
            ],
            vec![],
        ))
    }

    fn orders() -> crate::catalog::TableMetaRef {
        Arc::new(TableMeta::new(
            "orders",
            vec![ColumnMeta::new("user_id", DataType::Int64, false)],
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
    fn pushes_into_matching_datasource() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let node = LogicalPlan::Selection(Selection {
            input: Box::new(LogicalPlan::DataSource(DataSource::new(users()))),
            condition: Condition::with_expr(ExprNode::binary(
                Op::Eq,
                ExprNode::col("id"),
                ExprNode::value(Literal::Int(5)),
            )),
        });
        let rewritten = PredicatePushdown.apply(&node, &mut ctx).unwrap();
        let LogicalPlan::DataSource(ds) = rewritten else {
            panic!("expected DataSource");
        };
        assert_eq!(ds.pushed_filters.len(), 1);
    }

    #[test]
    fn cross_table_predicate_is_not_pushed_to_either_side() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let join = LogicalPlan::Join(Join {
            kind: JoinKind::Inner,
            left: Box::new(LogicalPlan::DataSource(DataSource::new(users()))),
            right: Box::new(LogicalPlan::DataSource(DataSource::new(orders()))),
            condition: Condition::true_cond(),
            applied_hints: vec![],
        });
        let node = LogicalPlan::Selection(Selection {
            input: Box::new(join),
            condition: Condition::with_expr(ExprNode::binary(
                Op::Eq,
                ExprNode::col("id"),
                ExprNode::col("user_id"),
            )),
        });
        // Neither side's schema contains both `id` and `user_id`, so this
        // predicate must stay above the join untouched.
        let rewritten = PredicatePushdown.apply(&node, &mut ctx).unwrap();
        assert_eq!(rewritten, node);
    }

    #[test]
    fn single_table_predicate_in_join_pushes_to_correct_side_only() {
        let (stats, hints, config, mut diags) = ctx_parts();
        let mut ctx = RuleContext::new(&stats, &hints, &mut diags, &config);
        let join = LogicalPlan::Join(Join {
            kind: JoinKind::Inner,
            left: Box::new(LogicalPlan::DataSource(DataSource::new(users()))),
            right: Box::new(LogicalPlan::DataSource(DataSource::new(orders()))),
            condition: Condition::true_cond(),
            applied_hints: vec![],
        });
        let node = LogicalPlan::Selection(Selection {
            input: Box::new(join),
            condition: Condition::with_expr(ExprNode::binary(
                Op::Gt,
                ExprNode::col("age"),
                ExprNode::value(Literal::Int(18)),
            )),
        });
        let rewritten = PredicatePushdown.apply(&node, &mut ctx).unwrap();
        let LogicalPlan::Join(j) = rewritten else {
            panic!("expected Join (Selection eliminated)");
        };
        let LogicalPlan::DataSource(left_ds) = j.left.as_ref() else {
            panic!("expected DataSource on left");
        };
        assert_eq!(left_ds.pushed_filters.len(), 1);
        let LogicalPlan::DataSource(right_ds) = j.right.as_ref() else {
            panic!("expected DataSource on right");
        };
        assert!(right_ds.pushed_filters.is_empty());
    }
}
