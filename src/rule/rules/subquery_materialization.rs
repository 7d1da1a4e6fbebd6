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

//! `SubqueryMaterialization` (spec §4.D): "Plan with ≥2 occurrences of the
//! same subquery fingerprint → tag repeated subqueries for one-shot
//! evaluation; downstream references read from the materialization."
//!
//! This is not a node-local `Rule`: `Rule::matches`/`Rule::apply` only ever
//! see the one node being visited, but detecting "≥2 occurrences" requires
//! comparing every `Apply`'s right subtree against every other one in the
//! same plan. It runs as its own whole-tree pass instead, invoked directly
//! by the facade rather than folded into `standard_rule_set()`'s fixpoint
//! loop.
//!
//! Counting is keyed on the structural fingerprint from
//! [`crate::plan::fingerprint::hash_plan`], the same hash the plan cache
//! uses for statement fingerprinting, applied here to each `Apply`'s right
//! subtree rather than to the statement as a whole.

use std::collections::HashMap;

use crate::plan::fingerprint::{hash_plan, Fnv1a};
use crate::plan::logical::{Apply, LogicalPlan};

/// Walk `plan`, count how many `Apply` nodes share each right-subtree
/// fingerprint, then return a rewritten copy with `materialize: true` set
/// on every `Apply` whose fingerprint occurs two or more times.
pub fn materialize_repeated_subqueries(plan: &LogicalPlan) -> LogicalPlan {
    let mut counts = HashMap::new();
    count_fingerprints(plan, &mut counts);
    tag(plan, &counts)
}

fn fingerprint_of(plan: &LogicalPlan) -> u64 {
    let mut h = Fnv1a::new();
    hash_plan(plan, &mut h);
    h.finish()
}

fn count_fingerprints(plan: &LogicalPlan, counts: &mut HashMap<u64, u32>) {
    if let LogicalPlan::Apply(a) = plan {
        *counts.entry(fingerprint_of(&a.right)).or_insert(0) += 1;
    }
    for child in plan.children() {
        count_fingerprints(child, counts);
    }
}

fn tag(plan: &LogicalPlan, counts: &HashMap<u64, u32>) -> LogicalPlan {
    let rewritten_children: Vec<LogicalPlan> =
        plan.children().into_iter().map(|c| tag(c, counts)).collect();
    let plan = plan.set_children(rewritten_children);

    if let LogicalPlan::Apply(a) = plan {
        let repeated = counts.get(&fingerprint_of(&a.right)).copied().unwrap_or(0) >= 2;
        LogicalPlan::Apply(Apply {
            materialize: repeated,
            ..a
        })
    } else {
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, DataType, TableMeta, TableMetaRef};
    use crate::expr::{Condition, ExprNode};
    use crate::plan::logical::{CorrelatedColumnRef, DataSource, Join, Selection};
    use crate::stats::cardinality::JoinKind;
    use std::sync::Arc;

    fn t(name: &str) -> TableMetaRef {
        Arc::new(TableMeta::new(
            name,
            vec![ColumnMeta::new("a", DataType::Int64, false)],
            vec![],
        ))
    }

    fn correlated_subquery(table: &str) -> LogicalPlan {
        LogicalPlan::Apply(Apply {
            kind: JoinKind::Semi,
            left: Box::new(LogicalPlan::DataSource(DataSource::new(t("outer")))),
            right: Box::new(LogicalPlan::Selection(Selection {
                input: Box::new(LogicalPlan::DataSource(DataSource::new(t(table)))),
                condition: Condition::with_expr(ExprNode::CorrelatedColumn {
                    name: "a".to_string(),
                    nesting_level: 0,
                }),
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
    fn repeated_subquery_is_tagged_on_every_occurrence() {
        let plan = LogicalPlan::Join(Join {
            kind: JoinKind::Inner,
            left: Box::new(correlated_subquery("inner1")),
            right: Box::new(correlated_subquery("inner1")),
            condition: Condition::true_cond(),
            applied_hints: vec![],
        });

        let rewritten = materialize_repeated_subqueries(&plan);
        let LogicalPlan::Join(j) = rewritten else {
            panic!("expected Join");
        };
        let LogicalPlan::Apply(left) = j.left.as_ref() else {
            panic!("expected Apply");
        };
        let LogicalPlan::Apply(right) = j.right.as_ref() else {
            panic!("expected Apply");
        };
        assert!(left.materialize);
        assert!(right.materialize);
    }

    #[test]
    fn distinct_subqueries_are_not_tagged() {
        let plan = LogicalPlan::Join(Join {
            kind: JoinKind::Inner,
            left: Box::new(correlated_subquery("inner1")),
            right: Box::new(correlated_subquery("inner2")),
            condition: Condition::true_cond(),
            applied_hints: vec![],
        });

        let rewritten = materialize_repeated_subqueries(&plan);
        let LogicalPlan::Join(j) = rewritten else {
            panic!("expected Join");
        };
        let LogicalPlan::Apply(left) = j.left.as_ref() else {
            panic!("expected Apply");
        };
        let LogicalPlan::Apply(right) = j.right.as_ref() else {
            panic!("expected Apply");
        };
        assert!(!left.materialize);
        assert!(!right.materialize);
    }

    #[test]
    fn single_occurrence_is_not_tagged() {
        let plan = correlated_subquery("inner1");
        let rewritten = materialize_repeated_subqueries(&plan);
        let LogicalPlan::Apply(a) = rewritten else {
            panic!("expected Apply");
        };
        assert!(!a.materialize);
    }
}
