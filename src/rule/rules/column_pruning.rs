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

//! `ColumnPruning` / `EnhancedColumnPruning` (spec §4.D): pass the "required
//! columns" set down from a `Projection` to every `DataSource` leaf beneath
//! it, so a scan only produces the columns actually used (spec §8 S1:
//! `SELECT a, b FROM t` yields a `DataSource` whose pushed-down column set
//! is `{a, b}`).
//!
//! The rule fires at `Projection` nodes specifically: a `Projection`'s item
//! list is the one place in the algebra where "what's required" is known
//! outright (spec §3 invariant 1 makes every other node's requirement a
//! function of its own attributes, which this rule threads downward
//! through `Selection`/`Sort`/`Limit`/`TopN`/`Join`/`Aggregate` until it
//! hits a leaf). A nested `Aggregate`/`Projection` encountered while
//! descending re-derives its own required set from its own attributes
//! rather than inheriting the set passed in, since (like the root
//! `Projection`) it fixes its own output list.

use std::collections::HashSet;

use crate::error::Result;
use crate::expr::ExprNode;
use crate::plan::logical::{
    Aggregate, Apply, DataSource, Join, Limit, LogicalPlan, Projection, Selection, Sort, TopN,
    Window,
};
use crate::rule::{Rule, RuleContext};

#[derive(Clone)]
pub struct ColumnPruning;

fn union_columns<'a>(exprs: impl IntoIterator<Item = &'a ExprNode>) -> HashSet<String> {
    let mut out = HashSet::new();
    for e in exprs {
        out.extend(e.referenced_columns());
    }
    out
}

/// Recursively restrict `plan`'s leaves to `required` columns (spec §4.D
/// "Pass the required columns set down the tree; each node removes
/// outputs not required by its parent, subject to not violating expression
/// or join semantics").
fn prune(plan: &LogicalPlan, required: &HashSet<String>) -> LogicalPlan {
    match plan {
        LogicalPlan::DataSource(ds) => {
            let all: Vec<String> = ds.table.columns.iter().map(|c| c.name.clone()).collect();
            let kept: Vec<String> = all.into_iter().filter(|c| required.contains(c)).collect();
            let mut ds = ds.clone();
            ds.projected_columns = Some(kept);
            LogicalPlan::DataSource(ds)
        }
        LogicalPlan::Selection(s) => {
            let mut req = required.clone();
            req.extend(union_columns(&s.condition.conjunctions));
            LogicalPlan::Selection(Selection {
                input: Box::new(prune(&s.input, &req)),
                condition: s.condition.clone(),
            })
        }
        LogicalPlan::Sort(s) => {
            let mut req = required.clone();
            req.extend(union_columns(s.items.iter().map(|i| &i.expr)));
            LogicalPlan::Sort(Sort {
                input: Box::new(prune(&s.input, &req)),
                items: s.items.clone(),
            })
        }
        LogicalPlan::TopN(t) => {
            let mut req = required.clone();
            req.extend(union_columns(t.items.iter().map(|i| &i.expr)));
            LogicalPlan::TopN(TopN {
                input: Box::new(prune(&t.input, &req)),
                items: t.items.clone(),
                limit: t.limit,
                offset: t.offset,
            })
        }
        LogicalPlan::Limit(l) => LogicalPlan::Limit(Limit {
            input: Box::new(prune(&l.input, required)),
            limit: l.limit,
            offset: l.offset,
        }),
        LogicalPlan::Window(w) => {
            let mut req = required.clone();
            for item in &w.items {
                req.extend(union_columns(&item.args));
                req.extend(union_columns(&item.partition_by));
                req.extend(union_columns(item.order_by.iter().map(|i| &i.expr)));
            }
            LogicalPlan::Window(Window {
                input: Box::new(prune(&w.input, &req)),
                items: w.items.clone(),
            })
        }
        LogicalPlan::Join(j) => {
            let (left_req, right_req) = split_join_requirement(required, &j.condition.conjunctions, &j.left.schema(), &j.right.schema());
            LogicalPlan::Join(Join {
                kind: j.kind,
                left: Box::new(prune(&j.left, &left_req)),
                right: Box::new(prune(&j.right, &right_req)),
                condition: j.condition.clone(),
                applied_hints: j.applied_hints.clone(),
            })
        }
        LogicalPlan::Apply(a) => {
            let (left_req, right_req) = split_join_requirement(required, &a.condition.conjunctions, &a.left.schema(), &a.right.schema());
            LogicalPlan::Apply(Apply {
                kind: a.kind,
                left: Box::new(prune(&a.left, &left_req)),
                right: Box::new(prune(&a.right, &right_req)),
                condition: a.condition.clone(),
                correlated_columns: a.correlated_columns.clone(),
                right_max_one_row: a.right_max_one_row,
                materialize: a.materialize,
            })
        }
        LogicalPlan::Aggregate(a) => {
            // An Aggregate fixes its own output (group-by columns plus agg
            // results); its required-from-child set is its own usage, not
            // whatever its parent asked of *it* (spec §3 invariant 5).
            let mut req: HashSet<String> = union_columns(&a.group_by);
            for item in &a.items {
                if let Some(arg) = &item.arg {
                    req.extend(arg.referenced_columns());
                }
            }
            LogicalPlan::Aggregate(Aggregate {
                input: Box::new(prune(&a.input, &req)),
                group_by: a.group_by.clone(),
                items: a.items.clone(),
                algorithm: a.algorithm,
                applied_hints: a.applied_hints.clone(),
            })
        }
        LogicalPlan::Projection(p) => {
            let req: HashSet<String> = union_columns(p.items.iter().map(|i| &i.expr));
            LogicalPlan::Projection(Projection {
                input: Box::new(prune(&p.input, &req)),
                items: p.items.clone(),
            })
        }
        other => other.clone(),
    }
}

fn split_join_requirement(
    required: &HashSet<String>,
    condition_conjuncts: &[ExprNode],
    left_schema: &crate::plan::schema::Schema,
    right_schema: &crate::plan::schema::Schema,
) -> (HashSet<String>, HashSet<String>) {
    let mut left_req = HashSet::new();
    let mut right_req = HashSet::new();

    // `required` is expressed against the Join's own (possibly
    // `right_`-renamed) output schema.
    for col in required {
        if left_schema.contains(col) {
            left_req.insert(col.clone());
        } else if let Some(stripped) = col.strip_prefix("right_") {
            if right_schema.contains(stripped) {
                right_req.insert(stripped.to_string());
                continue;
            }
            right_req.insert(col.clone());
        } else if right_schema.contains(col) {
            right_req.insert(col.clone());
        }
    }

    // The join condition itself is evaluated against the children's raw
    // (pre-rename) schemas.
    let cond_cols = union_columns(condition_conjuncts);
    for col in cond_cols {
        if left_schema.contains(&col) {
            left_req.insert(col);
        } else if right_schema.contains(&col) {
            right_req.insert(col);
        }
    }

    (left_req, right_req)
}

impl Rule for ColumnPruning {
    fn name(&self) -> &'static str {
        "ColumnPruning"
    }

    fn matches(&self, node: &LogicalPlan) -> bool {
        matches!(node, LogicalPlan::Projection(_))
    }

    fn apply(&self, node: &LogicalPlan, _ctx: &mut RuleContext<'_>) -> Result<LogicalPlan> {
        let LogicalPlan::Projection(p) = node else {
            return Ok(node.clone());
        };
        let required: HashSet<String> = union_columns(p.items.iter().map(|i| &i.expr));
        Ok(LogicalPlan::Projection(Projection {
            input: Box::new(prune(&p.input, &required)),
            items: p.items.clone(),
        }))
    }
}
