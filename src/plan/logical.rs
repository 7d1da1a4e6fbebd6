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

//! The logical plan algebra (spec §3, §4.A): an algebraic sum type, not a
//! shared trait object. Every variant exclusively owns its children
//! (`Box<LogicalPlan>`); a rewrite builds a new node rather than mutating
//! one in place, so two parents can never alias the same child instance
//! (spec §3 invariant 3). This is a deliberate divergence from the
//! teacher's own `PlanRef = Rc<dyn PlanNode>` + downcasting idiom — see
//! `DESIGN.md` — grounded instead on `apache-arrow-datafusion`'s
//! `LogicalPlan` enum shape.

use std::fmt;

use crate::catalog::TableMetaRef;
use crate::expr::{display::derive_name, Condition, ExprNode};
use crate::hint::AggAlgo;
use crate::stats::cardinality::JoinKind;

use super::schema::{infer_type, Field, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortItem {
    pub expr: ExprNode,
    pub direction: SortDirection,
}

impl SortItem {
    pub fn asc(expr: ExprNode) -> Self {
        Self {
            expr,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(expr: ExprNode) -> Self {
        Self {
            expr,
            direction: SortDirection::Desc,
        }
    }
}

/// A DataSource's pushed-down sort+limit+offset (spec §3 "pushed-down
/// TopN"), transferred there by `TopNPushdown`/`LimitPushdown`.
#[derive(Debug, Clone, PartialEq)]
pub struct PushedTopN {
    pub sort: Vec<SortItem>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    pub table: TableMetaRef,
    pub pushed_filters: Vec<ExprNode>,
    pub pushed_topn: Option<PushedTopN>,
    pub chosen_index: Option<String>,
    pub forbidden_indexes: Vec<String>,
    pub applied_hints: Vec<String>,
    /// Set by `ColumnPruning`/`EnhancedColumnPruning` (spec §4.D): the
    /// subset of `table`'s columns actually required by the consuming
    /// plan. `None` means "all columns" (the unpruned default).
    pub projected_columns: Option<Vec<String>>,
}

impl DataSource {
    pub fn new(table: TableMetaRef) -> Self {
        Self {
            table,
            pushed_filters: Vec::new(),
            pushed_topn: None,
            chosen_index: None,
            forbidden_indexes: Vec::new(),
            applied_hints: Vec::new(),
            projected_columns: None,
        }
    }

    pub fn schema(&self) -> Schema {
        Schema::new(
            self.table
                .columns
                .iter()
                .filter(|c| match &self.projected_columns {
                    Some(cols) => cols.contains(&c.name),
                    None => true,
                })
                .map(|c| Field::new(c.name.clone(), c.data_type, c.nullable))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub input: Box<LogicalPlan>,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectItem {
    pub expr: ExprNode,
    pub alias: Option<String>,
}

impl ProjectItem {
    pub fn name(&self) -> String {
        self.alias.clone().unwrap_or_else(|| derive_name(&self.expr))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub input: Box<LogicalPlan>,
    pub items: Vec<ProjectItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub left: Box<LogicalPlan>,
    pub right: Box<LogicalPlan>,
    pub condition: Condition,
    pub applied_hints: Vec<String>,
}

/// A reference to an outer query's column from inside an `Apply`'s right
/// subtree (spec §3, §9) — an explicit value, not a shared mutable
/// reference into the enclosing scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelatedColumnRef {
    pub name: String,
    pub nesting_level: usize,
}

/// The correlated-subquery node (spec §3). Structurally identical to
/// `Join` plus a `correlated_columns` set; kept as a distinct variant
/// (rather than a `Join` flag) because `Decorrelate`/`SemiJoinRewrite`
/// match on it specifically and its presence/absence is itself meaningful
/// (an `Apply` with an empty `correlated_columns` set is the
/// "uncorrelated" decorrelation case).
#[derive(Debug, Clone, PartialEq)]
pub struct Apply {
    pub kind: JoinKind,
    pub left: Box<LogicalPlan>,
    pub right: Box<LogicalPlan>,
    pub condition: Condition,
    pub correlated_columns: Vec<CorrelatedColumnRef>,
    /// Set when the right subtree is constrained to produce at most one
    /// row (a scalar-subquery cardinality check the binder would have
    /// attached). `Decorrelate`'s max-one-row strategy (spec §4.D) strips
    /// this once the enclosing join is `LeftOuter`, since a `LeftOuter`
    /// join already tolerates zero matching rows and a constraint
    /// violation becomes the execution engine's concern, not the
    /// optimizer's.
    pub right_max_one_row: bool,
    /// Set by `SubqueryMaterialization` (spec §4.D) when this occurrence's
    /// right subtree is structurally identical to another `Apply`
    /// elsewhere in the same plan: the execution engine evaluates the
    /// subquery once and every tagged occurrence reads back the same
    /// materialized result instead of re-running it.
    pub materialize: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggFunc {
    pub fn label(self) -> &'static str {
        match self {
            AggFunc::Count => "COUNT",
            AggFunc::Sum => "SUM",
            AggFunc::Avg => "AVG",
            AggFunc::Max => "MAX",
            AggFunc::Min => "MIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggItem {
    pub func: AggFunc,
    /// `None` only for `COUNT(*)`.
    pub arg: Option<ExprNode>,
    pub alias: Option<String>,
    pub distinct: bool,
}

impl AggItem {
    pub fn name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        let arg = self
            .arg
            .as_ref()
            .map(derive_name)
            .unwrap_or_else(|| "*".to_string());
        format!("{}({})", self.func.label(), arg)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub input: Box<LogicalPlan>,
    pub group_by: Vec<ExprNode>,
    pub items: Vec<AggItem>,
    /// Only set when a `HASH_AGG`/`STREAM_AGG`/... hint selected an
    /// algorithm ahead of physicalization (spec §3, §4.E); physicalization
    /// always commits to a concrete algorithm regardless.
    pub algorithm: Option<AggAlgo>,
    pub applied_hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub input: Box<LogicalPlan>,
    pub items: Vec<SortItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopN {
    pub input: Box<LogicalPlan>,
    pub items: Vec<SortItem>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
    pub input: Box<LogicalPlan>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowItem {
    pub func: String,
    pub args: Vec<ExprNode>,
    pub partition_by: Vec<ExprNode>,
    pub order_by: Vec<SortItem>,
    pub frame: Option<String>,
}

impl WindowItem {
    pub fn name(&self) -> String {
        format!("{}()", self.func.to_uppercase())
    }

    /// `ROW_NUMBER`/`RANK`/`DENSE_RANK` have no argument and diverge in
    /// tie-breaking semantics (spec §4.D `DeriveTopNFromWindow`: only
    /// `ROW_NUMBER` is simple-TopN-equivalent).
    pub fn is_row_number(&self) -> bool {
        self.func.eq_ignore_ascii_case("row_number")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub input: Box<LogicalPlan>,
    pub items: Vec<WindowItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpKind {
    Union,
    Intersect,
    Except,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOp {
    pub kind: SetOpKind,
    pub left: Box<LogicalPlan>,
    pub right: Box<LogicalPlan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmlKind {
    Delete,
    Update,
    Insert,
}

/// A DML root (spec §3: "described by targets and row sources"). `source`
/// is the row-producing subtree for `Insert ... SELECT` / the filtered set
/// for `Update`/`Delete`; `None` for a plain `VALUES`-only `Insert`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dml {
    pub kind: DmlKind,
    pub target: TableMetaRef,
    pub source: Option<Box<LogicalPlan>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    DataSource(DataSource),
    Selection(Selection),
    Projection(Projection),
    Join(Join),
    Apply(Apply),
    Aggregate(Aggregate),
    Sort(Sort),
    TopN(TopN),
    Limit(Limit),
    Window(Window),
    SetOp(SetOp),
    Dml(Dml),
}

impl LogicalPlan {
    /// Ordered children (spec §4.A `children()`). Shallow: does not
    /// recurse, matching the rule engine's own traversal (§4.C), which
    /// walks one level at a time.
    pub fn children(&self) -> Vec<&LogicalPlan> {
        match self {
            LogicalPlan::DataSource(_) => vec![],
            LogicalPlan::Selection(n) => vec![&n.input],
            LogicalPlan::Projection(n) => vec![&n.input],
            LogicalPlan::Join(n) => vec![&n.left, &n.right],
            LogicalPlan::Apply(n) => vec![&n.left, &n.right],
            LogicalPlan::Aggregate(n) => vec![&n.input],
            LogicalPlan::Sort(n) => vec![&n.input],
            LogicalPlan::TopN(n) => vec![&n.input],
            LogicalPlan::Limit(n) => vec![&n.input],
            LogicalPlan::Window(n) => vec![&n.input],
            LogicalPlan::SetOp(n) => vec![&n.left, &n.right],
            LogicalPlan::Dml(n) => n.source.as_deref().into_iter().collect(),
        }
    }

    /// Replace this node's children in order, returning a new node (spec
    /// §4.A `set_children(...)`; §3 invariant 1: rewrites construct new
    /// owning nodes rather than mutate in place).
    ///
    /// Panics if `children.len()` does not match this variant's arity —
    /// a programming error in the calling rule, not a data error.
    pub fn set_children(&self, children: Vec<LogicalPlan>) -> LogicalPlan {
        let mut children = children.into_iter();
        let mut next = || children.next().expect("arity mismatch in set_children");
        match self {
            LogicalPlan::DataSource(n) => LogicalPlan::DataSource(n.clone()),
            LogicalPlan::Selection(n) => LogicalPlan::Selection(Selection {
                input: Box::new(next()),
                condition: n.condition.clone(),
            }),
            LogicalPlan::Projection(n) => LogicalPlan::Projection(Projection {
                input: Box::new(next()),
                items: n.items.clone(),
            }),
            LogicalPlan::Join(n) => LogicalPlan::Join(Join {
                kind: n.kind,
                left: Box::new(next()),
                right: Box::new(next()),
                condition: n.condition.clone(),
                applied_hints: n.applied_hints.clone(),
            }),
            LogicalPlan::Apply(n) => LogicalPlan::Apply(Apply {
                kind: n.kind,
                left: Box::new(next()),
                right: Box::new(next()),
                condition: n.condition.clone(),
                correlated_columns: n.correlated_columns.clone(),
                right_max_one_row: n.right_max_one_row,
                materialize: n.materialize,
            }),
            LogicalPlan::Aggregate(n) => LogicalPlan::Aggregate(Aggregate {
                input: Box::new(next()),
                group_by: n.group_by.clone(),
                items: n.items.clone(),
                algorithm: n.algorithm,
                applied_hints: n.applied_hints.clone(),
            }),
            LogicalPlan::Sort(n) => LogicalPlan::Sort(Sort {
                input: Box::new(next()),
                items: n.items.clone(),
            }),
            LogicalPlan::TopN(n) => LogicalPlan::TopN(TopN {
                input: Box::new(next()),
                items: n.items.clone(),
                limit: n.limit,
                offset: n.offset,
            }),
            LogicalPlan::Limit(n) => LogicalPlan::Limit(Limit {
                input: Box::new(next()),
                limit: n.limit,
                offset: n.offset,
            }),
            LogicalPlan::Window(n) => LogicalPlan::Window(Window {
                input: Box::new(next()),
                items: n.items.clone(),
            }),
            LogicalPlan::SetOp(n) => LogicalPlan::SetOp(SetOp {
                kind: n.kind,
                left: Box::new(next()),
                right: Box::new(next()),
            }),
            LogicalPlan::Dml(n) => LogicalPlan::Dml(Dml {
                kind: n.kind,
                target: n.target.clone(),
                source: if n.source.is_some() {
                    Some(Box::new(next()))
                } else {
                    None
                },
            }),
        }
    }

    /// The output schema (spec §4.A "Schema propagation rules"): a pure
    /// function of this node's children's schemas and its own attributes
    /// (spec §3 invariant 1) — never cached on the node itself, so a
    /// rewrite can never leave a stale schema behind.
    pub fn schema(&self) -> Schema {
        match self {
            LogicalPlan::DataSource(n) => n.schema(),
            LogicalPlan::Selection(n) => n.input.schema(),
            LogicalPlan::Sort(n) => n.input.schema(),
            LogicalPlan::Limit(n) => n.input.schema(),
            LogicalPlan::TopN(n) => n.input.schema(),
            LogicalPlan::Projection(n) => {
                let input = n.input.schema();
                Schema::new(
                    n.items
                        .iter()
                        .map(|item| {
                            Field::new(item.name(), infer_type(&item.expr, &input), true)
                        })
                        .collect(),
                )
            }
            LogicalPlan::Join(n) => Schema::join(&n.left.schema(), &n.right.schema()),
            LogicalPlan::Apply(n) => Schema::join(&n.left.schema(), &n.right.schema()),
            LogicalPlan::Aggregate(n) => {
                let input = n.input.schema();
                let mut fields: Vec<Field> = n
                    .group_by
                    .iter()
                    .map(|e| Field::new(derive_name(e), infer_type(e, &input), true))
                    .collect();
                fields.extend(n.items.iter().map(|item| {
                    let ty = match item.func {
                        AggFunc::Count => crate::catalog::DataType::Int64,
                        AggFunc::Sum | AggFunc::Avg => crate::catalog::DataType::Float64,
                        AggFunc::Max | AggFunc::Min => item
                            .arg
                            .as_ref()
                            .map(|e| infer_type(e, &input))
                            .unwrap_or(crate::catalog::DataType::Float64),
                    };
                    Field::new(item.name(), ty, true)
                }));
                Schema::new(fields)
            }
            LogicalPlan::Window(n) => {
                let input = n.input.schema();
                let mut fields = input.fields.clone();
                fields.extend(n.items.iter().map(|item| {
                    let ty = if item.is_row_number() {
                        crate::catalog::DataType::Int64
                    } else {
                        crate::catalog::DataType::Float64
                    };
                    Field::new(item.name(), ty, true)
                }));
                Schema::new(fields)
            }
            LogicalPlan::SetOp(n) => n.left.schema(),
            LogicalPlan::Dml(_) => Schema::empty(),
        }
    }

    pub fn explain(&self) -> String {
        super::explain::explain(self)
    }
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.explain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, DataType, TableMeta};
    use std::sync::Arc;

    fn table(name: &str) -> TableMetaRef {
        Arc::new(TableMeta::new(
            name,
            vec![
                ColumnMeta::new("id", DataType::Int64, false),
                ColumnMeta::new("name", DataType::Varchar, true),
            ],
            vec![],
        ))
    }

    #[test]
    fn data_source_schema_matches_table_columns_in_order() {
        let plan = LogicalPlan::DataSource(DataSource::new(table("t")));
        let schema = plan.schema();
        assert_eq!(schema.fields[0].name, "id");
        assert_eq!(schema.fields[1].name, "name");
    }

    #[test]
    fn selection_forwards_child_schema_unchanged() {
        let input = LogicalPlan::DataSource(DataSource::new(table("t")));
        let plan = LogicalPlan::Selection(Selection {
            input: Box::new(input.clone()),
            condition: Condition::true_cond(),
        });
        assert_eq!(plan.schema(), input.schema());
    }

    #[test]
    fn set_children_preserves_arity_and_attributes() {
        let input = LogicalPlan::DataSource(DataSource::new(table("t")));
        let plan = LogicalPlan::Limit(Limit {
            input: Box::new(input.clone()),
            limit: 10,
            offset: 0,
        });
        let replaced = plan.set_children(vec![input.clone()]);
        assert_eq!(replaced.schema(), input.schema());
    }

    #[test]
    fn join_children_are_left_then_right() {
        let left = LogicalPlan::DataSource(DataSource::new(table("users")));
        let right = LogicalPlan::DataSource(DataSource::new(table("orders")));
        let join = LogicalPlan::Join(Join {
            kind: JoinKind::Inner,
            left: Box::new(left.clone()),
            right: Box::new(right.clone()),
            condition: Condition::true_cond(),
            applied_hints: vec![],
        });
        assert_eq!(join.children(), vec![&left, &right]);
    }
}
