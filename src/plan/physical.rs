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

//! The physical plan algebra (spec §3 "Physical variants mirror logical
//! ones but commit to an algorithm... and carry a computed cost"). Built
//! by `crate::rule::physicalize` from an already-rewritten `LogicalPlan`;
//! never constructed directly by a rule.

use std::fmt;

use crate::catalog::TableMetaRef;
use crate::expr::Condition;
use crate::hint::{AggAlgo, JoinAlgo};
use crate::stats::cardinality::JoinKind;
use crate::stats::cost::Cost;

use super::logical::{AggItem, DmlKind, ProjectItem, SetOpKind, SortItem};
use super::schema::Schema;

#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub table: TableMetaRef,
    pub pushed_filters: Vec<crate::expr::ExprNode>,
    pub pushed_sort: Vec<SortItem>,
    pub pushed_limit: Option<u64>,
    pub pushed_offset: u64,
    pub chosen_index: Option<String>,
    pub schema: Schema,
    pub rows: u64,
    pub cost: Cost,
    pub applied_hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub input: Box<PhysicalPlan>,
    pub condition: Condition,
    pub rows: u64,
    pub cost: Cost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub input: Box<PhysicalPlan>,
    pub items: Vec<ProjectItem>,
    pub schema: Schema,
    pub rows: u64,
    pub cost: Cost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinOp {
    pub kind: JoinKind,
    pub algo: JoinAlgo,
    pub left: Box<PhysicalPlan>,
    pub right: Box<PhysicalPlan>,
    pub condition: Condition,
    /// Build side for `HashJoin` (the smaller estimated input); unused by
    /// other algorithms but still reported on the node per spec §6 output
    /// example (`HashJoin.build_side`).
    pub build_side: BuildSide,
    pub schema: Schema,
    pub rows: u64,
    pub cost: Cost,
    pub applied_hints: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSide {
    Left,
    Right,
    /// Not meaningful for this algorithm (e.g. `MergeJoin`).
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOp {
    pub input: Box<PhysicalPlan>,
    pub group_by: Vec<crate::expr::ExprNode>,
    pub items: Vec<AggItem>,
    pub algorithm: AggAlgo,
    pub schema: Schema,
    pub rows: u64,
    pub cost: Cost,
    pub applied_hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortOp {
    pub input: Box<PhysicalPlan>,
    pub items: Vec<SortItem>,
    pub rows: u64,
    pub cost: Cost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopNOp {
    pub input: Box<PhysicalPlan>,
    pub items: Vec<SortItem>,
    pub limit: u64,
    pub offset: u64,
    pub rows: u64,
    pub cost: Cost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimitOp {
    pub input: Box<PhysicalPlan>,
    pub limit: u64,
    pub offset: u64,
    pub rows: u64,
    pub cost: Cost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowOp {
    pub input: Box<PhysicalPlan>,
    pub items: Vec<super::logical::WindowItem>,
    pub schema: Schema,
    pub rows: u64,
    pub cost: Cost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOp {
    pub kind: SetOpKind,
    pub left: Box<PhysicalPlan>,
    pub right: Box<PhysicalPlan>,
    pub rows: u64,
    pub cost: Cost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dml {
    pub kind: DmlKind,
    pub target: TableMetaRef,
    pub source: Option<Box<PhysicalPlan>>,
    pub cost: Cost,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalPlan {
    Scan(Scan),
    Filter(Filter),
    Project(Project),
    Join(JoinOp),
    Aggregate(AggregateOp),
    Sort(SortOp),
    TopN(TopNOp),
    Limit(LimitOp),
    Window(WindowOp),
    SetOp(SetOp),
    Dml(Dml),
}

impl PhysicalPlan {
    pub fn children(&self) -> Vec<&PhysicalPlan> {
        match self {
            PhysicalPlan::Scan(_) => vec![],
            PhysicalPlan::Filter(n) => vec![&n.input],
            PhysicalPlan::Project(n) => vec![&n.input],
            PhysicalPlan::Join(n) => vec![&n.left, &n.right],
            PhysicalPlan::Aggregate(n) => vec![&n.input],
            PhysicalPlan::Sort(n) => vec![&n.input],
            PhysicalPlan::TopN(n) => vec![&n.input],
            PhysicalPlan::Limit(n) => vec![&n.input],
            PhysicalPlan::Window(n) => vec![&n.input],
            PhysicalPlan::SetOp(n) => vec![&n.left, &n.right],
            PhysicalPlan::Dml(n) => n.source.as_deref().into_iter().collect(),
        }
    }

    pub fn schema(&self) -> Schema {
        match self {
            PhysicalPlan::Scan(n) => n.schema.clone(),
            PhysicalPlan::Filter(n) => n.input.schema(),
            PhysicalPlan::Project(n) => n.schema.clone(),
            PhysicalPlan::Join(n) => n.schema.clone(),
            PhysicalPlan::Aggregate(n) => n.schema.clone(),
            PhysicalPlan::Sort(n) => n.input.schema(),
            PhysicalPlan::TopN(n) => n.input.schema(),
            PhysicalPlan::Limit(n) => n.input.schema(),
            PhysicalPlan::Window(n) => n.schema.clone(),
            PhysicalPlan::SetOp(n) => n.left.schema(),
            PhysicalPlan::Dml(_) => Schema::empty(),
        }
    }

    /// This node's own cost plus every child's (spec §3 "Cost is additive
    /// over a plan tree").
    pub fn cost(&self) -> Cost {
        let own = match self {
            PhysicalPlan::Scan(n) => n.cost,
            PhysicalPlan::Filter(n) => n.cost,
            PhysicalPlan::Project(n) => n.cost,
            PhysicalPlan::Join(n) => n.cost,
            PhysicalPlan::Aggregate(n) => n.cost,
            PhysicalPlan::Sort(n) => n.cost,
            PhysicalPlan::TopN(n) => n.cost,
            PhysicalPlan::Limit(n) => n.cost,
            PhysicalPlan::Window(n) => n.cost,
            PhysicalPlan::SetOp(n) => n.cost,
            PhysicalPlan::Dml(n) => n.cost,
        };
        self.children().into_iter().map(PhysicalPlan::cost).fold(own, std::ops::Add::add)
    }

    pub fn rows(&self) -> u64 {
        match self {
            PhysicalPlan::Scan(n) => n.rows,
            PhysicalPlan::Filter(n) => n.rows,
            PhysicalPlan::Project(n) => n.rows,
            PhysicalPlan::Join(n) => n.rows,
            PhysicalPlan::Aggregate(n) => n.rows,
            PhysicalPlan::Sort(n) => n.rows,
            PhysicalPlan::TopN(n) => n.rows,
            PhysicalPlan::Limit(n) => n.rows,
            PhysicalPlan::Window(n) => n.rows,
            PhysicalPlan::SetOp(n) => n.rows,
            PhysicalPlan::Dml(_) => 0,
        }
    }

    pub fn applied_hints(&self) -> &[String] {
        match self {
            PhysicalPlan::Scan(n) => &n.applied_hints,
            PhysicalPlan::Join(n) => &n.applied_hints,
            PhysicalPlan::Aggregate(n) => &n.applied_hints,
            _ => &[],
        }
    }

    pub fn explain(&self) -> String {
        super::explain::explain_physical(self)
    }
}

impl fmt::Display for PhysicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.explain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, DataType, TableMeta};
    use std::sync::Arc;

    fn leaf_scan(rows: u64, cost: f64) -> PhysicalPlan {
        let table = Arc::new(TableMeta::new(
            "t",
            vec![ColumnMeta::new("id", DataType::Int64, false)],
            vec![],
        ));
        PhysicalPlan::Scan(Scan {
            schema: Schema::new(vec![super::super::schema::Field::new(
                "id",
                DataType::Int64,
                false,
            )]),
            table,
            pushed_filters: vec![],
            pushed_sort: vec![],
            pushed_limit: None,
            pushed_offset: 0,
            chosen_index: None,
            rows,
            cost: Cost(cost),
            applied_hints: vec![],
        })
    }

    #[test]
    fn cost_accumulates_from_children() {
        let left = leaf_scan(100, 1.0);
        let right = leaf_scan(200, 2.0);
        let join = PhysicalPlan::Join(JoinOp {
            kind: JoinKind::Inner,
            algo: JoinAlgo::Hash,
            left: Box::new(left),
            right: Box::new(right),
            condition: Condition::true_cond(),
            build_side: BuildSide::Left,
            schema: Schema::empty(),
            rows: 100,
            cost: Cost(5.0),
            applied_hints: vec![],
        });
        assert_eq!(join.cost(), Cost(8.0));
    }
}
