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

//! The "parsed statement" input shape (spec §6 "Input: parsed statement").
//! This is what the external SQL parser collaborator hands the facade; the
//! optimizer never parses SQL text itself (spec §1 Non-goals). Structurally
//! grounded on the teacher's `BoundSelect` (`binder/select.rs`) and
//! `BoundQuery`/joins shape (`binder/query.rs`, `binder/relation/join.rs`),
//! reduced to the pieces this crate's initial-plan construction (spec
//! §4.G step 3a) actually consumes.

use crate::expr::ExprNode;
use crate::hint::HintSet;
use crate::plan::logical::{DmlKind, SortDirection};

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl From<JoinKind> for crate::stats::cardinality::JoinKind {
    fn from(k: JoinKind) -> Self {
        match k {
            JoinKind::Inner => crate::stats::cardinality::JoinKind::Inner,
            JoinKind::Left => crate::stats::cardinality::JoinKind::LeftOuter,
            JoinKind::Right => crate::stats::cardinality::JoinKind::RightOuter,
            JoinKind::Full => crate::stats::cardinality::JoinKind::FullOuter,
            JoinKind::Cross => crate::stats::cardinality::JoinKind::Cross,
        }
    }
}

/// One entry in the `joins` list (spec §6): `kind`, the joined table, and
/// its `ON` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub on: Option<ExprNode>,
}

/// A projection-list entry: a column, a wildcard, or an arbitrary
/// expression, with an optional alias and table qualifier (spec §6).
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Wildcard,
    Expr {
        expr: ExprNode,
        alias: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl From<OrderDirection> for SortDirection {
    fn from(d: OrderDirection) -> Self {
        match d {
            OrderDirection::Asc => SortDirection::Asc,
            OrderDirection::Desc => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: ExprNode,
    pub direction: OrderDirection,
}

/// The bound `SELECT` shape the facade builds an initial logical plan from
/// (spec §4.G step 3a: "DataSource(s) -> Join -> Selection(where) ->
/// Aggregate(group+agg) -> Selection(having) -> Projection(select list) ->
/// Sort(order-by) -> Limit").
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStmt {
    /// Empty for a no-`FROM` query (spec §9: session-variable evaluation is
    /// unsupported in that case, but a constant-only `SELECT` is legal).
    pub from: Option<String>,
    pub projection: Vec<SelectItem>,
    pub where_clause: Option<ExprNode>,
    pub joins: Vec<JoinClause>,
    pub group_by: Vec<ExprNode>,
    pub having: Option<ExprNode>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub hints: Option<HintSet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmlTarget {
    Delete,
    Update,
    Insert,
}

impl From<DmlTarget> for DmlKind {
    fn from(k: DmlTarget) -> Self {
        match k {
            DmlTarget::Delete => DmlKind::Delete,
            DmlTarget::Update => DmlKind::Update,
            DmlTarget::Insert => DmlKind::Insert,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DmlStmt {
    pub kind: DmlTarget,
    pub table: String,
    /// The filtered row source for `Update`/`Delete`, or the `SELECT` source
    /// of an `INSERT ... SELECT` (spec §3 "Delete / Update / Insert").
    pub source: Option<Box<SelectStmt>>,
}

/// The tagged statement shape the facade accepts (spec §6). Only `Select`
/// and the three DML kinds carry optimizer-relevant structure; `Create` /
/// `Drop` / `Alter` / `Show` pass straight through to the external
/// DDL/session layer (spec §1 "SHOW/DDL passthrough" is out of scope) and
/// are modeled only so a caller can route them without a parallel type.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStmt),
    Dml(DmlStmt),
    Create(String),
    Drop(String),
    Alter(String),
    Show(String),
}

impl Statement {
    pub fn is_ddl_passthrough(&self) -> bool {
        matches!(
            self,
            Statement::Create(_) | Statement::Drop(_) | Statement::Alter(_) | Statement::Show(_)
        )
    }

    /// Statements that target `information_schema` for a write are rejected
    /// per spec §7 `WriteToReadOnlyVirtualSchema`.
    pub fn targets_information_schema(&self) -> Option<&str> {
        match self {
            Statement::Dml(d) if d.table.eq_ignore_ascii_case("information_schema")
                || d.table.starts_with("information_schema.") =>
            {
                Some(&d.table)
            }
            _ => None,
        }
    }
}
