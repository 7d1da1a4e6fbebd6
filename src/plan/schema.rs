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

//! Output schema: an ordered list of `{name, type, nullable}` columns
//! (spec §3, §4.A). Mirrors the shape of the teacher's
//! `risingwave_common::catalog::{Schema, Field}`, without the physical
//! column-id bookkeeping those carry (`FieldDisplay`, `ColumnId`) that this
//! crate has no storage layer to hand back to.

use crate::catalog::DataType;
use crate::expr::{ExprNode, Literal, Op};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// All `names` are present in this schema — the exact check
    /// `PredicatePushdown`/`ColumnPruning` use before moving a predicate or
    /// dropping a column (spec §4.D, §8 property 5: "all columns... or not
    /// pushed at all").
    pub fn contains_all(&self, names: &[String]) -> bool {
        names.iter().all(|n| self.contains(n))
    }

    /// `Join`'s schema rule (spec §4.A): left schema followed by right
    /// schema; on a name collision the right occurrence is renamed by
    /// prefixing `right_`.
    pub fn join(left: &Schema, right: &Schema) -> Schema {
        let mut fields = left.fields.clone();
        for f in &right.fields {
            if left.contains(&f.name) {
                let mut renamed = f.clone();
                renamed.name = format!("right_{}", f.name);
                fields.push(renamed);
            } else {
                fields.push(f.clone());
            }
        }
        Schema { fields }
    }
}

/// Infer the output type of an expression given the schema of the subtree
/// it's evaluated over. There is no SQL type-checker in this crate (out of
/// scope per spec §1); this is a pragmatic best-effort inference used only
/// to populate `Field::data_type` on derived schemas — it never rejects an
/// expression, falling back to the type of a plausible operand.
pub fn infer_type(expr: &ExprNode, input: &Schema) -> DataType {
    match expr {
        ExprNode::Column { name, .. } => input
            .field(name)
            .map(|f| f.data_type)
            .unwrap_or(DataType::Varchar),
        ExprNode::CorrelatedColumn { .. } => DataType::Varchar,
        ExprNode::Value(lit) => literal_type(lit),
        ExprNode::Function { name, args } => function_type(name, args, input),
        ExprNode::Operator { op, left, .. } => operator_type(*op, left.as_deref(), input),
    }
}

fn literal_type(lit: &Literal) -> DataType {
    match lit {
        Literal::Null => DataType::Varchar,
        Literal::Bool(_) => DataType::Boolean,
        Literal::Int(_) => DataType::Int64,
        Literal::Float(_) => DataType::Float64,
        Literal::Str(_) => DataType::Varchar,
    }
}

fn operator_type(op: Op, left: Option<&ExprNode>, input: &Schema) -> DataType {
    match op {
        Op::Eq
        | Op::Neq
        | Op::Gt
        | Op::Gte
        | Op::Lt
        | Op::Lte
        | Op::And
        | Op::Or
        | Op::Not
        | Op::Like
        | Op::In
        | Op::Between
        | Op::IsNull
        | Op::IsNotNull => DataType::Boolean,
        Op::Plus | Op::Minus | Op::Mul | Op::Div => {
            left.map(|l| infer_type(l, input)).unwrap_or(DataType::Float64)
        }
    }
}

fn function_type(name: &str, args: &[ExprNode], input: &Schema) -> DataType {
    match name.to_ascii_lowercase().as_str() {
        "count" => DataType::Int64,
        "sum" | "avg" => DataType::Float64,
        "max" | "min" => args
            .first()
            .map(|a| infer_type(a, input))
            .unwrap_or(DataType::Float64),
        _ => DataType::Varchar,
    }
}
