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

//! Expression trees (spec §6, §9). A small, separate tagged value with the
//! same ownership discipline as [`crate::plan`]: no shared mutable state,
//! no global interning table. Grounded on the teacher's `ExprImpl`/
//! `ExprRewriter` split (`src/frontend/src/utils/mod.rs`'s `Substitute`),
//! reduced to the shape this crate actually needs.

pub mod display;
pub mod fold;

use std::fmt;

use parse_display::Display;

/// A scalar literal. `Null` is distinct from "no literal" — an absent
/// literal is simply not an [`ExprNode::Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Literal {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Int(i) => Some(*i as f64),
            Literal::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "NULL"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Recognized operators (spec §6), both binary and unary. `args` carries
/// the n-ary forms (`IN`, `BETWEEN`) that do not fit the binary `left`/
/// `right` shape; `apply` constructors below enforce which arity each
/// variant expects so a malformed tree cannot be built through this API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "snake_case")]
pub enum Op {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Plus,
    Minus,
    Mul,
    Div,
    And,
    Or,
    Not,
    Like,
    In,
    Between,
    IsNull,
    IsNotNull,
}

impl Op {
    /// Parse a recognized operator keyword or SQL-symbol alias (spec §6).
    pub fn parse(token: &str) -> Option<Op> {
        Some(match token {
            "eq" | "=" => Op::Eq,
            "neq" | "!=" | "<>" => Op::Neq,
            "gt" | ">" => Op::Gt,
            "gte" | ">=" => Op::Gte,
            "lt" | "<" => Op::Lt,
            "lte" | "<=" => Op::Lte,
            "plus" | "+" => Op::Plus,
            "minus" | "-" => Op::Minus,
            "mul" | "*" => Op::Mul,
            "div" | "/" => Op::Div,
            "and" => Op::And,
            "or" => Op::Or,
            "not" => Op::Not,
            "like" => Op::Like,
            "in" => Op::In,
            "between" => Op::Between,
            "is null" => Op::IsNull,
            "is not null" => Op::IsNotNull,
            _ => return None,
        })
    }

    /// The negated operator, when a simple syntactic negation exists.
    /// Used by `ConstantFolding` to turn `NOT (a = b)` into `a != b`, etc.
    pub fn negate(self) -> Option<Op> {
        Some(match self {
            Op::Eq => Op::Neq,
            Op::Neq => Op::Eq,
            Op::Gt => Op::Lte,
            Op::Gte => Op::Lt,
            Op::Lt => Op::Gte,
            Op::Lte => Op::Gt,
            Op::IsNull => Op::IsNotNull,
            Op::IsNotNull => Op::IsNull,
            _ => return None,
        })
    }

    /// The SQL-symbol rendering used by column naming (spec §6), not the
    /// internal keyword.
    pub fn sql_symbol(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Neq => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::And => " AND ",
            Op::Or => " OR ",
            Op::Not => "NOT ",
            Op::Like => " LIKE ",
            Op::In => " IN ",
            Op::Between => " BETWEEN ",
            Op::IsNull => " IS NULL",
            Op::IsNotNull => " IS NOT NULL",
        }
    }

    pub fn is_binary(self) -> bool {
        matches!(
            self,
            Op::Eq
                | Op::Neq
                | Op::Gt
                | Op::Gte
                | Op::Lt
                | Op::Lte
                | Op::Plus
                | Op::Minus
                | Op::Mul
                | Op::Div
                | Op::And
                | Op::Or
                | Op::Like
        )
    }
}

/// An expression node (spec §6). Columns resolve positionally against the
/// schema of the subtree beneath the referring plan node (invariant 2 in
/// spec §3), except correlated references inside `Apply`, which are
/// resolved against an enclosing `Apply`'s left child and carry their
/// nesting level explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    Value(Literal),
    Column {
        name: String,
        table: Option<String>,
    },
    /// A correlated reference to an outer query's column, only valid
    /// inside an `Apply`'s right subtree (spec §3, §9).
    CorrelatedColumn {
        name: String,
        nesting_level: usize,
    },
    Operator {
        op: Op,
        left: Option<Box<ExprNode>>,
        right: Option<Box<ExprNode>>,
        args: Vec<ExprNode>,
    },
    Function {
        name: String,
        args: Vec<ExprNode>,
    },
}

impl ExprNode {
    pub fn col(name: impl Into<String>) -> Self {
        ExprNode::Column {
            name: name.into(),
            table: None,
        }
    }

    pub fn qualified_col(table: impl Into<String>, name: impl Into<String>) -> Self {
        ExprNode::Column {
            name: name.into(),
            table: Some(table.into()),
        }
    }

    pub fn value(lit: Literal) -> Self {
        ExprNode::Value(lit)
    }

    pub fn binary(op: Op, left: ExprNode, right: ExprNode) -> Self {
        assert!(op.is_binary(), "{op:?} is not a binary operator");
        ExprNode::Operator {
            op,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
            args: Vec::new(),
        }
    }

    pub fn unary(op: Op, operand: ExprNode) -> Self {
        ExprNode::Operator {
            op,
            left: Some(Box::new(operand)),
            right: None,
            args: Vec::new(),
        }
    }

    pub fn is_const_true(&self) -> bool {
        matches!(self, ExprNode::Value(Literal::Bool(true)))
    }

    pub fn is_const_false(&self) -> bool {
        matches!(self, ExprNode::Value(Literal::Bool(false)))
    }

    /// Split a conjunction (`AND`-tree) into its top-level conjuncts, the
    /// way `PredicatePushdown` needs to push each one independently
    /// (spec §4.D). A non-`AND` expression is its own single conjunct.
    pub fn conjuncts(&self) -> Vec<&ExprNode> {
        match self {
            ExprNode::Operator {
                op: Op::And,
                left: Some(l),
                right: Some(r),
                ..
            } => {
                let mut out = l.conjuncts();
                out.extend(r.conjuncts());
                out
            }
            other => vec![other],
        }
    }

    /// Rebuild a conjunction from a list of conjuncts (identity of
    /// `conjuncts`/`from_conjuncts` up to associativity).
    pub fn from_conjuncts(mut conjuncts: Vec<ExprNode>) -> ExprNode {
        match conjuncts.len() {
            0 => ExprNode::Value(Literal::Bool(true)),
            1 => conjuncts.pop().unwrap(),
            _ => {
                let first = conjuncts.remove(0);
                conjuncts
                    .into_iter()
                    .fold(first, |acc, e| ExprNode::binary(Op::And, acc, e))
            }
        }
    }

    /// All (unqualified) column names referenced anywhere in this
    /// expression tree, used by `PredicatePushdown`/`ColumnPruning` to
    /// check schema containment (spec §4.D, §8 property 5).
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, out: &mut Vec<String>) {
        match self {
            ExprNode::Column { name, .. } => out.push(name.clone()),
            ExprNode::CorrelatedColumn { .. } | ExprNode::Value(_) => {}
            ExprNode::Operator {
                left, right, args, ..
            } => {
                if let Some(l) = left {
                    l.collect_columns(out);
                }
                if let Some(r) = right {
                    r.collect_columns(out);
                }
                for a in args {
                    a.collect_columns(out);
                }
            }
            ExprNode::Function { args, .. } => {
                for a in args {
                    a.collect_columns(out);
                }
            }
        }
    }

    pub fn has_correlated_column(&self) -> bool {
        match self {
            ExprNode::CorrelatedColumn { .. } => true,
            ExprNode::Column { .. } | ExprNode::Value(_) => false,
            ExprNode::Operator {
                left, right, args, ..
            } => {
                left.as_deref().is_some_and(ExprNode::has_correlated_column)
                    || right.as_deref().is_some_and(ExprNode::has_correlated_column)
                    || args.iter().any(ExprNode::has_correlated_column)
            }
            ExprNode::Function { args, .. } => args.iter().any(ExprNode::has_correlated_column),
        }
    }
}

/// A conjunction of filter predicates, kept as a flat list of conjuncts
/// rather than a single `AND`-tree so rules can inspect/split/rejoin them
/// without repeated tree-walking. Grounded on the teacher's `Condition`
/// (`src/frontend/src/utils/condition.rs`, referenced from `utils/mod.rs`
/// but not itself part of this retrieval pack) — same role, reduced shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    pub conjunctions: Vec<ExprNode>,
}

impl Condition {
    pub fn true_cond() -> Self {
        Self {
            conjunctions: Vec::new(),
        }
    }

    pub fn with_expr(expr: ExprNode) -> Self {
        Self {
            conjunctions: expr.conjuncts().into_iter().cloned().collect(),
        }
    }

    pub fn is_true(&self) -> bool {
        self.conjunctions.is_empty()
    }

    pub fn to_expr(&self) -> ExprNode {
        ExprNode::from_conjuncts(self.conjunctions.clone())
    }

    pub fn and(mut self, other: Condition) -> Condition {
        self.conjunctions.extend(other.conjunctions);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conjunct_split_and_rejoin_roundtrips() {
        let e = ExprNode::binary(
            Op::And,
            ExprNode::binary(Op::Gt, ExprNode::col("a"), ExprNode::value(Literal::Int(5))),
            ExprNode::binary(Op::Lt, ExprNode::col("b"), ExprNode::value(Literal::Int(10))),
        );
        let conjuncts = e.conjuncts();
        assert_eq!(conjuncts.len(), 2);
        let rejoined = ExprNode::from_conjuncts(conjuncts.into_iter().cloned().collect());
        assert_eq!(rejoined.conjuncts().len(), 2);
    }

    #[test]
    fn referenced_columns_collects_both_sides() {
        let e = ExprNode::binary(Op::Eq, ExprNode::col("users.id"), ExprNode::col("orders.user_id"));
        let cols = e.referenced_columns();
        assert_eq!(cols, vec!["users.id".to_string(), "orders.user_id".to_string()]);
    }

    #[test]
    fn op_parse_accepts_symbols_and_keywords() {
        assert_eq!(Op::parse("="), Some(Op::Eq));
        assert_eq!(Op::parse("eq"), Some(Op::Eq));
        assert_eq!(Op::parse("<>"), Some(Op::Neq));
        assert_eq!(Op::parse("nonsense"), None);
    }
}
