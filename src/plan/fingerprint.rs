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

//! A deterministic 64-bit FNV-1a structural hash (spec §4.F: "A 64-bit
//! FNV-1a hash computed deterministically over the statement"). Plain
//! arithmetic, not `std::hash::Hasher` — FNV-1a's byte-at-a-time update is
//! simple enough that reaching for `std::collections::hash_map`'s
//! `SipHasher` (randomly seeded per process, by design unsuitable for a
//! cache key that must be stable across calls) would be the wrong tool,
//! and no registry crate in this workspace's stack owns "structural hash
//! of an expression tree" as a concern the way `tracing`/`serde` own
//! logging/serialization.

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone, Copy)]
pub struct Fnv1a(u64);

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}

impl Fnv1a {
    pub fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 ^= *b as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    /// NUL-terminated so `write_str("ab"); write_str("c")` cannot collide
    /// with `write_str("a"); write_str("bc")`.
    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
        self.write_bytes(&[0]);
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.write_bytes(&v.to_bits().to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_bytes(&[v as u8]);
    }

    pub fn finish(&self) -> u64 {
        self.0
    }
}

use crate::expr::{ExprNode, Literal};

/// Pre-order structural hash of an expression tree (spec §4.F: "including
/// operator, column, and literal bytes").
pub fn hash_expr(expr: &ExprNode, h: &mut Fnv1a) {
    match expr {
        ExprNode::Value(lit) => {
            h.write_str("value");
            hash_literal(lit, h);
        }
        ExprNode::Column { name, table } => {
            h.write_str("column");
            h.write_str(table.as_deref().unwrap_or(""));
            h.write_str(name);
        }
        ExprNode::CorrelatedColumn { name, nesting_level } => {
            h.write_str("correlated_column");
            h.write_str(name);
            h.write_u64(*nesting_level as u64);
        }
        ExprNode::Operator { op, left, right, args } => {
            h.write_str("operator");
            h.write_str(&op.to_string());
            match left {
                Some(l) => hash_expr(l, h),
                None => h.write_str("none"),
            }
            match right {
                Some(r) => hash_expr(r, h),
                None => h.write_str("none"),
            }
            h.write_u64(args.len() as u64);
            for a in args {
                hash_expr(a, h);
            }
        }
        ExprNode::Function { name, args } => {
            h.write_str("function");
            h.write_str(name);
            h.write_u64(args.len() as u64);
            for a in args {
                hash_expr(a, h);
            }
        }
    }
}

fn hash_literal(lit: &Literal, h: &mut Fnv1a) {
    match lit {
        Literal::Null => h.write_str("null"),
        Literal::Bool(b) => {
            h.write_str("bool");
            h.write_bool(*b);
        }
        Literal::Int(i) => {
            h.write_str("int");
            h.write_i64(*i);
        }
        Literal::Float(f) => {
            h.write_str("float");
            h.write_f64(*f);
        }
        Literal::Str(s) => {
            h.write_str("str");
            h.write_str(s);
        }
    }
}

use super::logical::LogicalPlan;

/// Structural hash of a whole logical-plan subtree, used by
/// `rule::rules::subquery_materialization` to detect repeated subqueries
/// (spec §4.D) — a broader-grained sibling of [`hash_expr`] over plan
/// nodes rather than expressions.
pub fn hash_plan(plan: &LogicalPlan, h: &mut Fnv1a) {
    match plan {
        LogicalPlan::DataSource(ds) => {
            h.write_str("data_source");
            h.write_str(&ds.table.name);
            match &ds.projected_columns {
                Some(cols) => {
                    h.write_u64(cols.len() as u64);
                    for c in cols {
                        h.write_str(c);
                    }
                }
                None => h.write_str("all"),
            }
            for f in &ds.pushed_filters {
                hash_expr(f, h);
            }
        }
        LogicalPlan::Selection(s) => {
            h.write_str("selection");
            for c in &s.condition.conjunctions {
                hash_expr(c, h);
            }
            hash_plan(&s.input, h);
        }
        LogicalPlan::Projection(p) => {
            h.write_str("projection");
            h.write_u64(p.items.len() as u64);
            for item in &p.items {
                hash_expr(&item.expr, h);
                h.write_str(item.alias.as_deref().unwrap_or(""));
            }
            hash_plan(&p.input, h);
        }
        LogicalPlan::Join(j) => {
            h.write_str("join");
            h.write_str(&format!("{:?}", j.kind));
            for c in &j.condition.conjunctions {
                hash_expr(c, h);
            }
            hash_plan(&j.left, h);
            hash_plan(&j.right, h);
        }
        LogicalPlan::Apply(a) => {
            h.write_str("apply");
            h.write_str(&format!("{:?}", a.kind));
            for c in &a.condition.conjunctions {
                hash_expr(c, h);
            }
            h.write_u64(a.correlated_columns.len() as u64);
            for c in &a.correlated_columns {
                h.write_str(&c.name);
                h.write_u64(c.nesting_level as u64);
            }
            hash_plan(&a.left, h);
            hash_plan(&a.right, h);
        }
        LogicalPlan::Aggregate(a) => {
            h.write_str("aggregate");
            for g in &a.group_by {
                hash_expr(g, h);
            }
            for item in &a.items {
                h.write_str(item.func.label());
                if let Some(arg) = &item.arg {
                    hash_expr(arg, h);
                }
            }
            hash_plan(&a.input, h);
        }
        LogicalPlan::Sort(s) => {
            h.write_str("sort");
            for item in &s.items {
                hash_expr(&item.expr, h);
                h.write_str(&format!("{:?}", item.direction));
            }
            hash_plan(&s.input, h);
        }
        LogicalPlan::TopN(t) => {
            h.write_str("topn");
            for item in &t.items {
                hash_expr(&item.expr, h);
                h.write_str(&format!("{:?}", item.direction));
            }
            h.write_u64(t.limit);
            h.write_u64(t.offset);
            hash_plan(&t.input, h);
        }
        LogicalPlan::Limit(l) => {
            h.write_str("limit");
            h.write_u64(l.limit);
            h.write_u64(l.offset);
            hash_plan(&l.input, h);
        }
        LogicalPlan::Window(w) => {
            h.write_str("window");
            for item in &w.items {
                h.write_str(&item.func);
                for a in &item.args {
                    hash_expr(a, h);
                }
            }
            hash_plan(&w.input, h);
        }
        LogicalPlan::SetOp(s) => {
            h.write_str("set_op");
            h.write_str(&format!("{:?}", s.kind));
            hash_plan(&s.left, h);
            hash_plan(&s.right, h);
        }
        LogicalPlan::Dml(d) => {
            h.write_str("dml");
            h.write_str(&format!("{:?}", d.kind));
            h.write_str(&d.target.name);
            if let Some(source) = &d.source {
                hash_plan(source, h);
            }
        }
    }
}

use crate::stmt::{DmlStmt, SelectItem, SelectStmt, Statement};

/// The plan-cache key (spec §4.F): "a 64-bit FNV-1a hash computed
/// deterministically over the statement: statement kind; table names;
/// projected column references... ; a structural hash of WHERE and HAVING
/// expression trees... ; join kinds and conditions; group-by columns;
/// order-by items... ; and bounded LIMIT/OFFSET values." Deliberately
/// independent of hints and of the statement's literal text/whitespace
/// (spec §8 property 12) — two statements differing only in how they were
/// written hash identically as long as their bound structure matches.
pub fn fingerprint_statement(stmt: &Statement) -> u64 {
    let mut h = Fnv1a::new();
    match stmt {
        Statement::Select(s) => {
            h.write_str("select");
            hash_select(s, &mut h);
        }
        Statement::Dml(d) => {
            h.write_str("dml");
            hash_dml(d, &mut h);
        }
        Statement::Create(s) => {
            h.write_str("create");
            h.write_str(s);
        }
        Statement::Drop(s) => {
            h.write_str("drop");
            h.write_str(s);
        }
        Statement::Alter(s) => {
            h.write_str("alter");
            h.write_str(s);
        }
        Statement::Show(s) => {
            h.write_str("show");
            h.write_str(s);
        }
    }
    h.finish()
}

fn hash_select(s: &SelectStmt, h: &mut Fnv1a) {
    h.write_str(s.from.as_deref().unwrap_or(""));

    h.write_u64(s.projection.len() as u64);
    for item in &s.projection {
        match item {
            SelectItem::Wildcard => h.write_str("*"),
            SelectItem::Expr { expr, alias } => {
                h.write_str("expr");
                hash_expr(expr, h);
                h.write_str(alias.as_deref().unwrap_or(""));
            }
        }
    }

    match &s.where_clause {
        Some(e) => hash_expr(e, h),
        None => h.write_str("none"),
    }

    h.write_u64(s.joins.len() as u64);
    for j in &s.joins {
        h.write_str(&format!("{:?}", j.kind));
        h.write_str(&j.table);
        match &j.on {
            Some(e) => hash_expr(e, h),
            None => h.write_str("none"),
        }
    }

    h.write_u64(s.group_by.len() as u64);
    for g in &s.group_by {
        hash_expr(g, h);
    }

    match &s.having {
        Some(e) => hash_expr(e, h),
        None => h.write_str("none"),
    }

    h.write_u64(s.order_by.len() as u64);
    for o in &s.order_by {
        hash_expr(&o.expr, h);
        h.write_str(&format!("{:?}", o.direction));
    }

    match s.limit {
        Some(l) => h.write_u64(l),
        None => h.write_str("none"),
    }
    match s.offset {
        Some(o) => h.write_u64(o),
        None => h.write_str("none"),
    }
}

fn hash_dml(d: &DmlStmt, h: &mut Fnv1a) {
    h.write_str(&format!("{:?}", d.kind));
    h.write_str(&d.table);
    match &d.source {
        Some(s) => hash_select(s, h),
        None => h.write_str("none"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Op;

    #[test]
    fn identical_expressions_hash_identically() {
        let e1 = ExprNode::binary(Op::Eq, ExprNode::col("a"), ExprNode::value(Literal::Int(1)));
        let e2 = ExprNode::binary(Op::Eq, ExprNode::col("a"), ExprNode::value(Literal::Int(1)));
        let mut h1 = Fnv1a::new();
        hash_expr(&e1, &mut h1);
        let mut h2 = Fnv1a::new();
        hash_expr(&e2, &mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn different_literals_hash_differently() {
        let e1 = ExprNode::binary(Op::Eq, ExprNode::col("a"), ExprNode::value(Literal::Int(1)));
        let e2 = ExprNode::binary(Op::Eq, ExprNode::col("a"), ExprNode::value(Literal::Int(2)));
        let mut h1 = Fnv1a::new();
        hash_expr(&e1, &mut h1);
        let mut h2 = Fnv1a::new();
        hash_expr(&e2, &mut h2);
        assert_ne!(h1.finish(), h2.finish());
    }

    #[test]
    fn string_concatenation_boundary_does_not_collide() {
        let mut h1 = Fnv1a::new();
        h1.write_str("ab");
        h1.write_str("c");
        let mut h2 = Fnv1a::new();
        h2.write_str("a");
        h2.write_str("bc");
        assert_ne!(h1.finish(), h2.finish());
    }

    fn select(from: &str, projection: Vec<SelectItem>) -> Statement {
        Statement::Select(SelectStmt {
            from: Some(from.to_string()),
            projection,
            ..Default::default()
        })
    }

    /// Spec §8 property 12: "Two statements that differ only in literal
    /// whitespace produce the same fingerprint" — the fingerprint is over
    /// bound structure, so two `Statement`s built identically (as a parser
    /// would for differently-whitespaced but equivalent SQL text) always
    /// match regardless of any original source formatting.
    #[test]
    fn structurally_identical_statements_fingerprint_identically() {
        let a = select("t", vec![SelectItem::Expr { expr: ExprNode::col("a"), alias: None }]);
        let b = select("t", vec![SelectItem::Expr { expr: ExprNode::col("a"), alias: None }]);
        assert_eq!(fingerprint_statement(&a), fingerprint_statement(&b));
    }

    #[test]
    fn swapped_projection_columns_fingerprint_differently() {
        let a = select(
            "t",
            vec![
                SelectItem::Expr { expr: ExprNode::col("a"), alias: None },
                SelectItem::Expr { expr: ExprNode::col("b"), alias: None },
            ],
        );
        let b = select(
            "t",
            vec![
                SelectItem::Expr { expr: ExprNode::col("b"), alias: None },
                SelectItem::Expr { expr: ExprNode::col("a"), alias: None },
            ],
        );
        assert_ne!(fingerprint_statement(&a), fingerprint_statement(&b));
    }

    #[test]
    fn different_from_table_fingerprints_differently() {
        let a = select("t", vec![SelectItem::Wildcard]);
        let b = select("s", vec![SelectItem::Wildcard]);
        assert_ne!(fingerprint_statement(&a), fingerprint_statement(&b));
    }
}
