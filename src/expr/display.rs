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

//! Bit-for-bit stable column naming (spec §6 "Column naming conventions").
//! Used by `Projection` to derive a column name when no alias is given, and
//! by the `Aggregate` schema rule's `<FUNC>(<arg>)` rendering.

use super::{ExprNode, Op};

/// The deterministic derived name for an expression with no explicit alias.
pub fn derive_name(expr: &ExprNode) -> String {
    match expr {
        ExprNode::Column { name, .. } => name.clone(),
        ExprNode::CorrelatedColumn { name, .. } => name.clone(),
        ExprNode::Value(lit) => lit.to_string(),
        ExprNode::Function { name, args } => {
            let rendered_args = args.iter().map(derive_name).collect::<Vec<_>>().join(", ");
            format!("{}({})", name.to_uppercase(), rendered_args)
        }
        ExprNode::Operator {
            op, left, right, ..
        } => match (left, right) {
            (Some(l), Some(r)) => format!("{}{}{}", derive_name(l), op.sql_symbol(), derive_name(r)),
            (Some(l), None) => unary_name(*op, l),
            (None, Some(r)) => unary_name(*op, r),
            (None, None) => op.sql_symbol().to_string(),
        },
    }
}

fn unary_name(op: Op, operand: &ExprNode) -> String {
    match op {
        Op::Not => format!("NOT {}", derive_name(operand)),
        Op::Minus => format!("-{}", derive_name(operand)),
        Op::IsNull | Op::IsNotNull => format!("{}{}", derive_name(operand), op.sql_symbol()),
        _ => format!("{}{}", op.sql_symbol(), derive_name(operand)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Literal;

    #[test]
    fn function_call_renders_with_args() {
        let e = ExprNode::Function {
            name: "count".into(),
            args: vec![ExprNode::col("a")],
        };
        assert_eq!(derive_name(&e), "COUNT(a)");
    }

    #[test]
    fn function_call_with_no_args_has_empty_parens() {
        let e = ExprNode::Function {
            name: "count".into(),
            args: vec![],
        };
        assert_eq!(derive_name(&e), "COUNT()");
    }

    #[test]
    fn binary_operator_uses_sql_symbol() {
        let e = ExprNode::binary(Op::Plus, ExprNode::col("a"), ExprNode::col("b"));
        assert_eq!(derive_name(&e), "a+b");
    }

    #[test]
    fn unary_not_and_minus() {
        assert_eq!(derive_name(&ExprNode::unary(Op::Not, ExprNode::value(Literal::Bool(true)))), "NOT true");
        assert_eq!(derive_name(&ExprNode::unary(Op::Minus, ExprNode::value(Literal::Int(5)))), "-5");
    }

    #[test]
    fn literal_null_renders_as_null_string() {
        assert_eq!(derive_name(&ExprNode::value(Literal::Null)), "NULL");
    }
}
