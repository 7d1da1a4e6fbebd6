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

//! The concrete rule set (spec §4.D table). `standard_rule_set` fixes a
//! single construction order; the fixpoint engine (`RuleSet::apply`)
//! revisits every node on every pass regardless of order, so ordering here
//! only controls which rule gets first crack at a node within one pass, not
//! whether a rewrite eventually happens.
//!
//! Decorrelation runs ahead of `JoinReorder`: a correlated subquery is
//! still an `Apply`, not a `Join`, until `Decorrelate`/`SemiJoinRewrite`
//! resolve it, and `JoinReorder` only matches chains of `Inner` `Join`
//! nodes (spec §4.D). `SubqueryFlattening` is listed last among the rules
//! here because it only matches what `Decorrelate` leaves behind
//! (`right_max_one_row` surviving on an already-uncorrelated `Apply`).
//!
//! `SubqueryMaterialization` is not part of this set: it needs whole-plan
//! visibility `Rule::matches`/`Rule::apply` don't provide (see
//! `subquery_materialization`'s module docs) and runs as its own pass.

pub mod column_pruning;
pub mod constant_folding;
pub mod decorrelate;
pub mod derive_topn_from_window;
pub mod join_reorder;
pub mod limit_pushdown;
pub mod max_min_elimination;
pub mod predicate_pushdown;
pub mod semi_join_rewrite;
pub mod subquery_flattening;
pub mod subquery_materialization;
pub mod topn_pushdown;

pub use column_pruning::ColumnPruning;
pub use constant_folding::ConstantFolding;
pub use decorrelate::Decorrelate;
pub use derive_topn_from_window::DeriveTopNFromWindow;
pub use join_reorder::JoinReorder;
pub use limit_pushdown::LimitPushdown;
pub use max_min_elimination::MaxMinElimination;
pub use predicate_pushdown::PredicatePushdown;
pub use semi_join_rewrite::SemiJoinRewrite;
pub use subquery_flattening::SubqueryFlattening;
pub use subquery_materialization::materialize_repeated_subqueries;
pub use topn_pushdown::TopNPushdown;

use crate::rule::{BoxedRule, RuleSet};

/// The fixed rule set the facade runs to fixpoint (spec §4.D "minimum
/// faithful reproduction").
pub fn standard_rule_set() -> RuleSet {
    let rules: Vec<BoxedRule> = vec![
        Box::new(ConstantFolding),
        Box::new(SemiJoinRewrite),
        Box::new(Decorrelate),
        Box::new(SubqueryFlattening),
        Box::new(PredicatePushdown),
        Box::new(ColumnPruning),
        Box::new(JoinReorder),
        Box::new(LimitPushdown),
        Box::new(TopNPushdown),
        Box::new(DeriveTopNFromWindow),
        Box::new(MaxMinElimination),
    ];
    RuleSet::new(rules)
}
