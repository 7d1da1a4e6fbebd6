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

//! The rule-driven rewrite engine (spec §4.C): a `Rule` trait with no base
//! class (spec §9 "Rule dispatch without subclassing" — values implementing
//! a small three-method interface), and a `RuleSet` that applies all rules
//! to fixpoint. Grounded on the teacher's `Rule::apply` / `BoxedRule`
//! (`rule/top_n_on_index_rule.rs`) and the `optimize_by_rules`/
//! `optimize_by_rules_until_fix_point` fixpoint-loop shape (`optimizer/
//! mod.rs`), cross-checked against `apache-arrow-datafusion`'s
//! `OptimizerRule::try_optimize` Option-return idiom (`datafusion/
//! optimizer/src/eliminate_project.rs`) for the "returning the same
//! subtree means no change" contract.

pub mod context;
pub mod physicalize;
pub mod rules;

use dyn_clone::DynClone;

use crate::error::Result;
use crate::plan::logical::LogicalPlan;

pub use context::RuleContext;
pub use physicalize::physicalize;

/// A hard guard against non-converging rewrites (spec §4.C step 2): no
/// individually-tested rule or standard rule set should ever reach this.
pub const MAX_ITERATIONS: usize = 10;

/// One transformation rule (spec §4.C). `apply` returns a possibly-new
/// subtree; by convention (enforced by equality rather than pointer
/// identity, since plan nodes are owned values, not `Rc`s) returning a
/// plan equal to the input means "no change" and the engine will not loop
/// forever re-visiting it.
pub trait Rule: DynClone {
    /// A stable identifier, used in `RuleFailure` diagnostics and tests.
    fn name(&self) -> &'static str;

    /// A cheap predicate gating traversal; `apply` is only called when this
    /// returns `true`.
    fn matches(&self, node: &LogicalPlan) -> bool;

    /// Rewrite `node`. Implementations must be pure functions of
    /// `(node, ctx)` — no mutation of shared state beyond `ctx.diagnostics`
    /// (spec §4.D "All rules are pure functions of (plan, context) ->
    /// plan").
    fn apply(&self, node: &LogicalPlan, ctx: &mut RuleContext<'_>) -> Result<LogicalPlan>;
}

dyn_clone::clone_trait_object!(Rule);

pub type BoxedRule = Box<dyn Rule>;

/// Iteration statistics for one `RuleSet::apply` call, grounded in the
/// teacher's `HeuristicOptimizer::get_stats()`/`HeuristicOptimizerStats`
/// (`optimizer/mod.rs`), generalized from a single "was any rule applied"
/// flag into counts a caller can log or assert on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleApplicationStats {
    /// Total number of individual rule applications that changed a node,
    /// summed across every node and every iteration.
    pub rules_fired: usize,
    /// Number of fixpoint iterations actually run.
    pub iterations: usize,
    /// Whether the loop ran all `MAX_ITERATIONS` without reaching a fixpoint
    /// (spec §4.C step 2's "hard guard against non-converging rewrites").
    pub guard_hit: bool,
}

/// An ordered collection of rules, applied to fixpoint over a plan tree
/// (spec §4.C). Construction order matters only within one visit of one
/// node; which rule fires first at a given node can change the exact
/// rewrite path, but not the fixpoint any individual rule's own
/// idempotence contract promises.
#[derive(Clone)]
pub struct RuleSet {
    rules: Vec<BoxedRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<BoxedRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[BoxedRule] {
        &self.rules
    }

    /// Run the fixpoint algorithm in spec §4.C step 2 against `root`,
    /// checking `cancelled` at each iteration boundary (spec §5
    /// "Cancellation... checked at each rule-engine iteration boundary").
    pub fn apply(
        &self,
        root: LogicalPlan,
        ctx: &mut RuleContext<'_>,
        cancelled: impl FnMut() -> bool,
    ) -> Result<LogicalPlan> {
        self.apply_with_stats(root, ctx, cancelled).map(|(plan, _)| plan)
    }

    /// Same fixpoint algorithm as [`Self::apply`], additionally returning
    /// [`RuleApplicationStats`] so a caller can log when the hard guard was
    /// nearly (or actually) exhausted.
    pub fn apply_with_stats(
        &self,
        root: LogicalPlan,
        ctx: &mut RuleContext<'_>,
        mut cancelled: impl FnMut() -> bool,
    ) -> Result<(LogicalPlan, RuleApplicationStats)> {
        let mut current = root;
        let mut stats = RuleApplicationStats::default();
        for i in 0..MAX_ITERATIONS {
            if cancelled() {
                return Err(crate::error::OptimizerError::Cancelled);
            }
            let (next, changed, fired) = self.apply_once(&current, ctx)?;
            current = next;
            stats.iterations = i + 1;
            stats.rules_fired += fired;
            if !changed {
                return Ok((current, stats));
            }
        }
        stats.guard_hit = true;
        Ok((current, stats))
    }

    /// One pass: apply every matching rule at `node` (spec §4.C step 2b),
    /// then recurse into every child (step 2c) and rebuild `node` with the
    /// (possibly rewritten) children. Returns the rewritten node, whether
    /// anything changed, and how many individual rule applications fired.
    fn apply_once(
        &self,
        node: &LogicalPlan,
        ctx: &mut RuleContext<'_>,
    ) -> Result<(LogicalPlan, bool, usize)> {
        let mut current = node.clone();
        let mut changed = false;
        let mut fired = 0usize;

        for rule in &self.rules {
            if rule.matches(&current) {
                let rewritten = rule.apply(&current, ctx).map_err(|e| {
                    crate::error::OptimizerError::RuleFailure {
                        rule: rule.name().to_string(),
                        cause: e.to_string(),
                    }
                })?;
                if rewritten != current {
                    changed = true;
                    fired += 1;
                    current = rewritten;
                }
            }
        }

        // Recurse into every child (spec §4.C: rules "MUST NOT early-exit
        // after rewriting the first modified child" — this loop always
        // processes all of them, never stopping at the first that changed).
        let children = current.children();
        if !children.is_empty() {
            let mut new_children = Vec::with_capacity(children.len());
            for child in children {
                let (rewritten_child, child_changed, child_fired) = self.apply_once(child, ctx)?;
                if child_changed {
                    changed = true;
                }
                fired += child_fired;
                new_children.push(rewritten_child);
            }
            current = current.set_children(new_children);
        }

        Ok((current, changed, fired))
    }
}
