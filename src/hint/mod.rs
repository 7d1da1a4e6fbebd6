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

//! Structured optimizer hints (spec §3, §4.E) plus the diagnostics sink a
//! hint that could not be honored is recorded into rather than surfaced as
//! an error. The hint *surface* named throughout spec.md (`LEADING`,
//! `STRAIGHT_JOIN`, `HASH_JOIN`/`NO_HASH_JOIN`, `INL_JOIN`, `FORCE_INDEX`,
//! `HASH_AGG`, ...) is MySQL/TiDB-flavored, not the teacher's own hint
//! surface (the teacher has none in this retrieval pack); the
//! registry/validation-rule *shape* below is enriched from
//! `harborgrid-justin-rusty-db/src/optimizer_pro/hints.rs`, which models
//! hints as a registry of named, categorized, validated directives rather
//! than being parsed ad hoc.

use std::collections::{HashMap, HashSet};

/// A table reference as it appears in a hint (spec §3: "per-table index
/// use/force/ignore lists", "join algorithm preferences per table set").
pub type TableName = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinAlgo {
    Hash,
    Merge,
    IndexNestedLoop,
    IndexNestedLoopHash,
    IndexNestedLoopMerge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggAlgo {
    HashAgg,
    StreamAgg,
    Mpp1Phase,
    Mpp2Phase,
}

impl AggAlgo {
    /// Priority order, highest first, per spec §4.E.
    pub const PRIORITY: [AggAlgo; 4] = [
        AggAlgo::HashAgg,
        AggAlgo::StreamAgg,
        AggAlgo::Mpp1Phase,
        AggAlgo::Mpp2Phase,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AggAlgo::HashAgg => "HASH_AGG",
            AggAlgo::StreamAgg => "STREAM_AGG",
            AggAlgo::Mpp1Phase => "MPP_1PHASE_AGG",
            AggAlgo::Mpp2Phase => "MPP_2PHASE_AGG",
        }
    }
}

/// Per-table-set join algorithm preference (spec §3, §4.E priorities 3-4).
#[derive(Debug, Clone, Default)]
pub struct JoinHints {
    /// `LEADING(t1, t2, ...)`: forces an exact table order. Empty = absent.
    pub leading: Vec<TableName>,
    /// `STRAIGHT_JOIN`: preserve the left-deep order as written.
    pub straight_join: bool,
    /// Positive algorithm hints: table-set (as a sorted table-name key) -> algorithm.
    pub positive: HashMap<Vec<TableName>, JoinAlgo>,
    /// Negative algorithm hints (`NO_HASH_JOIN`, ...): forbidden algorithms per table-set.
    pub negative: HashMap<Vec<TableName>, HashSet<JoinAlgo>>,
}

/// Per-table index directives (spec §3, §4.E).
#[derive(Debug, Clone, Default)]
pub struct IndexHints {
    pub force: HashMap<TableName, String>,
    pub use_list: HashMap<TableName, Vec<String>>,
    pub ignore: HashMap<TableName, Vec<String>>,
    pub order_index: HashSet<TableName>,
    pub no_order_index: HashSet<TableName>,
}

/// Global resource constraints (spec §3).
#[derive(Debug, Clone, Default)]
pub struct ResourceHints {
    pub max_execution_time_ms: Option<u64>,
    pub memory_quota_bytes: Option<u64>,
    pub resource_group: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HintSet {
    pub join: JoinHints,
    pub index: IndexHints,
    pub agg_algo: Option<AggAlgo>,
    /// Subquery rewrite toggles, e.g. disabling `SemiJoinRewrite` for a
    /// particular statement.
    pub subquery_rewrite_enabled: bool,
    pub resources: ResourceHints,
}

impl HintSet {
    pub fn none() -> Self {
        Self {
            subquery_rewrite_enabled: true,
            ..Default::default()
        }
    }

    pub fn join_algo_for(&self, tables: &[TableName]) -> Option<JoinAlgo> {
        let key = sorted_key(tables);
        self.join.positive.get(&key).copied()
    }

    pub fn is_algo_forbidden(&self, tables: &[TableName], algo: JoinAlgo) -> bool {
        let key = sorted_key(tables);
        self.join
            .negative
            .get(&key)
            .is_some_and(|set| set.contains(&algo))
    }
}

fn sorted_key(tables: &[TableName]) -> Vec<TableName> {
    let mut v = tables.to_vec();
    v.sort();
    v
}

/// Why a hint was not honored, recorded rather than returned as an error
/// (spec §4.E: "dropped silently from effect but remains in diagnostics").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintOutcome {
    Applied,
    /// Overridden by a higher-priority hint of the same class.
    Overridden,
    /// The named table/index/column does not participate in this statement.
    NotApplicable,
    /// Conflicts with another hint in the same class (e.g. two incompatible `LEADING`s).
    Conflicting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintDiagnostic {
    pub hint: String,
    pub outcome: HintOutcome,
    pub detail: String,
}

/// Accumulates hint diagnostics for one optimization call. Grounded on the
/// teacher's `ctx.trace(...)` accumulation idiom (`optimizer/mod.rs`),
/// generalized from an explain-trace string buffer into structured records.
#[derive(Debug, Clone, Default)]
pub struct HintDiagnostics {
    records: Vec<HintDiagnostic>,
}

impl HintDiagnostics {
    /// Records a hint's disposition. A hint's outcome is meant to be an
    /// authoritative per-hint record (spec §4.E), not a per-visit log: a
    /// rule such as `JoinReorder` matches its node on every fixpoint
    /// iteration (`RuleSet::apply_once` revisits every node each pass) and
    /// would otherwise report the same disposition once per iteration. An
    /// identical `(hint, outcome, detail)` triple already present is
    /// therefore a duplicate report of the same disposition and is dropped;
    /// a genuinely different outcome or detail for the same hint (e.g. a
    /// later override) is still recorded.
    pub fn record(&mut self, hint: impl Into<String>, outcome: HintOutcome, detail: impl Into<String>) {
        let hint = hint.into();
        let detail = detail.into();
        if self
            .records
            .iter()
            .any(|r| r.hint == hint && r.outcome == outcome && r.detail == detail)
        {
            return;
        }
        self.records.push(HintDiagnostic {
            hint,
            outcome,
            detail,
        });
    }

    pub fn records(&self) -> &[HintDiagnostic] {
        &self.records
    }

    pub fn ignored(&self) -> impl Iterator<Item = &HintDiagnostic> {
        self.records
            .iter()
            .filter(|d| d.outcome != HintOutcome::Applied)
    }
}
