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

//! Linear cost functions, one per physical operator kind (spec §4.B). Every
//! function combines [`OptimizerConfig`]'s cpu/io/memory weights with the
//! row counts [`super::cardinality`] already estimated; none of them walk a
//! plan tree themselves, mirroring the split the teacher keeps between
//! `PlanBase` cardinality fields and a separate cost trait.

use crate::config::OptimizerConfig;
use std::ops::Add;

/// A node's own cost, own-weighted only (excludes children). Callers
/// accumulate a whole plan's cost by summing a node's own [`Cost`] with
/// its children's, which is why this is a plain additive newtype rather
/// than a single opaque scalar: keeping the linear combination explicit
/// makes the additivity property (spec §8 property 8) visible at the type
/// level.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Cost(pub f64);

impl Add for Cost {
    type Output = Cost;
    fn add(self, rhs: Cost) -> Cost {
        Cost(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Self {
        iter.fold(Cost(0.0), Add::add)
    }
}

/// `Scan`: I/O-bound, proportional to bytes read plus a CPU term for
/// tuple materialization.
pub fn scan(rows: u64, avg_row_width: f64, config: &OptimizerConfig) -> Cost {
    let rows = rows as f64;
    Cost(config.io_factor * rows * avg_row_width.max(1.0) + config.cpu_factor * rows)
}

/// `Filter`/`Selection`: one predicate evaluation per input row.
pub fn filter(input_rows: u64, config: &OptimizerConfig) -> Cost {
    Cost(config.cpu_factor * input_rows as f64)
}

/// `Projection`: one expression evaluation per input row, per column.
pub fn projection(input_rows: u64, column_count: usize, config: &OptimizerConfig) -> Cost {
    Cost(config.cpu_factor * input_rows as f64 * column_count.max(1) as f64)
}

/// `HashJoin`: build the hash table over the smaller (`build`) side, probe
/// with the larger (`probe`) side; the build side also contributes a
/// memory term for holding the table resident.
pub fn hash_join(build_rows: u64, probe_rows: u64, config: &OptimizerConfig) -> Cost {
    let build = build_rows as f64;
    let probe = probe_rows as f64;
    Cost(config.cpu_factor * (build + probe) + config.memory_factor * build)
}

/// `MergeJoin`: both sides assumed pre-sorted; cost is linear in the sum
/// of the two input sizes, with no hash-table memory term.
pub fn merge_join(left_rows: u64, right_rows: u64, config: &OptimizerConfig) -> Cost {
    Cost(config.cpu_factor * (left_rows + right_rows) as f64)
}

/// `Aggregate` (spec §4.B: `rows·(group_cols)·CPU + rows·CPU`): one
/// accumulator update per input row, plus a per-group-column hashing term
/// for computing the grouping key itself.
pub fn aggregate(input_rows: u64, group_cols: usize, config: &OptimizerConfig) -> Cost {
    let rows = input_rows as f64;
    Cost(config.cpu_factor * rows * group_cols as f64 + config.cpu_factor * rows)
}

/// `Sort` (spec §4.B: `rows·log2(rows)·CPU`): a comparison sort's
/// `O(n log n)` cost, plus a memory term for the working set held for the
/// duration of the sort.
pub fn sort(input_rows: u64, config: &OptimizerConfig) -> Cost {
    let rows = input_rows as f64;
    let log_factor = if rows > 1.0 { rows.log2() } else { 1.0 };
    Cost(config.cpu_factor * rows * log_factor + config.memory_factor * rows)
}

/// `TopN`: a bounded top-k heap over the input, `O(rows · log2(k))` rather
/// than a full `O(rows · log2(rows))` sort — this is the whole reason the
/// rule engine prefers deriving `TopN` over `Sort + Limit` wherever it can.
/// Not named in the cost table spec §4.B enumerates; extended here since
/// physicalizing a `TopN` node needs a cost distinct from a plain `Sort`.
pub fn top_n(input_rows: u64, limit: u64, config: &OptimizerConfig) -> Cost {
    let rows = input_rows as f64;
    let k = (limit.max(1)) as f64;
    let log_factor = if k > 1.0 { k.log2() } else { 1.0 };
    Cost(config.cpu_factor * rows * log_factor + config.memory_factor * k)
}

/// `Limit`/`Offset`: no comparison work, just counting past `offset` rows
/// and stopping after `limit` more.
pub fn limit(offset: u64, limit: u64, config: &OptimizerConfig) -> Cost {
    Cost(config.cpu_factor * (offset + limit) as f64)
}

/// `Window`: one pass over the input per window item, each needing its own
/// partition buffer; modeled analogously to `aggregate` but keyed by
/// window-item count rather than group-by column count.
pub fn window(input_rows: u64, item_count: usize, config: &OptimizerConfig) -> Cost {
    let rows = input_rows as f64;
    Cost(config.cpu_factor * rows * item_count.max(1) as f64 + config.memory_factor * rows)
}

/// `Union`/`Intersect`/`Except`: linear in both inputs, with a memory term
/// for the hash-based dedup `Intersect`/`Except` need (and `Union` does
/// not strictly need, but the conservative estimate is cheap to keep
/// uniform across the three).
pub fn set_op(left_rows: u64, right_rows: u64, config: &OptimizerConfig) -> Cost {
    let left = left_rows as f64;
    let right = right_rows as f64;
    Cost(config.cpu_factor * (left + right) + config.memory_factor * left.min(right))
}

/// `Delete`/`Update`/`Insert`: one write per affected row.
pub fn dml(affected_rows: u64, config: &OptimizerConfig) -> Cost {
    Cost(config.cpu_factor * affected_rows as f64)
}
