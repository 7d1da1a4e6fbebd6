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

//! Row-count (cardinality) estimation, one function per plan-node kind
//! (spec §4.B). These are pure arithmetic functions over already-estimated
//! child row counts, not tree walkers — `crate::plan` calls them bottom-up
//! while estimating a whole plan, the way the teacher's `PlanBase::new`
//! computes a node's `rows()` from its children at construction time.

use super::DEFAULT_ROW_COUNT;

/// Every estimate is at least 1 row (spec §4.B, §8 property 6): a plan
/// with a provably empty output is still modeled as producing one row,
/// since cost comparisons between candidate plans would otherwise divide
/// by (or multiply away to) zero.
const MIN_ROWS: u64 = 1;

/// `DataSource` with no known statistics (spec §4.B).
pub fn data_source_default_rows() -> u64 {
    DEFAULT_ROW_COUNT
}

/// `Selection`: `rows(child) * selectivity`, clamped to at least one row.
pub fn selection_rows(child_rows: u64, selectivity: f64) -> u64 {
    let estimate = (child_rows as f64 * selectivity.clamp(0.0, 1.0)).round() as u64;
    estimate.max(MIN_ROWS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
    Semi,
    AntiSemi,
}

/// `Join`: kind-specific combination of the two child row counts (spec
/// §4.B). `join_key_ndv` is the max of the two join keys' NDVs, when
/// known — an `Inner`/`Cross` join with a known join key uses it to avoid
/// the worst-case cross-product estimate.
pub fn join_rows(kind: JoinKind, left_rows: u64, right_rows: u64, join_key_ndv: Option<u64>) -> u64 {
    let estimate = match kind {
        JoinKind::Inner => match join_key_ndv {
            Some(ndv) if ndv > 0 => {
                ((left_rows as f64 * right_rows as f64) / ndv as f64).round() as u64
            }
            _ => left_rows.min(right_rows),
        },
        JoinKind::LeftOuter => left_rows,
        JoinKind::RightOuter => right_rows,
        JoinKind::FullOuter => (left_rows + right_rows) / 2,
        JoinKind::Cross => left_rows.saturating_mul(right_rows),
        JoinKind::Semi | JoinKind::AntiSemi => left_rows,
    };
    estimate.max(MIN_ROWS)
}

/// `Aggregate`: bounded by the child's row count and by the product of
/// the `GROUP BY` columns' NDVs (an aggregate cannot produce more groups
/// than either allows). With no `GROUP BY` at all, exactly one row.
pub fn aggregate_rows(child_rows: u64, group_by_ndvs: &[u64]) -> u64 {
    if group_by_ndvs.is_empty() {
        return 1;
    }
    let ndv_product = group_by_ndvs
        .iter()
        .copied()
        .fold(1u64, |acc, ndv| acc.saturating_mul(ndv.max(1)));
    child_rows.min(ndv_product).max(MIN_ROWS)
}

/// `Limit`/`TopN`: bounded by both the requested count and the child's
/// row count.
pub fn limit_rows(limit: u64, child_rows: u64) -> u64 {
    limit.min(child_rows).max(MIN_ROWS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_clamps_to_at_least_one_row() {
        assert_eq!(selection_rows(10, 0.0), 1);
    }

    #[test]
    fn inner_join_uses_ndv_when_known() {
        assert_eq!(join_rows(JoinKind::Inner, 1000, 100, Some(100)), 1000);
    }

    #[test]
    fn inner_join_falls_back_to_min_without_ndv() {
        assert_eq!(join_rows(JoinKind::Inner, 1000, 100, None), 100);
    }

    #[test]
    fn left_outer_preserves_left_cardinality() {
        assert_eq!(join_rows(JoinKind::LeftOuter, 500, 10, None), 500);
    }

    #[test]
    fn cross_join_multiplies() {
        assert_eq!(join_rows(JoinKind::Cross, 10, 20, None), 200);
    }

    #[test]
    fn semi_join_bounded_by_left() {
        assert_eq!(join_rows(JoinKind::Semi, 50, 5, None), 50);
    }

    #[test]
    fn aggregate_with_no_group_by_is_one_row() {
        assert_eq!(aggregate_rows(10_000, &[]), 1);
    }

    #[test]
    fn aggregate_bounded_by_ndv_product_and_child_rows() {
        assert_eq!(aggregate_rows(10_000, &[10, 10]), 100);
        assert_eq!(aggregate_rows(50, &[10, 10]), 50);
    }

    #[test]
    fn limit_bounded_by_child_rows() {
        assert_eq!(limit_rows(100, 10), 10);
        assert_eq!(limit_rows(5, 1000), 5);
    }
}
