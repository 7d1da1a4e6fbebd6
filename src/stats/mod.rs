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

//! Statistics, selectivity, cardinality, and cost (spec §3, §4.B). The
//! optimizer never computes statistics itself — it only consumes a
//! [`StatisticsProvider`] collaborator, matching spec §1's framing of the
//! storage layer as external.

pub mod cardinality;
pub mod cost;
pub mod estimator;
pub mod selectivity;

use crate::catalog::DataType;

/// Default row count used when a table has no known statistics (spec §4.B).
pub const DEFAULT_ROW_COUNT: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStatistics {
    pub data_type: DataType,
    /// Number of distinct values.
    pub ndv: u64,
    pub null_count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub average_width: f64,
}

impl ColumnStatistics {
    pub fn null_fraction(&self, row_count: u64) -> f64 {
        if row_count == 0 {
            0.0
        } else {
            (self.null_count as f64 / row_count as f64).clamp(0.0, 1.0)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableStatistics {
    pub row_count: u64,
    pub columns: std::collections::HashMap<String, ColumnStatistics>,
}

impl TableStatistics {
    pub fn column(&self, name: &str) -> Option<&ColumnStatistics> {
        self.columns.get(name)
    }
}

/// The statistics collaborator (spec §6 "Input: statistics provider").
/// Implementations may be slow (spec §5: "treat `get_statistics(table)` as
/// potentially slow but idempotent"); callers should cache the result
/// within a single optimization call, which [`crate::facade::Optimizer`]
/// does via [`StatsCache`].
pub trait StatisticsProvider {
    fn get_statistics(&self, table: &str) -> Option<TableStatistics>;
}

/// A no-op provider, useful for tests and for callers that always want the
/// heuristic defaults from §4.B.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStatistics;

impl StatisticsProvider for NoStatistics {
    fn get_statistics(&self, _table: &str) -> Option<TableStatistics> {
        None
    }
}

/// Caches `get_statistics` results for the lifetime of one optimization
/// call (spec §5: "cache within a single optimization call"), so a plan
/// with the same table referenced from multiple rules does not repeatedly
/// hit a potentially slow collaborator.
pub struct StatsCache<'a> {
    provider: &'a dyn StatisticsProvider,
    cache: std::cell::RefCell<std::collections::HashMap<String, Option<TableStatistics>>>,
}

impl<'a> StatsCache<'a> {
    pub fn new(provider: &'a dyn StatisticsProvider) -> Self {
        Self {
            provider,
            cache: std::cell::RefCell::new(std::collections::HashMap::new()),
        }
    }

    pub fn get(&self, table: &str) -> Option<TableStatistics> {
        if let Some(hit) = self.cache.borrow().get(table) {
            return hit.clone();
        }
        let stats = self.provider.get_statistics(table);
        self.cache
            .borrow_mut()
            .insert(table.to_string(), stats.clone());
        stats
    }

    pub fn row_count(&self, table: &str) -> u64 {
        self.get(table)
            .map(|s| s.row_count)
            .unwrap_or(DEFAULT_ROW_COUNT)
    }
}
