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

//! Optimizer configuration (spec §6 "Configuration"). Injected via the
//! optimization context rather than read from a process-wide singleton
//! (spec §9 "Global state").

use serde::{Deserialize, Serialize};

/// `parallelism_hint` resolves to `auto = min(num_cpus, 8)`, clamped to
/// `[4, 8]`, per spec §6.
const MIN_PARALLELISM: usize = 4;
const MAX_PARALLELISM: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ParallelismHint {
    Auto,
    Fixed(usize),
}

impl Default for ParallelismHint {
    fn default() -> Self {
        ParallelismHint::Auto
    }
}

impl ParallelismHint {
    pub fn resolve(self) -> usize {
        match self {
            ParallelismHint::Auto => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(MIN_PARALLELISM);
                cpus.clamp(MIN_PARALLELISM, MAX_PARALLELISM)
            }
            ParallelismHint::Fixed(n) => n.clamp(MIN_PARALLELISM, MAX_PARALLELISM),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub cpu_factor: f64,
    pub io_factor: f64,
    pub memory_factor: f64,
    pub plan_cache_capacity: usize,
    pub max_view_depth: usize,
    pub parallelism_hint: ParallelismHint,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            cpu_factor: 0.01,
            io_factor: 0.1,
            memory_factor: 0.001,
            plan_cache_capacity: 1024,
            max_view_depth: 16,
            parallelism_hint: ParallelismHint::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = OptimizerConfig::default();
        assert_eq!(cfg.cpu_factor, 0.01);
        assert_eq!(cfg.io_factor, 0.1);
        assert_eq!(cfg.memory_factor, 0.001);
        assert_eq!(cfg.plan_cache_capacity, 1024);
    }

    #[test]
    fn parallelism_hint_is_clamped() {
        assert!((MIN_PARALLELISM..=MAX_PARALLELISM).contains(&ParallelismHint::Auto.resolve()));
        assert_eq!(ParallelismHint::Fixed(1).resolve(), MIN_PARALLELISM);
        assert_eq!(ParallelismHint::Fixed(100).resolve(), MAX_PARALLELISM);
    }
}
