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

//! The `opt_ctx` a rule's `apply` receives (spec §4.C): statistics, hints,
//! and the hint-diagnostics sink, plus the config weights the cost-aware
//! rules (`JoinReorder`, `MaxMinElimination`) need. Injected per call, never
//! a process-wide singleton (spec §9 "Global state").

use crate::config::OptimizerConfig;
use crate::hint::{HintDiagnostics, HintSet};
use crate::stats::StatsCache;

pub struct RuleContext<'a> {
    pub stats: &'a StatsCache<'a>,
    pub hints: &'a HintSet,
    pub diagnostics: &'a mut HintDiagnostics,
    pub config: &'a OptimizerConfig,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        stats: &'a StatsCache<'a>,
        hints: &'a HintSet,
        diagnostics: &'a mut HintDiagnostics,
        config: &'a OptimizerConfig,
    ) -> Self {
        Self {
            stats,
            hints,
            diagnostics,
            config,
        }
    }
}
