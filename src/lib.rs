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

//! Core of a relational query optimizer for an embeddable SQL engine.
//!
//! This crate turns a parsed statement (§6 [`stmt`]) into a cost-ranked,
//! hint-aware physical plan ([`plan`]) via a fixpoint rule engine
//! ([`rule`]) driven by a cardinality/cost model ([`stats`]), with the
//! result cached by statement fingerprint ([`cache`]). The SQL parser,
//! execution engine, and storage layer are external collaborators; this
//! crate only consumes their shapes through [`stmt`], [`catalog`], and
//! [`stats::StatisticsProvider`].

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod expr;
pub mod facade;
pub mod hint;
pub mod plan;
pub mod rule;
pub mod stats;
pub mod stmt;

pub use cache::PlanCache;
pub use config::OptimizerConfig;
pub use error::{OptimizerError, Result};
pub use facade::{CancellationToken, Optimizer, OptimizedPlan, Outcome};
pub use rule::RuleApplicationStats;
