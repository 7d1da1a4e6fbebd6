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

//! The plan algebra (spec §3, §4.A): [`logical`] is what the rule engine
//! rewrites, [`physical`] is what `rule::physicalize` produces, [`schema`]
//! is the shared output-shape type both sides use, and [`explain`] renders
//! either tree for diagnostics.

pub mod explain;
pub mod fingerprint;
pub mod logical;
pub mod physical;
pub mod schema;

pub use logical::LogicalPlan;
pub use physical::PhysicalPlan;
pub use schema::Schema;
