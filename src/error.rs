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

//! Error kinds for the optimizer core (spec §7).
//!
//! `DivisionByZero`/`TypeMismatch` during constant folding are deliberately
//! absent here: per §7 they make the folding rule a no-op rather than a
//! propagated failure, so they are represented by [`crate::expr::fold::FoldOutcome::NotFolded`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OptimizerError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptimizerError {
    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("unknown table `{0}`")]
    UnknownTable(String),

    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("rule `{rule}` failed: {cause}")]
    RuleFailure { rule: String, cause: String },

    #[error("optimization cancelled")]
    Cancelled,

    #[error("maximum view/CTE nesting depth exceeded (max = {0})")]
    DepthExceeded(usize),

    #[error("cannot write to read-only virtual schema `{0}`")]
    WriteToReadOnlyVirtualSchema(String),
}
