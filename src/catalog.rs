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

//! Static table/column metadata as handed to the optimizer by the storage
//! layer collaborator. Mirrors the shape of the teacher's
//! `risingwave_common::catalog::{Schema, Field}` / `TableCatalog`, minus the
//! storage-engine-specific fields (encoding, vnode mapping, ...) that do not
//! belong to an optimizer-only crate.

use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float64,
    Varchar,
    Date,
    Timestamp,
    Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnMeta {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexMeta {
    pub name: String,
    /// Indexed columns, in key order.
    pub columns: Vec<String>,
}

/// Static metadata for one table, as supplied by the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableMeta {
    pub name: String,
    pub columns: Vec<ColumnMeta>,
    pub indexes: Vec<IndexMeta>,
}

impl TableMeta {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnMeta>, indexes: Vec<IndexMeta>) -> Self {
        Self {
            name: name.into(),
            columns,
            indexes,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.iter().any(|i| i.name == name)
    }
}

/// Shared handle, so a `DataSource` node can cheaply clone its table
/// metadata reference instead of owning a full copy per plan node.
pub type TableMetaRef = Arc<TableMeta>;

/// The storage layer's table-resolution surface (spec §1 "the storage
/// layer: ... provides ... table metadata"; §6's "parsed statement" input
/// only carries a bare table name per `stmt::SelectStmt::from`/
/// `JoinClause::table`/`DmlStmt::table`, so building the initial
/// `DataSource`/`Dml` node (spec §4.G step 3a) needs a lookup from that
/// name back to the full `TableMeta`). Mirrors [`crate::stats::StatisticsProvider`]'s
/// role as an externally-supplied, potentially slow collaborator — the
/// optimizer never maintains its own catalog.
pub trait CatalogProvider {
    fn get_table(&self, name: &str) -> Option<TableMetaRef>;
}

/// A table-name-keyed in-memory catalog, useful for tests and for callers
/// happy to hand the optimizer a flat map of everything up front.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: std::collections::HashMap<String, TableMetaRef>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableMetaRef) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }
}

impl CatalogProvider for StaticCatalog {
    fn get_table(&self, name: &str) -> Option<TableMetaRef> {
        self.tables.get(name).cloned()
    }
}
