// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Canonical table and column identities.
//!
//! Tables and columns are interned once per run, so the rest of the
//! generator compares cheap indices instead of strings. Comparison uses
//! the dialect's identifier folding; the declared casing is kept for
//! display.

use std::collections::HashMap;

use crate::dialect::GeneratorDialect;

/// Canonical identity of a table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GeneratorTable(usize);

/// Canonical identity of a column within its table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GeneratorColumn {
    table: GeneratorTable,
    index: usize
}

impl GeneratorColumn {
    /// The table this column belongs to.
    pub fn table(&self) -> GeneratorTable {
        self.table
    }
}

struct TableData {
    name:          String,
    columns:       Vec<String>,
    column_lookup: HashMap<String, usize>
}

/// Interning store for table and column names.
///
/// Unknown names are created lazily on first resolve.
#[derive(Default)]
pub struct TableRegistry {
    tables: Vec<TableData>,
    lookup: HashMap<String, usize>
}

impl TableRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a table by name, creating it on first use.
    pub fn resolve_table(&mut self, dialect: &dyn GeneratorDialect, name: &str) -> GeneratorTable {
        let folded = dialect.fold_identifier(name);
        if let Some(&index) = self.lookup.get(&folded) {
            return GeneratorTable(index);
        }
        let index = self.tables.len();
        self.tables.push(TableData {
            name:          name.to_owned(),
            columns:       Vec::new(),
            column_lookup: HashMap::new()
        });
        self.lookup.insert(folded, index);
        GeneratorTable(index)
    }

    /// Resolve a column within a table, creating it on first use.
    pub fn resolve_column(
        &mut self,
        dialect: &dyn GeneratorDialect,
        table: GeneratorTable,
        name: &str
    ) -> GeneratorColumn {
        let folded = dialect.fold_identifier(name);
        let data = &mut self.tables[table.0];
        if let Some(&index) = data.column_lookup.get(&folded) {
            return GeneratorColumn { table, index };
        }
        let index = data.columns.len();
        data.columns.push(name.to_owned());
        data.column_lookup.insert(folded, index);
        GeneratorColumn { table, index }
    }

    /// Declared name of a table.
    pub fn table_name(&self, table: GeneratorTable) -> &str {
        &self.tables[table.0].name
    }

    /// Declared name of a column.
    pub fn column_name(&self, column: GeneratorColumn) -> &str {
        &self.tables[column.table.0].columns[column.index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{H2Dialect, PostgresDialect};

    #[test]
    fn same_name_resolves_to_same_identity() {
        let mut registry = TableRegistry::new();
        let a = registry.resolve_table(&H2Dialect, "Person");
        let b = registry.resolve_table(&H2Dialect, "Person");
        assert_eq!(a, b);
    }

    #[test]
    fn folding_merges_casings() {
        let mut registry = TableRegistry::new();
        let a = registry.resolve_table(&PostgresDialect, "Person");
        let b = registry.resolve_table(&PostgresDialect, "PERSON");
        assert_eq!(a, b);
        assert_eq!(registry.table_name(a), "Person");
    }

    #[test]
    fn columns_are_scoped_to_their_table() {
        let mut registry = TableRegistry::new();
        let person = registry.resolve_table(&H2Dialect, "Person");
        let country = registry.resolve_table(&H2Dialect, "Country");
        let a = registry.resolve_column(&H2Dialect, person, "name");
        let b = registry.resolve_column(&H2Dialect, country, "name");
        assert_ne!(a, b);
        assert_eq!(registry.column_name(a), "name");
        assert_eq!(a.table(), person);
    }
}
