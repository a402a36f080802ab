// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Identifier generators.
//!
//! Each generator tracks the values it handed out during the run, so a
//! later reference to an already inserted row can be rendered either as a
//! plain literal or relative to the database-side sequence state.

use crate::dialect::GeneratorDialect;

/// A named identifier generator.
#[derive(Debug)]
pub enum IdGenerator {
    /// A database sequence.
    Sequence(SequenceGenerator),
    /// A generator table holding the next value per key.
    Table(TableIdGenerator),
    /// An auto-increment column filled by the database.
    Identity(IdentityGenerator),
    /// Caller-provided literals; nothing to track.
    Assigned
}

impl IdGenerator {
    /// Hand out the next identifier value.
    pub fn next_value(&mut self) -> i64 {
        match self {
            Self::Sequence(g) => g.next_value(),
            Self::Table(g) => g.next_value(),
            Self::Identity(g) => g.next_value(),
            Self::Assigned => unreachable!("assigned ids are read from the entity")
        }
    }

    /// The value last handed out, if any.
    pub fn current_value(&self) -> Option<i64> {
        match self {
            Self::Sequence(g) => g.current,
            Self::Table(g) => g.current,
            Self::Identity(g) => g.current,
            Self::Assigned => None
        }
    }

    /// Statements that must run before the INSERT consuming the next
    /// value, such as generator-table allocations.
    pub fn pre_insert_statements(&mut self) -> Vec<String> {
        match self {
            Self::Table(g) => g.allocate(),
            _ => Vec::new()
        }
    }

    /// Expression for the id column of the entity's own INSERT, or
    /// `None` when the column is omitted and the database fills it.
    pub fn insert_expression(&self, dialect: &dyn GeneratorDialect, value: i64) -> Option<String> {
        match self {
            Self::Sequence(g) => Some(dialect.next_sequence_value(&g.sequence)),
            Self::Table(_) => Some(value.to_string()),
            Self::Identity(_) => None,
            Self::Assigned => Some(value.to_string())
        }
    }

    /// Expression referencing an already assigned id from another row.
    ///
    /// In relative mode sequence values are expressed against `currval`,
    /// so the script stays valid on a database whose sequence does not
    /// start at the initial value. Everything else references the
    /// tracked literal.
    pub fn reference_expression(
        &self,
        dialect: &dyn GeneratorDialect,
        value: i64,
        relative: bool
    ) -> String {
        match self {
            Self::Sequence(g) if relative => {
                let current = g.current.unwrap_or(value);
                let difference = current - value;
                if difference == 0 {
                    dialect.current_sequence_value(&g.sequence)
                } else {
                    format!("({} - {difference})", dialect.current_sequence_value(&g.sequence))
                }
            }
            _ => value.to_string()
        }
    }

    /// Whether a reference to `value` can currently be written as the
    /// dialect's `currval` expression.
    pub fn is_current_sequence_value(&self, value: i64) -> bool {
        matches!(self, Self::Sequence(g) if g.current == Some(value))
    }

    /// Trailing statement aligning the database-side counter past the
    /// highest value used, when one is needed.
    pub fn alignment_statement(
        &self,
        dialect: &dyn GeneratorDialect,
        relative: bool
    ) -> Option<String> {
        match self {
            Self::Sequence(g) if !relative && g.current.is_some() => {
                Some(dialect.sequence_alignment(&g.sequence, g.next))
            }
            Self::Table(g) if g.current.is_some() => Some(g.pin_statement()),
            _ => None
        }
    }
}

/// Generator backed by a database sequence.
#[derive(Debug)]
pub struct SequenceGenerator {
    sequence:        String,
    allocation_size: i64,
    next:            i64,
    current:         Option<i64>
}

impl SequenceGenerator {
    /// Create a generator for the named sequence.
    pub fn new(sequence: impl Into<String>, initial_value: i64, allocation_size: i64) -> Self {
        Self {
            sequence:        sequence.into(),
            allocation_size: allocation_size.max(1),
            next:            initial_value,
            current:         None
        }
    }

    fn next_value(&mut self) -> i64 {
        let value = self.next;
        self.next = value + self.allocation_size;
        self.current = Some(value);
        value
    }
}

/// Generator backed by a key/value generator table.
///
/// Allocation of a new value block emits an UPDATE of the generator row
/// before the consuming INSERT.
#[derive(Debug)]
pub struct TableIdGenerator {
    table:           String,
    key_column:      String,
    value_column:    String,
    row:             String,
    allocation_size: i64,
    next:            i64,
    allocated_until: i64,
    current:         Option<i64>
}

impl TableIdGenerator {
    /// Create a generator reading the `row` entry of `table`.
    pub fn new(
        table: impl Into<String>,
        row: impl Into<String>,
        initial_value: i64,
        allocation_size: i64
    ) -> Self {
        let initial = initial_value;
        Self {
            table:           table.into(),
            key_column:      "sequence_name".to_owned(),
            value_column:    "next_val".to_owned(),
            row:             row.into(),
            allocation_size: allocation_size.max(1),
            next:            initial,
            allocated_until: initial,
            current:         None
        }
    }

    fn allocate(&mut self) -> Vec<String> {
        if self.next < self.allocated_until {
            return Vec::new();
        }
        self.allocated_until = self.next + self.allocation_size;
        vec![self.pin_statement()]
    }

    fn pin_statement(&self) -> String {
        format!(
            "UPDATE {} SET {} = {} WHERE {} = '{}'",
            self.table, self.value_column, self.allocated_until, self.key_column, self.row
        )
    }

    fn next_value(&mut self) -> i64 {
        let value = self.next;
        self.next = value + 1;
        self.current = Some(value);
        value
    }
}

/// Generator mirroring a database-filled identity column.
///
/// The INSERT omits the column; the tracked counter mirrors what the
/// database assigns when the script runs against an empty schema.
#[derive(Debug)]
pub struct IdentityGenerator {
    next:    i64,
    current: Option<i64>
}

impl IdentityGenerator {
    /// Create a counter starting at one.
    pub fn new() -> Self {
        Self {
            next:    1,
            current: None
        }
    }

    fn next_value(&mut self) -> i64 {
        let value = self.next;
        self.next = value + 1;
        self.current = Some(value);
        value
    }
}

impl Default for IdentityGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{H2Dialect, PostgresDialect};

    #[test]
    fn sequence_tracks_current_value() {
        let mut generator = IdGenerator::Sequence(SequenceGenerator::new("person_seq", 1, 1));
        assert_eq!(generator.current_value(), None);
        assert_eq!(generator.next_value(), 1);
        assert_eq!(generator.next_value(), 2);
        assert_eq!(generator.current_value(), Some(2));
        assert!(generator.is_current_sequence_value(2));
        assert!(!generator.is_current_sequence_value(1));
    }

    #[test]
    fn sequence_allocation_advances_in_blocks() {
        let mut generator = IdGenerator::Sequence(SequenceGenerator::new("s", 10, 50));
        assert_eq!(generator.next_value(), 10);
        assert_eq!(generator.next_value(), 60);
    }

    #[test]
    fn sequence_relative_references() {
        let mut generator = IdGenerator::Sequence(SequenceGenerator::new("s", 1, 1));
        generator.next_value();
        generator.next_value();
        assert_eq!(generator.reference_expression(&PostgresDialect, 2, true), "currval('s')");
        assert_eq!(
            generator.reference_expression(&PostgresDialect, 1, true),
            "(currval('s') - 1)"
        );
        assert_eq!(generator.reference_expression(&PostgresDialect, 1, false), "1");
    }

    #[test]
    fn table_generator_allocates_before_first_use() {
        let mut generator = IdGenerator::Table(TableIdGenerator::new("id_gen", "person", 1, 2));
        let statements = generator.pre_insert_statements();
        assert_eq!(
            statements,
            vec!["UPDATE id_gen SET next_val = 3 WHERE sequence_name = 'person'"]
        );
        assert_eq!(generator.next_value(), 1);
        assert!(generator.pre_insert_statements().is_empty());
        assert_eq!(generator.next_value(), 2);
        assert_eq!(
            generator.pre_insert_statements(),
            vec!["UPDATE id_gen SET next_val = 5 WHERE sequence_name = 'person'"]
        );
    }

    #[test]
    fn identity_omits_the_insert_column() {
        let mut generator = IdGenerator::Identity(IdentityGenerator::new());
        assert_eq!(generator.next_value(), 1);
        assert!(generator.insert_expression(&H2Dialect, 1).is_none());
        assert_eq!(generator.reference_expression(&H2Dialect, 1, true), "1");
    }

    #[test]
    fn alignment_only_where_needed() {
        let mut sequence = IdGenerator::Sequence(SequenceGenerator::new("s", 1, 1));
        assert!(sequence.alignment_statement(&H2Dialect, false).is_none());
        sequence.next_value();
        assert_eq!(
            sequence.alignment_statement(&H2Dialect, false).unwrap(),
            "ALTER SEQUENCE s RESTART WITH 2"
        );
        assert!(sequence.alignment_statement(&H2Dialect, true).is_none());

        let mut identity = IdGenerator::Identity(IdentityGenerator::new());
        identity.next_value();
        assert!(identity.alignment_statement(&H2Dialect, false).is_none());
    }
}
