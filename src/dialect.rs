// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! SQL dialect adapters.
//!
//! Every literal, identifier and sequence expression in the output goes
//! through a [`GeneratorDialect`], so the rest of the generator stays free
//! of per-database conditionals. Two dialects ship with the crate: the
//! default [`H2Dialect`] and [`PostgresDialect`].

use crate::{
    error::{GeneratorError, Result},
    value::Value
};

/// Read-only adapter describing one SQL dialect.
///
/// Default method bodies implement the common ANSI shape; dialects
/// override only where they diverge.
pub trait GeneratorDialect {
    /// Short dialect name, used in comments and settings.
    fn name(&self) -> &'static str;

    /// Quote an identifier for emission.
    fn quote_identifier(&self, identifier: &str) -> String {
        let mut quoted = String::with_capacity(identifier.len() + 2);
        quoted.push('"');
        for c in identifier.chars() {
            if c == '"' {
                quoted.push('"');
            }
            quoted.push(c);
        }
        quoted.push('"');
        quoted
    }

    /// Fold an identifier to the dialect's comparison case.
    ///
    /// The registry compares identifiers through this; declared casing is
    /// kept for display.
    fn fold_identifier(&self, identifier: &str) -> String;

    /// Whether the dialect supports database sequences.
    fn supports_sequences(&self) -> bool {
        true
    }

    /// Whether a JOINED hierarchy still needs a discriminator column.
    fn is_joined_discriminator_needed(&self) -> bool {
        false
    }

    /// Largest plain VARCHAR length.
    fn max_varchar_length(&self) -> u32 {
        255
    }

    /// Expression that advances the sequence and yields the new value.
    fn next_sequence_value(&self, sequence: &str) -> String;

    /// Expression yielding the value last produced by the sequence in
    /// the current session.
    fn current_sequence_value(&self, sequence: &str) -> String {
        format!("currval('{sequence}')")
    }

    /// Statement aligning a sequence so its next value is `next_value`.
    fn sequence_alignment(&self, sequence: &str, next_value: i64) -> String {
        format!("ALTER SEQUENCE {sequence} RESTART WITH {next_value}")
    }

    /// Statement aligning an identity column so its next value is
    /// `next_value`, when the dialect needs one.
    fn identity_alignment(&self, table: &str, column: &str, next_value: i64) -> Option<String> {
        let _ = (table, column, next_value);
        None
    }

    /// INSERT shape for a row without any explicit column.
    fn empty_insert(&self, table: &str) -> String {
        format!("INSERT INTO {table} () VALUES ()")
    }

    /// Line prefix that turns text into a comment.
    fn comment_prefix(&self) -> &'static str {
        "-- "
    }

    /// Statement terminator.
    fn statement_terminator(&self) -> &'static str {
        ";"
    }

    /// Format a string literal, doubling embedded quotes.
    fn format_string(&self, value: &str) -> String {
        let mut literal = String::with_capacity(value.len() + 2);
        literal.push('\'');
        for c in value.chars() {
            if c == '\'' {
                literal.push('\'');
            }
            literal.push(c);
        }
        literal.push('\'');
        literal
    }

    /// Format a boolean literal.
    fn format_boolean(&self, value: bool) -> String {
        if value { "TRUE".to_owned() } else { "FALSE".to_owned() }
    }

    /// Format a binary literal.
    fn format_bytes(&self, value: &[u8]) -> String {
        let mut literal = String::with_capacity(value.len() * 2 + 3);
        literal.push_str("X'");
        for byte in value {
            literal.push_str(&format!("{byte:02x}"));
        }
        literal.push('\'');
        literal
    }

    /// Format a scalar [`Value`] as a SQL literal.
    ///
    /// Structured values have no literal form and are rejected; the
    /// property model resolves them before literals are requested.
    fn format_value(&self, value: &Value) -> Result<String> {
        match value {
            Value::Null => Ok("NULL".to_owned()),
            Value::Bool(v) => Ok(self.format_boolean(*v)),
            Value::Int(v) => Ok(v.to_string()),
            Value::Float(v) => Ok(v.to_string()),
            Value::Str(v) => Ok(self.format_string(v)),
            Value::Date(v) => Ok(format!("'{v}'")),
            Value::Timestamp(v) => Ok(format!("'{}'", v.format("%Y-%m-%d %H:%M:%S"))),
            Value::Uuid(v) => Ok(format!("'{v}'")),
            Value::Bytes(v) => Ok(self.format_bytes(v)),
            other => Err(GeneratorError::Dialect(format!(
                "{} value has no literal form",
                other.type_name()
            )))
        }
    }
}

/// Dialect of the H2 database, the default output target.
#[derive(Debug, Default, Clone, Copy)]
pub struct H2Dialect;

impl GeneratorDialect for H2Dialect {
    fn name(&self) -> &'static str {
        "h2"
    }

    fn fold_identifier(&self, identifier: &str) -> String {
        identifier.to_uppercase()
    }

    fn next_sequence_value(&self, sequence: &str) -> String {
        format!("NEXT VALUE FOR {sequence}")
    }

    fn identity_alignment(&self, table: &str, column: &str, next_value: i64) -> Option<String> {
        Some(format!("ALTER TABLE {table} ALTER COLUMN {column} RESTART WITH {next_value}"))
    }
}

/// Dialect of PostgreSQL.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl GeneratorDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn fold_identifier(&self, identifier: &str) -> String {
        identifier.to_lowercase()
    }

    fn next_sequence_value(&self, sequence: &str) -> String {
        format!("nextval('{sequence}')")
    }

    fn sequence_alignment(&self, sequence: &str, next_value: i64) -> String {
        format!("SELECT setval('{sequence}', {next_value}, false)")
    }

    fn identity_alignment(&self, table: &str, column: &str, next_value: i64) -> Option<String> {
        Some(format!(
            "SELECT setval(pg_get_serial_sequence('{table}', '{column}'), {next_value}, false)"
        ))
    }

    fn empty_insert(&self, table: &str) -> String {
        format!("INSERT INTO {table} DEFAULT VALUES")
    }

    fn format_bytes(&self, value: &[u8]) -> String {
        let mut literal = String::with_capacity(value.len() * 2 + 5);
        literal.push_str("'\\x");
        for byte in value {
            literal.push_str(&format!("{byte:02x}"));
        }
        literal.push('\'');
        literal
    }
}

/// Look up a shipped dialect by its settings name.
pub fn dialect_by_name(name: &str) -> Result<Box<dyn GeneratorDialect>> {
    match name {
        "h2" => Ok(Box::new(H2Dialect)),
        "postgres" | "postgresql" => Ok(Box::new(PostgresDialect)),
        other => Err(GeneratorError::Config(format!("unknown dialect '{other}'")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn string_quotes_are_doubled() {
        let dialect = H2Dialect;
        assert_eq!(dialect.format_string("it's"), "'it''s'");
    }

    #[test]
    fn scalar_literals() {
        let dialect = H2Dialect;
        assert_eq!(dialect.format_value(&Value::Null).unwrap(), "NULL");
        assert_eq!(dialect.format_value(&Value::Int(-4)).unwrap(), "-4");
        assert_eq!(dialect.format_value(&Value::Bool(true)).unwrap(), "TRUE");
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(dialect.format_value(&Value::Date(date)).unwrap(), "'2024-02-29'");
    }

    #[test]
    fn structured_values_are_rejected() {
        let dialect = H2Dialect;
        assert!(dialect.format_value(&Value::List(vec![])).is_err());
    }

    #[test]
    fn sequence_expressions_differ_per_dialect() {
        assert_eq!(H2Dialect.next_sequence_value("s"), "NEXT VALUE FOR s");
        assert_eq!(PostgresDialect.next_sequence_value("s"), "nextval('s')");
        assert_eq!(PostgresDialect.current_sequence_value("s"), "currval('s')");
    }

    #[test]
    fn folding_direction() {
        assert_eq!(H2Dialect.fold_identifier("Person"), "PERSON");
        assert_eq!(PostgresDialect.fold_identifier("Person"), "person");
    }

    #[test]
    fn bytes_literals() {
        assert_eq!(H2Dialect.format_bytes(&[0xde, 0xad]), "X'dead'");
        assert_eq!(PostgresDialect.format_bytes(&[0xde, 0xad]), "'\\xdead'");
    }

    #[test]
    fn unknown_dialect_is_a_config_error() {
        assert!(dialect_by_name("oracle").is_err());
    }
}
