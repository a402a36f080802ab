// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Statement builders and output sinks.
//!
//! Properties contribute column expressions to an [`InsertStatement`] or
//! [`UpdateStatement`]; the finished statement is rendered once and handed
//! to a [`StatementsWriter`]. Two writers exist: a buffered text writer
//! for script files and a connected writer forwarding to a live executor.

use std::io::{self, Write};

use crate::{
    context::registry::{GeneratorColumn, GeneratorTable, TableRegistry},
    dialect::GeneratorDialect,
    error::Result
};

/// An INSERT under construction.
#[derive(Debug)]
pub struct InsertStatement {
    table:  GeneratorTable,
    values: Vec<(GeneratorColumn, String)>
}

impl InsertStatement {
    /// Start an INSERT into the given table.
    pub fn new(table: GeneratorTable) -> Self {
        Self {
            table,
            values: Vec::new()
        }
    }

    /// Add one column expression. Columns are emitted in call order.
    pub fn set(&mut self, column: GeneratorColumn, expression: impl Into<String>) {
        self.values.push((column, expression.into()));
    }

    /// Whether no column has been set yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render the statement, without a terminator.
    pub fn to_sql(&self, dialect: &dyn GeneratorDialect, registry: &TableRegistry) -> String {
        let table = registry.table_name(self.table);
        if self.values.is_empty() {
            return dialect.empty_insert(table);
        }
        let columns = self
            .values
            .iter()
            .map(|(column, _)| registry.column_name(*column))
            .collect::<Vec<_>>()
            .join(", ");
        let values = self
            .values
            .iter()
            .map(|(_, expression)| expression.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("INSERT INTO {table} ({columns}) VALUES ({values})")
    }
}

/// An UPDATE under construction.
#[derive(Debug)]
pub struct UpdateStatement {
    table:     GeneratorTable,
    values:    Vec<(GeneratorColumn, String)>,
    predicate: String
}

impl UpdateStatement {
    /// Start an UPDATE of the rows matching `predicate`.
    pub fn new(table: GeneratorTable, predicate: impl Into<String>) -> Self {
        Self {
            table,
            values: Vec::new(),
            predicate: predicate.into()
        }
    }

    /// Add one SET expression. Columns are emitted in call order.
    pub fn set(&mut self, column: GeneratorColumn, expression: impl Into<String>) {
        self.values.push((column, expression.into()));
    }

    /// Add a raw SET expression such as `version = version + 1`.
    pub fn set_raw(&mut self, column: GeneratorColumn, expression: impl Into<String>) {
        self.set(column, expression);
    }

    /// Render the statement, without a terminator.
    pub fn to_sql(&self, registry: &TableRegistry) -> String {
        let table = registry.table_name(self.table);
        let assignments = self
            .values
            .iter()
            .map(|(column, expression)| format!("{} = {expression}", registry.column_name(*column)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("UPDATE {table} SET {assignments} WHERE {}", self.predicate)
    }
}

/// Sink for generated statements, comments and section breaks.
///
/// Failure of any operation surfaces as an I/O error; there is no retry
/// at this layer.
pub trait StatementsWriter {
    /// Append one executable statement.
    fn write_statement(&mut self, sql: &str) -> Result<()>;

    /// Append an explanatory comment; multi-line text stays commented.
    fn write_comment(&mut self, comment: &str) -> Result<()>;

    /// Append a blank line and a banner separating two sections.
    fn write_section_separator(&mut self) -> Result<()>;

    /// Append raw pre-rendered SQL text, as used for prefix and postfix
    /// parts. Writers without a textual sink ignore it.
    fn write_raw(&mut self, text: &str) -> Result<()>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<()>;
}

/// Buffered text writer producing the SQL script.
pub struct FileStatementsWriter<W: Write> {
    sink:           W,
    comment_prefix: &'static str,
    terminator:     &'static str
}

impl<W: Write> FileStatementsWriter<W> {
    /// Wrap an output sink using the dialect's comment and terminator
    /// syntax.
    pub fn new(sink: W, dialect: &dyn GeneratorDialect) -> Self {
        Self {
            sink,
            comment_prefix: dialect.comment_prefix(),
            terminator: dialect.statement_terminator()
        }
    }

    /// Consume the writer and hand back the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> StatementsWriter for FileStatementsWriter<W> {
    fn write_statement(&mut self, sql: &str) -> Result<()> {
        writeln!(self.sink, "{sql}{}", self.terminator)?;
        Ok(())
    }

    fn write_comment(&mut self, comment: &str) -> Result<()> {
        for line in comment.lines() {
            writeln!(self.sink, "{}{line}", self.comment_prefix)?;
        }
        if comment.is_empty() {
            writeln!(self.sink, "{}", self.comment_prefix.trim_end())?;
        }
        Ok(())
    }

    fn write_section_separator(&mut self) -> Result<()> {
        writeln!(self.sink)?;
        writeln!(self.sink, "{}--------------------------------------", self.comment_prefix)?;
        Ok(())
    }

    fn write_raw(&mut self, text: &str) -> Result<()> {
        self.sink.write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}

/// Executes single statements against a live database connection.
///
/// The connection itself is outside this crate; anything that can run one
/// statement at a time can stream the generated SQL.
pub trait StatementExecutor {
    /// Execute one statement.
    fn execute(&mut self, sql: &str) -> io::Result<()>;
}

/// Writer streaming statements to a [`StatementExecutor`].
///
/// Comments and section breaks have no meaning on a connection and are
/// dropped.
pub struct ConnectedStatementsWriter<'a, E: StatementExecutor> {
    executor: &'a mut E
}

impl<'a, E: StatementExecutor> ConnectedStatementsWriter<'a, E> {
    /// Wrap an executor.
    pub fn new(executor: &'a mut E) -> Self {
        Self { executor }
    }
}

impl<E: StatementExecutor> StatementsWriter for ConnectedStatementsWriter<'_, E> {
    fn write_statement(&mut self, sql: &str) -> Result<()> {
        self.executor.execute(sql)?;
        Ok(())
    }

    fn write_comment(&mut self, _comment: &str) -> Result<()> {
        Ok(())
    }

    fn write_section_separator(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_raw(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::H2Dialect;

    fn sample_registry() -> (TableRegistry, GeneratorTable) {
        let mut registry = TableRegistry::new();
        let table = registry.resolve_table(&H2Dialect, "Person");
        (registry, table)
    }

    #[test]
    fn insert_renders_columns_in_call_order() {
        let (mut registry, table) = sample_registry();
        let name = registry.resolve_column(&H2Dialect, table, "name");
        let age = registry.resolve_column(&H2Dialect, table, "age");
        let mut statement = InsertStatement::new(table);
        statement.set(name, "'alice'");
        statement.set(age, "41");
        assert_eq!(
            statement.to_sql(&H2Dialect, &registry),
            "INSERT INTO Person (name, age) VALUES ('alice', 41)"
        );
    }

    #[test]
    fn empty_insert_uses_dialect_shape() {
        let (registry, table) = sample_registry();
        let statement = InsertStatement::new(table);
        assert_eq!(statement.to_sql(&H2Dialect, &registry), "INSERT INTO Person () VALUES ()");
    }

    #[test]
    fn update_renders_assignments_and_predicate() {
        let (mut registry, table) = sample_registry();
        let fk = registry.resolve_column(&H2Dialect, table, "country_id");
        let mut statement = UpdateStatement::new(table, "id = 3");
        statement.set(fk, "7");
        assert_eq!(statement.to_sql(&registry), "UPDATE Person SET country_id = 7 WHERE id = 3");
    }

    #[test]
    fn file_writer_terminates_and_comments() {
        let mut buffer = Vec::new();
        {
            let mut writer = FileStatementsWriter::new(&mut buffer, &H2Dialect);
            writer.write_statement("SELECT 1").unwrap();
            writer.write_comment("two\nlines").unwrap();
            writer.flush().unwrap();
        }
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "SELECT 1;\n-- two\n-- lines\n");
    }

    #[test]
    fn connected_writer_drops_comments() {
        struct Recorder(Vec<String>);
        impl StatementExecutor for Recorder {
            fn execute(&mut self, sql: &str) -> io::Result<()> {
                self.0.push(sql.to_owned());
                Ok(())
            }
        }

        let mut recorder = Recorder(Vec::new());
        {
            let mut writer = ConnectedStatementsWriter::new(&mut recorder);
            writer.write_comment("ignored").unwrap();
            writer.write_statement("INSERT INTO t (a) VALUES (1)").unwrap();
        }
        assert_eq!(recorder.0, vec!["INSERT INTO t (a) VALUES (1)"]);
    }
}
