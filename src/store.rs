//! Execution of built statements against a caller-owned connection.
//!
//! [`Store`] borrows the connection and the schema; it never opens, closes,
//! or retains anything between calls. Identifiers are checked against the
//! schema allowlist before a statement is built. Reads and deletes propagate
//! their errors, while updates are best-effort and report through
//! [`UpdateOutcome`].
//!
//! On a connection in autocommit mode every write runs in its own transaction
//! and is committed before returning. When the caller already has a
//! transaction open, the write joins it instead and becomes durable only when
//! the caller commits.

use rusqlite::{params_from_iter, Connection};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::query::{DeleteOperation, InsertOperation, ReadOperation, UpdateOperation};
use crate::schema::Schema;
use crate::sqlite::{Changes, ColumnValues, Constraints, Record, SqlQuery, Value};

/// Result of a best-effort [`Store::update`].
#[derive(Debug)]
pub enum UpdateOutcome {
    /// This many rows matched the key and were changed.
    Updated(usize),
    /// The statement ran but no row matched the key.
    NotFound,
    /// Rejected or failed; already logged. Nothing was committed.
    Failed(Error),
}

impl UpdateOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, UpdateOutcome::Failed(_))
    }

    /// Rows changed; zero unless [`UpdateOutcome::Updated`].
    pub fn rows(&self) -> usize {
        match self {
            UpdateOutcome::Updated(n) => *n,
            _ => 0,
        }
    }

    /// Convert into a `Result` for callers that want failures to propagate.
    pub fn into_result(self) -> Result<usize> {
        match self {
            UpdateOutcome::Updated(n) => Ok(n),
            UpdateOutcome::NotFound => Ok(0),
            UpdateOutcome::Failed(err) => Err(err),
        }
    }
}

/// Attribute-based data access over one connection.
#[derive(Debug, Clone, Copy)]
pub struct Store<'c> {
    conn: &'c Connection,
    schema: &'c Schema,
}

impl<'c> Store<'c> {
    pub fn new(conn: &'c Connection, schema: &'c Schema) -> Self {
        Self { conn, schema }
    }

    /// Rows of `table` matching every constraint; all rows when empty.
    ///
    /// Rows come back in SQLite's natural order.
    pub fn find(&self, table: &str, constraints: &Constraints) -> Result<Vec<Record>> {
        self.check_columns(table, constraints.iter().map(|(c, _)| c))?;
        let query = ReadOperation::new(table, constraints.clone()).build()?;
        log_statement(&query);

        let mut stmt = self.conn.prepare(&query.statement)?;
        let width = stmt.column_count();
        let rows = stmt.query_map(params_from_iter(query.params.iter()), |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Record>>()
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// [`Store::find`] followed by a typed decode of every record.
    pub fn find_as<T>(&self, table: &str, constraints: &Constraints) -> Result<Vec<T>>
    where
        T: for<'r> TryFrom<&'r Record, Error = Error>,
    {
        self.find(table, constraints)?
            .iter()
            .map(T::try_from)
            .collect()
    }

    /// Delete the rows matching every constraint and return how many went.
    ///
    /// An empty constraint set is refused before anything is executed.
    pub fn remove(&self, table: &str, constraints: &Constraints) -> Result<usize> {
        let query = DeleteOperation::new(table, constraints.clone()).build()?;
        self.check_columns(table, constraints.iter().map(|(c, _)| c))?;
        let (removed, _) = self.execute_write(&query)?;
        debug!(table, removed, "removed rows");
        Ok(removed)
    }

    /// Set `changes` on the rows where `key_name = key_value`.
    ///
    /// Never returns an error: failures are logged and reported as
    /// [`UpdateOutcome::Failed`] so the calling workflow keeps going.
    pub fn update(
        &self,
        table: &str,
        key_name: &str,
        key_value: impl Into<Value>,
        changes: &Changes,
    ) -> UpdateOutcome {
        let key_value = key_value.into();
        match self.try_update(table, key_name, key_value, changes) {
            Ok(0) => {
                debug!(table, key = key_name, "update matched no rows");
                UpdateOutcome::NotFound
            }
            Ok(n) => UpdateOutcome::Updated(n),
            Err(err) => {
                warn!(table, key = key_name, error = %err, "error updating record");
                UpdateOutcome::Failed(err)
            }
        }
    }

    /// Insert one row and return its generated rowid.
    pub fn insert(&self, table: &str, values: &ColumnValues) -> Result<i64> {
        self.check_columns(table, values.iter().map(|(c, _)| c))?;
        let query = InsertOperation::new(table, values.clone()).build()?;
        let (_, rowid) = self.execute_write(&query)?;
        Ok(rowid)
    }

    fn try_update(
        &self,
        table: &str,
        key_name: &str,
        key_value: Value,
        changes: &Changes,
    ) -> Result<usize> {
        let query = UpdateOperation::new(table, key_name, key_value, changes.clone()).build()?;
        self.check_columns(
            table,
            changes.iter().map(|(c, _)| c).chain(std::iter::once(key_name)),
        )?;
        let (updated, _) = self.execute_write(&query)?;
        Ok(updated)
    }

    fn check_columns<'a>(
        &self,
        table: &str,
        columns: impl IntoIterator<Item = &'a str>,
    ) -> Result<()> {
        let definition = self.schema.require_table(table)?;
        for column in columns {
            definition.require_column(column)?;
        }
        Ok(())
    }

    /// Run one write statement; returns the affected row count and the last
    /// inserted rowid.
    fn execute_write(&self, query: &SqlQuery) -> Result<(usize, i64)> {
        log_statement(query);
        let params = params_from_iter(query.params.iter());
        if !self.conn.is_autocommit() {
            // Caller-owned transaction: it decides when this commits.
            let affected = self.conn.execute(&query.statement, params)?;
            return Ok((affected, self.conn.last_insert_rowid()));
        }

        let tx = self.conn.unchecked_transaction()?;
        let affected = tx.execute(&query.statement, params)?;
        let rowid = tx.last_insert_rowid();
        tx.commit()?;
        Ok((affected, rowid))
    }
}

fn log_statement(query: &SqlQuery) {
    debug!(
        target: "workout_log::sql",
        sql = %query.statement,
        params = ?query.params,
        "executing statement"
    );
}
