//! Statement construction from column -> value sets.
//!
//! Every value becomes a `?` parameter; only identifiers are written into the
//! SQL text, and each one passes [`Ident::parse`] first. Building is pure: the
//! operations here never touch a connection (see [`crate::store`]).

use crate::error::{Error, Result};
use crate::ident::Ident;
use crate::sqlite::{Changes, ColumnValues, Constraints, SqlQuery, Value};

/// Conditional read: `SELECT * FROM <table> [WHERE ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOperation {
    pub table: String,
    pub constraints: Constraints,
}

/// Conditional delete. An empty filter is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOperation {
    pub table: String,
    pub constraints: Constraints,
}

/// Update of the rows whose key column equals `key_value`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOperation {
    pub table: String,
    pub key_name: String,
    pub key_value: Value,
    pub changes: Changes,
}

/// Single-row insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOperation {
    pub table: String,
    pub values: ColumnValues,
}

impl ReadOperation {
    pub fn new(table: &str, constraints: Constraints) -> Self {
        Self {
            table: table.to_string(),
            constraints,
        }
    }

    pub fn build(&self) -> Result<SqlQuery> {
        let mut sql = format!("SELECT * FROM {}", Ident::parse(&self.table)?);
        let mut params = Vec::with_capacity(self.constraints.len());
        push_where(&mut sql, &mut params, &self.constraints)?;
        Ok(SqlQuery::new(&sql).with_params(params))
    }
}

impl DeleteOperation {
    pub fn new(table: &str, constraints: Constraints) -> Self {
        Self {
            table: table.to_string(),
            constraints,
        }
    }

    pub fn build(&self) -> Result<SqlQuery> {
        let table = Ident::parse(&self.table)?;
        if self.constraints.is_empty() {
            return Err(Error::validation(format!(
                "refusing to delete from '{table}' without constraints"
            )));
        }
        let mut sql = format!("DELETE FROM {table}");
        let mut params = Vec::with_capacity(self.constraints.len());
        push_where(&mut sql, &mut params, &self.constraints)?;
        Ok(SqlQuery::new(&sql).with_params(params))
    }
}

impl UpdateOperation {
    pub fn new(table: &str, key_name: &str, key_value: impl Into<Value>, changes: Changes) -> Self {
        Self {
            table: table.to_string(),
            key_name: key_name.to_string(),
            key_value: key_value.into(),
            changes,
        }
    }

    /// `UPDATE <table> SET a = ?, b = ? WHERE <key> = ?`; the change values
    /// are bound first, then the key value.
    pub fn build(&self) -> Result<SqlQuery> {
        let table = Ident::parse(&self.table)?;
        let key = Ident::parse(&self.key_name)?;
        if self.key_value.is_null() {
            return Err(Error::validation(format!(
                "update of '{table}' needs a non-null value for key '{key}'"
            )));
        }
        if self.changes.is_empty() {
            return Err(Error::validation(format!(
                "update of '{table}' has no columns to set"
            )));
        }

        let mut params = Vec::with_capacity(self.changes.len() + 1);
        let set = column_list(&self.changes, &mut params)?;
        params.push(self.key_value.clone());
        let sql = format!("UPDATE {table} SET {} WHERE {key} = ?", set.join(", "));
        Ok(SqlQuery::new(&sql).with_params(params))
    }
}

impl InsertOperation {
    pub fn new(table: &str, values: ColumnValues) -> Self {
        Self {
            table: table.to_string(),
            values,
        }
    }

    pub fn build(&self) -> Result<SqlQuery> {
        let table = Ident::parse(&self.table)?;
        if self.values.is_empty() {
            return Err(Error::validation(format!(
                "insert into '{table}' has no values"
            )));
        }

        let mut columns = Vec::with_capacity(self.values.len());
        let mut params = Vec::with_capacity(self.values.len());
        for (column, value) in self.values.iter() {
            columns.push(Ident::parse(column)?.to_string());
            params.push(value.clone());
        }
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.join(", ")
        );
        Ok(SqlQuery::new(&sql).with_params(params))
    }
}

/// Append ` WHERE c1 = ? AND c2 = ?` for a non-empty filter.
fn push_where(sql: &mut String, params: &mut Vec<Value>, constraints: &Constraints) -> Result<()> {
    if constraints.is_empty() {
        return Ok(());
    }
    if let Some((column, _)) = constraints.iter().find(|(_, v)| v.is_null()) {
        return Err(Error::validation(format!(
            "NULL constraint on column '{column}' is not supported"
        )));
    }
    sql.push_str(" WHERE ");
    sql.push_str(&column_list(constraints, params)?.join(" AND "));
    Ok(())
}

/// `col = ?` fragments in set order, pushing each value onto `params`.
fn column_list(set: &ColumnValues, params: &mut Vec<Value>) -> Result<Vec<String>> {
    let mut parts = Vec::with_capacity(set.len());
    for (column, value) in set.iter() {
        parts.push(format!("{} = ?", Ident::parse(column)?));
        params.push(value.clone());
    }
    Ok(parts)
}
