//! Table definitions used both to create tables and as the identifier
//! allowlist checked before any statement is built.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Error, Result};
use crate::ident::Ident;

/// Schema definition for the SQLite database
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Schema {
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }
    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }

    /// Look up a table by name (ASCII case-insensitive).
    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Like [`Schema::table`], but a miss is an [`Error::UnknownTable`].
    pub fn require_table(&self, name: &str) -> Result<&TableDefinition> {
        self.table(name)
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    /// Create every table that does not exist yet.
    pub fn initialize(&self, conn: &Connection) -> Result<()> {
        for table in &self.tables {
            let sql = table.create_sql()?;
            conn.execute_batch(&sql)?;
            info!(table = %table.name, "ensured table exists");
        }
        Ok(())
    }

    /// Read the schema of an existing database.
    pub fn introspect(conn: &Connection) -> Result<Self> {
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut schema = Schema::new();
        for name in names {
            schema = schema.add_table(TableDefinition::introspect(conn, &name)?);
        }
        Ok(schema)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDefinition) -> Self {
        if column.constraints.contains(&ColumnConstraint::PrimaryKey) {
            self.primary_key.push(column.name.clone());
        }
        self.columns.push(column);
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Look up a declared column by name (ASCII case-insensitive).
    pub fn find_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Like [`TableDefinition::find_column`], but a miss is an
    /// [`Error::UnknownColumn`].
    pub fn require_column(&self, name: &str) -> Result<&ColumnDefinition> {
        self.find_column(name).ok_or_else(|| Error::UnknownColumn {
            table: self.name.clone(),
            column: name.to_string(),
        })
    }

    /// Column names in declaration order, which is also the positional order
    /// of a `SELECT *` record.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Render an idempotent `CREATE TABLE` statement.
    pub fn create_sql(&self) -> Result<String> {
        let mut defs = Vec::with_capacity(self.columns.len() + self.foreign_keys.len());
        for column in &self.columns {
            defs.push(column.to_sql()?);
        }
        for fk in &self.foreign_keys {
            defs.push(fk.to_sql()?);
        }
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            Ident::parse(&self.name)?,
            defs.join(", ")
        ))
    }

    fn introspect(conn: &Connection, name: &str) -> Result<Self> {
        let ident = Ident::parse(name)?;
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({ident})"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, i64>(5)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut table = TableDefinition::new(name);
        for (column, declared_type, not_null, pk) in rows {
            let mut constraints = Vec::new();
            if pk > 0 {
                constraints.push(ColumnConstraint::PrimaryKey);
            }
            if not_null {
                constraints.push(ColumnConstraint::NotNull);
            }
            table = table.column(ColumnDefinition {
                name: column,
                data_type: DataType::from_declared(&declared_type),
                constraints,
            });
        }

        let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({ident})"))?;
        let fks = stmt
            .query_map([], |row| {
                Ok(ForeignKey {
                    foreign_table: row.get(2)?,
                    column: row.get(3)?,
                    // NULL when the reference targets the parent's implicit key
                    foreign_column: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    on_delete: ForeignKeyAction::from_sql(&row.get::<_, String>(6)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        table.foreign_keys = fks;
        Ok(table)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

impl ColumnDefinition {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            constraints: Vec::new(),
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.constraints.push(ColumnConstraint::PrimaryKey);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.constraints.push(ColumnConstraint::NotNull);
        self
    }

    pub fn unique(mut self) -> Self {
        self.constraints.push(ColumnConstraint::Unique);
        self
    }

    fn to_sql(&self) -> Result<String> {
        let mut sql = format!("{} {}", Ident::parse(&self.name)?, self.data_type.as_sql());
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(constraint.as_sql());
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Text,
    Real,
    Numeric,
    Blob,
}

impl DataType {
    pub fn as_sql(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
            DataType::Real => "REAL",
            DataType::Numeric => "NUMERIC",
            DataType::Blob => "BLOB",
        }
    }

    /// Map a declared column type to its SQLite type affinity.
    pub fn from_declared(declared: &str) -> Self {
        let t = declared.to_ascii_uppercase();
        if t.contains("INT") {
            DataType::Integer
        } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
            DataType::Text
        } else if t.is_empty() || t.contains("BLOB") {
            DataType::Blob
        } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
            DataType::Real
        } else {
            DataType::Numeric
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnConstraint {
    PrimaryKey,
    NotNull,
    Unique,
}

impl ColumnConstraint {
    fn as_sql(self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
            ColumnConstraint::NotNull => "NOT NULL",
            ColumnConstraint::Unique => "UNIQUE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub column: String,
    pub foreign_table: String,
    pub foreign_column: String,
    pub on_delete: ForeignKeyAction,
}

impl ForeignKey {
    pub fn new(column: &str, foreign_table: &str, foreign_column: &str) -> Self {
        Self {
            column: column.to_string(),
            foreign_table: foreign_table.to_string(),
            foreign_column: foreign_column.to_string(),
            on_delete: ForeignKeyAction::NoAction,
        }
    }

    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = action;
        self
    }

    fn to_sql(&self) -> Result<String> {
        let mut sql = format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            Ident::parse(&self.column)?,
            Ident::parse(&self.foreign_table)?,
            Ident::parse(&self.foreign_column)?
        );
        if self.on_delete != ForeignKeyAction::NoAction {
            sql.push_str(" ON DELETE ");
            sql.push_str(self.on_delete.as_sql());
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    NoAction,
    Cascade,
    SetNull,
    Restrict,
}

impl ForeignKeyAction {
    fn as_sql(self) -> &'static str {
        match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::Restrict => "RESTRICT",
        }
    }

    fn from_sql(action: &str) -> Self {
        match action.to_ascii_uppercase().as_str() {
            "CASCADE" => ForeignKeyAction::Cascade,
            "SET NULL" => ForeignKeyAction::SetNull,
            "RESTRICT" => ForeignKeyAction::Restrict,
            _ => ForeignKeyAction::NoAction,
        }
    }
}
