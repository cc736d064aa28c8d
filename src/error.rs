//! Error types for the workout log data-access layer.

use thiserror::Error;

/// Result type alias for workout log operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for database operations
#[derive(Debug, Error)]
pub enum Error {
    /// The database could not be opened or configured
    #[error("Connection error: {0}")]
    Connection(#[source] rusqlite::Error),

    /// Statement preparation or execution failed
    #[error("Query error: {0}")]
    Query(#[from] rusqlite::Error),

    /// Table is not part of the schema allowlist
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Column is not declared by the table
    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// Identifier cannot be embedded into SQL text
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Request rejected before any statement was executed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Whether the error belongs to the query kind: a bad table or column
    /// reference, or a fault reported by SQLite while executing.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Self::Query(_)
                | Self::UnknownTable(_)
                | Self::UnknownColumn { .. }
                | Self::InvalidIdentifier(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
