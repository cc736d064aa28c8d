//! SQLite-backed workout log with a generic attribute-based query builder.
//!
//! # Intention
//!
//! - Build parameterized `SELECT`, `UPDATE`, `DELETE` and `INSERT` statements
//!   from ordered column -> value sets instead of one hand-written query per
//!   call site.
//! - Keep values out of SQL text entirely and admit only identifiers that the
//!   schema declares.
//!
//! # Architectural Boundaries
//!
//! - [`query`] builds statements and never touches a connection.
//! - [`store`] executes them on a connection owned by the caller.
//! - [`workout`] holds the fixed `trainings` / `exercises` contract.
//! - Only SQLite/database code belongs here; the demo binary is the sole
//!   composition root.
//!
//! # Example
//! ```no_run
//! use workout_log::{workout, Changes, Constraints, SqliteConfig, Store};
//!
//! let config = SqliteConfig::new("database.db", workout::schema());
//! let conn = config.open()?;
//! workout::create_tables(&conn)?;
//!
//! let store = Store::new(&conn, &config.schema);
//! store.update(
//!     workout::EXERCISES,
//!     "name",
//!     "EZ-Bar Curl",
//!     &Changes::new().with_value("number_of_rep", 15),
//! );
//! let curls = store.find(
//!     workout::EXERCISES,
//!     &Constraints::new().with_value("name", "EZ-Bar Curl"),
//! )?;
//! # Ok::<(), workout_log::Error>(())
//! ```

pub mod error;
pub mod ident;
pub mod query;
pub mod schema;
pub mod sqlite;
pub mod store;
pub mod workout;

pub use error::{Error, Result};
pub use ident::Ident;
pub use schema::Schema;
pub use sqlite::{Changes, ColumnValues, Constraints, Record, SqlQuery, SqliteConfig, Value};
pub use store::{Store, UpdateOutcome};
