#![forbid(unsafe_code)]
//! airstar-warehouse: pushes the cleaned artifact into a relational table and
//! runs the canned analytical queries against it.
//!
//! SQLite is always available. PostgreSQL sits behind the `postgres` feature.

pub mod error;
pub mod loader;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod queries;
pub mod sink;
pub mod sql;
pub mod sqlite;

pub use error::{Result, WarehouseError};
pub use loader::{LoadReport, WarehouseLoader};
#[cfg(feature = "postgres")]
pub use postgres::PostgresSink;
pub use queries::{run_catalog, CannedQuery, QUERIES};
pub use sink::{open_sink, RelationalSink};
pub use sql::{ResultSet, SqlType};
pub use sqlite::SqliteSink;
