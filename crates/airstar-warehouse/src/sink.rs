//! The relational sink seam: anything that can hold a table of rows and
//! answer SQL over it.

use airstar_core::config::{WarehouseBackend, WarehouseConfig};
use airstar_core::types::RowBatch;

use crate::error::Result;
#[cfg(not(feature = "postgres"))]
use crate::error::WarehouseError;
use crate::sql::{ResultSet, SqlType};
use crate::sqlite::SqliteSink;

pub trait RelationalSink {
    fn name(&self) -> &'static str;

    /// Create `table` with `columns` unless it already exists.
    fn ensure_table(&mut self, table: &str, columns: &[(String, SqlType)]) -> Result<()>;

    /// Append every row of `batch`; returns the number of rows stored.
    fn append(&mut self, table: &str, batch: &RowBatch) -> Result<usize>;

    fn query(&mut self, sql: &str) -> Result<ResultSet>;
}

/// Connect to the backend named in `cfg`.
pub fn open_sink(cfg: &WarehouseConfig) -> Result<Box<dyn RelationalSink>> {
    match cfg.backend {
        WarehouseBackend::Sqlite => Ok(Box::new(SqliteSink::open(&cfg.sqlite_path)?)),
        #[cfg(feature = "postgres")]
        WarehouseBackend::Postgres => Ok(Box::new(crate::postgres::PostgresSink::connect(cfg)?)),
        #[cfg(not(feature = "postgres"))]
        WarehouseBackend::Postgres => Err(WarehouseError::Unsupported("postgres")),
    }
}
