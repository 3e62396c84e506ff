//! PostgreSQL sink on `sqlx`, driven from synchronous code through an owned
//! current-thread tokio runtime.
//!
//! Rows go in with `COPY ... FROM STDIN (FORMAT csv)`, one COPY per batch.
//! Queries use the simple protocol so every cell arrives as text.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{Column as _, Row as _};
use tokio::runtime::Runtime;

use airstar_core::config::WarehouseConfig;
use airstar_core::types::{RowBatch, Scalar};
use airstar_io::encode_rows;

use crate::error::{Result, WarehouseError};
use crate::sink::RelationalSink;
use crate::sql::{column_list, create_table_sql, parse_cell, quote_ident, ResultSet, SqlType};

/// Fields drop in declaration order: the pool goes before its runtime.
pub struct PostgresSink {
    pool: PgPool,
    runtime: Runtime,
}

impl PostgresSink {
    pub fn connect(cfg: &WarehouseConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(WarehouseError::Runtime)?;
        let options = PgConnectOptions::new()
            .host(&cfg.pg_host)
            .port(cfg.pg_port)
            .username(&cfg.pg_user)
            .password(&cfg.pg_password)
            .database(&cfg.pg_database);
        let pool = runtime.block_on(
            PgPoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Duration::from_secs(10))
                .connect_with(options),
        )?;
        tracing::info!(
            host = %cfg.pg_host,
            port = cfg.pg_port,
            database = %cfg.pg_database,
            "postgres warehouse connected"
        );
        Ok(Self { pool, runtime })
    }
}

impl Drop for PostgresSink {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}

impl RelationalSink for PostgresSink {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn ensure_table(&mut self, table: &str, columns: &[(String, SqlType)]) -> Result<()> {
        let sql = create_table_sql(table, columns);
        self.runtime
            .block_on(sqlx::query(&sql).execute(&self.pool))?;
        Ok(())
    }

    fn append(&mut self, table: &str, batch: &RowBatch) -> Result<usize> {
        if batch.num_rows() == 0 {
            return Ok(0);
        }
        let payload = encode_rows(batch)?;
        let statement = format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT csv, NULL '')",
            quote_ident(table),
            column_list(batch)
        );
        let rows = self.runtime.block_on(async {
            let mut conn = self.pool.acquire().await?;
            let mut copy = conn.copy_in_raw(&statement).await?;
            copy.send(payload).await?;
            copy.finish().await
        })?;
        Ok(rows as usize)
    }

    fn query(&mut self, sql: &str) -> Result<ResultSet> {
        let rows = self
            .runtime
            .block_on(sqlx::raw_sql(sql).fetch_all(&self.pool))?;
        // Column names come from the rows; an empty result has none.
        let columns: Vec<String> = rows
            .first()
            .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                let cell: Option<String> = row.try_get_unchecked(i)?;
                values.push(cell.as_deref().map_or(Scalar::Null, parse_cell));
            }
            out.push(values);
        }
        Ok(ResultSet { columns, rows: out })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconnected_sink_closes_cleanly_on_drop() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let options = PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .database("airstar");
        let pool = runtime.block_on(async {
            PgPoolOptions::new()
                .max_connections(1)
                .connect_lazy_with(options)
        });
        let sink = PostgresSink { pool, runtime };
        assert_eq!(sink.name(), "postgres");
        drop(sink);
    }
}
