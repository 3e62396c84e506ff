//! Re-streams the cleaned artifact into a warehouse table.

use std::path::Path;

use serde::Serialize;

use airstar_core::config::WarehouseConfig;
use airstar_core::schema::ColumnTypes;
use airstar_io::{ChunkedCsvReader, ReadOptions};

use crate::error::{Result, WarehouseError};
use crate::sink::RelationalSink;
use crate::sql::columns_for;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub table: String,
    pub batches: u64,
    pub rows: u64,
}

pub struct WarehouseLoader {
    table: String,
    batch_size: usize,
    types: ColumnTypes,
}

impl WarehouseLoader {
    pub fn new(table: impl Into<String>, batch_size: usize, types: ColumnTypes) -> Self {
        Self {
            table: table.into(),
            batch_size,
            types,
        }
    }

    pub fn from_config(cfg: &WarehouseConfig) -> Self {
        Self::new(
            cfg.table.clone(),
            cfg.load_batch_size,
            ColumnTypes::cleaned_airline(),
        )
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Append every row of `artifact` to the loader's table.
    ///
    /// The table is created from the first batch's layout. An artifact with
    /// no rows creates nothing.
    pub fn load(&self, artifact: &Path, sink: &mut dyn RelationalSink) -> Result<LoadReport> {
        if self.batch_size == 0 {
            return Err(WarehouseError::Config("load_batch_size must be positive".into()));
        }
        let opts = ReadOptions::artifact(self.batch_size, self.types.clone());
        let reader = ChunkedCsvReader::open(artifact, opts)?;
        let mut report = LoadReport {
            table: self.table.clone(),
            ..LoadReport::default()
        };

        for batch in reader {
            let batch = batch?;
            if report.batches == 0 {
                sink.ensure_table(&self.table, &columns_for(&batch, &self.types))?;
            }
            let rows = sink.append(&self.table, &batch)?;
            report.batches += 1;
            report.rows += rows as u64;
            tracing::info!(
                sink = sink.name(),
                table = %self.table,
                batch = report.batches,
                rows,
                total = report.rows,
                "batch loaded"
            );
        }

        if report.batches == 0 {
            tracing::warn!(artifact = %artifact.display(), "artifact has no rows, nothing loaded");
        }
        Ok(report)
    }
}
