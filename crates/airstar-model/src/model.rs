//! The dimensional model: every table built and kept under its own name.

use std::path::Path;

use airstar_core::schema::ColumnTypes;
use airstar_core::types::RowBatch;
use airstar_io::{write_table_csv, ChunkedCsvReader, ReadOptions};

use crate::error::{ModelError, Result};
use crate::tables;

/// Load the whole cleaned artifact into one in-memory table.
pub fn load_artifact(path: &Path, batch_size: usize, types: &ColumnTypes) -> Result<RowBatch> {
    let reader = ChunkedCsvReader::open(path, ReadOptions::artifact(batch_size, types.clone()))?;
    let mut all = RowBatch::default();
    for batch in reader {
        all.append(batch?)?;
    }
    tracing::info!(
        path = %path.display(),
        rows = all.num_rows(),
        columns = all.num_columns(),
        "artifact loaded"
    );
    Ok(all)
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedTable {
    pub name: &'static str,
    pub table: RowBatch,
}

/// Outcome of exporting each table.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExportSummary {
    pub written: Vec<(&'static str, usize)>,
    /// Tables with no rows; no file is written for them.
    pub skipped: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
}

impl ExportSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DimensionalModel {
    tables: Vec<NamedTable>,
}

type Builder = fn(&RowBatch) -> Result<RowBatch>;

const BUILDERS: [(&str, Builder); 8] = [
    (tables::FACT_FLIGHTS, tables::fact_flights),
    (tables::FACT_AIRPORT_OPERATIONS, tables::fact_airport_operations),
    (tables::DIM_AIRLINE, tables::dim_airline),
    (tables::DIM_AIRPORT, tables::dim_airport),
    (tables::DIM_DATE, tables::dim_date),
    (tables::DIM_CANCELLATION, tables::dim_cancellation),
    (tables::DIM_DIVERSION, tables::dim_diversion),
    (tables::DIM_DELAY, tables::dim_delay),
];

impl DimensionalModel {
    /// Build every table from the full cleaned dataset.
    pub fn build(data: &RowBatch) -> Result<Self> {
        let mut out = Vec::with_capacity(BUILDERS.len());
        for (name, build) in BUILDERS {
            let table = build(data)?;
            tracing::info!(table = name, rows = table.num_rows(), "table built");
            out.push(NamedTable { name, table });
        }
        Ok(Self { tables: out })
    }

    pub fn tables(&self) -> &[NamedTable] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&RowBatch> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .map(|t| &t.table)
    }

    /// Write each non-empty table to `<dir>/<name>.csv`.
    ///
    /// A failed write is recorded and the remaining tables are still written.
    pub fn export(&self, dir: &Path) -> Result<ExportSummary> {
        std::fs::create_dir_all(dir).map_err(|source| ModelError::OutputDir {
            path: dir.display().to_string(),
            source,
        })?;
        let mut summary = ExportSummary::default();
        for NamedTable { name, table } in &self.tables {
            if table.num_rows() == 0 {
                tracing::warn!(table = *name, "table is empty, not exported");
                summary.skipped.push(*name);
                continue;
            }
            let path = dir.join(format!("{name}.csv"));
            match write_table_csv(&path, table) {
                Ok(rows) => {
                    tracing::info!(table = *name, rows, path = %path.display(), "table exported");
                    summary.written.push((*name, rows));
                }
                Err(e) => {
                    tracing::error!(table = *name, error = %e, "table export failed");
                    summary.failed.push((*name, e.to_string()));
                }
            }
        }
        Ok(summary)
    }
}
