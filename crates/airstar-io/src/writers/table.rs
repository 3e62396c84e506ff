//! Plain CSV writer for whole in-memory tables.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use airstar_core::types::RowBatch;

use crate::error::{IoError, Result};
use crate::writers::write_rows;

pub struct TableCsvWriter {
    path: PathBuf,
    writer: csv::Writer<BufWriter<File>>,
    columns: Option<Vec<String>>,
    rows: usize,
}

impl TableCsvWriter {
    /// Create (truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| IoError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        Ok(Self {
            path,
            writer,
            columns: None,
            rows: 0,
        })
    }

    /// Write a batch; the header comes from the first one.
    pub fn write_batch(&mut self, batch: &RowBatch) -> Result<()> {
        let order: Vec<usize> = match &self.columns {
            None => {
                let names: Vec<String> =
                    batch.column_names().iter().map(|s| s.to_string()).collect();
                self.writer.write_record(&names)?;
                self.columns = Some(names);
                (0..batch.num_columns()).collect()
            }
            Some(cols) => cols
                .iter()
                .map(|n| {
                    batch.index_of(n).ok_or_else(|| {
                        IoError::SchemaMismatch(format!("table batch lacks column '{n}'"))
                    })
                })
                .collect::<Result<_>>()?,
        };
        write_rows(&mut self.writer, batch, &order)?;
        self.rows += batch.num_rows();
        Ok(())
    }

    /// Flush and close; returns the number of data rows written.
    pub fn finish(self) -> Result<usize> {
        let mut inner = self
            .writer
            .into_inner()
            .map_err(|e| IoError::Io(e.into_error()))?;
        inner.flush()?;
        tracing::debug!(path = %self.path.display(), rows = self.rows, "table written");
        Ok(self.rows)
    }
}

/// Write `table` to `path` as a single CSV file with a header line.
pub fn write_table_csv(path: impl AsRef<Path>, table: &RowBatch) -> Result<usize> {
    let mut writer = TableCsvWriter::create(path)?;
    writer.write_batch(table)?;
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use airstar_core::types::{Column, Scalar};

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dim.csv");
        let table = RowBatch::new(vec![
            Column::new("code", vec![Scalar::Cat("A".into()), Scalar::Cat("B".into())]),
            Column::new("id", vec![Scalar::I64(1), Scalar::I64(2)]),
        ]);
        assert_eq!(write_table_csv(&path, &table).unwrap(), 2);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "code,id\nA,1\nB,2\n");
    }
}
