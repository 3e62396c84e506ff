//! Incremental sink for cleaned batches: CSV text, zstd-compressed.
//!
//! Each append writes one complete zstd frame and flushes it, so the file is
//! a valid stream after every call and a failed run leaves a readable prefix.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use airstar_core::types::RowBatch;

use crate::error::{IoError, Result};
use crate::writers::write_rows;

pub struct CompressedCsvSink {
    path: PathBuf,
    level: i32,
    file: File,
    // fixed by the first written batch
    columns: Option<Vec<String>>,
    rows_written: u64,
    frames: usize,
}

impl std::fmt::Debug for CompressedCsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressedCsvSink")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("columns", &self.columns)
            .field("rows_written", &self.rows_written)
            .finish()
    }
}

impl CompressedCsvSink {
    /// Open `path` for appending, creating it if needed.
    pub fn new(path: impl AsRef<Path>, level: i32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| IoError::Open {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| IoError::Open {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self {
            path,
            level,
            file,
            columns: None,
            rows_written: 0,
            frames: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Column order of the artifact, once known.
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Append `batch`. The header line is written only when `first` is set.
    ///
    /// Returns the number of data rows written.
    pub fn append(&mut self, batch: &RowBatch, first: bool) -> Result<usize> {
        if batch.num_columns() == 0 {
            return Ok(0);
        }
        if first || self.columns.is_none() {
            self.columns = Some(batch.column_names().iter().map(|s| s.to_string()).collect());
        }
        let order = match &self.columns {
            Some(cols) => column_order(cols, batch)?,
            None => return Ok(0),
        };
        if !first && batch.num_rows() == 0 {
            return Ok(0);
        }

        let encoder = zstd::stream::write::Encoder::new(&mut self.file, self.level)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(encoder);
        if first {
            let names: Vec<&str> = order
                .iter()
                .map(|&ci| batch.columns[ci].name.as_str())
                .collect();
            writer.write_record(&names)?;
        }
        write_rows(&mut writer, batch, &order)?;
        let encoder = writer
            .into_inner()
            .map_err(|e| IoError::Io(e.into_error()))?;
        encoder.finish()?;
        self.file.flush()?;

        let rows = batch.num_rows();
        self.rows_written += rows as u64;
        self.frames += 1;
        tracing::trace!(rows, frames = self.frames, "appended frame");
        Ok(rows)
    }

    /// Flush file contents to durable storage.
    pub fn finish(self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

/// Positions of `columns` within `batch`; the column sets must be equal.
fn column_order(columns: &[String], batch: &RowBatch) -> Result<Vec<usize>> {
    if columns.len() != batch.num_columns() {
        return Err(IoError::SchemaMismatch(format!(
            "artifact has {} columns, batch has {}",
            columns.len(),
            batch.num_columns()
        )));
    }
    columns
        .iter()
        .map(|name| {
            batch.index_of(name).ok_or_else(|| {
                IoError::SchemaMismatch(format!("batch lacks artifact column '{name}'"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use airstar_core::types::{Column, Scalar};
    use std::io::Read;

    fn batch(rows: i64) -> RowBatch {
        RowBatch::new(vec![
            Column::new("id", (0..rows).map(Scalar::I64).collect()),
            Column::new("delay", (0..rows).map(|r| Scalar::F32(r as f32)).collect()),
        ])
    }

    fn decompress(path: &Path) -> String {
        let file = File::open(path).unwrap();
        let mut out = String::new();
        zstd::stream::read::Decoder::new(file)
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn header_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv.zst");
        let mut sink = CompressedCsvSink::new(&path, 3).unwrap();
        assert_eq!(sink.append(&batch(2), true).unwrap(), 2);
        assert_eq!(sink.append(&batch(3), false).unwrap(), 3);
        sink.finish().unwrap();

        let text = decompress(&path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "id,delay");
        assert_eq!(lines.iter().filter(|l| **l == "id,delay").count(), 1);
        assert_eq!(lines[1], "0,0.0");
    }

    #[test]
    fn later_batches_are_aligned_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv.zst");
        let mut sink = CompressedCsvSink::new(&path, 3).unwrap();
        sink.append(&batch(1), true).unwrap();
        let mut swapped = batch(2);
        swapped.columns.reverse();
        sink.append(&swapped, false).unwrap();

        let text = decompress(&path);
        assert_eq!(text.lines().last(), Some("1,1.0"));
    }

    #[test]
    fn differing_column_set_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CompressedCsvSink::new(dir.path().join("a.csv.zst"), 3).unwrap();
        sink.append(&batch(1), true).unwrap();
        let mut other = batch(1);
        other.columns[1].name = "other".into();
        let err = sink.append(&other, false).unwrap_err();
        assert!(matches!(err, IoError::SchemaMismatch(_)));
    }

    #[test]
    fn empty_first_batch_still_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.csv.zst");
        let mut sink = CompressedCsvSink::new(&path, 3).unwrap();
        assert_eq!(sink.append(&batch(0), true).unwrap(), 0);
        assert_eq!(decompress(&path), "id,delay\n");
    }

    #[test]
    fn nulls_render_as_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n.csv.zst");
        let mut sink = CompressedCsvSink::new(&path, 3).unwrap();
        let b = RowBatch::new(vec![
            Column::new("a", vec![Scalar::Null]),
            Column::new("b", vec![Scalar::Str("x".into())]),
        ]);
        sink.append(&b, true).unwrap();
        assert_eq!(decompress(&path), "a,b\n,x\n");
    }
}
