//! Chunked CSV reader.
//!
//! Yields `RowBatch`es of at most `batch_size` rows in source order. Only one
//! batch is materialised at a time; the underlying file is streamed.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use airstar_core::schema::{ColumnTypes, DataType};
use airstar_core::types::{CategoryPool, Column, RowBatch, Scalar};

use crate::coerce::coerce;
use crate::encoding::TextEncoding;
use crate::error::{IoError, Result};

/// Byte-level compression of the file being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    /// One or more concatenated zstd frames.
    Zstd,
}

#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub batch_size: usize,
    pub delimiter: u8,
    pub encoding: TextEncoding,
    pub types: ColumnTypes,
    pub compression: Compression,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            batch_size: 50_000,
            delimiter: b',',
            encoding: TextEncoding::Latin1,
            types: ColumnTypes::new(),
            compression: Compression::None,
        }
    }
}

impl ReadOptions {
    /// Options for the raw source extract.
    pub fn source(batch_size: usize, types: ColumnTypes) -> Self {
        Self {
            batch_size,
            types,
            ..Self::default()
        }
    }

    /// Options for re-reading a cleaned artifact.
    pub fn artifact(batch_size: usize, types: ColumnTypes) -> Self {
        Self {
            batch_size,
            types,
            encoding: TextEncoding::Utf8,
            compression: Compression::Zstd,
            ..Self::default()
        }
    }
}

pub struct ChunkedCsvReader {
    path: PathBuf,
    batch_size: usize,
    encoding: TextEncoding,
    reader: csv::Reader<Box<dyn Read>>,
    headers: Vec<String>,
    declared: Vec<Option<DataType>>,
    record: csv::ByteRecord,
    rows_read: u64,
    done: bool,
}

impl std::fmt::Debug for ChunkedCsvReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedCsvReader")
            .field("path", &self.path)
            .field("batch_size", &self.batch_size)
            .field("headers", &self.headers)
            .field("rows_read", &self.rows_read)
            .finish()
    }
}

impl ChunkedCsvReader {
    /// Open `path` and read its header line. Rows are read lazily.
    pub fn open(path: impl AsRef<Path>, options: ReadOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if options.batch_size == 0 {
            return Err(IoError::Config("batch_size must be positive".into()));
        }
        let open_err = |source: std::io::Error| IoError::Open {
            path: path.display().to_string(),
            source,
        };
        let file = File::open(&path).map_err(open_err)?;
        let inner: Box<dyn Read> = match options.compression {
            Compression::None => Box::new(BufReader::with_capacity(1 << 20, file)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(file).map_err(open_err)?),
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(inner);

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .enumerate()
            .map(|(idx, raw)| {
                let name = options.encoding.decode_header(raw);
                if name.trim().is_empty() {
                    format!("Unnamed: {idx}")
                } else {
                    name.into_owned()
                }
            })
            .collect();
        let headers = dedup_headers(headers);
        let declared = headers.iter().map(|h| options.types.get(h)).collect();

        tracing::debug!(path = %path.display(), columns = headers.len(), "opened csv");

        Ok(Self {
            path,
            batch_size: options.batch_size,
            encoding: options.encoding,
            reader,
            headers,
            declared,
            record: csv::ByteRecord::new(),
            rows_read: 0,
            done: false,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows yielded so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Read the next batch; `Ok(None)` once the file is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<RowBatch>> {
        if self.done || self.headers.is_empty() {
            self.done = true;
            return Ok(None);
        }

        let width = self.headers.len();
        let mut columns: Vec<Vec<Scalar>> = (0..width)
            .map(|_| Vec::with_capacity(self.batch_size.min(1 << 16)))
            .collect();
        let mut pool = CategoryPool::new();
        let mut rows = 0usize;

        while rows < self.batch_size {
            if !self.reader.read_byte_record(&mut self.record)? {
                self.done = true;
                break;
            }
            if self.record.len() > width {
                let line = self.record.position().map(|p| p.line()).unwrap_or(0);
                return Err(IoError::Malformed {
                    line,
                    message: format!("expected {width} fields, saw {}", self.record.len()),
                });
            }
            for (ci, values) in columns.iter_mut().enumerate() {
                let value = match self.record.get(ci) {
                    Some(raw) => coerce(&self.encoding.decode(raw), self.declared[ci], &mut pool),
                    None => Scalar::Null,
                };
                values.push(value);
            }
            rows += 1;
        }

        if rows == 0 {
            return Ok(None);
        }
        self.rows_read += rows as u64;
        let columns = self
            .headers
            .iter()
            .zip(columns)
            .map(|(name, values)| Column::new(name.clone(), values))
            .collect();
        Ok(Some(RowBatch::new(columns)))
    }
}

impl Iterator for ChunkedCsvReader {
    type Item = Result<RowBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_batch() {
            Ok(batch) => batch.map(Ok),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Give repeated header names a `.N` suffix so every column stays addressable.
fn dedup_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut out = Vec::with_capacity(headers.len());
    for name in headers {
        let mut unique = name.clone();
        let mut n = 1;
        while seen.contains(&unique) {
            unique = format!("{name}.{n}");
            n += 1;
        }
        seen.insert(unique.clone());
        out.push(unique);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_source(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    fn numbered_rows(n: usize) -> Vec<u8> {
        let mut s = String::from(",Year,Origin\n");
        for i in 0..n {
            s.push_str(&format!("{i},2018,ATL\n"));
        }
        s.into_bytes()
    }

    #[test]
    fn batches_are_bounded_and_ordered() {
        let src = write_source(&numbered_rows(250_000));
        let opts = ReadOptions::source(100_000, ColumnTypes::airline());
        let reader = ChunkedCsvReader::open(src.path(), opts).unwrap();
        let mut sizes = Vec::new();
        let mut index = Vec::new();
        for batch in reader {
            let batch = batch.unwrap();
            sizes.push(batch.num_rows());
            let col = batch.column("Unnamed: 0").unwrap();
            index.extend(col.values.iter().map(|v| v.as_i64().unwrap()));
        }
        assert_eq!(sizes, vec![100_000, 100_000, 50_000]);
        assert_eq!(index, (0..250_000).collect::<Vec<i64>>());
    }

    #[test]
    fn repeated_headers_get_suffixes() {
        let src = write_source(b"Year,Note,Note,Note.1\n2018,first,second,third\n");
        let mut reader =
            ChunkedCsvReader::open(src.path(), ReadOptions::source(10, ColumnTypes::new())).unwrap();
        assert_eq!(reader.headers(), ["Year", "Note", "Note.1", "Note.1.1"]);
        let b = reader.next_batch().unwrap().unwrap();
        assert_eq!(b.column("Note").unwrap().values, vec![Scalar::Str("first".into())]);
        assert_eq!(b.column("Note.1").unwrap().values, vec![Scalar::Str("second".into())]);
        assert_eq!(b.column("Note.1.1").unwrap().values, vec![Scalar::Str("third".into())]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_batch() {
        let src = write_source(&numbered_rows(6));
        let mut reader =
            ChunkedCsvReader::open(src.path(), ReadOptions::source(3, ColumnTypes::new())).unwrap();
        let first = reader.next_batch().unwrap().unwrap();
        assert_eq!(first.column("Unnamed: 0").unwrap().values[0], Scalar::I64(0));
        assert_eq!(reader.next_batch().unwrap().unwrap().num_rows(), 3);
        assert!(reader.next_batch().unwrap().is_none());
        assert_eq!(reader.rows_read(), 6);
    }

    #[test]
    fn declared_types_and_latin1_text() {
        let mut raw = b"Year,Month,DepTime,OriginCityName\n2018,1,1430,S".to_vec();
        raw.extend_from_slice(&[0xE3, b'o', b'\n']);
        raw.extend_from_slice(b"20x8,,abc,Recife\n");
        let src = write_source(&raw);
        let mut reader =
            ChunkedCsvReader::open(src.path(), ReadOptions::source(10, ColumnTypes::airline()))
                .unwrap();
        let b = reader.next_batch().unwrap().unwrap();
        assert_eq!(b.column("Year").unwrap().values, vec![Scalar::I16(2018), Scalar::Null]);
        assert_eq!(b.column("Month").unwrap().values, vec![Scalar::I8(1), Scalar::Null]);
        assert_eq!(b.column("DepTime").unwrap().values[0], Scalar::F32(1430.0));
        assert_eq!(b.column("DepTime").unwrap().values[1], Scalar::Null);
        assert_eq!(
            b.column("OriginCityName").unwrap().values[0],
            Scalar::Str("São".into())
        );
    }

    #[test]
    fn short_records_pad_with_null_and_long_records_fail() {
        let src = write_source(b"a,b,c\n1,2\n1,2,3,4\n");
        let mut reader =
            ChunkedCsvReader::open(src.path(), ReadOptions::source(1, ColumnTypes::new())).unwrap();
        let b = reader.next_batch().unwrap().unwrap();
        assert_eq!(b.column("c").unwrap().values, vec![Scalar::Null]);
        let err = reader.next_batch().unwrap_err();
        assert!(matches!(err, IoError::Malformed { .. }));
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = ChunkedCsvReader::open("/definitely/not/here.csv", ReadOptions::default())
            .unwrap_err();
        assert!(matches!(err, IoError::Open { .. }));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let src = write_source(b"a\n1\n");
        let err = ChunkedCsvReader::open(src.path(), ReadOptions::source(0, ColumnTypes::new()))
            .unwrap_err();
        assert!(matches!(err, IoError::Config(_)));
    }

    #[test]
    fn reads_concatenated_zstd_frames() {
        let mut bytes = zstd::stream::encode_all(&b"x,y\n1,a\n"[..], 3).unwrap();
        bytes.extend(zstd::stream::encode_all(&b"2,b\n"[..], 3).unwrap());
        let src = write_source(&bytes);
        let reader =
            ChunkedCsvReader::open(src.path(), ReadOptions::artifact(10, ColumnTypes::new()))
                .unwrap();
        let batches: Vec<RowBatch> = reader.map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].column("x").unwrap().values,
            vec![Scalar::I64(1), Scalar::I64(2)]
        );
    }
}
