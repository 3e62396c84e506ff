//! File-level IO for airstar: the chunked source reader, the incremental
//! compressed sink, and the plain CSV writer used for model tables.
#![forbid(unsafe_code)]

pub mod coerce;
pub mod encoding;
pub mod error;
pub mod readers;
pub mod writers;

pub use error::{IoError, Result};
pub use readers::csv::{ChunkedCsvReader, Compression, ReadOptions};
pub use writers::compressed::CompressedCsvSink;
pub use writers::table::{write_table_csv, TableCsvWriter};
pub use writers::encode_rows;
