//! Post-run integrity check: can the artifact be read back?

use std::path::Path;

use airstar_core::report::IntegrityCheck;
use airstar_core::schema::ColumnTypes;
use airstar_io::{ChunkedCsvReader, ReadOptions};

/// Re-open the artifact and read at most `sample_rows` rows.
///
/// The rows are discarded; only whether they parse is recorded.
pub fn sample_artifact(path: &Path, sample_rows: usize, types: &ColumnTypes) -> IntegrityCheck {
    if !path.exists() {
        return IntegrityCheck::Skipped;
    }
    let opts = ReadOptions::artifact(sample_rows.max(1), types.clone());
    let mut reader = match ChunkedCsvReader::open(path, opts) {
        Ok(r) => r,
        Err(e) => {
            return IntegrityCheck::Failed {
                message: e.to_string(),
            }
        }
    };
    match reader.next_batch() {
        Ok(Some(batch)) => IntegrityCheck::Passed {
            rows: batch.num_rows(),
            columns: batch.num_columns(),
        },
        Ok(None) => IntegrityCheck::Passed {
            rows: 0,
            columns: reader.headers().len(),
        },
        Err(e) => IntegrityCheck::Failed {
            message: e.to_string(),
        },
    }
}
