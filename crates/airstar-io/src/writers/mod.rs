//! Writers for cleaned batches and model tables.

use std::io::Write;

use airstar_core::types::RowBatch;

use crate::error::Result;

pub mod compressed;
pub mod table;

/// Write every row of `batch` with columns taken in `order`.
///
/// Nulls become empty fields.
pub(crate) fn write_rows<W: Write>(
    writer: &mut csv::Writer<W>,
    batch: &RowBatch,
    order: &[usize],
) -> Result<()> {
    let mut fields: Vec<String> = Vec::with_capacity(order.len());
    for row in 0..batch.num_rows() {
        fields.clear();
        for &ci in order {
            fields.push(batch.columns[ci].values[row].render().unwrap_or_default());
        }
        writer.write_record(&fields)?;
    }
    Ok(())
}

/// Encode `batch` as header-less CSV bytes, columns in batch order.
pub fn encode_rows(batch: &RowBatch) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    let order: Vec<usize> = (0..batch.num_columns()).collect();
    write_rows(&mut writer, batch, &order)?;
    writer
        .into_inner()
        .map_err(|e| crate::error::IoError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use airstar_core::types::{Column, Scalar};

    #[test]
    fn encode_rows_leaves_nulls_empty() {
        let batch = RowBatch::new(vec![
            Column::new("a", vec![Scalar::I64(1), Scalar::Null]),
            Column::new("b", vec![Scalar::Str("x,y".into()), Scalar::F32(2.0)]),
        ]);
        let bytes = encode_rows(&batch).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "1,\"x,y\"\n,2.0\n");
    }
}
