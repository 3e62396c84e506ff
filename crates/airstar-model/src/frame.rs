//! Whole-table helpers: projection with renames, distinct rows, row ids.

use std::collections::BTreeSet;

use airstar_core::types::{Column, RowBatch, Scalar, ScalarKey};

use crate::error::{ModelError, Result};

/// Column that `table` cannot be built without.
pub fn require<'a>(data: &'a RowBatch, table: &'static str, name: &str) -> Result<&'a Column> {
    data.column(name).ok_or_else(|| ModelError::MissingColumn {
        table,
        column: name.to_string(),
    })
}

/// Copy `(source, output)` columns out of `data`, renaming as it goes.
pub fn select(data: &RowBatch, table: &'static str, mapping: &[(&str, &str)]) -> Result<RowBatch> {
    let columns = mapping
        .iter()
        .map(|(src, out)| {
            let col = require(data, table, src)?;
            Ok(Column::new(*out, col.values.clone()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RowBatch::new(columns))
}

fn row_key(batch: &RowBatch, row: usize) -> ScalarKey {
    ScalarKey(batch.row(row).into_iter().cloned().collect())
}

/// Keep the first occurrence of every distinct row. Nulls compare equal.
pub fn distinct(mut batch: RowBatch) -> Result<RowBatch> {
    let mut seen = BTreeSet::new();
    let keep: Vec<bool> = (0..batch.num_rows())
        .map(|row| seen.insert(row_key(&batch, row)))
        .collect();
    batch.retain_rows(&keep)?;
    Ok(batch)
}

/// Drop rows with a null in any column.
pub fn drop_incomplete(mut batch: RowBatch) -> Result<RowBatch> {
    let keep: Vec<bool> = (0..batch.num_rows())
        .map(|row| batch.row(row).iter().all(|v| !v.is_null()))
        .collect();
    batch.retain_rows(&keep)?;
    Ok(batch)
}

/// Surrogate keys `1..=n`.
pub fn row_ids(n: usize) -> Vec<Scalar> {
    (1..=n as i64).map(Scalar::I64).collect()
}

/// Append a `1..=n` id column named `name`.
pub fn with_row_ids(mut batch: RowBatch, name: &str) -> Result<RowBatch> {
    let ids = row_ids(batch.num_rows());
    batch.set_column(Column::new(name, ids))?;
    Ok(batch)
}

/// Mean of the non-null values among `values`; null when all are null.
pub fn mean_of(values: &[&Scalar]) -> Scalar {
    let present: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    if present.is_empty() {
        Scalar::Null
    } else {
        Scalar::F64(present.iter().sum::<f64>() / present.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> RowBatch {
        RowBatch::new(vec![
            Column::new(
                "code",
                vec![
                    Scalar::Cat("AA".into()),
                    Scalar::Cat("DL".into()),
                    Scalar::Cat("AA".into()),
                    Scalar::Null,
                    Scalar::Null,
                ],
            ),
            Column::new(
                "dot",
                vec![
                    Scalar::I64(1),
                    Scalar::I64(2),
                    Scalar::I64(1),
                    Scalar::I64(3),
                    Scalar::I64(3),
                ],
            ),
        ])
    }

    #[test]
    fn select_renames_and_reports_missing_columns() {
        let out = select(&data(), "dim", &[("dot", "dot_id")]).unwrap();
        assert_eq!(out.column_names(), vec!["dot_id"]);
        let err = select(&data(), "dim", &[("nope", "x")]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::MissingColumn { table: "dim", ref column } if column == "nope"
        ));
    }

    #[test]
    fn distinct_keeps_first_occurrence_order() {
        let out = distinct(data()).unwrap();
        assert_eq!(out.num_rows(), 3);
        assert_eq!(
            out.column("code").unwrap().values,
            vec![Scalar::Cat("AA".into()), Scalar::Cat("DL".into()), Scalar::Null]
        );
    }

    #[test]
    fn drop_incomplete_and_ids() {
        let out = with_row_ids(drop_incomplete(data()).unwrap(), "id").unwrap();
        assert_eq!(out.num_rows(), 3);
        assert_eq!(
            out.column("id").unwrap().values,
            vec![Scalar::I64(1), Scalar::I64(2), Scalar::I64(3)]
        );
    }

    #[test]
    fn mean_skips_nulls() {
        assert_eq!(mean_of(&[&Scalar::F64(2.0), &Scalar::Null]), Scalar::F64(2.0));
        assert_eq!(mean_of(&[&Scalar::I64(1), &Scalar::F32(2.0)]), Scalar::F64(1.5));
        assert_eq!(mean_of(&[&Scalar::Null, &Scalar::Null]), Scalar::Null);
    }
}
