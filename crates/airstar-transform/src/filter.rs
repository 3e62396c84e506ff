//! Row filters. Each builds a keep-mask over the batch and retains the
//! masked rows in every column.

use airstar_core::types::RowBatch;

use crate::traits::{is_missing, Rule, RuleError};

/// Drop rows with a missing value in any subset column present in the batch.
#[derive(Debug, Clone, Default)]
pub struct DropNulls {
    pub subset: Vec<String>,
}

impl DropNulls {
    pub fn new<I, S>(subset: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subset: subset.into_iter().map(Into::into).collect(),
        }
    }
}

impl Rule for DropNulls {
    fn name(&self) -> &'static str {
        "drop_nulls"
    }

    fn apply(&self, mut batch: RowBatch) -> Result<RowBatch, RuleError> {
        let present: Vec<usize> = self
            .subset
            .iter()
            .filter_map(|name| batch.index_of(name))
            .collect();
        if present.is_empty() {
            return Ok(batch);
        }

        let keep: Vec<bool> = (0..batch.num_rows())
            .map(|row| {
                present
                    .iter()
                    .all(|&ci| !is_missing(&batch.columns[ci].values[row]))
            })
            .collect();
        batch.retain_rows(&keep)?;
        Ok(batch)
    }
}

/// Drop rows where a listed column holds a negative number.
///
/// Missing and non-numeric values are kept.
#[derive(Debug, Clone, Default)]
pub struct NonNegative {
    pub columns: Vec<String>,
}

impl NonNegative {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl Rule for NonNegative {
    fn name(&self) -> &'static str {
        "non_negative"
    }

    fn apply(&self, mut batch: RowBatch) -> Result<RowBatch, RuleError> {
        let mut keep = vec![true; batch.num_rows()];
        let mut touched = false;
        for name in &self.columns {
            let Some(col) = batch.column(name) else {
                continue;
            };
            touched = true;
            for (k, v) in keep.iter_mut().zip(&col.values) {
                if matches!(v.as_f64(), Some(x) if x < 0.0) {
                    *k = false;
                }
            }
        }
        if touched {
            batch.retain_rows(&keep)?;
        }
        Ok(batch)
    }
}
