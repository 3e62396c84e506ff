//! Column maps: remove, retype, or re-encode whole columns without touching
//! the row count.

use airstar_core::types::{parse_date, CategoryPool, RowBatch, Scalar};

use crate::traits::{Rule, RuleError};

/// Remove the listed columns when present.
#[derive(Debug, Clone, Default)]
pub struct DropColumns {
    pub columns: Vec<String>,
}

impl DropColumns {
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

impl Rule for DropColumns {
    fn name(&self) -> &'static str {
        "drop_columns"
    }

    fn apply(&self, mut batch: RowBatch) -> Result<RowBatch, RuleError> {
        for name in &self.columns {
            batch.remove_column(name);
        }
        Ok(batch)
    }
}

/// Parse a text column into calendar dates. Unparseable values become null.
#[derive(Debug, Clone)]
pub struct ParseDate {
    pub column: String,
}

impl ParseDate {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Rule for ParseDate {
    fn name(&self) -> &'static str {
        "parse_date"
    }

    fn apply(&self, mut batch: RowBatch) -> Result<RowBatch, RuleError> {
        let Some(col) = batch.column_mut(&self.column) else {
            return Ok(batch);
        };
        for v in col.values.iter_mut() {
            let parsed = match &*v {
                Scalar::Date(d) => Scalar::Date(*d),
                other => other
                    .as_str()
                    .and_then(parse_date)
                    .map_or(Scalar::Null, Scalar::Date),
            };
            *v = parsed;
        }
        Ok(batch)
    }
}

/// Re-encode text columns as categorical values.
#[derive(Debug, Clone, Default)]
pub struct Categorize {
    pub columns: Vec<String>,
}

impl Categorize {
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

impl Rule for Categorize {
    fn name(&self) -> &'static str {
        "categorize"
    }

    fn apply(&self, mut batch: RowBatch) -> Result<RowBatch, RuleError> {
        let mut pool = CategoryPool::new();
        for name in &self.columns {
            let Some(col) = batch.column_mut(name) else {
                continue;
            };
            let values = std::mem::take(&mut col.values)
                .into_iter()
                .map(|v| match v {
                    Scalar::Cat(c) => Scalar::Cat(pool.intern(&c)),
                    Scalar::Str(s) => Scalar::Cat(pool.intern(&s)),
                    other => match other.render() {
                        Some(text) => Scalar::Cat(pool.intern(&text)),
                        None => Scalar::Null,
                    },
                })
                .collect();
            col.values = values;
        }
        Ok(batch)
    }
}
