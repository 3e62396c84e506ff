//! Derived columns computed row by row from existing ones.

use airstar_core::types::{Column, RowBatch, Scalar};

use crate::traits::{is_missing, Rule, RuleError};

/// `output = minuend - subtrahend`, as plain numbers.
///
/// No clock arithmetic: `0010 - 2350` is `-2340`. Null if either side is
/// missing or not numeric. Integer inputs give an integer result.
#[derive(Debug, Clone)]
pub struct Difference {
    pub output: String,
    pub minuend: String,
    pub subtrahend: String,
}

impl Difference {
    pub fn new(
        output: impl Into<String>,
        minuend: impl Into<String>,
        subtrahend: impl Into<String>,
    ) -> Self {
        Self {
            output: output.into(),
            minuend: minuend.into(),
            subtrahend: subtrahend.into(),
        }
    }
}

impl Rule for Difference {
    fn name(&self) -> &'static str {
        "difference"
    }

    fn apply(&self, mut batch: RowBatch) -> Result<RowBatch, RuleError> {
        let (Some(a), Some(b)) = (batch.column(&self.minuend), batch.column(&self.subtrahend))
        else {
            return Ok(batch);
        };
        let values = a
            .values
            .iter()
            .zip(&b.values)
            .map(|(x, y)| subtract(x, y))
            .collect();
        batch.set_column(Column::new(self.output.clone(), values))?;
        Ok(batch)
    }
}

fn subtract(x: &Scalar, y: &Scalar) -> Scalar {
    if is_missing(x) || is_missing(y) {
        return Scalar::Null;
    }
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a.checked_sub(b).map_or(Scalar::Null, Scalar::I64);
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => Scalar::F64(a - b),
        _ => Scalar::Null,
    }
}

/// `output = 1` when `source > threshold`, else `0` (missing counts as 0).
#[derive(Debug, Clone)]
pub struct ThresholdFlag {
    pub source: String,
    pub output: String,
    pub threshold: f64,
}

impl ThresholdFlag {
    pub fn new(source: impl Into<String>, output: impl Into<String>, threshold: f64) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            threshold,
        }
    }
}

impl Rule for ThresholdFlag {
    fn name(&self) -> &'static str {
        "threshold_flag"
    }

    fn apply(&self, mut batch: RowBatch) -> Result<RowBatch, RuleError> {
        let Some(src) = batch.column(&self.source) else {
            return Ok(batch);
        };
        let values = src
            .values
            .iter()
            .map(|v| match v.as_f64() {
                Some(x) if x > self.threshold => Scalar::I8(1),
                _ => Scalar::I8(0),
            })
            .collect();
        batch.set_column(Column::new(self.output.clone(), values))?;
        Ok(batch)
    }
}
