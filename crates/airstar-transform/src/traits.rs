//! Rule trait + common interfaces.

use airstar_core::types::{RowBatch, Scalar};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("rule '{rule}' failed: {source}")]
    InRule {
        rule: &'static str,
        #[source]
        source: Box<RuleError>,
    },

    #[error(transparent)]
    Core(#[from] airstar_core::Error),
}

/// One cleaning step over a batch.
///
/// Invariants:
/// - `apply` depends only on the batch it is given.
/// - Rules that need a column which is absent from the batch are no-ops.
pub trait Rule: Send + Sync {
    /// Human-readable rule name (stable, used in logs and errors).
    fn name(&self) -> &'static str;

    fn apply(&self, batch: RowBatch) -> Result<RowBatch, RuleError>;
}

/// Null, or a float that is not a number.
pub(crate) fn is_missing(v: &Scalar) -> bool {
    match v {
        Scalar::Null => true,
        Scalar::F32(f) => f.is_nan(),
        Scalar::F64(f) => f.is_nan(),
        _ => false,
    }
}
