//! Convenient re-exports for downstream crates.

pub use crate::config::{
    CleanConfig, CleaningConfig, EtlConfig, ModelConfig, WarehouseBackend, WarehouseConfig,
};
pub use crate::error::{Error, Result};
pub use crate::hash::Hash256;
pub use crate::report::{IntegrityCheck, RunId, RunReport, RunState};
pub use crate::schema::{ColumnTypes, DataType};
pub use crate::types::{CategoryPool, Column, RowBatch, Scalar};
