#![forbid(unsafe_code)]
//! airstar-model: fact and dimension tables derived from the cleaned artifact.
//!
//! Unlike the cleaning pass this works on the whole dataset at once; grouping
//! needs every row.

pub mod aggregate;
pub mod error;
pub mod frame;
pub mod model;
pub mod tables;

pub use error::{ModelError, Result};
pub use model::{load_artifact, DimensionalModel, ExportSummary, NamedTable};
