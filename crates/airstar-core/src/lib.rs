//! Shared data model for the airstar pipeline: dynamically typed batches,
//! column type declarations, configuration, run reports and digests.
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod hash;
pub mod prelude;
pub mod report;
pub mod schema;
pub mod types;

pub use prelude::*;
