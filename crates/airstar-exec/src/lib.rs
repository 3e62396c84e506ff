#![forbid(unsafe_code)]
//! airstar-exec: the batch cleaning driver.
//!
//! Streams the source through the rule set into the compressed artifact one
//! batch at a time, then verifies the artifact and emits a `RunReport`.

pub mod integrity;
pub mod pipeline;

pub use integrity::sample_artifact;
pub use pipeline::{ExecError, Pipeline};
