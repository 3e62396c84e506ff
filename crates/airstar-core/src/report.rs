//! Run report emitted by the cleaning pipeline.
//!
//! The report is the pipeline's only output besides the artifact itself:
//! which state the run ended in, how many rows went through, and what the
//! post-run checks found.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hash::Hash256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    /// The loop stopped on an error; whatever was appended stays on disk.
    FailedPartial,
}

/// Outcome of re-reading a small sample of the artifact after the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum IntegrityCheck {
    Passed { rows: usize, columns: usize },
    Failed { message: String },
    /// No artifact to check.
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub id: RunId,
    pub state: RunState,
    pub batches: usize,
    pub rows_read: u64,
    pub rows_written: u64,
    /// Message of the error that stopped the loop, if any.
    pub error: Option<String>,
    pub artifact_exists: bool,
    pub integrity: IntegrityCheck,
    pub artifact_digest: Option<Hash256>,
    /// Stable hash of the cleaning configuration used.
    pub config_hash: Hash256,
    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
}

impl RunReport {
    pub fn new(config_hash: Hash256, started_ms: u64) -> Self {
        Self {
            id: RunId(Uuid::new_v4()),
            state: RunState::NotStarted,
            batches: 0,
            rows_read: 0,
            rows_written: 0,
            error: None,
            artifact_exists: false,
            integrity: IntegrityCheck::Skipped,
            artifact_digest: None,
            config_hash,
            started_ms,
            finished_ms: started_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == RunState::Completed
    }

    pub fn duration_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }
}
