//! Pipeline driver: source → rules → compressed artifact.
//!
//! Behavior:
//! - Removes a stale artifact before starting.
//! - Reads, cleans and appends one batch at a time; the header goes out with
//!   the first batch only.
//! - Any read/transform/write error stops the loop. The run ends in
//!   `FailedPartial` and whatever was already appended stays on disk.
//! - Afterwards the artifact is checked for existence, sampled, and digested.
//!   None of these checks can change the final state.

use std::fs::File;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;

use airstar_core::config::{CleanConfig, EtlConfig};
use airstar_core::hash::{hash_reader, hash_serde};
use airstar_core::report::{RunReport, RunState};
use airstar_core::schema::ColumnTypes;
use airstar_io::{ChunkedCsvReader, CompressedCsvSink, IoError, ReadOptions};
use airstar_transform::{RuleError, RuleSet};

use crate::integrity::sample_artifact;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("cannot remove stale artifact {path}: {source}")]
    Prepare {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("hashing error: {0}")]
    Hash(String),
}

/// Inputs that determine the artifact, hashed into the run report.
#[derive(Serialize)]
struct Fingerprint<'a> {
    clean: &'a CleanConfig,
    types: &'a ColumnTypes,
    rules: Vec<&'static str>,
}

/// Batch cleaning driver. Owns its configuration; holds no data between runs.
pub struct Pipeline {
    cfg: CleanConfig,
    types: ColumnTypes,
    rules: RuleSet,
    state: RunState,
}

impl Pipeline {
    pub fn new(cfg: CleanConfig, types: ColumnTypes, rules: RuleSet) -> Self {
        Self {
            cfg,
            types,
            rules,
            state: RunState::NotStarted,
        }
    }

    /// Airline source declaration and rule set from a full configuration.
    pub fn from_config(cfg: &EtlConfig) -> Self {
        Self::new(
            cfg.clean.clone(),
            ColumnTypes::airline(),
            RuleSet::from_config(&cfg.rules),
        )
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &CleanConfig {
        &self.cfg
    }

    /// Execute one run and report on it.
    ///
    /// Errors inside the batch loop end up in the report, not in the `Err`
    /// branch; `Err` means the run could not start.
    pub fn run(&mut self) -> Result<RunReport, ExecError> {
        if self.cfg.batch_size == 0 {
            return Err(ExecError::Config("batch_size must be positive".into()));
        }
        let fingerprint = Fingerprint {
            clean: &self.cfg,
            types: &self.types,
            rules: self.rules.names(),
        };
        let config_hash = hash_serde(&fingerprint).map_err(|e| ExecError::Hash(e.to_string()))?;
        let mut report = RunReport::new(config_hash, now_millis());

        let artifact = Path::new(&self.cfg.artifact_path).to_path_buf();
        remove_stale(&artifact)?;

        self.set_state(&mut report, RunState::Running);
        tracing::info!(
            source = %self.cfg.source_path,
            artifact = %artifact.display(),
            batch_size = self.cfg.batch_size,
            run = %report.id.0,
            "cleaning started"
        );

        match self.clean_batches(&mut report) {
            Ok(()) => {
                self.set_state(&mut report, RunState::Completed);
                tracing::info!(
                    batches = report.batches,
                    rows_read = report.rows_read,
                    rows_written = report.rows_written,
                    "cleaning completed"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, batches = report.batches, "cleaning failed");
                report.error = Some(e.to_string());
                self.set_state(&mut report, RunState::FailedPartial);
            }
        }

        report.artifact_exists = artifact.exists();
        if report.artifact_exists {
            tracing::info!(artifact = %artifact.display(), "artifact present");
        } else {
            tracing::warn!(artifact = %artifact.display(), "artifact missing");
        }

        report.integrity = sample_artifact(&artifact, self.cfg.sample_rows, &self.types);
        tracing::info!(integrity = ?report.integrity, "integrity sample");

        if report.artifact_exists {
            report.artifact_digest = match File::open(&artifact).and_then(hash_reader) {
                Ok(d) => Some(d),
                Err(e) => {
                    tracing::warn!(error = %e, "cannot digest artifact");
                    None
                }
            };
        }

        report.finished_ms = now_millis();
        Ok(report)
    }

    fn set_state(&mut self, report: &mut RunReport, state: RunState) {
        self.state = state;
        report.state = state;
    }

    /// The failure boundary: everything that can fail mid-run happens here.
    fn clean_batches(&self, report: &mut RunReport) -> Result<(), ExecError> {
        let opts = ReadOptions::source(self.cfg.batch_size, self.types.clone());
        let reader = ChunkedCsvReader::open(&self.cfg.source_path, opts)?;
        let mut sink: Option<CompressedCsvSink> = None;

        for (idx, batch) in reader.enumerate() {
            let batch = batch?;
            let rows_in = batch.num_rows();
            report.rows_read += rows_in as u64;

            let cleaned = self.rules.apply(batch)?;

            if sink.is_none() {
                sink = Some(CompressedCsvSink::new(
                    &self.cfg.artifact_path,
                    self.cfg.compression_level,
                )?);
            }
            let Some(writer) = sink.as_mut() else {
                continue;
            };
            let written = writer.append(&cleaned, idx == 0)?;
            report.rows_written += written as u64;
            report.batches += 1;

            tracing::info!(
                batch = idx + 1,
                rows_in,
                rows_out = written,
                total_written = report.rows_written,
                "batch cleaned"
            );
        }

        if let Some(writer) = sink {
            writer.finish()?;
        }
        Ok(())
    }
}

fn remove_stale(path: &Path) -> Result<(), ExecError> {
    if !path.exists() {
        return Ok(());
    }
    std::fs::remove_file(path).map_err(|source| ExecError::Prepare {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(artifact = %path.display(), "removed previous artifact");
    Ok(())
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
