//! Ordered rule sets.

use airstar_core::config::CleaningConfig;
use airstar_core::types::RowBatch;

use crate::derive::{Difference, ThresholdFlag};
use crate::filter::{DropNulls, NonNegative};
use crate::map::{Categorize, DropColumns, ParseDate};
use crate::traits::{Rule, RuleError};

/// Rules applied to every batch, in insertion order.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, rule: impl Rule + 'static) -> Self {
        self.push(rule);
        self
    }

    pub fn push(&mut self, rule: impl Rule + 'static) {
        self.rules.push(Box::new(rule));
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// The airline cleaning sequence with configurable column lists.
    ///
    /// Key-null removal runs before the non-negative filter, so a record that
    /// fails both is attributed to the key check.
    pub fn from_config(cfg: &CleaningConfig) -> Self {
        Self::new()
            .with(DropColumns::new(cfg.drop_columns.iter().cloned()))
            .with(DropNulls::new(cfg.key_columns.iter().cloned()))
            .with(ParseDate::new(cfg.date_column.clone()))
            .with(NonNegative::new(cfg.non_negative_columns.iter().cloned()))
            .with(Categorize::new(cfg.categorical_columns.iter().cloned()))
            .with(Difference::new(
                cfg.duration_column.clone(),
                cfg.arrival_time_column.clone(),
                cfg.departure_time_column.clone(),
            ))
            .with(ThresholdFlag::new(
                cfg.delay_source_column.clone(),
                cfg.delay_flag_column.clone(),
                cfg.delay_threshold_minutes,
            ))
    }

    pub fn airline() -> Self {
        Self::from_config(&CleaningConfig::default())
    }

    /// Run every rule over `batch`.
    pub fn apply(&self, mut batch: RowBatch) -> Result<RowBatch, RuleError> {
        for rule in &self.rules {
            let rows_in = batch.num_rows();
            batch = rule.apply(batch).map_err(|e| RuleError::InRule {
                rule: rule.name(),
                source: Box::new(e),
            })?;
            tracing::trace!(rule = rule.name(), rows_in, rows_out = batch.num_rows());
        }
        Ok(batch)
    }
}
