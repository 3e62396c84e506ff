#![forbid(unsafe_code)]
//! airstar-transform: per-batch cleaning rules.
//!
//! Every rule is a pure function of one `RowBatch`: no state is carried
//! between batches, so the same rule set can be applied to any chunking of
//! the source and produce the same rows.

pub mod derive;
pub mod filter;
pub mod map;
pub mod ruleset;
pub mod traits;

pub use derive::{Difference, ThresholdFlag};
pub use filter::{DropNulls, NonNegative};
pub use map::{Categorize, DropColumns, ParseDate};
pub use ruleset::RuleSet;
pub use traits::{Rule, RuleError};
