//! Sorted group-by with a handful of aggregate functions.
//!
//! Null keys are excluded. Groups come out in ascending key order.

use std::collections::BTreeMap;

use airstar_core::types::{Column, RowBatch, Scalar, ScalarKey};

use crate::error::Result;
use crate::frame::require;

#[derive(Debug, Clone)]
pub enum Agg {
    /// Rows in the group.
    Count,
    /// Sum of non-null values; 0 when all are null.
    Sum(String),
    /// Mean of non-null values; null when all are null.
    Mean(String),
    /// Rows whose value is strictly above the threshold (null counts as 0).
    CountAbove(String, f64),
}

impl Agg {
    fn source(&self) -> Option<&str> {
        match self {
            Agg::Count => None,
            Agg::Sum(c) | Agg::Mean(c) | Agg::CountAbove(c, _) => Some(c),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    Count(i64),
    SumInt(i64),
    SumFloat(f64),
    Mean { sum: f64, n: u64 },
}

impl State {
    fn finish(self) -> Scalar {
        match self {
            State::Count(n) | State::SumInt(n) => Scalar::I64(n),
            State::SumFloat(s) => Scalar::F64(s),
            State::Mean { n: 0, .. } => Scalar::Null,
            State::Mean { sum, n } => Scalar::F64(sum / n as f64),
        }
    }
}

/// Group `data` by `keys` and evaluate `aggs` per group.
///
/// The output has the key columns (source names) followed by one column per
/// `(output_name, agg)`.
pub fn group_by(
    data: &RowBatch,
    table: &'static str,
    keys: &[&str],
    aggs: &[(&str, Agg)],
) -> Result<RowBatch> {
    let key_cols: Vec<&Column> = keys
        .iter()
        .map(|k| require(data, table, k))
        .collect::<Result<_>>()?;
    let agg_cols: Vec<Option<&Column>> = aggs
        .iter()
        .map(|(_, agg)| agg.source().map(|c| require(data, table, c)).transpose())
        .collect::<Result<_>>()?;

    let initial: Vec<State> = aggs
        .iter()
        .zip(&agg_cols)
        .map(|((_, agg), col)| match (agg, col) {
            (Agg::Sum(_), Some(c)) if c.inferred_type().is_integer() => State::SumInt(0),
            (Agg::Sum(_), _) => State::SumFloat(0.0),
            (Agg::Mean(_), _) => State::Mean { sum: 0.0, n: 0 },
            (Agg::Count, _) | (Agg::CountAbove(..), _) => State::Count(0),
        })
        .collect();

    let mut groups: BTreeMap<ScalarKey, Vec<State>> = BTreeMap::new();
    for row in 0..data.num_rows() {
        let key: Vec<Scalar> = key_cols.iter().map(|c| c.values[row].clone()).collect();
        if key.iter().any(|v| v.is_null()) {
            continue;
        }
        let states = groups
            .entry(ScalarKey(key))
            .or_insert_with(|| initial.clone());
        for ((state, (_, agg)), col) in states.iter_mut().zip(aggs).zip(&agg_cols) {
            let value = col.map(|c| &c.values[row]);
            update(state, agg, value);
        }
    }

    let mut key_out: Vec<Vec<Scalar>> = vec![Vec::with_capacity(groups.len()); keys.len()];
    let mut agg_out: Vec<Vec<Scalar>> = vec![Vec::with_capacity(groups.len()); aggs.len()];
    for (key, states) in groups {
        for (out, v) in key_out.iter_mut().zip(key.0) {
            out.push(v);
        }
        for (out, s) in agg_out.iter_mut().zip(states) {
            out.push(s.finish());
        }
    }

    let mut columns: Vec<Column> = keys
        .iter()
        .zip(key_out)
        .map(|(k, values)| Column::new(*k, values))
        .collect();
    columns.extend(
        aggs.iter()
            .zip(agg_out)
            .map(|((name, _), values)| Column::new(*name, values)),
    );
    Ok(RowBatch::new(columns))
}

fn update(state: &mut State, agg: &Agg, value: Option<&Scalar>) {
    match (state, agg) {
        (State::Count(n), Agg::Count) => *n += 1,
        (State::Count(n), Agg::CountAbove(_, threshold)) => {
            if matches!(value.and_then(Scalar::as_f64), Some(v) if v > *threshold) {
                *n += 1;
            }
        }
        (State::SumInt(s), _) => {
            if let Some(v) = value.and_then(Scalar::as_i64) {
                *s = s.saturating_add(v);
            }
        }
        (State::SumFloat(s), _) => {
            if let Some(v) = value.and_then(Scalar::as_f64) {
                *s += v;
            }
        }
        (State::Mean { sum, n }, _) => {
            if let Some(v) = value.and_then(Scalar::as_f64) {
                *sum += v;
                *n += 1;
            }
        }
        (State::Count(_), _) => {}
    }
}

/// Index the rows of a grouped table by their (single) key value.
pub fn index_by_key(grouped: &RowBatch, key: &str) -> BTreeMap<ScalarKey, usize> {
    grouped
        .column(key)
        .map(|c| {
            c.values
                .iter()
                .enumerate()
                .map(|(i, v)| (ScalarKey(vec![v.clone()]), i))
                .collect()
        })
        .unwrap_or_default()
}
