//! Lightweight value/column/batch types shared by every stage.
//!
//! Batches are columnar: a `RowBatch` is a list of equally long `Column`s.
//! Values are dynamically typed `Scalar`s so a declared numeric column can
//! still carry nulls.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::DataType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    /// Categorical text. Equal values within a batch share the same `Arc`.
    Cat(Arc<str>),
    Date(NaiveDate),
}

impl Scalar {
    /// Type of this value; `Null` reports `None`.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Scalar::Null => None,
            Scalar::I8(_) => Some(DataType::Int8),
            Scalar::I16(_) => Some(DataType::Int16),
            Scalar::I32(_) => Some(DataType::Int32),
            Scalar::I64(_) => Some(DataType::Int64),
            Scalar::F32(_) => Some(DataType::Float32),
            Scalar::F64(_) => Some(DataType::Float64),
            Scalar::Str(_) => Some(DataType::Utf8),
            Scalar::Cat(_) => Some(DataType::Category),
            Scalar::Date(_) => Some(DataType::Date),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Integer view of an integer-typed value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::I8(v) => Some(i64::from(*v)),
            Scalar::I16(v) => Some(i64::from(*v)),
            Scalar::I32(v) => Some(i64::from(*v)),
            Scalar::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of any numeric value. NaN counts as missing.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Scalar::F32(v) => f64::from(*v),
            Scalar::F64(v) => *v,
            other => other.as_i64()? as f64,
        };
        (!v.is_nan()).then_some(v)
    }

    /// Text view of string-like values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            Scalar::Cat(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as a delimited-text field. `Null` renders as `None`.
    ///
    /// Integral floats keep a trailing `.0` so float columns stay
    /// recognisable when the text is read back.
    pub fn render(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::I8(v) => Some(v.to_string()),
            Scalar::I16(v) => Some(v.to_string()),
            Scalar::I32(v) => Some(v.to_string()),
            Scalar::I64(v) => Some(v.to_string()),
            Scalar::F32(v) => render_float(f64::from(*v), v.to_string()),
            Scalar::F64(v) => render_float(*v, v.to_string()),
            Scalar::Str(s) => Some(s.clone()),
            Scalar::Cat(s) => Some(s.to_string()),
            Scalar::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

fn render_float(v: f64, text: String) -> Option<String> {
    if v.is_nan() {
        None
    } else if v.is_finite() && v.fract() == 0.0 && !text.contains(['e', 'E']) {
        Some(format!("{text}.0"))
    } else {
        Some(text)
    }
}

/// Interns categorical text so equal values share one allocation.
#[derive(Debug, Default)]
pub struct CategoryPool {
    values: HashSet<Arc<str>>,
}

impl CategoryPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Arc<str> {
        if let Some(v) = self.values.get(s) {
            return Arc::clone(v);
        }
        let v: Arc<str> = Arc::from(s);
        self.values.insert(Arc::clone(&v));
        v
    }

    /// Number of distinct values seen.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parse a calendar date in the forms found in flight extracts.
///
/// Timestamps are truncated to their date. Anything else is `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS.iter().find_map(|fmt| {
                chrono::NaiveDateTime::parse_from_str(raw, fmt)
                    .ok()
                    .map(|dt| dt.date())
            })
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Widest type among the non-null values.
    ///
    /// All-integer columns report `Int64`, any float makes it `Float64`, and
    /// any text makes it `Utf8`. A homogeneous column keeps its exact type.
    /// An all-null column reports `Utf8`.
    pub fn inferred_type(&self) -> DataType {
        let mut seen: Option<DataType> = None;
        for v in &self.values {
            let Some(t) = v.data_type() else { continue };
            seen = Some(match seen {
                None => t,
                Some(prev) if prev == t => prev,
                Some(prev) if prev.is_integer() && t.is_integer() => DataType::Int64,
                Some(prev) if prev.is_numeric() && t.is_numeric() => DataType::Float64,
                Some(_) => return DataType::Utf8,
            });
        }
        seen.unwrap_or(DataType::Utf8)
    }
}

/// A bounded slice of rows, stored column by column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowBatch {
    pub columns: Vec<Column>,
}

impl RowBatch {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.index_of(name)?;
        Some(self.columns.remove(idx))
    }

    /// Add a column at the end, or replace the column of the same name in place.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.num_rows() {
            return Err(Error::Schema(format!(
                "column '{}' has {} rows, batch has {}",
                column.name,
                column.len(),
                self.num_rows()
            )));
        }
        match self.index_of(&column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Keep only rows whose mask entry is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<()> {
        if keep.len() != self.num_rows() {
            return Err(Error::Invariant(format!(
                "row mask has {} entries, batch has {} rows",
                keep.len(),
                self.num_rows()
            )));
        }
        if keep.iter().all(|k| *k) {
            return Ok(());
        }
        for col in &mut self.columns {
            let mut i = 0;
            col.values.retain(|_| {
                let k = keep[i];
                i += 1;
                k
            });
        }
        Ok(())
    }

    /// Values of one row, in column order.
    pub fn row(&self, idx: usize) -> Vec<&Scalar> {
        self.columns.iter().map(|c| &c.values[idx]).collect()
    }

    /// Append the rows of `other`, matching columns by name.
    ///
    /// An empty batch adopts `other`'s layout.
    pub fn append(&mut self, mut other: RowBatch) -> Result<()> {
        if self.columns.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.num_columns() != self.num_columns() {
            return Err(Error::Schema(format!(
                "cannot append batch with {} columns to batch with {}",
                other.num_columns(),
                self.num_columns()
            )));
        }
        for col in &mut self.columns {
            let incoming = other.remove_column(&col.name).ok_or_else(|| {
                Error::Schema(format!("appended batch lacks column '{}'", col.name))
            })?;
            col.values.extend(incoming.values);
        }
        Ok(())
    }
}

/// Compare two scalar tuples lexicographically.
pub fn scalar_tuple_cmp(a: &[Scalar], b: &[Scalar]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match scalar_cmp(x, y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Total order over scalars.
///
/// Nulls sort first. Numbers compare by value across widths, text compares
/// across `Str`/`Cat`, and unrelated types fall back to a fixed type order.
pub fn scalar_cmp(a: &Scalar, b: &Scalar) -> Ordering {
    use Scalar::*;

    match (a, b) {
        (Null, Null) => Ordering::Equal,
        (Null, _) => Ordering::Less,
        (_, Null) => Ordering::Greater,
        (Date(x), Date(y)) => x.cmp(y),
        _ => {
            if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                return x.cmp(&y);
            }
            if let (Some(x), Some(y)) = (numeric(a), numeric(b)) {
                return float_cmp(x, y);
            }
            if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
                return x.cmp(y);
            }
            type_order(a).cmp(&type_order(b))
        }
    }
}

fn numeric(s: &Scalar) -> Option<f64> {
    match s {
        Scalar::F32(v) => Some(f64::from(*v)),
        Scalar::F64(v) => Some(*v),
        other => other.as_i64().map(|v| v as f64),
    }
}

fn float_cmp(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

fn type_order(s: &Scalar) -> u8 {
    use Scalar::*;
    match s {
        Null => 0,
        I8(_) | I16(_) | I32(_) | I64(_) | F32(_) | F64(_) => 1,
        Str(_) | Cat(_) => 2,
        Date(_) => 3,
    }
}

/// Owned tuple of scalars usable as an ordered map key (group-by, distinct).
#[derive(Debug, Clone)]
pub struct ScalarKey(pub Vec<Scalar>);

impl PartialEq for ScalarKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScalarKey {}

impl PartialOrd for ScalarKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScalarKey {
    fn cmp(&self, other: &Self) -> Ordering {
        scalar_tuple_cmp(&self.0, &other.0)
    }
}
