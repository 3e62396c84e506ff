//! SQL type mapping, identifier quoting and query results.

use std::fmt;

use serde::Serialize;

use airstar_core::schema::{ColumnTypes, DataType};
use airstar_core::types::{RowBatch, Scalar};

/// Column types a warehouse table is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SqlType {
    BigInt,
    Double,
    Date,
    Text,
}

impl SqlType {
    pub fn from_data_type(t: DataType) -> Self {
        match t {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => SqlType::BigInt,
            DataType::Float32 | DataType::Float64 => SqlType::Double,
            DataType::Date => SqlType::Date,
            DataType::Utf8 | DataType::Category => SqlType::Text,
        }
    }

    pub fn ddl(self) -> &'static str {
        match self {
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE PRECISION",
            SqlType::Date => "DATE",
            SqlType::Text => "TEXT",
        }
    }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Table layout for `batch`: declared types first, then what the values show.
pub fn columns_for(batch: &RowBatch, types: &ColumnTypes) -> Vec<(String, SqlType)> {
    batch
        .columns
        .iter()
        .map(|c| {
            let t = types.get(&c.name).unwrap_or_else(|| c.inferred_type());
            (c.name.clone(), SqlType::from_data_type(t))
        })
        .collect()
}

pub fn create_table_sql(name: &str, columns: &[(String, SqlType)]) -> String {
    let defs: Vec<String> = columns
        .iter()
        .map(|(n, t)| format!("{} {}", quote_ident(n), t.ddl()))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(name),
        defs.join(", ")
    )
}

pub fn column_list(batch: &RowBatch) -> String {
    batch
        .columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rows returned by a query, in result order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fixed-width text table, nulls shown as `NULL`.
impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|v| v.render().unwrap_or_else(|| "NULL".to_string()))
                    .collect()
            })
            .collect();
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }
        let line = |f: &mut fmt::Formatter<'_>, fields: &[String]| -> fmt::Result {
            let padded: Vec<String> = fields
                .iter()
                .zip(&widths)
                .map(|(s, &w)| format!("{s:<w$}"))
                .collect();
            writeln!(f, "{}", padded.join("  ").trim_end())
        };
        line(f, &self.columns)?;
        for row in &cells {
            line(f, row)?;
        }
        Ok(())
    }
}

/// Best-effort typed view of a textual result cell.
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
pub(crate) fn parse_cell(text: &str) -> Scalar {
    if let Ok(v) = text.parse::<i64>() {
        Scalar::I64(v)
    } else if let Ok(v) = text.parse::<f64>() {
        Scalar::F64(v)
    } else {
        Scalar::Str(text.to_string())
    }
}
