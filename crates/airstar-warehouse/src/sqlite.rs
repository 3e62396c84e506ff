//! SQLite sink on `rusqlite` (bundled library).

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use airstar_core::types::{RowBatch, Scalar};

use crate::error::Result;
use crate::sink::RelationalSink;
use crate::sql::{column_list, create_table_sql, quote_ident, ResultSet, SqlType};

pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "sqlite warehouse opened");
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }
}

fn to_value(v: &Scalar) -> Value {
    match v {
        Scalar::Null => Value::Null,
        Scalar::F32(_) | Scalar::F64(_) => v.as_f64().map_or(Value::Null, Value::Real),
        Scalar::I8(_) | Scalar::I16(_) | Scalar::I32(_) | Scalar::I64(_) => {
            v.as_i64().map_or(Value::Null, Value::Integer)
        }
        other => other.render().map_or(Value::Null, Value::Text),
    }
}

fn from_value(v: Value) -> Scalar {
    match v {
        Value::Null => Scalar::Null,
        Value::Integer(i) => Scalar::I64(i),
        Value::Real(f) => Scalar::F64(f),
        Value::Text(s) => Scalar::Str(s),
        Value::Blob(b) => Scalar::Str(String::from_utf8_lossy(&b).into_owned()),
    }
}

impl RelationalSink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn ensure_table(&mut self, table: &str, columns: &[(String, SqlType)]) -> Result<()> {
        self.conn.execute(&create_table_sql(table, columns), [])?;
        Ok(())
    }

    fn append(&mut self, table: &str, batch: &RowBatch) -> Result<usize> {
        if batch.num_rows() == 0 {
            return Ok(0);
        }
        let placeholders = vec!["?"; batch.num_columns()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            quote_ident(table),
            column_list(batch)
        );
        let tx = self.conn.transaction()?;
        let mut rows = 0;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in 0..batch.num_rows() {
                let params = batch.columns.iter().map(|c| to_value(&c.values[row]));
                rows += stmt.execute(params_from_iter(params))?;
            }
        }
        tx.commit()?;
        Ok(rows)
    }

    fn query(&mut self, sql: &str) -> Result<ResultSet> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i).map(from_value))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ResultSet { columns, rows })
    }
}
