//! Canned analytical queries over the loaded flights table.
//!
//! The SQL sticks to what SQLite and PostgreSQL both accept. `{table}` is
//! replaced with the quoted table name before execution.

use crate::error::Result;
use crate::sink::RelationalSink;
use crate::sql::{quote_ident, ResultSet};

#[derive(Debug, Clone, Copy)]
pub struct CannedQuery {
    pub name: &'static str,
    template: &'static str,
}

impl CannedQuery {
    pub fn sql(&self, table: &str) -> String {
        self.template.replace("{table}", &quote_ident(table))
    }
}

pub const QUERIES: [CannedQuery; 5] = [
    CannedQuery {
        name: "airlines with most flights",
        template: r#"
SELECT "Reporting_Airline" AS airline,
       COUNT(*) AS total_flights,
       ROUND(CAST(COUNT(*) * 100.0 / (SELECT COUNT(*) FROM {table}) AS NUMERIC), 2) AS share_pct
FROM {table}
GROUP BY "Reporting_Airline"
ORDER BY total_flights DESC, airline
LIMIT 5"#,
    },
    CannedQuery {
        name: "average arrival delay by airport",
        template: r#"
SELECT "OriginAirportID" AS airport,
       ROUND(CAST(AVG("ArrDelayMinutes") AS NUMERIC), 2) AS avg_delay
FROM {table}
WHERE "ArrDelayMinutes" IS NOT NULL
GROUP BY "OriginAirportID"
ORDER BY avg_delay DESC, airport
LIMIT 10"#,
    },
    CannedQuery {
        name: "cancellation rate by airline",
        template: r#"
SELECT "Reporting_Airline" AS airline,
       COUNT(*) AS total_flights,
       SUM(CASE WHEN "Cancelled" = 1 THEN 1 ELSE 0 END) AS cancelled_flights,
       ROUND(CAST(SUM(CASE WHEN "Cancelled" = 1 THEN 1 ELSE 0 END) * 100.0 / COUNT(*) AS NUMERIC), 2) AS cancelled_pct
FROM {table}
GROUP BY "Reporting_Airline"
ORDER BY cancelled_pct DESC, airline
LIMIT 5"#,
    },
    CannedQuery {
        name: "departure delay by hour",
        template: r#"
SELECT CAST("DepTime" AS INTEGER) / 100 AS hour,
       ROUND(CAST(AVG("DepDelayMinutes") AS NUMERIC), 2) AS avg_delay,
       COUNT(*) AS flights
FROM {table}
WHERE "DepDelayMinutes" IS NOT NULL
  AND "DepTime" IS NOT NULL
  AND "DepTime" BETWEEN 0 AND 2359
GROUP BY 1
ORDER BY 1"#,
    },
    CannedQuery {
        name: "actual vs planned elapsed time",
        template: r#"
SELECT "Origin" AS origin,
       "Dest" AS dest,
       ROUND(CAST(AVG("ActualElapsedTime") AS NUMERIC), 2) AS actual_time,
       ROUND(CAST(AVG("CRSElapsedTime") AS NUMERIC), 2) AS planned_time,
       ROUND(CAST(AVG("ActualElapsedTime") - AVG("CRSElapsedTime") AS NUMERIC), 2) AS difference
FROM {table}
WHERE "CRSElapsedTime" IS NOT NULL AND "ActualElapsedTime" IS NOT NULL
GROUP BY "Origin", "Dest"
ORDER BY difference DESC, origin, dest
LIMIT 10"#,
    },
];

/// Run every canned query in catalog order. Stops at the first failure.
pub fn run_catalog(
    sink: &mut dyn RelationalSink,
    table: &str,
) -> Result<Vec<(&'static str, ResultSet)>> {
    let mut out = Vec::with_capacity(QUERIES.len());
    for q in &QUERIES {
        let rs = sink.query(&q.sql(table))?;
        tracing::debug!(query = q.name, rows = rs.len(), "query finished");
        out.push((q.name, rs));
    }
    Ok(out)
}
