//! One builder per fact/dimension table.
//!
//! Every builder reads the full cleaned dataset and returns a new table.
//! Surrogate ids run `1..=n` in output row order.

use chrono::{Datelike, NaiveDate};

use airstar_core::types::{Column, RowBatch, Scalar, ScalarKey};

use crate::aggregate::{group_by, index_by_key, Agg};
use crate::error::Result;
use crate::frame::{distinct, drop_incomplete, mean_of, require, row_ids, select, with_row_ids};

pub const FACT_FLIGHTS: &str = "fact_flights";
pub const FACT_AIRPORT_OPERATIONS: &str = "fact_airport_operations";
pub const DIM_AIRLINE: &str = "dim_airline";
pub const DIM_AIRPORT: &str = "dim_airport";
pub const DIM_DATE: &str = "dim_date";
pub const DIM_CANCELLATION: &str = "dim_cancellation";
pub const DIM_DIVERSION: &str = "dim_diversion";
pub const DIM_DELAY: &str = "dim_delay";

/// Departure delays above this many minutes set the fact table's delay flag.
const DELAY_FLAG_MINUTES: f64 = 15.0;
/// Departure delays above this many minutes count as severe.
const SEVERE_DELAY_MINUTES: f64 = 60.0;

fn is_one(v: &Scalar) -> bool {
    v.as_f64() == Some(1.0)
}

/// One row per flight with foreign keys into the dimensions.
pub fn fact_flights(data: &RowBatch) -> Result<RowBatch> {
    let t = FACT_FLIGHTS;
    let mut out = select(
        data,
        t,
        &[
            ("FlightDate", "flight_date"),
            ("OriginAirportID", "origin_airport_id"),
            ("DestAirportID", "dest_airport_id"),
            ("Reporting_Airline", "airline_id"),
            ("Distance", "distance"),
            ("CRSDepTime", "scheduled_departure"),
            ("DepTime", "actual_departure"),
            ("CRSArrTime", "scheduled_arrival"),
            ("ArrTime", "actual_arrival"),
            ("CRSElapsedTime", "planned_duration"),
            ("ActualElapsedTime", "actual_duration"),
            ("Cancelled", "cancelled"),
            ("Diverted", "diverted"),
            ("TaxiOut", "taxi_out"),
            ("TaxiIn", "taxi_in"),
        ],
    )?;
    let dep_delay = require(data, t, "DepDelayMinutes")?;
    let cancelled = require(data, t, "Cancelled")?;
    let diverted = require(data, t, "Diverted")?;

    let ids = row_ids(out.num_rows());
    let flagged = |col: &Column, pred: &dyn Fn(&Scalar) -> bool| -> Vec<Scalar> {
        col.values
            .iter()
            .zip(&ids)
            .map(|(v, id)| if pred(v) { id.clone() } else { Scalar::Null })
            .collect()
    };
    let delay_ids = flagged(dep_delay, &|v: &Scalar| matches!(v.as_f64(), Some(x) if x > 0.0));
    let cancellation_ids = flagged(cancelled, &is_one);
    let diversion_ids = flagged(diverted, &is_one);
    let delay_flag: Vec<Scalar> = dep_delay
        .values
        .iter()
        .map(|v| match v.as_f64() {
            Some(x) if x > DELAY_FLAG_MINUTES => Scalar::I8(1),
            _ => Scalar::I8(0),
        })
        .collect();
    let date_ids = require(&out, t, "flight_date")?.values.clone();

    out.set_column(Column::new("flight_id", ids.clone()))?;
    out.set_column(Column::new("date_id", date_ids))?;
    out.set_column(Column::new("delay_flag", delay_flag))?;
    out.set_column(Column::new("delay_id", delay_ids))?;
    out.set_column(Column::new("cancellation_id", cancellation_ids))?;
    out.set_column(Column::new("diversion_id", diversion_ids))?;
    Ok(out)
}

/// Per origin airport and day activity.
pub fn fact_airport_operations(data: &RowBatch) -> Result<RowBatch> {
    let t = FACT_AIRPORT_OPERATIONS;
    let sum = |c: &str| Agg::Sum(c.to_string());
    let mean = |c: &str| Agg::Mean(c.to_string());
    let grouped = group_by(
        data,
        t,
        &["OriginAirportID", "FlightDate"],
        &[
            ("flights_handled", Agg::Count),
            ("flights_cancelled", sum("Cancelled")),
            ("avg_departure_delay", mean("DepDelayMinutes")),
            ("avg_arrival_delay", mean("ArrDelayMinutes")),
            ("total_taxi_out", sum("TaxiOut")),
            ("total_taxi_in", sum("TaxiIn")),
            ("carrier_delay", sum("CarrierDelay")),
            ("weather_delay", sum("WeatherDelay")),
            ("nas_delay", sum("NASDelay")),
            ("security_delay", sum("SecurityDelay")),
            ("late_aircraft_delay", sum("LateAircraftDelay")),
            (
                "severe_delays",
                Agg::CountAbove("DepDelayMinutes".to_string(), SEVERE_DELAY_MINUTES),
            ),
        ],
    )?;

    let dep = &require(&grouped, t, "avg_departure_delay")?.values;
    let arr = &require(&grouped, t, "avg_arrival_delay")?.values;
    let avg_total: Vec<Scalar> = dep.iter().zip(arr).map(|(d, a)| mean_of(&[d, a])).collect();

    let mut out = grouped;
    out.set_column(Column::new("avg_total_delay", avg_total))?;
    if let Some(c) = out.column_mut("OriginAirportID") {
        c.name = "airport_id".to_string();
    }
    if let Some(c) = out.column_mut("FlightDate") {
        c.name = "date_id".to_string();
    }
    with_row_ids(out, "operation_id")
}

/// Per-key cancellation mean and combined delay mean, for dimension enrichment.
struct KeyStats {
    index: std::collections::BTreeMap<ScalarKey, usize>,
    flights: Vec<Scalar>,
    avg_cancellations: Vec<Scalar>,
    avg_delay: Vec<Scalar>,
}

impl KeyStats {
    fn compute(data: &RowBatch, table: &'static str, key: &str) -> Result<Self> {
        let grouped = group_by(
            data,
            table,
            &[key],
            &[
                ("flights", Agg::Count),
                ("avg_cancellations", Agg::Mean("Cancelled".to_string())),
                ("avg_dep", Agg::Mean("DepDelayMinutes".to_string())),
                ("avg_arr", Agg::Mean("ArrDelayMinutes".to_string())),
            ],
        )?;
        let dep = &require(&grouped, table, "avg_dep")?.values;
        let arr = &require(&grouped, table, "avg_arr")?.values;
        let avg_delay = dep.iter().zip(arr).map(|(d, a)| mean_of(&[d, a])).collect();
        Ok(Self {
            index: index_by_key(&grouped, key),
            flights: require(&grouped, table, "flights")?.values.clone(),
            avg_cancellations: require(&grouped, table, "avg_cancellations")?.values.clone(),
            avg_delay,
        })
    }

    /// Look up `pick` for every value of `keys`; unknown or null keys give null.
    fn lookup(&self, keys: &[Scalar], pick: &[Scalar]) -> Vec<Scalar> {
        keys.iter()
            .map(|k| {
                self.index
                    .get(&ScalarKey(vec![k.clone()]))
                    .map_or(Scalar::Null, |&i| pick[i].clone())
            })
            .collect()
    }
}

pub fn dim_airline(data: &RowBatch) -> Result<RowBatch> {
    let t = DIM_AIRLINE;
    let base = distinct(select(
        data,
        t,
        &[
            ("Reporting_Airline", "iata_code"),
            ("DOT_ID_Reporting_Airline", "dot_id"),
        ],
    )?)?;
    let mut out = with_row_ids(base, "airline_id")?;
    let stats = KeyStats::compute(data, t, "Reporting_Airline")?;
    let codes = require(&out, t, "iata_code")?.values.clone();
    out.set_column(Column::new(
        "avg_cancellations",
        stats.lookup(&codes, &stats.avg_cancellations),
    ))?;
    out.set_column(Column::new(
        "avg_delay_minutes",
        stats.lookup(&codes, &stats.avg_delay),
    ))?;
    Ok(out)
}

pub fn dim_airport(data: &RowBatch) -> Result<RowBatch> {
    let t = DIM_AIRPORT;
    let base = distinct(select(
        data,
        t,
        &[
            ("OriginAirportID", "airport_code"),
            ("Origin", "airport_name"),
            ("OriginCityName", "city"),
            ("OriginState", "state"),
            ("OriginWac", "wac_code"),
        ],
    )?)?;
    let mut out = with_row_ids(base, "airport_id")?;
    let stats = KeyStats::compute(data, t, "OriginAirportID")?;
    let codes = require(&out, t, "airport_code")?.values.clone();
    out.set_column(Column::new("flight_count", stats.lookup(&codes, &stats.flights)))?;
    out.set_column(Column::new(
        "avg_delay_minutes",
        stats.lookup(&codes, &stats.avg_delay),
    ))?;
    out.set_column(Column::new(
        "avg_cancellations",
        stats.lookup(&codes, &stats.avg_cancellations),
    ))?;
    Ok(out)
}

/// Meteorological season (northern hemisphere) of a month number.
pub fn season(month: u32) -> &'static str {
    match month {
        12 | 1 | 2 => "Winter",
        3..=5 => "Spring",
        6..=8 => "Summer",
        _ => "Autumn",
    }
}

pub fn dim_date(data: &RowBatch) -> Result<RowBatch> {
    let t = DIM_DATE;
    let dates = distinct(drop_incomplete(select(data, t, &[("FlightDate", "date_id")])?)?)?;
    let days: Vec<_> = dates.columns[0]
        .values
        .iter()
        .map(|v| match v {
            Scalar::Date(d) => Some(*d),
            _ => None,
        })
        .collect();

    let attr = |f: &dyn Fn(NaiveDate) -> Scalar| -> Vec<Scalar> {
        days.iter()
            .map(|d| d.map_or(Scalar::Null, |d| f(d)))
            .collect()
    };
    let mut out = dates;
    out.set_column(Column::new("year", attr(&|d: NaiveDate| {
        i16::try_from(d.year()).map_or(Scalar::Null, Scalar::I16)
    })))?;
    out.set_column(Column::new("month", attr(&|d: NaiveDate| Scalar::I8(d.month() as i8))))?;
    out.set_column(Column::new("day", attr(&|d: NaiveDate| Scalar::I8(d.day() as i8))))?;
    out.set_column(Column::new(
        "day_of_week",
        attr(&|d: NaiveDate| Scalar::I8(d.weekday().number_from_monday() as i8)),
    ))?;
    out.set_column(Column::new(
        "quarter",
        attr(&|d: NaiveDate| Scalar::I8(((d.month() - 1) / 3 + 1) as i8)),
    ))?;
    out.set_column(Column::new(
        "season",
        attr(&|d: NaiveDate| Scalar::Str(season(d.month()).to_string())),
    ))?;
    Ok(out)
}

/// Reason text for a cancellation code.
pub fn cancellation_reason(code: &str) -> &'static str {
    match code {
        "A" => "Carrier",
        "B" => "Weather",
        "C" => "National Air System",
        "D" => "Security/Other",
        "Un" => "Unknown",
        _ => "Undefined",
    }
}

pub fn dim_cancellation(data: &RowBatch) -> Result<RowBatch> {
    let t = DIM_CANCELLATION;
    let codes = distinct(drop_incomplete(select(
        data,
        t,
        &[("CancellationCode", "cancellation_code")],
    )?)?)?;
    let mut out = with_row_ids(codes, "cancellation_id")?;
    let reasons = out.columns[0]
        .values
        .iter()
        .map(|v| {
            let text = v.render().unwrap_or_default();
            Scalar::Str(cancellation_reason(&text).to_string())
        })
        .collect();
    out.set_column(Column::new("reason", reasons))?;
    Ok(out)
}

pub fn dim_diversion(data: &RowBatch) -> Result<RowBatch> {
    let t = DIM_DIVERSION;
    let diverted = require(data, t, "Diverted")?;
    let mut base = select(
        data,
        t,
        &[
            ("Div1AirportID", "diverted_airport_id"),
            ("ArrTime", "new_arrival_time"),
            ("CRSArrTime", "scheduled_arrival"),
        ],
    )?;
    let keep: Vec<bool> = diverted.values.iter().map(is_one).collect();
    base.retain_rows(&keep)?;
    let mut out = with_row_ids(drop_incomplete(base)?, "diversion_id")?;

    let arr = &require(&out, t, "new_arrival_time")?.values;
    let sched = &require(&out, t, "scheduled_arrival")?.values;
    let delay = arr
        .iter()
        .zip(sched)
        .map(|(a, s)| match (a.as_i64(), s.as_i64()) {
            (Some(a), Some(s)) => a.checked_sub(s).map_or(Scalar::Null, Scalar::I64),
            _ => match (a.as_f64(), s.as_f64()) {
                (Some(a), Some(s)) => Scalar::F64(a - s),
                _ => Scalar::Null,
            },
        })
        .collect();
    out.set_column(Column::new("diversion_delay", delay))?;
    Ok(out)
}

/// Category of a total delay in minutes.
pub fn delay_category(total: f64) -> &'static str {
    if total == 0.0 {
        "No Delay"
    } else if total <= 15.0 {
        "Minor"
    } else if total <= 60.0 {
        "Moderate"
    } else {
        "Severe"
    }
}

pub fn dim_delay(data: &RowBatch) -> Result<RowBatch> {
    let t = DIM_DELAY;
    let base = drop_incomplete(select(
        data,
        t,
        &[
            ("CarrierDelay", "carrier_delay"),
            ("WeatherDelay", "weather_delay"),
            ("NASDelay", "nas_delay"),
            ("SecurityDelay", "security_delay"),
            ("LateAircraftDelay", "late_aircraft_delay"),
            ("DepDelayMinutes", "departure_delay"),
            ("ArrDelayMinutes", "arrival_delay"),
        ],
    )?)?;
    let mut out = with_row_ids(base, "delay_id")?;

    // Late-aircraft delay is not part of the total.
    let parts = [
        "departure_delay",
        "arrival_delay",
        "carrier_delay",
        "weather_delay",
        "nas_delay",
        "security_delay",
    ];
    let cols = parts
        .iter()
        .map(|p| require(&out, t, p))
        .collect::<Result<Vec<_>>>()?;
    let totals: Vec<Option<f64>> = (0..out.num_rows())
        .map(|row| cols.iter().map(|c| c.values[row].as_f64()).sum())
        .collect();
    let total_col = totals.iter().map(|v| v.map_or(Scalar::Null, Scalar::F64)).collect();
    let category_col = totals
        .iter()
        .map(|v| v.map_or(Scalar::Null, |x| Scalar::Str(delay_category(x).to_string())))
        .collect();
    out.set_column(Column::new("total_delay_minutes", total_col))?;
    out.set_column(Column::new("delay_category", category_col))?;
    Ok(out)
}
