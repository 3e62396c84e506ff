//! Star-schema reshaping of a freshly cleaned artifact.

mod common;

use std::collections::BTreeSet;

use airstar_core::schema::ColumnTypes;
use airstar_core::types::{RowBatch, Scalar};
use airstar_exec::Pipeline;
use airstar_model::tables::*;
use airstar_model::{load_artifact, DimensionalModel};
use airstar_transform::RuleSet;

use common::*;

const ROWS: usize = 100;

fn cleaned_model() -> (tempfile::TempDir, RowBatch, DimensionalModel) {
    let dir = tempfile::tempdir().unwrap();
    write_source(&dir.path().join("source.csv"), ROWS);
    let cfg = clean_config(dir.path(), 32);
    let report = Pipeline::new(cfg.clone(), ColumnTypes::airline(), RuleSet::airline())
        .run()
        .unwrap();
    assert!(report.is_success());

    let data = load_artifact(&artifact_path(&cfg), 17, &ColumnTypes::cleaned_airline()).unwrap();
    let model = DimensionalModel::build(&data).unwrap();
    (dir, data, model)
}

fn survivors() -> impl Iterator<Item = usize> {
    (0..ROWS).filter(|&i| survives(i))
}

fn non_null(batch: &RowBatch, column: &str) -> usize {
    batch
        .column(column)
        .unwrap()
        .values
        .iter()
        .filter(|v| !v.is_null())
        .count()
}

#[test]
fn artifact_reloads_with_cleaned_types() {
    let (_dir, data, _) = cleaned_model();
    assert_eq!(data.num_rows(), survivors().count());
    assert!(matches!(
        data.column("FlightDate").unwrap().values[0],
        Scalar::Date(_)
    ));
    assert!(matches!(data.column("Origin").unwrap().values[0], Scalar::Cat(_)));
}

#[test]
fn fact_flights_keeps_one_row_per_flight() {
    let (_dir, _, model) = cleaned_model();
    let fact = model.table(FACT_FLIGHTS).unwrap();
    assert_eq!(fact.num_rows(), survivors().count());
    assert_eq!(
        non_null(fact, "cancellation_id"),
        survivors().filter(|&i| cancelled(i)).count()
    );
    assert_eq!(
        non_null(fact, "diversion_id"),
        survivors().filter(|&i| diverted(i)).count()
    );
    let flagged = fact
        .column("delay_flag")
        .unwrap()
        .values
        .iter()
        .filter(|v| **v == Scalar::I8(1))
        .count();
    assert_eq!(flagged, survivors().filter(|&i| dep_delay(i) > 15).count());
    let ids = &fact.column("flight_id").unwrap().values;
    assert_eq!(ids.first(), Some(&Scalar::I64(1)));
    assert_eq!(ids.last(), Some(&Scalar::I64(fact.num_rows() as i64)));
}

#[test]
fn dimensions_have_the_expected_cardinality() {
    let (_dir, _, model) = cleaned_model();

    let airlines = model.table(DIM_AIRLINE).unwrap();
    assert_eq!(airlines.num_rows(), 3);
    let codes: BTreeSet<String> = airlines
        .column("iata_code")
        .unwrap()
        .values
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    let expected: BTreeSet<String> = survivors().map(|i| airline(i).to_string()).collect();
    assert_eq!(codes, expected);

    assert_eq!(model.table(DIM_AIRPORT).unwrap().num_rows(), 3);

    let dates: BTreeSet<(usize, usize)> = survivors().map(|i| (1 + i % 12, 1 + i % 28)).collect();
    let dim_date = model.table(DIM_DATE).unwrap();
    assert_eq!(dim_date.num_rows(), dates.len());
    assert_eq!(dim_date.column_names()[0], "date_id");

    let cancellation = model.table(DIM_CANCELLATION).unwrap();
    assert_eq!(cancellation.num_rows(), 1);
    assert_eq!(
        cancellation.column("reason").unwrap().values,
        vec![Scalar::Str("Weather".into())]
    );

    let diversion = model.table(DIM_DIVERSION).unwrap();
    assert_eq!(diversion.num_rows(), survivors().filter(|&i| diverted(i)).count());
    assert!(diversion
        .column("diversion_delay")
        .unwrap()
        .values
        .iter()
        .all(|v| *v == Scalar::I64(0)));

    let delay = model.table(DIM_DELAY).unwrap();
    assert_eq!(
        delay.num_rows(),
        survivors().filter(|&i| full_delay_breakdown(i)).count()
    );
    assert_eq!(non_null(delay, "delay_category"), delay.num_rows());
}

#[test]
fn airport_operations_group_by_origin_and_day() {
    let (_dir, _, model) = cleaned_model();
    let ops = model.table(FACT_AIRPORT_OPERATIONS).unwrap();
    let handled: i64 = ops
        .column("flights_handled")
        .unwrap()
        .values
        .iter()
        .filter_map(Scalar::as_i64)
        .sum();
    assert_eq!(handled as usize, survivors().count());
    let cancelled_total: i64 = ops
        .column("flights_cancelled")
        .unwrap()
        .values
        .iter()
        .filter_map(Scalar::as_i64)
        .sum();
    assert_eq!(
        cancelled_total as usize,
        survivors().filter(|&i| cancelled(i)).count()
    );
}

#[test]
fn export_writes_each_table_to_its_own_file() {
    let (dir, _, model) = cleaned_model();
    let out = dir.path().join("tables");
    let summary = model.export(&out).unwrap();
    assert!(summary.is_complete());
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.written.len(), 8);

    for (name, rows) in &summary.written {
        let text = std::fs::read_to_string(out.join(format!("{name}.csv"))).unwrap();
        assert_eq!(text.lines().count(), rows + 1, "{name}");
    }
    let header = std::fs::read_to_string(out.join("dim_date.csv")).unwrap();
    assert!(header.starts_with("date_id,year,month,day,day_of_week,quarter,season\n"));
}

#[test]
fn tables_missing_source_columns_fail_by_name() {
    let data = RowBatch::new(vec![airstar_core::types::Column::new(
        "FlightDate",
        vec![Scalar::Null],
    )]);
    let err = DimensionalModel::build(&data).unwrap_err();
    assert!(err.to_string().contains("fact_flights"));
}
