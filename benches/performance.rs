use criterion::{criterion_group, criterion_main, Criterion};
use airstar_core::types::{Column, RowBatch, Scalar};
use airstar_transform::RuleSet;
use chrono::NaiveDate;

fn make_batch(rows: usize) -> RowBatch {
    let carriers = ["AA", "DL", "UA", "WN"];
    let airports = ["ATL", "JFK", "ORD", "LAX", "DFW"];
    let date = NaiveDate::from_ymd_opt(2018, 3, 14).unwrap();

    let mut columns: Vec<Column> = [
        "Unnamed: 0",
        "FlightDate",
        "Reporting_Airline",
        "Origin",
        "Dest",
        "DepTime",
        "ArrTime",
        "DepDelayMinutes",
        "ArrDelayMinutes",
    ]
    .iter()
    .map(|name| Column::new(*name, Vec::with_capacity(rows)))
    .collect();

    for i in 0..rows {
        let dep = 600 + (i % 900) as i64;
        let row = [
            Scalar::I64(i as i64),
            // Every 50th date fails to parse and ends up null.
            if i % 50 == 0 {
                Scalar::Str("not a date".into())
            } else {
                Scalar::Str(date.format("%Y-%m-%d").to_string())
            },
            Scalar::Str(carriers[i % carriers.len()].into()),
            Scalar::Str(airports[i % airports.len()].into()),
            Scalar::Str(airports[(i + 1) % airports.len()].into()),
            Scalar::F32(dep as f32),
            Scalar::I64(dep + 215),
            Scalar::F32((i % 40) as f32),
            if i % 17 == 0 {
                Scalar::F32(-3.0)
            } else {
                Scalar::F32((i % 25) as f32)
            },
        ];
        for (col, v) in columns.iter_mut().zip(row) {
            col.values.push(v);
        }
    }
    RowBatch::new(columns)
}

fn bench_airline_rules(c: &mut Criterion) {
    let batch = make_batch(50_000);
    let rules = RuleSet::airline();
    c.bench_function("airline_rules_50k", |b| {
        b.iter(|| {
            let _ = rules.apply(batch.clone()).unwrap();
        })
    });
}

criterion_group!(cleaning, bench_airline_rules);
criterion_main!(cleaning);
