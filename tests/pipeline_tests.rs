//! End-to-end cleaning runs over a synthetic Latin-1 source.

mod common;

use std::io::Write;

use airstar_core::config::CleanConfig;
use airstar_core::report::{IntegrityCheck, RunState};
use airstar_core::schema::ColumnTypes;
use airstar_exec::Pipeline;
use airstar_transform::RuleSet;

use common::*;

fn pipeline(cfg: CleanConfig) -> Pipeline {
    Pipeline::new(cfg, ColumnTypes::airline(), RuleSet::airline())
}

#[test]
fn clean_run_writes_one_header_and_every_surviving_row() {
    let dir = tempfile::tempdir().unwrap();
    write_source(&dir.path().join("source.csv"), 100);
    let cfg = clean_config(dir.path(), 16);
    let mut p = pipeline(cfg.clone());

    let report = p.run().unwrap();
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(p.state(), RunState::Completed);
    assert_eq!(report.batches, 7);
    assert_eq!(report.rows_read, 100);
    let survivors = (0..100).filter(|&i| survives(i)).count();
    assert_eq!(report.rows_written, survivors as u64);
    assert!(report.artifact_exists);
    assert!(report.artifact_digest.is_some());
    assert_eq!(
        report.integrity,
        IntegrityCheck::Passed {
            rows: survivors,
            columns: CLEANED_COLUMNS
        }
    );

    let text = read_artifact(artifact_path(&cfg));
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("Year,Quarter,Month"));
    assert!(!header.contains("Unnamed"));
    assert!(header.ends_with("FlightDuration,SignificantDelay"));
    let body: Vec<&str> = lines.collect();
    assert_eq!(body.len(), survivors);
    assert!(body.iter().all(|l| !l.starts_with("Year,")));

    // Latin-1 text decoded once and written as UTF-8.
    assert!(text.contains("\"Mayagüez, PR\""));
}

#[test]
fn derived_columns_follow_the_delay_threshold() {
    let dir = tempfile::tempdir().unwrap();
    write_source(&dir.path().join("source.csv"), 60);
    let cfg = clean_config(dir.path(), 25);
    pipeline(cfg.clone()).run().unwrap();

    let text = read_artifact(artifact_path(&cfg));
    let flags: Vec<&str> = text
        .lines()
        .skip(1)
        .map(|l| l.rsplit(',').next().unwrap())
        .collect();
    let expected: Vec<&str> = (0..60)
        .filter(|&i| survives(i))
        .map(|i| if dep_delay(i) > 15 { "1" } else { "0" })
        .collect();
    assert_eq!(flags, expected);

    let durations: Vec<&str> = text
        .lines()
        .skip(1)
        .map(|l| l.rsplit(',').nth(1).unwrap())
        .collect();
    assert!(durations.iter().all(|d| *d == "230.0"));
}

#[test]
fn repeated_runs_produce_identical_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_source(&dir.path().join("source.csv"), 80);
    let cfg = clean_config(dir.path(), 9);

    let first = pipeline(cfg.clone()).run().unwrap();
    let first_bytes = std::fs::read(artifact_path(&cfg)).unwrap();
    let second = pipeline(cfg.clone()).run().unwrap();
    let second_bytes = std::fs::read(artifact_path(&cfg)).unwrap();

    assert_eq!(first.artifact_digest, second.artifact_digest);
    assert_eq!(first.config_hash, second.config_hash);
    assert_eq!(first_bytes, second_bytes);
    assert_ne!(first.id, second.id);
}

#[test]
fn malformed_record_stops_the_run_and_keeps_earlier_batches() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.csv");
    write_source(&source, 40);
    {
        let mut f = std::fs::OpenOptions::new().append(true).open(&source).unwrap();
        let mut bad = record(40);
        bad.pop();
        bad.extend_from_slice(b",surplus\n");
        f.write_all(&bad).unwrap();
        for i in 41..60 {
            f.write_all(&record(i)).unwrap();
        }
    }
    let cfg = clean_config(dir.path(), 16);
    let mut p = pipeline(cfg.clone());
    let report = p.run().unwrap();

    assert_eq!(report.state, RunState::FailedPartial);
    assert_eq!(report.batches, 2);
    assert!(report.error.is_some());
    let kept = (0..32).filter(|&i| survives(i)).count();
    assert_eq!(report.rows_written, kept as u64);
    assert!(report.artifact_exists);
    assert!(matches!(report.integrity, IntegrityCheck::Passed { rows, .. } if rows == kept));

    let text = read_artifact(artifact_path(&cfg));
    assert_eq!(text.lines().count(), kept + 1);
}

#[test]
fn header_only_source_completes_without_artifact() {
    let dir = tempfile::tempdir().unwrap();
    write_source(&dir.path().join("source.csv"), 0);
    let cfg = clean_config(dir.path(), 16);
    let report = pipeline(cfg).run().unwrap();
    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.batches, 0);
    assert!(!report.artifact_exists);
    assert_eq!(report.integrity, IntegrityCheck::Skipped);
}
