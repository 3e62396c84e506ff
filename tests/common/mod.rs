//! Synthetic airline source files for the integration tests.
#![allow(dead_code)]

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use airstar_core::config::CleanConfig;

/// Source header; the leading empty cell is the pandas index column.
pub const HEADER: [&str; 37] = [
    "",
    "Year",
    "Quarter",
    "Month",
    "DayofMonth",
    "DayOfWeek",
    "FlightDate",
    "Reporting_Airline",
    "DOT_ID_Reporting_Airline",
    "Flight_Number_Reporting_Airline",
    "OriginAirportID",
    "Origin",
    "OriginCityName",
    "OriginState",
    "OriginWac",
    "DestAirportID",
    "Dest",
    "CRSDepTime",
    "DepTime",
    "DepDelayMinutes",
    "TaxiOut",
    "TaxiIn",
    "CRSArrTime",
    "ArrTime",
    "ArrDelayMinutes",
    "Cancelled",
    "CancellationCode",
    "Diverted",
    "CRSElapsedTime",
    "ActualElapsedTime",
    "Distance",
    "CarrierDelay",
    "WeatherDelay",
    "NASDelay",
    "SecurityDelay",
    "LateAircraftDelay",
    "Div1AirportID",
];

/// Columns in the cleaned artifact: index dropped, duration and flag added.
pub const CLEANED_COLUMNS: usize = HEADER.len() - 1 + 2;

const AIRLINES: [(&str, u32); 3] = [("AA", 19805), ("DL", 19790), ("UA", 19977)];

/// (id, code, city, state, wac); the last city is Latin-1 only.
const AIRPORTS: [(u32, &str, &[u8], &str, u32); 3] = [
    (10397, "ATL", b"Atlanta, GA", "GA", 34),
    (12478, "JFK", b"New York, NY", "NY", 22),
    (13422, "MAZ", b"Mayag\xfcez, PR", "PR", 3),
];

/// Row `i` loses its departure time (a key column).
pub fn missing_key(i: usize) -> bool {
    i % 10 == 3
}

/// Row `i` carries a negative arrival delay.
pub fn negative_delay(i: usize) -> bool {
    i % 10 == 7
}

pub fn survives(i: usize) -> bool {
    !missing_key(i) && !negative_delay(i)
}

pub fn dep_delay(i: usize) -> u32 {
    (i as u32 % 6) * 10
}

pub fn cancelled(i: usize) -> bool {
    i % 5 == 0
}

pub fn diverted(i: usize) -> bool {
    i % 13 == 0
}

pub fn full_delay_breakdown(i: usize) -> bool {
    i % 4 == 0
}

pub fn airline(i: usize) -> &'static str {
    AIRLINES[i % 3].0
}

/// One Latin-1 encoded record (with trailing newline).
pub fn record(i: usize) -> Vec<u8> {
    let (carrier, dot) = AIRLINES[i % 3];
    let origin = AIRPORTS[(i / 3) % 3];
    let dest = AIRPORTS[(i / 3 + 1) % 3];
    let month = 1 + i % 12;
    let day = 1 + i % 28;
    let dep_time = 600 + (i % 17) * 50;
    let breakdown = |v: usize| {
        if full_delay_breakdown(i) {
            format!("{v}.0")
        } else {
            String::new()
        }
    };

    let mut out = Vec::new();
    let mut push = |field: &[u8]| {
        if !out.is_empty() {
            out.push(b',');
        }
        out.extend_from_slice(field);
    };
    push(i.to_string().as_bytes());
    push(b"2018");
    push(((month - 1) / 3 + 1).to_string().as_bytes());
    push(month.to_string().as_bytes());
    push(day.to_string().as_bytes());
    push((1 + i % 7).to_string().as_bytes());
    push(format!("2018-{month:02}-{day:02}").as_bytes());
    push(carrier.as_bytes());
    push(dot.to_string().as_bytes());
    push((100 + i).to_string().as_bytes());
    push(origin.0.to_string().as_bytes());
    push(origin.1.as_bytes());
    let mut city = vec![b'"'];
    city.extend_from_slice(origin.2);
    city.push(b'"');
    push(&city);
    push(origin.3.as_bytes());
    push(origin.4.to_string().as_bytes());
    push(dest.0.to_string().as_bytes());
    push(dest.1.as_bytes());
    push(dep_time.to_string().as_bytes());
    if missing_key(i) {
        push(b"");
    } else {
        push(format!("{dep_time}.0").as_bytes());
    }
    push(format!("{}.0", dep_delay(i)).as_bytes());
    push(b"12.0");
    push(b"6.0");
    push((dep_time + 230).to_string().as_bytes());
    push((dep_time + 230).to_string().as_bytes());
    if negative_delay(i) {
        push(b"-5.0");
    } else {
        push(format!("{}.0", (i % 4) * 5).as_bytes());
    }
    push(if cancelled(i) { b"1.0" } else { b"0.0" });
    push(if cancelled(i) { &b"B"[..] } else { &b""[..] });
    push(if diverted(i) { b"1.0" } else { b"0.0" });
    push(b"150.0");
    push(format!("{}.0", 140 + i % 20).as_bytes());
    push(b"760.0");
    push(breakdown(i % 3).as_bytes());
    push(breakdown(0).as_bytes());
    push(breakdown(i % 5).as_bytes());
    push(breakdown(0).as_bytes());
    push(breakdown(i % 7).as_bytes());
    if diverted(i) {
        push(b"11298");
    } else {
        push(b"");
    }
    out.push(b'\n');
    out
}

pub fn write_source(path: &Path, rows: usize) {
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(HEADER.join(",").as_bytes()).unwrap();
    file.write_all(b"\n").unwrap();
    for i in 0..rows {
        file.write_all(&record(i)).unwrap();
    }
}

pub fn clean_config(dir: &Path, batch_size: usize) -> CleanConfig {
    CleanConfig {
        source_path: dir.join("source.csv").display().to_string(),
        artifact_path: dir.join("out").join("cleaned.csv.zst").display().to_string(),
        batch_size,
        sample_rows: 1_000,
        compression_level: 3,
    }
}

/// Decompressed artifact text.
pub fn read_artifact(path: impl AsRef<Path>) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut text = String::new();
    zstd::stream::read::Decoder::new(file)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    text
}

pub fn artifact_path(cfg: &CleanConfig) -> PathBuf {
    PathBuf::from(&cfg.artifact_path)
}
