//! Field coercion: raw text to a `Scalar` of the declared type.
//!
//! Coercion never fails. Text that does not fit the declared type (bad
//! digits, out of range for the width, unparseable date) becomes `Null`.

use airstar_core::schema::DataType;
use airstar_core::types::{parse_date, CategoryPool, Scalar};

/// Field values read as missing regardless of the column type.
const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_null_token(raw: &str) -> bool {
    NULL_TOKENS.contains(&raw.trim())
}

/// Coerce one field. `declared == None` infers the type from the value.
pub fn coerce(raw: &str, declared: Option<DataType>, pool: &mut CategoryPool) -> Scalar {
    if is_null_token(raw) {
        return Scalar::Null;
    }
    let Some(dt) = declared else {
        return infer(raw);
    };
    let t = raw.trim();
    match dt {
        DataType::Int8 => parse_int(t)
            .and_then(|v| i8::try_from(v).ok())
            .map_or(Scalar::Null, Scalar::I8),
        DataType::Int16 => parse_int(t)
            .and_then(|v| i16::try_from(v).ok())
            .map_or(Scalar::Null, Scalar::I16),
        DataType::Int32 => parse_int(t)
            .and_then(|v| i32::try_from(v).ok())
            .map_or(Scalar::Null, Scalar::I32),
        DataType::Int64 => parse_int(t).map_or(Scalar::Null, Scalar::I64),
        DataType::Float32 => parse_float(t)
            .map(|v| v as f32)
            .filter(|v| v.is_finite())
            .map_or(Scalar::Null, Scalar::F32),
        DataType::Float64 => parse_float(t).map_or(Scalar::Null, Scalar::F64),
        DataType::Utf8 => Scalar::Str(raw.to_string()),
        DataType::Category => Scalar::Cat(pool.intern(raw)),
        DataType::Date => parse_date(t).map_or(Scalar::Null, Scalar::Date),
    }
}

/// Integer literal, or a float literal with no fractional part.
fn parse_int(t: &str) -> Option<i64> {
    if let Ok(v) = t.parse::<i64>() {
        return Some(v);
    }
    let f = parse_float(t)?;
    if f.fract() != 0.0 || f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return None;
    }
    Some(f as i64)
}

fn parse_float(t: &str) -> Option<f64> {
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn infer(raw: &str) -> Scalar {
    let t = raw.trim();
    if let Ok(v) = t.parse::<i64>() {
        return Scalar::I64(v);
    }
    if let Some(v) = parse_float(t) {
        return Scalar::F64(v);
    }
    Scalar::Str(raw.to_string())
}
