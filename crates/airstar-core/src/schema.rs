//! Logical column types and per-column type declarations. Pure data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    /// Low-cardinality text; values share one allocation per distinct value.
    Category,
    Date,
}

impl DataType {
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Utf8 => "utf8",
            DataType::Category => "category",
            DataType::Date => "date",
        };
        f.write_str(s)
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int8" | "i8" => Ok(DataType::Int8),
            "int16" | "i16" => Ok(DataType::Int16),
            "int32" | "i32" => Ok(DataType::Int32),
            "int64" | "i64" => Ok(DataType::Int64),
            "float32" | "f32" => Ok(DataType::Float32),
            "float64" | "f64" => Ok(DataType::Float64),
            "utf8" | "str" | "string" | "text" => Ok(DataType::Utf8),
            "category" | "cat" => Ok(DataType::Category),
            "date" => Ok(DataType::Date),
            other => Err(Error::Schema(format!("unknown data type '{other}'"))),
        }
    }
}

/// Declared column → type mapping, fixed for the lifetime of a pipeline.
///
/// Columns that are not declared are inferred per value by the reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypes {
    entries: Vec<(String, DataType)>,
}

impl ColumnTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or re-declare) a column type. Later declarations win.
    pub fn with(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.declare(name, data_type);
        self
    }

    pub fn declare(&mut self, name: impl Into<String>, data_type: DataType) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = data_type,
            None => self.entries.push((name, data_type)),
        }
    }

    pub fn get(&self, name: &str) -> Option<DataType> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DataType)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Source declaration for the airline on-time dataset.
    pub fn airline() -> Self {
        use DataType::*;
        Self::new()
            .with("Year", Int16)
            .with("Quarter", Int8)
            .with("Month", Int8)
            .with("DayofMonth", Int8)
            .with("DayOfWeek", Int8)
            .with("Flight_Number_Reporting_Airline", Int32)
            .with("OriginAirportID", Int32)
            .with("DestAirportID", Int32)
            .with("CRSDepTime", Int16)
            .with("DepTime", Float32)
            .with("DepDelayMinutes", Float32)
            .with("ArrDelayMinutes", Float32)
            .with("Cancelled", Int8)
            .with("Diverted", Int8)
            .with("Distance", Float32)
            .with("CarrierDelay", Float32)
            .with("WeatherDelay", Float32)
            .with("NASDelay", Float32)
            .with("SecurityDelay", Float32)
            .with("LateAircraftDelay", Float32)
    }

    /// Declaration used when re-reading the cleaned artifact.
    ///
    /// Same as [`ColumnTypes::airline`] plus the columns the cleaning rules
    /// retype: the parsed flight date and the categorical text columns.
    pub fn cleaned_airline() -> Self {
        Self::airline()
            .with("FlightDate", DataType::Date)
            .with("Reporting_Airline", DataType::Category)
            .with("Origin", DataType::Category)
            .with("Dest", DataType::Category)
            .with("SignificantDelay", DataType::Int8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclaring_replaces_in_place() {
        let types = ColumnTypes::new()
            .with("a", DataType::Int8)
            .with("b", DataType::Utf8)
            .with("a", DataType::Float32);
        assert_eq!(types.len(), 2);
        assert_eq!(types.get("a"), Some(DataType::Float32));
        let names: Vec<_> = types.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn data_type_parses_aliases() {
        assert_eq!("i16".parse::<DataType>().unwrap(), DataType::Int16);
        assert_eq!("Category".parse::<DataType>().unwrap(), DataType::Category);
        assert!("decimal".parse::<DataType>().is_err());
    }

    #[test]
    fn airline_declaration_covers_numeric_sources() {
        let types = ColumnTypes::airline();
        assert_eq!(types.get("CRSDepTime"), Some(DataType::Int16));
        assert_eq!(types.get("DepTime"), Some(DataType::Float32));
        assert_eq!(types.get("Origin"), None);
    }
}
