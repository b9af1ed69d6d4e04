//! # Metric Aggregators
//!
//! Pure functions deriving display tables from a sheet. Each checks the
//! columns it needs up front and fails with [`SchemaError`] naming the first
//! missing or mistyped one; none of them modifies its input.
//!
//! | aggregator                | output columns            |
//! |---------------------------|---------------------------|
//! | [`daily_trend`]           | `date`, `total`           |
//! | [`category_breakdown`]    | category, count (as named in the source) |
//! | [`multi_series_trend`]    | date, one per series      |
//! | [`top_n`]                 | `actor`, `count`          |
pub mod breakdown;
pub mod daily_trend;
pub mod ranking;
pub mod series;

pub use breakdown::category_breakdown;
pub use daily_trend::daily_trend;
pub use ranking::top_n;
pub use ranking::DEFAULT_TOP_N;
pub use series::multi_series_trend;
pub use series::MIN_SERIES;

use crate::table::ColumnType;
use crate::table::SchemaError;
use crate::table::Table;
use crate::table::Value;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;

/// An inclusive range of calendar dates. A range whose start is after its
/// end contains no date.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Earliest and latest dates of a date column, `None` if it has no date.
pub fn date_bounds(table: &Table, date_column: &str) -> Result<Option<DateRange>, SchemaError> {
    let index = table.require_temporal(date_column)?;
    let dates = table.column(index).filter_map(Value::as_date);
    let bounds = dates.fold(None::<DateRange>, |bounds, date| match bounds {
        Some(range) => Some(DateRange::new(range.start.min(date), range.end.max(date))),
        None => Some(DateRange::new(date, date)),
    });
    Ok(bounds)
}

/// A running sum that stays integral until a float is added.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Total {
    Integer(i64),
    Float(f64),
}

impl Default for Total {
    fn default() -> Self {
        Total::Integer(0)
    }
}

impl Total {
    /// Adds a numeric value; other values are ignored.
    pub fn add(self, value: &Value) -> Total {
        match (self, value) {
            (Total::Integer(total), Value::Int(value)) => match total.checked_add(*value) {
                Some(sum) => Total::Integer(sum),
                None => Total::Float(total as f64 + *value as f64),
            },
            (Total::Integer(total), Value::Float(value)) => Total::Float(total as f64 + value),
            (Total::Float(total), value) => Total::Float(total + value.as_f64().unwrap_or(0.0)),
            (total, _) => total,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Total::Integer(value) => *value as f64,
            Total::Float(value) => *value,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Total::Float(_))
    }
}

impl From<Total> for Value {
    fn from(total: Total) -> Self {
        match total {
            Total::Integer(value) => Value::Int(value),
            Total::Float(value) => Value::Float(value),
        }
    }
}

impl Serialize for Total {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Total::Integer(value) => serializer.serialize_i64(*value),
            Total::Float(value) => serializer.serialize_f64(*value),
        }
    }
}

/// Renders with thousands separators: `12,345` or `1,234.5`.
impl Display for Total {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Total::Integer(value) => value.to_string(),
            Total::Float(value) => value.to_string(),
        };
        let (sign, unsigned) = match text.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", text.as_str()),
        };
        let (integral, fraction) = match unsigned.find('.') {
            Some(index) => unsigned.split_at(index),
            None => (unsigned, ""),
        };
        let mut grouped = String::with_capacity(integral.len() + integral.len() / 3);
        for (index, digit) in integral.chars().enumerate() {
            if index > 0 && (integral.len() - index) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }
        write!(f, "{sign}{grouped}{fraction}")
    }
}

/// Column type for a derived numeric column: integer when every value is.
pub(crate) fn numeric_kind<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = &'a Value>,
{
    let all_integers = values
        .into_iter()
        .filter(|value| !value.is_null())
        .all(|value| matches!(value, Value::Int(_)));
    if all_integers {
        ColumnType::Integer
    } else {
        ColumnType::Float
    }
}
