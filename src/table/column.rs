use crate::table::value::Value;
use chrono::NaiveTime;
use serde::Serialize;

/// Column data types inferred from sheet content.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Boolean values (true/false)
    Boolean,
    /// 64-bit signed integers
    Integer,
    /// Double-precision floating point numbers
    Float,
    /// Date without time component
    Date,
    /// Date and time
    DateTime,
    /// Text, and the fallback for mixed columns
    Text,
}

/// A named, typed column of a table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Column {
    /// Column name (from the header row or generated)
    pub name: String,
    /// Column data type
    #[serde(rename = "type")]
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }
}

impl ColumnType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "boolean",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Text => "text",
        }
    }

    /// Detects the most specific common type of a column's values.
    ///
    /// Integers widen to floats and dates widen to timestamps; any other mix,
    /// or a column with no non-null value, falls back to text.
    pub fn detect<'a, I>(values: I) -> ColumnType
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let types: Vec<ColumnType> = values.into_iter().filter_map(Value::kind).collect();
        if types.is_empty() {
            ColumnType::Text
        } else if types.iter().all(|kind| kind.is_boolean()) {
            ColumnType::Boolean
        } else if types.iter().all(|kind| kind.is_int()) {
            ColumnType::Integer
        } else if types.iter().all(|kind| kind.is_numeric()) {
            ColumnType::Float
        } else if types.iter().all(|kind| kind.is_date()) {
            ColumnType::Date
        } else if types.iter().all(|kind| kind.is_temporal()) {
            ColumnType::DateTime
        } else {
            ColumnType::Text
        }
    }

    /// Converts a value into this column's representation.
    ///
    /// Only widening conversions are applied. Text columns keep the value as
    /// read, so a mixed column still renders every cell as text while a
    /// sub-table carved out of it can re-infer the original types.
    pub fn coerce(&self, value: Value) -> Value {
        match (self, value) {
            (ColumnType::Float, Value::Int(value)) => Value::Float(value as f64),
            (ColumnType::DateTime, Value::Date(date)) => Value::DateTime(date.and_time(NaiveTime::MIN)),
            (_, value) => value,
        }
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        matches!(self, ColumnType::Boolean)
    }

    #[inline]
    pub fn is_int(&self) -> bool {
        matches!(self, ColumnType::Integer)
    }

    /// Returns true for integer and floating point columns.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    #[inline]
    pub fn is_date(&self) -> bool {
        matches!(self, ColumnType::Date)
    }

    /// Returns true for date and timestamp columns.
    #[inline]
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::DateTime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
    }

    #[test]
    fn detects_uniform_columns() {
        assert_eq!(ColumnType::detect(&[Value::Int(1), Value::Null, Value::Int(3)]), ColumnType::Integer);
        assert_eq!(ColumnType::detect(&[Value::Int(1), Value::Float(2.5)]), ColumnType::Float);
        assert_eq!(ColumnType::detect(&[day(1), day(2)]), ColumnType::Date);
        assert_eq!(ColumnType::detect(&[Value::Bool(true)]), ColumnType::Boolean);
        assert_eq!(ColumnType::detect(&[Value::text("a"), Value::text("b")]), ColumnType::Text);
    }

    #[test]
    fn mixed_and_empty_columns_fall_back_to_text() {
        assert_eq!(ColumnType::detect(&[Value::Int(1), Value::text("n/a")]), ColumnType::Text);
        assert_eq!(ColumnType::detect(&[day(1), Value::Int(5)]), ColumnType::Text);
        assert_eq!(ColumnType::detect(&[Value::Null, Value::Null]), ColumnType::Text);
        assert_eq!(ColumnType::detect(Vec::<Value>::new().iter()), ColumnType::Text);
    }

    #[test]
    fn dates_and_timestamps_widen_to_timestamps() {
        let stamp = Value::DateTime(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap());
        assert_eq!(ColumnType::detect(&[day(1), stamp]), ColumnType::DateTime);
    }

    #[test]
    fn coerces_by_widening_only() {
        assert_eq!(ColumnType::Float.coerce(Value::Int(2)), Value::Float(2.0));
        assert_eq!(ColumnType::Text.coerce(Value::Int(2)), Value::Int(2));
        assert_eq!(ColumnType::Integer.coerce(Value::Null), Value::Null);
        match ColumnType::DateTime.coerce(day(3)) {
            Value::DateTime(stamp) => assert_eq!(stamp.to_string(), "2024-01-03 00:00:00"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
