use crate::spreadsheet::reference::index_to_reference;
use crate::table::value::DATE_FORMAT;
use crate::table::Value;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;

/// Storage kinds of worksheet cells, as declared by the cell's `t`
/// attribute and, for numbers, its number format.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as 0/1
    Boolean,
    /// Plain numeric values
    Number,
    /// Date/time serials, 1900 date system
    NumberDateTime1900,
    /// Date serials, 1900 date system
    NumberDate1900,
    /// Time-of-day fractions, 1900 date system
    NumberTime1900,
    /// Date/time serials, 1904 date system
    NumberDateTime1904,
    /// Date serials, 1904 date system
    NumberDate1904,
    /// Time-of-day fractions, 1904 date system
    NumberTime1904,
    /// ISO 8601 date/time strings (`t="d"`)
    IsoDateTime,
    /// Inline or formula string values
    InlineString,
    /// Index into the shared string table
    SharedString,
    /// Error values such as `#N/A`
    Error,
}

impl CellType {
    /// Maps built-in number format IDs to date/time cell types.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(Self::datetime(is_1904)),
            "14" | "15" | "16" | "17" => Some(Self::date(is_1904)),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::time(is_1904)),
            _ => None,
        }
    }

    /// Classifies a custom number format code by scanning it for date and
    /// time tokens outside of literals, escapes and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::datetime(is_1904),
            (true, false) => Self::date(is_1904),
            (false, true) => Self::time(is_1904),
            (false, false) => Self::Number,
        }
    }

    fn datetime(is_1904: bool) -> Self {
        if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }
    }

    fn date(is_1904: bool) -> Self {
        if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }
    }

    fn time(is_1904: bool) -> Self {
        if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }
    }

    fn is_1904(&self) -> bool {
        matches!(self, Self::NumberDateTime1904 | Self::NumberDate1904 | Self::NumberTime1904)
    }
}

/// A raw worksheet cell: position, storage kind and the text of its `<v>`
/// (or inline string) element.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell storage kind
    pub(crate) kind: CellType,
    /// Raw cell content
    pub(crate) value: String,
}

impl Cell {
    /// Returns the A1-style reference of the cell.
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the raw content to a typed value.
    ///
    /// Shared strings are resolved against `shared_strings`. Whole-number
    /// numerics become integers. Date serials become dates and date/time
    /// serials become timestamps. Time-only values are kept as `HH:MM:SS`
    /// text. The error message names the offending content.
    pub(crate) fn to_value(&self, shared_strings: &[String]) -> Result<Value, String> {
        match self.kind {
            CellType::Empty => Ok(Value::Null),
            CellType::Boolean => Ok(Value::Bool(self.value == "1")),
            CellType::Number => self.to_number(),
            CellType::NumberDate1900 | CellType::NumberDate1904 => {
                to_datetime(self.to_double()?, self.kind.is_1904())
                    .map(|datetime| Value::Date(datetime.date()))
                    .ok_or_else(|| self.failure("date"))
            }
            CellType::NumberDateTime1900 | CellType::NumberDateTime1904 => {
                to_datetime(self.to_double()?, self.kind.is_1904())
                    .map(Value::DateTime)
                    .ok_or_else(|| self.failure("datetime"))
            }
            CellType::NumberTime1900 | CellType::NumberTime1904 => Ok(Value::Text(to_time_string(self.to_double()?))),
            CellType::IsoDateTime => self.to_iso_datetime(),
            CellType::InlineString => Ok(Value::Text(self.value.to_owned())),
            CellType::SharedString => {
                let index = self.value.parse::<usize>().map_err(|_| self.failure("shared string index"))?;
                shared_strings
                    .get(index)
                    .map(|text| Value::Text(text.to_owned()))
                    .ok_or_else(|| self.failure("shared string index"))
            }
            CellType::Error => Err(format!("error value '{}'", self.value)),
        }
    }

    fn to_double(&self) -> Result<f64, String> {
        self.value.trim().parse::<f64>().map_err(|_| self.failure("double"))
    }

    fn to_number(&self) -> Result<Value, String> {
        if is_integer(&self.value) {
            if let Ok(value) = self.value.trim().parse::<i64>() {
                return Ok(Value::Int(value));
            }
        }
        let value = self.to_double()?;
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            Ok(Value::Int(value as i64))
        } else {
            Ok(Value::Float(value))
        }
    }

    fn to_iso_datetime(&self) -> Result<Value, String> {
        let text = self.value.trim();
        if text.contains('T') && !text.contains("T00:00:00") {
            NaiveDateTime::parse_from_str(text.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
                .map(Value::DateTime)
                .map_err(|_| self.failure("datetime"))
        } else {
            let date = text.split('T').next().unwrap_or(text);
            NaiveDate::parse_from_str(date, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| self.failure("date"))
        }
    }

    fn failure(&self, target: &str) -> String {
        format!("parse '{}' to {} failed", self.value, target)
    }
}

/// Checks if a numeric string has no fractional digits other than zeros.
fn is_integer(value: &str) -> bool {
    match value.find('.') {
        Some(index) => value[(index + 1)..].chars().all(|character| character == '0'),
        None => !value.contains(['e', 'E']),
    }
}

/// Converts a spreadsheet serial number to a timestamp.
///
/// The 1900 system counts from 1899-12-30 and carries the Lotus 1-2-3 bug
/// that treats 1900 as a leap year, so serials below 60 are shifted by a day.
/// The 1904 system counts from 1904-01-01.
pub(crate) fn to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let milliseconds = (serial.fract() * 86_400_000f64).round() as i64;
    epoch.checked_add_signed(Duration::days(days + offset))?
        .checked_add_signed(Duration::milliseconds(milliseconds))
}

/// Formats a time-of-day fraction as `HH:MM:SS`.
pub(crate) fn to_time_string(fraction: f64) -> String {
    let mut seconds = (fraction.fract() * 86_400f64).round() as i64;
    let hours = seconds / 3600;
    seconds %= 3600;
    let minutes = seconds / 60;
    seconds %= 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
