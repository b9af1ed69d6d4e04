//! # Tables
//!
//! [`Table`] is the single in-memory shape used throughout the crate: a
//! loaded sheet, a sub-table split out of a sectioned sheet and every derived
//! table produced by an aggregator are all tables. A table owns its rows; no
//! table refers back to the table it was computed from.
pub mod column;
pub mod value;

pub use column::Column;
pub use column::ColumnType;
pub use value::Value;

use serde::ser::SerializeMap;
use serde::ser::SerializeStruct;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

/// A present table lacks a column, or the column holds the wrong kind of data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Table '{table}' has no column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Column '{column}' of table '{table}' is {actual}, expected {expected}")]
    ColumnType {
        table: String,
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Table '{table}' needs at least {minimum} series columns, got {actual}")]
    SeriesCount {
        table: String,
        minimum: usize,
        actual: usize,
    },
}

impl SchemaError {
    /// Name of the offending column, if a single column is at fault
    pub fn column(&self) -> Option<&str> {
        match self {
            SchemaError::MissingColumn { column, .. } => Some(column),
            SchemaError::ColumnType { column, .. } => Some(column),
            SchemaError::SeriesCount { .. } => None,
        }
    }
}

/// A named 2-D table of typed cells with a declared column schema.
///
/// Every row has exactly one value per column.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Builds a table with a declared schema. Rows are padded with nulls or
    /// truncated to the schema width, and values are coerced to their
    /// column's type.
    pub fn new(name: impl Into<String>, columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| Self::conform(&columns, row))
            .collect();
        Table {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Builds a table from a header and raw records, inferring each column's
    /// type from its values.
    pub fn from_records(name: impl Into<String>, header: Vec<String>, records: Vec<Vec<Value>>) -> Self {
        let width = header.len();
        let records: Vec<Vec<Value>> = records
            .into_iter()
            .map(|mut record| {
                record.resize(width, Value::Null);
                record
            })
            .collect();
        let columns = header
            .into_iter()
            .enumerate()
            .map(|(index, title)| {
                let kind = ColumnType::detect(records.iter().map(|record| &record[index]));
                Column::new(title, kind)
            })
            .collect();
        Self::new(name, columns, records)
    }

    fn conform(columns: &[Column], mut row: Vec<Value>) -> Vec<Value> {
        row.resize(columns.len(), Value::Null);
        row.into_iter()
            .zip(columns)
            .map(|(value, column)| column.kind.coerce(value))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the same table under another name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of data rows (the header is not a row)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Index of the first column with the given name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Index of a required column, or `SchemaError::MissingColumn`.
    pub fn require(&self, name: &str) -> Result<usize, SchemaError> {
        self.column_index(name).ok_or_else(|| SchemaError::MissingColumn {
            table: self.name.to_owned(),
            column: name.to_owned(),
        })
    }

    /// Index of a required column whose non-null values are all numbers.
    pub fn require_numeric(&self, name: &str) -> Result<usize, SchemaError> {
        let index = self.require(name)?;
        if self.columns[index].kind.is_numeric() || self.conforms(index, Value::is_numeric) {
            Ok(index)
        } else {
            Err(self.type_error(index, "numeric"))
        }
    }

    /// Index of a required column whose non-null values are all dates,
    /// timestamps or ISO date text.
    pub fn require_temporal(&self, name: &str) -> Result<usize, SchemaError> {
        let index = self.require(name)?;
        if self.columns[index].kind.is_temporal() || self.conforms(index, |value| value.as_date().is_some()) {
            Ok(index)
        } else {
            Err(self.type_error(index, "date"))
        }
    }

    fn conforms<F: Fn(&Value) -> bool>(&self, index: usize, predicate: F) -> bool {
        self.column(index)
            .filter(|value| !value.is_null())
            .all(predicate)
    }

    fn type_error(&self, index: usize, expected: &'static str) -> SchemaError {
        SchemaError::ColumnType {
            table: self.name.to_owned(),
            column: self.columns[index].name.to_owned(),
            expected,
            actual: self.columns[index].kind.as_str(),
        }
    }

    /// Values of one column, top to bottom
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|values| values.get(column))
    }
}

/// Serializes as `{name, columns: [{name, type}], rows: [{column: value}]}`.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Table", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("columns", &self.columns)?;
        let records: Vec<Record> = self
            .rows
            .iter()
            .map(|row| Record {
                columns: &self.columns,
                row,
            })
            .collect();
        state.serialize_field("rows", &records)?;
        state.end()
    }
}

struct Record<'a> {
    columns: &'a [Column],
    row: &'a [Value],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.row) {
            map.serialize_entry(&column.name, value)?;
        }
        map.end()
    }
}
