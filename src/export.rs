//! CSV export of tables.
use crate::table::Table;
use crate::table::Value;
use csv::ReaderBuilder;
use csv::Terminator;
use csv::WriterBuilder;
use log::info;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// File name a table is exported under: `<table-name>.csv`
pub fn file_name(table: &Table) -> String {
    format!("{}.csv", table.name())
}

/// Serializes a table as comma-separated text: the header row, then one
/// record per row in schema column order. Fields containing the delimiter,
/// quotes or line breaks are quoted; nulls are empty fields.
pub fn to_csv(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|value| value.as_text()).map(|text| text.into_owned()))?;
    }
    writer.into_inner().map_err(|error| ExportError::Io(error.into_error()))
}

/// Parses CSV text back into a table of text cells; empty fields are nulls.
pub fn from_csv(name: &str, bytes: &[u8]) -> Result<Table, ExportError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let header: Vec<String> = reader.headers()?.iter().map(ToOwned::to_owned).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let row = record?
            .iter()
            .map(|field| if field.is_empty() { Value::Null } else { Value::text(field) })
            .collect();
        rows.push(row);
    }
    Ok(Table::from_records(name, header, rows))
}

/// Writes a table to `<directory>/<table-name>.csv`, returning the path.
pub fn write_csv(table: &Table, directory: &Path) -> Result<PathBuf, ExportError> {
    let path = directory.join(file_name(table));
    fs::write(&path, to_csv(table)?)?;
    info!("Exported {} rows of '{}' to {}", table.len(), table.name(), path.display());
    Ok(path)
}
