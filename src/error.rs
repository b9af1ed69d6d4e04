use crate::config::ConfigError;
use crate::export::ExportError;
use crate::sections::SectionNotFoundError;
use crate::spreadsheet::LoadError;
use crate::table::SchemaError;
use thiserror::Error;

/// Top-level error of the crate, aggregating the module errors.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    SectionNotFound(#[from] SectionNotFoundError),

    #[error("{0}")]
    Export(#[from] ExportError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Unknown view '{0}'")]
    UnknownView(String),

    #[error("Workbook has no sheet '{0}'")]
    UnknownTable(String),
}
