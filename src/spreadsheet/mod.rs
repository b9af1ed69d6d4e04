//! # Workbook Loading
//!
//! Reads an Excel 2007+ workbook (`.xlsx`, `.xlsm`, `.xlam`) into an
//! ordered collection of named [`Table`]s, one per worksheet. The package is
//! parsed directly: relationships and `workbook.xml` give the sheet list,
//! `styles.xml` the number formats that mark date cells, `sharedStrings.xml`
//! the string table, and each worksheet part its cells.
//!
//! A loaded [`Workbook`] is immutable. Share it across threads behind an
//! `Arc`; reloading means building a new one.
pub(crate) mod cell;
pub mod criteria;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

pub use criteria::Criteria;

use crate::helpers::reader::SourceReader;
use crate::helpers::xml::XmlError;
use crate::spreadsheet::xlsx::XlsxWorkbook;
use crate::table::Table;
use log::info;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use thiserror::Error;

/// Workbook file extensions that carry a SpreadsheetML package
const SUPPORTED_EXTENSIONS: [&str; 3] = ["xlsx", "xlsm", "xlam"];

/// Errors raised while opening or parsing a workbook.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Workbook '{0}' not found")]
    NotFound(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported workbook format '{0}', expected .xlsx, .xlsm or .xlam")]
    UnsupportedFormat(String),

    #[error("Remote workbook '{0}' is not supported, read it from local storage")]
    RemoteSource(String),

    #[error("Workbook '{0}' is a legacy or password-protected compound document")]
    CompoundDocument(String),

    #[error("Workbook part '{0}' is missing")]
    MissingEntry(String),

    #[error("Workbook '{0}' has no worksheets")]
    EmptyWorkbook(String),

    #[error("Invalid cell value '{value}' at {sheet}!{reference} in '{file}'")]
    CellValue {
        file: String,
        sheet: String,
        reference: String,
        value: String,
    },

    #[error("Invalid cell reference '{reference}' in sheet '{sheet}' of '{file}'")]
    CellReference {
        file: String,
        sheet: String,
        reference: String,
    },

    #[error("Sheet '{sheet}' of '{file}' spans {rows} rows by {columns} columns, too large to load")]
    SheetTooLarge {
        file: String,
        sheet: String,
        rows: usize,
        columns: usize,
    },

    #[error("Not a valid workbook package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    XmlHelper(#[from] XmlError),

    #[error("{0}")]
    ParseInt(#[from] std::num::ParseIntError),
}

/// An ordered collection of named sheets, each a [`Table`].
#[derive(Clone, Debug, Default)]
pub struct Workbook {
    source: String,
    sheets: Vec<Table>,
}

impl Workbook {
    /// Loads every sheet accepted by the criteria from a local path or
    /// `file://` URL.
    pub fn open(location: &str, criteria: &Criteria) -> Result<Workbook, LoadError> {
        check_extension(location)?;
        let reader = SourceReader::open(location)?;
        Self::load(location, reader, criteria)
    }

    /// Loads a workbook from an in-memory `.xlsx` image, such as an upload.
    pub fn from_bytes(name: &str, bytes: Vec<u8>, criteria: &Criteria) -> Result<Workbook, LoadError> {
        Self::load(name, SourceReader::from_bytes(bytes), criteria)
    }

    /// Assembles a workbook from tables built elsewhere.
    pub fn from_tables(source: impl Into<String>, sheets: Vec<Table>) -> Workbook {
        Workbook {
            source: source.into(),
            sheets,
        }
    }

    fn load<R: Read + Seek>(name: &str, reader: R, criteria: &Criteria) -> Result<Workbook, LoadError> {
        let mut package = XlsxWorkbook::open(name, reader)?;
        let shared_strings = package.load_shared_strings()?;
        let sheets = package
            .read_sheets(criteria)?
            .into_iter()
            .map(|sheet| sheet.into_table(criteria, &shared_strings))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Loaded {} of {} sheets from '{}'", sheets.len(), package.sheet_names().len(), name);
        Ok(Workbook {
            source: name.to_owned(),
            sheets,
        })
    }

    /// Path or name the workbook was loaded from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Looks up a sheet by exact name. With duplicate names the first wins.
    pub fn sheet(&self, name: &str) -> Option<&Table> {
        self.sheets.iter().find(|sheet| sheet.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Table::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.sheets.iter()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

fn check_extension(location: &str) -> Result<(), LoadError> {
    let extension = Path::new(location)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension {
        Some(extension) if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) => Ok(()),
        _ => Err(LoadError::UnsupportedFormat(location.to_owned())),
    }
}
