//! # Sectioned Sheets
//!
//! Some report sheets stack several logical tables vertically. Each one is
//! introduced by a marker row (for example `Breakdown by Category`), followed
//! by its own header row and data rows, until the next marker or the end of
//! the sheet:
//!
//! ```text
//! Breakdown by Category        <- marker
//! category    | count          <- header
//! Billing     | 12             <- data
//! Network     | 7
//!                              <- spacer, dropped
//! Breakdown by Region          <- marker
//! region      | count
//! North       | 9
//! ```
//!
//! [`parse_sections`] splits such a sheet into [`Sections`]. Rows above the
//! first marker are preamble and ignored. A sheet with no marker at all is a
//! single unnamed section whose header is its first non-blank row.
use crate::spreadsheet::sheet::column_name;
use crate::table::SchemaError;
use crate::table::Table;
use crate::table::Value;
use log::debug;
use regex::Regex;
use thiserror::Error;

/// A named section was requested but no marker with that title exists.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Sheet '{sheet}' has no section '{title}'")]
pub struct SectionNotFoundError {
    pub sheet: String,
    pub title: String,
}

/// Column whose null cells mark a row as a spacer rather than data.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyColumn {
    /// 0-based position in the section header
    Position(usize),
    /// Name in the section header
    Name(String),
}

/// One logical sub-table of a sectioned sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    /// Text of the marker row; `None` for the implicit section of a sheet
    /// without markers
    pub title: Option<String>,
    pub table: Table,
}

/// Sections of a sheet in top-to-bottom order. Titles may repeat, so
/// position is the only unambiguous key.
#[derive(Clone, Debug, PartialEq)]
pub struct Sections {
    sheet: String,
    sections: Vec<Section>,
}

impl Sections {
    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// First section whose title equals `title`, ignoring case and
    /// surrounding whitespace.
    pub fn find(&self, title: &str) -> Result<&Section, SectionNotFoundError> {
        self.find_position(title).map(|(_, section)| section)
    }

    /// Like [`find`](Self::find), also returning the section's 0-based
    /// position in the sheet.
    pub fn find_position(&self, title: &str) -> Result<(usize, &Section), SectionNotFoundError> {
        let wanted = title.trim();
        self.sections
            .iter()
            .enumerate()
            .find(|(_, section)| has_title(section, wanted))
            .ok_or_else(|| SectionNotFoundError {
                sheet: self.sheet.to_owned(),
                title: title.to_owned(),
            })
    }

    /// Every section carrying `title`, in sheet order
    pub fn find_all<'a>(&'a self, title: &str) -> impl Iterator<Item = &'a Section> + 'a {
        let wanted = title.trim().to_owned();
        self.sections.iter().filter(move |section| has_title(section, &wanted))
    }
}

fn has_title(section: &Section, title: &str) -> bool {
    section
        .title
        .as_deref()
        .map(|candidate| candidate.trim().eq_ignore_ascii_case(title))
        .unwrap_or(false)
}

impl IntoIterator for Sections {
    type Item = Section;
    type IntoIter = std::vec::IntoIter<Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.into_iter()
    }
}

/// Builds a marker predicate matching the first cell of a row against a
/// regular expression.
pub fn title_marker(pattern: &Regex) -> impl Fn(&[Value]) -> bool + '_ {
    move |row: &[Value]| match row.first() {
        Some(Value::Text(text)) => pattern.is_match(text),
        _ => false,
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum State {
    SeekingMarker,
    ReadingHeader,
    ReadingRows,
}

/// A section being accumulated by the parser
struct Pending {
    title: Option<String>,
    header: Option<Vec<String>>,
    rows: Vec<Vec<Value>>,
}

impl Pending {
    fn new(title: Option<String>) -> Self {
        Pending {
            title,
            header: None,
            rows: Vec::new(),
        }
    }

    fn finish(self, sheet: &str, key_columns: &[KeyColumn]) -> Result<Section, SchemaError> {
        let name = self.title.as_deref().unwrap_or(sheet).to_owned();
        let header = self.header.unwrap_or_default();
        let keys = key_columns
            .iter()
            .map(|key| match key {
                KeyColumn::Position(index) => Ok(*index),
                KeyColumn::Name(column) => {
                    header
                        .iter()
                        .position(|candidate| candidate == column)
                        .ok_or_else(|| SchemaError::MissingColumn {
                            table: name.to_owned(),
                            column: column.to_owned(),
                        })
                }
            })
            .collect::<Result<Vec<usize>, SchemaError>>()?;
        let rows = self
            .rows
            .into_iter()
            .filter(|row| keys.iter().all(|key| row.get(*key).map(|value| !value.is_null()).unwrap_or(false)))
            .collect();
        Ok(Section {
            title: self.title,
            table: Table::from_records(name, header, rows),
        })
    }
}

/// Splits a sheet into its marker-delimited sections.
///
/// The sheet is scanned as its header row followed by its data rows, so the
/// header of a sheet loaded with one takes part like any other row. Blank rows
/// are always dropped, as are rows with a null in any of `key_columns`.
///
/// Fails with [`SchemaError`] when a named key column is absent from a
/// section header.
pub fn parse_sections<F>(sheet: &Table, is_marker: F, key_columns: &[KeyColumn]) -> Result<Sections, SchemaError>
where
    F: Fn(&[Value]) -> bool,
{
    let mut state = State::SeekingMarker;
    let mut finished = Vec::<Pending>::new();
    let mut pending = None::<Pending>;
    let mut preamble = 0usize;
    let mut has_marker = false;

    let header = header_row(sheet);
    for row in std::iter::once(&header).chain(sheet.rows()) {
        let row: &[Value] = row;
        if is_marker(row) {
            has_marker = true;
            if let Some(section) = pending.take() {
                finished.push(section);
            }
            let title = row.first().map(|value| value.as_text().trim().to_owned()).unwrap_or_default();
            pending = Some(Pending::new(Some(title)));
            state = State::ReadingHeader;
            continue;
        }
        if is_blank(row) {
            continue;
        }
        match state {
            State::SeekingMarker => {
                preamble += 1;
                // Held as an implicit section in case no marker ever appears
                let implicit = pending.get_or_insert_with(|| Pending::new(None));
                if implicit.header.is_none() {
                    implicit.header = Some(header_names(row));
                } else {
                    implicit.rows.push(row.to_vec());
                }
            }
            State::ReadingHeader => {
                if let Some(section) = pending.as_mut() {
                    section.header = Some(header_names(row));
                }
                state = State::ReadingRows;
            }
            State::ReadingRows => {
                if let Some(section) = pending.as_mut() {
                    section.rows.push(row.to_vec());
                }
            }
        }
    }
    if let Some(section) = pending.take() {
        finished.push(section);
    }

    if has_marker {
        if preamble > 0 {
            debug!("Ignored {} preamble rows above the first section of '{}'", preamble, sheet.name());
        }
        finished.retain(|section| section.title.is_some());
    } else if finished.is_empty() {
        finished.push(Pending::new(None));
    }
    debug!("Sheet '{}' has {} sections", sheet.name(), finished.len());

    let sections = finished
        .into_iter()
        .map(|section| section.finish(sheet.name(), key_columns))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Sections {
        sheet: sheet.name().to_owned(),
        sections,
    })
}

/// The header of a loaded sheet as a row of cells. Generated names stand
/// for blank cells and read back as nulls.
fn header_row(sheet: &Table) -> Vec<Value> {
    sheet
        .column_names()
        .into_iter()
        .enumerate()
        .map(|(index, name)| if name == column_name(index) { Value::Null } else { Value::text(name) })
        .collect()
}

/// Column names from a header row, with trailing blank cells dropped.
fn header_names(row: &[Value]) -> Vec<String> {
    let width = row.iter().rposition(|value| !value.is_null()).map(|index| index + 1).unwrap_or(0);
    row[..width]
        .iter()
        .enumerate()
        .map(|(index, value)| match value.as_text().trim() {
            "" => column_name(index),
            name => name.to_owned(),
        })
        .collect()
}

fn is_blank(row: &[Value]) -> bool {
    row.iter().all(|value| match value {
        Value::Null => true,
        Value::Text(text) => text.trim().is_empty(),
        _ => false,
    })
}
