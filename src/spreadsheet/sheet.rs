use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::reference::MAX_COLUMNS;
use crate::spreadsheet::reference::MAX_ROWS;
use crate::spreadsheet::LoadError;
use crate::table::Table;
use crate::table::Value;
use log::debug;
use log::warn;

/// Largest used range laid out as a dense grid
const MAX_GRID_CELLS: usize = 10_000_000;

/// Cells collected from one worksheet, with the bounds of its used range.
pub(crate) struct Sheet {
    /// Source workbook name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// All non-empty cells in document order
    pub(crate) cells: Vec<Cell>,
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(super) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    /// Adds a cell to the sheet, widening the used range. Cells past the
    /// last worksheet row or column are rejected.
    pub(super) fn push(&mut self, cell: Cell) -> Result<(), LoadError> {
        if cell.row >= MAX_ROWS || cell.col >= MAX_COLUMNS {
            return Err(LoadError::CellReference {
                file: self.file_name.to_owned(),
                sheet: self.name.to_owned(),
                reference: cell.reference(),
            });
        }
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
        Ok(())
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|row_lower_bound| row < row_lower_bound).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|row_upper_bound| row_upper_bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|col_lower_bound| col < col_lower_bound).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|col_upper_bound| col_upper_bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Lays the cells out as a dense grid over the used range. Blank rows
    /// inside the range are kept as all-null rows.
    fn grid(&self, criteria: &Criteria, shared_strings: &[String]) -> Result<Vec<Vec<Value>>, LoadError> {
        let (row_lower, row_upper, col_lower, col_upper) = match (
            self.row_lower_bound,
            self.row_upper_bound,
            self.col_lower_bound,
            self.col_upper_bound,
        ) {
            (Some(row_lower), Some(row_upper), Some(col_lower), Some(col_upper)) => {
                (row_lower, row_upper, col_lower, col_upper)
            }
            _ => return Ok(Vec::new()),
        };

        let width = col_upper - col_lower + 1;
        let height = row_upper - row_lower + 1;
        if height.saturating_mul(width) > MAX_GRID_CELLS {
            return Err(LoadError::SheetTooLarge {
                file: self.file_name.to_owned(),
                sheet: self.name.to_owned(),
                rows: height,
                columns: width,
            });
        }
        let mut grid = vec![vec![Value::Null; width]; height];
        for cell in &self.cells {
            let value = match cell.to_value(shared_strings) {
                Ok(Value::Text(text)) if criteria.is_null(&text) => Value::Null,
                Ok(value) => value,
                Err(message) if criteria.error_as_null => {
                    warn!("{}!{}: {}, read as null", self.name, cell.reference(), message);
                    Value::Null
                }
                Err(_) => Err(LoadError::CellValue {
                    file: self.file_name.to_owned(),
                    sheet: self.name.to_owned(),
                    reference: cell.reference(),
                    value: cell.value.to_owned(),
                })?,
            };
            grid[cell.row - row_lower][cell.col - col_lower] = value;
        }

        if criteria.skip_empty_rows {
            grid.retain(|row| row.iter().any(|value| !value.is_null()));
        }
        Ok(grid)
    }

    /// Converts the sheet to a table.
    ///
    /// The first row of the used range is the header unless the sheet is
    /// marked headerless. Blank header cells get a generated `column{n}` name.
    pub(super) fn into_table(self, criteria: &Criteria, shared_strings: &[String]) -> Result<Table, LoadError> {
        let mut grid = self.grid(criteria, shared_strings)?;
        let width = grid.first().map(Vec::len).unwrap_or(0);
        let header: Vec<String> = if criteria.has_header(&self.name) && !grid.is_empty() {
            grid.remove(0)
                .into_iter()
                .enumerate()
                .map(|(index, value)| match value.as_text().trim() {
                    "" => column_name(index),
                    name => name.to_owned(),
                })
                .collect()
        } else {
            (0..width).map(column_name).collect()
        };
        let table = Table::from_records(self.name, header, grid);
        debug!(
            "Sheet '{}': {} rows, columns [{}]",
            table.name(),
            table.len(),
            table
                .columns()
                .iter()
                .map(|column| format!("{} {}", column.name, column.kind.as_str()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(table)
    }
}

/// Generated name of the column at a 0-based index
pub(crate) fn column_name(index: usize) -> String {
    format!("column{}", index + 1)
}
