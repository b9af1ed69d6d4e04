use crate::metrics::numeric_kind;
use crate::table::Column;
use crate::table::ColumnType;
use crate::table::SchemaError;
use crate::table::Table;
use crate::table::Value;

/// Fewest series a multi-line trend is drawn with
pub const MIN_SERIES: usize = 2;

/// Orders rows by `date_column` and keeps every series value as is, one row
/// per source row. Unlike [`daily_trend`](crate::metrics::daily_trend),
/// repeated dates stay separate rows. Rows without a date are dropped.
///
/// Fails with [`SchemaError::SeriesCount`] for fewer than [`MIN_SERIES`]
/// series.
pub fn multi_series_trend<S: AsRef<str>>(table: &Table, date_column: &str, series: &[S]) -> Result<Table, SchemaError> {
    if series.len() < MIN_SERIES {
        return Err(SchemaError::SeriesCount {
            table: table.name().to_owned(),
            minimum: MIN_SERIES,
            actual: series.len(),
        });
    }
    let date_index = table.require_temporal(date_column)?;
    let series_indexes = series
        .iter()
        .map(|name| table.require_numeric(name.as_ref()))
        .collect::<Result<Vec<usize>, SchemaError>>()?;

    let mut rows: Vec<(chrono::NaiveDate, Vec<Value>)> = table
        .rows()
        .iter()
        .filter_map(|row| {
            let date = row[date_index].as_date()?;
            let mut values = Vec::with_capacity(series_indexes.len() + 1);
            values.push(Value::Date(date));
            values.extend(series_indexes.iter().map(|index| row[*index].clone()));
            Some((date, values))
        })
        .collect();
    rows.sort_by_key(|(date, _)| *date);
    let rows: Vec<Vec<Value>> = rows.into_iter().map(|(_, values)| values).collect();

    let mut columns = vec![Column::new(date_column, ColumnType::Date)];
    for (position, name) in series.iter().enumerate() {
        let kind = numeric_kind(rows.iter().map(|row| &row[position + 1]));
        columns.push(Column::new(name.as_ref(), kind));
    }
    Ok(Table::new(format!("{}_trend", table.name()), columns, rows))
}
