use crate::metrics::DateRange;
use crate::metrics::Total;
use crate::table::Column;
use crate::table::ColumnType;
use crate::table::SchemaError;
use crate::table::Table;
use crate::table::Value;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Sums `value_column` per calendar day of `date_column`.
///
/// Returns `{date, total}` sorted ascending with one row per day; repeated
/// dates are summed. Rows with a null date or value are skipped. With a
/// range, only days inside it (inclusive) are kept, which may leave the
/// result empty.
pub fn daily_trend(
    table: &Table,
    date_column: &str,
    value_column: &str,
    range: Option<DateRange>,
) -> Result<Table, SchemaError> {
    let date_index = table.require_temporal(date_column)?;
    let value_index = table.require_numeric(value_column)?;

    let mut totals = BTreeMap::<NaiveDate, Total>::new();
    for row in table.rows() {
        let (date, value) = match (row[date_index].as_date(), &row[value_index]) {
            (Some(date), value) if value.is_numeric() => (date, value),
            _ => continue,
        };
        if range.map(|range| range.contains(date)).unwrap_or(true) {
            let total = totals.entry(date).or_default();
            *total = total.add(value);
        }
    }

    let kind = if totals.values().any(Total::is_float) || table.columns()[value_index].kind == ColumnType::Float {
        ColumnType::Float
    } else {
        ColumnType::Integer
    };
    let columns = vec![Column::new("date", ColumnType::Date), Column::new("total", kind)];
    let rows = totals
        .into_iter()
        .map(|(date, total)| vec![Value::Date(date), total.into()])
        .collect();
    Ok(Table::new(format!("{}_daily_trend", table.name()), columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn dockets() -> Table {
        Table::from_records(
            "Daywise_Report",
            vec!["createdOn".into(), "docketCount".into()],
            vec![
                vec![day(2).into(), 4i64.into()],
                vec![day(1).into(), 3i64.into()],
                vec![day(1).into(), 5i64.into()],
                vec![Value::Null, 9i64.into()],
                vec![day(3).into(), Value::Null],
            ],
        )
    }

    fn totals(table: &Table) -> Vec<(Value, Value)> {
        table.rows().iter().map(|row| (row[0].clone(), row[1].clone())).collect()
    }

    #[test]
    fn merges_duplicate_dates_in_ascending_order() {
        let trend = daily_trend(&dockets(), "createdOn", "docketCount", None).unwrap();
        assert_eq!(trend.column_names(), vec!["date", "total"]);
        assert_eq!(trend.columns()[1].kind, ColumnType::Integer);
        assert_eq!(
            totals(&trend),
            vec![(day(1).into(), Value::Int(8)), (day(2).into(), Value::Int(4))]
        );
    }

    #[test]
    fn filters_by_inclusive_range() {
        let range = DateRange::new(day(2), day(3));
        let trend = daily_trend(&dockets(), "createdOn", "docketCount", Some(range)).unwrap();
        assert_eq!(totals(&trend), vec![(day(2).into(), Value::Int(4))]);
    }

    #[test]
    fn inverted_or_disjoint_ranges_are_empty_not_errors() {
        let inverted = DateRange::new(day(3), day(1));
        assert!(daily_trend(&dockets(), "createdOn", "docketCount", Some(inverted)).unwrap().is_empty());
        let later = DateRange::new(day(20), day(31));
        assert!(daily_trend(&dockets(), "createdOn", "docketCount", Some(later)).unwrap().is_empty());
    }

    #[test]
    fn accepts_iso_text_dates_and_timestamps() {
        let table = Table::from_records(
            "Daywise_Report",
            vec!["createdOn".into(), "docketCount".into()],
            vec![
                vec![Value::text("2024-01-01"), 1.5.into()],
                vec![Value::DateTime(day(1).and_hms_opt(17, 30, 0).unwrap()), 2i64.into()],
            ],
        );
        let trend = daily_trend(&table, "createdOn", "docketCount", None).unwrap();
        assert_eq!(totals(&trend), vec![(day(1).into(), Value::Float(3.5))]);
    }

    #[test]
    fn missing_columns_are_schema_errors() {
        let error = daily_trend(&dockets(), "createdOn", "count", None).unwrap_err();
        assert_eq!(
            error,
            SchemaError::MissingColumn {
                table: "Daywise_Report".into(),
                column: "count".into()
            }
        );
        let error = daily_trend(&dockets(), "docketCount", "docketCount", None).unwrap_err();
        assert!(matches!(error, SchemaError::ColumnType { expected: "date", .. }));
    }
}
