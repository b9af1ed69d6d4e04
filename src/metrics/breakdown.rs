use crate::metrics::numeric_kind;
use crate::table::Column;
use crate::table::ColumnType;
use crate::table::SchemaError;
use crate::table::Table;
use crate::table::Value;
use std::cmp::Ordering;

/// Projects a pre-aggregated sub-table to its category and count columns,
/// drops rows missing either, and orders by descending count. Equal counts
/// keep their source order.
pub fn category_breakdown(table: &Table, category_column: &str, count_column: &str) -> Result<Table, SchemaError> {
    let category_index = table.require(category_column)?;
    let count_index = table.require_numeric(count_column)?;

    let mut rows: Vec<Vec<Value>> = table
        .rows()
        .iter()
        .filter(|row| !row[category_index].is_null() && row[count_index].is_numeric())
        .map(|row| vec![row[category_index].clone(), row[count_index].clone()])
        .collect();
    rows.sort_by(|a, b| {
        let (a, b) = (a[1].as_f64().unwrap_or(0.0), b[1].as_f64().unwrap_or(0.0));
        b.partial_cmp(&a).unwrap_or(Ordering::Equal)
    });

    let category_kind = ColumnType::detect(rows.iter().map(|row| &row[0]));
    let count_kind = numeric_kind(rows.iter().map(|row| &row[1]));
    let columns = vec![
        Column::new(category_column, category_kind),
        Column::new(count_column, count_kind),
    ];
    Ok(Table::new(table.name(), columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Table {
        Table::from_records(
            "Breakdown by Category",
            vec!["category".into(), "count".into(), "share".into()],
            vec![
                vec!["Billing".into(), 5i64.into(), 0.25.into()],
                vec!["Network".into(), 9i64.into()],
                vec![Value::Null, 40i64.into()],
                vec!["Porting".into(), Value::Null],
                vec!["Roaming".into(), 5i64.into()],
            ],
        )
    }

    #[test]
    fn sorts_by_descending_count_and_drops_incomplete_rows() {
        let breakdown = category_breakdown(&categories(), "category", "count").unwrap();
        assert_eq!(breakdown.name(), "Breakdown by Category");
        assert_eq!(breakdown.column_names(), vec!["category", "count"]);
        let labels: Vec<String> = breakdown.column(0).map(|value| value.to_string()).collect();
        assert_eq!(labels, vec!["Network", "Billing", "Roaming"]);
        assert_eq!(breakdown.columns()[1].kind, ColumnType::Integer);
    }

    #[test]
    fn requires_both_columns() {
        assert_eq!(category_breakdown(&categories(), "region", "count").unwrap_err().column(), Some("region"));
        assert_eq!(category_breakdown(&categories(), "category", "total").unwrap_err().column(), Some("total"));
        assert!(matches!(
            category_breakdown(&categories(), "count", "category"),
            Err(SchemaError::ColumnType { .. })
        ));
    }

    #[test]
    fn empty_input_keeps_the_schema() {
        let empty = Table::from_records("Breakdown by Region", vec!["region".into(), "count".into()], vec![]);
        let breakdown = category_breakdown(&empty, "region", "count").unwrap();
        assert!(breakdown.is_empty());
        assert_eq!(breakdown.column_names(), vec!["region", "count"]);
    }
}
