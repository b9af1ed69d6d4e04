use crate::table::Column;
use crate::table::ColumnType;
use crate::table::SchemaError;
use crate::table::Table;
use crate::table::Value;
use std::collections::HashMap;

/// Number of actors ranked when no limit is configured
pub const DEFAULT_TOP_N: usize = 10;

/// Counts rows per distinct value of `actor_column` and returns the `n` most
/// frequent as `{actor, count}`. Equal counts are ordered by the actor's
/// first appearance in the source. Null actors are not counted.
pub fn top_n(table: &Table, actor_column: &str, n: usize) -> Result<Table, SchemaError> {
    let actor_index = table.require(actor_column)?;

    let mut positions = HashMap::<String, usize>::new();
    let mut counts = Vec::<(String, i64)>::new();
    for value in table.column(actor_index).filter(|value| !value.is_null()) {
        let actor = value.as_text();
        match positions.get(&*actor) {
            Some(position) => counts[*position].1 += 1,
            None => {
                positions.insert(actor.to_string(), counts.len());
                counts.push((actor.into_owned(), 1));
            }
        }
    }
    // Stable, so ties keep first-appearance order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);

    let columns = vec![
        Column::new("actor", ColumnType::Text),
        Column::new("count", ColumnType::Integer),
    ];
    let rows = counts
        .into_iter()
        .map(|(actor, count)| vec![Value::Text(actor), Value::Int(count)])
        .collect();
    Ok(Table::new(format!("{}_top_{}", table.name(), n), columns, rows))
}
