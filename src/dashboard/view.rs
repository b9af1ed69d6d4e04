use crate::table::Table;
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    /// Horizontal bars ordered by value
    RankedBar,
}

/// A chart drawn from the columns of a view's table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    /// Column on the category or time axis
    pub x: String,
    /// One column per plotted series
    pub y: Vec<String>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: &str, x: &str, y: &[&str]) -> Self {
        ChartSpec {
            kind,
            title: title.to_owned(),
            x: x.to_owned(),
            y: y.iter().map(|column| column.to_string()).collect(),
        }
    }
}

/// One displayable table with its optional chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct View {
    pub id: String,
    pub title: String,
    pub table: Table,
    pub chart: Option<ChartSpec>,
}

impl View {
    /// True when there is nothing to show, e.g. a date filter matched no row
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Display title of a sheet name: `Wrong_Dockets` becomes `Wrong Dockets`.
/// Each word is capitalised and the rest of it lower-cased.
pub fn title(name: &str) -> String {
    name.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut characters = word.chars();
            match characters.next() {
                Some(first) => first.to_uppercase().chain(characters.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// URL-safe identifier of a name: `Wrong Dockets` becomes `wrong_dockets`.
pub fn slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|character| if character.is_alphanumeric() { character } else { '_' })
        .collect()
}
