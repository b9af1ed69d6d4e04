//! Headline KPIs.
//!
//! Unlike the aggregators, KPI computation tolerates partial workbooks: any
//! source that is missing or unusable contributes zero, so the summary row is
//! always complete.
use crate::metrics::Total;
use crate::sections::parse_sections;
use crate::sections::title_marker;
use crate::spreadsheet::Workbook;
use crate::table::Table;
use log::debug;
use log::warn;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;

/// How a KPI reduces its source sheet to one number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reduction", rename_all = "snake_case")]
pub enum Reduction {
    /// Sum of a numeric column. On a sectioned sheet, the first section
    /// carrying the column is summed.
    Sum { column: String },
    /// Number of data rows
    RowCount,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KpiDefinition {
    pub label: String,
    pub sheet: String,
    #[serde(flatten)]
    pub reduction: Reduction,
}

impl KpiDefinition {
    pub fn sum(label: &str, sheet: &str, column: &str) -> Self {
        KpiDefinition {
            label: label.to_owned(),
            sheet: sheet.to_owned(),
            reduction: Reduction::Sum {
                column: column.to_owned(),
            },
        }
    }

    pub fn row_count(label: &str, sheet: &str) -> Self {
        KpiDefinition {
            label: label.to_owned(),
            sheet: sheet.to_owned(),
            reduction: Reduction::RowCount,
        }
    }
}

/// The CRM report's headline figures, in display order.
pub fn default_kpis() -> Vec<KpiDefinition> {
    vec![
        KpiDefinition::sum("Total Dockets", "Daywise_Report", "docketCount"),
        KpiDefinition::sum("Total Complaints", "Complaint_Breakdown", "count"),
        KpiDefinition::row_count("Wrong Complaints", "Wrong_Complaints"),
        KpiDefinition::row_count("Invalid Recharge Tagging", "Invalid_Recharge_Tagging"),
        KpiDefinition::row_count("Reassigned Complaints", "Reassigned_Complaints"),
        KpiDefinition::row_count("Wrong Dockets", "Wrong_Dockets"),
    ]
}

/// A labelled headline value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Kpi {
    pub label: String,
    pub value: Total,
}

impl Display for Kpi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// Computes every KPI in definition order. Never fails.
///
/// `marker` recognises section markers for sums over sectioned sheets.
pub fn build_kpis(workbook: &Workbook, definitions: &[KpiDefinition], marker: &Regex) -> Vec<Kpi> {
    definitions
        .iter()
        .map(|definition| Kpi {
            label: definition.label.to_owned(),
            value: evaluate(workbook, definition, marker),
        })
        .collect()
}

fn evaluate(workbook: &Workbook, definition: &KpiDefinition, marker: &Regex) -> Total {
    let sheet = match workbook.sheet(&definition.sheet) {
        Some(sheet) => sheet,
        None => {
            warn!("KPI '{}': sheet '{}' is missing, using 0", definition.label, definition.sheet);
            return Total::default();
        }
    };
    match &definition.reduction {
        Reduction::RowCount => Total::Integer(sheet.len() as i64),
        Reduction::Sum { column } => match sum(sheet, column) {
            Some(total) => total,
            None => match section_sum(sheet, column, marker) {
                Some(total) => total,
                None => {
                    warn!(
                        "KPI '{}': sheet '{}' has no numeric column '{}', using 0",
                        definition.label, definition.sheet, column
                    );
                    Total::default()
                }
            },
        },
    }
}

fn sum(table: &Table, column: &str) -> Option<Total> {
    let index = table.require_numeric(column).ok()?;
    Some(table.column(index).fold(Total::default(), Total::add))
}

fn section_sum(sheet: &Table, column: &str, marker: &Regex) -> Option<Total> {
    let sections = parse_sections(sheet, title_marker(marker), &[]).ok()?;
    let section = sections.iter().find(|section| section.table.column_index(column).is_some())?;
    debug!("Summing '{}' of section {:?} in '{}'", column, section.title, sheet.name());
    sum(&section.table, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn flat(name: &str, header: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table::from_records(name, header.iter().map(|title| title.to_string()).collect(), rows)
    }

    fn marker() -> Regex {
        Regex::new("(?i)breakdown by").unwrap()
    }

    fn workbook() -> Workbook {
        Workbook::from_tables(
            "CRM_Analysis_Report.xlsx",
            vec![
                flat(
                    "Daywise_Report",
                    &["createdOn", "docketCount"],
                    vec![
                        vec![Value::text("2024-01-01"), 1200i64.into()],
                        vec![Value::text("2024-01-02"), 345i64.into()],
                    ],
                ),
                flat(
                    "Complaint_Breakdown",
                    &["Breakdown by Category", "column2"],
                    vec![
                        vec!["category".into(), "count".into()],
                        vec!["Billing".into(), 7i64.into()],
                        vec!["Network".into(), 5i64.into()],
                        vec!["Breakdown by Region".into()],
                        vec!["region".into(), "count".into()],
                        vec!["North".into(), 12i64.into()],
                    ],
                ),
                flat("Wrong_Complaints", &["actor"], vec![vec!["A".into()], vec!["B".into()]]),
                flat("Invalid_Recharge_Tagging", &["actor"], vec![]),
                flat("Wrong_Dockets", &["actor"], vec![vec!["A".into()]]),
            ],
        )
    }

    #[test]
    fn computes_the_default_summary() {
        let kpis = build_kpis(&workbook(), &default_kpis(), &marker());
        let summary: Vec<String> = kpis.iter().map(ToString::to_string).collect();
        assert_eq!(
            summary,
            vec![
                "Total Dockets: 1,545",
                "Total Complaints: 12",
                "Wrong Complaints: 2",
                "Invalid Recharge Tagging: 0",
                "Reassigned Complaints: 0",
                "Wrong Dockets: 1",
            ]
        );
    }

    #[test]
    fn missing_sheet_counts_as_zero() {
        let kpis = build_kpis(&workbook(), &default_kpis(), &marker());
        let reassigned = kpis.iter().find(|kpi| kpi.label == "Reassigned Complaints").unwrap();
        assert_eq!(reassigned.value, Total::Integer(0));
        assert!(build_kpis(&Workbook::default(), &default_kpis(), &marker())
            .iter()
            .all(|kpi| kpi.value == Total::Integer(0)));
    }

    #[test]
    fn unusable_column_counts_as_zero() {
        let definitions = [
            KpiDefinition::sum("Missing", "Daywise_Report", "count"),
            KpiDefinition::sum("Text", "Daywise_Report", "createdOn"),
        ];
        let kpis = build_kpis(&workbook(), &definitions, &marker());
        assert_eq!(kpis[0].value, Total::Integer(0));
        assert_eq!(kpis[1].value, Total::Integer(0));
    }

    #[test]
    fn definitions_deserialize_from_tagged_json() {
        let json = r#"[
            {"label": "Total Dockets", "sheet": "Daywise_Report", "reduction": "sum", "column": "docketCount"},
            {"label": "Wrong Dockets", "sheet": "Wrong_Dockets", "reduction": "row_count"}
        ]"#;
        let definitions: Vec<KpiDefinition> = serde_json::from_str(json).unwrap();
        assert_eq!(definitions, vec![default_kpis()[0].clone(), default_kpis()[5].clone()]);
    }
}
