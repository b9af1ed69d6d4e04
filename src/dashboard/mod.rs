//! # Dashboard
//!
//! Per-view computations over a loaded workbook. Every view is computed on
//! request from the shared, read-only [`Workbook`] and owns its result, so a
//! [`Dashboard`] can serve concurrent callers without locking. A failing view
//! reports its own error and leaves the KPIs and other views usable.
//!
//! View identifiers:
//!
//! | id                      | content                                   |
//! |-------------------------|-------------------------------------------|
//! | `<sheet slug>`          | the sheet as loaded, no chart             |
//! | `daily_trend`           | daily totals, line chart                  |
//! | `breakdown_<n>`         | n-th breakdown section, bar chart         |
//! | `repeat_calls`          | repeat-call series, multi-line chart      |
//! | `top_<sheet slug>`      | top offenders of an exception sheet       |
pub mod view;

pub use view::slug;
pub use view::title;
pub use view::ChartKind;
pub use view::ChartSpec;
pub use view::View;

use crate::config::ConfigError;
use crate::config::DashboardConfig;
use crate::error::ReportError;
use crate::export;
use crate::kpi::build_kpis;
use crate::kpi::Kpi;
use crate::metrics;
use crate::metrics::DateRange;
use crate::sections::parse_sections;
use crate::sections::title_marker;
use crate::sections::KeyColumn;
use crate::sections::Section;
use crate::sections::Sections;
use crate::spreadsheet::Workbook;
use crate::table::SchemaError;
use crate::table::Table;
use chrono::NaiveDate;
use log::warn;
use regex::Regex;
use std::sync::Arc;

pub const DAILY_TREND: &str = "daily_trend";
pub const REPEAT_CALLS: &str = "repeat_calls";
const BREAKDOWN_PREFIX: &str = "breakdown_";
const TOP_PREFIX: &str = "top_";

/// A CSV download: file name and content.
#[derive(Clone, Debug, PartialEq)]
pub struct Export {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A navigation target.
#[derive(Clone, Debug, PartialEq)]
pub enum Page {
    /// `/`: KPIs and the daily trend
    Home,
    /// One sheet, by its name in the workbook
    Sheet(String),
}

#[derive(Clone, Debug)]
pub struct Dashboard {
    workbook: Arc<Workbook>,
    config: DashboardConfig,
    marker: Regex,
}

impl Dashboard {
    pub fn new(workbook: Arc<Workbook>, config: DashboardConfig) -> Result<Self, ConfigError> {
        let marker = config.marker()?;
        Ok(Dashboard {
            workbook,
            config,
            marker,
        })
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    fn sheet(&self, name: &str) -> Result<&Table, ReportError> {
        self.workbook
            .sheet(name)
            .ok_or_else(|| ReportError::UnknownTable(name.to_owned()))
    }

    /// Headline KPIs; missing sources count as zero.
    pub fn kpis(&self) -> Vec<Kpi> {
        build_kpis(&self.workbook, &self.config.kpis, &self.marker)
    }

    /// Default filter of the daily trend: the first and last day of the
    /// daily sheet. `None` when the sheet is absent or has no date.
    pub fn date_bounds(&self) -> Option<DateRange> {
        let daily = &self.config.daily;
        let sheet = self.workbook.sheet(&daily.sheet)?;
        match metrics::date_bounds(sheet, &daily.date_column) {
            Ok(bounds) => bounds,
            Err(error) => {
                warn!("No date bounds for '{}': {}", daily.sheet, error);
                None
            }
        }
    }

    /// A sheet as loaded.
    pub fn sheet_view(&self, name: &str) -> Result<View, ReportError> {
        let table = self.sheet(name)?;
        Ok(View {
            id: slug(name),
            title: title(name),
            table: table.clone(),
            chart: None,
        })
    }

    /// Daily totals between `from` and `to`, or within
    /// [`date_bounds`](Self::date_bounds) when neither end is given. A range
    /// with one end missing selects nothing. An empty table is the "no data"
    /// state.
    pub fn daily_trend_view(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<View, ReportError> {
        let daily = &self.config.daily;
        let sheet = self.sheet(&daily.sheet)?;
        let range = match (from, to) {
            (None, None) => self.date_bounds(),
            (Some(from), Some(to)) => Some(DateRange::new(from, to)),
            _ => None,
        };
        let mut table = metrics::daily_trend(sheet, &daily.date_column, &daily.value_column, range)?;
        if range.is_none() && (from.is_some() || to.is_some()) {
            table = Table::new(table.name(), table.columns().to_vec(), Vec::new());
        }
        let heading = format!("Daily {} Trend", title(&daily.value_column));
        Ok(View {
            id: DAILY_TREND.to_string(),
            title: heading.clone(),
            table: table.renamed(DAILY_TREND),
            chart: Some(ChartSpec::new(ChartKind::Line, &heading, "date", &["total"])),
        })
    }

    fn sections(&self) -> Result<Sections, ReportError> {
        let sheet = self.sheet(&self.config.breakdown.sheet)?;
        Ok(parse_sections(sheet, title_marker(&self.marker), &[KeyColumn::Position(0)])?)
    }

    fn section_view(&self, index: usize, section: &Section) -> Result<View, ReportError> {
        let id = format!("{BREAKDOWN_PREFIX}{}", index + 1);
        let heading = match &section.title {
            Some(heading) => heading.to_owned(),
            None => title(&self.config.breakdown.sheet),
        };
        if section.table.width() == 0 {
            return Ok(View {
                table: section.table.clone().renamed(id.as_str()),
                chart: None,
                id,
                title: heading,
            });
        }
        let count_column = &self.config.breakdown.count_column;
        let category_column = section
            .table
            .columns()
            .iter()
            .map(|column| column.name.as_str())
            .find(|name| name != count_column)
            .ok_or_else(|| SchemaError::MissingColumn {
                table: section.table.name().to_owned(),
                column: "category".to_owned(),
            })?;
        let table = metrics::category_breakdown(&section.table, category_column, count_column)?;
        Ok(View {
            table: table.renamed(id.as_str()),
            chart: Some(ChartSpec::new(ChartKind::Bar, &heading, category_column, &[count_column.as_str()])),
            id,
            title: heading,
        })
    }

    /// One view per section of the breakdown sheet, in sheet order. Each
    /// section succeeds or fails on its own; the outer error is for a
    /// missing or unparseable breakdown sheet.
    pub fn breakdown_views(&self) -> Result<Vec<Result<View, ReportError>>, ReportError> {
        let sections = self.sections()?;
        Ok(sections
            .iter()
            .enumerate()
            .map(|(index, section)| self.section_view(index, section))
            .collect())
    }

    /// The first breakdown section titled `heading`.
    pub fn breakdown_view(&self, heading: &str) -> Result<View, ReportError> {
        let sections = self.sections()?;
        let (index, section) = sections.find_position(heading)?;
        self.section_view(index, section)
    }

    /// Repeat-call series over time, duplicates kept.
    pub fn repeat_calls_view(&self) -> Result<View, ReportError> {
        let calls = &self.config.repeat_calls;
        let sheet = self.sheet(&calls.sheet)?;
        let table = metrics::multi_series_trend(sheet, &calls.date_column, &calls.series)?;
        let series: Vec<&str> = calls.series.iter().map(String::as_str).collect();
        let heading = title(&calls.sheet);
        Ok(View {
            id: REPEAT_CALLS.to_string(),
            title: heading.clone(),
            table: table.renamed(REPEAT_CALLS),
            chart: Some(ChartSpec::new(ChartKind::Line, &heading, &calls.date_column, &series)),
        })
    }

    /// Most frequent actors of an exception sheet, `n` defaulting to the
    /// configured limit.
    pub fn top_offenders_view(&self, sheet_name: &str, n: Option<usize>) -> Result<View, ReportError> {
        let exceptions = &self.config.exceptions;
        let sheet = self.sheet(sheet_name)?;
        let n = n.unwrap_or(exceptions.top_n);
        let table = metrics::top_n(sheet, &exceptions.actor_column, n)?;
        let id = format!("{TOP_PREFIX}{}", slug(sheet_name));
        let heading = format!("Top {} Offenders: {}", n, title(sheet_name));
        Ok(View {
            table: table.renamed(id.as_str()),
            chart: Some(ChartSpec::new(ChartKind::RankedBar, &heading, "actor", &["count"])),
            id,
            title: heading,
        })
    }

    /// Identifiers of every view available for the loaded workbook.
    pub fn view_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.workbook.sheet_names().into_iter().map(slug).collect();
        if self.workbook.contains(&self.config.daily.sheet) {
            ids.push(DAILY_TREND.to_string());
        }
        if self.workbook.contains(&self.config.breakdown.sheet) {
            match self.sections() {
                Ok(sections) => ids.extend((1..=sections.len()).map(|n| format!("{BREAKDOWN_PREFIX}{n}"))),
                Err(error) => warn!("Breakdown sheet unusable: {}", error),
            }
        }
        if self.workbook.contains(&self.config.repeat_calls.sheet) {
            ids.push(REPEAT_CALLS.to_string());
        }
        for sheet in &self.config.exceptions.sheets {
            if self.workbook.contains(sheet) {
                ids.push(format!("{TOP_PREFIX}{}", slug(sheet)));
            }
        }
        ids
    }

    /// Computes a view by identifier.
    pub fn view(&self, id: &str) -> Result<View, ReportError> {
        if let Some(name) = self.sheet_by_slug(id) {
            return self.sheet_view(name);
        }
        match id {
            DAILY_TREND => self.daily_trend_view(None, None),
            REPEAT_CALLS => self.repeat_calls_view(),
            _ => {
                if let Some(position) = id.strip_prefix(BREAKDOWN_PREFIX).and_then(|n| n.parse::<usize>().ok()) {
                    let sections = self.sections()?;
                    if let Some(section) = position.checked_sub(1).and_then(|index| sections.get(index)) {
                        return self.section_view(position - 1, section);
                    }
                } else if let Some(sheet_slug) = id.strip_prefix(TOP_PREFIX) {
                    let sheet = self
                        .config
                        .exceptions
                        .sheets
                        .iter()
                        .find(|sheet| slug(sheet) == sheet_slug);
                    if let Some(sheet) = sheet {
                        return self.top_offenders_view(sheet, None);
                    }
                }
                Err(ReportError::UnknownView(id.to_owned()))
            }
        }
    }

    fn sheet_by_slug(&self, id: &str) -> Option<&str> {
        self.workbook.sheet_names().into_iter().find(|name| slug(name) == id)
    }

    /// CSV of a sheet (by exact name) or of a view (by id), named
    /// `<table-name>.csv`.
    pub fn export(&self, id: &str) -> Result<Export, ReportError> {
        let view;
        let table = match self.workbook.sheet(id) {
            Some(sheet) => sheet,
            None => {
                view = self.view(id)?;
                &view.table
            }
        };
        Ok(Export {
            file_name: export::file_name(table),
            bytes: export::to_csv(table)?,
        })
    }

    /// Maps a request path to a page: `/` is home, `/<sheet>` a sheet page.
    /// Sheet names match ignoring case, with `_` and spaces equivalent.
    pub fn resolve_path(&self, path: &str) -> Option<Page> {
        let requested = path.strip_prefix('/').unwrap_or(path);
        if requested.is_empty() {
            return Some(Page::Home);
        }
        let requested = normalize(requested);
        self.workbook
            .sheet_names()
            .into_iter()
            .find(|name| normalize(name) == requested)
            .map(|name| Page::Sheet(name.to_owned()))
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase().replace('_', " ").trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Total;
    use crate::spreadsheet::Criteria;
    use crate::table::Value;
    use crate::test_fixtures::WorkbookBuilder;
    use chrono::NaiveDate;

    fn report() -> Vec<u8> {
        WorkbookBuilder::new()
            .sheet(
                "Daywise_Report",
                &[
                    &["createdOn", "docketCount"],
                    &["@45292", "3"],
                    &["@45292", "5"],
                    &["@45294", "1200"],
                    &["@45293", "2"],
                ],
            )
            .sheet(
                "Complaint_Breakdown",
                &[
                    &["Breakdown by Category"],
                    &["category", "count"],
                    &["Billing", "7"],
                    &["Network", "11"],
                    &[],
                    &["Breakdown by Region"],
                    &["region", "count"],
                    &["North", "18"],
                ],
            )
            .sheet(
                "Repeat_Call_Analysis",
                &[&["date", "totalCalls", "repeatCalls"], &["@45293", "40", "6"], &["@45292", "30", "4"]],
            )
            .sheet("Wrong_Complaints", &[&["actor"], &["Smith, J."], &["Asha"], &["Smith, J."]])
            .sheet("Wrong_Dockets", &[&["actor", "docket"], &["Ravi", "D-1"]])
            .build()
    }

    fn dashboard() -> Dashboard {
        let workbook = Workbook::from_bytes("CRM_Analysis_Report.xlsx", report(), &Criteria::default()).unwrap();
        Dashboard::new(Arc::new(workbook), DashboardConfig::default()).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn computes_kpis_from_a_loaded_workbook() {
        let values: Vec<Total> = dashboard().kpis().into_iter().map(|kpi| kpi.value).collect();
        assert_eq!(
            values,
            vec![
                Total::Integer(1210),
                Total::Integer(18),
                Total::Integer(3),
                Total::Integer(0),
                Total::Integer(0),
                Total::Integer(1)
            ]
        );
    }

    #[test]
    fn daily_trend_defaults_to_the_full_date_range() {
        let dashboard = dashboard();
        assert_eq!(dashboard.date_bounds(), Some(DateRange::new(day(1), day(3))));
        let view = dashboard.daily_trend_view(None, None).unwrap();
        assert_eq!(view.id, "daily_trend");
        assert_eq!(view.title, "Daily Docketcount Trend");
        assert_eq!(view.table.len(), 3);
        assert_eq!(view.table.value(0, 1), Some(&Value::Int(8)));
        assert_eq!(view.chart.unwrap().kind, ChartKind::Line);

        let empty = dashboard.daily_trend_view(Some(day(3)), Some(day(1))).unwrap();
        assert!(empty.is_empty());
        let second = dashboard.daily_trend_view(Some(day(2)), Some(day(3))).unwrap();
        assert_eq!(second.table.len(), 2);
    }

    #[test]
    fn daily_trend_with_one_open_end_has_no_data() {
        let dashboard = dashboard();
        for (from, to) in [(Some(day(1)), None), (None, Some(day(3)))] {
            let view = dashboard.daily_trend_view(from, to).unwrap();
            assert!(view.is_empty());
            assert_eq!(view.table.column_names(), vec!["date", "total"]);
            assert!(view.chart.is_some());
        }
    }

    #[test]
    fn builds_one_breakdown_view_per_section() {
        let dashboard = dashboard();
        let views: Vec<View> = dashboard
            .breakdown_views()
            .unwrap()
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        let titles: Vec<&str> = views.iter().map(|view| view.title.as_str()).collect();
        assert_eq!(titles, vec!["Breakdown by Category", "Breakdown by Region"]);
        assert_eq!(views[0].table.value(0, 0), Some(&Value::text("Network")));
        let chart = views[1].chart.as_ref().unwrap();
        assert_eq!((chart.x.as_str(), chart.y.clone()), ("region", vec!["count".to_string()]));

        let region = dashboard.breakdown_view("breakdown by region").unwrap();
        assert_eq!(region.id, "breakdown_2");
        assert!(matches!(
            dashboard.breakdown_view("Breakdown by Agent"),
            Err(ReportError::SectionNotFound(_))
        ));
    }

    #[test]
    fn adjacent_markers_give_an_empty_breakdown() {
        let bytes = WorkbookBuilder::new()
            .sheet(
                "Complaint_Breakdown",
                &[
                    &["Breakdown by Agent"],
                    &["Breakdown by Category"],
                    &["category", "count"],
                    &["Billing", "7"],
                ],
            )
            .build();
        let workbook = Workbook::from_bytes("crm.xlsx", bytes, &Criteria::default()).unwrap();
        let dashboard = Dashboard::new(Arc::new(workbook), DashboardConfig::default()).unwrap();

        let views = dashboard.breakdown_views().unwrap();
        assert_eq!(views.len(), 2);
        let agent = views[0].as_ref().unwrap();
        assert_eq!((agent.id.as_str(), agent.title.as_str()), ("breakdown_1", "Breakdown by Agent"));
        assert!(agent.is_empty());
        assert!(agent.chart.is_none());
        let category = views[1].as_ref().unwrap();
        assert_eq!(category.table.len(), 1);
        assert_eq!(dashboard.breakdown_view("Breakdown by Category").unwrap().id, "breakdown_2");

        for id in dashboard.view_ids() {
            assert_eq!(dashboard.view(&id).unwrap().id, id);
        }
    }

    #[test]
    fn a_broken_section_leaves_the_others_usable() {
        let bytes = WorkbookBuilder::new()
            .sheet(
                "Complaint_Breakdown",
                &[
                    &["Breakdown by Channel"],
                    &["count"],
                    &["4"],
                    &["Breakdown by Region"],
                    &["region", "count"],
                    &["North", "18"],
                ],
            )
            .build();
        let workbook = Workbook::from_bytes("crm.xlsx", bytes, &Criteria::default()).unwrap();
        let dashboard = Dashboard::new(Arc::new(workbook), DashboardConfig::default()).unwrap();

        let views = dashboard.breakdown_views().unwrap();
        match &views[0] {
            Err(ReportError::Schema(error)) => assert_eq!(error.column(), Some("category")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(views[1].as_ref().unwrap().table.len(), 1);
    }

    #[test]
    fn ranks_top_offenders() {
        let view = dashboard().top_offenders_view("Wrong_Complaints", None).unwrap();
        assert_eq!(view.id, "top_wrong_complaints");
        assert_eq!(view.title, "Top 10 Offenders: Wrong Complaints");
        assert_eq!(view.table.value(0, 0), Some(&Value::text("Smith, J.")));
        assert_eq!(view.table.value(0, 1), Some(&Value::Int(2)));
    }

    #[test]
    fn views_fail_independently() {
        let mut config = DashboardConfig::default();
        config.daily.value_column = "count".to_string();
        let workbook = Workbook::from_bytes("crm.xlsx", report(), &Criteria::default()).unwrap();
        let dashboard = Dashboard::new(Arc::new(workbook), config).unwrap();
        match dashboard.daily_trend_view(None, None) {
            Err(ReportError::Schema(error)) => assert_eq!(error.column(), Some("count")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(dashboard.repeat_calls_view().is_ok());
        assert_eq!(dashboard.kpis()[0].value, Total::Integer(1210));
    }

    #[test]
    fn resolves_view_ids() {
        let dashboard = dashboard();
        let ids = dashboard.view_ids();
        assert!(ids.contains(&"wrong_dockets".to_string()));
        assert!(ids.contains(&"breakdown_2".to_string()));
        assert!(ids.contains(&"top_wrong_dockets".to_string()));
        assert!(!ids.contains(&"top_reassigned_complaints".to_string()));
        for id in &ids {
            assert_eq!(&dashboard.view(id).unwrap().id, id);
        }
        assert!(matches!(dashboard.view("breakdown_9"), Err(ReportError::UnknownView(_))));
        assert!(matches!(dashboard.view("nonsense"), Err(ReportError::UnknownView(_))));
    }

    #[test]
    fn exports_sheets_and_views() {
        let dashboard = dashboard();
        let sheet = dashboard.export("Wrong_Complaints").unwrap();
        assert_eq!(sheet.file_name, "Wrong_Complaints.csv");
        assert_eq!(sheet.bytes, b"actor\n\"Smith, J.\"\nAsha\n\"Smith, J.\"\n".to_vec());

        let trend = dashboard.export("daily_trend").unwrap();
        assert_eq!(trend.file_name, "daily_trend.csv");
        assert!(String::from_utf8(trend.bytes).unwrap().starts_with("date,total\n2024-01-01,8\n"));
        assert!(dashboard.export("missing").is_err());
    }

    #[test]
    fn resolves_paths() {
        let dashboard = dashboard();
        assert_eq!(dashboard.resolve_path("/"), Some(Page::Home));
        assert_eq!(dashboard.resolve_path("/wrong_dockets"), Some(Page::Sheet("Wrong_Dockets".into())));
        assert_eq!(dashboard.resolve_path("/Wrong Dockets"), Some(Page::Sheet("Wrong_Dockets".into())));
        assert_eq!(dashboard.resolve_path("/unknown"), None);
    }

    #[test]
    fn serves_concurrent_readers() {
        let dashboard = dashboard();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| dashboard.kpis()[0].value))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), Total::Integer(1210));
            }
        });
    }
}
