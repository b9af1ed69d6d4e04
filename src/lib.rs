//! # CRM Report
//!
//! Extraction and aggregation layer of a CRM complaint-analysis dashboard.
//! An Excel workbook of CRM reports is loaded once into named tables, and
//! every figure the dashboard shows is derived from those tables on request.
//!
//! ## Features
//!
//! - **Workbook loading**: `.xlsx` packages read directly from disk or an
//!   in-memory buffer, with date cells recognised from their number formats
//! - **Sectioned sheets**: sheets stacking several titled sub-tables are split
//!   at their marker rows
//! - **Aggregators**: daily trend, category breakdown, multi-series trend and
//!   top-N ranking, each producing a new table
//! - **KPIs**: headline figures that degrade to zero instead of failing
//! - **CSV export** of any sheet or derived table
//!
//! ## Example
//!
//! ```no_run
//! use crm_report::config::DashboardConfig;
//! use crm_report::dashboard::Dashboard;
//! use crm_report::spreadsheet::Workbook;
//! use std::sync::Arc;
//!
//! let config = DashboardConfig::default();
//! let workbook = Workbook::open(&config.workbook, &config.criteria()?)?;
//! let dashboard = Dashboard::new(Arc::new(workbook), config)?;
//! for kpi in dashboard.kpis() {
//!     println!("{kpi}");
//! }
//! # Ok::<(), crm_report::error::ReportError>(())
//! ```
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub(crate) mod helpers;
pub mod kpi;
pub mod metrics;
pub mod sections;
pub mod spreadsheet;
pub mod table;

#[cfg(test)]
mod test_fixtures;

pub use dashboard::Dashboard;
pub use error::ReportError;
pub use spreadsheet::Workbook;
pub use table::Table;
pub use table::Value;
