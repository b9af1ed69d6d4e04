//! Dashboard configuration.
//!
//! Settings come from built-in defaults, then an optional JSON file, then the
//! environment (`CRM_REPORT_PATH`, `CRM_REPORT_TOP_N`); command-line flags
//! are applied last by the binary.
use crate::kpi::default_kpis;
use crate::kpi::KpiDefinition;
use crate::metrics::DEFAULT_TOP_N;
use crate::spreadsheet::Criteria;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Environment variable overriding the workbook location
pub const ENV_WORKBOOK: &str = "CRM_REPORT_PATH";
/// Environment variable overriding the top-N ranking size
pub const ENV_TOP_N: &str = "CRM_REPORT_TOP_N";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value '{value}' for {name}")]
    Env { name: String, value: String },

    #[error("Invalid sheet pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Invalid section marker: {0}")]
    Marker(#[from] regex::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_workbook")]
    pub workbook: String,
    #[serde(default)]
    pub daily: DailyConfig,
    #[serde(default)]
    pub breakdown: BreakdownConfig,
    #[serde(default)]
    pub repeat_calls: RepeatCallConfig,
    #[serde(default)]
    pub exceptions: ExceptionConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default = "default_kpis")]
    pub kpis: Vec<KpiDefinition>,
}

fn default_workbook() -> String {
    "CRM_Analysis_Report.xlsx".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            workbook: default_workbook(),
            daily: DailyConfig::default(),
            breakdown: BreakdownConfig::default(),
            repeat_calls: RepeatCallConfig::default(),
            exceptions: ExceptionConfig::default(),
            loader: LoaderConfig::default(),
            kpis: default_kpis(),
        }
    }
}

/// Daily docket sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyConfig {
    #[serde(default = "default_daily_sheet")]
    pub sheet: String,
    #[serde(default = "default_daily_date_column")]
    pub date_column: String,
    #[serde(default = "default_daily_value_column")]
    pub value_column: String,
}

fn default_daily_sheet() -> String {
    "Daywise_Report".to_string()
}

fn default_daily_date_column() -> String {
    "createdOn".to_string()
}

fn default_daily_value_column() -> String {
    "docketCount".to_string()
}

impl Default for DailyConfig {
    fn default() -> Self {
        DailyConfig {
            sheet: default_daily_sheet(),
            date_column: default_daily_date_column(),
            value_column: default_daily_value_column(),
        }
    }
}

/// Sectioned complaint breakdown sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownConfig {
    #[serde(default = "default_breakdown_sheet")]
    pub sheet: String,
    /// Regular expression matched against the first cell of marker rows
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_count_column")]
    pub count_column: String,
}

fn default_breakdown_sheet() -> String {
    "Complaint_Breakdown".to_string()
}

fn default_marker() -> String {
    "(?i)breakdown by".to_string()
}

fn default_count_column() -> String {
    "count".to_string()
}

impl Default for BreakdownConfig {
    fn default() -> Self {
        BreakdownConfig {
            sheet: default_breakdown_sheet(),
            marker: default_marker(),
            count_column: default_count_column(),
        }
    }
}

/// Repeat-call sheet with one date and several count series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatCallConfig {
    #[serde(default = "default_repeat_sheet")]
    pub sheet: String,
    #[serde(default = "default_repeat_date_column")]
    pub date_column: String,
    #[serde(default = "default_series")]
    pub series: Vec<String>,
}

fn default_repeat_sheet() -> String {
    "Repeat_Call_Analysis".to_string()
}

fn default_repeat_date_column() -> String {
    "date".to_string()
}

fn default_series() -> Vec<String> {
    vec!["totalCalls".to_string(), "repeatCalls".to_string()]
}

impl Default for RepeatCallConfig {
    fn default() -> Self {
        RepeatCallConfig {
            sheet: default_repeat_sheet(),
            date_column: default_repeat_date_column(),
            series: default_series(),
        }
    }
}

/// Exception-list sheets ranked by actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionConfig {
    #[serde(default = "default_exception_sheets")]
    pub sheets: Vec<String>,
    #[serde(default = "default_actor_column")]
    pub actor_column: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_exception_sheets() -> Vec<String> {
    ["Wrong_Complaints", "Invalid_Recharge_Tagging", "Reassigned_Complaints", "Wrong_Dockets"]
        .iter()
        .map(|sheet| sheet.to_string())
        .collect()
}

fn default_actor_column() -> String {
    "actor".to_string()
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for ExceptionConfig {
    fn default() -> Self {
        ExceptionConfig {
            sheets: default_exception_sheets(),
            actor_column: default_actor_column(),
            top_n: default_top_n(),
        }
    }
}

/// Workbook loading options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Glob patterns of sheets to load; all sheets when absent
    #[serde(default)]
    pub sheets: Option<Vec<String>>,
    /// Glob patterns of sheets without a header row
    #[serde(default)]
    pub headerless: Vec<String>,
    /// Extra text values read as null
    #[serde(default)]
    pub nulls: Vec<String>,
    #[serde(default = "default_error_as_null")]
    pub error_as_null: bool,
    /// Drop rows without any value
    #[serde(default)]
    pub skip_empty_rows: bool,
}

fn default_error_as_null() -> bool {
    true
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            sheets: None,
            headerless: Vec::new(),
            nulls: Vec::new(),
            error_as_null: default_error_as_null(),
            skip_empty_rows: false,
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Applies overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from a variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_WORKBOOK).filter(|path| !path.trim().is_empty()) {
            self.workbook = path;
        }
        if let Some(value) = lookup(ENV_TOP_N) {
            self.exceptions.top_n = value.trim().parse().map_err(|_| ConfigError::Env {
                name: ENV_TOP_N.to_string(),
                value,
            })?;
        }
        Ok(self)
    }

    /// Loader criteria built from the `loader` section.
    pub fn criteria(&self) -> Result<Criteria, ConfigError> {
        let mut criteria = Criteria::default()
            .with_headerless(&self.loader.headerless)?
            .with_nulls(self.loader.nulls.iter().cloned())
            .with_error_as_null(self.loader.error_as_null)
            .with_skip_empty_rows(self.loader.skip_empty_rows);
        if let Some(sheets) = &self.loader.sheets {
            criteria = criteria.with_sheets(sheets)?;
        }
        Ok(criteria)
    }

    /// Compiled section marker of the breakdown sheet.
    pub fn marker(&self) -> Result<Regex, ConfigError> {
        Ok(Regex::new(&self.breakdown.marker)?)
    }
}
