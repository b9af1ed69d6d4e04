//! Command-line front end of the CRM report.
//!
//! ```sh
//! crm-report --workbook CRM_Analysis_Report.xlsx kpis
//! crm-report trend --from 2024-01-01 --to 2024-01-31
//! crm-report export top_wrong_dockets -o reports/
//! ```
use anyhow::Context;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use clap::Subcommand;
use crm_report::config::DashboardConfig;
use crm_report::dashboard::Dashboard;
use crm_report::export;
use crm_report::spreadsheet::Workbook;
use crm_report::table::Table;
use log::info;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Summaries and exports of a CRM analysis workbook
#[derive(Parser, Debug)]
#[command(name = "crm-report", version)]
struct Args {
    /// Workbook path or file:// URL; overrides config and CRM_REPORT_PATH
    #[arg(short, long, value_name = "WORKBOOK")]
    workbook: Option<String>,

    /// JSON configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List sheets with their row counts and column types
    Sheets,
    /// Print the headline KPIs
    Kpis,
    /// Daily totals as CSV, over the whole date range by default
    Trend {
        #[arg(long, value_name = "DATE", requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, value_name = "DATE", requires = "from")]
        to: Option<NaiveDate>,
    },
    /// Breakdown sections as CSV
    Breakdown {
        /// Only the section with this title
        #[arg(long)]
        section: Option<String>,
    },
    /// Top offenders as CSV, for every exception sheet by default
    Top {
        #[arg(long)]
        sheet: Option<String>,
        #[arg(short)]
        n: Option<usize>,
    },
    /// Print a view as JSON; lists view ids when none is given
    View { id: Option<String> },
    /// Write a sheet or view as <name>.csv
    Export {
        id: String,
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DashboardConfig::from_json_file(path)?,
        None => DashboardConfig::default(),
    };
    config = config.with_env()?;
    if let Some(workbook) = args.workbook {
        config.workbook = workbook;
    }

    let criteria = config.criteria()?;
    let workbook = Workbook::open(&config.workbook, &criteria)
        .with_context(|| format!("Failed to load workbook '{}'", config.workbook))?;
    let dashboard = Dashboard::new(Arc::new(workbook), config)?;
    run(&dashboard, args.command)
}

fn run(dashboard: &Dashboard, command: Command) -> Result<()> {
    match command {
        Command::Sheets => {
            for table in dashboard.workbook().iter() {
                let columns: Vec<String> = table
                    .columns()
                    .iter()
                    .map(|column| format!("{}:{}", column.name, column.kind.as_str()))
                    .collect();
                println!("{}\t{}\t{}", table.name(), table.len(), columns.join(","));
            }
        }
        Command::Kpis => {
            for kpi in dashboard.kpis() {
                println!("{kpi}");
            }
        }
        Command::Trend { from, to } => {
            let view = dashboard.daily_trend_view(from, to)?;
            if view.is_empty() {
                info!("No data in the selected date range");
            }
            print_csv(&view.table)?;
        }
        Command::Breakdown { section } => {
            let views = match section {
                Some(title) => vec![dashboard.breakdown_view(&title)],
                None => dashboard.breakdown_views()?,
            };
            for view in views {
                match view {
                    Ok(view) => {
                        println!("# {}", view.title);
                        print_csv(&view.table)?;
                    }
                    Err(error) => eprintln!("Skipping breakdown section: {error}"),
                }
            }
        }
        Command::Top { sheet: Some(sheet), n } => {
            let view = dashboard.top_offenders_view(&sheet, n)?;
            print_csv(&view.table)?;
        }
        Command::Top { sheet: None, n } => {
            let sheets = dashboard.config().exceptions.sheets.iter();
            for sheet in sheets.filter(|sheet| dashboard.workbook().contains(sheet)) {
                let view = dashboard.top_offenders_view(sheet, n)?;
                println!("# {}", view.title);
                print_csv(&view.table)?;
            }
        }
        Command::View { id: Some(id) } => {
            let view = dashboard.view(&id)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Command::View { id: None } => {
            for id in dashboard.view_ids() {
                println!("{id}");
            }
        }
        Command::Export { id, output } => {
            let file = dashboard.export(&id)?;
            let path = output.join(&file.file_name);
            std::fs::write(&path, &file.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn print_csv(table: &Table) -> Result<()> {
    let bytes = export::to_csv(table)?;
    std::io::stdout().write_all(&bytes)?;
    Ok(())
}
