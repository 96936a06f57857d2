//! California Transportation Trends - vehicle registrations and PM2.5 dashboard
//!
//! Loads the vehicle and PM2.5 CSV files of a data directory once, then either
//! opens the interactive dashboard or runs one of the headless subcommands.

mod charts;
mod data;
mod gui;
mod stats;

use anyhow::{anyhow, Context, Result};
use charts::{ChartData, ChartRenderer};
use clap::{Parser, Subcommand};
use data::{CombinedAnnualRecord, DashboardData, DataFilter, DataProcessor};
use eframe::egui;
use gui::DashboardApp;
use serde::Serialize;
use stats::{AirQualitySummary, DataSummary, StatsCalculator, SummaryCard};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ca_transport_trends")]
#[command(about = "California vehicle registrations and PM2.5 dashboard", long_about = None)]
struct Cli {
    /// Directory holding the vehicle*.csv and pm2.5-*.csv files
    #[arg(long, global = true, env = "DASHBOARD_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive dashboard (default)
    Gui,
    /// Print the headline figures for the loaded data
    Summary {
        /// Print JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the vehicle, PM2.5 and combined tables as CSV files
    Export {
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Render the dashboard charts as PNG files
    Render {
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// First year of the range (defaults to the earliest year)
        #[arg(long)]
        start: Option<i32>,

        /// Last year of the range (defaults to the latest year)
        #[arg(long)]
        end: Option<i32>,

        /// Fuel type to include, repeatable (none means all)
        #[arg(long = "fuel")]
        fuels: Vec<String>,

        /// Open the output folder afterwards
        #[arg(long, default_value_t = false)]
        open: bool,
    },
}

/// Everything `summary --json` prints.
#[derive(Serialize)]
struct SummaryReport<'a> {
    data_dir: &'a Path,
    cards: Vec<SummaryCard>,
    data_summary: Option<DataSummary>,
    air_quality: Option<AirQualitySummary>,
    combined: &'a [CombinedAnnualRecord],
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    init_logging();

    let cli = Cli::parse();
    let data = Arc::new(DashboardData::load(&cli.data_dir));

    let result = match cli.command.unwrap_or(Commands::Gui) {
        Commands::Gui => run_gui(data),
        Commands::Summary { json } => print_summary(&data, json),
        Commands::Export { out } => export_tables(&data, &out),
        Commands::Render {
            out,
            start,
            end,
            fuels,
            open,
        } => render_charts(&data, &out, resolve_filter(&data, start, end, fuels), open),
    };

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}

fn run_gui(data: Arc<DashboardData>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("California Transportation Trends"),
        ..Default::default()
    };

    eframe::run_native(
        "California Transportation Trends",
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, data)))),
    )
    .map_err(|e| anyhow!("GUI failed: {e}"))
}

fn print_summary(data: &DashboardData, json: bool) -> Result<()> {
    let report = SummaryReport {
        data_dir: &data.source_dir,
        cards: StatsCalculator::summary_cards(&data.vehicles),
        data_summary: StatsCalculator::data_summary(&data.vehicles),
        air_quality: StatsCalculator::air_quality_summary(&data.pm25, &data.combined),
        combined: &data.combined,
    };

    if json {
        let text = serde_json::to_string_pretty(&report).context("Failed to serialize summary")?;
        println!("{text}");
        return Ok(());
    }

    println!("Data directory: {}", report.data_dir.display());
    if report.cards.is_empty() {
        println!("No vehicle data available");
    }
    for card in &report.cards {
        println!("{:<20} {:>8.2}M  ({})", card.title, card.millions, card.year);
    }
    if let Some(summary) = &report.data_summary {
        println!(
            "Years {}-{}: {:.2}M vehicles, {:.2}M electric, {} fuel types, {} data points",
            summary.year_min,
            summary.year_max,
            summary.total_millions,
            summary.electric_millions,
            summary.fuel_types,
            summary.data_points
        );
    }
    match &report.air_quality {
        Some(air) => println!(
            "PM2.5: {} readings, mean {:.2} µg/m³, sd {:.2}{}",
            air.days,
            air.mean,
            air.std_dev,
            air.cleanest_year
                .map(|y| format!(", cleanest year {y}"))
                .unwrap_or_default()
        ),
        None => println!("No PM2.5 data available"),
    }
    for row in report.combined {
        println!(
            "{}  EVs: {:>10}  Avg PM2.5: {:>6}",
            row.year,
            row.ev_vehicles
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string()),
            row.avg_pm25
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}

fn export_tables(data: &DashboardData, out: &Path) -> Result<()> {
    let written = data
        .export_csv(out)
        .with_context(|| format!("Failed to export tables to {}", out.display()))?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

/// Build the render filter; a missing bound falls back to the data's span.
fn resolve_filter(
    data: &DashboardData,
    start: Option<i32>,
    end: Option<i32>,
    fuels: Vec<String>,
) -> DataFilter {
    let years = DataProcessor::get_years(&data.vehicles);
    let span = years.first().copied().zip(years.last().copied());
    let years = match (start, end, span) {
        (None, None, _) => None,
        (Some(start), Some(end), _) => Some((start, end)),
        (Some(start), None, Some((_, last))) => Some((start, last)),
        (None, Some(end), Some((first, _))) => Some((first, end)),
        (Some(start), None, None) => Some((start, i32::MAX)),
        (None, Some(end), None) => Some((i32::MIN, end)),
    };
    DataFilter { fuels, years }
}

fn render_charts(data: &DashboardData, out: &Path, filter: DataFilter, open: bool) -> Result<()> {
    let chart_data = ChartData::build(data, &filter);
    let written = ChartRenderer::render_all(&chart_data, out)
        .with_context(|| format!("Failed to render charts to {}", out.display()))?;
    for path in &written {
        println!("{}", path.display());
    }

    if open {
        info!(dir = %out.display(), "Opening output folder");
        open::that(out).with_context(|| format!("Failed to open {}", out.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use data::VehicleRecord;

    fn snapshot() -> DashboardData {
        let vehicles = [2018, 2020, 2022]
            .into_iter()
            .map(|year| VehicleRecord {
                fuel: "Electric".to_string(),
                vehicles: 10,
                year,
            })
            .collect();
        DashboardData::from_tables(Path::new("data"), vehicles, Vec::new())
    }

    #[test]
    fn test_resolve_filter_fills_missing_bound() {
        let data = snapshot();
        assert_eq!(resolve_filter(&data, None, None, Vec::new()).years, None);
        assert_eq!(
            resolve_filter(&data, Some(2020), None, Vec::new()).years,
            Some((2020, 2022))
        );
        assert_eq!(
            resolve_filter(&data, None, Some(2020), Vec::new()).years,
            Some((2018, 2020))
        );
        assert_eq!(
            resolve_filter(&data, Some(2019), Some(2021), vec!["Electric".to_string()]),
            DataFilter {
                fuels: vec!["Electric".to_string()],
                years: Some((2019, 2021)),
            }
        );
    }

    #[test]
    fn test_resolve_filter_without_data() {
        let data = DashboardData::default();
        assert_eq!(
            resolve_filter(&data, Some(2020), None, Vec::new()).years,
            Some((2020, i32::MAX))
        );
    }

    #[test]
    fn test_cli_defaults_to_gui() {
        let cli = Cli::try_parse_from(["ca_transport_trends", "--data-dir", "csv"]).unwrap();
        assert_eq!(cli.data_dir, PathBuf::from("csv"));
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from([
            "ca_transport_trends",
            "render",
            "--out",
            "charts",
            "--fuel",
            "Electric",
            "--fuel",
            "Diesel",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Render { fuels, start, .. }) => {
                assert_eq!(fuels, vec!["Electric", "Diesel"]);
                assert_eq!(start, None);
            }
            _ => panic!("expected render"),
        }
    }
}
