//! CSV Data Loader Module
//! Discovers vehicle registration and PM2.5 files and turns them into typed
//! records using Polars.

use crate::data::cleaning::{
    canonical_fuel_label, clean_year, normalize_fuel_label, pm25_file_year, vehicle_file_year,
    RawYear,
};
use crate::data::records::{Pm25Record, VehicleRecord};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const VEHICLE_PREFIX: &str = "vehicle";
pub const PM25_PREFIX: &str = "pm2.5-";
pub const CSV_EXTENSION: &str = ".csv";

pub const FUEL_COL: &str = "Fuel";
pub const VEHICLES_COL: &str = "Vehicles";
pub const YEAR_COL: &str = "year";
pub const MONTH_COL: &str = "month";
pub const DATE_COL: &str = "Date";
pub const PM25_COL: &str = "Daily Mean PM2.5 Concentration";

// "%m/%d/%y" goes first: it rejects four-digit years, while "%m/%d/%Y"
// would happily read "20" as the year 20.
const DATE_FORMATS: [&str; 4] = ["%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to read data directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("{file}: missing column '{column}'")]
    MissingColumn { file: String, column: String },
    #[error("{0}: file name does not encode a year")]
    InvalidFileYear(String),
    #[error("{file}: unparseable date '{value}'")]
    UnparseableDate { file: String, value: String },
    #[error("No valid vehicle data found")]
    NoValidData,
}

/// Reads the CSV files of one data directory.
pub struct DataLoader {
    data_dir: PathBuf,
}

impl DataLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Aggregate every `vehicle*.csv` file into per-(year, fuel) totals.
    ///
    /// Files sharing a year are concatenated, not merged, so a (year, fuel)
    /// pair may appear more than once. Any per-file error aborts the whole
    /// load; so does ending up with no rows at all.
    pub fn load_vehicle_data(&self) -> Result<Vec<VehicleRecord>, LoaderError> {
        let files = self.discover(VEHICLE_PREFIX)?;

        let mut combined: Vec<VehicleRecord> = Vec::new();
        for path in &files {
            let file_name = file_name_of(path);
            let records = Self::aggregate_vehicle_file(path, &file_name)?;
            if records.is_empty() {
                debug!(file = %file_name, "No usable vehicle rows, skipping");
                continue;
            }
            debug!(file = %file_name, groups = records.len(), "Aggregated vehicle file");
            combined.extend(records);
        }

        if combined.is_empty() {
            return Err(LoaderError::NoValidData);
        }

        for record in &mut combined {
            let canonical = canonical_fuel_label(&record.fuel).to_string();
            record.fuel = canonical;
        }
        combined.sort_by(|a, b| (a.year, &a.fuel).cmp(&(b.year, &b.fuel)));

        info!(
            files = files.len(),
            rows = combined.len(),
            "Loaded vehicle registration data"
        );
        Ok(combined)
    }

    /// Load every `pm2.5-<YYYY>.csv` file.
    ///
    /// A file that fails to parse is logged and skipped. Rows dated outside
    /// the year in the file name are dropped.
    pub fn load_pm25_data(&self) -> Vec<Pm25Record> {
        let files = match self.discover(PM25_PREFIX) {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "Could not list PM2.5 files");
                return Vec::new();
            }
        };

        let mut rows = Vec::new();
        for path in &files {
            let file_name = file_name_of(path);
            match Self::parse_pm25_file(path, &file_name) {
                Ok(records) if records.is_empty() => {
                    debug!(file = %file_name, "No PM2.5 rows for the file's year");
                }
                Ok(records) => {
                    debug!(file = %file_name, rows = records.len(), "Parsed PM2.5 file");
                    rows.extend(records);
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Error loading PM2.5 file, skipping");
                }
            }
        }

        info!(files = files.len(), rows = rows.len(), "Loaded PM2.5 data");
        rows
    }

    /// List `<prefix>*.csv` files, sorted by path. A missing directory is
    /// treated as an empty one.
    fn discover(&self, prefix: &str) -> Result<Vec<PathBuf>, LoaderError> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(dir = %self.data_dir.display(), "Data directory not found");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let name = file_name_of(&path);
            if name.starts_with(prefix) && name.ends_with(CSV_EXTENSION) && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn aggregate_vehicle_file(
        path: &Path,
        file_name: &str,
    ) -> Result<Vec<VehicleRecord>, LoaderError> {
        let fallback_year = vehicle_file_year(file_name);

        let Some(df) = read_csv(path)? else {
            return Ok(Vec::new());
        };
        if df.height() == 0 {
            return Ok(Vec::new());
        }

        let fuels = string_values(require_column(&df, FUEL_COL, file_name)?)?;
        let counts = float_values(require_column(&df, VEHICLES_COL, file_name)?)?;

        let mut years = match find_column(&df, YEAR_COL) {
            Some(col) => year_values(col)?,
            None => vec![None; df.height()],
        };
        if years.iter().all(Option::is_none) {
            years = vec![fallback_year; df.height()];
        }

        let mut totals: BTreeMap<(i32, String), f64> = BTreeMap::new();
        for ((fuel, count), year) in fuels.into_iter().zip(counts).zip(years) {
            let (Some(fuel), Some(year)) = (fuel, year) else {
                continue;
            };
            *totals.entry((year, normalize_fuel_label(&fuel))).or_default() +=
                count.unwrap_or(0.0);
        }

        // Counts are summed as read; only the per-group total is rounded to a
        // whole number of vehicles.
        Ok(totals
            .into_iter()
            .map(|((year, fuel), total)| VehicleRecord {
                fuel,
                vehicles: total.round() as i64,
                year,
            })
            .collect())
    }

    fn parse_pm25_file(path: &Path, file_name: &str) -> Result<Vec<Pm25Record>, LoaderError> {
        let file_year = pm25_file_year(file_name)
            .ok_or_else(|| LoaderError::InvalidFileYear(file_name.to_string()))?;

        let Some(df) = read_csv(path)? else {
            return Ok(Vec::new());
        };

        let dates = string_values(require_column(&df, DATE_COL, file_name)?)?;
        let concentrations = float_values(require_column(&df, PM25_COL, file_name)?)?;

        let mut extras: Vec<(String, Vec<Option<String>>)> = Vec::new();
        for col in df.get_columns() {
            let name = col.name().trim();
            if [DATE_COL, PM25_COL, YEAR_COL, MONTH_COL].contains(&name) {
                continue;
            }
            extras.push((name.to_string(), string_values(col)?));
        }

        let mut records = Vec::new();
        for (idx, (raw_date, concentration)) in dates.into_iter().zip(concentrations).enumerate() {
            let Some(raw_date) = raw_date.filter(|d| !d.trim().is_empty()) else {
                continue;
            };
            let date = parse_date(&raw_date).ok_or_else(|| LoaderError::UnparseableDate {
                file: file_name.to_string(),
                value: raw_date.clone(),
            })?;
            if date.year() != file_year {
                continue;
            }

            let extra = extras
                .iter()
                .filter_map(|(name, values)| {
                    values
                        .get(idx)
                        .cloned()
                        .flatten()
                        .map(|value| (name.clone(), value))
                })
                .collect();

            records.push(Pm25Record {
                date,
                year: date.year(),
                month: date.month(),
                concentration,
                extra,
            });
        }

        Ok(records)
    }
}

/// Read a whole CSV file. An empty file yields `None` rather than an error.
fn read_csv(path: &Path) -> Result<Option<DataFrame>, LoaderError> {
    if fs::metadata(path)?.len() == 0 {
        return Ok(None);
    }

    let result = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .finish()
        .and_then(|lazy| lazy.collect());

    match result {
        Ok(df) => Ok(Some(df)),
        Err(e) if is_no_data(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// The scan wraps `NoData` in one or more `Context` layers.
fn is_no_data(err: &PolarsError) -> bool {
    match err {
        PolarsError::NoData(_) => true,
        PolarsError::Context { error, .. } => is_no_data(error),
        _ => false,
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Look a column up by name, ignoring surrounding whitespace in the header.
fn find_column<'a>(df: &'a DataFrame, name: &str) -> Option<&'a Column> {
    df.get_columns().iter().find(|col| col.name().trim() == name)
}

fn require_column<'a>(
    df: &'a DataFrame,
    name: &str,
    file_name: &str,
) -> Result<&'a Column, LoaderError> {
    find_column(df, name).ok_or_else(|| LoaderError::MissingColumn {
        file: file_name.to_string(),
        column: name.to_string(),
    })
}

fn string_values(col: &Column) -> Result<Vec<Option<String>>, LoaderError> {
    let as_str = col.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn float_values(col: &Column) -> Result<Vec<Option<f64>>, LoaderError> {
    let as_f64 = col.cast(&DataType::Float64)?;
    Ok(as_f64
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

fn year_values(col: &Column) -> Result<Vec<Option<i32>>, LoaderError> {
    let dtype = col.dtype();
    if *dtype == DataType::String {
        return Ok(col
            .str()?
            .into_iter()
            .map(|v| clean_year(v.map(RawYear::Text)))
            .collect());
    }
    if dtype.is_integer() {
        let as_i64 = col.cast(&DataType::Int64)?;
        return Ok(as_i64
            .i64()?
            .into_iter()
            .map(|v| clean_year(v.map(RawYear::Int)))
            .collect());
    }
    Ok(float_values(col)?
        .into_iter()
        .map(|v| clean_year(v.map(RawYear::Float)))
        .collect())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}
