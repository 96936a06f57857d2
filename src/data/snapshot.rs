//! Dashboard Snapshot Module
//! The three tables, loaded once and shared read-only with every view.

use crate::data::loader::{
    DataLoader, LoaderError, DATE_COL, FUEL_COL, MONTH_COL, PM25_COL, VEHICLES_COL, YEAR_COL,
};
use crate::data::processor::DataProcessor;
use crate::data::records::{CombinedAnnualRecord, Pm25Record, VehicleRecord};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const AVG_PM25_COL: &str = "Avg PM2.5";

/// Immutable result of one load of a data directory.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub source_dir: PathBuf,
    pub vehicles: Vec<VehicleRecord>,
    pub pm25: Vec<Pm25Record>,
    pub combined: Vec<CombinedAnnualRecord>,
}

impl DashboardData {
    /// Load and aggregate every table under `data_dir`. Never fails: a vehicle
    /// load error degrades to an empty vehicle table.
    pub fn load(data_dir: &Path) -> Self {
        let loader = DataLoader::new(data_dir);

        let vehicles = match loader.load_vehicle_data() {
            Ok(vehicles) => vehicles,
            Err(e) => {
                warn!(
                    dir = %data_dir.display(),
                    error = %e,
                    "Error loading vehicle data, using empty table"
                );
                Vec::new()
            }
        };
        let pm25 = loader.load_pm25_data();

        Self::from_tables(data_dir, vehicles, pm25)
    }

    pub fn from_tables(
        data_dir: &Path,
        vehicles: Vec<VehicleRecord>,
        pm25: Vec<Pm25Record>,
    ) -> Self {
        let combined = DataProcessor::combine(&vehicles, &pm25);
        info!(
            vehicles = vehicles.len(),
            pm25 = pm25.len(),
            combined = combined.len(),
            "Dashboard data ready"
        );

        Self {
            source_dir: data_dir.to_path_buf(),
            vehicles,
            pm25,
            combined,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty() && self.pm25.is_empty()
    }

    /// Vehicle table as `Fuel, Vehicles, year`.
    pub fn vehicles_frame(&self) -> Result<DataFrame, LoaderError> {
        let fuels: Vec<&str> = self.vehicles.iter().map(|r| r.fuel.as_str()).collect();
        let counts: Vec<i64> = self.vehicles.iter().map(|r| r.vehicles).collect();
        let years: Vec<i32> = self.vehicles.iter().map(|r| r.year).collect();

        Ok(DataFrame::new(vec![
            Column::new(FUEL_COL.into(), fuels),
            Column::new(VEHICLES_COL.into(), counts),
            Column::new(YEAR_COL.into(), years),
        ])?)
    }

    /// PM2.5 table as `Date, year, month, Daily Mean PM2.5 Concentration`
    /// followed by the pass-through columns in name order.
    pub fn pm25_frame(&self) -> Result<DataFrame, LoaderError> {
        if self.pm25.is_empty() {
            return Ok(DataFrame::empty());
        }

        let dates: Vec<String> = self.pm25.iter().map(|r| r.date.to_string()).collect();
        let years: Vec<i32> = self.pm25.iter().map(|r| r.year).collect();
        let months: Vec<u32> = self.pm25.iter().map(|r| r.month).collect();
        let values: Vec<Option<f64>> = self.pm25.iter().map(|r| r.concentration).collect();

        let mut columns = vec![
            Column::new(DATE_COL.into(), dates),
            Column::new(YEAR_COL.into(), years),
            Column::new(MONTH_COL.into(), months),
            Column::new(PM25_COL.into(), values),
        ];

        let extra_names: BTreeSet<&str> = self
            .pm25
            .iter()
            .flat_map(|r| r.extra.keys().map(String::as_str))
            .collect();
        for name in extra_names {
            let cells: Vec<Option<&str>> = self
                .pm25
                .iter()
                .map(|r| r.extra.get(name).map(String::as_str))
                .collect();
            columns.push(Column::new(name.into(), cells));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Combined table as `year, Vehicles, Avg PM2.5`.
    pub fn combined_frame(&self) -> Result<DataFrame, LoaderError> {
        let years: Vec<i32> = self.combined.iter().map(|r| r.year).collect();
        let ev: Vec<Option<i64>> = self.combined.iter().map(|r| r.ev_vehicles).collect();
        let avg: Vec<Option<f64>> = self.combined.iter().map(|r| r.avg_pm25).collect();

        Ok(DataFrame::new(vec![
            Column::new(YEAR_COL.into(), years),
            Column::new(VEHICLES_COL.into(), ev),
            Column::new(AVG_PM25_COL.into(), avg),
        ])?)
    }

    /// Write `vehicle_data.csv`, `pm25_data.csv` and `combined_data.csv`.
    pub fn export_csv(&self, out_dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
        fs::create_dir_all(out_dir)?;

        let tables = [
            ("vehicle_data.csv", self.vehicles_frame()?),
            ("pm25_data.csv", self.pm25_frame()?),
            ("combined_data.csv", self.combined_frame()?),
        ];

        let mut written = Vec::new();
        for (name, mut df) in tables {
            let path = out_dir.join(name);
            let mut file = File::create(&path)?;
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut df)?;
            info!(path = %path.display(), rows = df.height(), "Exported table");
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_directory_gives_shaped_empty_tables() {
        let dir = tempdir().unwrap();
        let data = DashboardData::load(dir.path());

        assert!(data.is_empty());
        assert!(data.combined.is_empty());

        let vehicles = data.vehicles_frame().unwrap();
        assert_eq!(vehicles.height(), 0);
        let names: Vec<String> = vehicles
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["Fuel", "Vehicles", "year"]);

        assert_eq!(data.pm25_frame().unwrap().width(), 0);
    }

    #[test]
    fn test_load_builds_all_three_tables() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("vehicle2019.csv"),
            "Fuel,Vehicles\nbattery electric,40\nGasoline,500\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("vehicle2020.csv"),
            "Fuel,Vehicles\nBattery-Electric,60\nGasoline,480\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("pm2.5-2020.csv"),
            "Date,Daily Mean PM2.5 Concentration\n01/01/2020,6.0\n01/02/2020,8.0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("pm2.5-2021.csv"),
            "Date,Daily Mean PM2.5 Concentration\n01/01/2021,5.0\n",
        )
        .unwrap();

        let data = DashboardData::load(dir.path());
        assert_eq!(data.vehicles.len(), 4);
        assert_eq!(data.pm25.len(), 3);

        let years: Vec<i32> = data.combined.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
        assert_eq!(data.combined[0].ev_vehicles, Some(40));
        assert_eq!(data.combined[0].avg_pm25, None);
        assert_eq!(data.combined[1].avg_pm25, Some(7.0));
        assert_eq!(data.combined[2].ev_vehicles, None);
    }

    #[test]
    fn test_export_writes_three_files() {
        let data_dir = tempdir().unwrap();
        fs::write(
            data_dir.path().join("vehicle2020.csv"),
            "Fuel,Vehicles\nElectric,10\n",
        )
        .unwrap();
        let data = DashboardData::load(data_dir.path());

        let out = tempdir().unwrap();
        let written = data.export_csv(&out.path().join("tables")).unwrap();
        assert_eq!(written.len(), 3);

        let vehicles = fs::read_to_string(&written[0]).unwrap();
        assert!(vehicles.starts_with("Fuel,Vehicles,year"));
        assert!(vehicles.contains("Electric,10,2020"));
    }
}
