//! Data Processor Module
//! Cross-table aggregation and the read-only projections behind the charts.

use crate::data::cleaning::is_electric;
use crate::data::records::{CombinedAnnualRecord, Pm25Record, VehicleRecord};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, BTreeSet};

/// User-selected subset of the vehicle table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataFilter {
    /// Fuel labels to keep. Empty keeps every fuel.
    pub fuels: Vec<String>,
    /// Inclusive year range. `None` keeps every year.
    pub years: Option<(i32, i32)>,
}

impl DataFilter {
    pub fn matches(&self, record: &VehicleRecord) -> bool {
        let fuel_ok = self.fuels.is_empty() || self.fuels.iter().any(|f| f == &record.fuel);
        let year_ok = self
            .years
            .map_or(true, |(start, end)| record.year >= start && record.year <= end);
        fuel_ok && year_ok
    }
}

/// Vehicles per year for one fuel label.
#[derive(Debug, Clone, PartialEq)]
pub struct FuelSeries {
    pub fuel: String,
    pub points: Vec<(i32, i64)>,
}

/// Share of one fuel label in a single year's total.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionShare {
    pub fuel: String,
    pub vehicles: i64,
    pub percentage: f64,
}

/// Handles aggregation and filtering over loaded records.
pub struct DataProcessor;

impl DataProcessor {
    /// Outer-join annual electric vehicle totals with annual mean PM2.5.
    ///
    /// Sorted by year. A year seen on only one side carries `None` for the other.
    pub fn combine(vehicles: &[VehicleRecord], pm25: &[Pm25Record]) -> Vec<CombinedAnnualRecord> {
        let mut ev_by_year: BTreeMap<i32, i64> = BTreeMap::new();
        for record in vehicles.iter().filter(|r| is_electric(&r.fuel)) {
            *ev_by_year.entry(record.year).or_default() += record.vehicles;
        }

        let mut pm25_by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
        for row in pm25 {
            let values = pm25_by_year.entry(row.year).or_default();
            if let Some(c) = row.concentration {
                values.push(c);
            }
        }

        let years: BTreeSet<i32> = ev_by_year
            .keys()
            .chain(pm25_by_year.keys())
            .copied()
            .collect();

        years
            .into_iter()
            .map(|year| CombinedAnnualRecord {
                year,
                ev_vehicles: ev_by_year.get(&year).copied(),
                avg_pm25: pm25_by_year
                    .get(&year)
                    .filter(|values| !values.is_empty())
                    .map(|values| values.iter().mean()),
            })
            .collect()
    }

    /// Copy out the records matching a filter.
    pub fn filter(vehicles: &[VehicleRecord], filter: &DataFilter) -> Vec<VehicleRecord> {
        vehicles
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    /// Sorted, de-duplicated fuel labels.
    pub fn get_fuels(vehicles: &[VehicleRecord]) -> Vec<String> {
        vehicles
            .iter()
            .map(|r| r.fuel.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted, de-duplicated years.
    pub fn get_years(vehicles: &[VehicleRecord]) -> Vec<i32> {
        vehicles
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One series per fuel label, points ordered by year.
    ///
    /// Duplicate (year, fuel) rows are summed into a single point.
    pub fn trend_series(vehicles: &[VehicleRecord]) -> Vec<FuelSeries> {
        let mut by_fuel: BTreeMap<&str, BTreeMap<i32, i64>> = BTreeMap::new();
        for r in vehicles {
            *by_fuel
                .entry(r.fuel.as_str())
                .or_default()
                .entry(r.year)
                .or_default() += r.vehicles;
        }

        by_fuel
            .into_iter()
            .map(|(fuel, points)| FuelSeries {
                fuel: fuel.to_string(),
                points: points.into_iter().collect(),
            })
            .collect()
    }

    /// Fuel mix for one year, smallest share first.
    ///
    /// Empty when the year has no vehicles.
    pub fn composition(vehicles: &[VehicleRecord], year: i32) -> Vec<CompositionShare> {
        let mut by_fuel: BTreeMap<&str, i64> = BTreeMap::new();
        for r in vehicles.iter().filter(|r| r.year == year) {
            *by_fuel.entry(r.fuel.as_str()).or_default() += r.vehicles;
        }

        let total: i64 = by_fuel.values().sum();
        if total <= 0 {
            return Vec::new();
        }

        let mut shares: Vec<CompositionShare> = by_fuel
            .into_iter()
            .map(|(fuel, count)| CompositionShare {
                fuel: fuel.to_string(),
                vehicles: count,
                percentage: count as f64 / total as f64 * 100.0,
            })
            .collect();
        shares.sort_by(|a, b| {
            a.percentage
                .partial_cmp(&b.percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        shares
    }
}
