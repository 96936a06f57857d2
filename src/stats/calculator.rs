//! Statistics Calculator Module
//! Headline figures for the summary cards and the filtered data summary.

use crate::data::{is_electric, CombinedAnnualRecord, Pm25Record, VehicleRecord};
use serde::Serialize;
use std::collections::BTreeSet;

/// Fuel families highlighted next to the total on the summary cards.
pub const CARD_FUELS: [&str; 3] = ["Electric", "Hybrid", "Gasoline"];

/// One headline card, e.g. "Electric Vehicles: 1.2M in 2023".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCard {
    pub title: String,
    pub millions: f64,
    pub year: i32,
}

/// Overview of the currently filtered vehicle rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub year_min: i32,
    pub year_max: i32,
    pub total_millions: f64,
    pub electric_millions: f64,
    pub fuel_types: usize,
    pub data_points: usize,
}

/// Air quality overview across the loaded PM2.5 rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualitySummary {
    pub days: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub cleanest_year: Option<i32>,
}

pub struct StatsCalculator;

impl StatsCalculator {
    /// Cards for the latest year in the table: the total, then one per
    /// entry of [`CARD_FUELS`] matched by substring.
    ///
    /// Empty when there are no vehicles.
    pub fn summary_cards(vehicles: &[VehicleRecord]) -> Vec<SummaryCard> {
        let Some(latest) = vehicles.iter().map(|r| r.year).max() else {
            return Vec::new();
        };
        let latest_rows: Vec<&VehicleRecord> =
            vehicles.iter().filter(|r| r.year == latest).collect();

        let total: i64 = latest_rows.iter().map(|r| r.vehicles).sum();
        let mut cards = vec![SummaryCard {
            title: "Total Vehicles".to_string(),
            millions: to_millions(total),
            year: latest,
        }];

        for fuel in CARD_FUELS {
            let count: i64 = latest_rows
                .iter()
                .filter(|r| r.fuel.contains(fuel))
                .map(|r| r.vehicles)
                .sum();
            cards.push(SummaryCard {
                title: format!("{fuel} Vehicles"),
                millions: to_millions(count),
                year: latest,
            });
        }

        cards
    }

    /// `None` when the filtered rows are empty.
    pub fn data_summary(filtered: &[VehicleRecord]) -> Option<DataSummary> {
        let year_min = filtered.iter().map(|r| r.year).min()?;
        let year_max = filtered.iter().map(|r| r.year).max()?;

        let total: i64 = filtered.iter().map(|r| r.vehicles).sum();
        let electric: i64 = filtered
            .iter()
            .filter(|r| is_electric(&r.fuel))
            .map(|r| r.vehicles)
            .sum();
        let fuel_types = filtered
            .iter()
            .map(|r| r.fuel.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        Some(DataSummary {
            year_min,
            year_max,
            total_millions: to_millions(total),
            electric_millions: to_millions(electric),
            fuel_types,
            data_points: filtered.len(),
        })
    }

    /// `None` when no row carries a concentration.
    pub fn air_quality_summary(
        pm25: &[Pm25Record],
        combined: &[CombinedAnnualRecord],
    ) -> Option<AirQualitySummary> {
        // Scoped here: the trait's min/max would shadow Iterator's elsewhere.
        use statrs::statistics::Statistics;

        let values: Vec<f64> = pm25.iter().filter_map(|r| r.concentration).collect();
        if values.is_empty() {
            return None;
        }

        let cleanest_year = combined
            .iter()
            .filter_map(|r| r.avg_pm25.map(|avg| (r.year, avg)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(year, _)| year);

        Some(AirQualitySummary {
            days: values.len(),
            mean: values.iter().mean(),
            std_dev: if values.len() > 1 {
                values.iter().std_dev()
            } else {
                0.0
            },
            cleanest_year,
        })
    }
}

pub fn to_millions(count: i64) -> f64 {
    count as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn vehicle(fuel: &str, vehicles: i64, year: i32) -> VehicleRecord {
        VehicleRecord {
            fuel: fuel.to_string(),
            vehicles,
            year,
        }
    }

    #[test]
    fn test_summary_cards_use_latest_year() {
        let vehicles = vec![
            vehicle("Electric", 9_000_000, 2019),
            vehicle("Electric", 1_000_000, 2020),
            vehicle("Gasoline Hybrid", 500_000, 2020),
            vehicle("Gasoline", 2_000_000, 2020),
        ];

        let cards = StatsCalculator::summary_cards(&vehicles);
        assert_eq!(cards.len(), 4);
        assert!(cards.iter().all(|c| c.year == 2020));
        assert_eq!(cards[0].title, "Total Vehicles");
        assert!((cards[0].millions - 3.5).abs() < 1e-9);
        assert!((cards[1].millions - 1.0).abs() < 1e-9);
        assert!((cards[2].millions - 0.5).abs() < 1e-9);
        // "Gasoline Hybrid" counts as both gasoline and hybrid.
        assert!((cards[3].millions - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_cards_empty() {
        assert!(StatsCalculator::summary_cards(&[]).is_empty());
    }

    #[test]
    fn test_data_summary() {
        let filtered = vec![
            vehicle("Electric", 250_000, 2018),
            vehicle("Gasoline", 750_000, 2018),
            vehicle("Electric", 500_000, 2021),
        ];

        let summary = StatsCalculator::data_summary(&filtered).unwrap();
        assert_eq!(summary.year_min, 2018);
        assert_eq!(summary.year_max, 2021);
        assert!((summary.total_millions - 1.5).abs() < 1e-9);
        assert!((summary.electric_millions - 0.75).abs() < 1e-9);
        assert_eq!(summary.fuel_types, 2);
        assert_eq!(summary.data_points, 3);

        assert!(StatsCalculator::data_summary(&[]).is_none());
    }

    #[test]
    fn test_air_quality_summary() {
        let rows: Vec<Pm25Record> = [(2019, 4.0), (2019, 6.0), (2020, 2.0)]
            .into_iter()
            .map(|(year, value)| {
                let date = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
                Pm25Record {
                    date,
                    year: date.year(),
                    month: date.month(),
                    concentration: Some(value),
                    extra: Default::default(),
                }
            })
            .collect();
        let combined = vec![
            CombinedAnnualRecord {
                year: 2019,
                ev_vehicles: None,
                avg_pm25: Some(5.0),
            },
            CombinedAnnualRecord {
                year: 2020,
                ev_vehicles: None,
                avg_pm25: Some(2.0),
            },
        ];

        let summary = StatsCalculator::air_quality_summary(&rows, &combined).unwrap();
        assert_eq!(summary.days, 3);
        assert!((summary.mean - 4.0).abs() < 1e-9);
        assert!((summary.std_dev - 2.0).abs() < 1e-9);
        assert_eq!(summary.cleanest_year, Some(2020));

        assert!(StatsCalculator::air_quality_summary(&[], &combined).is_none());
    }
}
