//! Typed rows for the three dashboard tables.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Vehicles registered for one fuel label in one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleRecord {
    pub fuel: String,
    pub vehicles: i64,
    pub year: i32,
}

/// One daily PM2.5 observation.
///
/// `year` and `month` always come from `date`. Source columns other than the
/// date and the concentration are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pm25Record {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub concentration: Option<f64>,
    pub extra: BTreeMap<String, String>,
}

/// Electric vehicle total and average PM2.5 for a single year.
///
/// Either side is `None` when the year only exists in the other table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedAnnualRecord {
    pub year: i32,
    pub ev_vehicles: Option<i64>,
    pub avg_pm25: Option<f64>,
}
