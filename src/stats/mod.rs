//! Statistics module - Summary figures for the dashboard

mod calculator;

pub use calculator::{to_millions, AirQualitySummary, DataSummary, StatsCalculator, SummaryCard};
