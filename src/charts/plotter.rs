//! Chart Plotter Module
//! Creates the interactive dashboard charts using egui_plot.

use crate::charts::{
    composition_title, fuel_rgb, series_rgb, Rgb, ELECTRIC_RGB, EV_PM25_TITLE, NO_DATA, PM25_RGB,
    TREND_TITLE,
};
use crate::data::{
    is_electric, CombinedAnnualRecord, CompositionShare, DashboardData, DataFilter, DataProcessor,
    FuelSeries,
};
use crate::stats::to_millions;
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Line, MarkerShape, Plot, PlotPoints, Points};

/// Everything the three charts draw for one filter selection.
#[derive(Debug, Clone, Default)]
pub struct ChartData {
    pub trends: Vec<FuelSeries>,
    pub composition_year: Option<i32>,
    pub composition: Vec<CompositionShare>,
    pub combined: Vec<CombinedAnnualRecord>,
}

impl ChartData {
    /// Project the snapshot through a filter.
    ///
    /// The composition uses the upper end of the year range, or the latest
    /// filtered year when the range is open.
    pub fn build(data: &DashboardData, filter: &DataFilter) -> Self {
        let filtered = DataProcessor::filter(&data.vehicles, filter);

        let composition_year = filter
            .years
            .map(|(_, end)| end)
            .or_else(|| filtered.iter().map(|r| r.year).max());
        let composition = composition_year
            .map(|year| DataProcessor::composition(&filtered, year))
            .unwrap_or_default();

        Self {
            trends: DataProcessor::trend_series(&filtered),
            composition_year,
            composition,
            combined: data.combined.clone(),
        }
    }

    /// The comparison chart needs at least two years to show a trend.
    pub fn has_comparison(&self) -> bool {
        self.combined.len() >= 2
    }

    /// Electric vehicles in thousands per year, skipping years without EVs.
    pub fn ev_thousands(&self) -> Vec<[f64; 2]> {
        self.combined
            .iter()
            .filter_map(|r| r.ev_vehicles.map(|ev| [r.year as f64, ev as f64 / 1000.0]))
            .collect()
    }

    /// Average PM2.5 per year, skipping years without measurements.
    pub fn pm25_points(&self) -> Vec<[f64; 2]> {
        self.combined
            .iter()
            .filter_map(|r| r.avg_pm25.map(|avg| [r.year as f64, avg]))
            .collect()
    }

    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let first = self.combined.first()?.year;
        let last = self.combined.last()?.year;
        Some((first, last))
    }
}

/// Creates dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn color(rgb: Rgb) -> Color32 {
        Color32::from_rgb(rgb.0, rgb.1, rgb.2)
    }

    /// Only whole years get a tick label.
    fn year_label(value: f64) -> String {
        if value.fract().abs() < 1e-6 {
            format!("{:.0}", value)
        } else {
            String::new()
        }
    }

    /// Labelled placeholder drawn instead of an empty chart.
    pub fn draw_no_data(ui: &mut egui::Ui, title: &str, height: f32) {
        ui.label(RichText::new(title).strong().size(14.0));
        ui.allocate_ui(egui::vec2(ui.available_width(), height), |ui| {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new(NO_DATA).size(18.0).color(Color32::GRAY));
            });
        });
    }

    /// Vehicles (millions) per year, one line per fuel.
    pub fn draw_trend_chart(ui: &mut egui::Ui, chart_data: &ChartData, height: f32) {
        if chart_data.trends.is_empty() {
            Self::draw_no_data(ui, TREND_TITLE, height);
            return;
        }

        ui.label(RichText::new(TREND_TITLE).strong().size(14.0));
        Plot::new("trend_chart")
            .height(height)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Year")
            .y_axis_label("Vehicles (millions)")
            .include_y(0.0)
            .x_axis_formatter(|mark, _range| Self::year_label(mark.value))
            .show(ui, |plot_ui| {
                for (idx, series) in chart_data.trends.iter().enumerate() {
                    let color = Self::color(series_rgb(&series.fuel, idx));
                    let width = if is_electric(&series.fuel) { 3.0 } else { 2.0 };
                    let points: PlotPoints = series
                        .points
                        .iter()
                        .map(|&(year, count)| [year as f64, to_millions(count)])
                        .collect();

                    plot_ui.line(
                        Line::new(points)
                            .color(color)
                            .width(width)
                            .name(&series.fuel),
                    );
                }
            });
    }

    /// Horizontal bars of each fuel's share in the composition year.
    pub fn draw_composition_chart(ui: &mut egui::Ui, chart_data: &ChartData, height: f32) {
        let title = chart_data
            .composition_year
            .map(composition_title)
            .unwrap_or_else(|| "Fuel Composition".to_string());
        if chart_data.composition.is_empty() {
            Self::draw_no_data(ui, &title, height);
            return;
        }

        let labels: Vec<String> = chart_data
            .composition
            .iter()
            .map(|share| share.fuel.clone())
            .collect();
        let bars: Vec<Bar> = chart_data
            .composition
            .iter()
            .enumerate()
            .map(|(i, share)| {
                Bar::new(i as f64, share.percentage)
                    .name(&share.fuel)
                    .fill(Self::color(fuel_rgb(&share.fuel)))
                    .width(0.7)
            })
            .collect();

        ui.label(RichText::new(title).strong().size(14.0));
        Plot::new("composition_chart")
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .x_axis_label("Percentage (%)")
            .include_x(0.0)
            .y_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
            });
    }

    /// Electric vehicles (thousands) above average PM2.5, sharing the year axis.
    pub fn draw_ev_pm25_chart(ui: &mut egui::Ui, chart_data: &ChartData, height: f32) {
        let Some((first, last)) = chart_data.year_bounds().filter(|_| chart_data.has_comparison())
        else {
            Self::draw_no_data(ui, EV_PM25_TITLE, height);
            return;
        };

        ui.label(RichText::new(EV_PM25_TITLE).strong().size(14.0));
        let half = height / 2.0;

        let ev = chart_data.ev_thousands();
        Plot::new("ev_chart")
            .height(half)
            .legend(Legend::default())
            .allow_scroll(false)
            .y_axis_label("EVs (thousands)")
            .include_x(first as f64)
            .include_x(last as f64)
            .include_y(0.0)
            .x_axis_formatter(|mark, _range| Self::year_label(mark.value))
            .show(ui, |plot_ui| {
                let color = Self::color(ELECTRIC_RGB);
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(ev.iter().copied()))
                        .color(color)
                        .width(3.0)
                        .name("Electric Vehicles (thousands)"),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(ev.iter().copied()))
                        .radius(4.0)
                        .color(color),
                );
            });

        let pm25 = chart_data.pm25_points();
        Plot::new("pm25_chart")
            .height(half)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Year")
            .y_axis_label("Avg PM2.5 (µg/m³)")
            .include_x(first as f64)
            .include_x(last as f64)
            .x_axis_formatter(|mark, _range| Self::year_label(mark.value))
            .show(ui, |plot_ui| {
                let color = Self::color(PM25_RGB);
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(pm25.iter().copied()))
                        .color(color)
                        .width(3.0)
                        .name("Avg PM2.5 (µg/m³)"),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(pm25.iter().copied()))
                        .shape(MarkerShape::Diamond)
                        .radius(5.0)
                        .color(color),
                );
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::VehicleRecord;
    use std::path::Path;

    fn vehicle(fuel: &str, vehicles: i64, year: i32) -> VehicleRecord {
        VehicleRecord {
            fuel: fuel.to_string(),
            vehicles,
            year,
        }
    }

    fn snapshot() -> DashboardData {
        DashboardData::from_tables(
            Path::new("data"),
            vec![
                vehicle("Electric", 100, 2019),
                vehicle("Gasoline", 900, 2019),
                vehicle("Electric", 300, 2020),
                vehicle("Gasoline", 700, 2020),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_build_uses_range_end_for_composition() {
        let filter = DataFilter {
            fuels: Vec::new(),
            years: Some((2019, 2019)),
        };

        let chart_data = ChartData::build(&snapshot(), &filter);
        assert_eq!(chart_data.composition_year, Some(2019));
        assert_eq!(chart_data.composition.len(), 2);
        assert_eq!(chart_data.composition[0].fuel, "Electric");
        assert!((chart_data.composition[0].percentage - 10.0).abs() < 1e-9);
        assert!(chart_data
            .trends
            .iter()
            .all(|s| s.points.iter().all(|p| p.0 == 2019)));
    }

    #[test]
    fn test_build_open_range_uses_latest_year() {
        let chart_data = ChartData::build(&snapshot(), &DataFilter::default());
        assert_eq!(chart_data.composition_year, Some(2020));
        assert_eq!(chart_data.trends.len(), 2);
    }

    #[test]
    fn test_comparison_points() {
        let chart_data = ChartData::build(&snapshot(), &DataFilter::default());
        assert!(chart_data.has_comparison());
        assert_eq!(chart_data.year_bounds(), Some((2019, 2020)));
        assert_eq!(chart_data.ev_thousands(), vec![[2019.0, 0.1], [2020.0, 0.3]]);
        assert!(chart_data.pm25_points().is_empty());
    }

    #[test]
    fn test_year_label_only_whole_years() {
        assert_eq!(ChartPlotter::year_label(2020.0), "2020");
        assert_eq!(ChartPlotter::year_label(2020.5), "");
    }
}
