//! Static Chart Renderer
//! Writes the dashboard charts as PNG files using plotters.
//!
//! Output files:
//! 1. `trend.png` - vehicles (millions) per year, one line per fuel
//! 2. `composition.png` - horizontal percentage bars for one year
//! 3. `ev_pm25.png` - EVs (thousands, left axis) against average PM2.5 (right axis)

use crate::charts::{
    composition_title, fuel_rgb, series_rgb, ChartData, Rgb, ELECTRIC_RGB, EV_PM25_TITLE,
    NO_DATA, OTHER_RGB, PM25_RGB, TREND_TITLE,
};
use crate::data::is_electric;
use crate::stats::to_millions;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 700;
const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to prepare output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub struct ChartRenderer;

impl ChartRenderer {
    /// Render all three charts into `out_dir`, returning the written paths.
    pub fn render_all(chart_data: &ChartData, out_dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
        fs::create_dir_all(out_dir)?;

        let trend = out_dir.join("trend.png");
        Self::render_trend(chart_data, &trend)?;

        let composition = out_dir.join("composition.png");
        Self::render_composition(chart_data, &composition)?;

        let ev_pm25 = out_dir.join("ev_pm25.png");
        Self::render_ev_pm25(chart_data, &ev_pm25)?;

        let written = vec![trend, composition, ev_pm25];
        info!(dir = %out_dir.display(), charts = written.len(), "Rendered charts");
        Ok(written)
    }

    pub fn render_trend(chart_data: &ChartData, path: &Path) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let years = chart_data
            .trends
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.0));
        let Some((first, last)) = year_span(years) else {
            return Self::draw_no_data(&root, TREND_TITLE);
        };
        let y_max = padded_max(
            chart_data
                .trends
                .iter()
                .flat_map(|s| s.points.iter().map(|p| to_millions(p.1))),
        );

        let mut chart = ChartBuilder::on(&root)
            .caption(TREND_TITLE, (FONT, 28))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(first as f64 - 0.5..last as f64 + 0.5, 0f64..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Year")
            .y_desc("Vehicles (millions)")
            .x_labels(year_label_count(first, last))
            .x_label_formatter(&|x: &f64| year_tick(*x))
            .draw()
            .map_err(draw_err)?;

        for (idx, series) in chart_data.trends.iter().enumerate() {
            let color = rgb(series_rgb(&series.fuel, idx));
            let width = if is_electric(&series.fuel) { 4 } else { 2 };
            chart
                .draw_series(LineSeries::new(
                    series
                        .points
                        .iter()
                        .map(|&(year, count)| (year as f64, to_millions(count))),
                    color.stroke_width(width),
                ))
                .map_err(draw_err)?
                .label(series.fuel.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }

    pub fn render_composition(chart_data: &ChartData, path: &Path) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let title = chart_data
            .composition_year
            .map(composition_title)
            .unwrap_or_else(|| "Fuel Composition".to_string());
        if chart_data.composition.is_empty() {
            return Self::draw_no_data(&root, &title);
        }

        let n = chart_data.composition.len();
        let x_max = padded_max(chart_data.composition.iter().map(|s| s.percentage)).min(100.0);
        let labels: Vec<&str> = chart_data
            .composition
            .iter()
            .map(|s| s.fuel.as_str())
            .collect();
        let label_for = |y: &f64| {
            let idx = y.round();
            if (y - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels
                .get(idx as usize)
                .map(|l| l.to_string())
                .unwrap_or_default()
        };

        let mut chart = ChartBuilder::on(&root)
            .caption(&title, (FONT, 28))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(180)
            .build_cartesian_2d(0f64..x_max, -0.5f64..n as f64 - 0.5)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc("Percentage (%)")
            .y_desc("Fuel Type")
            .y_labels(n + 1)
            .y_label_formatter(&label_for)
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(chart_data.composition.iter().enumerate().map(|(i, share)| {
                let y = i as f64;
                Rectangle::new(
                    [(0.0, y - 0.35), (share.percentage, y + 0.35)],
                    rgb(fuel_rgb(&share.fuel)).filled(),
                )
            }))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }

    pub fn render_ev_pm25(chart_data: &ChartData, path: &Path) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let Some((first, last)) = chart_data.year_bounds().filter(|_| chart_data.has_comparison())
        else {
            return Self::draw_no_data(&root, EV_PM25_TITLE);
        };

        let ev: Vec<(f64, f64)> = chart_data
            .ev_thousands()
            .into_iter()
            .map(|[x, y]| (x, y))
            .collect();
        let pm25: Vec<(f64, f64)> = chart_data
            .pm25_points()
            .into_iter()
            .map(|[x, y]| (x, y))
            .collect();
        let ev_max = padded_max(ev.iter().map(|p| p.1));
        let pm25_max = padded_max(pm25.iter().map(|p| p.1));
        let x_range = first as f64 - 0.5..last as f64 + 0.5;

        let mut chart = ChartBuilder::on(&root)
            .caption(EV_PM25_TITLE, (FONT, 28))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .right_y_label_area_size(70)
            .build_cartesian_2d(x_range.clone(), 0f64..ev_max)
            .map_err(draw_err)?
            .set_secondary_coord(x_range, 0f64..pm25_max);

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Year")
            .y_desc("Electric Vehicles (thousands)")
            .x_labels(year_label_count(first, last))
            .x_label_formatter(&|x: &f64| year_tick(*x))
            .draw()
            .map_err(draw_err)?;
        chart
            .configure_secondary_axes()
            .y_desc("Average PM2.5 (µg/m³)")
            .draw()
            .map_err(draw_err)?;

        let ev_color = rgb(ELECTRIC_RGB);
        chart
            .draw_series(LineSeries::new(ev.iter().copied(), ev_color.stroke_width(3)))
            .map_err(draw_err)?
            .label("Electric Vehicles (thousands)")
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], ev_color.stroke_width(3))
            });
        chart
            .draw_series(ev.iter().map(|&p| Circle::new(p, 5, ev_color.filled())))
            .map_err(draw_err)?;

        let pm25_color = rgb(PM25_RGB);
        chart
            .draw_secondary_series(LineSeries::new(
                pm25.iter().copied(),
                pm25_color.stroke_width(3),
            ))
            .map_err(draw_err)?
            .label("Avg PM2.5 (µg/m³)")
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], pm25_color.stroke_width(3))
            });
        chart
            .draw_secondary_series(
                pm25.iter()
                    .map(|&p| TriangleMarker::new(p, 7, pm25_color.filled())),
            )
            .map_err(draw_err)?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }

    fn draw_no_data(root: &Area<'_>, title: &str) -> Result<(), RenderError> {
        let area = root.titled(title, (FONT, 28)).map_err(draw_err)?;
        let (w, h) = area.dim_in_pixel();
        area.draw(&Text::new(
            NO_DATA,
            (w as i32 / 2 - 130, h as i32 / 2 - 20),
            (FONT, 36).into_font().color(&rgb(OTHER_RGB)),
        ))
        .map_err(draw_err)?;
        root.present().map_err(draw_err)?;
        Ok(())
    }
}

/// First and last year of a sequence, `None` when it is empty.
fn year_span(years: impl Iterator<Item = i32>) -> Option<(i32, i32)> {
    years.fold(None, |span, year| match span {
        None => Some((year, year)),
        Some((lo, hi)) => Some((lo.min(year), hi.max(year))),
    })
}

/// Axis upper bound with headroom; 1.0 when there is nothing positive to fit.
fn padded_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn year_label_count(first: i32, last: i32) -> usize {
    ((last - first) as usize + 2).min(30)
}

fn year_tick(x: f64) -> String {
    if (x - x.round()).abs() < 1e-6 {
        format!("{:.0}", x)
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_span() {
        assert_eq!(year_span([2019, 2017, 2021].into_iter()), Some((2017, 2021)));
        assert_eq!(year_span(std::iter::empty()), None);
    }

    #[test]
    fn test_padded_max() {
        assert!((padded_max([1.0, 10.0, 5.0].into_iter()) - 11.0).abs() < 1e-9);
        assert_eq!(padded_max(std::iter::empty()), 1.0);
        assert_eq!(padded_max([0.0, f64::NAN].into_iter()), 1.0);
    }

    #[test]
    fn test_year_ticks() {
        assert_eq!(year_tick(2018.0), "2018");
        assert_eq!(year_tick(2018.5), "");
        assert_eq!(year_label_count(2018, 2020), 4);
        assert_eq!(year_label_count(1900, 2020), 30);
    }
}
