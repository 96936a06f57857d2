//! Chart Viewer Widget
//! Central scrollable panel: headline cards, the filtered data summary and
//! the three interactive charts.

use crate::charts::{fuel_rgb, ChartData, ChartPlotter, DIESEL_RGB};
use crate::stats::{AirQualitySummary, DataSummary, SummaryCard};
use egui::{Color32, RichText, ScrollArea};

const CHART_SPACING: f32 = 15.0;
const TREND_HEIGHT: f32 = 320.0;
const LOWER_HEIGHT: f32 = 360.0;
const CARD_WIDTH: f32 = 170.0;

/// Scrollable dashboard body.
#[derive(Default)]
pub struct ChartViewer {
    pub chart_data: ChartData,
    pub summary: Option<DataSummary>,
    pub cards: Vec<SummaryCard>,
    pub air_quality: Option<AirQualitySummary>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set_chart_data(
        &mut self,
        chart_data: ChartData,
        summary: Option<DataSummary>,
        cards: Vec<SummaryCard>,
        air_quality: Option<AirQualitySummary>,
    ) {
        self.chart_data = chart_data;
        self.summary = summary;
        self.cards = cards;
        self.air_quality = air_quality;
    }

    /// The "Total" card is blue, fuel cards take their fuel's color.
    fn card_color(card: &SummaryCard) -> Color32 {
        if card.title.starts_with("Total") {
            ChartPlotter::color(DIESEL_RGB)
        } else {
            ChartPlotter::color(fuel_rgb(&card.title))
        }
    }

    fn summary_text(summary: &DataSummary) -> String {
        format!(
            "Years {}-{}  |  {:.2}M vehicles ({:.2}M electric)  |  {} fuel types  |  {} data points",
            summary.year_min,
            summary.year_max,
            summary.total_millions,
            summary.electric_millions,
            summary.fuel_types,
            summary.data_points
        )
    }

    fn air_quality_text(air: &AirQualitySummary) -> String {
        let mut text = format!(
            "PM2.5: {} daily readings, mean {:.2} µg/m³ (sd {:.2})",
            air.days, air.mean, air.std_dev
        );
        if let Some(year) = air.cleanest_year {
            text.push_str(&format!(", cleanest year {year}"));
        }
        text
    }

    fn draw_cards(&self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            for card in &self.cards {
                egui::Frame::none()
                    .fill(Self::card_color(card))
                    .rounding(8.0)
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.set_width(CARD_WIDTH);
                        ui.vertical(|ui| {
                            ui.label(RichText::new(&card.title).size(13.0).color(Color32::WHITE));
                            ui.label(
                                RichText::new(format!("{:.2}M", card.millions))
                                    .size(24.0)
                                    .strong()
                                    .color(Color32::WHITE),
                            );
                            ui.label(
                                RichText::new(format!("in {}", card.year))
                                    .size(11.0)
                                    .color(Color32::WHITE),
                            );
                        });
                    });
                ui.add_space(CHART_SPACING / 2.0);
            }
        });
    }

    /// Draw the dashboard.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if !self.cards.is_empty() {
                    self.draw_cards(ui);
                    ui.add_space(CHART_SPACING);
                }

                match &self.summary {
                    Some(summary) => {
                        ui.label(RichText::new(Self::summary_text(summary)).size(14.0));
                    }
                    None => {
                        ui.label(
                            RichText::new("No data available for selected filters")
                                .size(14.0)
                                .color(Color32::GRAY),
                        );
                    }
                }
                if let Some(air) = &self.air_quality {
                    ui.label(RichText::new(Self::air_quality_text(air)).weak());
                }
                ui.add_space(CHART_SPACING);

                ChartPlotter::draw_trend_chart(ui, &self.chart_data, TREND_HEIGHT);
                ui.add_space(CHART_SPACING);

                let chart_data = &self.chart_data;
                ui.columns(2, |columns| {
                    ChartPlotter::draw_composition_chart(&mut columns[0], chart_data, LOWER_HEIGHT);
                    ChartPlotter::draw_ev_pm25_chart(&mut columns[1], chart_data, LOWER_HEIGHT);
                });
            });
    }
}
