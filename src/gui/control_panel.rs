//! Control Panel Widget
//! Left side panel with the fuel and year filters and the file actions.

use crate::data::{DataFilter, DataProcessor, VehicleRecord};
use egui::{RichText, ScrollArea, Slider};

/// Number of fuels selected after a load.
const DEFAULT_SELECTED_FUELS: usize = 3;

/// Left side control panel with filters and actions.
pub struct ControlPanel {
    pub fuels: Vec<String>,
    pub selected_fuels: Vec<bool>,
    pub years: Vec<i32>,
    pub year_start: i32,
    pub year_end: i32,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            fuels: Vec::new(),
            selected_fuels: Vec::new(),
            years: Vec::new(),
            year_start: 0,
            year_end: 0,
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the options after a (re)load: first fuels selected, full year span.
    pub fn update_options(&mut self, vehicles: &[VehicleRecord]) {
        self.fuels = DataProcessor::get_fuels(vehicles);
        self.selected_fuels = (0..self.fuels.len())
            .map(|i| i < DEFAULT_SELECTED_FUELS)
            .collect();
        self.years = DataProcessor::get_years(vehicles);
        self.year_start = self.years.first().copied().unwrap_or(0);
        self.year_end = self.years.last().copied().unwrap_or(0);
    }

    /// The current selection. No ticked fuel means every fuel.
    pub fn filter(&self) -> DataFilter {
        let fuels = self
            .fuels
            .iter()
            .zip(self.selected_fuels.iter())
            .filter(|(_, &selected)| selected)
            .map(|(fuel, _)| fuel.clone())
            .collect();
        let years = if self.years.is_empty() {
            None
        } else {
            Some((self.year_start, self.year_end))
        };
        DataFilter { fuels, years }
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    /// Keep `year_start <= year_end`, moving whichever bound was not just edited.
    fn clamp_years(&mut self, start_moved: bool) {
        if self.year_start > self.year_end {
            if start_moved {
                self.year_end = self.year_start;
            } else {
                self.year_start = self.year_end;
            }
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, busy: bool) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.heading("Transportation Trends");
        ui.label(RichText::new("California vehicles & PM2.5").weak());
        ui.separator();

        ui.label(RichText::new("Data").strong());
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!busy, egui::Button::new("Open data folder..."))
                .clicked()
            {
                action = ControlPanelAction::OpenFolder;
            }
        });
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!busy, egui::Button::new("Export charts..."))
                .clicked()
            {
                action = ControlPanelAction::ExportCharts;
            }
            if ui
                .add_enabled(!busy, egui::Button::new("Export tables..."))
                .clicked()
            {
                action = ControlPanelAction::ExportTables;
            }
        });

        ui.add_space(8.0);
        ui.label(RichText::new("Filters").strong());
        ui.separator();

        ui.label("Fuel Types");
        if self.fuels.is_empty() {
            ui.label(RichText::new("No fuel types loaded").weak());
        } else {
            ui.horizontal(|ui| {
                if ui.small_button("All").clicked() {
                    self.selected_fuels.iter_mut().for_each(|s| *s = true);
                    action = ControlPanelAction::FilterChanged;
                }
                if ui.small_button("None").clicked() {
                    self.selected_fuels.iter_mut().for_each(|s| *s = false);
                    action = ControlPanelAction::FilterChanged;
                }
            });
            ScrollArea::vertical()
                .id_salt("fuel_list")
                .max_height(220.0)
                .show(ui, |ui| {
                    for (fuel, selected) in self.fuels.iter().zip(self.selected_fuels.iter_mut()) {
                        if ui.checkbox(selected, fuel.as_str()).changed() {
                            action = ControlPanelAction::FilterChanged;
                        }
                    }
                });
        }

        ui.add_space(8.0);
        ui.label("Year Range");
        if let (Some(&min), Some(&max)) = (self.years.first(), self.years.last()) {
            let start_changed = ui
                .add(Slider::new(&mut self.year_start, min..=max).text("From"))
                .changed();
            let end_changed = ui
                .add(Slider::new(&mut self.year_end, min..=max).text("To"))
                .changed();
            if start_changed || end_changed {
                self.clamp_years(start_changed);
                action = ControlPanelAction::FilterChanged;
            }
        } else {
            ui.label(RichText::new("No years loaded").weak());
        }

        ui.add_space(8.0);
        ui.separator();
        ui.label(RichText::new(&self.status).small());

        action
    }
}

/// Actions that can be triggered from the control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    OpenFolder,
    ExportCharts,
    ExportTables,
    FilterChanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(fuel: &str, year: i32) -> VehicleRecord {
        VehicleRecord {
            fuel: fuel.to_string(),
            vehicles: 1,
            year,
        }
    }

    #[test]
    fn test_update_options_selects_first_three_fuels() {
        let mut panel = ControlPanel::new();
        panel.update_options(&[
            vehicle("Gasoline", 2020),
            vehicle("Diesel", 2018),
            vehicle("Electric", 2019),
            vehicle("Flex-Fuel", 2021),
        ]);

        assert_eq!(panel.fuels, vec!["Diesel", "Electric", "Flex-Fuel", "Gasoline"]);
        assert_eq!(panel.selected_fuels, vec![true, true, true, false]);
        assert_eq!((panel.year_start, panel.year_end), (2018, 2021));

        let filter = panel.filter();
        assert_eq!(filter.fuels, vec!["Diesel", "Electric", "Flex-Fuel"]);
        assert_eq!(filter.years, Some((2018, 2021)));
    }

    #[test]
    fn test_empty_data_has_open_filter() {
        let mut panel = ControlPanel::new();
        panel.update_options(&[]);
        assert_eq!(panel.filter(), DataFilter::default());
    }

    #[test]
    fn test_clamp_years_moves_other_bound() {
        let mut panel = ControlPanel::new();
        panel.year_start = 2021;
        panel.year_end = 2019;
        panel.clamp_years(true);
        assert_eq!((panel.year_start, panel.year_end), (2021, 2021));

        panel.year_start = 2021;
        panel.year_end = 2019;
        panel.clamp_years(false);
        assert_eq!((panel.year_start, panel.year_end), (2019, 2019));
    }
}
