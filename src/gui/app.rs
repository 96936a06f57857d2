//! Transportation Trends Main Application
//! Main window with control panel and dashboard viewer.

use crate::charts::{ChartData, ChartRenderer};
use crate::data::{DashboardData, DataProcessor};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::stats::StatsCalculator;
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

/// Main application window.
pub struct DashboardApp {
    data: Arc<DashboardData>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async folder loading
    load_rx: Option<Receiver<Arc<DashboardData>>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, data: Arc<DashboardData>) -> Self {
        let mut app = Self {
            data: Arc::new(DashboardData::default()),
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
        };
        app.set_data(data);
        app
    }

    /// Swap in a freshly loaded snapshot and reset the filters.
    fn set_data(&mut self, data: Arc<DashboardData>) {
        self.control_panel.update_options(&data.vehicles);
        let status = if data.is_empty() {
            format!("No data found in {}", data.source_dir.display())
        } else {
            format!(
                "Loaded {} vehicle rows, {} PM2.5 rows",
                data.vehicles.len(),
                data.pm25.len()
            )
        };
        self.control_panel.set_status(&status);
        self.data = data;
        self.refresh();
    }

    /// Recompute everything the viewer shows from the current filter.
    fn refresh(&mut self) {
        let filter = self.control_panel.filter();
        let filtered = DataProcessor::filter(&self.data.vehicles, &filter);

        self.chart_viewer.set_chart_data(
            ChartData::build(&self.data, &filter),
            StatsCalculator::data_summary(&filtered),
            StatsCalculator::summary_cards(&self.data.vehicles),
            StatsCalculator::air_quality_summary(&self.data.pm25, &self.data.combined),
        );
    }

    /// Pick a data folder and load it in a background thread.
    fn handle_open_folder(&mut self) {
        if self.is_loading {
            return;
        }

        let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.data.source_dir)
            .pick_folder()
        else {
            return;
        };

        self.chart_viewer.clear();
        self.control_panel
            .set_status(&format!("Loading {}...", dir.display()));
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let data = DashboardData::load(&dir);
            let _ = tx.send(Arc::new(data));
        });
    }

    /// Check for folder loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(data) => {
                self.is_loading = false;
                self.set_data(data);
            }
            Err(TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(TryRecvError::Disconnected) => {
                error!("Loader thread exited without a result");
                self.is_loading = false;
                self.control_panel.set_status("Error: loading failed");
            }
        }
    }

    fn pick_output_dir(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_directory(&self.data.source_dir)
            .pick_folder()
    }

    /// Render the current charts as PNG files and open the folder.
    fn handle_export_charts(&mut self) {
        let Some(out_dir) = self.pick_output_dir() else {
            return;
        };

        match ChartRenderer::render_all(&self.chart_viewer.chart_data, &out_dir) {
            Ok(written) => {
                self.control_panel.set_status(&format!(
                    "Exported {} charts to {}",
                    written.len(),
                    out_dir.display()
                ));
                if let Err(e) = open::that(&out_dir) {
                    error!(dir = %out_dir.display(), error = %e, "Failed to open export folder");
                }
            }
            Err(e) => {
                error!(error = %e, "Chart export failed");
                self.control_panel.set_status(&format!("Export error: {}", e));
            }
        }
    }

    /// Write the three tables as CSV files.
    fn handle_export_tables(&mut self) {
        let Some(out_dir) = self.pick_output_dir() else {
            return;
        };

        match self.data.export_csv(&out_dir) {
            Ok(written) => {
                info!(dir = %out_dir.display(), files = written.len(), "Tables exported");
                self.control_panel.set_status(&format!(
                    "Exported {} tables to {}",
                    written.len(),
                    out_dir.display()
                ));
            }
            Err(e) => {
                error!(error = %e, "Table export failed");
                self.control_panel.set_status(&format!("Export error: {}", e));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui, self.is_loading);

                    match action {
                        ControlPanelAction::OpenFolder => self.handle_open_folder(),
                        ControlPanelAction::ExportCharts => self.handle_export_charts(),
                        ControlPanelAction::ExportTables => self.handle_export_tables(),
                        ControlPanelAction::FilterChanged => self.refresh(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.is_loading {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
                return;
            }
            self.chart_viewer.show(ui);
        });
    }
}
