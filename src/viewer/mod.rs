//! Interactive window for a single figure, used when no image path is given.

mod panels;
mod plot;
pub mod state;

use eframe::egui;
use log::info;

use crate::error::{ConvertError, Result};
use crate::plot::Figure;
use state::ViewerState;

/// Open a window showing `figure` and block until it is closed.
pub fn show(figure: Figure) -> Result<()> {
    info!("Showing '{}' ({} points)", figure.title, figure.point_count());

    let title = figure.title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(&title)
            .with_inner_size([1000.0, 750.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(FigureViewer::new(figure)))),
    )
    .map_err(|e| ConvertError::Viewer(e.to_string()))
}

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

struct FigureViewer {
    state: ViewerState,
}

impl FigureViewer {
    fn new(figure: Figure) -> Self {
        Self {
            state: ViewerState::new(figure),
        }
    }
}

impl eframe::App for FigureViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: title + counts ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state);
        });

        // ---- Left side panel: series toggles (only worth it with a legend) ----
        if self.state.figure.has_legend() {
            egui::SidePanel::left("series_panel")
                .default_width(200.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::series_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::scatter_plot(ui, &self.state);
        });
    }
}
