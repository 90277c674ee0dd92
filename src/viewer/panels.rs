use eframe::egui::{Color32, RichText, ScrollArea, Ui};

use super::plot::to_color32;
use super::state::ViewerState;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

pub fn top_bar(ui: &mut Ui, state: &ViewerState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(&state.figure.title);
        ui.separator();
        ui.label(format!(
            "{} of {} points",
            state.visible_points(),
            state.figure.point_count()
        ));
    });
}

// ---------------------------------------------------------------------------
// Left side panel – one toggle per series
// ---------------------------------------------------------------------------

pub fn series_panel(ui: &mut Ui, state: &mut ViewerState) {
    ui.heading("Sources");
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.set_all(true);
        }
        if ui.small_button("None").clicked() {
            state.set_all(false);
        }
    });
    ui.separator();

    let mut toggled = None;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (i, series) in state.figure.series.iter().enumerate() {
                let label = series.label.as_deref().unwrap_or("(unlabelled)");
                let color = if state.visible[i] {
                    to_color32(series, 255)
                } else {
                    Color32::GRAY
                };
                let mut on = state.visible[i];
                let text = RichText::new(format!("{label} ({})", series.points.len())).color(color);
                if ui.checkbox(&mut on, text).changed() {
                    toggled = Some(i);
                }
            }
        });

    if let Some(i) = toggled {
        state.toggle(i);
    }
}
