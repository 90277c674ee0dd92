use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Plot, PlotPoints, Points};

use super::state::ViewerState;
use crate::plot::{Series, POINT_ALPHA};

/// Marker radius in screen points.
const POINT_RADIUS: f32 = 2.5;

// ---------------------------------------------------------------------------
// Scatter plot (central panel)
// ---------------------------------------------------------------------------

/// Render the visible series as a zoomable scatter plot.
pub fn scatter_plot(ui: &mut Ui, state: &ViewerState) {
    let figure = &state.figure;
    let alpha = (POINT_ALPHA * 255.0).round() as u8;

    let mut plot = Plot::new("scatter_plot")
        .x_axis_label(figure.x_label.as_str())
        .y_axis_label(figure.y_label.as_str())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if figure.has_legend() {
        plot = plot.legend(Legend::default());
    }

    plot.show(ui, |plot_ui| {
        for series in state.visible_series() {
            let points: PlotPoints = series.points.iter().copied().collect();
            let mut markers = Points::new(points)
                .color(to_color32(series, alpha))
                .radius(POINT_RADIUS)
                .filled(true);
            if let Some(label) = &series.label {
                markers = markers.name(label);
            }
            plot_ui.points(markers);
        }
    });
}

/// Series colour at the given opacity.
pub fn to_color32(series: &Series, alpha: u8) -> Color32 {
    let c = series.color;
    Color32::from_rgba_unmultiplied(c.red, c.green, c.blue, alpha)
}
