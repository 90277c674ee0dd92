//! Raster output for figures.
//!
//! Figures are drawn with plotters into an in-memory RGB buffer and encoded
//! as PNG with `image`. Text uses DejaVu Sans, compiled into the binary and
//! registered with plotters' `ab_glyph` backend, so no system fonts are
//! needed.

use std::path::Path;
use std::sync::OnceLock;

use image::{ImageFormat, RgbImage};
use log::info;
use plotters::prelude::*;
use plotters::style::register_font;
use plotters_bitmap::BitMapBackend;

use super::{Figure, POINT_ALPHA};
use crate::data::export::ensure_dir;
use crate::error::{ConvertError, Result};

/// Default image size in pixels.
pub const DEFAULT_SIZE: (u32, u32) = (1280, 960);

/// Marker radius in pixels.
const POINT_SIZE: i32 = 4;

/// Fraction of the data range added on each side of the axes.
const PADDING: f64 = 0.05;

/// Family every plotters text style asks for by default.
const FONT_FAMILY: &str = "sans-serif";

static FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Register the embedded font once per process.
fn register_fonts() -> std::result::Result<(), String> {
    static REGISTERED: OnceLock<std::result::Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT).map_err(|_| "invalid embedded font".to_string()))
        .clone()
}

/// Draw `figure` into a new RGB image of the given size.
pub fn render_image(figure: &Figure, (width, height): (u32, u32)) -> Result<RgbImage> {
    let render_err = |message: String| ConvertError::Render {
        target: figure.title.clone(),
        message,
    };

    let mut buffer = vec![255u8; width as usize * height as usize * 3];
    draw(figure, &mut buffer, (width, height)).map_err(render_err)?;

    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| render_err("pixel buffer does not match image size".to_string()))
}

/// Render `figure` and write it to `path` as PNG, creating parent dirs.
pub fn save_png(figure: &Figure, path: &Path, size: (u32, u32)) -> Result<()> {
    let render_err = |message: String| ConvertError::Render {
        target: path.display().to_string(),
        message,
    };

    if let Some(parent) = path.parent() {
        ensure_dir(parent).map_err(|e| render_err(e.to_string()))?;
    }

    let image = render_image(figure, size)?;
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| render_err(e.to_string()))?;

    info!("Saved plot: {}", path.display());
    Ok(())
}

fn draw(figure: &Figure, buffer: &mut [u8], size: (u32, u32)) -> std::result::Result<(), String> {
    let (x_min, x_max, y_min, y_max) = padded_bounds(figure).ok_or("figure has no points")?;
    register_fonts()?;

    let root = BitMapBackend::with_buffer(buffer, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(&figure.title, (FONT_FAMILY, 28))
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .draw()
        .map_err(plot_err)?;

    for series in &figure.series {
        let color = RGBColor(series.color.red, series.color.green, series.color.blue);
        let style = color.mix(POINT_ALPHA as f64).filled();

        let drawn = chart
            .draw_series(
                series
                    .points
                    .iter()
                    .map(|p| Circle::new((p[0], p[1]), POINT_SIZE, style)),
            )
            .map_err(plot_err)?;

        if let Some(label) = &series.label {
            drawn
                .label(label.as_str())
                .legend(move |(x, y)| Circle::new((x, y), POINT_SIZE, color.filled()));
        }
    }

    if figure.has_legend() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Data bounds widened by [`PADDING`]; a flat axis gets ±1.
fn padded_bounds(figure: &Figure) -> Option<(f64, f64, f64, f64)> {
    let (mut x_min, mut x_max, mut y_min, mut y_max) = figure.bounds()?;

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    let x_pad = (x_max - x_min) * PADDING;
    let y_pad = (y_max - y_min) * PADDING;
    Some((x_min - x_pad, x_max + x_pad, y_min - y_pad, y_max + y_pad))
}

fn plot_err<E: std::fmt::Display>(e: E) -> String {
    e.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DEFAULT_COLOR;
    use crate::plot::Series;
    use tempfile::TempDir;

    fn figure(points: Vec<[f64; 2]>) -> Figure {
        Figure {
            title: "test".into(),
            x_label: "temperature".into(),
            y_label: "pressure".into(),
            series: vec![Series {
                label: Some("sample_1".into()),
                color: DEFAULT_COLOR,
                points,
            }],
        }
    }

    #[test]
    fn test_render_draws_points() {
        let image = render_image(&figure(vec![[20.0, 1.0], [60.0, 3.0], [100.0, 5.0]]), (320, 240)).unwrap();
        assert_eq!(image.dimensions(), (320, 240));
        assert!(image.pixels().any(|p| p.0 != [255, 255, 255]));
    }

    #[test]
    fn test_legend_changes_image() {
        let points = vec![[20.0, 1.0], [60.0, 3.0], [100.0, 5.0]];
        let labelled = figure(points.clone());
        let mut plain = figure(points);
        plain.series[0].label = None;

        let with_legend = render_image(&labelled, (320, 240)).unwrap();
        let without = render_image(&plain, (320, 240)).unwrap();
        assert_ne!(with_legend.as_raw(), without.as_raw());
    }

    #[test]
    fn test_title_is_drawn() {
        let titled = figure(vec![[0.0, 0.0], [1.0, 1.0]]);
        let mut untitled = titled.clone();
        untitled.title = String::new();

        let a = render_image(&titled, (320, 240)).unwrap();
        let b = render_image(&untitled, (320, 240)).unwrap();
        assert_ne!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_render_single_point() {
        // Flat ranges must not collapse the axes.
        assert!(render_image(&figure(vec![[1.0, 1.0]]), (200, 200)).is_ok());
    }

    #[test]
    fn test_render_empty_figure_fails() {
        let err = render_image(&figure(Vec::new()), (200, 200)).unwrap_err();
        assert!(matches!(err, ConvertError::Render { .. }));
    }

    #[test]
    fn test_save_png_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plots").join("scatter.png");
        save_png(&figure(vec![[0.0, 0.0], [1.0, 1.0]]), &path, (400, 300)).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 300));
    }

    #[test]
    fn test_padded_bounds() {
        let (x0, x1, y0, y1) = padded_bounds(&figure(vec![[0.0, 10.0], [10.0, 10.0]])).unwrap();
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        assert!(close(x0, -0.5) && close(x1, 10.5));
        assert!(close(y0, 8.9) && close(y1, 11.1));
    }
}
