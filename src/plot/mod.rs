//! Scatter figures built from tables.
//!
//! A [`Figure`] is backend-neutral: [`render`] turns it into a PNG and
//! [`crate::viewer`] shows it in a window.

pub mod render;

use std::collections::BTreeMap;

use log::warn;

use crate::color::{generate_palette, Rgb, DEFAULT_COLOR};
use crate::data::model::{CombinedTable, Dataset, Table};
use crate::error::{ConvertError, Result};

/// Point opacity used by every backend.
pub const POINT_ALPHA: f32 = 0.6;

/// One coloured group of points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend label; `None` keeps the series out of the legend.
    pub label: Option<String>,
    pub color: Rgb,
    pub points: Vec<[f64; 2]>,
}

/// A titled scatter chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

impl Figure {
    fn new(title: String, x: &str, y: &str) -> Self {
        Figure {
            title,
            x_label: x.to_string(),
            y_label: y.to_string(),
            series: Vec::new(),
        }
    }

    /// Whether any series carries a label.
    pub fn has_legend(&self) -> bool {
        self.series.iter().any(|s| s.label.is_some())
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    /// Min/max of all points as `(x_min, x_max, y_min, y_max)`.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.series.iter().flat_map(|s| s.points.iter());
        let first = points.next()?;
        let init = (first[0], first[0], first[1], first[1]);
        Some(points.fold(init, |(x0, x1, y0, y1), p| {
            (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1]))
        }))
    }

    fn non_empty(self) -> Result<Self> {
        if self.series.is_empty() {
            return Err(ConvertError::EmptyFigure { title: self.title });
        }
        Ok(self)
    }
}

/// One figure for a single table, titled after it.
pub fn table_figure(table: &Table, x: &str, y: &str) -> Result<Figure> {
    let mut figure = Figure::new(format!("{}: {x} vs {y}", table.name()), x, y);
    figure.series.push(Series {
        label: None,
        color: DEFAULT_COLOR,
        points: table.xy_points(x, y)?,
    });
    Ok(figure)
}

/// All tables overlaid, one colour per file.
///
/// Tables missing either column are left out and their errors returned
/// alongside the figure.
pub fn overlay_figure(
    dataset: &Dataset,
    x: &str,
    y: &str,
    legend: bool,
) -> (Result<Figure>, Vec<ConvertError>) {
    let mut figure = Figure::new(format!("Combined Scatterplot of {x} vs {y}"), x, y);
    let mut skipped = Vec::new();
    let palette = generate_palette(dataset.len());

    for (table, color) in dataset.tables().iter().zip(palette) {
        match table.xy_points(x, y) {
            Ok(points) => figure.series.push(Series {
                label: legend.then(|| table.name().to_string()),
                color,
                points,
            }),
            Err(err) => {
                warn!("{err}");
                skipped.push(err);
            }
        }
    }

    (figure.non_empty(), skipped)
}

/// The combined table as one figure. With `legend`, points are split by
/// their `source` value (ascending) and labelled.
pub fn combined_figure(combined: &CombinedTable, x: &str, y: &str, legend: bool) -> Result<Figure> {
    let table = combined.table();
    let mut figure = Figure::new(format!("Scatterplot of {x} vs {y}"), x, y);

    if !legend {
        figure.series.push(Series {
            label: None,
            color: DEFAULT_COLOR,
            points: table.xy_points(x, y)?,
        });
        return Ok(figure);
    }

    let xs = table.numeric_column(x)?;
    let ys = table.numeric_column(y)?;
    let sources = combined.source_values()?;

    let mut groups: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for ((xv, yv), source) in xs.into_iter().zip(ys).zip(sources) {
        let group = groups.entry(source).or_default();
        if let (Some(xv), Some(yv)) = (xv, yv) {
            if xv.is_finite() && yv.is_finite() {
                group.push([xv, yv]);
            }
        }
    }

    let palette = generate_palette(groups.len());
    figure.series = groups
        .into_iter()
        .zip(palette)
        .map(|((source, points), color)| Series {
            label: Some(source.to_string()),
            color,
            points,
        })
        .collect();

    figure.non_empty()
}
