use crate::plot::{Figure, Series};

/// The viewer's state, independent of rendering.
pub struct ViewerState {
    /// Figure being shown.
    pub figure: Figure,

    /// Per-series visibility, same order as `figure.series`.
    pub visible: Vec<bool>,
}

impl ViewerState {
    pub fn new(figure: Figure) -> Self {
        let visible = vec![true; figure.series.len()];
        Self { figure, visible }
    }

    /// Flip one series on or off.
    pub fn toggle(&mut self, index: usize) {
        if let Some(flag) = self.visible.get_mut(index) {
            *flag = !*flag;
        }
    }

    /// Show or hide every series.
    pub fn set_all(&mut self, on: bool) {
        self.visible.iter_mut().for_each(|flag| *flag = on);
    }

    /// Series currently switched on.
    pub fn visible_series(&self) -> impl Iterator<Item = &Series> {
        self.figure
            .series
            .iter()
            .zip(&self.visible)
            .filter(|(_, on)| **on)
            .map(|(series, _)| series)
    }

    /// Number of points currently on screen.
    pub fn visible_points(&self) -> usize {
        self.visible_series().map(|s| s.points.len()).sum()
    }
}
