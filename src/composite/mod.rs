use std::fmt::Display;

use crate::config::YearRange;
use crate::crs::Crs;
use crate::grid::Grid;

pub mod compositor;
pub mod reducer;

pub use compositor::{CompositeOutcome, TemporalCompositor};
pub use reducer::Statistic;

/// One reduced index image, tagged with the year it represents.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyComposite {
    year: i32,
    period: YearRange,
    band: String,
    statistic: Statistic,
    crs: Crs,
    grid: Grid,
    values: Vec<f64>,
    scene_ids: Vec<String>,
}

impl YearlyComposite {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: i32,
        period: YearRange,
        band: String,
        statistic: Statistic,
        crs: Crs,
        grid: Grid,
        values: Vec<f64>,
        scene_ids: Vec<String>,
    ) -> Self {
        debug_assert_eq!(values.len(), grid.len());
        Self {
            year,
            period,
            band,
            statistic,
            crs,
            grid,
            values,
            scene_ids,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Years whose scenes were reduced: the tag year itself, or the whole range
    /// for a combined composite.
    pub fn period(&self) -> YearRange {
        self.period
    }

    pub fn band(&self) -> &str {
        &self.band
    }

    pub fn statistic(&self) -> Statistic {
        self.statistic
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Row-major pixel values, NaN for no-data.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value_at(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.grid.width() || row >= self.grid.height() {
            return None;
        }
        Some(self.values[row * self.grid.width() + col])
    }

    pub fn scene_ids(&self) -> &[String] {
        &self.scene_ids
    }

    pub fn scene_count(&self) -> usize {
        self.scene_ids.len()
    }

    pub fn valid_pixel_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    pub fn is_all_no_data(&self) -> bool {
        self.valid_pixel_count() == 0
    }
}

impl Display for YearlyComposite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "YearlyComposite {{ year: {}, band: {}, scenes: {}, dimensions: {}x{} }}",
            self.year,
            self.band,
            self.scene_ids.len(),
            self.grid.width(),
            self.grid.height()
        )
    }
}
