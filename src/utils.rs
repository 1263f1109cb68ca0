use std::fmt::Display;

use crate::collection::CompositeCollection;
use crate::composite::YearlyComposite;

/// Summary of one composite's valid pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeStatistics {
    pub year: i32,
    pub band: String,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub valid_pixels: usize,
    pub total_pixels: usize,
}

impl CompositeStatistics {
    /// Statistics of the composite tagged `year`, `None` when the collection has none.
    pub fn for_year(collection: &CompositeCollection, year: i32) -> Option<Self> {
        collection.get(year).map(Self::from_composite)
    }

    pub fn from_composite(composite: &YearlyComposite) -> Self {
        let valid: Vec<f64> = composite
            .values()
            .iter()
            .filter(|v| !v.is_nan())
            .copied()
            .collect();

        let mean = if valid.is_empty() {
            f64::NAN
        } else {
            valid.iter().sum::<f64>() / valid.len() as f64
        };

        Self {
            year: composite.year(),
            band: composite.band().to_string(),
            min: valid.iter().fold(f64::INFINITY, |a, &b| a.min(b)),
            max: valid.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)),
            mean,
            valid_pixels: valid.len(),
            total_pixels: composite.values().len(),
        }
    }

    pub fn valid_share(&self) -> f64 {
        if self.total_pixels == 0 {
            return 0.0;
        }
        self.valid_pixels as f64 / self.total_pixels as f64
    }
}

impl Display for CompositeStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} {}:", self.band, self.year)?;
        if self.valid_pixels == 0 {
            return write!(f, "  No valid pixels ({} total)", self.total_pixels);
        }
        writeln!(f, "  Min: {:.4}", self.min)?;
        writeln!(f, "  Max: {:.4}", self.max)?;
        writeln!(f, "  Mean: {:.4}", self.mean)?;
        write!(
            f,
            "  Valid pixels: {} / {} ({:.1}%)",
            self.valid_pixels,
            self.total_pixels,
            100.0 * self.valid_share()
        )
    }
}
