use serde::Deserialize;

use crate::config::ConfigError;

/// Per-pixel temporal reduction.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
pub enum Statistic {
    #[default]
    #[serde(rename(deserialize = "median"))]
    Median,
    #[serde(rename(deserialize = "percentile"))]
    Percentile(f64),
}

impl Statistic {
    pub fn percentile(&self) -> f64 {
        match self {
            Statistic::Median => 50.0,
            Statistic::Percentile(p) => *p,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.percentile();
        if !(0.0..=100.0).contains(&p) {
            return Err(ConfigError::Percentile(p));
        }
        Ok(())
    }

    /// Median keeps the index name, a percentile appends `_p<p>` (e.g. `SR_NDVI_p90`).
    pub fn band_name(&self, index: &str) -> String {
        match self {
            Statistic::Median => index.to_string(),
            Statistic::Percentile(p) => format!("{}_p{}", index, p),
        }
    }

    /// Reduce the finite entries of `values`, NaN when there are none.
    /// Percentiles interpolate linearly between the closest ranks.
    pub fn reduce(&self, values: &mut Vec<f64>) -> f64 {
        values.retain(|v| v.is_finite());
        if values.is_empty() {
            return f64::NAN;
        }

        values.sort_by(f64::total_cmp);

        let rank = self.percentile() * (values.len() - 1) as f64 / 100.0;
        let lower = rank.floor() as usize;
        let upper = rank.ceil() as usize;
        let weight = rank - lower as f64;

        values[lower] + (values[upper] - values[lower]) * weight
    }
}
