use crate::config::ConfigError;
use crate::preprocess::MaskedScene;
use crate::scene::SceneError;

/// Normalized difference `(A - B) / (A + B)` of two named bands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDifference {
    name: String,
    band_a: String,
    band_b: String,
}

/// A masked scene with one derived index band appended.
#[derive(Debug, Clone)]
pub struct IndexedScene {
    scene: MaskedScene,
    name: String,
    values: Vec<f64>,
}

impl NormalizedDifference {
    pub fn new(
        name: impl Into<String>,
        band_a: impl Into<String>,
        band_b: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let (name, band_a, band_b) = (name.into(), band_a.into(), band_b.into());

        if name.trim().is_empty() {
            return Err(ConfigError::Empty("index name"));
        }
        if band_a.trim().is_empty() || band_b.trim().is_empty() {
            return Err(ConfigError::Empty("index band"));
        }
        if band_a == band_b {
            return Err(ConfigError::SameBands {
                index: name,
                band: band_a,
            });
        }

        Ok(Self {
            name,
            band_a,
            band_b,
        })
    }

    /// McFeeters NDWI on Landsat 8/9: green (B3) against NIR (B5).
    pub fn ndwi() -> Self {
        Self {
            name: "NDWI".to_string(),
            band_a: "SR_B3".to_string(),
            band_b: "SR_B5".to_string(),
        }
    }

    /// NDVI on Landsat 8/9: NIR (B5) against red (B4).
    pub fn ndvi() -> Self {
        Self {
            name: "SR_NDVI".to_string(),
            band_a: "SR_B5".to_string(),
            band_b: "SR_B4".to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn band_a(&self) -> &str {
        &self.band_a
    }

    pub fn band_b(&self) -> &str {
        &self.band_b
    }

    /// Per-pixel index, NaN where the pixel is masked or undefined.
    pub fn compute(&self, scene: &MaskedScene) -> Result<Vec<f64>, SceneError> {
        let a = scene.band(&self.band_a)?;
        let b = scene.band(&self.band_b)?;

        Ok(a.iter()
            .zip(b)
            .zip(scene.mask())
            .map(|((&a, &b), &valid)| {
                if valid {
                    normalized_difference(a, b).unwrap_or(f64::NAN)
                } else {
                    f64::NAN
                }
            })
            .collect())
    }

    pub fn apply(&self, scene: MaskedScene) -> Result<IndexedScene, SceneError> {
        let values = self.compute(&scene)?;
        Ok(IndexedScene {
            scene,
            name: self.name.clone(),
            values,
        })
    }
}

/// `None` when either input is not finite or `a + b == 0`.
pub fn normalized_difference(a: f64, b: f64) -> Option<f64> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }

    let sum = a + b;
    if sum == 0.0 {
        return None;
    }

    Some((a - b) / sum)
}

impl IndexedScene {
    pub fn masked(&self) -> &MaskedScene {
        &self.scene
    }

    pub fn index_name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn band(&self, name: &str) -> Result<&[f64], SceneError> {
        if name == self.name {
            Ok(&self.values)
        } else {
            self.scene.band(name)
        }
    }
}
