//! Per-scene quality masking and reflectance rescaling.
//!
//! A pixel survives when its QA bits for fill, dilated cloud, cirrus, cloud and
//! cloud shadow are all clear and no band reported radiometric saturation.
//! Masking never touches pixel values: the mask is stored next to them and the
//! original scene stays reachable through [`MaskedScene::original`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::scene::{Scene, SceneError};
use crate::sensors::{ScaleFactor, Sensor};

/// Fill, dilated cloud, cirrus, cloud and cloud shadow flags of `QA_PIXEL`.
pub const QA_FLAG_BITS: u64 = 0b11111;

#[derive(Debug, Clone)]
pub struct Preprocessor {
    qa_band: String,
    saturation_band: String,
    scale_factors: Option<Vec<ScaleFactor>>,
}

/// A scene with its per-pixel validity mask and rescaled bands.
#[derive(Debug, Clone)]
pub struct MaskedScene {
    original: Arc<Scene>,
    bands: BTreeMap<String, Vec<f64>>,
    mask: Vec<bool>,
}

impl Preprocessor {
    pub fn new(qa_band: impl Into<String>, saturation_band: impl Into<String>) -> Self {
        Self {
            qa_band: qa_band.into(),
            saturation_band: saturation_band.into(),
            scale_factors: None,
        }
    }

    /// Masking only, the behaviour of the NDWI workflow.
    pub fn for_sensor(sensor: Sensor) -> Self {
        Self::new(sensor.qa_band(), sensor.saturation_band())
    }

    pub fn with_scale_factors(mut self, factors: Vec<ScaleFactor>) -> Self {
        self.scale_factors = Some(factors);
        self
    }

    pub fn apply(&self, scene: Arc<Scene>) -> Result<MaskedScene, SceneError> {
        let qa = qa_mask(scene.band(&self.qa_band)?);
        let saturation = saturation_mask(scene.band(&self.saturation_band)?);
        let mask = intersect(&qa, &saturation);

        let mut bands = BTreeMap::new();
        if let Some(factors) = &self.scale_factors {
            for factor in factors {
                let values = scene.band(&factor.band)?;
                let mult = scene.property(&factor.mult_key)?;
                let add = scene.property(&factor.add_key)?;
                bands.insert(
                    factor.band.clone(),
                    values.iter().map(|v| v * mult + add).collect(),
                );
            }
        }

        Ok(MaskedScene {
            original: scene,
            bands,
            mask,
        })
    }
}

/// Valid where none of [`QA_FLAG_BITS`] is set. Non-integral QA values are invalid.
pub fn qa_mask(qa: &[f64]) -> Vec<bool> {
    qa.iter()
        .map(|&v| v >= 0.0 && v.fract() == 0.0 && (v as u64) & QA_FLAG_BITS == 0)
        .collect()
}

/// Valid where the saturation band reports nothing.
pub fn saturation_mask(saturation: &[f64]) -> Vec<bool> {
    saturation.iter().map(|&v| v == 0.0).collect()
}

pub fn intersect(a: &[bool], b: &[bool]) -> Vec<bool> {
    a.iter().zip(b).map(|(&x, &y)| x && y).collect()
}

impl MaskedScene {
    pub fn original(&self) -> &Arc<Scene> {
        &self.original
    }

    pub fn id(&self) -> &str {
        self.original.id()
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|&&v| v).count()
    }

    /// Rescaled values when available, otherwise the original band.
    pub fn band(&self, name: &str) -> Result<&[f64], SceneError> {
        match self.bands.get(name) {
            Some(values) => Ok(values),
            None => self.original.band(name),
        }
    }
}
