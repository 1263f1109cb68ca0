use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use crate::bbox::Bbox;
use crate::config::MonthWindow;
use crate::crs::Crs;
use crate::date_gen::SeasonCalendar;
use crate::grid::Grid;

/// Failures tied to the content of one scene.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("scene {scene}: missing band '{band}'")]
    MissingBand { scene: String, band: String },
    #[error("scene {scene}: missing metadata property '{key}'")]
    MissingProperty { scene: String, key: String },
    #[error("scene {scene}: band '{band}' has {len} pixels, its grid expects {expected}")]
    BandLength {
        scene: String,
        band: String,
        len: usize,
        expected: usize,
    },
    #[error("scene {scene}: CRS {found} differs from output CRS {expected}")]
    CrsMismatch {
        scene: String,
        found: Crs,
        expected: Crs,
    },
    #[error("scene {scene}: {reason}")]
    Unreadable { scene: String, reason: String },
}

/// A scene the source found but could not load.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedScene {
    pub id: String,
    pub acquired: NaiveDate,
    pub footprint: Bbox,
    pub error: SceneError,
}

/// One satellite observation. Band values are row-major over `grid`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    id: String,
    acquired: NaiveDate,
    crs: Crs,
    grid: Grid,
    bands: BTreeMap<String, Vec<f64>>,
    properties: BTreeMap<String, f64>,
}

impl Scene {
    pub fn new(id: impl Into<String>, acquired: NaiveDate, crs: Crs, grid: Grid) -> Self {
        Self {
            id: id.into(),
            acquired,
            crs,
            grid,
            bands: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_band(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self, SceneError> {
        let name = name.into();
        if values.len() != self.grid.len() {
            return Err(SceneError::BandLength {
                scene: self.id.clone(),
                band: name,
                len: values.len(),
                expected: self.grid.len(),
            });
        }

        self.bands.insert(name, values);
        Ok(self)
    }

    pub fn with_property(mut self, key: impl Into<String>, value: f64) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn acquired(&self) -> NaiveDate {
        self.acquired
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn footprint(&self) -> Bbox {
        self.grid.footprint()
    }

    pub fn band(&self, name: &str) -> Result<&[f64], SceneError> {
        self.bands
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SceneError::MissingBand {
                scene: self.id.clone(),
                band: name.to_string(),
            })
    }

    pub fn property(&self, key: &str) -> Result<f64, SceneError> {
        self.properties
            .get(key)
            .copied()
            .ok_or_else(|| SceneError::MissingProperty {
                scene: self.id.clone(),
                key: key.to_string(),
            })
    }

    /// The scene restricted to the pixels overlapping `region`; shared as is when
    /// it already lies inside the region.
    pub fn crop(self: &Arc<Self>, region: &Bbox) -> Option<Arc<Scene>> {
        let window = self.grid.window(region)?;
        if window.width == self.grid.width() && window.height == self.grid.height() {
            return Some(Arc::clone(self));
        }

        let bands = self
            .bands
            .iter()
            .map(|(name, values)| (name.clone(), self.grid.crop_values(&window, values)))
            .collect();

        Some(Arc::new(Scene {
            id: self.id.clone(),
            acquired: self.acquired,
            crs: self.crs,
            grid: self.grid.subgrid(&window),
            bands,
            properties: self.properties.clone(),
        }))
    }
}

impl Display for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene {{ id: {}, acquired: {}, bands: {}, dimensions: {}x{} }}",
            self.id,
            self.acquired,
            self.bands.len(),
            self.grid.width(),
            self.grid.height()
        )
    }
}

/// Scenes of one collection, in source order, plus the ones that failed to load.
#[derive(Debug, Clone, Default)]
pub struct SceneCollection {
    collection: String,
    scenes: Vec<Arc<Scene>>,
    failures: Vec<FailedScene>,
}

impl SceneCollection {
    pub fn new(collection: impl Into<String>, scenes: Vec<Arc<Scene>>) -> Self {
        Self {
            collection: collection.into(),
            scenes,
            failures: Vec::new(),
        }
    }

    pub fn with_failures(mut self, failures: Vec<FailedScene>) -> Self {
        self.failures = failures;
        self
    }

    /// Scenes that matched the query but could not be loaded. Filters apply to them too.
    pub fn failures(&self) -> &[FailedScene] {
        &self.failures
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Scene>> {
        self.scenes.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.scenes.iter().map(|s| s.id().to_string()).collect()
    }

    pub fn filter_bounds(&self, region: &Bbox) -> Self {
        self.filter(|_, footprint| footprint.intersects(region))
    }

    pub fn filter_date(&self, start: NaiveDate, end: NaiveDate) -> Self {
        self.filter(|acquired, _| (start..=end).contains(&acquired))
    }

    pub fn filter_months(&self, window: &MonthWindow) -> Self {
        self.filter(|acquired, _| window.contains(acquired.month()))
    }

    /// Keep scenes whose composite year under `calendar` satisfies `keep`.
    pub fn filter_season_years<F>(&self, calendar: &SeasonCalendar, keep: F) -> Self
    where
        F: Fn(i32) -> bool,
    {
        self.filter(|acquired, _| calendar.season_year(acquired).is_some_and(&keep))
    }

    /// Applies `predicate` to the acquisition date and footprint of every scene and failure.
    fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(NaiveDate, &Bbox) -> bool,
    {
        Self {
            collection: self.collection.clone(),
            scenes: self
                .scenes
                .iter()
                .filter(|scene| predicate(scene.acquired(), &scene.footprint()))
                .cloned()
                .collect(),
            failures: self
                .failures
                .iter()
                .filter(|failed| predicate(failed.acquired, &failed.footprint))
                .cloned()
                .collect(),
        }
    }
}

impl IntoIterator for SceneCollection {
    type Item = Arc<Scene>;
    type IntoIter = std::vec::IntoIter<Arc<Scene>>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenes.into_iter()
    }
}
