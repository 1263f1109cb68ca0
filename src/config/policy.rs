use serde::Deserialize;

/// How the requested years are turned into composites.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    /// One composite per year of the range.
    #[default]
    #[serde(rename(deserialize = "per_year"))]
    PerYear,
    /// A single composite over every year of the range.
    #[serde(rename(deserialize = "combined"))]
    Combined,
}

/// What to do with years backed by few scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoveragePolicy {
    #[default]
    KeepAll,
    /// Skip a year with fewer qualifying scenes, reporting it as a warning.
    MinScenes(usize),
}

/// What to do when one scene cannot be masked or indexed.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneFailurePolicy {
    #[default]
    #[serde(rename(deserialize = "skip"))]
    Skip,
    #[serde(rename(deserialize = "abort"))]
    Abort,
}

impl CoveragePolicy {
    pub fn from_min_scenes(min_scenes: Option<usize>) -> Self {
        match min_scenes {
            Some(n) => CoveragePolicy::MinScenes(n),
            None => CoveragePolicy::KeepAll,
        }
    }

    pub fn accepts(&self, scene_count: usize) -> bool {
        match self {
            CoveragePolicy::KeepAll => true,
            CoveragePolicy::MinScenes(n) => scene_count >= *n,
        }
    }
}
