use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::bbox::Bbox;
use crate::composite::Statistic;
use crate::crs::Crs;
use crate::date_gen::SeasonCalendar;
use crate::grid::Grid;
use crate::index::NormalizedDifference;
use crate::sensors::Sensor;

pub mod error;
pub use error::ConfigError;

pub mod month_window;
pub use month_window::{MonthWindow, SeasonAttribution, YearRange};

pub mod policy;
pub use policy::{CompositeMode, CoveragePolicy, SceneFailurePolicy};

/// Where and how composites are exported.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExportSettings {
    /// Per-year exports are named `<prefix>_<year>`, a combined export `<prefix>`.
    pub prefix: String,
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Output pixel size in CRS units (meters).
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub crs: Crs,
    #[serde(default = "default_max_pixels")]
    pub max_pixels: u64,
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
}

fn default_folder() -> String {
    "GEE".to_string()
}

fn default_scale() -> f64 {
    30.0
}

fn default_max_pixels() -> u64 {
    200_000_000
}

fn default_output_root() -> PathBuf {
    PathBuf::from("./output")
}

impl ExportSettings {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            folder: default_folder(),
            scale: default_scale(),
            crs: Crs::default(),
            max_pixels: default_max_pixels(),
            output_root: default_output_root(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    sensor: Sensor,
    collection: String,
    region: Bbox,
    index: NormalizedDifference,
    calendar: SeasonCalendar,
    years: YearRange,
    mode: CompositeMode,
    statistic: Statistic,
    rescale: bool,
    coverage: CoveragePolicy,
    scene_failures: SceneFailurePolicy,
    export: ExportSettings,
    scene_root: Option<PathBuf>,
    preview_year: Option<i32>,
}

// Deserializes through a helper so every value is checked the same way as `Config::new`,
// then runs the full validation before handing the config out.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            sensor: Sensor,
            collection: Option<String>,
            region: BboxHelper,
            index: IndexHelper,
            months: RangeHelper<u32>,
            years: RangeHelper<i32>,
            season_attribution: Option<SeasonAttribution>,
            #[serde(default)]
            mode: CompositeMode,
            #[serde(default)]
            statistic: Statistic,
            #[serde(default)]
            rescale: bool,
            min_scenes: Option<usize>,
            #[serde(default)]
            scene_failures: SceneFailurePolicy,
            export: ExportSettings,
            scene_root: Option<PathBuf>,
            preview_year: Option<i32>,
        }

        #[derive(Deserialize)]
        struct BboxHelper {
            xmin: f64,
            xmax: f64,
            ymin: f64,
            ymax: f64,
        }

        #[derive(Deserialize)]
        struct IndexHelper {
            name: String,
            band_a: String,
            band_b: String,
        }

        #[derive(Deserialize)]
        struct RangeHelper<T> {
            start: T,
            end: T,
        }

        let helper = ConfigHelper::deserialize(deserializer)?;

        let region = Bbox::new(
            helper.region.xmin,
            helper.region.xmax,
            helper.region.ymin,
            helper.region.ymax,
        )
        .map_err(|e| D::Error::custom(format!("Invalid region: {}", e)))?;

        let index =
            NormalizedDifference::new(helper.index.name, helper.index.band_a, helper.index.band_b)
                .map_err(D::Error::custom)?;

        let months =
            MonthWindow::new(helper.months.start, helper.months.end).map_err(D::Error::custom)?;
        let years =
            YearRange::new(helper.years.start, helper.years.end).map_err(D::Error::custom)?;

        let mut config = Config::new(
            helper.sensor,
            region,
            index,
            months,
            helper.season_attribution,
            years,
            helper.export,
        )
        .map_err(D::Error::custom)?
        .with_mode(helper.mode)
        .with_statistic(helper.statistic)
        .with_rescale(helper.rescale)
        .with_coverage(CoveragePolicy::from_min_scenes(helper.min_scenes))
        .with_scene_failures(helper.scene_failures);

        if let Some(collection) = helper.collection {
            config.collection = collection;
        }
        config.scene_root = helper.scene_root;
        config.preview_year = helper.preview_year;

        config.validate().map_err(D::Error::custom)?;

        Ok(config)
    }
}

impl Config {
    pub fn new(
        sensor: Sensor,
        region: Bbox,
        index: NormalizedDifference,
        months: MonthWindow,
        season_attribution: Option<SeasonAttribution>,
        years: YearRange,
        export: ExportSettings,
    ) -> Result<Self, ConfigError> {
        let calendar = SeasonCalendar::new(months, season_attribution)?;

        let config = Self {
            sensor,
            collection: sensor.collection_id().to_string(),
            region,
            index,
            calendar,
            years,
            mode: CompositeMode::default(),
            statistic: Statistic::default(),
            rescale: false,
            coverage: CoveragePolicy::default(),
            scene_failures: SceneFailurePolicy::default(),
            export,
            scene_root: None,
            preview_year: None,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader).map_err(ConfigError::from)?;

        Ok(config)
    }

    pub fn with_mode(mut self, mode: CompositeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_statistic(mut self, statistic: Statistic) -> Self {
        self.statistic = statistic;
        self
    }

    pub fn with_rescale(mut self, rescale: bool) -> Self {
        self.rescale = rescale;
        self
    }

    pub fn with_coverage(mut self, coverage: CoveragePolicy) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_scene_failures(mut self, policy: SceneFailurePolicy) -> Self {
        self.scene_failures = policy;
        self
    }

    pub fn with_scene_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scene_root = Some(root.into());
        self
    }

    pub fn with_preview_year(mut self, year: i32) -> Self {
        self.preview_year = Some(year);
        self
    }

    /// Checks everything that must hold before any scene is read or any export submitted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Bbox::new(
            self.region.xmin,
            self.region.xmax,
            self.region.ymin,
            self.region.ymax,
        )
        .map_err(ConfigError::Region)?;

        if self.collection.trim().is_empty() {
            return Err(ConfigError::Empty("collection"));
        }

        self.statistic.validate()?;
        self.calendar.span(&self.years)?;

        if let CoveragePolicy::MinScenes(0) = self.coverage {
            return Err(ConfigError::MinScenes);
        }

        if self.export.prefix.trim().is_empty() {
            return Err(ConfigError::Empty("export prefix"));
        }
        if self.export.folder.trim().is_empty() {
            return Err(ConfigError::Empty("export folder"));
        }
        if !(self.export.scale.is_finite() && self.export.scale > 0.0) {
            return Err(ConfigError::Scale(self.export.scale));
        }
        if self.export.max_pixels == 0 {
            return Err(ConfigError::MaxPixels);
        }

        Ok(())
    }

    pub fn sensor(&self) -> Sensor {
        self.sensor
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn region(&self) -> &Bbox {
        &self.region
    }

    pub fn index(&self) -> &NormalizedDifference {
        &self.index
    }

    pub fn calendar(&self) -> &SeasonCalendar {
        &self.calendar
    }

    pub fn months(&self) -> MonthWindow {
        self.calendar.window()
    }

    pub fn years(&self) -> &YearRange {
        &self.years
    }

    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    pub fn statistic(&self) -> Statistic {
        self.statistic
    }

    pub fn rescale(&self) -> bool {
        self.rescale
    }

    pub fn coverage(&self) -> CoveragePolicy {
        self.coverage
    }

    pub fn scene_failures(&self) -> SceneFailurePolicy {
        self.scene_failures
    }

    /// Grid every composite is reduced onto: the region at the export scale.
    pub fn output_grid(&self) -> Grid {
        Grid::covering(&self.region, self.export.scale)
    }

    pub fn export(&self) -> &ExportSettings {
        &self.export
    }

    pub fn scene_root(&self) -> Option<&Path> {
        self.scene_root.as_deref()
    }

    pub fn preview_year(&self) -> Option<i32> {
        self.preview_year
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn region() -> Bbox {
        Bbox::new(399_000.0, 420_000.0, 4_500_000.0, 4_530_000.0).unwrap()
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");
        let mut file = File::create(&file_path).unwrap();

        let config_data = r#"
    {
        "sensor": "landsat8",
        "region": { "xmin": 399000, "xmax": 420000, "ymin": 4500000, "ymax": 4530000 },
        "index": { "name": "NDWI", "band_a": "SR_B3", "band_b": "SR_B5" },
        "months": { "start": 2, "end": 5 },
        "years": { "start": 2001, "end": 2021 },
        "export": { "prefix": "NDWI_Feb_May" }
    }
    "#;

        file.write_all(config_data.as_bytes()).unwrap();

        let config = Config::from_file(file_path).unwrap();

        assert_eq!(config.collection(), "LANDSAT/LC08/C02/T1_L2");
        assert_eq!(config.index(), &NormalizedDifference::ndwi());
        assert_eq!(config.months(), MonthWindow::new(2, 5).unwrap());
        assert_eq!(config.years().len(), 21);
        assert_eq!(config.mode(), CompositeMode::PerYear);
        assert_eq!(config.statistic(), Statistic::Median);
        assert!(!config.rescale());
        assert_eq!(config.coverage(), CoveragePolicy::KeepAll);

        let export = config.export();
        assert_eq!(export.folder, "GEE");
        assert_eq!(export.scale, 30.0);
        assert_eq!(export.crs.to_string(), "EPSG:26912");
        assert_eq!(export.max_pixels, 200_000_000);
    }

    #[test]
    fn test_winter_percentile_config() {
        let config_data = r#"
    {
        "sensor": "landsat8",
        "region": { "xmin": 399000, "xmax": 420000, "ymin": 4500000, "ymax": 4530000 },
        "index": { "name": "SR_NDVI", "band_a": "SR_B5", "band_b": "SR_B4" },
        "months": { "start": 11, "end": 1 },
        "years": { "start": 2021, "end": 2022 },
        "season_attribution": "calendar_year",
        "mode": "combined",
        "statistic": { "percentile": 90 },
        "rescale": true,
        "export": { "prefix": "ndvi_winter_p90", "folder": "RCrafford_MSE_Thesis" }
    }
    "#;

        let config: Config = serde_json::from_str(config_data).unwrap();

        assert!(config.months().wraps());
        assert_eq!(
            config.calendar().attribution(),
            SeasonAttribution::CalendarYear
        );
        assert_eq!(config.mode(), CompositeMode::Combined);
        assert_eq!(config.statistic(), Statistic::Percentile(90.0));
        assert!(config.rescale());
        assert_eq!(config.export().folder, "RCrafford_MSE_Thesis");
    }

    #[test]
    fn test_wrapping_window_without_attribution_fails() {
        let config_data = r#"
    {
        "sensor": "landsat8",
        "region": { "xmin": 0, "xmax": 10, "ymin": 0, "ymax": 10 },
        "index": { "name": "SR_NDVI", "band_a": "SR_B5", "band_b": "SR_B4" },
        "months": { "start": 11, "end": 1 },
        "years": { "start": 2021, "end": 2022 },
        "export": { "prefix": "ndvi_winter" }
    }
    "#;

        let err = serde_json::from_str::<Config>(config_data).unwrap_err();
        assert!(err.to_string().contains("season_attribution"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let base = |export: ExportSettings| {
            Config::new(
                Sensor::Landsat8,
                region(),
                NormalizedDifference::ndwi(),
                MonthWindow::new(2, 5).unwrap(),
                None,
                YearRange::new(2020, 2021).unwrap(),
                export,
            )
        };

        assert!(base(ExportSettings::new("NDWI")).is_ok());
        assert!(matches!(
            base(ExportSettings::new(" ")),
            Err(ConfigError::Empty(_))
        ));

        let mut export = ExportSettings::new("NDWI");
        export.scale = 0.0;
        assert!(matches!(base(export), Err(ConfigError::Scale(_))));

        let mut export = ExportSettings::new("NDWI");
        export.max_pixels = 0;
        assert!(matches!(base(export), Err(ConfigError::MaxPixels)));

        let config = base(ExportSettings::new("NDWI"))
            .unwrap()
            .with_statistic(Statistic::Percentile(101.0));
        assert!(matches!(config.validate(), Err(ConfigError::Percentile(_))));

        let config = base(ExportSettings::new("NDWI"))
            .unwrap()
            .with_coverage(CoveragePolicy::MinScenes(0));
        assert!(matches!(config.validate(), Err(ConfigError::MinScenes)));
    }

    #[test]
    fn test_invalid_crs_in_file() {
        let config_data = r#"
    {
        "sensor": "landsat8",
        "region": { "xmin": 0, "xmax": 10, "ymin": 0, "ymax": 10 },
        "index": { "name": "NDWI", "band_a": "SR_B3", "band_b": "SR_B5" },
        "months": { "start": 2, "end": 5 },
        "years": { "start": 2020, "end": 2021 },
        "export": { "prefix": "NDWI", "crs": "UTM12" }
    }
    "#;

        assert!(serde_json::from_str::<Config>(config_data).is_err());
    }
}
