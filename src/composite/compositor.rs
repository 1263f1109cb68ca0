use chrono::NaiveDate;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::sync::Arc;

use super::{Statistic, YearlyComposite};
use crate::bbox::Bbox;
use crate::config::{CompositeMode, Config, CoveragePolicy, SceneFailurePolicy, YearRange};
use crate::crs::Crs;
use crate::error::{PipelineError, PipelineWarning};
use crate::grid::Grid;
use crate::index::{IndexedScene, NormalizedDifference};
use crate::preprocess::Preprocessor;
use crate::scene::{Scene, SceneCollection, SceneError};
use crate::source::{ImagerySource, SceneQuery};

/// Builds yearly composites from an imagery source.
pub struct TemporalCompositor<'a, S: ImagerySource + ?Sized> {
    config: &'a Config,
    source: &'a S,
    preprocessor: Preprocessor,
    output_grid: Grid,
}

/// Result of compositing one year (or one combined window).
#[derive(Debug, Default)]
pub struct CompositeOutcome {
    /// `None` when the coverage policy skipped the year.
    pub composite: Option<YearlyComposite>,
    pub warnings: Vec<PipelineWarning>,
}

impl<'a, S: ImagerySource + ?Sized> TemporalCompositor<'a, S> {
    pub fn new(config: &'a Config, source: &'a S) -> Self {
        let mut preprocessor = Preprocessor::for_sensor(config.sensor());
        if config.rescale() {
            preprocessor = preprocessor.with_scale_factors(config.sensor().scale_factors());
        }

        let output_grid = config.output_grid();

        Self {
            config,
            source,
            preprocessor,
            output_grid,
        }
    }

    /// Grid covering the region at the export scale; every composite uses it.
    pub fn output_grid(&self) -> &Grid {
        &self.output_grid
    }

    /// One outcome per requested year in ascending order, or a single outcome in
    /// combined mode.
    pub fn run(&self) -> Result<Vec<CompositeOutcome>, PipelineError> {
        match self.config.mode() {
            CompositeMode::PerYear => self
                .config
                .years()
                .years()
                .map(|year| self.composite_year(year))
                .collect(),
            CompositeMode::Combined => Ok(vec![self.composite_combined()?]),
        }
    }

    pub fn composite_year(&self, year: i32) -> Result<CompositeOutcome, PipelineError> {
        let (start, end) = self.config.calendar().date_range(year)?;
        info!("Compositing {} for {} ({} to {})", self.config.index().name(), year, start, end);

        let scenes = self.select(year, start, end, |season| season == year)?;
        self.reduce(year, YearRange::new(year, year)?, scenes)
    }

    /// Single composite over the whole year range, tagged with its first year.
    pub fn composite_combined(&self) -> Result<CompositeOutcome, PipelineError> {
        let years = *self.config.years();
        let (start, end) = self.config.calendar().span(&years)?;
        info!("Compositing {} for {} ({} to {})", self.config.index().name(), years, start, end);

        let scenes = self.select(years.start(), start, end, |season| years.contains(season))?;
        self.reduce(years.start(), years, scenes)
    }

    fn select<F>(
        &self,
        year: i32,
        start: NaiveDate,
        end: NaiveDate,
        keep: F,
    ) -> Result<SceneCollection, PipelineError>
    where
        F: Fn(i32) -> bool,
    {
        let query = SceneQuery {
            collection: self.config.collection().to_string(),
            region: *self.config.region(),
            start,
            end,
        };

        let collection = self
            .source
            .query(&query)
            .map_err(|source| PipelineError::Source { year, source })?;

        let selected = collection
            .filter_bounds(self.config.region())
            .filter_date(start, end)
            .filter_months(&self.config.months())
            .filter_season_years(self.config.calendar(), keep);

        debug!(
            "{}: {} scenes returned, {} selected",
            year,
            collection.len(),
            selected.len()
        );

        Ok(selected)
    }

    fn reduce(
        &self,
        year: i32,
        period: YearRange,
        scenes: SceneCollection,
    ) -> Result<CompositeOutcome, PipelineError> {
        let mut warnings = Vec::new();

        for failed in scenes.failures() {
            self.scene_failure(year, failed.id.clone(), failed.error.clone(), &mut warnings)?;
        }

        if let CoveragePolicy::MinScenes(required) = self.config.coverage()
            && scenes.len() < required
        {
            let warning = PipelineWarning::SparseYearSkipped {
                year,
                scenes: scenes.len(),
                required,
            };
            warn!("{}", warning);
            warnings.push(warning);
            return Ok(CompositeOutcome {
                composite: None,
                warnings,
            });
        }

        let scenes: Vec<Arc<Scene>> = scenes.into_iter().collect();
        let preprocessor = &self.preprocessor;
        let index = self.config.index();
        let region = self.config.region();
        let crs = self.config.export().crs;

        let prepared: Vec<(String, Result<IndexedScene, SceneError>)> = scenes
            .par_iter()
            .map(|scene| {
                let result = prepare(scene, preprocessor, index, region, crs);
                (scene.id().to_string(), result)
            })
            .collect();

        let mut indexed = Vec::with_capacity(prepared.len());
        for (scene, result) in prepared {
            match result {
                Ok(ready) => indexed.push(ready),
                Err(source) => self.scene_failure(year, scene, source, &mut warnings)?,
            }
        }

        if indexed.is_empty() {
            let warning = PipelineWarning::EmptyComposite { year };
            warn!("{}", warning);
            warnings.push(warning);
        }

        let statistic = self.config.statistic();
        let values = reduce_pixels(&self.output_grid, &indexed, statistic);
        let scene_ids = indexed
            .iter()
            .map(|scene| scene.masked().id().to_string())
            .collect();

        let composite = YearlyComposite::new(
            year,
            period,
            statistic.band_name(index.name()),
            statistic,
            crs,
            self.output_grid,
            values,
            scene_ids,
        );

        info!("{}: {}", year, composite);

        Ok(CompositeOutcome {
            composite: Some(composite),
            warnings,
        })
    }

    /// Skips the scene with a warning, or fails the year, as the failure policy says.
    fn scene_failure(
        &self,
        year: i32,
        scene: String,
        source: SceneError,
        warnings: &mut Vec<PipelineWarning>,
    ) -> Result<(), PipelineError> {
        match self.config.scene_failures() {
            SceneFailurePolicy::Abort => Err(PipelineError::Scene { year, source }),
            SceneFailurePolicy::Skip => {
                let warning = PipelineWarning::SceneSkipped {
                    year,
                    scene,
                    reason: source.to_string(),
                };
                warn!("{}", warning);
                warnings.push(warning);
                Ok(())
            }
        }
    }
}

/// Crop to the region, mask, then derive the index.
fn prepare(
    scene: &Arc<Scene>,
    preprocessor: &Preprocessor,
    index: &NormalizedDifference,
    region: &Bbox,
    crs: Crs,
) -> Result<IndexedScene, SceneError> {
    if scene.crs() != crs {
        return Err(SceneError::CrsMismatch {
            scene: scene.id().to_string(),
            found: scene.crs(),
            expected: crs,
        });
    }

    let cropped = scene.crop(region).unwrap_or_else(|| Arc::clone(scene));

    let masked = preprocessor.apply(cropped)?;
    index.apply(masked)
}

/// Sample every scene at each output pixel centre and reduce the stack.
fn reduce_pixels(grid: &Grid, scenes: &[IndexedScene], statistic: Statistic) -> Vec<f64> {
    let width = grid.width();

    (0..grid.len())
        .into_par_iter()
        .map_init(
            || Vec::with_capacity(scenes.len()),
            |stack, i| {
                stack.clear();
                let (x, y) = grid.pixel_center(i % width, i / width);
                for scene in scenes {
                    let scene_grid = scene.masked().original().grid();
                    if let Some(pixel) = scene_grid.pixel_at(x, y) {
                        stack.push(scene.values()[pixel]);
                    }
                }
                statistic.reduce(stack)
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportSettings, MonthWindow, SeasonAttribution};
    use crate::scene::FailedScene;
    use crate::sensors::Sensor;
    use crate::source::{InMemorySource, SourceError};

    const COLLECTION: &str = "LANDSAT/LC08/C02/T1_L2";

    fn grid() -> Grid {
        Grid::new(2, 2, [0.0, 1.0, 0.0, 2.0, 0.0, -1.0]).unwrap()
    }

    /// Scene whose NDWI is `ndwi` everywhere except where `qa` flags the pixel.
    fn scene(id: &str, date: (i32, u32, u32), ndwi: f64, qa: [f64; 4]) -> Scene {
        let acquired = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        // green = 1 + ndwi, nir = 1 - ndwi gives (g - n) / (g + n) = ndwi
        Scene::new(id, acquired, Crs::default(), grid())
            .with_band("SR_B3", vec![1.0 + ndwi; 4])
            .unwrap()
            .with_band("SR_B5", vec![1.0 - ndwi; 4])
            .unwrap()
            .with_band("QA_PIXEL", qa.to_vec())
            .unwrap()
            .with_band("QA_RADSAT", vec![0.0; 4])
            .unwrap()
    }

    fn config(months: (u32, u32), attribution: Option<SeasonAttribution>, years: (i32, i32)) -> Config {
        let mut export = ExportSettings::new("NDWI_test");
        export.scale = 1.0;
        Config::new(
            Sensor::Landsat8,
            Bbox::new(0.0, 2.0, 0.0, 2.0).unwrap(),
            NormalizedDifference::ndwi(),
            MonthWindow::new(months.0, months.1).unwrap(),
            attribution,
            YearRange::new(years.0, years.1).unwrap(),
            export,
        )
        .unwrap()
    }

    #[test]
    fn test_median_ignores_masked_observations() {
        let source = InMemorySource::new(COLLECTION)
            .with_scene(scene("a", (2020, 2, 10), 0.1, [0.0; 4]))
            .with_scene(scene("b", (2020, 3, 10), 0.2, [0.0, 8.0, 0.0, 0.0]))
            .with_scene(scene("c", (2020, 4, 10), 0.6, [0.0, 8.0, 8.0, 0.0]));

        let config = config((2, 5), None, (2020, 2020));
        let compositor = TemporalCompositor::new(&config, &source);
        let composite = compositor.composite_year(2020).unwrap().composite.unwrap();

        assert_eq!(composite.year(), 2020);
        assert_eq!(composite.band(), "NDWI");
        assert_eq!(composite.scene_count(), 3);

        let expect = |col, row, value: f64| {
            let got = composite.value_at(col, row).unwrap();
            assert!((got - value).abs() < 1e-9, "({col}, {row}): {got} != {value}");
        };
        expect(0, 0, 0.2); // median of 0.1, 0.2, 0.6
        expect(1, 0, 0.1); // only a is valid
        expect(0, 1, 0.15); // a and b
        expect(1, 1, 0.2);
    }

    #[test]
    fn test_fully_masked_pixel_is_no_data() {
        let source = InMemorySource::new(COLLECTION)
            .with_scene(scene("a", (2020, 3, 10), 0.3, [1.0, 0.0, 0.0, 0.0]));

        let config = config((2, 5), None, (2020, 2020));
        let composite = TemporalCompositor::new(&config, &source)
            .composite_year(2020)
            .unwrap()
            .composite
            .unwrap();

        assert!(composite.value_at(0, 0).unwrap().is_nan());
        assert_eq!(composite.valid_pixel_count(), 3);
    }

    #[test]
    fn test_empty_year_is_all_no_data() {
        let source = InMemorySource::new(COLLECTION)
            .with_scene(scene("july", (2020, 7, 10), 0.3, [0.0; 4]));

        let config = config((2, 5), None, (2020, 2020));
        let outcome = TemporalCompositor::new(&config, &source)
            .composite_year(2020)
            .unwrap();

        let composite = outcome.composite.unwrap();
        assert!(composite.is_all_no_data());
        assert_eq!(composite.scene_count(), 0);
        assert_eq!(outcome.warnings, vec![PipelineWarning::EmptyComposite { year: 2020 }]);
    }

    #[test]
    fn test_wrapping_window_per_year() {
        let source = InMemorySource::new(COLLECTION)
            .with_scene(scene("jan21", (2021, 1, 10), 0.1, [0.0; 4]))
            .with_scene(scene("nov21", (2021, 11, 10), 0.2, [0.0; 4]))
            .with_scene(scene("dec21", (2021, 12, 10), 0.3, [0.0; 4]))
            .with_scene(scene("jan22", (2022, 1, 10), 0.4, [0.0; 4]));

        let ids = |attribution| {
            let config = config((11, 1), Some(attribution), (2021, 2021));
            TemporalCompositor::new(&config, &source)
                .composite_year(2021)
                .unwrap()
                .composite
                .unwrap()
                .scene_ids()
                .to_vec()
        };

        assert_eq!(ids(SeasonAttribution::CalendarYear), vec!["jan21", "nov21", "dec21"]);
        assert_eq!(ids(SeasonAttribution::SeasonStart), vec!["nov21", "dec21", "jan22"]);
        assert_eq!(ids(SeasonAttribution::SeasonEnd), vec!["jan21"]);
    }

    #[test]
    fn test_scene_failures() {
        let broken = Scene::new(
            "broken",
            NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            Crs::default(),
            grid(),
        );
        let source = InMemorySource::new(COLLECTION)
            .with_scene(scene("ok", (2020, 2, 10), 0.5, [0.0; 4]))
            .with_scene(broken);

        let skipping = config((2, 5), None, (2020, 2020));
        let outcome = TemporalCompositor::new(&skipping, &source)
            .composite_year(2020)
            .unwrap();
        assert_eq!(outcome.composite.unwrap().scene_ids(), &["ok".to_string()]);
        assert!(matches!(
            &outcome.warnings[..],
            [PipelineWarning::SceneSkipped { scene, .. }] if scene == "broken"
        ));

        let aborting = skipping.with_scene_failures(SceneFailurePolicy::Abort);
        let err = TemporalCompositor::new(&aborting, &source)
            .composite_year(2020)
            .unwrap_err();
        assert_eq!(err.to_string(), "year 2020: scene broken: missing band 'QA_PIXEL'");
    }

    #[test]
    fn test_foreign_crs_is_a_scene_failure() {
        let utm13 = Scene::new(
            "utm13",
            NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            Crs::from_epsg(26913),
            grid(),
        );
        let source = InMemorySource::new(COLLECTION).with_scene(utm13);

        let config = config((2, 5), None, (2020, 2020));
        let outcome = TemporalCompositor::new(&config, &source)
            .composite_year(2020)
            .unwrap();

        assert!(outcome.composite.unwrap().is_all_no_data());
        assert!(
            outcome
                .warnings
                .iter()
                .any(|w| matches!(w, PipelineWarning::SceneSkipped { reason, .. } if reason.contains("EPSG:26913")))
        );
    }

    #[test]
    fn test_coverage_policy_skips_sparse_years() {
        let source = InMemorySource::new(COLLECTION)
            .with_scene(scene("a", (2020, 2, 10), 0.1, [0.0; 4]))
            .with_scene(scene("b", (2021, 2, 10), 0.1, [0.0; 4]))
            .with_scene(scene("c", (2021, 3, 10), 0.1, [0.0; 4]));

        let config =
            config((2, 5), None, (2020, 2021)).with_coverage(CoveragePolicy::MinScenes(2));
        let outcomes = TemporalCompositor::new(&config, &source).run().unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].composite.is_none());
        assert_eq!(
            outcomes[0].warnings,
            vec![PipelineWarning::SparseYearSkipped {
                year: 2020,
                scenes: 1,
                required: 2
            }]
        );
        assert_eq!(outcomes[1].composite.as_ref().unwrap().year(), 2021);
    }

    #[test]
    fn test_scenes_are_sampled_onto_the_output_grid() {
        // 4x4 scene at 0.5 m pixels covering the same 2x2 m region
        let fine = Grid::new(4, 4, [0.0, 0.5, 0.0, 2.0, 0.0, -0.5]).unwrap();
        let mut green = vec![1.5; 16];
        green[0] = 1.0; // top-left quarter-pixel, not a pixel centre of the output grid
        let scene = Scene::new("fine", NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(), Crs::default(), fine)
            .with_band("SR_B3", green)
            .unwrap()
            .with_band("SR_B5", vec![0.5; 16])
            .unwrap()
            .with_band("QA_PIXEL", vec![0.0; 16])
            .unwrap()
            .with_band("QA_RADSAT", vec![0.0; 16])
            .unwrap();
        let source = InMemorySource::new(COLLECTION).with_scene(scene);

        let config = config((2, 5), None, (2020, 2020));
        let composite = TemporalCompositor::new(&config, &source)
            .composite_year(2020)
            .unwrap()
            .composite
            .unwrap();

        assert_eq!(composite.grid().len(), 4);
        for value in composite.values() {
            assert!((value - 0.5).abs() < 1e-12);
        }
    }

    /// Wraps an in-memory source and reports one extra scene as unreadable.
    struct FlakySource {
        inner: InMemorySource,
        failed: FailedScene,
    }

    impl ImagerySource for FlakySource {
        fn query(&self, query: &SceneQuery) -> Result<SceneCollection, SourceError> {
            Ok(self.inner.query(query)?.with_failures(vec![self.failed.clone()]))
        }
    }

    #[test]
    fn test_unreadable_scenes_follow_the_failure_policy() {
        let source = FlakySource {
            inner: InMemorySource::new(COLLECTION)
                .with_scene(scene("ok", (2020, 2, 10), 0.5, [0.0; 4])),
            failed: FailedScene {
                id: "truncated".to_string(),
                acquired: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
                footprint: grid().footprint(),
                error: SceneError::Unreadable {
                    scene: "truncated".to_string(),
                    reason: "unexpected end of file".to_string(),
                },
            },
        };

        let skipping = config((2, 5), None, (2020, 2020));
        let outcome = TemporalCompositor::new(&skipping, &source)
            .composite_year(2020)
            .unwrap();
        assert_eq!(outcome.composite.unwrap().scene_ids(), &["ok".to_string()]);
        assert_eq!(
            outcome.warnings,
            vec![PipelineWarning::SceneSkipped {
                year: 2020,
                scene: "truncated".to_string(),
                reason: "scene truncated: unexpected end of file".to_string(),
            }]
        );

        let aborting = skipping.with_scene_failures(SceneFailurePolicy::Abort);
        let err = TemporalCompositor::new(&aborting, &source)
            .composite_year(2020)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Scene {
                year: 2020,
                source: SceneError::Unreadable { .. }
            }
        ));
    }

    #[test]
    fn test_unreadable_scene_outside_the_window_is_ignored() {
        let source = FlakySource {
            inner: InMemorySource::new(COLLECTION),
            failed: FailedScene {
                id: "july".to_string(),
                acquired: NaiveDate::from_ymd_opt(2020, 7, 1).unwrap(),
                footprint: grid().footprint(),
                error: SceneError::Unreadable {
                    scene: "july".to_string(),
                    reason: "unexpected end of file".to_string(),
                },
            },
        };

        let config = config((2, 5), None, (2020, 2020))
            .with_scene_failures(SceneFailurePolicy::Abort);
        let outcome = TemporalCompositor::new(&config, &source)
            .composite_year(2020)
            .unwrap();
        assert_eq!(outcome.warnings, vec![PipelineWarning::EmptyComposite { year: 2020 }]);
    }
}
