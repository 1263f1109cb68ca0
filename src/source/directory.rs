use chrono::NaiveDate;
use glob::{Pattern, glob};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use super::{ImagerySource, SceneQuery, SourceError};
use crate::crs::Crs;
use crate::grid::{GeoTransform, Grid, PixelWindow};
use crate::readers::create_reader;
use crate::scene::{FailedScene, Scene, SceneCollection, SceneError};

pub const MANIFEST_NAME: &str = "scene.json";

/// Scenes laid out on disk, one directory per scene:
///
/// ```text
/// <root>/LC08_L2SP_038032_20210403/
///     scene.json
///     LC08_L2SP_038032_20210403_SR_B3.TIF
///     LC08_L2SP_038032_20210403_QA_PIXEL.TIF
///     ...
/// ```
///
/// Band files are matched by their `_<BAND>.TIF` suffix. Only the pixels
/// overlapping the query region are kept once a band is decoded. A scene whose
/// band files cannot be resolved or read is reported as a failure beside the
/// loaded scenes; a broken manifest fails the whole query.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SceneManifest {
    id: String,
    collection: String,
    acquired: NaiveDate,
    crs: Crs,
    geo_transform: GeoTransform,
    width: usize,
    height: usize,
    bands: Vec<String>,
    #[serde(default)]
    properties: BTreeMap<String, f64>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Every manifest below the root, sorted by path.
    fn manifests(&self) -> Result<Vec<PathBuf>, SourceError> {
        let mut found = Vec::new();

        for entry in WalkDir::new(&self.root) {
            let entry = entry?;
            if entry.file_type().is_file() && entry.file_name() == MANIFEST_NAME {
                found.push(entry.into_path());
            }
        }

        found.sort();
        Ok(found)
    }

    fn read_manifest(path: &Path) -> Result<SceneManifest, SourceError> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|source| SourceError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }

    fn band_file(dir: &Path, band: &str) -> Result<PathBuf, SourceError> {
        let pattern = format!(
            "{}/*_{}.[Tt][Ii][Ff]",
            Pattern::escape(&dir.to_string_lossy()),
            band
        );

        let matches: Vec<PathBuf> = glob(&pattern)?.filter_map(Result::ok).collect();
        match matches.as_slice() {
            [single] => Ok(single.clone()),
            _ => Err(SourceError::BandFile {
                band: band.to_string(),
                found: matches.len(),
            }),
        }
    }

    /// Reads every band of the scene, keeping the pixels of `window` only.
    fn load(
        path: &Path,
        manifest: SceneManifest,
        grid: Grid,
        window: PixelWindow,
    ) -> Result<Scene, SourceError> {
        let dir = path.parent().unwrap_or(Path::new("."));
        let mut scene = Scene::new(
            manifest.id.clone(),
            manifest.acquired,
            manifest.crs,
            grid.subgrid(&window),
        );

        for band in &manifest.bands {
            let file = Self::band_file(dir, band)?;
            let data = create_reader(file)?.read_data()?;

            if data.width as usize != manifest.width || data.height as usize != manifest.height {
                return Err(SourceError::InvalidManifest {
                    path: path.to_path_buf(),
                    reason: format!(
                        "band {} is {}x{}, manifest declares {}x{}",
                        band, data.width, data.height, manifest.width, manifest.height
                    ),
                });
            }

            scene = scene.with_band(band.clone(), grid.crop_values(&window, &data.buffer))?;
        }

        for (key, value) in manifest.properties {
            scene = scene.with_property(key, value);
        }

        Ok(scene)
    }
}

impl ImagerySource for DirectorySource {
    fn query(&self, query: &SceneQuery) -> Result<SceneCollection, SourceError> {
        let mut scenes = Vec::new();
        let mut failures = Vec::new();

        for path in self.manifests()? {
            let manifest = Self::read_manifest(&path)?;

            if manifest.collection != query.collection
                || !(query.start..=query.end).contains(&manifest.acquired)
            {
                continue;
            }

            let grid = Grid::new(manifest.width, manifest.height, manifest.geo_transform)
                .map_err(|reason| SourceError::InvalidManifest {
                    path: path.clone(),
                    reason,
                })?;

            let Some(window) = grid.window(&query.region) else {
                continue;
            };

            debug!("Loading scene {} from {}", manifest.id, path.display());
            let (id, acquired) = (manifest.id.clone(), manifest.acquired);
            let footprint = grid.subgrid(&window).footprint();
            match Self::load(&path, manifest, grid, window) {
                Ok(scene) => scenes.push(Arc::new(scene)),
                Err(err) => {
                    warn!("Could not load scene {} from {}: {}", id, path.display(), err);
                    failures.push(FailedScene {
                        error: SceneError::Unreadable {
                            scene: id.clone(),
                            reason: err.to_string(),
                        },
                        id,
                        acquired,
                        footprint,
                    });
                }
            }
        }

        scenes.sort_by(|a, b| (a.acquired(), a.id()).cmp(&(b.acquired(), b.id())));
        failures.sort_by(|a, b| (a.acquired, &a.id).cmp(&(b.acquired, &b.id)));

        Ok(SceneCollection::new(query.collection.clone(), scenes).with_failures(failures))
    }
}
