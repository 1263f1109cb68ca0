use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::{DriverManager, Metadata};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ExportError, ExportJob, Exporter};

/// Writes each job to `<root>/<folder>/<description>.tif` as a single f64 band.
#[derive(Debug, Clone)]
pub struct GdalExporter {
    root: PathBuf,
}

impl GdalExporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, job: &ExportJob<'_>) -> PathBuf {
        self.root
            .join(&job.folder)
            .join(format!("{}.tif", job.description))
    }

    fn write(&self, job: &ExportJob<'_>, path: &Path) -> Result<(), gdal::errors::GdalError> {
        let composite = job.composite;
        let grid = composite.grid();
        let (width, height) = (grid.width(), grid.height());

        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mut dataset = driver.create_with_band_type::<f64, _>(path, width, height, 1)?;

        dataset.set_geo_transform(grid.geo_transform())?;
        dataset.set_spatial_ref(&SpatialRef::from_epsg(job.crs.epsg())?)?;
        dataset.set_description(&job.description)?;
        dataset.set_metadata_item("YEAR", &composite.year().to_string(), "")?;
        dataset.set_metadata_item("BAND", composite.band(), "")?;
        dataset.set_metadata_item("PERIOD", &composite.period().to_string(), "")?;
        dataset.set_metadata_item("SCENES", &composite.scene_count().to_string(), "")?;

        let mut band = dataset.rasterband(1)?;
        band.set_description(composite.band())?;
        band.set_no_data_value(Some(f64::NAN))?;

        let mut buffer = Buffer::new((width, height), composite.values().to_vec());
        band.write((0, 0), (width, height), &mut buffer)?;

        Ok(())
    }
}

impl Exporter for GdalExporter {
    fn submit(&self, job: &ExportJob<'_>) -> Result<(), ExportError> {
        job.check()?;

        let path = self.path_for(job);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        self.write(job, &path).map_err(|source| ExportError::Gdal {
            path: path.clone(),
            source,
        })?;

        info!("✓ Saved {} to: {}", job.description, path.display());
        Ok(())
    }
}
