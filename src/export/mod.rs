//! Export jobs: one per composite, submitted to an [`Exporter`].

use std::path::PathBuf;

use crate::bbox::Bbox;
use crate::composite::YearlyComposite;
use crate::config::{CompositeMode, ExportSettings};
use crate::crs::Crs;

pub mod geotiff;
pub mod memory;

pub use geotiff::GdalExporter;
pub use memory::{RecordedExport, RecordingExporter};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("'{description}' covers {pixels} pixels, above the limit of {max}")]
    TooManyPixels {
        description: String,
        pixels: u64,
        max: u64,
    },
    #[error("composite is in {found}, export requested {expected}")]
    CrsMismatch { found: Crs, expected: Crs },
    #[error("failed to write {path}: {source}")]
    Gdal {
        path: PathBuf,
        #[source]
        source: gdal::errors::GdalError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything needed to write one composite out.
#[derive(Debug, Clone)]
pub struct ExportJob<'a> {
    pub composite: &'a YearlyComposite,
    pub description: String,
    pub folder: String,
    pub region: Bbox,
    pub scale: f64,
    pub crs: Crs,
    pub max_pixels: u64,
}

impl<'a> ExportJob<'a> {
    pub fn new(
        composite: &'a YearlyComposite,
        settings: &ExportSettings,
        region: &Bbox,
        mode: CompositeMode,
    ) -> Self {
        Self {
            composite,
            description: description(&settings.prefix, composite.year(), mode),
            folder: settings.folder.clone(),
            region: *region,
            scale: settings.scale,
            crs: settings.crs,
            max_pixels: settings.max_pixels,
        }
    }

    pub fn year(&self) -> i32 {
        self.composite.year()
    }

    pub fn pixel_count(&self) -> u64 {
        self.composite.grid().pixel_count()
    }

    /// Rejects a job over the pixel ceiling or in a CRS other than the requested one.
    pub fn check(&self) -> Result<(), ExportError> {
        let pixels = self.pixel_count();
        if pixels > self.max_pixels {
            return Err(ExportError::TooManyPixels {
                description: self.description.clone(),
                pixels,
                max: self.max_pixels,
            });
        }

        if self.composite.crs() != self.crs {
            return Err(ExportError::CrsMismatch {
                found: self.composite.crs(),
                expected: self.crs,
            });
        }

        Ok(())
    }
}

/// `<prefix>_<year>` per year, the bare prefix for a combined composite.
pub fn description(prefix: &str, year: i32, mode: CompositeMode) -> String {
    match mode {
        CompositeMode::PerYear => format!("{}_{}", prefix, year),
        CompositeMode::Combined => prefix.to_string(),
    }
}

pub trait Exporter {
    fn submit(&self, job: &ExportJob<'_>) -> Result<(), ExportError>;
}
