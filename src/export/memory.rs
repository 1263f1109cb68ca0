use log::info;
use std::sync::Mutex;

use super::{ExportError, ExportJob, Exporter};

/// What a [`RecordingExporter`] saw for one accepted job.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedExport {
    pub description: String,
    pub folder: String,
    pub year: i32,
    pub band: String,
    pub pixels: u64,
    pub valid_pixels: usize,
}

/// Accepts jobs without writing anything, keeping them in submission order.
#[derive(Debug, Default)]
pub struct RecordingExporter {
    submitted: Mutex<Vec<RecordedExport>>,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Vec<RecordedExport> {
        match self.submitted.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.submitted()
            .into_iter()
            .map(|export| export.description)
            .collect()
    }
}

impl Exporter for RecordingExporter {
    fn submit(&self, job: &ExportJob<'_>) -> Result<(), ExportError> {
        job.check()?;

        let record = RecordedExport {
            description: job.description.clone(),
            folder: job.folder.clone(),
            year: job.year(),
            band: job.composite.band().to_string(),
            pixels: job.pixel_count(),
            valid_pixels: job.composite.valid_pixel_count(),
        };

        info!("Dry run: {} ({} pixels)", record.description, record.pixels);

        let mut guard = match self.submitted.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(record);
        Ok(())
    }
}
