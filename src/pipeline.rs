use log::info;

use crate::collection::CompositeCollection;
use crate::composite::TemporalCompositor;
use crate::config::Config;
use crate::error::{PipelineError, PipelineWarning};
use crate::export::{ExportError, ExportJob, Exporter, description};
use crate::source::ImagerySource;

/// What a completed run produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub collection: CompositeCollection,
    /// Export descriptions, in submission order.
    pub submitted: Vec<String>,
    pub warnings: Vec<PipelineWarning>,
}

/// Compositor -> collector -> exporter, for one configuration.
pub struct Pipeline<'a, S: ImagerySource + ?Sized, E: Exporter + ?Sized> {
    config: &'a Config,
    source: &'a S,
    exporter: &'a E,
}

impl<'a, S: ImagerySource + ?Sized, E: Exporter + ?Sized> Pipeline<'a, S, E> {
    pub fn new(config: &'a Config, source: &'a S, exporter: &'a E) -> Self {
        Self {
            config,
            source,
            exporter,
        }
    }

    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        self.config.validate()?;

        let (collection, warnings) = self.compose()?;
        let submitted = self.export(&collection)?;

        Ok(RunSummary {
            collection,
            submitted,
            warnings,
        })
    }

    /// Builds every composite and collects them, without exporting.
    pub fn compose(&self) -> Result<(CompositeCollection, Vec<PipelineWarning>), PipelineError> {
        self.check_output_size()?;

        let compositor = TemporalCompositor::new(self.config, self.source);
        info!(
            "Output grid: {}x{} pixels at {} m",
            compositor.output_grid().width(),
            compositor.output_grid().height(),
            self.config.export().scale
        );

        let mut collection = CompositeCollection::new();
        let mut warnings = Vec::new();

        for outcome in compositor.run()? {
            warnings.extend(outcome.warnings);
            if let Some(composite) = outcome.composite {
                collection.insert(composite)?;
            }
        }

        info!("Collected {} composites ({:?})", collection.len(), collection.years());
        Ok((collection, warnings))
    }

    /// Rejects an output grid above the pixel ceiling before any scene is read.
    fn check_output_size(&self) -> Result<(), PipelineError> {
        let settings = self.config.export();
        let pixels = self.config.output_grid().pixel_count();
        if pixels <= settings.max_pixels {
            return Ok(());
        }

        let year = self.config.years().start();
        let description = description(&settings.prefix, year, self.config.mode());
        Err(PipelineError::Export {
            year,
            description: description.clone(),
            source: ExportError::TooManyPixels {
                description,
                pixels,
                max: settings.max_pixels,
            },
        })
    }

    /// Checks every job up front, then submits them in ascending year order.
    pub fn export(&self, collection: &CompositeCollection) -> Result<Vec<String>, PipelineError> {
        let settings = self.config.export();
        let jobs: Vec<ExportJob<'_>> = collection
            .iter()
            .map(|composite| {
                ExportJob::new(composite, settings, self.config.region(), self.config.mode())
            })
            .collect();

        for job in &jobs {
            job.check().map_err(|source| PipelineError::Export {
                year: job.year(),
                description: job.description.clone(),
                source,
            })?;
        }

        let mut submitted = Vec::with_capacity(jobs.len());
        for job in &jobs {
            self.exporter
                .submit(job)
                .map_err(|source| PipelineError::Export {
                    year: job.year(),
                    description: job.description.clone(),
                    source,
                })?;
            submitted.push(job.description.clone());
        }

        Ok(submitted)
    }
}
