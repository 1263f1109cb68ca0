use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};

use chinook::config::Config;
use chinook::export::{Exporter, GdalExporter, RecordingExporter};
use chinook::pipeline::{Pipeline, RunSummary};
use chinook::source::DirectorySource;
use chinook::utils::CompositeStatistics;

/// Multi-year spectral index composites from Landsat scenes
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON run configuration
    #[arg(short, long, default_value = "./data/config/ndwi_feb_may.json")]
    config: PathBuf,

    /// Compose and plan exports without writing any file
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let scene_root = config.scene_root().unwrap_or(Path::new("./data/scenes"));
    let source = DirectorySource::new(scene_root);

    info!(
        "Starting {} composites for {} from {}",
        config.index().name(),
        config.years(),
        scene_root.display()
    );

    let summary = if cli.dry_run {
        run(&config, &source, &RecordingExporter::new())?
    } else {
        run(&config, &source, &GdalExporter::new(&config.export().output_root))?
    };

    for warning in &summary.warnings {
        println!("warning: {}", warning);
    }

    println!(
        "{} composites, {} exports submitted: {:?}",
        summary.collection.len(),
        summary.submitted.len(),
        summary.submitted
    );

    if let Some(year) = config.preview_year() {
        match CompositeStatistics::for_year(&summary.collection, year) {
            Some(stats) => println!("{}", stats),
            None => println!("No composite tagged {}", year),
        }
    }

    Ok(())
}

fn run<E: Exporter>(config: &Config, source: &DirectorySource, exporter: &E) -> Result<RunSummary> {
    Pipeline::new(config, source, exporter)
        .run()
        .context("composite pipeline failed")
}
