pub mod bbox;
pub mod collection;
pub mod composite;
pub mod config;
pub mod crs;
pub mod date_gen;
pub mod error;
pub mod export;
pub mod grid;
pub mod index;
pub mod pipeline;
pub mod preprocess;
pub mod readers;
pub mod scene;
pub mod sensors;
pub mod source;
pub mod utils;

pub use collection::CompositeCollection;
pub use composite::{Statistic, YearlyComposite};
pub use config::{Config, ConfigError};
pub use error::{PipelineError, PipelineWarning};
pub use pipeline::{Pipeline, RunSummary};
