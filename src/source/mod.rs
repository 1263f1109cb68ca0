//! Imagery sources: where scenes come from.
//!
//! A source answers a [`SceneQuery`] with every scene of the collection acquired
//! within the query's calendar span whose footprint touches the region. Finer
//! filtering (month window, season year) is left to the compositor.

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::bbox::Bbox;
use crate::readers::{FileError, ReadError};
use crate::scene::{SceneCollection, SceneError};

pub mod directory;
pub mod memory;

pub use directory::DirectorySource;
pub use memory::InMemorySource;

#[derive(Debug, Clone, PartialEq)]
pub struct SceneQuery {
    pub collection: String,
    pub region: Bbox,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub trait ImagerySource {
    fn query(&self, query: &SceneQuery) -> Result<SceneCollection, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to walk scene directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("invalid band file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("manifest {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },
    #[error("expected one file for band '{band}', found {found}")]
    BandFile { band: String, found: usize },
    #[error(transparent)]
    FileType(#[from] FileError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}
