use std::fmt;

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::scene::SceneError;
use crate::source::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("year {year}: imagery query failed: {source}")]
    Source {
        year: i32,
        #[source]
        source: SourceError,
    },
    #[error("year {year}: {source}")]
    Scene {
        year: i32,
        #[source]
        source: SceneError,
    },
    #[error("year {year}: export '{description}' rejected: {source}")]
    Export {
        year: i32,
        description: String,
        #[source]
        source: ExportError,
    },
    #[error("a composite for year {0} was already collected")]
    DuplicateYear(i32),
}

/// Non-fatal conditions met while compositing.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineWarning {
    /// No valid scene was left for the year, its composite is all no-data.
    EmptyComposite { year: i32 },
    /// The coverage policy dropped the year.
    SparseYearSkipped {
        year: i32,
        scenes: usize,
        required: usize,
    },
    /// A scene failed masking or index derivation and was left out.
    SceneSkipped {
        year: i32,
        scene: String,
        reason: String,
    },
}

impl PipelineWarning {
    pub fn year(&self) -> i32 {
        match self {
            PipelineWarning::EmptyComposite { year }
            | PipelineWarning::SparseYearSkipped { year, .. }
            | PipelineWarning::SceneSkipped { year, .. } => *year,
        }
    }
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::EmptyComposite { year } => {
                write!(f, "year {}: no valid scenes, composite is all no-data", year)
            }
            PipelineWarning::SparseYearSkipped {
                year,
                scenes,
                required,
            } => write!(
                f,
                "year {}: skipped, {} scenes found but {} required",
                year, scenes, required
            ),
            PipelineWarning::SceneSkipped {
                year,
                scene,
                reason,
            } => write!(f, "year {}: scene {} skipped: {}", year, scene, reason),
        }
    }
}
