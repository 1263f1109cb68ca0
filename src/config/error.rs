use crate::crs::CrsParseError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("end_year cannot be earlier than start_year")]
    YearOrder,
    #[error("month {0} is outside 1..=12")]
    Month(u32),
    #[error(
        "month window {start}..{end} wraps across a year boundary, season_attribution must be set"
    )]
    MissingSeasonAttribution { start: u32, end: u32 },
    #[error("no calendar window can be built for year {0}")]
    DateRange(i32),
    #[error("percentile must be within 0..=100, got {0}")]
    Percentile(f64),
    #[error("export scale must be a positive number of meters, got {0}")]
    Scale(f64),
    #[error("max_pixels must be greater than zero")]
    MaxPixels,
    #[error("min_scenes must be greater than zero")]
    MinScenes,
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("index '{index}' uses band '{band}' for both inputs")]
    SameBands { index: String, band: String },
    #[error("invalid region: {0}")]
    Region(String),
    #[error(transparent)]
    Crs(#[from] CrsParseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}
