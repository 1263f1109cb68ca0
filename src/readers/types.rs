pub trait DataReader {
    fn read_data(&self) -> Result<Data, ReadError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("GeoTIFF {path}: {reason}")]
    GeoTiff { path: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("unknown raster file type: {0}")]
    UnknownFileType(String),
}

/// One decoded raster band, row-major.
#[derive(Debug)]
pub struct Data {
    pub width: u32,
    pub height: u32,
    pub buffer: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    GeoTiff,
}
