pub mod geotiff;
pub mod types;
pub mod utils;

pub use geotiff::GeoTiffReader;
pub use types::{Data, DataReader, FileError, FileType, ReadError};
pub use utils::reader_from_filetype;

use std::path::PathBuf;

pub fn create_reader(file_name: impl Into<PathBuf>) -> Result<Box<dyn DataReader>, FileError> {
    let file_name = file_name.into();
    match reader_from_filetype(&file_name)? {
        FileType::GeoTiff => Ok(Box::new(GeoTiffReader { file_name })),
    }
}
