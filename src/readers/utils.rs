use super::types::{FileError, FileType};
use std::path::Path;

pub fn reader_from_filetype(path: &Path) -> Result<FileType, FileError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("tif") | Some("tiff") => Ok(FileType::GeoTiff),
        _ => Err(FileError::UnknownFileType(path.display().to_string())),
    }
}
