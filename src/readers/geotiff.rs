use super::{Data, DataReader, ReadError};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tiff::decoder::{Decoder, DecodingResult};

/// Reads the first image of a single-band GeoTIFF as `f64`.
pub struct GeoTiffReader {
    pub file_name: PathBuf,
}

impl GeoTiffReader {
    fn error(&self, reason: String) -> ReadError {
        ReadError::GeoTiff {
            path: self.file_name.display().to_string(),
            reason,
        }
    }
}

impl DataReader for GeoTiffReader {
    fn read_data(&self) -> Result<Data, ReadError> {
        let file = File::open(&self.file_name)
            .map_err(|e| self.error(format!("Failed to open file: {}", e)))?;

        let reader = BufReader::new(file);

        let mut decoder =
            Decoder::new(reader).map_err(|e| self.error(format!("Failed to decode TIFF: {}", e)))?;

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| self.error(format!("Failed to get dimensions: {}", e)))?;

        let buffer: Vec<f64> = match decoder
            .read_image()
            .map_err(|e| self.error(format!("Failed to read image: {}", e)))?
        {
            DecodingResult::U8(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::U16(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::U32(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::I8(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::I16(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::I32(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::F32(data) => data.iter().map(|&x| x as f64).collect(),
            DecodingResult::F64(data) => data,
            _ => return Err(self.error("Unsupported pixel format".to_string())),
        };

        if buffer.len() != width as usize * height as usize {
            return Err(self.error(format!(
                "Expected a single band of {}x{} pixels, got {} samples",
                width,
                height,
                buffer.len()
            )));
        }

        Ok(Data {
            width,
            height,
            buffer,
        })
    }
}
