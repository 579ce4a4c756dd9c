use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

pub const EXPORT_SUFFIX: &str = "exif_printer";
pub const JPEG_QUALITY: u8 = 92;

/// Drops everything up to the first `/` and the last extension:
/// `photos/trip/IMG_01.jpeg` becomes `trip/IMG_01`.
pub fn remove_extension(file_name: &str) -> &str {
    let no_path = match file_name.find('/') {
        Some(index) if index + 1 < file_name.len() => &file_name[index + 1..],
        _ => file_name,
    };
    match no_path.rfind('.') {
        Some(index) if index > 0 => &no_path[..index],
        _ => no_path,
    }
}

pub fn build_filename(stem: &str) -> String {
    format!("{}_{}.jpg", stem, EXPORT_SUFFIX)
}

pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
        .context("encode JPEG")?;
    Ok(bytes)
}

/// Writes `bytes` to `dir/file_name`, creating `dir` when needed.
pub fn write_export(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create export folder {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, bytes).with_context(|| format!("write export {}", path.display()))?;
    Ok(path)
}

/// A rendered JPEG and the file name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegExport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
