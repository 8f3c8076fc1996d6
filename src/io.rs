use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::{BufferError, PixelBuffer};
use crate::ops::adjustments::FilterError;
use crate::ops::change_log::ChangeLog;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("serialization error: {0}")]
    Serialize(#[from] bincode::Error),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("recipe rejected: {0}")]
    Recipe(#[from] FilterError),
}

// ============================================================================
// IMAGES
// ============================================================================

/// Output formats the binary can write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
    Tga,
    Tiff,
}

impl SaveFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "png"          => Some(SaveFormat::Png),
            "jpeg" | "jpg" => Some(SaveFormat::Jpeg),
            "bmp"          => Some(SaveFormat::Bmp),
            "tga"          => Some(SaveFormat::Tga),
            "tiff" | "tif" => Some(SaveFormat::Tiff),
            _              => None,
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(Self::from_name)
    }

    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Png  => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp  => "bmp",
            SaveFormat::Tga  => "tga",
            SaveFormat::Tiff => "tiff",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            SaveFormat::Png  => ImageFormat::Png,
            SaveFormat::Jpeg => ImageFormat::Jpeg,
            SaveFormat::Bmp  => ImageFormat::Bmp,
            SaveFormat::Tga  => ImageFormat::Tga,
            SaveFormat::Tiff => ImageFormat::Tiff,
        }
    }
}

/// Decode any supported image file to RGBA8.
pub fn load_image(path: &Path) -> Result<PixelBuffer, IoError> {
    let img = image::open(path)?.to_rgba8();
    Ok(PixelBuffer::from_rgba_image(img)?)
}

/// Encode `buffer` to `path`. `quality` (1-100) only matters for JPEG,
/// which also drops alpha.
pub fn encode_and_write(
    buffer: &PixelBuffer,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), IoError> {
    let (w, h) = buffer.dimensions();
    match format {
        SaveFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(buffer.as_rgba_image().clone()).to_rgb8();
            let mut writer = BufWriter::new(File::create(path)?);
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
            encoder.encode(rgb.as_raw(), w, h, ColorType::Rgb8)?;
        }
        other => {
            image::save_buffer_with_format(
                path,
                buffer.as_raw(),
                w,
                h,
                ColorType::Rgba8,
                other.image_format(),
            )?;
        }
    }
    Ok(())
}

// ============================================================================
// RECIPE FILES (.plr): one layer's ChangeLog
// ============================================================================

const RECIPE_MAGIC_V1: &str = "PLR1";

#[derive(Serialize, Deserialize)]
struct RecipeFileV1 {
    magic: String,
    log: ChangeLog,
}

pub fn save_recipe(log: &ChangeLog, path: &Path) -> Result<(), IoError> {
    let file = RecipeFileV1 { magic: RECIPE_MAGIC_V1.to_string(), log: log.clone() };
    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, &file)?;
    Ok(())
}

/// Load and re-validate a recipe. Values outside their slider domain are
/// rejected rather than clamped.
pub fn load_recipe(path: &Path) -> Result<ChangeLog, IoError> {
    let raw = std::fs::read(path)?;
    if raw.len() < 12 {
        return Err(IoError::InvalidFormat("file too small".into()));
    }
    // bincode writes a String as an 8-byte length prefix + UTF-8 data, so the
    // 4-byte magic sits at 8..12.
    let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
    if magic != RECIPE_MAGIC_V1 {
        return Err(IoError::InvalidFormat(format!("unknown magic '{}'", magic)));
    }
    let file: RecipeFileV1 = bincode::deserialize(&raw)?;
    file.log.validate()?;
    Ok(file.log)
}
