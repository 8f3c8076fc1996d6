// ============================================================================
// PIXEL BUFFER: validated RGBA8 grid shared by every transform
// ============================================================================
//
// Layout is fixed: 4 bytes per pixel, R G B A, row-major, straight (not
// premultiplied) alpha. The length invariant is checked once at construction,
// so transforms can walk `chunks_exact_mut(4)` without re-checking.
// ============================================================================

use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Bytes per pixel. Every buffer in the crate is RGBA8.
pub const CHANNELS: usize = 4;

/// Maximum supported dimension in pixels (per axis).
/// Prevents memory exhaustion from crafted recipe or image inputs.
pub const MAX_BUFFER_DIM: u32 = 32_768;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("pixel data has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("{width}x{height} exceeds the maximum buffer dimension of {MAX_BUFFER_DIM}")]
    TooLarge { width: u32, height: u32 },
}

/// An RGBA8 pixel grid. Cloning is a deep copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Result<Self, BufferError> {
        check_dims(width, height)?;
        Ok(Self { image: RgbaImage::new(width, height) })
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, BufferError> {
        check_dims(width, height)?;
        Ok(Self { image: RgbaImage::from_pixel(width, height, Rgba(rgba)) })
    }

    /// Wrap raw RGBA bytes. `data.len()` must equal `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, BufferError> {
        check_dims(width, height)?;
        let expected = width as usize * height as usize * CHANNELS;
        let actual = data.len();
        // `from_raw` accepts oversized vectors, so the exact length is checked here.
        if actual != expected {
            return Err(BufferError::LengthMismatch { width, height, expected, actual });
        }
        let image = RgbaImage::from_raw(width, height, data)
            .ok_or(BufferError::LengthMismatch { width, height, expected, actual })?;
        Ok(Self { image })
    }

    pub fn from_rgba_image(image: RgbaImage) -> Result<Self, BufferError> {
        check_dims(image.width(), image.height())?;
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Mutable access to the raw bytes. The length cannot change through a slice,
    /// so the layout invariant holds.
    pub(crate) fn raw_mut(&mut self) -> &mut [u8] {
        &mut *self.image
    }

    /// RGBA of one pixel, or `None` outside the grid.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.image.get_pixel(x, y).0)
    }

    pub fn as_rgba_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba_image(self) -> RgbaImage {
        self.image
    }
}

fn check_dims(width: u32, height: u32) -> Result<(), BufferError> {
    if width > MAX_BUFFER_DIM || height > MAX_BUFFER_DIM {
        return Err(BufferError::TooLarge { width, height });
    }
    Ok(())
}
