// ============================================================================
// TRANSFORM OPERATIONS: rotate, flip, crop and downscale pixel buffers
// ============================================================================

use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};

use crate::buffer::PixelBuffer;
use crate::canvas::LayerError;

/// Quarter-turn direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    /// 90° counter-clockwise.
    Left,
    /// 90° clockwise.
    Right,
}

impl FromStr for Rotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" | "ccw" => Ok(Rotation::Left),
            "right" | "cw" => Ok(Rotation::Right),
            other => Err(format!("unknown rotation '{}' (expected left or right)", other)),
        }
    }
}

/// Crop rectangle in source pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Non-empty and fully inside a `width` x `height` image.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

/// Parses `X,Y,W,H`.
impl FromStr for CropRect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid crop '{}': {}", s, e))?;
        match parts.as_slice() {
            [x, y, w, h] => Ok(CropRect::new(*x, *y, *w, *h)),
            _ => Err(format!("invalid crop '{}': expected X,Y,W,H", s)),
        }
    }
}

/// Rotate by a quarter turn. Width and height swap.
pub fn rotate(buffer: &PixelBuffer, direction: Rotation) -> Result<PixelBuffer, LayerError> {
    let img = buffer.as_rgba_image();
    let out = match direction {
        Rotation::Left => imageops::rotate270(img),
        Rotation::Right => imageops::rotate90(img),
    };
    Ok(PixelBuffer::from_rgba_image(out)?)
}

/// Mirror left <-> right.
pub fn flip_horizontal(buffer: &PixelBuffer) -> Result<PixelBuffer, LayerError> {
    Ok(PixelBuffer::from_rgba_image(imageops::flip_horizontal(buffer.as_rgba_image()))?)
}

pub fn crop(buffer: &PixelBuffer, rect: CropRect) -> Result<PixelBuffer, LayerError> {
    let (w, h) = buffer.dimensions();
    if !rect.fits(w, h) {
        return Err(LayerError::CropOutOfBounds { rect, width: w, height: h });
    }
    let view = imageops::crop_imm(buffer.as_rgba_image(), rect.x, rect.y, rect.width, rect.height);
    Ok(PixelBuffer::from_rgba_image(view.to_image())?)
}

/// Shrink so the longest edge is at most `max_edge`, keeping aspect ratio.
/// Buffers already small enough are returned as a plain copy.
pub fn downscale(buffer: &PixelBuffer, max_edge: u32) -> Result<PixelBuffer, LayerError> {
    let (w, h) = buffer.dimensions();
    let longest = w.max(h);
    if max_edge == 0 || longest <= max_edge {
        return Ok(buffer.clone());
    }
    let scale = max_edge as f64 / longest as f64;
    let nw = ((w as f64 * scale).round() as u32).max(1);
    let nh = ((h as f64 * scale).round() as u32).max(1);
    let out = imageops::resize(buffer.as_rgba_image(), nw, nh, FilterType::Triangle);
    Ok(PixelBuffer::from_rgba_image(out)?)
}
