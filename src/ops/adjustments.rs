// ============================================================================
// ADJUSTMENT OPERATIONS: per-pixel colour transforms on a PixelBuffer
// ============================================================================
//
// Every transform rewrites R, G, B of every pixel and leaves alpha alone.
// Each stage quantises back to bytes (clamp to 0..=255, round half to even,
// NaN -> 0) exactly like a canvas byte store, so chaining transforms yields
// the same result as storing between every step.
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::{CHANNELS, PixelBuffer};

/// Every slider multiplies its raw value by this before use.
pub const SLIDER_FACTOR: f64 = 2.0;

/// Contrast percentage -> 0..255 scale.
const CONTRAST_SCALE: f64 = 2.55;
const CONTRAST_MID: f64 = 128.0;

/// Rec.601 luma weights used by the saturation matrix.
const SAT_RW: f64 = 0.299;
const SAT_RG: f64 = 0.587;
const SAT_RB: f64 = 0.114;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("{kind} value {value} is outside {min}..={max}")]
    InvalidParameter {
        kind: AdjustmentKind,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("gamma of 0 has no correction factor (division by zero)")]
    DivisionSingularity,
    #[error("unknown adjustment '{0}'")]
    UnknownAdjustment(String),
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

// ============================================================================
// ADJUSTMENT KINDS
// ============================================================================

/// The continuous sliders, declared in canonical replay order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjustmentKind {
    Brightness,
    Contrast,
    Saturation,
    Gamma,
    Temperature,
    Vibrance,
}

impl AdjustmentKind {
    /// Replay order after the preset.
    pub const ALL: [AdjustmentKind; 6] = [
        AdjustmentKind::Brightness,
        AdjustmentKind::Contrast,
        AdjustmentKind::Saturation,
        AdjustmentKind::Gamma,
        AdjustmentKind::Temperature,
        AdjustmentKind::Vibrance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AdjustmentKind::Brightness  => "Brightness",
            AdjustmentKind::Contrast    => "Contrast",
            AdjustmentKind::Saturation  => "Saturation",
            AdjustmentKind::Gamma       => "Gamma",
            AdjustmentKind::Temperature => "Temperature",
            AdjustmentKind::Vibrance    => "Vibrance",
        }
    }

    /// Inclusive slider domain.
    pub fn range(self) -> (f64, f64) {
        match self {
            AdjustmentKind::Brightness  => (-20.0, 20.0),
            AdjustmentKind::Contrast    => (-10.0, 10.0),
            AdjustmentKind::Saturation  => (0.0, 2.0),
            AdjustmentKind::Gamma       => (0.0, 200.0),
            AdjustmentKind::Temperature => (-25.0, 25.0),
            AdjustmentKind::Vibrance    => (-50.0, 50.0),
        }
    }

    /// Slider position that leaves the image unchanged.
    pub fn initial_value(self) -> f64 {
        match self {
            AdjustmentKind::Saturation => 1.0,
            AdjustmentKind::Gamma      => 100.0,
            _                          => 0.0,
        }
    }

    /// Reject values outside the slider domain (and NaN).
    pub fn validate(self, value: f64) -> Result<f64, FilterError> {
        let (min, max) = self.range();
        if value.is_nan() || value < min || value > max {
            return Err(FilterError::InvalidParameter { kind: self, value, min, max });
        }
        Ok(value)
    }

    /// Run this adjustment in place. No domain check: presets drive the
    /// same transforms with values outside the slider ranges.
    pub fn apply(self, buffer: &mut PixelBuffer, value: f64) -> Result<(), FilterError> {
        match self {
            AdjustmentKind::Brightness  => brightness(buffer, value),
            AdjustmentKind::Contrast    => contrast(buffer, value),
            AdjustmentKind::Saturation  => saturation(buffer, value),
            AdjustmentKind::Gamma       => gamma(buffer, value)?,
            AdjustmentKind::Temperature => temperature(buffer, value),
            AdjustmentKind::Vibrance    => vibrance(buffer, value),
        }
        Ok(())
    }
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdjustmentKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdjustmentKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FilterError::UnknownAdjustment(s.to_string()))
    }
}

// ============================================================================
// HELPER: per-pixel RGB transform with canvas-style byte quantisation
// ============================================================================

/// Store a computed channel the way a clamped byte array does.
pub fn to_channel(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, 255.0).round_ties_even() as u8
}

/// `transform` receives (r, g, b) as f64 and returns the new (r, g, b).
fn apply_pixel_transform<F>(buffer: &mut PixelBuffer, transform: F)
where
    F: Fn(f64, f64, f64) -> (f64, f64, f64),
{
    for px in buffer.raw_mut().chunks_exact_mut(CHANNELS) {
        let (nr, ng, nb) = transform(px[0] as f64, px[1] as f64, px[2] as f64);
        px[0] = to_channel(nr);
        px[1] = to_channel(ng);
        px[2] = to_channel(nb);
    }
}

/// Round halves towards positive infinity (-2.5 -> -2, 2.5 -> 3).
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

// ============================================================================
// SLIDER TRANSFORMS
// ============================================================================

/// Additive brightness: `c + 2v`, capped at 255.
pub fn brightness(buffer: &mut PixelBuffer, value: f64) {
    let offset = SLIDER_FACTOR * value;
    apply_pixel_transform(buffer, move |r, g, b| {
        ((r + offset).min(255.0), (g + offset).min(255.0), (b + offset).min(255.0))
    });
}

/// Contrast around mid-grey 128.
pub fn contrast(buffer: &mut PixelBuffer, value: f64) {
    let k = value * SLIDER_FACTOR * CONTRAST_SCALE;
    let factor = (k + 255.0) / (255.01 - k);
    apply_pixel_transform(buffer, move |r, g, b| {
        (
            factor * (r - CONTRAST_MID) + CONTRAST_MID,
            factor * (g - CONTRAST_MID) + CONTRAST_MID,
            factor * (b - CONTRAST_MID) + CONTRAST_MID,
        )
    });
}

/// Classic luma-preserving saturation matrix. 0 = fully grey, 1 = identity.
pub fn saturation(buffer: &mut PixelBuffer, value: f64) {
    let s_bar = 1.0 - value;
    let rw = s_bar * SAT_RW;
    let gw = s_bar * SAT_RG;
    let bw = s_bar * SAT_RB;
    let m = [
        [rw + value, gw, bw],
        [rw, gw + value, bw],
        [rw, gw, bw + value],
    ];
    apply_pixel_transform(buffer, move |r, g, b| {
        (
            m[0][0] * r + m[0][1] * g + m[0][2] * b,
            m[1][0] * r + m[1][1] * g + m[1][2] * b,
            m[2][0] * r + m[2][1] * g + m[2][2] * b,
        )
    });
}

/// Exponent used by [`gamma`]: `100 / value` rounded to one decimal.
pub fn gamma_correction(value: f64) -> Result<f64, FilterError> {
    if value == 0.0 {
        return Err(FilterError::DivisionSingularity);
    }
    Ok(round_half_up(100.0 / value * 10.0) / 10.0)
}

/// Power-curve gamma. 100 is identity; 0 is rejected.
pub fn gamma(buffer: &mut PixelBuffer, value: f64) -> Result<(), FilterError> {
    let correction = gamma_correction(value)?;
    apply_pixel_transform(buffer, move |r, g, b| {
        (
            255.0 * (r / 255.0).powf(correction),
            255.0 * (g / 255.0).powf(correction),
            255.0 * (b / 255.0).powf(correction),
        )
    });
    Ok(())
}

/// Warm (positive) pushes red up and blue down; green is untouched.
pub fn temperature(buffer: &mut PixelBuffer, value: f64) {
    let shift = SLIDER_FACTOR * value;
    apply_pixel_transform(buffer, move |r, g, b| (r + shift, g, b - shift));
}

/// Pull the weaker channels towards the strongest one, scaled by how
/// saturated the pixel already is.
pub fn vibrance(buffer: &mut PixelBuffer, value: f64) {
    let factor = SLIDER_FACTOR * value;
    apply_pixel_transform(buffer, move |r, g, b| {
        let max = r.max(g).max(b);
        let avg = (r + g + b) / 3.0;
        let amt = ((max - avg).abs() * 2.0 / 255.0) * factor / 100.0;
        let pull = |c: f64| if c < max { c + (max - c) * amt } else { c };
        (pull(r), pull(g), pull(b))
    });
}

// ============================================================================
// PRESET ATOMS
// ============================================================================

/// Sepia tone matrix.
pub fn sepia(buffer: &mut PixelBuffer) {
    apply_pixel_transform(buffer, |r, g, b| {
        let sr = 0.393 * r + 0.769 * g + 0.189 * b;
        let sg = 0.349 * r + 0.686 * g + 0.168 * b;
        let sb = 0.272 * r + 0.534 * g + 0.131 * b;
        (sr.min(255.0), sg.min(255.0), sb.min(255.0))
    });
}

/// Rec.709 perceptual luminance written to all three channels.
pub fn grayscale(buffer: &mut PixelBuffer) {
    apply_pixel_transform(buffer, |r, g, b| {
        let lum = (0.2126 * r + 0.7152 * g + 0.0722 * b).min(255.0);
        (lum, lum, lum)
    });
}
