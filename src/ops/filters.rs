// ============================================================================
// PRESET FILTERS: fixed pipelines over the adjustment transforms
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::ops::adjustments::{self, FilterError};

/// Named one-click looks. `Original` is the identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    #[default]
    Original,
    Sepia,
    Grayscale,
    Moon,
    Claredon,
    Lark,
}

impl Preset {
    /// Thumbnail strip order.
    pub const ALL: [Preset; 6] = [
        Preset::Original,
        Preset::Grayscale,
        Preset::Sepia,
        Preset::Claredon,
        Preset::Lark,
        Preset::Moon,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Original  => "original",
            Preset::Sepia     => "sepia",
            Preset::Grayscale => "grayscale",
            Preset::Moon      => "moon",
            Preset::Claredon  => "claredon",
            Preset::Lark      => "lark",
        }
    }

    pub fn is_original(self) -> bool {
        self == Preset::Original
    }

    /// Run the preset pipeline in place. Stages run in the listed order and
    /// each consumes the previous stage's quantised output.
    pub fn apply(self, buffer: &mut PixelBuffer) -> Result<(), FilterError> {
        match self {
            Preset::Original => {}
            Preset::Sepia => adjustments::sepia(buffer),
            Preset::Grayscale => adjustments::grayscale(buffer),
            Preset::Moon => {
                adjustments::brightness(buffer, 33.5);
                adjustments::saturation(buffer, 0.0);
            }
            Preset::Claredon => {
                adjustments::brightness(buffer, 18.5);
                adjustments::contrast(buffer, 14.0);
                adjustments::saturation(buffer, 1.25);
            }
            Preset::Lark => {
                adjustments::brightness(buffer, 45.0);
                adjustments::contrast(buffer, 17.0);
                adjustments::saturation(buffer, 1.34);
                adjustments::gamma(buffer, 0.57)?;
            }
        }
        Ok(())
    }

    /// Non-mutating form: a filtered deep copy of `source`.
    pub fn render(self, source: &PixelBuffer) -> Result<PixelBuffer, FilterError> {
        let mut out = source.clone();
        self.apply(&mut out)?;
        Ok(out)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FilterError::UnknownPreset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> PixelBuffer {
        PixelBuffer::from_raw(
            2,
            2,
            vec![
                100, 150, 200, 255, 250, 10, 30, 128, //
                0, 0, 0, 255, 64, 200, 128, 0,
            ],
        )
        .unwrap()
    }

    #[test]
    fn original_returns_an_equal_copy() {
        let src = fixture();
        assert_eq!(Preset::Original.render(&src).unwrap(), src);
    }

    #[test]
    fn grayscale_and_sepia_single_pixel() {
        let src = PixelBuffer::filled(1, 1, [100, 150, 200, 255]).unwrap();
        let grey = Preset::Grayscale.render(&src).unwrap();
        assert_eq!(grey.pixel(0, 0), Some([143, 143, 143, 255]));
        let sepia = Preset::Sepia.render(&src).unwrap();
        assert_eq!(sepia.pixel(0, 0), Some([192, 171, 134, 255]));
    }

    #[test]
    fn moon_is_brighten_then_desaturate() {
        let src = fixture();
        let mut expected = src.clone();
        adjustments::brightness(&mut expected, 33.5);
        adjustments::saturation(&mut expected, 0.0);
        let moon = Preset::Moon.render(&src).unwrap();
        assert_eq!(moon, expected);
        for y in 0..2 {
            for x in 0..2 {
                let [r, g, b, _] = moon.pixel(x, y).unwrap();
                assert!(r == g && g == b, "moon pixel ({x},{y}) is not grey");
            }
        }
    }

    #[test]
    fn claredon_stage_order_matters() {
        let src = fixture();
        let mut reordered = src.clone();
        adjustments::saturation(&mut reordered, 1.25);
        adjustments::contrast(&mut reordered, 14.0);
        adjustments::brightness(&mut reordered, 18.5);

        let mut ordered = src.clone();
        adjustments::brightness(&mut ordered, 18.5);
        adjustments::contrast(&mut ordered, 14.0);
        adjustments::saturation(&mut ordered, 1.25);

        let claredon = Preset::Claredon.render(&src).unwrap();
        assert_eq!(claredon, ordered);
        assert_ne!(claredon, reordered);
    }

    #[test]
    fn lark_ends_with_steep_gamma() {
        let src = fixture();
        let lark = Preset::Lark.render(&src).unwrap();
        // Gamma 0.57 -> exponent 175.4: only saturated-white channels survive.
        assert_eq!(lark.pixel(0, 1), Some([0, 0, 0, 255]));
        assert_eq!(lark.pixel(0, 0).map(|p| p[3]), Some(255));
    }

    #[test]
    fn preset_alpha_preserved() {
        let src = fixture();
        for preset in Preset::ALL {
            let out = preset.render(&src).unwrap();
            assert_eq!(out.pixel(1, 0).unwrap()[3], 128, "{preset}");
            assert_eq!(out.pixel(1, 1).unwrap()[3], 0, "{preset}");
        }
    }

    #[test]
    fn preset_names_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
        }
        assert_eq!("SEPIA".parse::<Preset>().unwrap(), Preset::Sepia);
        assert!(matches!("vintage".parse::<Preset>(), Err(FilterError::UnknownPreset(_))));
    }
}
