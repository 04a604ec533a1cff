use serde::{Deserialize, Serialize};

use crate::Color;

/// Colors used when rendering a value matrix as a heatmap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapPalette {
    /// Color at the matrix minimum.
    pub low: Color,
    /// Color halfway between minimum and maximum.
    pub mid: Color,
    /// Color at the matrix maximum.
    pub high: Color,
    /// Color for cells whose value is exactly zero.
    pub zero: Color,
    /// Shade for positions without a numeric reference value.
    pub missing: Color,
}

impl Default for HeatmapPalette {
    fn default() -> Self {
        Self {
            low: Color::from_rgb(0x00, 0xFF, 0x00),
            mid: Color::from_rgb(0xFF, 0xFF, 0x00),
            high: Color::from_rgb(0xFF, 0x00, 0x00),
            zero: Color::white(),
            missing: Color::from_rgb(0xD0, 0xD0, 0xD0),
        }
    }
}

/// A palette bound to the value range of one matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Heatmap<'a> {
    palette: &'a HeatmapPalette,
    min: f64,
    max: f64,
}

impl<'a> Heatmap<'a> {
    pub fn new(palette: &'a HeatmapPalette, min: f64, max: f64) -> Self {
        Self { palette, min, max }
    }

    pub fn palette(&self) -> &HeatmapPalette {
        self.palette
    }

    /// Position of `value` in `0.0..=1.0` over the bound range.
    pub fn scale(&self, value: f64) -> f32 {
        let denom = self.max - self.min;
        if denom == 0.0 || !denom.is_finite() {
            return 0.0;
        }
        (((value - self.min) / denom) as f32).clamp(0.0, 1.0)
    }

    /// Fill color for `value`: the zero color for exact zeros, otherwise a
    /// low -> mid -> high interpolation.
    pub fn color_for(&self, value: f64) -> Color {
        if value == 0.0 {
            return self.palette.zero;
        }
        let t = self.scale(value);
        if t <= 0.5 {
            lerp_color(self.palette.low, self.palette.mid, t * 2.0)
        } else {
            lerp_color(self.palette.mid, self.palette.high, (t - 0.5) * 2.0)
        }
    }
}

/// Channel-wise linear interpolation between two colors, `t` clamped to `0..=1`.
pub fn lerp_color(a: Color, b: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let (aa, ar, ag, ab) = a.channels();
    let (ba, br, bg, bb) = b.channels();
    let lerp = |x: u8, y: u8| -> u32 { (x as f32 + (y as f32 - x as f32) * t).round() as u32 };

    Color::new_argb((lerp(aa, ba) << 24) | (lerp(ar, br) << 16) | (lerp(ag, bg) << 8) | lerp(ab, bb))
}
