use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB colour with components in `0.0..=1.0`.
///
/// Stored as authored in hex (sRGB); no gamma conversion happens here.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Builds a colour from a packed `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Parses `#rrggbb`, `rrggbb` or the short `#rgb` form.
    pub fn parse_hex(text: &str) -> Option<Self> {
        let digits = text.trim().trim_start_matches('#');
        let packed = match digits.len() {
            6 => u32::from_str_radix(digits, 16).ok()?,
            3 => {
                let short = u32::from_str_radix(digits, 16).ok()?;
                let r = (short >> 8) & 0xf;
                let g = (short >> 4) & 0xf;
                let b = short & 0xf;
                (r * 0x11) << 16 | (g * 0x11) << 8 | (b * 0x11)
            }
            _ => return None,
        };
        Some(Self::from_hex(packed))
    }

    /// Packs the colour back to `0xRRGGBB`, clamping out-of-range channels.
    pub fn to_hex(&self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        channel(self.r) << 16 | channel(self.g) << 8 | channel(self.b)
    }

    pub fn from_rgba_slice(rgba: [f32; 4]) -> Self {
        Self::new(rgba[0], rgba[1], rgba[2])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}
