use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Linear RGB color, each channel in `[0, 1]`.
///
/// Serializes as a packed `0xRRGGBB` integer so config files can use the
/// same notation as color pickers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const GREEN: Rgb = Rgb::new(0.0, 1.0, 0.0);
    pub const BLUE: Rgb = Rgb::new(0.0, 0.0, 1.0);
    pub const YELLOW: Rgb = Rgb::new(1.0, 1.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    pub fn to_hex(self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Packs the color with an extra fourth component (alpha or intensity).
    pub fn extend(self, w: f32) -> [f32; 4] {
        [self.r, self.g, self.b, w]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<u32> for Rgb {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

impl From<Rgb> for u32 {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

impl From<[f32; 3]> for Rgb {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for Vec3 {
    fn from(color: Rgb) -> Self {
        Vec3::new(color.r, color.g, color.b)
    }
}

#[cfg(test)]
mod tests {
    use super::Rgb;

    #[test]
    fn hex_conversion_keeps_channels() {
        let color = Rgb::from_hex(0x3f3f64);
        assert!((color.r - 63.0 / 255.0).abs() < 1e-6);
        assert!((color.b - 100.0 / 255.0).abs() < 1e-6);
        assert_eq!(color.to_hex(), 0x3f3f64);
    }

    #[test]
    fn serializes_as_packed_integer() {
        let json = serde_json::to_string(&Rgb::YELLOW).unwrap();
        assert_eq!(json, (0xffff00u32).to_string());

        let parsed: Rgb = serde_json::from_str("255").unwrap();
        assert_eq!(parsed, Rgb::BLUE);
    }
}
