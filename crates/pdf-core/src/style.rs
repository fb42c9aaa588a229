//! Text colour and style flags

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn gray(level: f32) -> Self {
        Self::rgb(level, level, level)
    }

    /// Naive CMYK conversion
    pub fn cmyk(c: f32, m: f32, y: f32, k: f32) -> Self {
        Self::rgb((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    /// True when every component lies in [0, 1]
    pub fn is_valid(&self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }

    /// Packed 0xRRGGBB value
    pub fn to_srgb(&self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Style bitmask of a text span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StyleFlags(pub u32);

impl StyleFlags {
    pub const SUPERSCRIPT: u32 = 1;
    pub const ITALIC: u32 = 2;
    pub const SERIF: u32 = 4;
    pub const MONOSPACE: u32 = 8;
    pub const BOLD: u32 = 16;

    pub fn contains(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn insert(&mut self, bit: u32) {
        self.0 |= bit;
    }

    pub fn is_bold(self) -> bool {
        self.contains(Self::BOLD)
    }

    pub fn is_italic(self) -> bool {
        self.contains(Self::ITALIC)
    }

    pub fn is_serif(self) -> bool {
        self.contains(Self::SERIF)
    }

    pub fn is_monospace(self) -> bool {
        self.contains(Self::MONOSPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_conversions() {
        assert_eq!(Color::from_rgb(255, 0, 0), Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(Color::cmyk(0.0, 0.0, 0.0, 1.0), Color::black());
        assert_eq!(Color::gray(1.0), Color::white());
        assert_eq!(Color::rgb(1.0, 0.0, 0.0).to_srgb(), 0xFF0000);
        assert!(!Color::rgb(1.5, 0.0, 0.0).is_valid());
    }

    #[test]
    fn test_style_flags() {
        let mut flags = StyleFlags::default();
        assert!(!flags.is_bold());
        flags.insert(StyleFlags::BOLD);
        flags.insert(StyleFlags::SERIF);
        assert!(flags.is_bold());
        assert!(flags.is_serif());
        assert!(!flags.is_italic());
        assert_eq!(flags.0, 20);
    }
}
