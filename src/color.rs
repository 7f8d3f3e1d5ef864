/// 8-bit RGBA color as handed to draw calls and light definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const RED: Self = Self::new(230, 41, 55, 255);
    pub const YELLOW: Self = Self::new(253, 249, 0, 255);
    pub const BLUE: Self = Self::new(0, 121, 241, 255);
    pub const RAYWHITE: Self = Self::new(245, 245, 245, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels scaled to `0.0..=1.0`, the form shaders expect.
    pub fn to_normalized(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_channels() {
        assert_eq!(Color::WHITE.to_normalized(), [1.0, 1.0, 1.0, 1.0]);
        let [r, g, b, a] = Color::YELLOW.to_normalized();
        assert!((r - 253.0 / 255.0).abs() < f32::EPSILON);
        assert!((g - 249.0 / 255.0).abs() < f32::EPSILON);
        assert_eq!(b, 0.0);
        assert_eq!(a, 1.0);
    }
}
