//! Color forms: floating-point compute form and byte storage form.

use bytemuck::{Pod, Zeroable};

use crate::Vec4;

/// A color in compute form: `(r, g, b, a)` as `f32`, nominally in `[0, 1]`.
pub type Color = Vec4;

impl Vec4 {
    /// Opaque black `(0, 0, 0, 1)`.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white `(1, 1, 1, 1)`.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    /// An opaque color.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Red channel.
    #[inline]
    pub fn r(self) -> f32 {
        self.x
    }

    /// Green channel.
    #[inline]
    pub fn g(self) -> f32 {
        self.y
    }

    /// Blue channel.
    #[inline]
    pub fn b(self) -> f32 {
        self.z
    }

    /// Alpha channel.
    #[inline]
    pub fn a(self) -> f32 {
        self.w
    }

    /// Convert to storage form: clamp to `[0, 1]`, scale by 255, truncate.
    #[inline]
    pub fn to_rgba8(self) -> Rgba8 {
        let c = self.clamp(0.0, 1.0) * 255.0;
        Rgba8::new(c.x as u8, c.y as u8, c.z as u8, c.w as u8)
    }
}

/// A color in storage form: one byte per channel, laid out `r, g, b, a`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgba8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba8 {
    /// Create a byte color.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Back to compute form, each channel divided by 255.
    pub fn to_color(self) -> Color {
        Vec4::new(self.r as f32, self.g as f32, self.b as f32, self.a as f32) / 255.0
    }
}

impl From<Color> for Rgba8 {
    fn from(color: Color) -> Self {
        color.to_rgba8()
    }
}
