//! Surface materials.

use bytemuck::{Pod, Zeroable};
use lumen_math::Color;

/// Lambertian diffuse plus ideal specular, with optional emission.
///
/// `reflectance` is the probability that a bounce off this surface is a
/// mirror reflection rather than a diffuse scatter.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Material {
    /// Color multiplied into light arriving from the bounce.
    pub diffuse: Color,
    /// Light emitted by the surface.
    pub emittance: Color,
    /// Mirror-bounce probability in `[0, 1]`.
    pub reflectance: f32,
    pad: [f32; 3],
}

impl Material {
    /// Create a material. `reflectance` is clamped to `[0, 1]`.
    pub fn new(diffuse: Color, emittance: Color, reflectance: f32) -> Self {
        Self {
            diffuse,
            emittance,
            reflectance: reflectance.clamp(0.0, 1.0),
            pad: [0.0; 3],
        }
    }

    /// A purely diffuse, non-emissive surface.
    pub fn diffuse(color: Color) -> Self {
        Self::new(color, Color::BLACK, 0.0)
    }

    /// A light source that also scatters with `diffuse`.
    pub fn emissive(diffuse: Color, emittance: Color) -> Self {
        Self::new(diffuse, emittance, 0.0)
    }

    /// A perfect mirror tinted by `tint`.
    pub fn mirror(tint: Color) -> Self {
        Self::new(tint, Color::BLACK, 1.0)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Color::rgb(0.8, 0.8, 0.8))
    }
}
