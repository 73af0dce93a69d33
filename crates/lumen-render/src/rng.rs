//! Per-pixel random streams.
//!
//! Every pixel owns a generator seeded from its coordinates alone, so a
//! pixel draws the same sequence on every render and no two pixels share
//! state.

use std::f32::consts::TAU;

use lumen_math::Vec4;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro128PlusPlus;

/// Generator used by the CPU backend.
pub type PixelRng = Xoshiro128PlusPlus;

/// The generator for pixel `(x, y)`.
pub fn pixel_rng(x: u32, y: u32) -> PixelRng {
    PixelRng::seed_from_u64((u64::from(y) << 32) | u64::from(x))
}

/// A direction drawn uniformly from the unit sphere.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec4 {
    let z = 2.0 * rng.gen::<f32>() - 1.0;
    let phi = TAU * rng.gen::<f32>();
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec4::direction(r * phi.cos(), r * phi.sin(), z)
}

/// A uniform direction on the hemisphere around `normal`.
pub fn random_in_hemisphere<R: Rng + ?Sized>(rng: &mut R, normal: Vec4) -> Vec4 {
    let v = random_unit_vector(rng);
    if v.dot3(normal) < 0.0 {
        -v
    } else {
        v
    }
}
