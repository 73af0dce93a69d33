//! The Monte Carlo path-tracing estimator.
//!
//! A path is traced as an explicit loop: each bounce pushes the hit
//! surface's `(emittance, diffuse)` onto a fixed stack, and once the path
//! escapes to the sky or runs out of depth the stack is folded back into
//! a single radiance estimate.

use lumen_math::{Color, Rgba8, Vec4, EPSILON};
use lumen_scene::{find_closest_intersection, Plane, Ray, RenderParams, Sphere, MAX_BOUNCES};
use rand::Rng;

use crate::rng::random_in_hemisphere;

/// Sky color at the top row of the image.
pub const SKY_TOP: Color = Color::rgb(0.5, 0.7, 1.0);

/// Primary ray through pixel `(x, y)` with a random in-pixel jitter.
///
/// The camera looks down -Z with +Y up; image row 0 is the top.
pub fn generate_camera_ray<R: Rng + ?Sized>(
    x: u32,
    y: u32,
    params: &RenderParams,
    rng: &mut R,
) -> Ray {
    let jx: f32 = rng.gen();
    let jy: f32 = rng.gen();
    let scale = params.camera.half_height();
    let px = (2.0 * (x as f32 + jx) / params.width as f32 - 1.0) * params.aspect_ratio() * scale;
    let py = (1.0 - 2.0 * (y as f32 + jy) / params.height as f32) * scale;
    Ray::new(params.camera.position, Vec4::direction(px, py, -1.0))
}

/// Environment light for rays that leave the scene, by image row.
///
/// Blends from [`SKY_TOP`] at row 0 to white at the bottom row.
pub fn sky_color(row: u32, height: u32) -> Color {
    let t = row as f32 / height.saturating_sub(1).max(1) as f32;
    SKY_TOP.lerp(Color::WHITE, t.min(1.0))
}

/// Estimate the radiance arriving along `ray`, starting at bounce `depth`.
///
/// `row` is the image row the path belongs to and selects the sky color.
/// A miss returns the sky; a hit once `depth` has reached
/// `params.max_depth` returns black. Otherwise the path bounces, as a
/// mirror reflection with probability `reflectance` or else in a uniform
/// direction on the normal's hemisphere, and the result is
/// `clamp(emittance + diffuse * incoming, 0, 1)`.
pub fn ray_trace<R: Rng + ?Sized>(
    ray: Ray,
    row: u32,
    params: &RenderParams,
    spheres: &[Sphere],
    planes: &[Plane],
    rng: &mut R,
    depth: u32,
) -> Color {
    let mut frames = [(Color::ZERO, Color::ZERO); MAX_BOUNCES as usize];
    let mut stacked = 0;
    let mut ray = ray;
    let mut depth = depth;

    let mut radiance = loop {
        let Some(hit) = find_closest_intersection(&ray, spheres, planes) else {
            break sky_color(row, params.height);
        };
        if depth >= params.max_depth || stacked == frames.len() {
            break Color::BLACK;
        }

        let direction = if rng.gen::<f32>() < hit.material.reflectance {
            Vec4::reflect(ray.direction, hit.normal)
        } else {
            random_in_hemisphere(rng, hit.normal)
        };
        frames[stacked] = (hit.material.emittance, hit.material.diffuse);
        stacked += 1;
        ray = Ray::new(hit.point + hit.normal * EPSILON, direction);
        depth += 1;
    };

    for &(emittance, diffuse) in frames[..stacked].iter().rev() {
        radiance = (emittance + diffuse * radiance).clamp(0.0, 1.0);
    }
    radiance
}

/// Average `samples_per_pixel` independent estimates for pixel `(x, y)`.
pub fn estimate_pixel<R: Rng + ?Sized>(
    x: u32,
    y: u32,
    params: &RenderParams,
    spheres: &[Sphere],
    planes: &[Plane],
    rng: &mut R,
) -> Rgba8 {
    let mut sum = Color::ZERO;
    for _ in 0..params.samples_per_pixel {
        let ray = generate_camera_ray(x, y, params, rng);
        sum += ray_trace(ray, y, params, spheres, planes, rng, 0);
    }
    (sum / params.samples_per_pixel as f32).to_rgba8()
}
