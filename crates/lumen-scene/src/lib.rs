#![warn(missing_docs)]

//! Scene geometry for the lumen path tracer.
//!
//! Spheres and planes with Lambertian/specular materials, ray
//! intersection against them, the closest-hit query, render parameters
//! and the on-disk scene description format.
//!
//! # Example
//!
//! ```
//! use lumen_math::Vec4;
//! use lumen_scene::{find_closest_intersection, Material, Ray, Sphere};
//!
//! let sphere = Sphere::new(Vec4::point(0.0, 0.0, -5.0), 1.0, Material::default());
//! let ray = Ray::new(Vec4::point(0.0, 0.0, 0.0), Vec4::direction(0.0, 0.0, -1.0));
//! let hit = find_closest_intersection(&ray, &[sphere], &[]).unwrap();
//! assert!((hit.t - 4.0).abs() < 1e-4);
//! ```

pub mod description;
pub mod error;
pub mod intersect;
mod material;
mod params;
mod ray;
mod shapes;

pub use description::{Scene, SceneDescription};
pub use error::{Result, SceneError};
pub use intersect::{
    find_closest_intersection, intersect_plane, intersect_sphere, Intersection, NO_HIT,
};
pub use material::Material;
pub use params::{
    Camera, RenderParams, DEFAULT_MAX_DEPTH, DEFAULT_SAMPLES_PER_PIXEL, MAX_BOUNCES,
};
pub use ray::Ray;
pub use shapes::{Plane, Sphere};
