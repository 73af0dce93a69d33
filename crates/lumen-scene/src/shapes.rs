//! Analytic primitives.
//!
//! Both records are `#[repr(C)]` and [`Pod`] and are uploaded to
//! accelerator storage buffers as-is.

use bytemuck::{Pod, Zeroable};
use lumen_math::Vec4;

use crate::Material;

/// A sphere.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Sphere {
    /// Center point (`w = 1`).
    pub center: Vec4,
    /// Radius.
    pub radius: f32,
    pad: [f32; 3],
    /// Surface material.
    pub material: Material,
}

impl Sphere {
    /// Create a sphere. `center` is stored as a point.
    pub fn new(center: Vec4, radius: f32, material: Material) -> Self {
        Self {
            center: Vec4::point(center.x, center.y, center.z),
            radius,
            pad: [0.0; 3],
            material,
        }
    }
}

/// An infinite plane through `point` with unit `normal`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Plane {
    /// Any point on the plane (`w = 1`).
    pub point: Vec4,
    /// Unit normal (`w = 0`).
    pub normal: Vec4,
    /// Surface material.
    pub material: Material,
}

impl Plane {
    /// Create a plane. `normal` is normalized and must not be zero.
    pub fn new(point: Vec4, normal: Vec4, material: Material) -> Self {
        Self {
            point: Vec4::point(point.x, point.y, point.z),
            normal: Vec4::direction(normal.x, normal.y, normal.z).normalize3(),
            material,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_layout() {
        assert_eq!(std::mem::size_of::<Sphere>(), 80);
        assert_eq!(std::mem::size_of::<Plane>(), 80);
    }

    #[test]
    fn test_plane_normal_normalized() {
        let plane = Plane::new(
            Vec4::point(0.0, 0.0, 0.0),
            Vec4::direction(0.0, 3.0, 4.0),
            Material::default(),
        );
        assert_relative_eq!(plane.normal.length3(), 1.0, epsilon = 1e-6);
        assert_eq!(plane.normal.w, 0.0);
    }

    #[test]
    fn test_sphere_center_is_point() {
        let sphere = Sphere::new(Vec4::direction(1.0, 2.0, 3.0), 1.0, Material::default());
        assert_eq!(sphere.center, Vec4::point(1.0, 2.0, 3.0));
    }
}
