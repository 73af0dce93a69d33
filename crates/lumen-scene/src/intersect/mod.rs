//! Ray-primitive intersection and the closest-hit query.
//!
//! A miss is `None`. The closest-hit scan is a linear pass over spheres
//! then planes; there is no acceleration structure.

mod plane;
mod sphere;

pub use plane::intersect_plane;
pub use sphere::intersect_sphere;

use lumen_math::Vec4;

use crate::{Material, Plane, Ray, Sphere};

/// Ray parameter the closest-hit scan starts from.
pub const NO_HIT: f32 = f32::INFINITY;

/// A resolved ray-primitive hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// The ray that produced the hit.
    pub ray: Ray,
    /// Parameter along the ray.
    pub t: f32,
    /// Hit point (`w = 1`).
    pub point: Vec4,
    /// Unit surface normal at the hit point (`w = 0`).
    pub normal: Vec4,
    /// Material of the primitive that was hit.
    pub material: Material,
}

/// Find the nearest hit among all spheres and planes.
///
/// Ties keep the first primitive encountered: spheres before planes, then
/// array order.
pub fn find_closest_intersection(
    ray: &Ray,
    spheres: &[Sphere],
    planes: &[Plane],
) -> Option<Intersection> {
    let mut nearest = NO_HIT;
    let mut closest = None;

    let sphere_hits = spheres.iter().filter_map(|s| intersect_sphere(ray, s));
    let plane_hits = planes.iter().filter_map(|p| intersect_plane(ray, p));
    for hit in sphere_hits.chain(plane_hits) {
        if hit.t < nearest {
            nearest = hit.t;
            closest = Some(hit);
        }
    }

    closest
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lumen_math::Color;

    fn red() -> Material {
        Material::diffuse(Color::rgb(1.0, 0.0, 0.0))
    }

    fn blue() -> Material {
        Material::diffuse(Color::rgb(0.0, 0.0, 1.0))
    }

    fn forward() -> Ray {
        Ray::new(Vec4::point(0.0, 0.0, 0.0), Vec4::direction(0.0, 0.0, -1.0))
    }

    #[test]
    fn test_empty_scene_misses() {
        assert!(find_closest_intersection(&forward(), &[], &[]).is_none());
    }

    #[test]
    fn test_nearer_sphere_wins() {
        let near = Sphere::new(Vec4::point(0.0, 0.0, -5.0), 1.0, red());
        let far = Sphere::new(Vec4::point(0.0, 0.0, -10.0), 2.0, blue());

        for spheres in [[near, far], [far, near]] {
            let hit = find_closest_intersection(&forward(), &spheres, &[]).unwrap();
            assert_relative_eq!(hit.t, 4.0, epsilon = 1e-4);
            assert_eq!(hit.material, red());
        }
    }

    #[test]
    fn test_degenerate_sphere_is_transparent() {
        let point = Sphere::new(Vec4::point(0.0, 0.0, -3.0), 0.0, red());
        let wall = Plane::new(
            Vec4::point(0.0, 0.0, -8.0),
            Vec4::direction(0.0, 0.0, 1.0),
            blue(),
        );
        let hit = find_closest_intersection(&forward(), &[point], &[wall]).unwrap();
        assert_eq!(hit.material, blue());
        assert!(hit.normal.length3().is_finite());
    }

    #[test]
    fn test_sphere_in_front_of_plane() {
        let sphere = Sphere::new(Vec4::point(0.0, 0.0, -5.0), 1.0, red());
        let wall = Plane::new(
            Vec4::point(0.0, 0.0, -8.0),
            Vec4::direction(0.0, 0.0, 1.0),
            blue(),
        );
        let hit = find_closest_intersection(&forward(), &[sphere], &[wall]).unwrap();
        assert_eq!(hit.material, red());

        let closer = Plane::new(
            Vec4::point(0.0, 0.0, -2.0),
            Vec4::direction(0.0, 0.0, 1.0),
            blue(),
        );
        let hit = find_closest_intersection(&forward(), &[sphere], &[closer]).unwrap();
        assert_eq!(hit.material, blue());
        assert_relative_eq!(hit.t, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_tie_keeps_first_encountered() {
        let a = Sphere::new(Vec4::point(0.0, 0.0, -5.0), 1.0, red());
        let b = Sphere::new(Vec4::point(0.0, 0.0, -5.0), 1.0, blue());
        let hit = find_closest_intersection(&forward(), &[a, b], &[]).unwrap();
        assert_eq!(hit.material, red());

        // A plane tangent to the sphere's front pole ties with it.
        let plane = Plane::new(
            Vec4::point(0.0, 0.0, -4.0),
            Vec4::direction(0.0, 0.0, 1.0),
            blue(),
        );
        let hit = find_closest_intersection(&forward(), &[a], &[plane]).unwrap();
        assert_eq!(hit.material, red());
    }
}
