//! Ray-plane intersection (closed-form).

use lumen_math::EPSILON;

use super::Intersection;
use crate::{Plane, Ray};

/// Intersect a ray with a plane.
///
/// Returns `None` if the ray is (near-)parallel to the plane or the plane
/// lies behind the origin. The reported normal is the plane's own normal.
pub fn intersect_plane(ray: &Ray, plane: &Plane) -> Option<Intersection> {
    let denom = plane.normal.dot3(ray.direction);

    // Ray is parallel to plane
    if denom.abs() < EPSILON {
        return None;
    }

    let t = (plane.point - ray.origin).dot3(plane.normal) / denom;
    if t < 0.0 {
        return None;
    }

    Some(Intersection {
        ray: *ray,
        t,
        point: ray.at(t),
        normal: plane.normal,
        material: plane.material,
    })
}
