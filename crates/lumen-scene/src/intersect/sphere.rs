//! Ray-sphere intersection (geometric method).

use lumen_math::EPSILON;

use super::Intersection;
use crate::{Ray, Sphere};

/// Intersect a ray with a sphere.
///
/// Projects the center onto the ray, compares the perpendicular distance
/// with the radius and takes the nearer root. A near root closer than
/// [`EPSILON`] falls through to the far root, so rays leaving a surface do
/// not re-hit it at `t ~ 0`; if the far root is also below `EPSILON` the
/// sphere is missed. Spheres with a radius at or below [`EPSILON`] have
/// no usable surface normal and are never hit.
pub fn intersect_sphere(ray: &Ray, sphere: &Sphere) -> Option<Intersection> {
    if sphere.radius <= EPSILON {
        return None;
    }
    let l = sphere.center - ray.origin;
    let tca = l.dot3(ray.direction);
    let d2 = l.dot3(l) - tca * tca;
    let r2 = sphere.radius * sphere.radius;
    if d2 > r2 {
        return None;
    }

    let thc = (r2 - d2).sqrt();
    let mut t = tca - thc;
    if t < EPSILON {
        t = tca + thc;
        if t < EPSILON {
            return None;
        }
    }

    let point = ray.at(t);
    let normal = (point - sphere.center).normalize3();
    Some(Intersection {
        ray: *ray,
        t,
        point,
        normal,
        material: sphere.material,
    })
}
