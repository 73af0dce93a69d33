//! Ray representation.

use lumen_math::Vec4;

/// A ray defined by origin and unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin point (`w = 1`).
    pub origin: Vec4,
    /// Unit direction (`w = 0`).
    pub direction: Vec4,
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized.
    pub fn new(origin: Vec4, direction: Vec4) -> Self {
        Self {
            origin: Vec4::point(origin.x, origin.y, origin.z),
            direction: Vec4::direction(direction.x, direction.y, direction.z).normalize3(),
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f32) -> Vec4 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec4::point(1.0, 0.0, 0.0), Vec4::direction(0.0, 2.0, 0.0));
        let p = ray.at(3.0);
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 3.0);
        assert_relative_eq!(p.z, 0.0);
        assert_eq!(p.w, 1.0);
    }
}
