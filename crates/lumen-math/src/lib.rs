#![warn(missing_docs)]

//! Math types for the lumen path tracer.
//!
//! A single 4-component `f32` vector serves as point, direction and color.
//! The layout is `#[repr(C)]` and [`bytemuck::Pod`] so that scene records
//! built from it can be copied verbatim into accelerator storage buffers.

mod color;

pub use color::{Color, Rgba8};

use bytemuck::{Pod, Zeroable};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Geometric tolerance used by intersection tests and ray offsets.
pub const EPSILON: f32 = 1e-4;

/// A 4-component vector.
///
/// Points carry `w = 1`, directions `w = 0`. The 3D operations
/// (`dot3`, `length3`, `normalize3`, `reflect`) ignore `w`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vec4 {
    /// X component (red for colors).
    pub x: f32,
    /// Y component (green for colors).
    pub y: f32,
    /// Z component (blue for colors).
    pub z: f32,
    /// W component (alpha for colors).
    pub w: f32,
}

impl Vec4 {
    /// All components zero.
    pub const ZERO: Self = Self::splat(0.0);
    /// All components one.
    pub const ONE: Self = Self::splat(1.0);

    /// Create a vector from its components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Create a vector with every component set to `v`.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    /// A position in space (`w = 1`).
    #[inline]
    pub const fn point(x: f32, y: f32, z: f32) -> Self {
        Self::new(x, y, z, 1.0)
    }

    /// A direction in space (`w = 0`).
    #[inline]
    pub const fn direction(x: f32, y: f32, z: f32) -> Self {
        Self::new(x, y, z, 0.0)
    }

    /// Dot product of the xyz components.
    #[inline]
    pub fn dot3(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Dot product of all four components.
    #[inline]
    pub fn dot4(self, other: Self) -> f32 {
        self.dot3(other) + self.w * other.w
    }

    /// Euclidean length of the xyz components.
    #[inline]
    pub fn length3(self) -> f32 {
        self.dot3(self).sqrt()
    }

    /// Euclidean length of all four components.
    #[inline]
    pub fn length4(self) -> f32 {
        self.dot4(self).sqrt()
    }

    /// Scale xyz to unit length, leaving `w` untouched.
    ///
    /// A zero-length input yields NaN components; callers must not
    /// normalize a zero vector.
    #[inline]
    pub fn normalize3(self) -> Self {
        let len = self.length3();
        Self::new(self.x / len, self.y / len, self.z / len, self.w)
    }

    /// Scale all four components to unit length.
    #[inline]
    pub fn normalize4(self) -> Self {
        self / self.length4()
    }

    /// Clamp every component to `[min, max]`.
    #[inline]
    pub fn clamp(self, min: f32, max: f32) -> Self {
        Self::new(
            self.x.clamp(min, max),
            self.y.clamp(min, max),
            self.z.clamp(min, max),
            self.w.clamp(min, max),
        )
    }

    /// Linear interpolation: `self` at `t = 0`, `other` at `t = 1`.
    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self * (1.0 - t) + other * t
    }

    /// Mirror `d` about the unit normal `n`: `d - 2 (d . n) n`.
    #[inline]
    pub fn reflect(d: Self, n: Self) -> Self {
        d - n * (2.0 * d.dot3(n))
    }

    /// Components as an array `[x, y, z, w]`.
    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

impl From<[f32; 4]> for Vec4 {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait for Vec4 {
            type Output = Vec4;

            #[inline]
            fn $method(self, rhs: Vec4) -> Vec4 {
                Vec4::new(self.x $op rhs.x, self.y $op rhs.y, self.z $op rhs.z, self.w $op rhs.w)
            }
        }

        impl $trait<f32> for Vec4 {
            type Output = Vec4;

            #[inline]
            fn $method(self, rhs: f32) -> Vec4 {
                Vec4::new(self.x $op rhs, self.y $op rhs, self.z $op rhs, self.w $op rhs)
            }
        }

        impl $assign_trait for Vec4 {
            #[inline]
            fn $assign_method(&mut self, rhs: Vec4) {
                *self = *self $op rhs;
            }
        }

        impl $assign_trait<f32> for Vec4 {
            #[inline]
            fn $assign_method(&mut self, rhs: f32) {
                *self = *self $op rhs;
            }
        }
    };
}

impl_binary_op!(Add, add, AddAssign, add_assign, +);
impl_binary_op!(Sub, sub, SubAssign, sub_assign, -);
impl_binary_op!(Mul, mul, MulAssign, mul_assign, *);
impl_binary_op!(Div, div, DivAssign, div_assign, /);

impl Add<Vec4> for f32 {
    type Output = Vec4;

    #[inline]
    fn add(self, rhs: Vec4) -> Vec4 {
        rhs + self
    }
}

impl Mul<Vec4> for f32 {
    type Output = Vec4;

    #[inline]
    fn mul(self, rhs: Vec4) -> Vec4 {
        rhs * self
    }
}

impl Neg for Vec4 {
    type Output = Vec4;

    #[inline]
    fn neg(self) -> Vec4 {
        Vec4::new(-self.x, -self.y, -self.z, -self.w)
    }
}

impl Sum for Vec4 {
    fn sum<I: Iterator<Item = Vec4>>(iter: I) -> Self {
        iter.fold(Vec4::ZERO, |acc, v| acc + v)
    }
}
