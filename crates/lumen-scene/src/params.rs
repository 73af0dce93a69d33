//! Camera and render parameters.

use bytemuck::{Pod, Zeroable};
use lumen_math::Vec4;

use crate::error::{Result, SceneError};

/// Upper bound on the bounce depth any renderer supports.
pub const MAX_BOUNCES: u32 = 16;

/// Default number of samples averaged per pixel.
pub const DEFAULT_SAMPLES_PER_PIXEL: u32 = 32;

/// Default bounce depth.
pub const DEFAULT_MAX_DEPTH: u32 = 4;

/// Pinhole camera looking down -Z with +Y up.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Camera {
    /// Eye position (`w = 1`).
    pub position: Vec4,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pad: [f32; 3],
}

impl Camera {
    /// Create a camera at `position` with a vertical field of view in degrees.
    pub fn new(position: Vec4, fov: f32) -> Self {
        Self {
            position: Vec4::point(position.x, position.y, position.z),
            fov,
            pad: [0.0; 3],
        }
    }

    /// `tan(fov / 2)`, the half-height of the image plane at distance 1.
    pub fn half_height(&self) -> f32 {
        (self.fov.to_radians() * 0.5).tan()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec4::point(0.0, 0.0, 0.0), 60.0)
    }
}

/// Everything a render pass needs besides the geometry.
///
/// Uploaded verbatim as a uniform on the accelerator.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderParams {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Estimates averaged per pixel.
    pub samples_per_pixel: u32,
    /// Bounces before a path is cut off as black.
    pub max_depth: u32,
    /// The camera.
    pub camera: Camera,
}

impl RenderParams {
    /// Parameters for a `width` x `height` image with default sampling.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            samples_per_pixel: DEFAULT_SAMPLES_PER_PIXEL,
            max_depth: DEFAULT_MAX_DEPTH,
            camera: Camera::default(),
        }
    }

    /// Set samples per pixel.
    pub fn with_samples(mut self, samples_per_pixel: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    /// Set the bounce depth.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the camera.
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Number of pixels in the image.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Validate parameters.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::InvalidParams(format!(
                "image dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.samples_per_pixel == 0 {
            return Err(SceneError::InvalidParams(
                "samples_per_pixel must be at least 1".into(),
            ));
        }
        if self.max_depth > MAX_BOUNCES {
            return Err(SceneError::InvalidParams(format!(
                "max_depth must be at most {MAX_BOUNCES}, got {}",
                self.max_depth
            )));
        }
        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            return Err(SceneError::InvalidParams(format!(
                "fov must be between 0 and 180 degrees, got {}",
                self.camera.fov
            )));
        }
        Ok(())
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self::new(640, 480)
    }
}
