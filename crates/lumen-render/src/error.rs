//! Error types for rendering and image I/O.

use lumen_memory::MemoryError;
use lumen_scene::SceneError;
use thiserror::Error;

/// Errors that can occur while setting up or running a render.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Render parameters rejected.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Scene upload, frame allocation or read-back failed.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    /// Output image does not match the renderer's frame.
    #[error("output image is {actual_width}x{actual_height}, renderer produces {width}x{height}")]
    DimensionMismatch {
        /// Renderer width.
        width: u32,
        /// Renderer height.
        height: u32,
        /// Output image width.
        actual_width: u32,
        /// Output image height.
        actual_height: u32,
    },

    /// Worker thread pool could not be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The compute backend could not set up or launch a pass.
    #[error("backend error: {0}")]
    Backend(String),

    /// Accelerator context error.
    #[cfg(feature = "gpu")]
    #[error(transparent)]
    Gpu(#[from] lumen_gpu::GpuError),
}

/// Errors reading or writing image files.
#[derive(Error, Debug)]
pub enum ImageError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or unsupported PAM header.
    #[error("invalid PAM header: {0}")]
    InvalidHeader(String),

    /// Pixel data ended early.
    #[error("pixel data truncated: expected {expected} bytes")]
    Truncated {
        /// Bytes the header promised.
        expected: usize,
    },

    /// Pixel count does not match the dimensions.
    #[error("{len} pixels cannot form a {width}x{height} image")]
    SizeMismatch {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// Pixels supplied.
        len: usize,
    },

    /// Pixel storage could not be allocated.
    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
