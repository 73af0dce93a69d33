//! Accelerator (WebGPU) device context for lumen.
//!
//! Holds the single process-wide wgpu device and queue that the
//! accelerator memory backend and the GPU compute backend share.

#![warn(missing_docs)]

mod context;

pub use context::{GpuContext, GpuError};
