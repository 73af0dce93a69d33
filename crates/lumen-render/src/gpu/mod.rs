//! Accelerator compute backend using a wgpu compute shader.
//!
//! Scene records and the frame buffer live in accelerator memory
//! (`lumen_memory::Accelerator`); each invocation of the kernel shades one
//! pixel.

mod backend;
mod pipeline;
pub mod shaders;

pub use backend::GpuBackend;
pub use pipeline::{PathTracePipeline, SceneBindings};
