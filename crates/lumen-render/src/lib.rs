#![warn(missing_docs)]

//! Stochastic path tracing for lumen.
//!
//! For every pixel, `samples_per_pixel` jittered camera rays are traced
//! through the scene, bouncing diffusely or specularly until they escape
//! to the sky or reach the depth limit, and the estimates are averaged.
//!
//! # Architecture
//!
//! - [`integrator`] - camera rays, the bounded bounce loop, per-pixel estimate
//! - [`WorkGrid`] - the image split into 16x16 worker groups
//! - [`ComputeBackend`] - where workers run: [`CpuBackend`] on rayon, or
//!   (with the `gpu` feature) `GpuBackend` on a wgpu compute shader
//! - [`Renderer`] - uploads the scene once, then dispatch / synchronize /
//!   read back per call
//! - [`Image`] and [`pam`] - the host-side result and its file format
//!
//! # Example
//!
//! ```
//! use lumen_render::{Image, Renderer};
//! use lumen_scene::RenderParams;
//!
//! let params = RenderParams::new(32, 24).with_samples(2);
//! let mut renderer = Renderer::cpu(params, &[], &[])?;
//! let mut image = Image::new(32, 24)?;
//! let report = renderer.render(&mut image)?;
//! assert!(report.diagnostic.is_none());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backend;
pub mod cpu;
pub mod dispatch;
pub mod error;
pub mod image;
pub mod integrator;
pub mod pam;
pub mod renderer;
pub mod rng;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use backend::{ComputeBackend, DeviceScene};
pub use cpu::CpuBackend;
pub use dispatch::{WorkGrid, GROUP_SIZE};
pub use error::{ImageError, RenderError, Result};
pub use image::Image;
pub use integrator::{estimate_pixel, generate_camera_ray, ray_trace, sky_color};
pub use renderer::{RenderReport, RenderState, Renderer};
pub use rng::{pixel_rng, PixelRng};

#[cfg(feature = "gpu")]
pub use gpu::GpuBackend;
