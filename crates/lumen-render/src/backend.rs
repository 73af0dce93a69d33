//! The seam between the renderer and the hardware that runs the workers.

use lumen_math::Rgba8;
use lumen_memory::{Array, MemoryError, Place, Residency, UniquePtr};
use lumen_scene::{Plane, RenderParams, Sphere};

use crate::dispatch::WorkGrid;
use crate::error::Result;

/// Scene data resident where a backend's workers can read it.
pub struct DeviceScene<R: Residency + Place<RenderParams>> {
    /// Render parameters.
    pub params: UniquePtr<RenderParams, R>,
    /// Sphere records.
    pub spheres: Array<Sphere, R>,
    /// Plane records.
    pub planes: Array<Plane, R>,
}

impl<R: Residency + Place<RenderParams>> DeviceScene<R> {
    /// Copy host-side scene data onto residency `R`.
    pub fn upload(
        params: &RenderParams,
        spheres: &[Sphere],
        planes: &[Plane],
    ) -> std::result::Result<Self, MemoryError> {
        Ok(Self {
            params: UniquePtr::new(*params)?,
            spheres: Array::from_host(spheres)?,
            planes: Array::from_host(planes)?,
        })
    }
}

/// A target that can execute one render pass over a [`WorkGrid`].
///
/// Workers are independent: each one reads the shared scene and writes
/// only its own pixel of the frame.
pub trait ComputeBackend {
    /// Residency the scene and frame must live on.
    type Memory: Residency + Place<RenderParams>;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Bind the uploaded scene and frame. Called once, before any dispatch.
    fn prepare(
        &mut self,
        scene: &DeviceScene<Self::Memory>,
        frame: &Array<Rgba8, Self::Memory>,
    ) -> Result<()>;

    /// Launch one pass. May return before the workers finish.
    fn dispatch(
        &mut self,
        grid: WorkGrid,
        scene: &DeviceScene<Self::Memory>,
        frame: &mut Array<Rgba8, Self::Memory>,
    ) -> Result<()>;

    /// Block until the last dispatch has completed.
    ///
    /// Returns a human-readable description of any fault the workers hit.
    fn synchronize(&mut self) -> Option<String>;
}
