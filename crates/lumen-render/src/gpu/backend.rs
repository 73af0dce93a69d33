//! [`ComputeBackend`] implementation on the accelerator.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use lumen_gpu::GpuContext;
use lumen_math::Rgba8;
use lumen_memory::{Accelerator, Array, Ptr, UniquePtr};
use tracing::{debug, warn};

use super::pipeline::{PathTracePipeline, SceneBindings};
use crate::backend::{ComputeBackend, DeviceScene};
use crate::dispatch::WorkGrid;
use crate::error::{RenderError, Result};

/// Primitive counts; storage arrays may be padded past their contents.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SceneHeader {
    sphere_count: u32,
    plane_count: u32,
    pad: [u32; 2],
}

/// Runs the path-tracing kernel on the process-wide wgpu device.
///
/// Validation errors raised while submitting a pass are captured in a
/// device error scope and reported by the next
/// [`ComputeBackend::synchronize`].
pub struct GpuBackend {
    ctx: &'static GpuContext,
    pipeline: PathTracePipeline,
    header: Option<UniquePtr<SceneHeader, Accelerator>>,
    bind_group: Option<wgpu::BindGroup>,
    fault: Option<String>,
}

impl GpuBackend {
    /// Initialize the accelerator context if needed and build the pipeline.
    pub fn new() -> Result<Self> {
        let ctx = GpuContext::init_blocking()?;
        Ok(Self::with_context(ctx))
    }

    /// Build the pipeline on an existing context.
    pub fn with_context(ctx: &'static GpuContext) -> Self {
        Self {
            ctx,
            pipeline: PathTracePipeline::new(ctx),
            header: None,
            bind_group: None,
            fault: None,
        }
    }

    /// Name of the adapter the kernel runs on.
    pub fn adapter_name(&self) -> &str {
        &self.ctx.adapter_name
    }
}

fn buffer_of<T>(ptr: Ptr<T, Accelerator>, what: &str) -> Result<(Arc<wgpu::Buffer>, u64)> {
    let buffer = ptr
        .buffer()
        .ok_or_else(|| RenderError::Backend(format!("{what} buffer is not allocated")))?;
    Ok((buffer, ptr.byte_offset()))
}

fn whole((buffer, offset): &(Arc<wgpu::Buffer>, u64)) -> wgpu::BufferBinding<'_> {
    wgpu::BufferBinding {
        buffer,
        offset: *offset,
        size: None,
    }
}

impl ComputeBackend for GpuBackend {
    type Memory = Accelerator;

    fn name(&self) -> &'static str {
        "gpu"
    }

    fn prepare(
        &mut self,
        scene: &DeviceScene<Accelerator>,
        frame: &Array<Rgba8, Accelerator>,
    ) -> Result<()> {
        let header = UniquePtr::new(SceneHeader {
            sphere_count: scene.spheres.len() as u32,
            plane_count: scene.planes.len() as u32,
            pad: [0; 2],
        })?;

        let params = buffer_of(scene.params.as_ptr(), "params")?;
        let counts = buffer_of(header.as_ptr(), "header")?;
        let spheres = buffer_of(scene.spheres.as_ptr(), "sphere")?;
        let planes = buffer_of(scene.planes.as_ptr(), "plane")?;
        let pixels = buffer_of(frame.as_ptr(), "frame")?;

        let bind_group = self.pipeline.bind(
            self.ctx,
            SceneBindings {
                params: whole(&params),
                header: whole(&counts),
                spheres: whole(&spheres),
                planes: whole(&planes),
                frame: whole(&pixels),
            },
        );
        debug!(
            adapter = %self.ctx.adapter_name,
            spheres = scene.spheres.len(),
            planes = scene.planes.len(),
            pixels = frame.len(),
            "gpu backend prepared"
        );

        self.header = Some(header);
        self.bind_group = Some(bind_group);
        Ok(())
    }

    fn dispatch(
        &mut self,
        grid: WorkGrid,
        _scene: &DeviceScene<Accelerator>,
        _frame: &mut Array<Rgba8, Accelerator>,
    ) -> Result<()> {
        let bind_group = self
            .bind_group
            .as_ref()
            .ok_or_else(|| RenderError::Backend("dispatch before prepare".into()))?;

        let pipeline = &self.pipeline;
        let ((), error) = self.ctx.scoped(wgpu::ErrorFilter::Validation, |device, queue| {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Path Trace Encoder"),
            });
            pipeline.encode(&mut encoder, bind_group, grid);
            queue.submit(Some(encoder.finish()));
        });
        if let Some(error) = error {
            warn!(%error, "path trace submission rejected");
            self.fault = Some(error.to_string());
        }
        Ok(())
    }

    fn synchronize(&mut self) -> Option<String> {
        self.ctx.wait_idle();
        self.fault.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::sky_color;
    use crate::{Image, Renderer};
    use lumen_math::{Color, Vec4};
    use lumen_scene::{Material, Plane, RenderParams};

    #[test]
    fn test_header_layout() {
        assert_eq!(std::mem::size_of::<SceneHeader>(), 16);
    }

    #[test]
    #[ignore = "requires GPU"]
    fn test_empty_scene_renders_sky() {
        let params = RenderParams::new(37, 21).with_samples(2);
        let mut renderer = Renderer::new(GpuBackend::new().unwrap(), params, &[], &[]).unwrap();
        let mut image = Image::new(37, 21).unwrap();
        let report = renderer.render(&mut image).unwrap();
        assert!(report.diagnostic.is_none());
        for y in 0..21 {
            let sky = sky_color(y, 21).to_rgba8();
            for x in 0..37 {
                let px = image.get(x, y).unwrap();
                assert!(px.r.abs_diff(sky.r) <= 1 && px.g.abs_diff(sky.g) <= 1);
                assert!(px.b.abs_diff(sky.b) <= 1 && px.a == 255);
            }
        }
    }

    #[test]
    #[ignore = "requires GPU"]
    fn test_emissive_wall_and_determinism() {
        let wall = Plane::new(
            Vec4::point(0.0, 0.0, -5.0),
            Vec4::direction(0.0, 0.0, 1.0),
            Material::emissive(Color::rgb(0.4, 0.4, 0.4), Color::WHITE),
        );
        let params = RenderParams::new(40, 30).with_samples(1).with_max_depth(1);
        let mut renderer = Renderer::new(GpuBackend::new().unwrap(), params, &[], &[wall]).unwrap();
        let mut first = Image::new(40, 30).unwrap();
        let mut second = Image::new(40, 30).unwrap();
        renderer.render(&mut first).unwrap();
        renderer.render(&mut second).unwrap();
        assert!(first.pixels().iter().all(|&p| p == Rgba8::new(255, 255, 255, 255)));
        assert_eq!(first.pixels(), second.pixels());
    }
}
