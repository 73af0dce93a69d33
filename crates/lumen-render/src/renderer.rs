//! The render driver: upload once, then dispatch, synchronize and read back.

use std::time::{Duration, Instant};

use lumen_math::Rgba8;
use lumen_memory::Array;
use lumen_scene::{Plane, RenderParams, Sphere};
use tracing::{debug, error, info};

use crate::backend::{ComputeBackend, DeviceScene};
use crate::cpu::CpuBackend;
use crate::dispatch::WorkGrid;
use crate::error::{RenderError, Result};
use crate::Image;

/// Where a [`Renderer`] is in its render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Scene uploaded and frame allocated; ready to render.
    Constructed,
    /// A pass has been dispatched.
    Rendering,
    /// Every worker of the pass has finished.
    Synchronized,
    /// The frame is being copied to the caller's image.
    ReadBack,
}

/// Outcome of one successful [`Renderer::render`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    /// Wall-clock time from dispatch to the end of read-back.
    pub elapsed: Duration,
    /// Fault reported by the backend's synchronization, if any.
    ///
    /// A faulted pass is still read back; the image contents are then
    /// unspecified.
    pub diagnostic: Option<String>,
}

/// Renders a fixed scene any number of times on a [`ComputeBackend`].
pub struct Renderer<B: ComputeBackend> {
    backend: B,
    params: RenderParams,
    grid: WorkGrid,
    scene: DeviceScene<B::Memory>,
    frame: Array<Rgba8, B::Memory>,
    state: RenderState,
}

impl<B: ComputeBackend> Renderer<B> {
    /// Validate `params`, upload the scene to the backend's memory and
    /// allocate the frame buffer.
    pub fn new(
        mut backend: B,
        params: RenderParams,
        spheres: &[Sphere],
        planes: &[Plane],
    ) -> Result<Self> {
        params.validate()?;
        let scene = DeviceScene::upload(&params, spheres, planes)?;
        let frame = Array::zeroed(params.pixel_count())?;
        backend.prepare(&scene, &frame)?;

        let grid = WorkGrid::for_params(&params);
        debug!(
            backend = backend.name(),
            width = params.width,
            height = params.height,
            spheres = spheres.len(),
            planes = planes.len(),
            groups = grid.group_count(),
            "renderer constructed"
        );

        Ok(Self {
            backend,
            params,
            grid,
            scene,
            frame,
            state: RenderState::Constructed,
        })
    }

    /// Current state.
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Parameters the scene was uploaded with.
    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    /// The worker grid each pass launches.
    pub fn grid(&self) -> WorkGrid {
        self.grid
    }

    /// The compute backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn enter(&mut self, state: RenderState) {
        debug!(from = ?self.state, to = ?state, "render state");
        self.state = state;
    }

    /// Render one full pass into `image`, overwriting its contents.
    ///
    /// `image` must have the renderer's dimensions. A fault reported by the
    /// backend is logged and returned in the report; the frame is read back
    /// regardless.
    pub fn render(&mut self, image: &mut Image) -> Result<RenderReport> {
        if image.width() != self.params.width || image.height() != self.params.height {
            return Err(RenderError::DimensionMismatch {
                width: self.params.width,
                height: self.params.height,
                actual_width: image.width(),
                actual_height: image.height(),
            });
        }

        let start = Instant::now();
        self.enter(RenderState::Rendering);
        if let Err(err) = self.backend.dispatch(self.grid, &self.scene, &mut self.frame) {
            self.enter(RenderState::Constructed);
            return Err(err);
        }

        let diagnostic = self.backend.synchronize();
        self.enter(RenderState::Synchronized);
        if let Some(msg) = &diagnostic {
            error!(backend = self.backend.name(), diagnostic = %msg, "render pass faulted");
        }

        self.enter(RenderState::ReadBack);
        let copied = self.frame.download_into(image.pixels_mut());
        self.enter(RenderState::Constructed);
        copied?;

        let elapsed = start.elapsed();
        info!(
            backend = self.backend.name(),
            width = self.params.width,
            height = self.params.height,
            samples = self.params.samples_per_pixel,
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            "render complete"
        );
        Ok(RenderReport {
            elapsed,
            diagnostic,
        })
    }
}

impl Renderer<CpuBackend> {
    /// A renderer on the global rayon pool.
    pub fn cpu(params: RenderParams, spheres: &[Sphere], planes: &[Plane]) -> Result<Self> {
        Self::new(CpuBackend::new(), params, spheres, planes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::sky_color;
    use lumen_math::{Color, Vec4};
    use lumen_memory::Host;
    use lumen_scene::{Material, SceneDescription};

    #[test]
    fn test_render_cycle_returns_to_constructed() {
        let params = RenderParams::new(8, 6).with_samples(1);
        let mut renderer = Renderer::cpu(params, &[], &[]).unwrap();
        assert_eq!(renderer.state(), RenderState::Constructed);

        let mut image = Image::new(8, 6).unwrap();
        let report = renderer.render(&mut image).unwrap();
        assert!(report.diagnostic.is_none());
        assert_eq!(renderer.state(), RenderState::Constructed);
        for y in 0..6 {
            assert_eq!(image.get(3, y), Some(sky_color(y, 6).to_rgba8()));
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let params = RenderParams::new(8, 6).with_samples(1);
        let mut renderer = Renderer::cpu(params, &[], &[]).unwrap();
        let mut image = Image::new(6, 8).unwrap();
        let err = renderer.render(&mut image).unwrap_err();
        assert!(matches!(
            err,
            RenderError::DimensionMismatch {
                width: 8,
                height: 6,
                actual_width: 6,
                actual_height: 8
            }
        ));
        assert_eq!(renderer.state(), RenderState::Constructed);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = RenderParams::new(0, 6);
        assert!(matches!(
            Renderer::cpu(params, &[], &[]),
            Err(RenderError::Scene(_))
        ));
    }

    #[test]
    fn test_repeat_renders_identical() {
        let mut scene = SceneDescription::demo();
        scene.render.width = 24;
        scene.render.height = 18;
        scene.render.samples_per_pixel = 3;
        let scene = scene.build().unwrap();

        let mut renderer = Renderer::cpu(scene.params, &scene.spheres, &scene.planes).unwrap();
        let mut first = Image::new(24, 18).unwrap();
        let mut second = Image::new(24, 18).unwrap();
        second.set(0, 0, Rgba8::new(1, 2, 3, 4));
        renderer.render(&mut first).unwrap();
        renderer.render(&mut second).unwrap();
        assert_eq!(first.pixels(), second.pixels());

        let mut threaded = Renderer::new(
            CpuBackend::with_threads(2).unwrap(),
            scene.params,
            &scene.spheres,
            &scene.planes,
        )
        .unwrap();
        let mut third = Image::new(24, 18).unwrap();
        threaded.render(&mut third).unwrap();
        assert_eq!(first.pixels(), third.pixels());
    }

    #[test]
    fn test_emissive_wall_fills_frame() {
        let wall = Plane::new(
            Vec4::point(0.0, 0.0, -5.0),
            Vec4::direction(0.0, 0.0, 1.0),
            Material::emissive(Color::rgb(0.5, 0.5, 0.5), Color::WHITE),
        );
        let params = RenderParams::new(16, 12).with_samples(1).with_max_depth(1);
        let mut renderer = Renderer::cpu(params, &[], &[wall]).unwrap();
        let mut image = Image::new(16, 12).unwrap();
        renderer.render(&mut image).unwrap();
        assert!(image.pixels().iter().all(|&p| p == Rgba8::new(255, 255, 255, 255)));
    }

    struct Faulty;

    impl ComputeBackend for Faulty {
        type Memory = Host;

        fn name(&self) -> &'static str {
            "faulty"
        }

        fn prepare(&mut self, _: &DeviceScene<Host>, _: &Array<Rgba8, Host>) -> Result<()> {
            Ok(())
        }

        fn dispatch(
            &mut self,
            _: WorkGrid,
            _: &DeviceScene<Host>,
            frame: &mut Array<Rgba8, Host>,
        ) -> Result<()> {
            frame.fill(Rgba8::new(9, 9, 9, 9));
            Ok(())
        }

        fn synchronize(&mut self) -> Option<String> {
            Some("device lost".into())
        }
    }

    #[test]
    fn test_fault_is_reported_and_read_back_proceeds() {
        let params = RenderParams::new(2, 2);
        let mut renderer = Renderer::new(Faulty, params, &[], &[]).unwrap();
        let mut image = Image::new(2, 2).unwrap();
        let report = renderer.render(&mut image).unwrap();
        assert_eq!(report.diagnostic.as_deref(), Some("device lost"));
        assert!(image.pixels().iter().all(|&p| p == Rgba8::new(9, 9, 9, 9)));
        assert_eq!(renderer.state(), RenderState::Constructed);
    }
}
