//! Host compute backend on the rayon thread pool.

use std::panic::{self, AssertUnwindSafe};

use lumen_math::Rgba8;
use lumen_memory::{Array, Host};
use lumen_scene::{Plane, RenderParams, Sphere};
use rayon::prelude::*;
use tracing::debug;

use crate::backend::{ComputeBackend, DeviceScene};
use crate::dispatch::WorkGrid;
use crate::error::{RenderError, Result};
use crate::integrator::estimate_pixel;
use crate::rng::pixel_rng;

/// Runs worker groups on CPU threads.
///
/// Each task shades one band of `group_size` image rows, walking the
/// groups in that band left to right. The pass completes inside
/// [`ComputeBackend::dispatch`]; a worker panic is caught there and
/// reported by the following [`ComputeBackend::synchronize`].
#[derive(Default)]
pub struct CpuBackend {
    pool: Option<rayon::ThreadPool>,
    fault: Option<String>,
}

impl CpuBackend {
    /// Use rayon's global pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lumen-worker-{i}"))
            .build()?;
        Ok(Self {
            pool: Some(pool),
            fault: None,
        })
    }

    /// Number of threads a dispatch runs on.
    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, |p| p.current_num_threads())
    }
}

impl std::fmt::Debug for CpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuBackend")
            .field("threads", &self.threads())
            .finish()
    }
}

/// Shade the worker groups of band `gy`. `rows` starts at image row `gy * group_size`.
fn shade_band(
    grid: WorkGrid,
    gy: u32,
    rows: &mut [Rgba8],
    params: &RenderParams,
    spheres: &[Sphere],
    planes: &[Plane],
) {
    let gs = grid.group_size;
    for gx in 0..grid.groups_x {
        for ly in 0..gs {
            for lx in 0..gs {
                let (x, y) = (gx * gs + lx, gy * gs + ly);
                if !grid.contains(x, y) {
                    continue;
                }
                let mut rng = pixel_rng(x, y);
                rows[grid.index(x, ly)] = estimate_pixel(x, y, params, spheres, planes, &mut rng);
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl ComputeBackend for CpuBackend {
    type Memory = Host;

    fn name(&self) -> &'static str {
        "cpu"
    }

    fn prepare(&mut self, scene: &DeviceScene<Host>, frame: &Array<Rgba8, Host>) -> Result<()> {
        debug!(
            threads = self.threads(),
            spheres = scene.spheres.len(),
            planes = scene.planes.len(),
            pixels = frame.len(),
            "cpu backend prepared"
        );
        Ok(())
    }

    fn dispatch(
        &mut self,
        grid: WorkGrid,
        scene: &DeviceScene<Host>,
        frame: &mut Array<Rgba8, Host>,
    ) -> Result<()> {
        let params: &RenderParams = &scene.params;
        let spheres: &[Sphere] = &scene.spheres;
        let planes: &[Plane] = &scene.planes;
        let pixels: &mut [Rgba8] = frame;
        if pixels.len() != grid.width as usize * grid.height as usize {
            return Err(RenderError::Backend(format!(
                "frame holds {} pixels, grid covers {}x{}",
                pixels.len(),
                grid.width,
                grid.height
            )));
        }
        if pixels.is_empty() {
            return Ok(());
        }

        let band = grid.width as usize * grid.group_size as usize;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let shade = |(gy, rows): (usize, &mut [Rgba8])| {
                shade_band(grid, gy as u32, rows, params, spheres, planes)
            };
            match &self.pool {
                Some(pool) => {
                    pool.install(|| pixels.par_chunks_mut(band).enumerate().for_each(shade))
                }
                None => pixels.par_chunks_mut(band).enumerate().for_each(shade),
            }
        }));
        if let Err(payload) = outcome {
            self.fault = Some(format!("worker panicked: {}", panic_message(payload.as_ref())));
        }
        Ok(())
    }

    fn synchronize(&mut self) -> Option<String> {
        self.fault.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::{Color, Vec4};
    use lumen_scene::Material;

    fn render(backend: &mut CpuBackend, params: RenderParams, spheres: &[Sphere]) -> Vec<Rgba8> {
        let scene = DeviceScene::<Host>::upload(&params, spheres, &[]).unwrap();
        let mut frame = Array::<Rgba8, Host>::zeroed(params.pixel_count()).unwrap();
        backend.prepare(&scene, &frame).unwrap();
        backend
            .dispatch(WorkGrid::for_params(&params), &scene, &mut frame)
            .unwrap();
        assert!(backend.synchronize().is_none());
        frame.to_vec().unwrap()
    }

    #[test]
    fn test_every_pixel_written_on_ragged_grid() {
        let params = RenderParams::new(19, 23).with_samples(1);
        let pixels = render(&mut CpuBackend::new(), params, &[]);
        assert_eq!(pixels.len(), 19 * 23);
        assert!(pixels.iter().all(|p| p.a == 255));
    }

    #[test]
    fn test_matches_serial_estimate() {
        let params = RenderParams::new(20, 18).with_samples(2).with_max_depth(3);
        let spheres = [Sphere::new(
            Vec4::point(0.0, 0.0, -3.0),
            1.0,
            Material::diffuse(Color::rgb(0.6, 0.3, 0.2)),
        )];
        let pixels = render(&mut CpuBackend::with_threads(3).unwrap(), params, &spheres);
        for (x, y) in [(0, 0), (19, 0), (10, 9), (17, 17), (3, 16)] {
            let mut rng = pixel_rng(x, y);
            let expected = estimate_pixel(x, y, &params, &spheres, &[], &mut rng);
            assert_eq!(pixels[(y * 20 + x) as usize], expected);
        }
    }

    #[test]
    fn test_frame_size_checked() {
        let params = RenderParams::new(4, 4);
        let scene = DeviceScene::<Host>::upload(&params, &[], &[]).unwrap();
        let mut frame = Array::<Rgba8, Host>::zeroed(15).unwrap();
        let mut backend = CpuBackend::new();
        let err = backend
            .dispatch(WorkGrid::for_params(&params), &scene, &mut frame)
            .unwrap_err();
        assert!(matches!(err, RenderError::Backend(_)));
    }

    #[test]
    fn test_thread_count() {
        assert_eq!(CpuBackend::with_threads(2).unwrap().threads(), 2);
    }
}
