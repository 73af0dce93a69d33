//! Accelerator context management for the wgpu device and queue.

use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info};
use wgpu::{Device, Instance, Queue};

static GPU_CONTEXT: OnceLock<GpuContext> = OnceLock::new();

/// Errors that can occur while talking to the accelerator.
#[derive(Debug, Error)]
pub enum GpuError {
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Failed to request GPU device.
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// Buffer mapping failed.
    #[error("buffer mapping failed: {0}")]
    BufferMapping(String),

    /// GPU context not initialized.
    #[error("GPU context not initialized - call GpuContext::init() first")]
    NotInitialized,
}

/// Process-wide accelerator context holding device and queue.
pub struct GpuContext {
    /// The wgpu device for creating resources and pipelines.
    pub device: Device,
    /// The command queue for submitting work.
    pub queue: Queue,
    /// Adapter name, for diagnostics.
    pub adapter_name: String,
}

impl GpuContext {
    /// Initialize the accelerator context asynchronously.
    ///
    /// Subsequent calls return the existing context.
    pub async fn init() -> Result<&'static Self, GpuError> {
        if let Some(ctx) = GPU_CONTEXT.get() {
            return Ok(ctx);
        }

        let instance = Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let adapter_name = adapter.get_info().name;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("lumen device"),
                    ..Default::default()
                },
                None,
            )
            .await?;

        info!(adapter = %adapter_name, "accelerator context initialized");

        // A concurrent initializer may have won the race; keep whichever landed first.
        if GPU_CONTEXT
            .set(GpuContext {
                device,
                queue,
                adapter_name,
            })
            .is_err()
        {
            debug!("accelerator context already set by another thread");
        }

        GPU_CONTEXT.get().ok_or(GpuError::NotInitialized)
    }

    /// Get the context if it has been initialized.
    pub fn get() -> Option<&'static Self> {
        GPU_CONTEXT.get()
    }

    /// Get the context, returning an error if not initialized.
    pub fn require() -> Result<&'static Self, GpuError> {
        GPU_CONTEXT.get().ok_or(GpuError::NotInitialized)
    }

    /// Initialize the context synchronously.
    pub fn init_blocking() -> Result<&'static Self, GpuError> {
        pollster::block_on(Self::init())
    }

    /// Run `f` inside a device error scope and return whatever error the
    /// scope captured alongside `f`'s result.
    ///
    /// Out-of-memory and validation failures in wgpu are not returned from
    /// the call that caused them; they are only observable through a scope.
    pub fn scoped<R>(
        &self,
        filter: wgpu::ErrorFilter,
        f: impl FnOnce(&Device, &Queue) -> R,
    ) -> (R, Option<wgpu::Error>) {
        self.device.push_error_scope(filter);
        let result = f(&self.device, &self.queue);
        let error = pollster::block_on(self.device.pop_error_scope());
        (result, error)
    }

    /// Block until every submitted command has completed.
    pub fn wait_idle(&self) {
        self.device.poll(wgpu::Maintain::Wait);
    }
}
