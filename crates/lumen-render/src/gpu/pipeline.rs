//! wgpu compute pipeline for path tracing.

use lumen_gpu::GpuContext;

use crate::dispatch::WorkGrid;

/// Buffers bound to one pass, in binding order.
pub struct SceneBindings<'a> {
    /// Render parameters uniform.
    pub params: wgpu::BufferBinding<'a>,
    /// Primitive counts uniform.
    pub header: wgpu::BufferBinding<'a>,
    /// Sphere storage.
    pub spheres: wgpu::BufferBinding<'a>,
    /// Plane storage.
    pub planes: wgpu::BufferBinding<'a>,
    /// Packed RGBA8 output, one `u32` per pixel.
    pub frame: wgpu::BufferBinding<'a>,
}

/// Path-tracing compute pipeline.
pub struct PathTracePipeline {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

fn buffer_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl PathTracePipeline {
    /// Compile the shader and create the pipeline.
    pub fn new(ctx: &GpuContext) -> Self {
        let shader_module = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Path Trace Shader"),
            source: wgpu::ShaderSource::Wgsl(super::shaders::PATHTRACE_SHADER.into()),
        });

        let read_only = wgpu::BufferBindingType::Storage { read_only: true };
        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Path Trace Bind Group Layout"),
                entries: &[
                    buffer_entry(0, wgpu::BufferBindingType::Uniform),
                    buffer_entry(1, wgpu::BufferBindingType::Uniform),
                    buffer_entry(2, read_only),
                    buffer_entry(3, read_only),
                    buffer_entry(4, wgpu::BufferBindingType::Storage { read_only: false }),
                ],
            });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Path Trace Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = ctx.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Path Trace Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    /// Create the bind group for a scene and frame.
    pub fn bind(&self, ctx: &GpuContext, bindings: SceneBindings<'_>) -> wgpu::BindGroup {
        let SceneBindings {
            params,
            header,
            spheres,
            planes,
            frame,
        } = bindings;
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Path Trace Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(params),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(header),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Buffer(spheres),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Buffer(planes),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Buffer(frame),
                },
            ],
        })
    }

    /// Record one pass over `grid`.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        bind_group: &wgpu::BindGroup,
        grid: WorkGrid,
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Path Trace Pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(grid.groups_x, grid.groups_y, 1);
    }
}
