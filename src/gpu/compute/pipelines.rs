//! Compute pipeline creation for the Julia kernel.

use wgpu::{BindGroupLayout, ComputePipeline, Device, ShaderModule};

use crate::gpu::kernel::{KERNEL_ENTRY_POINT, WORKGROUP_SIDE_CONSTANT};
use crate::gpu::layouts::create_julia_layout;

/// Pipeline and layout for the Julia kernel.
pub struct JuliaPipeline {
    pub pipeline: ComputePipeline,
    pub layout: BindGroupLayout,
}

impl JuliaPipeline {
    /// Build the pipeline with `workgroup_side` substituted into the kernel's
    /// overridable tile size.
    pub fn new(device: &Device, shader: &ShaderModule, workgroup_side: u32) -> Self {
        let layout = create_julia_layout(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("julia_pipeline_layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

        let constants = [(WORKGROUP_SIDE_CONSTANT, workgroup_side as f64)];
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("julia_pipeline"),
            layout: Some(&pipeline_layout),
            module: shader,
            entry_point: Some(KERNEL_ENTRY_POINT),
            compilation_options: wgpu::PipelineCompilationOptions {
                constants: &constants,
                ..Default::default()
            },
            cache: None,
        });

        Self { pipeline, layout }
    }
}
