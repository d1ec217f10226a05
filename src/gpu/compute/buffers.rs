//! GPU buffer management for the Julia kernel.

use wgpu::util::DeviceExt;
use wgpu::{Buffer, BufferUsages, Device};

use super::params::JuliaUniforms;
use crate::fractal::Palette;

/// Collection of GPU buffers used by one dispatch.
pub struct JuliaBuffers {
    pub params: Buffer,
    pub palette: Buffer,
    /// Written only by the kernel, then copied out.
    pub output: Buffer,
    pub staging: Buffer,
    output_size: u64,
}

impl JuliaBuffers {
    /// Create and fill the buffers for a `pixel_count`-pixel frame.
    pub fn new(
        device: &Device,
        uniforms: &JuliaUniforms,
        palette: &Palette,
        pixel_count: usize,
    ) -> Self {
        let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("julia_params"),
            contents: bytemuck::bytes_of(uniforms),
            usage: BufferUsages::UNIFORM,
        });

        let palette = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("julia_palette"),
            contents: bytemuck::cast_slice(&palette.packed()),
            usage: BufferUsages::STORAGE,
        });

        let output_size = (pixel_count * std::mem::size_of::<u32>()) as u64;
        let output = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("julia_output"),
            size: output_size,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("julia_staging"),
            size: output_size,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            params,
            palette,
            output,
            staging,
            output_size,
        }
    }

    /// Size of the output region in bytes.
    pub fn output_size(&self) -> u64 {
        self.output_size
    }
}
