//! Bind group layout builders for compute pipelines.

use wgpu::{BindGroupLayout, BindGroupLayoutEntry, Device, ShaderStages};

/// Builder for creating bind group layouts with common patterns.
pub struct BindGroupLayoutBuilder {
    label: Option<&'static str>,
    entries: Vec<BindGroupLayoutEntry>,
}

impl BindGroupLayoutBuilder {
    pub fn new(label: &'static str) -> Self {
        Self {
            label: Some(label),
            entries: Vec::new(),
        }
    }

    /// Add a uniform buffer entry.
    pub fn uniform(mut self, binding: u32, visibility: ShaderStages) -> Self {
        self.entries.push(BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
        self
    }

    /// Add a storage buffer entry.
    pub fn storage(mut self, binding: u32, visibility: ShaderStages, read_only: bool) -> Self {
        self.entries.push(BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
        self
    }

    pub fn build(self, device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: self.label,
            entries: &self.entries,
        })
    }
}

/// Julia kernel layout: uniform params, read-only palette, output pixels.
pub fn create_julia_layout(device: &Device) -> BindGroupLayout {
    BindGroupLayoutBuilder::new("julia_bind_group_layout")
        .uniform(0, ShaderStages::COMPUTE)
        .storage(1, ShaderStages::COMPUTE, true)
        .storage(2, ShaderStages::COMPUTE, false)
        .build(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::GpuContext;

    #[tokio::test]
    async fn test_bind_group_layout_builder() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return, // Skip if no GPU
        };

        let layout = BindGroupLayoutBuilder::new("test_layout")
            .uniform(0, ShaderStages::COMPUTE)
            .storage(1, ShaderStages::COMPUTE, false)
            .build(&ctx.device);

        drop(layout);
    }

    #[tokio::test]
    async fn test_julia_layout_creation() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let _layout = create_julia_layout(&ctx.device);
    }
}
