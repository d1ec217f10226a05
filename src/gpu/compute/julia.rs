//! Single-dispatch Julia renderer.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use wgpu::{BindGroup, Device, Queue, ShaderModule};

use super::buffers::JuliaBuffers;
use super::params::JuliaUniforms;
use super::pipelines::JuliaPipeline;
use crate::fractal::{FractalParams, Palette, PixelBuffer};
use crate::gpu::context::{DeviceScope, GpuContext, GpuError};

/// Shape of the 2-D dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchGeometry {
    /// Tile size in invocations.
    pub local: [u32; 2],
    /// Image size padded up to whole tiles.
    pub global: [u32; 2],
    /// Number of tiles on each axis.
    pub workgroups: [u32; 2],
}

impl DispatchGeometry {
    pub fn new(width: u32, height: u32, side: u32) -> Self {
        let side = side.max(1);
        let workgroups = [width.div_ceil(side), height.div_ceil(side)];
        Self {
            local: [side, side],
            global: [workgroups[0] * side, workgroups[1] * side],
            workgroups,
        }
    }

    /// Invocations that fall outside the image and exit early.
    pub fn idle_invocations(&self, width: u32, height: u32) -> u64 {
        let total = self.global[0] as u64 * self.global[1] as u64;
        total - width as u64 * height as u64
    }
}

/// GPU render session for one parameter set.
///
/// Owns every device resource used by the dispatch. Fields drop in
/// declaration order, so the bind group and pipeline go first and the device
/// handles last.
pub struct JuliaKernel {
    bind_group: BindGroup,
    pipeline: JuliaPipeline,
    buffers: JuliaBuffers,
    params: FractalParams,
    geometry: DispatchGeometry,
    device: Arc<Device>,
    queue: Arc<Queue>,
}

impl JuliaKernel {
    /// Allocate buffers and build the pipeline for `shader`.
    ///
    /// Device-side rejections, including out-of-memory, come back as
    /// [`GpuError::Device`].
    pub async fn new(
        ctx: &GpuContext,
        shader: &ShaderModule,
        params: FractalParams,
    ) -> Result<Self, GpuError> {
        let limits = ctx.device.limits();
        let geometry = DispatchGeometry::new(params.width(), params.height(), ctx.workgroup_side());

        let requested = params.buffer_len() as u64;
        let limit = (limits.max_storage_buffer_binding_size as u64).min(limits.max_buffer_size);
        if requested > limit {
            return Err(GpuError::OutputTooLarge { requested, limit });
        }
        let axis_limit = limits.max_compute_workgroups_per_dimension;
        if let Some(&requested) = geometry.workgroups.iter().find(|&&n| n > axis_limit) {
            return Err(GpuError::TooManyWorkgroups {
                requested,
                limit: axis_limit,
            });
        }

        let uniforms = JuliaUniforms::new(&params);
        let palette = Palette::new(params.max_iterations());
        let scope = DeviceScope::open(&ctx.device);
        let buffers = JuliaBuffers::new(&ctx.device, &uniforms, &palette, params.pixel_count());
        let pipeline = JuliaPipeline::new(&ctx.device, shader, geometry.local[0]);

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("julia_bind_group"),
            layout: &pipeline.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.palette.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffers.output.as_entire_binding(),
                },
            ],
        });
        scope.finish("resource allocation").await?;

        log::debug!(
            "Allocated {} byte output region, palette of {} entries, {} idle invocations",
            buffers.output_size(),
            palette.len(),
            geometry.idle_invocations(params.width(), params.height())
        );

        Ok(Self {
            bind_group,
            pipeline,
            buffers,
            params,
            geometry,
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
        })
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    pub fn geometry(&self) -> DispatchGeometry {
        self.geometry
    }

    /// Run the kernel over the whole image and read the frame back.
    ///
    /// Blocks until the device has finished.
    pub async fn dispatch(&self) -> Result<PixelBuffer, GpuError> {
        let started = Instant::now();
        let scope = DeviceScope::open(&self.device);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("julia_encoder"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("julia_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.dispatch_workgroups(self.geometry.workgroups[0], self.geometry.workgroups[1], 1);
        }

        encoder.copy_buffer_to_buffer(
            &self.buffers.output,
            0,
            &self.buffers.staging,
            0,
            self.buffers.output_size(),
        );
        self.queue.submit(Some(encoder.finish()));
        scope.finish("dispatch submission").await?;

        let data = self.read_staging()?;
        log::info!(
            "Dispatched {}x{} workgroups of {}x{} in {:.2?}",
            self.geometry.workgroups[0],
            self.geometry.workgroups[1],
            self.geometry.local[0],
            self.geometry.local[1],
            started.elapsed()
        );

        Ok(PixelBuffer::from_raw(
            self.params.width(),
            self.params.height(),
            data,
        )?)
    }

    fn read_staging(&self) -> Result<Vec<u8>, GpuError> {
        let slice = self.buffers.staging.slice(..);

        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| GpuError::Poll(e.to_string()))?;

        rx.recv()
            .map_err(|e| GpuError::BufferMapFailed(e.to_string()))?
            .map_err(|e| GpuError::BufferMapFailed(format!("{:?}", e)))?;

        let data = slice.get_mapped_range().to_vec();
        self.buffers.staging.unmap();

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_exact_fit() {
        let geometry = DispatchGeometry::new(1280, 720, 16);
        assert_eq!(geometry.local, [16, 16]);
        assert_eq!(geometry.workgroups, [80, 45]);
        assert_eq!(geometry.global, [1280, 720]);
        assert_eq!(geometry.idle_invocations(1280, 720), 0);
    }

    #[test]
    fn test_geometry_pads_to_tiles() {
        let geometry = DispatchGeometry::new(100, 50, 16);
        assert_eq!(geometry.workgroups, [7, 4]);
        assert_eq!(geometry.global, [112, 64]);
        assert_eq!(geometry.idle_invocations(100, 50), 112 * 64 - 100 * 50);
    }

    #[test]
    fn test_geometry_zero_side_is_one() {
        let geometry = DispatchGeometry::new(3, 2, 0);
        assert_eq!(geometry.local, [1, 1]);
        assert_eq!(geometry.workgroups, [3, 2]);
    }

    #[tokio::test]
    async fn test_kernel_dispatch_small_frame() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return, // Skip if no GPU
        };
        let shader = crate::gpu::KernelSource::load(crate::gpu::DEFAULT_KERNEL_PATH)
            .unwrap()
            .compile(&ctx.device)
            .await
            .unwrap();
        let params = FractalParams::default().with_size(4, 2).unwrap();
        let kernel = JuliaKernel::new(&ctx, &shader, params).await.unwrap();

        let frame = kernel.dispatch().await.unwrap();
        assert_eq!(frame.len(), 8);
        assert!(frame.samples().all(|s| s.a == 255));
    }

    #[tokio::test]
    async fn test_layout_mismatch_is_device_error() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return, // Skip if no GPU
        };
        // Binding 0 is a uniform in the pipeline layout, not a storage array.
        let text = r#"
override WORKGROUP_SIDE: u32 = 1u;
@group(0) @binding(0) var<storage, read_write> cells: array<u32>;

@compute @workgroup_size(WORKGROUP_SIDE, WORKGROUP_SIDE)
fn julia(@builtin(global_invocation_id) id: vec3<u32>) {
    cells[id.x] = 0u;
}
"#;
        let shader = crate::gpu::KernelSource::from_text("mismatched", text)
            .compile(&ctx.device)
            .await
            .unwrap();
        let params = FractalParams::default().with_size(4, 2).unwrap();

        match JuliaKernel::new(&ctx, &shader, params).await {
            Err(GpuError::Device { stage, .. }) => assert_eq!(stage, "resource allocation"),
            Err(other) => panic!("expected device error, got {}", other),
            Ok(_) => panic!("mismatched kernel was accepted"),
        }
    }
}
