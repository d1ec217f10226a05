//! GPU context initialization and management.

use std::sync::Arc;
use wgpu::{Adapter, Device, ErrorFilter, ErrorScopeGuard, Instance, Queue};

/// Errors that can occur during GPU operations.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("GPU adapter {0} does not support compute shaders")]
    ComputeUnsupported(String),
    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("Output buffer of {requested} bytes exceeds device limit of {limit} bytes")]
    OutputTooLarge { requested: u64, limit: u64 },
    #[error("Dispatch needs {requested} workgroups on one axis, device allows {limit}")]
    TooManyWorkgroups { requested: u32, limit: u32 },
    #[error("Device rejected {stage}: {source}")]
    Device {
        stage: &'static str,
        #[source]
        source: wgpu::Error,
    },
    #[error("Waiting for the device failed: {0}")]
    Poll(String),
    #[error("GPU buffer mapping failed: {0}")]
    BufferMapFailed(String),
    #[error("Read back an invalid frame: {0}")]
    Readback(#[from] crate::fractal::FrameError),
}

/// GPU context holding device and queue for compute work.
pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Arc<Adapter>,
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
}

impl GpuContext {
    /// Create a new GPU context for headless compute.
    ///
    /// Picks the high-performance adapter across Metal, Vulkan, DX12 and GL,
    /// and rejects adapters that cannot run compute shaders.
    pub async fn new() -> Result<Self, GpuError> {
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::METAL
                | wgpu::Backends::VULKAN
                | wgpu::Backends::DX12
                | wgpu::Backends::GL,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .map_err(|_| GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!(
            "Selected GPU adapter: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        if !adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            return Err(GpuError::ComputeUnsupported(info.name));
        }

        let limits = adapter.limits();
        log::debug!(
            "Adapter allows {} invocations per workgroup, {} byte storage bindings",
            limits.max_compute_invocations_per_workgroup,
            limits.max_storage_buffer_binding_size
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("julia-render"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Ok(Self {
            instance,
            adapter: Arc::new(adapter),
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Get info about the GPU adapter.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Square tile side that fits the device's workgroup limits.
    pub fn workgroup_side(&self) -> u32 {
        workgroup_side(&self.device.limits())
    }
}

/// Captures out-of-memory and validation errors raised by device calls made
/// while it is open, instead of handing them to the uncaptured-error handler.
///
/// Scopes are per thread, so open and close it without awaiting in between.
pub(crate) struct DeviceScope {
    out_of_memory: ErrorScopeGuard,
    validation: ErrorScopeGuard,
}

impl DeviceScope {
    pub(crate) fn open(device: &Device) -> Self {
        let out_of_memory = device.push_error_scope(ErrorFilter::OutOfMemory);
        let validation = device.push_error_scope(ErrorFilter::Validation);
        Self {
            out_of_memory,
            validation,
        }
    }

    /// Pop both scopes, innermost first. Out-of-memory wins if both fired.
    pub(crate) async fn close(self) -> Option<wgpu::Error> {
        let Self {
            out_of_memory,
            validation,
        } = self;
        let validation = validation.pop().await;
        let out_of_memory = out_of_memory.pop().await;
        out_of_memory.or(validation)
    }

    /// Close the scope and turn a captured error into a [`GpuError`].
    pub(crate) async fn finish(self, stage: &'static str) -> Result<(), GpuError> {
        match self.close().await {
            Some(source) => Err(GpuError::Device { stage, source }),
            None => Ok(()),
        }
    }
}

/// Largest square tile whose area fits `max_compute_invocations_per_workgroup`
/// and whose sides fit the per-axis limits.
pub fn workgroup_side(limits: &wgpu::Limits) -> u32 {
    let area = limits.max_compute_invocations_per_workgroup;
    let mut side = (area as f64).sqrt() as u32;
    while side * side > area {
        side -= 1;
    }
    side.min(limits.max_compute_workgroup_size_x)
        .min(limits.max_compute_workgroup_size_y)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gpu_context_creation() {
        let ctx = GpuContext::new().await;
        // May fail on CI without GPU, so just check it doesn't panic
        if let Ok(ctx) = ctx {
            let info = ctx.adapter_info();
            assert!(!info.name.is_empty());
            assert!(ctx.workgroup_side() >= 1);
        }
    }

    #[tokio::test]
    async fn test_device_carries_adapter_limits() {
        let Ok(ctx) = GpuContext::new().await else {
            return; // Skip if no GPU
        };
        let adapter_limits = ctx.adapter.limits();
        let device_limits = ctx.device.limits();
        assert_eq!(
            device_limits.max_compute_invocations_per_workgroup,
            adapter_limits.max_compute_invocations_per_workgroup
        );
        assert_eq!(
            device_limits.max_storage_buffer_binding_size,
            adapter_limits.max_storage_buffer_binding_size
        );
        assert_eq!(ctx.workgroup_side(), workgroup_side(&adapter_limits));
    }

    #[tokio::test]
    async fn test_device_scope_captures_validation_error() {
        let Ok(ctx) = GpuContext::new().await else {
            return; // Skip if no GPU
        };
        let scope = DeviceScope::open(&ctx.device);
        // MAP_READ may only be combined with COPY_DST.
        let _buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("invalid_usage"),
            size: 16,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });
        let err = scope.finish("buffer allocation").await.unwrap_err();
        assert!(matches!(
            err,
            GpuError::Device {
                stage: "buffer allocation",
                source: wgpu::Error::Validation { .. }
            }
        ));

        let clean = DeviceScope::open(&ctx.device);
        let _buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("valid_usage"),
            size: 16,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        assert!(clean.finish("buffer allocation").await.is_ok());
    }

    #[test]
    fn test_workgroup_side_default_limits() {
        assert_eq!(workgroup_side(&wgpu::Limits::default()), 16);
    }

    #[test]
    fn test_workgroup_side_downlevel() {
        let limits = wgpu::Limits {
            max_compute_invocations_per_workgroup: 128,
            ..wgpu::Limits::default()
        };
        assert_eq!(workgroup_side(&limits), 11);

        let narrow = wgpu::Limits {
            max_compute_workgroup_size_y: 8,
            ..wgpu::Limits::default()
        };
        assert_eq!(workgroup_side(&narrow), 8);

        let degenerate = wgpu::Limits {
            max_compute_invocations_per_workgroup: 0,
            ..wgpu::Limits::default()
        };
        assert_eq!(workgroup_side(&degenerate), 1);
    }
}
