//! Full render pipeline combining kernel build, GPU dispatch, and PNG output.

use crate::fractal::FractalParams;
use crate::gpu::{DispatchGeometry, GpuContext, GpuError, JuliaKernel, KernelError, KernelSource};
use crate::output::{write_png, EncodeError};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Pipeline configuration for one render.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub params: FractalParams,
    /// WGSL kernel read at run time.
    pub kernel_path: PathBuf,
    pub output_path: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            params: FractalParams::default(),
            kernel_path: PathBuf::from(crate::gpu::DEFAULT_KERNEL_PATH),
            output_path: PathBuf::from(crate::output::DEFAULT_OUTPUT_PATH),
        }
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("Output error: {0}")]
    Encode(#[from] EncodeError),
}

impl RenderError {
    /// Stage of the run that failed.
    pub fn category(&self) -> &'static str {
        match self {
            RenderError::Kernel(KernelError::Io { .. }) => "I/O",
            RenderError::Kernel(_) => "kernel compilation",
            RenderError::Gpu(
                GpuError::NoAdapter | GpuError::ComputeUnsupported(_) | GpuError::DeviceRequest(_),
            ) => "backend setup",
            RenderError::Gpu(_) => "dispatch",
            RenderError::Encode(_) => "I/O",
        }
    }
}

/// What a successful render did.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSummary {
    pub adapter: String,
    pub backend: String,
    pub params: FractalParams,
    pub geometry: DispatchGeometry,
    pub elapsed_ms: f64,
    pub output_path: PathBuf,
}

/// Render the fractal on the GPU and write it as PNG.
///
/// Every stage is fatal: the first error is returned and all device
/// resources acquired so far are released on the way out.
pub async fn render_to_file(config: RenderConfig) -> Result<RenderSummary, RenderError> {
    let started = Instant::now();

    let ctx = GpuContext::new().await?;
    let info = ctx.adapter_info();

    let source = KernelSource::load(&config.kernel_path)?;
    let shader = source.compile(&ctx.device).await?;

    let kernel = JuliaKernel::new(&ctx, &shader, config.params).await?;
    log::info!(
        "Rendering {}x{} Julia set, c = {} + {}i, {} iterations",
        config.params.width(),
        config.params.height(),
        config.params.c_real(),
        config.params.c_imag(),
        config.params.max_iterations()
    );
    let frame = kernel.dispatch().await?;

    write_png(&frame, &config.output_path)?;

    Ok(RenderSummary {
        adapter: info.name,
        backend: format!("{:?}", info.backend),
        params: config.params,
        geometry: kernel.geometry(),
        elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        output_path: config.output_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_config_default() {
        let config = RenderConfig::default();
        assert_eq!(config.params, FractalParams::default());
        assert_eq!(config.output_path, PathBuf::from("julia.png"));
        assert!(config.kernel_path.ends_with("src/gpu/shaders/julia.wgsl"));
        assert!(config.kernel_path.exists());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(RenderError::from(GpuError::NoAdapter).category(), "backend setup");
        assert_eq!(
            RenderError::from(GpuError::Poll("lost".into())).category(),
            "dispatch"
        );
        assert_eq!(
            RenderError::from(KernelError::Build {
                label: "k".into(),
                log: "bad".into()
            })
            .category(),
            "kernel compilation"
        );
        let missing = KernelSource::load("/nonexistent.wgsl").unwrap_err();
        assert_eq!(RenderError::from(missing).category(), "I/O");
        assert_eq!(
            RenderError::from(GpuError::OutputTooLarge {
                requested: 8,
                limit: 4
            })
            .category(),
            "dispatch"
        );
        let out_of_memory = GpuError::Device {
            stage: "resource allocation",
            source: wgpu::Error::OutOfMemory {
                source: Box::new(std::io::Error::other("exhausted")),
            },
        };
        assert_eq!(RenderError::from(out_of_memory).category(), "dispatch");
    }

    #[tokio::test]
    async fn test_missing_kernel_fails_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = RenderConfig {
            kernel_path: dir.path().join("absent.wgsl"),
            output_path: dir.path().join("julia.png"),
            ..Default::default()
        };

        // Without a GPU this fails at setup instead; either way nothing is written.
        assert!(render_to_file(config.clone()).await.is_err());
        assert!(!config.output_path.exists());
    }
}
