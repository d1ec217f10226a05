//! Kernel source loading and compilation.
//!
//! The kernel is read whole from disk at run time. Before it reaches the
//! device it is parsed and validated with naga, so a broken kernel is
//! reported as a build log rendered against the source instead of a device
//! panic.

use std::path::{Path, PathBuf};

use wgpu::{Device, ShaderModule};

use crate::gpu::context::DeviceScope;

/// Name of the compute entry point in the kernel.
pub const KERNEL_ENTRY_POINT: &str = "julia";

/// Pipeline-overridable constant carrying the tile side.
pub const WORKGROUP_SIDE_CONSTANT: &str = "WORKGROUP_SIDE";

/// Kernel shipped with the crate.
pub const DEFAULT_KERNEL_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/src/gpu/shaders/julia.wgsl");

/// Errors that can occur while loading or building the kernel.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("Failed to read kernel source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Kernel {label} failed to build:\n{log}")]
    Build { label: String, log: String },
    #[error("Kernel {label} has no compute entry point named `{entry_point}`")]
    MissingEntryPoint { label: String, entry_point: String },
}

/// Kernel program text and where it came from.
#[derive(Debug, Clone)]
pub struct KernelSource {
    label: String,
    text: String,
}

impl KernelSource {
    /// Read the whole kernel file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, KernelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| KernelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded kernel {} ({} bytes)", path.display(), text.len());
        Ok(Self {
            label: path.display().to_string(),
            text,
        })
    }

    /// Wrap kernel text that did not come from a file.
    pub fn from_text(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse and validate the kernel, returning the build log on failure.
    pub fn check(&self) -> Result<(), KernelError> {
        let module = naga::front::wgsl::parse_str(&self.text).map_err(|e| KernelError::Build {
            label: self.label.clone(),
            log: e.emit_to_string(&self.text),
        })?;

        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .map_err(|e| KernelError::Build {
            label: self.label.clone(),
            log: e.emit_to_string(&self.text),
        })?;

        let has_entry = module
            .entry_points
            .iter()
            .any(|ep| ep.name == KERNEL_ENTRY_POINT && ep.stage == naga::ShaderStage::Compute);
        if !has_entry {
            return Err(KernelError::MissingEntryPoint {
                label: self.label.clone(),
                entry_point: KERNEL_ENTRY_POINT.to_string(),
            });
        }

        Ok(())
    }

    /// Build the kernel into a shader module on `device`.
    ///
    /// Anything the device rejects after the naga check is reported as a
    /// build failure carrying the device's message.
    pub async fn compile(&self, device: &Device) -> Result<ShaderModule, KernelError> {
        self.check()?;
        let scope = DeviceScope::open(device);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("julia_shader"),
            source: wgpu::ShaderSource::Wgsl(self.text.as_str().into()),
        });
        if let Some(err) = scope.close().await {
            return Err(KernelError::Build {
                label: self.label.clone(),
                log: err.to_string(),
            });
        }
        log::info!("Built kernel {}", self.label);
        Ok(module)
    }
}
