//! GPU compute using wgpu.
//!
//! Provides headless device setup, kernel loading with build diagnostics,
//! and the single-dispatch Julia renderer.

pub mod compute;
pub mod context;
pub mod kernel;
pub mod layouts;

pub use compute::{DispatchGeometry, JuliaKernel, JuliaUniforms};
pub use context::{workgroup_side, GpuContext, GpuError};
pub use kernel::{KernelError, KernelSource, DEFAULT_KERNEL_PATH, KERNEL_ENTRY_POINT};
