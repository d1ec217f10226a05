//! Julia Render Core
//!
//! Renders a Julia-set fractal with a single GPU compute dispatch and saves
//! it as PNG.
//!
//! # Features
//!
//! - Escape-time evaluation with a palette shared between CPU and GPU
//! - GPU compute via wgpu (Metal, Vulkan, DX12, GL)
//! - Kernel loaded from WGSL source at run time, with naga build diagnostics
//! - Rayon-parallel CPU reference renderer for verification
//! - Atomic PNG output via the `image` crate

pub mod fractal;
pub mod gpu;
pub mod output;
pub mod pipeline;

// Re-export commonly used types
pub use fractal::{
    escape_time, render_reference, ColorSample, Evaluator, FractalParams, Palette, ParamsError,
    PixelBuffer,
};
pub use gpu::{DispatchGeometry, GpuContext, GpuError, JuliaKernel, KernelError, KernelSource};
pub use output::{write_png, EncodeError};
pub use pipeline::{render_to_file, RenderConfig, RenderError, RenderSummary};
