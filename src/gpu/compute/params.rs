//! Uniform parameter struct for the Julia kernel.
//!
//! Must match `JuliaParams` in `shaders/julia.wgsl` exactly, including
//! alignment requirements.

use crate::fractal::FractalParams;

/// Kernel parameters.
/// WGSL: three u32 fields, one u32 pad, then four f32 fields (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct JuliaUniforms {
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    pub _padding: u32,
    pub c_real: f32,
    pub c_imag: f32,
    pub scale: f32,
    pub escape_radius_squared: f32,
}

impl JuliaUniforms {
    pub fn new(params: &FractalParams) -> Self {
        Self {
            width: params.width(),
            height: params.height(),
            max_iterations: params.max_iterations(),
            _padding: 0,
            c_real: params.c_real(),
            c_imag: params.c_imag(),
            scale: params.scale(),
            escape_radius_squared: params.escape_radius_squared(),
        }
    }
}
