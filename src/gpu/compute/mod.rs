//! GPU compute modules for fractal rendering.
//!
//! This module provides the Julia kernel dispatch using wgpu compute shaders.

mod buffers;
mod params;
mod pipelines;

pub mod julia;

pub use julia::{DispatchGeometry, JuliaKernel};
pub use params::JuliaUniforms;
