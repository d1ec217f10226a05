//! Julia-set escape-time evaluation.
//!
//! This module provides:
//! - Validated fractal parameters and the default render constants
//! - The per-pixel evaluator (complex mapping, iteration, coloring)
//! - The palette lookup table shared with the GPU kernel
//! - The pixel buffer and a rayon-parallel CPU reference renderer

pub mod evaluator;
pub mod frame;
pub mod palette;
pub mod params;

pub use evaluator::{escape_time, iterate, map_pixel, Evaluator};
pub use frame::{render_reference, FrameError, PixelBuffer};
pub use palette::{ColorSample, Palette};
pub use params::{FractalParams, ParamsError};
