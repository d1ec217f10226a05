//! Escape-time evaluation of a single pixel.
//!
//! This is the CPU twin of `gpu/shaders/julia.wgsl`. Both perform the same
//! `f32` operations in the same order; keep them in step when editing
//! either one.

use super::palette::{ColorSample, Palette};
use super::params::FractalParams;

/// Map a pixel to its point in the complex plane.
///
/// Samples the pixel center, so the image is symmetric about the origin.
pub fn map_pixel(x: u32, y: u32, params: &FractalParams) -> (f32, f32) {
    let scale = params.scale();
    let zx = ((x as f32 + 0.5) - params.width() as f32 * 0.5) * scale;
    let zy = ((y as f32 + 0.5) - params.height() as f32 * 0.5) * scale;
    (zx, zy)
}

/// Iterate `z <- z^2 + c` from `(zx, zy)` and return the escape time.
///
/// Returns `max_iterations` for points that stay bounded.
pub fn iterate(mut zx: f32, mut zy: f32, params: &FractalParams) -> u32 {
    let (c_real, c_imag) = (params.c_real(), params.c_imag());
    let limit = params.escape_radius_squared();
    let mut n = 0;
    while n < params.max_iterations() {
        let xx = zx * zx;
        let yy = zy * zy;
        if xx + yy > limit {
            break;
        }
        zy = 2.0 * zx * zy + c_imag;
        zx = xx - yy + c_real;
        n += 1;
    }
    n
}

/// Escape time of pixel `(x, y)`.
pub fn escape_time(x: u32, y: u32, params: &FractalParams) -> u32 {
    let (zx, zy) = map_pixel(x, y, params);
    iterate(zx, zy, params)
}

/// Pixel evaluator bound to one parameter set.
///
/// Holds no mutable state, so a single instance can be shared across
/// worker threads.
#[derive(Debug, Clone)]
pub struct Evaluator {
    params: FractalParams,
    palette: Palette,
}

impl Evaluator {
    pub fn new(params: FractalParams) -> Self {
        Self {
            palette: Palette::new(params.max_iterations()),
            params,
        }
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Color of pixel `(x, y)`.
    pub fn evaluate(&self, x: u32, y: u32) -> ColorSample {
        self.palette.color(escape_time(x, y, &self.params))
    }
}
