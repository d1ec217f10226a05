//! Fractal parameters shared by the CPU evaluator and the GPU kernel.

use serde::Serialize;

/// Output width of the rendered image.
pub const DEFAULT_WIDTH: u32 = 1280;
/// Output height of the rendered image.
pub const DEFAULT_HEIGHT: u32 = 720;
/// Real part of the Julia constant `c`.
pub const DEFAULT_C_REAL: f32 = -0.8;
/// Imaginary part of the Julia constant `c`.
pub const DEFAULT_C_IMAG: f32 = 0.156;
pub const DEFAULT_MAX_ITERATIONS: u32 = 256;
pub const DEFAULT_ESCAPE_RADIUS_SQUARED: f32 = 4.0;

/// Width of the complex-plane window along the shorter image axis.
pub const VIEW_SPAN: f32 = 3.0;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Errors raised when fractal parameters are out of range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("Image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
    #[error("Image of {width}x{height} pixels does not fit in memory")]
    ImageTooLarge { width: u32, height: u32 },
    #[error("max_iterations must be at least 1")]
    NoIterations,
    #[error("Julia constant must be finite, got ({re}, {im})")]
    NonFiniteConstant { re: f32, im: f32 },
    #[error("Escape radius squared must be finite and positive, got {0}")]
    InvalidEscapeRadius(f32),
}

/// Immutable parameters for one render.
///
/// Built through [`FractalParams::new`], which checks every field, so the
/// evaluator and the dispatch code never have to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FractalParams {
    width: u32,
    height: u32,
    c_real: f32,
    c_imag: f32,
    max_iterations: u32,
    escape_radius_squared: f32,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            c_real: DEFAULT_C_REAL,
            c_imag: DEFAULT_C_IMAG,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            escape_radius_squared: DEFAULT_ESCAPE_RADIUS_SQUARED,
        }
    }
}

impl FractalParams {
    /// Validate and build a parameter set.
    pub fn new(
        width: u32,
        height: u32,
        c: (f32, f32),
        max_iterations: u32,
        escape_radius_squared: f32,
    ) -> Result<Self, ParamsError> {
        if width == 0 || height == 0 {
            return Err(ParamsError::EmptyImage { width, height });
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
            .ok_or(ParamsError::ImageTooLarge { width, height })?;
        if max_iterations == 0 {
            return Err(ParamsError::NoIterations);
        }
        if !c.0.is_finite() || !c.1.is_finite() {
            return Err(ParamsError::NonFiniteConstant { re: c.0, im: c.1 });
        }
        if !escape_radius_squared.is_finite() || escape_radius_squared <= 0.0 {
            return Err(ParamsError::InvalidEscapeRadius(escape_radius_squared));
        }

        Ok(Self {
            width,
            height,
            c_real: c.0,
            c_imag: c.1,
            max_iterations,
            escape_radius_squared,
        })
    }

    /// Same parameters at a different resolution.
    pub fn with_size(self, width: u32, height: u32) -> Result<Self, ParamsError> {
        Self::new(
            width,
            height,
            (self.c_real, self.c_imag),
            self.max_iterations,
            self.escape_radius_squared,
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn c_real(&self) -> f32 {
        self.c_real
    }

    pub fn c_imag(&self) -> f32 {
        self.c_imag
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn escape_radius_squared(&self) -> f32 {
        self.escape_radius_squared
    }

    /// Number of pixels in the image.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of the RGBA8 pixel buffer in bytes.
    pub fn buffer_len(&self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }

    /// Complex-plane units per pixel.
    ///
    /// The shorter dimension spans [`VIEW_SPAN`]; the longer one keeps the
    /// aspect ratio.
    pub fn scale(&self) -> f32 {
        VIEW_SPAN / self.width.min(self.height) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = FractalParams::default();
        assert_eq!(params.width(), 1280);
        assert_eq!(params.height(), 720);
        assert_eq!(params.c_real(), -0.8);
        assert_eq!(params.c_imag(), 0.156);
        assert_eq!(params.max_iterations(), 256);
        assert_eq!(params.escape_radius_squared(), 4.0);
        assert_eq!(params.buffer_len(), 1280 * 720 * 4);
    }

    #[test]
    fn test_default_matches_validated() {
        let built = FractalParams::new(1280, 720, (-0.8, 0.156), 256, 4.0).unwrap();
        assert_eq!(built, FractalParams::default());
    }

    #[test]
    fn test_scale_uses_shorter_side() {
        let landscape = FractalParams::default();
        assert_eq!(landscape.scale(), 3.0 / 720.0);

        let portrait = landscape.with_size(300, 600).unwrap();
        assert_eq!(portrait.scale(), 3.0 / 300.0);
    }

    #[test]
    fn test_rejects_empty_image() {
        assert_eq!(
            FractalParams::new(0, 10, (0.0, 0.0), 10, 4.0),
            Err(ParamsError::EmptyImage {
                width: 0,
                height: 10
            })
        );
        assert!(FractalParams::default().with_size(10, 0).is_err());
    }

    #[test]
    fn test_rejects_bad_iteration_and_radius() {
        assert_eq!(
            FractalParams::new(4, 4, (0.0, 0.0), 0, 4.0),
            Err(ParamsError::NoIterations)
        );
        assert!(matches!(
            FractalParams::new(4, 4, (0.0, 0.0), 8, -1.0),
            Err(ParamsError::InvalidEscapeRadius(_))
        ));
        assert!(matches!(
            FractalParams::new(4, 4, (f32::NAN, 0.0), 8, 4.0),
            Err(ParamsError::NonFiniteConstant { .. })
        ));
    }

    #[test]
    fn test_params_serialize() {
        let json = serde_json::to_string(&FractalParams::default()).unwrap();
        assert!(json.contains("\"width\":1280"));
        assert!(json.contains("\"max_iterations\":256"));
    }
}
