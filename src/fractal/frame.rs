//! Pixel buffer and the CPU reference frame producer.

use rayon::prelude::*;

use super::evaluator::Evaluator;
use super::palette::ColorSample;
use super::params::{FractalParams, BYTES_PER_PIXEL};

/// Errors raised when raw bytes do not form a valid frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Frame of {width}x{height} needs {expected} bytes, got {got}")]
    LengthMismatch {
        width: u32,
        height: u32,
        expected: usize,
        got: usize,
    },
}

/// Completed RGBA8 image in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Zeroed buffer. Only producers inside the crate see it before it is
    /// fully written.
    pub(crate) fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    /// Wrap bytes read back from a device.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                width,
                height,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Write one sample; lets tests fill a frame in arbitrary order.
    #[cfg(test)]
    fn put(&mut self, x: u32, y: u32, sample: ColorSample) {
        let offset = self.offset(x, y);
        self.data[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&sample.to_array());
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of color samples.
    pub fn len(&self) -> usize {
        self.data.len() / BYTES_PER_PIXEL
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn sample(&self, x: u32, y: u32) -> ColorSample {
        let offset = self.offset(x, y);
        let mut px = [0u8; BYTES_PER_PIXEL];
        px.copy_from_slice(&self.data[offset..offset + BYTES_PER_PIXEL]);
        ColorSample::from_array(px)
    }

    /// Samples in row-major order.
    pub fn samples(&self) -> impl Iterator<Item = ColorSample> + '_ {
        self.data
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|px| ColorSample::from_array([px[0], px[1], px[2], px[3]]))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Count of samples that differ between two equally sized frames.
    pub fn count_differences(&self, other: &PixelBuffer) -> Option<usize> {
        if self.width != other.width || self.height != other.height {
            return None;
        }
        Some(
            self.samples()
                .zip(other.samples())
                .filter(|(a, b)| a != b)
                .count(),
        )
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) outside {}x{} frame",
            x,
            y,
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }
}

/// Render the frame on the CPU.
///
/// Rows are split across the rayon pool; each task owns a disjoint slice of
/// the buffer, so the result does not depend on the number of threads.
pub fn render_reference(params: &FractalParams) -> PixelBuffer {
    let evaluator = Evaluator::new(*params);
    let mut frame = PixelBuffer::blank(params.width(), params.height());
    let row_bytes = params.width() as usize * BYTES_PER_PIXEL;

    frame
        .data
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                px.copy_from_slice(&evaluator.evaluate(x as u32, y as u32).to_array());
            }
        });

    log::debug!(
        "CPU reference rendered {}x{} ({} bytes)",
        params.width(),
        params.height(),
        frame.data.len()
    );
    frame
}
