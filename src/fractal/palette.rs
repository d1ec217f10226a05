//! Escape-time palette.
//!
//! The palette is a lookup table indexed by iteration count. The CPU
//! evaluator reads it directly and the GPU kernel receives the same table
//! as a storage buffer, so a given escape time always maps to the same
//! bytes regardless of backend.

/// One RGBA8 pixel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ColorSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorSample {
    /// Color of points that never escape.
    pub const INTERIOR: Self = Self::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }

    /// Pack as a little-endian `u32`, the layout the kernel writes.
    pub fn packed(self) -> u32 {
        u32::from_le_bytes(self.to_array())
    }
}

/// Lookup table from escape time to color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<ColorSample>,
}

impl Palette {
    /// Build the table for `max_iterations`.
    ///
    /// Entries `0..max_iterations` follow a Bernstein-polynomial ramp over
    /// `t = sqrt((n + 1) / (max_iterations + 1))`; entry `max_iterations` is
    /// [`ColorSample::INTERIOR`]. Blue never rounds down to zero on the ramp,
    /// so escaped points stay distinct from the interior at any iteration cap.
    pub fn new(max_iterations: u32) -> Self {
        let denom = max_iterations as f64 + 1.0;
        let entries = (0..max_iterations)
            .map(|n| ramp(((n as f64 + 1.0) / denom).sqrt()))
            .chain(std::iter::once(ColorSample::INTERIOR))
            .collect();
        Self { entries }
    }

    /// Color for an escape time. Counts past the table clamp to interior.
    pub fn color(&self, iterations: u32) -> ColorSample {
        let last = self.entries.len() - 1;
        self.entries[(iterations as usize).min(last)]
    }

    pub fn max_iterations(&self) -> u32 {
        (self.entries.len() - 1) as u32
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ColorSample] {
        &self.entries
    }

    /// Table packed for upload to the kernel.
    pub fn packed(&self) -> Vec<u32> {
        self.entries.iter().map(|c| c.packed()).collect()
    }
}

fn ramp(t: f64) -> ColorSample {
    let s = 1.0 - t;
    let r = 9.0 * s * t * t * t;
    let g = 15.0 * s * s * t * t;
    let b = 8.5 * s * s * s * t;
    ColorSample::opaque(channel(r), channel(g), channel(b).max(1))
}

fn channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
