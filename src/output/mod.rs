//! Image output.
//!
//! Writes finished frames as PNG via the `image` crate. Files appear at
//! their destination atomically or not at all.

pub mod png;

pub use png::{write_png, EncodeError, DEFAULT_OUTPUT_PATH};
