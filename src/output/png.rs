//! PNG encoder implementation.

use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tempfile::{Builder, NamedTempFile};

use crate::fractal::PixelBuffer;

/// Output file written by the `julia` binary.
pub const DEFAULT_OUTPUT_PATH: &str = "julia.png";

/// Errors that can occur while writing the image.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Encode `frame` as RGBA8 PNG at `path`.
///
/// The image is written to a temporary file beside `path` and renamed into
/// place, so a failed write leaves nothing behind.
pub fn write_png<P: AsRef<Path>>(frame: &PixelBuffer, path: P) -> Result<(), EncodeError> {
    let path = path.as_ref();
    let io_err = |source| EncodeError::Io {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = output_temp_file(dir).map_err(io_err)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        PngEncoder::new(&mut writer).write_image(
            frame.as_bytes(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgba8,
        )?;
        writer.flush().map_err(io_err)?;
    }

    tmp.persist(path).map_err(|e| io_err(e.error))?;
    log::info!(
        "Wrote {}x{} PNG to {}",
        frame.width(),
        frame.height(),
        path.display()
    );
    Ok(())
}

/// Temporary file that becomes the output on `persist`.
///
/// Created with the mode of an ordinary new file, so the renamed result is
/// not left owner-only.
fn output_temp_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(".julia-").suffix(".png.tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Filtered by the umask at open time, like `File::create`.
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}
