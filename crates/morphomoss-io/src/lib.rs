//! morphomoss-io - Image I/O for MorphoMoss
//!
//! Reads microscopy images into [`Pix`] and writes intermediate images
//! (edge masks, synthetic fixtures) back to disk.
//!
//! | format | read | write | feature |
//! |--------|------|-------|---------|
//! | PNG    | yes  | yes   | `png-format` |
//! | JPEG   | yes  | yes   | `jpeg` |
//! | TIFF   | yes  | yes   | `tiff-format` |
//! | BMP    | yes  | yes   | `bmp` |
//! | PNM    | yes  | yes   | `pnm` |
//! | WebP   | yes  | yes   | `webp-format` |
//! | JPEG 2000 | yes | no  | `jp2k-format` |
//!
//! Every loaded image is normalized to 1, 8 or 32 bpp: palettes are
//! expanded to RGB, 16-bit samples keep their high byte, and gray+alpha
//! becomes RGBA.

mod error;
pub mod format;

#[cfg(feature = "bmp")]
pub mod bmp;
#[cfg(feature = "jp2k-format")]
pub mod jp2k;
#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png-format")]
pub mod png;
#[cfg(feature = "pnm")]
pub mod pnm;
#[cfg(feature = "tiff-format")]
pub mod tiff;
#[cfg(feature = "webp-format")]
pub mod webp;

pub use error::{IoError, IoResult};
pub use format::{detect_format, detect_format_from_bytes};
pub use morphomoss_core::ImageFormat;

use morphomoss_core::Pix;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Read an image from a file path.
///
/// The format is detected from the file's magic number, not its
/// extension.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be read, and a decode or
/// unsupported-format error if its contents are not a usable image.
pub fn read_image<P: AsRef<Path>>(path: P) -> IoResult<Pix> {
    let data = fs::read(path.as_ref())?;
    read_image_mem(&data)
}

/// Read an image from an in-memory buffer.
pub fn read_image_mem(data: &[u8]) -> IoResult<Pix> {
    let format = detect_format_from_bytes(data)?;
    let cursor = Cursor::new(data);

    let pix = match format {
        #[cfg(feature = "bmp")]
        ImageFormat::Bmp => bmp::read_bmp(cursor)?,
        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => jpeg::read_jpeg(cursor)?,
        #[cfg(feature = "png-format")]
        ImageFormat::Png => png::read_png(cursor)?,
        #[cfg(feature = "pnm")]
        ImageFormat::Pnm => pnm::read_pnm(cursor)?,
        #[cfg(feature = "tiff-format")]
        ImageFormat::Tiff => tiff::read_tiff(cursor)?,
        #[cfg(feature = "webp-format")]
        ImageFormat::WebP => webp::read_webp(cursor)?,
        #[cfg(feature = "jp2k-format")]
        ImageFormat::Jp2 => jp2k::read_jp2k_mem(data)?,
        other => {
            return Err(IoError::UnsupportedFormat(format!(
                "{:?} support is not enabled",
                other
            )));
        }
    };

    let mut pix_mut = pix.try_into_mut().unwrap_or_else(|shared| shared.to_mut());
    pix_mut.set_informat(format);
    Ok(pix_mut.into())
}

/// Write an image to a file path in the given format.
pub fn write_image<P: AsRef<Path>>(pix: &Pix, path: P, format: ImageFormat) -> IoResult<()> {
    let data = write_image_mem(pix, format)?;
    fs::write(path.as_ref(), data)?;
    Ok(())
}

/// Encode an image into an in-memory buffer.
pub fn write_image_mem(pix: &Pix, format: ImageFormat) -> IoResult<Vec<u8>> {
    let mut buffer = Vec::new();
    match format {
        #[cfg(feature = "png-format")]
        ImageFormat::Png | ImageFormat::Unknown => png::write_png(pix, &mut buffer)?,
        #[cfg(feature = "bmp")]
        ImageFormat::Bmp => bmp::write_bmp(pix, &mut buffer)?,
        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => jpeg::write_jpeg(pix, &mut buffer, jpeg::DEFAULT_QUALITY)?,
        #[cfg(feature = "pnm")]
        ImageFormat::Pnm => pnm::write_pnm(pix, &mut buffer)?,
        #[cfg(feature = "tiff-format")]
        ImageFormat::Tiff => tiff::write_tiff(pix, Cursor::new(&mut buffer))?,
        #[cfg(feature = "webp-format")]
        ImageFormat::WebP => webp::write_webp(pix, &mut buffer)?,
        // JPEG 2000 is decode-only
        other => {
            return Err(IoError::UnsupportedFormat(format!(
                "writing {:?} is not supported",
                other
            )));
        }
    }
    Ok(buffer)
}
