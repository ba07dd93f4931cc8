//! JPEG 2000 image format support
//!
//! Decodes JP2 containers and raw J2K codestreams with the pure-Rust
//! `hayro-jpeg2000` decoder. Writing is not supported.

use crate::{IoError, IoResult};
use hayro_jpeg2000::{ColorSpace, DecodeSettings, Image};
use morphomoss_core::{Pix, PixelDepth, color};
use std::io::Read;

/// How decoded samples map onto a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Gray,
    Rgb,
    Cmyk,
}

fn by_channel_count(n: usize) -> (Layout, usize) {
    if n < 3 {
        (Layout::Gray, n.max(1))
    } else {
        (Layout::Rgb, n)
    }
}

/// Read a JPEG 2000 image from a reader.
pub fn read_jp2k<R: Read>(mut reader: R) -> IoResult<Pix> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    read_jp2k_mem(&data)
}

/// Read a JPEG 2000 image from memory.
///
/// Single-channel images without alpha load as 8 bpp. Everything else
/// loads as 32 bpp: RGB keeps its alpha (spp 4), CMYK is converted to
/// RGB, and unknown or ICC spaces are read by channel count.
pub fn read_jp2k_mem(data: &[u8]) -> IoResult<Pix> {
    let image = Image::new(data, &DecodeSettings::default())
        .map_err(|e| IoError::DecodeError(format!("JP2K parse error: {}", e)))?;

    let width = image.width();
    let height = image.height();
    let has_alpha = image.has_alpha();
    let (layout, color_channels) = match image.color_space() {
        ColorSpace::Gray => (Layout::Gray, 1),
        ColorSpace::RGB => (Layout::Rgb, 3),
        ColorSpace::CMYK => (Layout::Cmyk, 4),
        ColorSpace::Unknown { num_channels } => by_channel_count(*num_channels as usize),
        ColorSpace::Icc { num_channels, .. } => by_channel_count(*num_channels as usize),
    };
    let stride = color_channels + has_alpha as usize;

    let pixels = image
        .decode()
        .map_err(|e| IoError::DecodeError(format!("JP2K decode error: {}", e)))?;
    let expected = width as usize * height as usize * stride;
    if pixels.len() < expected {
        return Err(IoError::InvalidData(format!(
            "JP2K data too short: {} < {}",
            pixels.len(),
            expected
        )));
    }

    let gray8 = layout == Layout::Gray && !has_alpha;
    let depth = if gray8 {
        PixelDepth::Bit8
    } else {
        PixelDepth::Bit32
    };
    let pix = Pix::new(width, height, depth)?;
    let mut pix_mut = pix.try_into_mut().unwrap();
    pix_mut.set_spp(match (gray8, has_alpha && layout != Layout::Cmyk) {
        (true, _) => 1,
        (false, true) => 4,
        (false, false) => 3,
    });

    for (i, px) in pixels[..expected].chunks_exact(stride).enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        let a = if has_alpha { px[color_channels] } else { 255 };
        let val = match layout {
            Layout::Gray if gray8 => px[0] as u32,
            Layout::Gray => color::compose_rgba(px[0], px[0], px[0], a),
            Layout::Rgb => color::compose_rgba(px[0], px[1], px[2], a),
            Layout::Cmyk => {
                let (r, g, b) = color::cmyk_to_rgb(px[0], px[1], px[2], px[3]);
                color::compose_rgb(r, g, b)
            }
        };
        pix_mut.set_pixel_unchecked(x, y, val);
    }

    Ok(pix_mut.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_jp2k_rejects_truncated_codestream() {
        let data = vec![0xFF, 0x4F, 0xFF, 0x51, 0x00, 0x2F, 0x00, 0x00];
        assert!(matches!(
            read_jp2k(Cursor::new(data)),
            Err(IoError::DecodeError(_))
        ));
    }

    #[test]
    fn test_jp2k_rejects_empty_container() {
        let data = [
            0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20, 0x0D, 0x0A, 0x87, 0x0A,
        ];
        assert!(read_jp2k_mem(&data).is_err());
    }
}
