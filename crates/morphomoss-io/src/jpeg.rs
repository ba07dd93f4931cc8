//! JPEG image format support
//!
//! Reads JPEG images with the `jpeg-decoder` crate and writes them with
//! `jpeg-encoder`. Grayscale JPEGs load as 8 bpp, color JPEGs as 32 bpp.

use crate::{IoError, IoResult};
use morphomoss_core::{Pix, PixelDepth, color};
use jpeg_decoder::{Decoder, PixelFormat};
use std::io::{Read, Write};

/// Quality used when no explicit value is given.
pub const DEFAULT_QUALITY: u8 = 90;

/// Read a JPEG image from a reader.
///
/// # Arguments
/// * `reader` - A reader positioned at the JPEG SOI marker (`FF D8`)
///
/// # Returns
/// A `Pix` at 8 bpp (grayscale) or 32 bpp (RGB). CMYK scans are
/// converted to RGB.
pub fn read_jpeg<R: Read>(reader: R) -> IoResult<Pix> {
    let mut decoder = Decoder::new(reader);
    let data = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(format!("JPEG decode error: {}", e)))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("JPEG header missing".to_string()))?;

    let width = info.width as u32;
    let height = info.height as u32;

    let (depth, spp, samples) = match info.pixel_format {
        PixelFormat::L8 => (PixelDepth::Bit8, 1, 1),
        PixelFormat::L16 => (PixelDepth::Bit8, 1, 2),
        PixelFormat::RGB24 => (PixelDepth::Bit32, 3, 3),
        PixelFormat::CMYK32 => (PixelDepth::Bit32, 3, 4),
    };

    let expected = width as usize * height as usize * samples;
    if data.len() < expected {
        return Err(IoError::InvalidData(format!(
            "JPEG data too short: {} < {}",
            data.len(),
            expected
        )));
    }

    let pix = Pix::new(width, height, depth)?;
    let mut pix_mut = pix.try_into_mut().unwrap();
    pix_mut.set_spp(spp);

    for (i, px) in data[..expected].chunks_exact(samples).enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        let val = match samples {
            // L16 keeps the high byte (big-endian samples)
            1 | 2 => px[0] as u32,
            3 => color::compose_rgb(px[0], px[1], px[2]),
            _ => {
                let (r, g, b) = color::cmyk_to_rgb(px[0], px[1], px[2], px[3]);
                color::compose_rgb(r, g, b)
            }
        };
        pix_mut.set_pixel_unchecked(x, y, val);
    }

    Ok(pix_mut.into())
}

/// Write a `Pix` as baseline JPEG.
///
/// 1 bpp and 8 bpp images are written as grayscale (1 bpp foreground
/// white), 32 bpp as RGB.
///
/// # Arguments
/// * `quality` - Encoder quality, 1..=100
pub fn write_jpeg<W: Write>(pix: &Pix, writer: W, quality: u8) -> IoResult<()> {
    let width = pix.width();
    let height = pix.height();
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(IoError::EncodeError(format!(
            "image too large for JPEG: {}x{}",
            width, height
        )));
    }
    if !(1..=100).contains(&quality) {
        return Err(IoError::EncodeError(format!(
            "JPEG quality must be in 1..=100, got {}",
            quality
        )));
    }

    let (color_type, data) = match pix.depth() {
        PixelDepth::Bit1 | PixelDepth::Bit8 => {
            let gray = pix.convert_to_8()?;
            let mut data = Vec::with_capacity((width * height) as usize);
            for y in 0..height {
                for x in 0..width {
                    data.push(gray.get_pixel_unchecked(x, y) as u8);
                }
            }
            (jpeg_encoder::ColorType::Luma, data)
        }
        PixelDepth::Bit32 => {
            let mut data = Vec::with_capacity((width * height * 3) as usize);
            for y in 0..height {
                for x in 0..width {
                    let (r, g, b) = color::extract_rgb(pix.get_pixel_unchecked(x, y));
                    data.extend_from_slice(&[r, g, b]);
                }
            }
            (jpeg_encoder::ColorType::Rgb, data)
        }
    };

    let encoder = jpeg_encoder::Encoder::new(writer, quality);
    encoder
        .encode(&data, width as u16, height as u16, color_type)
        .map_err(|e| IoError::EncodeError(format!("JPEG encode error: {}", e)))?;
    Ok(())
}
