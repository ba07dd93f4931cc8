//! WebP image format support
//!
//! Reads still WebP images (lossy or lossless) with `image-webp` and
//! writes lossless WebP. Animated files are rejected.

use crate::{IoError, IoResult};
use image_webp::{ColorType, EncoderParams, WebPDecoder, WebPEncoder};
use morphomoss_core::{Pix, PixelDepth, color};
use std::io::{BufRead, Read, Seek, Write};

/// Read a WebP image.
///
/// The result is always 32 bpp; spp is 4 when the file carries alpha
/// and 3 otherwise.
pub fn read_webp<R: Read + BufRead + Seek>(reader: R) -> IoResult<Pix> {
    let mut decoder = WebPDecoder::new(reader)
        .map_err(|e| IoError::DecodeError(format!("WebP decode error: {}", e)))?;

    if decoder.is_animated() {
        return Err(IoError::UnsupportedFormat(
            "animated WebP not supported".to_string(),
        ));
    }

    let (width, height) = decoder.dimensions();
    let has_alpha = decoder.has_alpha();
    let buffer_size = decoder.output_buffer_size().ok_or_else(|| {
        IoError::DecodeError("WebP image too large to decode".to_string())
    })?;

    let mut buffer = vec![0u8; buffer_size];
    decoder
        .read_image(&mut buffer)
        .map_err(|e| IoError::DecodeError(format!("WebP read error: {}", e)))?;

    let pix = Pix::new(width, height, PixelDepth::Bit32)?;
    let mut pix_mut = pix.try_into_mut().unwrap();
    pix_mut.set_spp(if has_alpha { 4 } else { 3 });

    // Output is RGBA8 with alpha, RGB8 without
    let stride = if has_alpha { 4 } else { 3 };
    for (i, px) in buffer.chunks_exact(stride).enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        let a = if has_alpha { px[3] } else { 255 };
        pix_mut.set_pixel_unchecked(x, y, color::compose_rgba(px[0], px[1], px[2], a));
    }

    Ok(pix_mut.into())
}

/// Write a `Pix` as lossless WebP.
///
/// 1 bpp and 8 bpp images are expanded to gray RGB (1 bpp foreground
/// white). 32 bpp images keep alpha only when spp is 4.
pub fn write_webp<W: Write>(pix: &Pix, writer: W) -> IoResult<()> {
    let width = pix.width();
    let height = pix.height();

    let (buffer, color_type) = match pix.depth() {
        PixelDepth::Bit1 | PixelDepth::Bit8 => {
            let gray = pix.convert_to_8()?;
            let mut buffer = Vec::with_capacity((width * height * 3) as usize);
            for y in 0..height {
                for x in 0..width {
                    let v = gray.get_pixel_unchecked(x, y) as u8;
                    buffer.extend_from_slice(&[v, v, v]);
                }
            }
            (buffer, ColorType::Rgb8)
        }
        PixelDepth::Bit32 if pix.spp() == 4 => {
            let mut buffer = Vec::with_capacity((width * height * 4) as usize);
            for y in 0..height {
                for x in 0..width {
                    let val = pix.get_pixel_unchecked(x, y);
                    let (r, g, b) = color::extract_rgb(val);
                    buffer.extend_from_slice(&[r, g, b, color::alpha(val)]);
                }
            }
            (buffer, ColorType::Rgba8)
        }
        PixelDepth::Bit32 => {
            let mut buffer = Vec::with_capacity((width * height * 3) as usize);
            for y in 0..height {
                for x in 0..width {
                    let (r, g, b) = color::extract_rgb(pix.get_pixel_unchecked(x, y));
                    buffer.extend_from_slice(&[r, g, b]);
                }
            }
            (buffer, ColorType::Rgb8)
        }
    };

    let mut encoder = WebPEncoder::new(writer);
    // EncoderParams is non-exhaustive
    let mut params = EncoderParams::default();
    params.use_predictor_transform = true;
    encoder.set_params(params);
    encoder
        .encode(&buffer, width, height, color_type)
        .map_err(|e| IoError::EncodeError(format!("WebP encode error: {}", e)))?;

    Ok(())
}
