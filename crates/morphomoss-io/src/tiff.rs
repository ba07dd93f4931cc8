//! TIFF image format support
//!
//! Reads single-page TIFF images and writes uncompressed ones. Only the
//! first page of a multipage file is read.

use crate::{IoError, IoResult};
use morphomoss_core::{Pix, PixelDepth, color};
use std::io::{Read, Seek, Write};
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::{Gray8, RGB8};
use tiff::tags::Tag;

/// Read a TIFF image
///
/// Supported layouts are bilevel, 8/16-bit gray, gray+alpha, RGB and
/// RGBA. 16-bit samples keep their high byte.
pub fn read_tiff<R: Read + Seek>(reader: R) -> IoResult<Pix> {
    let mut decoder = Decoder::new(reader)
        .map_err(|e| IoError::DecodeError(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| IoError::DecodeError(format!("Failed to get TIFF dimensions: {}", e)))?;
    let color_type = decoder
        .colortype()
        .map_err(|e| IoError::DecodeError(format!("Failed to get TIFF color type: {}", e)))?;

    // PhotometricInterpretation 0 = WhiteIsZero
    let white_is_zero = decoder
        .get_tag_u32(Tag::PhotometricInterpretation)
        .map(|v| v == 0)
        .unwrap_or(false);

    let (pix_depth, spp, channels) = match color_type {
        ColorType::Gray(1) => (PixelDepth::Bit1, 1, 1),
        ColorType::Gray(8) | ColorType::Gray(16) => (PixelDepth::Bit8, 1, 1),
        ColorType::GrayA(8) | ColorType::GrayA(16) => (PixelDepth::Bit32, 4, 2),
        ColorType::RGB(8) | ColorType::RGB(16) => (PixelDepth::Bit32, 3, 3),
        ColorType::RGBA(8) | ColorType::RGBA(16) => (PixelDepth::Bit32, 4, 4),
        _ => {
            return Err(IoError::UnsupportedFormat(format!(
                "unsupported TIFF color type: {:?}",
                color_type
            )));
        }
    };

    let image_data = decoder
        .read_image()
        .map_err(|e| IoError::DecodeError(format!("Failed to read TIFF image data: {}", e)))?;

    let samples: Vec<u8> = match image_data {
        DecodingResult::U8(data) => data,
        DecodingResult::U16(data) => data.into_iter().map(|v| (v >> 8) as u8).collect(),
        _ => {
            return Err(IoError::UnsupportedFormat(
                "unsupported TIFF sample format".to_string(),
            ));
        }
    };

    let pix = Pix::new(width, height, pix_depth)?;
    let mut pix_mut = pix.try_into_mut().unwrap();
    pix_mut.set_spp(spp);

    if let (Ok(xres), Ok(yres)) = (
        decoder.get_tag_f32(Tag::XResolution),
        decoder.get_tag_f32(Tag::YResolution),
    ) {
        pix_mut.set_resolution(xres.round() as i32, yres.round() as i32);
    }

    let row_len = if pix_depth == PixelDepth::Bit1 {
        width.div_ceil(8) as usize
    } else {
        width as usize * channels
    };
    let needed = row_len * height as usize;
    if samples.len() < needed {
        return Err(IoError::InvalidData(format!(
            "TIFF data too short: {} < {}",
            samples.len(),
            needed
        )));
    }

    for y in 0..height {
        let row = &samples[y as usize * row_len..(y as usize + 1) * row_len];
        for x in 0..width {
            let xi = x as usize;
            let val = match pix_depth {
                PixelDepth::Bit1 => {
                    let bit = ((row[xi / 8] >> (7 - (xi % 8))) & 1) as u32;
                    if white_is_zero { 1 - bit } else { bit }
                }
                PixelDepth::Bit8 => {
                    let v = row[xi];
                    (if white_is_zero { 255 - v } else { v }) as u32
                }
                PixelDepth::Bit32 => {
                    let p = &row[xi * channels..(xi + 1) * channels];
                    match channels {
                        2 => color::compose_rgba(p[0], p[0], p[0], p[1]),
                        3 => color::compose_rgb(p[0], p[1], p[2]),
                        _ => color::compose_rgba(p[0], p[1], p[2], p[3]),
                    }
                }
            };
            pix_mut.set_pixel_unchecked(x, y, val);
        }
    }

    Ok(pix_mut.into())
}

/// Write an uncompressed TIFF image
///
/// 1 bpp and 8 bpp are written as 8-bit gray (1 bpp foreground white),
/// 32 bpp as 8-bit RGB.
pub fn write_tiff<W: Write + Seek>(pix: &Pix, writer: W) -> IoResult<()> {
    let width = pix.width();
    let height = pix.height();
    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| IoError::EncodeError(format!("TIFF encoder error: {}", e)))?;

    match pix.depth() {
        PixelDepth::Bit1 | PixelDepth::Bit8 => {
            let gray = pix.convert_to_8()?;
            let mut data = Vec::with_capacity((width * height) as usize);
            for y in 0..height {
                for x in 0..width {
                    data.push(gray.get_pixel_unchecked(x, y) as u8);
                }
            }
            encoder
                .write_image::<Gray8>(width, height, &data)
                .map_err(|e| IoError::EncodeError(format!("TIFF write error: {}", e)))?;
        }
        PixelDepth::Bit32 => {
            let mut data = Vec::with_capacity((width * height * 3) as usize);
            for y in 0..height {
                for x in 0..width {
                    let (r, g, b) = color::extract_rgb(pix.get_pixel_unchecked(x, y));
                    data.extend_from_slice(&[r, g, b]);
                }
            }
            encoder
                .write_image::<RGB8>(width, height, &data)
                .map_err(|e| IoError::EncodeError(format!("TIFF write error: {}", e)))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_tiff_roundtrip_gray() {
        let mut pm = Pix::new(9, 4, PixelDepth::Bit8).unwrap().to_mut();
        pm.set_pixel(8, 3, 201).unwrap();
        pm.set_pixel(0, 0, 3).unwrap();
        let pix: Pix = pm.into();

        let mut buf = Cursor::new(Vec::new());
        write_tiff(&pix, &mut buf).unwrap();
        buf.set_position(0);
        let back = read_tiff(buf).unwrap();

        assert_eq!(back.depth(), PixelDepth::Bit8);
        assert_eq!(back.get_pixel(8, 3), Some(201));
        assert_eq!(back.get_pixel(0, 0), Some(3));
        assert_eq!(back.get_pixel(4, 2), Some(0));
    }

    #[test]
    fn test_tiff_roundtrip_rgb() {
        let mut pm = Pix::new(2, 2, PixelDepth::Bit32).unwrap().to_mut();
        pm.set_rgb(1, 1, 10, 200, 30).unwrap();
        let pix: Pix = pm.into();

        let mut buf = Cursor::new(Vec::new());
        write_tiff(&pix, &mut buf).unwrap();
        buf.set_position(0);
        let back = read_tiff(buf).unwrap();

        assert_eq!(back.depth(), PixelDepth::Bit32);
        assert_eq!(back.get_rgb(1, 1), Some((10, 200, 30)));
    }

    #[test]
    fn test_tiff_garbage() {
        let data = vec![0x49, 0x49, 0x2A, 0x00, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(read_tiff(Cursor::new(data)).is_err());
    }
}
