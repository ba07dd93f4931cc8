//! PNG image format support

use crate::{IoError, IoResult};
use morphomoss_core::{Pix, PixelDepth, color};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use std::io::{BufRead, Seek, Write};

/// Read a PNG image
///
/// Palettes are expanded to RGB, sub-byte grayscale is scaled to 8 bits
/// and 16-bit samples are stripped to their high byte, so the result is
/// always 8 bpp gray or 32 bpp color.
pub fn read_png<R: BufRead + Seek>(reader: R) -> IoResult<Pix> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::DecodeError(format!("PNG decode error: {}", e)))?;

    let info = reader.info();
    let width = info.width;
    let height = info.height;
    let (color_type, bit_depth) = reader.output_color_type();
    if bit_depth != BitDepth::Eight {
        return Err(IoError::UnsupportedFormat(format!(
            "unsupported PNG output depth: {:?}",
            bit_depth
        )));
    }

    let (pix_depth, spp, samples) = match color_type {
        ColorType::Grayscale => (PixelDepth::Bit8, 1, 1),
        ColorType::GrayscaleAlpha => (PixelDepth::Bit32, 4, 2),
        ColorType::Rgb => (PixelDepth::Bit32, 3, 3),
        ColorType::Rgba => (PixelDepth::Bit32, 4, 4),
        ColorType::Indexed => {
            return Err(IoError::UnsupportedFormat(
                "PNG palette was not expanded".to_string(),
            ));
        }
    };

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("failed to get output buffer size".to_string()))?;
    let mut buf = vec![0; buf_size];
    let output_info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::DecodeError(format!("PNG frame error: {}", e)))?;

    let pix = Pix::new(width, height, pix_depth)?;
    let mut pix_mut = pix.try_into_mut().unwrap();
    pix_mut.set_spp(spp);

    let bytes_per_row = output_info.line_size;
    let data = &buf[..output_info.buffer_size()];

    for y in 0..height {
        let row = &data[y as usize * bytes_per_row..];
        for x in 0..width {
            let px = &row[x as usize * samples..(x as usize + 1) * samples];
            let val = match color_type {
                ColorType::Grayscale => px[0] as u32,
                ColorType::GrayscaleAlpha => color::compose_rgba(px[0], px[0], px[0], px[1]),
                ColorType::Rgb => color::compose_rgb(px[0], px[1], px[2]),
                _ => color::compose_rgba(px[0], px[1], px[2], px[3]),
            };
            pix_mut.set_pixel_unchecked(x, y, val);
        }
    }

    Ok(pix_mut.into())
}

/// Write a PNG image
///
/// 1 bpp is written as 1-bit grayscale with foreground white, 8 bpp as
/// 8-bit grayscale and 32 bpp as RGB (or RGBA when `spp == 4`).
pub fn write_png<W: Write>(pix: &Pix, writer: W) -> IoResult<()> {
    let width = pix.width();
    let height = pix.height();

    let (color_type, bit_depth) = match pix.depth() {
        PixelDepth::Bit1 => (ColorType::Grayscale, BitDepth::One),
        PixelDepth::Bit8 => (ColorType::Grayscale, BitDepth::Eight),
        PixelDepth::Bit32 if pix.spp() == 4 => (ColorType::Rgba, BitDepth::Eight),
        PixelDepth::Bit32 => (ColorType::Rgb, BitDepth::Eight),
    };

    let mut encoder = Encoder::new(writer, width, height);
    encoder.set_color(color_type);
    encoder.set_depth(bit_depth);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(format!("PNG header error: {}", e)))?;

    let bytes_per_row = match color_type {
        ColorType::Grayscale if bit_depth == BitDepth::One => width.div_ceil(8),
        ColorType::Grayscale => width,
        ColorType::Rgb => width * 3,
        _ => width * 4,
    } as usize;

    let mut data = vec![0u8; bytes_per_row * height as usize];

    for y in 0..height {
        let row = &mut data[y as usize * bytes_per_row..(y as usize + 1) * bytes_per_row];
        for x in 0..width {
            let val = pix.get_pixel_unchecked(x, y);
            match (color_type, bit_depth) {
                (ColorType::Grayscale, BitDepth::One) => {
                    if val != 0 {
                        row[(x / 8) as usize] |= 1 << (7 - (x % 8));
                    }
                }
                (ColorType::Grayscale, _) => row[x as usize] = val as u8,
                (ColorType::Rgb, _) => {
                    let (r, g, b) = color::extract_rgb(val);
                    let idx = x as usize * 3;
                    row[idx..idx + 3].copy_from_slice(&[r, g, b]);
                }
                _ => {
                    let (r, g, b) = color::extract_rgb(val);
                    let idx = x as usize * 4;
                    row[idx..idx + 4].copy_from_slice(&[r, g, b, color::alpha(val)]);
                }
            }
        }
    }

    writer
        .write_image_data(&data)
        .map_err(|e| IoError::EncodeError(format!("PNG write error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_png_roundtrip_8bpp() {
        let mut pm = Pix::new(10, 7, PixelDepth::Bit8).unwrap().to_mut();
        for y in 0..7 {
            for x in 0..10 {
                pm.set_pixel_unchecked(x, y, (x * 20 + y) % 256);
            }
        }
        let pix: Pix = pm.into();

        let mut buf = Vec::new();
        write_png(&pix, &mut buf).unwrap();
        let back = read_png(Cursor::new(buf)).unwrap();

        assert_eq!(back.depth(), PixelDepth::Bit8);
        assert_eq!(back.width(), 10);
        assert_eq!(back.height(), 7);
        for y in 0..7 {
            for x in 0..10 {
                assert_eq!(back.get_pixel(x, y), pix.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_png_1bpp_reads_as_gray() {
        let mut pm = Pix::new(13, 2, PixelDepth::Bit1).unwrap().to_mut();
        pm.set_pixel(12, 1, 1).unwrap();
        let pix: Pix = pm.into();

        let mut buf = Vec::new();
        write_png(&pix, &mut buf).unwrap();
        let back = read_png(Cursor::new(buf)).unwrap();

        assert_eq!(back.depth(), PixelDepth::Bit8);
        assert_eq!(back.get_pixel(12, 1), Some(255));
        assert_eq!(back.get_pixel(11, 1), Some(0));
    }

    #[test]
    fn test_png_rgb_roundtrip() {
        let mut pm = Pix::new(3, 1, PixelDepth::Bit32).unwrap().to_mut();
        pm.set_rgb(0, 0, 255, 0, 0).unwrap();
        pm.set_rgb(1, 0, 0, 128, 0).unwrap();
        pm.set_rgb(2, 0, 1, 2, 3).unwrap();
        let pix: Pix = pm.into();

        let mut buf = Vec::new();
        write_png(&pix, &mut buf).unwrap();
        let back = read_png(Cursor::new(buf)).unwrap();

        assert_eq!(back.depth(), PixelDepth::Bit32);
        assert_eq!(back.spp(), 3);
        assert_eq!(back.get_rgb(0, 0), Some((255, 0, 0)));
        assert_eq!(back.get_rgb(1, 0), Some((0, 128, 0)));
        assert_eq!(back.get_rgb(2, 0), Some((1, 2, 3)));
    }

    #[test]
    fn test_png_truncated() {
        let pix = Pix::new(4, 4, PixelDepth::Bit8).unwrap();
        let mut buf = Vec::new();
        write_png(&pix, &mut buf).unwrap();
        buf.truncate(20);
        assert!(read_png(Cursor::new(buf)).is_err());
    }
}
