//! BMP image format support
//!
//! Reads and writes uncompressed Windows Bitmap (BMP) files.
//!
//! Palette images (1, 4 and 8 bit) are expanded on read: an all-gray
//! palette yields an 8 bpp image, any other palette a 32 bpp RGB image.

use crate::{IoError, IoResult};
use morphomoss_core::{Pix, PixelDepth, color};
use std::io::{Read, Write};

/// BMP file header size
const BMP_FILE_HEADER_SIZE: usize = 14;

/// BMP info header size (BITMAPINFOHEADER)
const BMP_INFO_HEADER_SIZE: u32 = 40;

fn le_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Row stride in bytes; BMP rows are 4-byte aligned.
fn row_stride(width: u32, bits_per_pixel: u16) -> usize {
    (width as usize * bits_per_pixel as usize).div_ceil(32) * 4
}

/// Read a BMP image
pub fn read_bmp<R: Read>(mut reader: R) -> IoResult<Pix> {
    let mut file_header = [0u8; BMP_FILE_HEADER_SIZE];
    reader.read_exact(&mut file_header)?;

    if &file_header[0..2] != b"BM" {
        return Err(IoError::InvalidData("not a BMP file".to_string()));
    }
    let pixel_offset = le_u32(&file_header, 10) as usize;

    let mut info_header = [0u8; BMP_INFO_HEADER_SIZE as usize];
    reader.read_exact(&mut info_header)?;

    let header_size = le_u32(&info_header, 0);
    if header_size < BMP_INFO_HEADER_SIZE {
        return Err(IoError::InvalidData(format!(
            "unsupported BMP header size: {}",
            header_size
        )));
    }

    let width = le_u32(&info_header, 4) as i32;
    let height = le_u32(&info_header, 8) as i32;

    let planes = le_u16(&info_header, 12);
    if planes != 1 {
        return Err(IoError::InvalidData(format!(
            "unsupported number of planes: {}",
            planes
        )));
    }

    let bits_per_pixel = le_u16(&info_header, 14);
    let compression = le_u32(&info_header, 16);
    let colors_used = le_u32(&info_header, 32) as usize;

    // BI_RGB and BI_BITFIELDS with the default masks only
    if compression != 0 && compression != 3 {
        return Err(IoError::UnsupportedFormat(format!(
            "unsupported BMP compression: {}",
            compression
        )));
    }

    if width <= 0 || height == 0 {
        return Err(IoError::InvalidData(format!(
            "invalid BMP dimensions: {}x{}",
            width, height
        )));
    }
    let width = width.unsigned_abs();
    let top_down = height < 0;
    let height = height.unsigned_abs();

    if !matches!(bits_per_pixel, 1 | 4 | 8 | 24 | 32) {
        return Err(IoError::UnsupportedFormat(format!(
            "unsupported BMP bit depth: {}",
            bits_per_pixel
        )));
    }

    let mut consumed = BMP_FILE_HEADER_SIZE + BMP_INFO_HEADER_SIZE as usize;
    let extra = header_size as usize - BMP_INFO_HEADER_SIZE as usize;
    if extra > 0 {
        let mut skip = vec![0u8; extra];
        reader.read_exact(&mut skip)?;
        consumed += extra;
    }

    // Palette entries are stored as B, G, R, reserved
    let palette: Vec<(u8, u8, u8)> = if bits_per_pixel <= 8 {
        let max_colors = 1usize << bits_per_pixel;
        let num_colors = if colors_used == 0 {
            max_colors
        } else {
            colors_used.min(max_colors)
        };
        let mut raw = vec![0u8; num_colors * 4];
        reader.read_exact(&mut raw)?;
        consumed += raw.len();
        raw.chunks_exact(4).map(|c| (c[2], c[1], c[0])).collect()
    } else {
        Vec::new()
    };

    if pixel_offset > consumed {
        let mut skip = vec![0u8; pixel_offset - consumed];
        reader.read_exact(&mut skip)?;
    }

    let gray_palette = !palette.is_empty() && palette.iter().all(|&(r, g, b)| r == g && g == b);
    let (depth, spp) = if gray_palette {
        (PixelDepth::Bit8, 1)
    } else if bits_per_pixel == 32 {
        (PixelDepth::Bit32, 4)
    } else {
        (PixelDepth::Bit32, 3)
    };

    let pix = Pix::new(width, height, depth)?;
    let mut pix_mut = pix.try_into_mut().unwrap();
    pix_mut.set_spp(spp);

    let lookup = |index: u8| -> IoResult<(u8, u8, u8)> {
        palette.get(index as usize).copied().ok_or_else(|| {
            IoError::InvalidData(format!("BMP palette index {} out of range", index))
        })
    };

    let mut row_buffer = vec![0u8; row_stride(width, bits_per_pixel)];
    for row in 0..height {
        reader.read_exact(&mut row_buffer)?;
        let y = if top_down { row } else { height - 1 - row };

        for x in 0..width {
            let xi = x as usize;
            let val = match bits_per_pixel {
                1 | 4 | 8 => {
                    let index = match bits_per_pixel {
                        1 => (row_buffer[xi / 8] >> (7 - (xi % 8))) & 1,
                        4 => (row_buffer[xi / 2] >> (4 * (1 - xi % 2))) & 0xF,
                        _ => row_buffer[xi],
                    };
                    let (r, g, b) = lookup(index)?;
                    if gray_palette {
                        r as u32
                    } else {
                        color::compose_rgb(r, g, b)
                    }
                }
                24 => {
                    let p = &row_buffer[xi * 3..xi * 3 + 3];
                    color::compose_rgb(p[2], p[1], p[0])
                }
                _ => {
                    let p = &row_buffer[xi * 4..xi * 4 + 4];
                    color::compose_rgba(p[2], p[1], p[0], p[3])
                }
            };
            pix_mut.set_pixel_unchecked(x, y, val);
        }
    }

    Ok(pix_mut.into())
}

/// Write a BMP image
///
/// 1 bpp and 8 bpp are written as 8-bit with a gray palette (1 bpp
/// foreground white), 32 bpp as 24-bit BGR.
pub fn write_bmp<W: Write>(pix: &Pix, mut writer: W) -> IoResult<()> {
    let width = pix.width();
    let height = pix.height();

    let (bits_per_pixel, source) = match pix.depth() {
        PixelDepth::Bit1 | PixelDepth::Bit8 => (8u16, pix.convert_to_8()?),
        PixelDepth::Bit32 => (24u16, pix.clone()),
    };

    let stride = row_stride(width, bits_per_pixel);
    let pixel_data_size = stride * height as usize;
    let colormap_size = if bits_per_pixel == 8 { 256 * 4 } else { 0 };
    let pixel_offset = BMP_FILE_HEADER_SIZE + BMP_INFO_HEADER_SIZE as usize + colormap_size;
    let file_size = pixel_offset + pixel_data_size;

    let mut header = Vec::with_capacity(pixel_offset);
    header.extend_from_slice(b"BM");
    header.extend_from_slice(&(file_size as u32).to_le_bytes());
    header.extend_from_slice(&[0u8; 4]);
    header.extend_from_slice(&(pixel_offset as u32).to_le_bytes());

    header.extend_from_slice(&BMP_INFO_HEADER_SIZE.to_le_bytes());
    header.extend_from_slice(&(width as i32).to_le_bytes());
    header.extend_from_slice(&(height as i32).to_le_bytes()); // bottom-up
    header.extend_from_slice(&1u16.to_le_bytes());
    header.extend_from_slice(&bits_per_pixel.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&(pixel_data_size as u32).to_le_bytes());
    header.extend_from_slice(&[0u8; 16]); // resolution, colors used, important colors

    if bits_per_pixel == 8 {
        for v in 0..=255u8 {
            header.extend_from_slice(&[v, v, v, 0]);
        }
    }
    writer.write_all(&header)?;

    let mut row_buffer = vec![0u8; stride];
    for row in 0..height {
        let y = height - 1 - row;
        for x in 0..width {
            let val = source.get_pixel_unchecked(x, y);
            let xi = x as usize;
            if bits_per_pixel == 8 {
                row_buffer[xi] = val as u8;
            } else {
                let (r, g, b) = color::extract_rgb(val);
                row_buffer[xi * 3..xi * 3 + 3].copy_from_slice(&[b, g, r]);
            }
        }
        writer.write_all(&row_buffer)?;
    }

    Ok(())
}
