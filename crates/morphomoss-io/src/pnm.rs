//! PNM (Portable Any Map) format support
//!
//! Reads PBM, PGM and PPM in both the ASCII (P1/P2/P3) and binary
//! (P4/P5/P6) encodings, and writes the binary variants.
//!
//! PBM stores 1 as black. Bitmaps load as 8 bpp with black 0 and white
//! 255, and 1 bpp masks are written with their foreground white, so a
//! mask reads back the same way from PBM as from PNG or TIFF.

use crate::{IoError, IoResult};
use morphomoss_core::{Pix, PixelDepth, color};
use std::io::{BufRead, Read, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PnmKind {
    Bitmap,
    Graymap,
    Pixmap,
}

impl PnmKind {
    fn channels(self) -> usize {
        match self {
            Self::Pixmap => 3,
            _ => 1,
        }
    }
}

#[derive(Debug)]
struct PnmHeader {
    kind: PnmKind,
    ascii: bool,
    width: u32,
    height: u32,
    maxval: u32,
}

/// Read one byte, or `None` at end of input.
fn next_byte<R: BufRead>(reader: &mut R) -> IoResult<Option<u8>> {
    let mut byte = [0u8; 1];
    Ok((reader.read(&mut byte)? != 0).then_some(byte[0]))
}

/// Read the next whitespace-delimited header token, skipping comments.
fn read_token<R: BufRead>(reader: &mut R) -> IoResult<String> {
    let mut token = String::new();
    while let Some(c) = next_byte(reader)? {
        if c == b'#' && token.is_empty() {
            let mut comment = Vec::new();
            reader.read_until(b'\n', &mut comment)?;
            continue;
        }
        if c.is_ascii_whitespace() {
            if token.is_empty() {
                continue;
            }
            break;
        }
        token.push(c as char);
    }
    if token.is_empty() {
        return Err(IoError::InvalidData("truncated PNM data".to_string()));
    }
    Ok(token)
}

fn read_number<R: BufRead>(reader: &mut R, what: &str) -> IoResult<u32> {
    let token = read_token(reader)?;
    token
        .parse::<u32>()
        .map_err(|_| IoError::InvalidData(format!("invalid PNM {}: {:?}", what, token)))
}

/// Read one P1 digit. Digits need not be separated by whitespace.
fn read_ascii_bit<R: BufRead>(reader: &mut R) -> IoResult<u32> {
    while let Some(c) = next_byte(reader)? {
        match c {
            b'0' => return Ok(0),
            b'1' => return Ok(1),
            b'#' => {
                let mut comment = Vec::new();
                reader.read_until(b'\n', &mut comment)?;
            }
            c if c.is_ascii_whitespace() => {}
            other => {
                return Err(IoError::InvalidData(format!(
                    "invalid PBM digit: {:?}",
                    other as char
                )));
            }
        }
    }
    Err(IoError::InvalidData("truncated PNM data".to_string()))
}

fn read_header<R: BufRead>(reader: &mut R) -> IoResult<PnmHeader> {
    let magic = read_token(reader)?;
    let (kind, ascii) = match magic.as_str() {
        "P1" => (PnmKind::Bitmap, true),
        "P2" => (PnmKind::Graymap, true),
        "P3" => (PnmKind::Pixmap, true),
        "P4" => (PnmKind::Bitmap, false),
        "P5" => (PnmKind::Graymap, false),
        "P6" => (PnmKind::Pixmap, false),
        other => {
            return Err(IoError::UnsupportedFormat(format!(
                "unsupported PNM variant: {}",
                other
            )));
        }
    };

    let width = read_number(reader, "width")?;
    let height = read_number(reader, "height")?;
    let maxval = if kind == PnmKind::Bitmap {
        1
    } else {
        read_number(reader, "maxval")?
    };
    if maxval == 0 || maxval > 65535 {
        return Err(IoError::InvalidData(format!("invalid PNM maxval: {}", maxval)));
    }

    Ok(PnmHeader {
        kind,
        ascii,
        width,
        height,
        maxval,
    })
}

/// Fill `samples` with the raw values of one row.
fn read_row<R: BufRead>(
    reader: &mut R,
    header: &PnmHeader,
    samples: &mut [u32],
    bytes: &mut Vec<u8>,
) -> IoResult<()> {
    match (header.kind, header.ascii) {
        (PnmKind::Bitmap, true) => {
            for s in samples.iter_mut() {
                *s = read_ascii_bit(reader)?;
            }
        }
        (_, true) => {
            for s in samples.iter_mut() {
                *s = read_number(reader, "sample")?;
            }
        }
        (PnmKind::Bitmap, false) => {
            bytes.resize(header.width.div_ceil(8) as usize, 0);
            reader.read_exact(bytes)?;
            for (i, s) in samples.iter_mut().enumerate() {
                *s = ((bytes[i / 8] >> (7 - (i % 8))) & 1) as u32;
            }
        }
        (_, false) => {
            let wide = header.maxval > 255;
            let bytes_per_sample = if wide { 2 } else { 1 };
            bytes.resize(samples.len() * bytes_per_sample, 0);
            reader.read_exact(bytes)?;
            for (i, s) in samples.iter_mut().enumerate() {
                *s = if wide {
                    ((bytes[2 * i] as u32) << 8) | bytes[2 * i + 1] as u32
                } else {
                    bytes[i] as u32
                };
            }
        }
    }
    Ok(())
}

/// Read a PNM image (P1 to P6) from a reader.
///
/// # Returns
/// A `Pix` at 8 bpp (PBM, PGM) or 32 bpp (PPM). Samples with maxval
/// other than 255 are rescaled to 0..=255.
pub fn read_pnm<R: BufRead>(mut reader: R) -> IoResult<Pix> {
    let header = read_header(&mut reader)?;
    let (depth, spp) = match header.kind {
        PnmKind::Pixmap => (PixelDepth::Bit32, 3),
        _ => (PixelDepth::Bit8, 1),
    };

    let pix = Pix::new(header.width, header.height, depth)?;
    let mut pix_mut = pix.try_into_mut().unwrap();
    pix_mut.set_spp(spp);

    let maxval = header.maxval;
    let scale = |v: u32| -> u8 {
        if maxval == 255 {
            v.min(255) as u8
        } else {
            ((v.min(maxval) * 255 + maxval / 2) / maxval) as u8
        }
    };

    let channels = header.kind.channels();
    let mut samples = vec![0u32; header.width as usize * channels];
    let mut bytes = Vec::new();
    for y in 0..header.height {
        read_row(&mut reader, &header, &mut samples, &mut bytes)?;
        for (x, px) in samples.chunks_exact(channels).enumerate() {
            let val = match header.kind {
                PnmKind::Bitmap => {
                    if px[0] == 0 {
                        255
                    } else {
                        0
                    }
                }
                PnmKind::Graymap => scale(px[0]) as u32,
                PnmKind::Pixmap => color::compose_rgb(scale(px[0]), scale(px[1]), scale(px[2])),
            };
            pix_mut.set_pixel_unchecked(x as u32, y, val);
        }
    }

    Ok(pix_mut.into())
}

/// Write a `Pix` as binary PNM to a writer.
///
/// Chooses P4 (1 bpp), P5 (8 bpp grayscale), or P6 (32 bpp RGB)
/// based on the pixel depth. 1 bpp foreground pixels are written white.
pub fn write_pnm<W: Write>(pix: &Pix, mut writer: W) -> IoResult<()> {
    let width = pix.width();
    let height = pix.height();

    match pix.depth() {
        PixelDepth::Bit1 => write!(writer, "P4\n{} {}\n", width, height)?,
        PixelDepth::Bit8 => write!(writer, "P5\n{} {}\n255\n", width, height)?,
        PixelDepth::Bit32 => write!(writer, "P6\n{} {}\n255\n", width, height)?,
    }

    let row_bytes = match pix.depth() {
        PixelDepth::Bit1 => width.div_ceil(8) as usize,
        PixelDepth::Bit8 => width as usize,
        PixelDepth::Bit32 => width as usize * 3,
    };
    let mut row = vec![0u8; row_bytes];
    for y in 0..height {
        row.fill(0);
        for x in 0..width {
            let xi = x as usize;
            let val = pix.get_pixel_unchecked(x, y);
            match pix.depth() {
                PixelDepth::Bit1 => {
                    // PBM ink is black
                    if val == 0 {
                        row[xi / 8] |= 1 << (7 - (xi % 8));
                    }
                }
                PixelDepth::Bit8 => row[xi] = val as u8,
                PixelDepth::Bit32 => {
                    let (r, g, b) = color::extract_rgb(val);
                    row[xi * 3..xi * 3 + 3].copy_from_slice(&[r, g, b]);
                }
            }
        }
        writer.write_all(&row)?;
    }

    Ok(())
}
