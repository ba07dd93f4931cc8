//! Contrast enhancement through tone reproduction curves
//!
//! A TRC is a 256-entry lookup table applied to every 8-bit sample.
//! [`contrast_trc`] builds an arctangent curve that stretches mid-tones
//! around 127, which makes faint tooth outlines stand out before edge
//! detection.

use crate::{FilterError, FilterResult};
use morphomoss_core::{Pix, PixMut, PixelDepth, color};

/// Steepness multiplier applied to the user contrast factor.
const ENHANCE_SCALE_FACTOR: f64 = 5.0;

/// A 256-entry lookup table for tone reproduction curve mapping.
///
/// Maps input pixel values [0..255] to output pixel values [0..255].
pub type TrcLut = [u8; 256];

/// Generate a contrast enhancement TRC lookup table.
///
/// `factor == 0.0` yields the identity. Larger factors give a steeper
/// curve; values around 0.5 to 1.0 are a moderate boost.
///
/// # Errors
///
/// Returns [`FilterError::InvalidParameters`] if `factor` is negative or
/// not finite.
pub fn contrast_trc(factor: f32) -> FilterResult<TrcLut> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(FilterError::InvalidParameters(format!(
            "contrast factor must be finite and >= 0.0, got {}",
            factor
        )));
    }

    let mut lut = [0u8; 256];

    if factor == 0.0 {
        for (i, entry) in lut.iter_mut().enumerate() {
            *entry = i as u8;
        }
        return Ok(lut);
    }

    let scale = ENHANCE_SCALE_FACTOR;
    let factor_d = factor as f64;
    let ymax = (1.0 * factor_d * scale).atan();
    let ymin = (-127.0 * factor_d * scale / 128.0).atan();
    let dely = ymax - ymin;

    for (i, entry) in lut.iter_mut().enumerate() {
        let x = i as f64;
        let val = (255.0 / dely) * (-ymin + (factor_d * scale * (x - 127.0) / 128.0).atan()) + 0.5;
        *entry = (val as i32).clamp(0, 255) as u8;
    }

    Ok(lut)
}

/// Apply a TRC lookup table in place.
///
/// 8 bpp samples are mapped directly; 32 bpp pixels have each color
/// channel mapped and alpha preserved.
pub fn trc_map(pix: &mut PixMut, lut: &TrcLut) -> FilterResult<()> {
    let w = pix.width();
    let h = pix.height();

    match pix.depth() {
        PixelDepth::Bit8 => {
            for y in 0..h {
                for x in 0..w {
                    let val = pix.get_pixel_unchecked(x, y) as usize;
                    pix.set_pixel_unchecked(x, y, lut[val] as u32);
                }
            }
        }
        PixelDepth::Bit32 => {
            for y in 0..h {
                for x in 0..w {
                    let pixel = pix.get_pixel_unchecked(x, y);
                    let (r, g, b) = color::extract_rgb(pixel);
                    let mapped = color::compose_rgba(
                        lut[r as usize],
                        lut[g as usize],
                        lut[b as usize],
                        color::alpha(pixel),
                    );
                    pix.set_pixel_unchecked(x, y, mapped);
                }
            }
        }
        d => {
            return Err(FilterError::UnsupportedDepth {
                expected: "8 or 32 bpp",
                actual: d.bits(),
            });
        }
    }

    Ok(())
}

/// Return a contrast-enhanced copy of an 8 or 32 bpp image.
pub fn contrast_trc_pix(pix: &Pix, factor: f32) -> FilterResult<Pix> {
    let lut = contrast_trc(factor)?;
    let mut pm = pix.to_mut();
    trc_map(&mut pm, &lut)?;
    Ok(pm.into())
}
