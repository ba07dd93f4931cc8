//! Image convolution operations
//!
//! All convolutions replicate the border pixels.

use crate::{FilterError, FilterResult, Kernel};
use morphomoss_core::{Pix, PixelDepth};

fn check_grayscale(pix: &Pix) -> FilterResult<()> {
    if pix.depth() != PixelDepth::Bit8 {
        return Err(FilterError::UnsupportedDepth {
            expected: "8-bpp grayscale",
            actual: pix.depth().bits(),
        });
    }
    Ok(())
}

/// Correlate an 8-bit image with a kernel, keeping signed float output.
///
/// Returns one value per pixel in row-major order, without rounding or
/// clamping. Used where the sign of the response matters (gradients).
pub fn convolve_gray_raw(pix: &Pix, kernel: &Kernel) -> FilterResult<Vec<f32>> {
    check_grayscale(pix)?;

    let w = pix.width();
    let h = pix.height();
    let kw = kernel.width();
    let kh = kernel.height();
    let kcx = kernel.center_x() as i32;
    let kcy = kernel.center_y() as i32;

    let mut out = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f32;

            for ky in 0..kh {
                for kx in 0..kw {
                    let sx = x as i32 + (kx as i32 - kcx);
                    let sy = y as i32 + (ky as i32 - kcy);

                    // Clamp to image boundaries (replicate border)
                    let sx = sx.clamp(0, w as i32 - 1) as u32;
                    let sy = sy.clamp(0, h as i32 - 1) as u32;

                    let pixel = pix.get_pixel_unchecked(sx, sy) as f32;
                    let k = kernel.get(kx, ky).unwrap_or(0.0);
                    sum += pixel * k;
                }
            }

            out.push(sum);
        }
    }

    Ok(out)
}

/// Convolve an 8-bit grayscale image with a kernel
///
/// Output values are rounded and clamped to 0..=255.
pub fn convolve_gray(pix: &Pix, kernel: &Kernel) -> FilterResult<Pix> {
    let raw = convolve_gray_raw(pix, kernel)?;

    let w = pix.width();
    let out_pix = Pix::new(w, pix.height(), PixelDepth::Bit8)?;
    let mut out_mut = out_pix.try_into_mut().unwrap();
    out_mut.copy_resolution_from(pix);

    for (i, sum) in raw.into_iter().enumerate() {
        let result = sum.round().clamp(0.0, 255.0) as u32;
        out_mut.set_pixel_unchecked(i as u32 % w, i as u32 / w, result);
    }

    Ok(out_mut.into())
}

/// Apply Gaussian blur
///
/// The kernel is `(2 * radius + 1)` pixels square.
pub fn gaussian_blur(pix: &Pix, radius: u32, sigma: f32) -> FilterResult<Pix> {
    let size = 2 * radius + 1;
    let kernel = Kernel::gaussian(size, sigma)?;
    convolve_gray(pix, &kernel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(w: u32, h: u32, f: impl Fn(u32, u32) -> u32) -> Pix {
        let mut pm = Pix::new(w, h, PixelDepth::Bit8).unwrap().to_mut();
        for y in 0..h {
            for x in 0..w {
                pm.set_pixel_unchecked(x, y, f(x, y));
            }
        }
        pm.into()
    }

    #[test]
    fn test_blur_preserves_flat_image() {
        let pix = gray(8, 8, |_, _| 77);
        let out = gaussian_blur(&pix, 2, 1.0).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(out.get_pixel(x, y), Some(77));
            }
        }
    }

    #[test]
    fn test_blur_spreads_impulse() {
        let pix = gray(9, 9, |x, y| if x == 4 && y == 4 { 255 } else { 0 });
        let out = gaussian_blur(&pix, 1, 1.0).unwrap();
        let center = out.get_pixel(4, 4).unwrap();
        let side = out.get_pixel(5, 4).unwrap();
        assert!(center < 255);
        assert!(side > 0 && side < center);
        assert_eq!(out.get_pixel(0, 0), Some(0));
    }

    #[test]
    fn test_raw_sobel_keeps_sign() {
        let pix = gray(4, 3, |x, _| if x >= 2 { 100 } else { 0 });
        let gx = convolve_gray_raw(&pix, &Kernel::sobel_x()).unwrap();
        // Row 1, column 1: right column is 100, left column is 0
        assert_eq!(gx[4 + 1], 400.0);
        let flipped = gray(4, 3, |x, _| if x >= 2 { 0 } else { 100 });
        let gx = convolve_gray_raw(&flipped, &Kernel::sobel_x()).unwrap();
        assert_eq!(gx[4 + 1], -400.0);
    }

    #[test]
    fn test_rejects_non_gray() {
        let pix = Pix::new(4, 4, PixelDepth::Bit32).unwrap();
        assert!(matches!(
            gaussian_blur(&pix, 1, 1.0),
            Err(FilterError::UnsupportedDepth { actual: 32, .. })
        ));
    }
}
