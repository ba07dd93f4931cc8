//! Synthetic test images
//!
//! Builders for the shapes the measurement tests need: flat fields,
//! bright bars and lines on a dark background, and binary masks drawn
//! from ASCII art.

use crate::{TestError, TestResult};
use morphomoss_core::{Pix, PixelDepth};

/// An 8 bpp image with every pixel set to `value`.
pub fn blank(width: u32, height: u32, value: u8) -> TestResult<Pix> {
    let mut pm = Pix::new(width, height, PixelDepth::Bit8)?.to_mut();
    if value != 0 {
        for y in 0..height {
            for x in 0..width {
                pm.set_pixel_unchecked(x, y, value as u32);
            }
        }
    }
    Ok(pm.into())
}

/// An 8 bpp image with an axis-aligned rectangle of `fg` on `bg`.
///
/// The rectangle covers columns `x..x + w` and rows `y..y + h`, clipped
/// to the image.
#[allow(clippy::too_many_arguments)]
pub fn filled_rect(
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    fg: u8,
    bg: u8,
) -> TestResult<Pix> {
    let pix = blank(width, height, bg)?;
    let mut pm = pix.try_into_mut().unwrap_or_else(|p| p.to_mut());
    for yy in y..(y + h).min(height) {
        for xx in x..(x + w).min(width) {
            pm.set_pixel_unchecked(xx, yy, fg as u32);
        }
    }
    Ok(pm.into())
}

/// An 8 bpp image with a thick straight segment of `fg` on black.
///
/// A pixel is painted when its center lies within `half_width` of the
/// segment from `from` to `to`.
pub fn thick_line(
    width: u32,
    height: u32,
    from: (f64, f64),
    to: (f64, f64),
    half_width: f64,
    fg: u8,
) -> TestResult<Pix> {
    if half_width < 0.0 {
        return Err(TestError::Fixture(format!(
            "half_width must be >= 0, got {}",
            half_width
        )));
    }
    let mut pm = Pix::new(width, height, PixelDepth::Bit8)?.to_mut();
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len2 = dx * dx + dy * dy;
    for y in 0..height {
        for x in 0..width {
            let (px, py) = (x as f64, y as f64);
            let t = if len2 == 0.0 {
                0.0
            } else {
                (((px - from.0) * dx + (py - from.1) * dy) / len2).clamp(0.0, 1.0)
            };
            let (cx, cy) = (from.0 + t * dx, from.1 + t * dy);
            if (px - cx).hypot(py - cy) <= half_width {
                pm.set_pixel_unchecked(x, y, fg as u32);
            }
        }
    }
    Ok(pm.into())
}

/// A 1 bpp mask drawn from ASCII rows.
///
/// `#` and `1` are foreground, every other character is background. All
/// rows must have the same length.
pub fn binary_from_ascii(rows: &[&str]) -> TestResult<Pix> {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |r| r.chars().count()) as u32;
    if rows.iter().any(|r| r.chars().count() as u32 != width) {
        return Err(TestError::Fixture("ragged ASCII mask".to_string()));
    }
    let mut pm = Pix::new(width, height, PixelDepth::Bit1)?.to_mut();
    for (y, row) in rows.iter().enumerate() {
        for (x, c) in row.chars().enumerate() {
            if c == '#' || c == '1' {
                pm.set_pixel_unchecked(x as u32, y as u32, 1);
            }
        }
    }
    Ok(pm.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_rect() {
        let pix = filled_rect(10, 10, 2, 3, 4, 2, 255, 10).unwrap();
        assert_eq!(pix.get_pixel(2, 3), Some(255));
        assert_eq!(pix.get_pixel(5, 4), Some(255));
        assert_eq!(pix.get_pixel(6, 4), Some(10));
        assert_eq!(pix.get_pixel(2, 5), Some(10));
    }

    #[test]
    fn test_thick_line_endpoints() {
        let pix = thick_line(20, 20, (2.0, 2.0), (17.0, 17.0), 1.0, 200).unwrap();
        assert_eq!(pix.get_pixel(2, 2), Some(200));
        assert_eq!(pix.get_pixel(10, 10), Some(200));
        assert_eq!(pix.get_pixel(17, 2), Some(0));
        assert!(thick_line(5, 5, (0.0, 0.0), (1.0, 1.0), -1.0, 1).is_err());
    }

    #[test]
    fn test_binary_from_ascii() {
        let pix = binary_from_ascii(&["..#", "##."]).unwrap();
        assert_eq!(pix.depth(), PixelDepth::Bit1);
        assert_eq!((pix.width(), pix.height()), (3, 2));
        assert_eq!(pix.count_pixels(), 3);
        assert_eq!(pix.get_pixel(2, 0), Some(1));
        assert!(binary_from_ascii(&["..", "..."]).is_err());
    }
}
