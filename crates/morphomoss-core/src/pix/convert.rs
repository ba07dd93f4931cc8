//! Pixel depth conversions
//!
//! The measurement pipeline works on 8 bpp intensity images; these
//! functions bring any loaded image to that form.
//!
//! - 32 bpp RGB -> 8 bpp via weighted luminance
//! - 1 bpp binary -> 8 bpp (0 / 255)
//! - 8 bpp -> 8 bpp (shared, no copy)

use super::{Pix, PixelDepth};
use crate::color::{self, LUMA_BLUE_WEIGHT, LUMA_GREEN_WEIGHT, LUMA_RED_WEIGHT};
use crate::error::{Error, Result};

impl Pix {
    /// Convert any supported depth to 8 bpp grayscale.
    ///
    /// 8 bpp input is returned as a shared clone. 1 bpp maps 0 -> 0 and
    /// 1 -> 255. 32 bpp uses [`Pix::convert_rgb_to_luminance`].
    pub fn convert_to_8(&self) -> Result<Pix> {
        match self.depth() {
            PixelDepth::Bit8 => Ok(self.clone()),
            PixelDepth::Bit1 => self.convert_1_to_8(0, 255),
            PixelDepth::Bit32 => self.convert_rgb_to_luminance(),
        }
    }

    /// Convert 32 bpp RGB to 8 bpp grayscale using perceptual weights.
    ///
    /// Weights are ITU-R BT.601: 0.299 R + 0.587 G + 0.114 B.
    pub fn convert_rgb_to_luminance(&self) -> Result<Pix> {
        self.convert_rgb_to_gray(LUMA_RED_WEIGHT, LUMA_GREEN_WEIGHT, LUMA_BLUE_WEIGHT)
    }

    /// Convert 32 bpp RGB to 8 bpp grayscale with custom weights.
    ///
    /// Weights are normalized to sum to 1.0 if they don't already.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDepth`] if the image is not 32 bpp.
    /// Returns [`Error::InvalidParameter`] if any weight is negative or
    /// all are zero.
    pub fn convert_rgb_to_gray(&self, rwt: f32, gwt: f32, bwt: f32) -> Result<Pix> {
        if self.depth() != PixelDepth::Bit32 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        if rwt < 0.0 || gwt < 0.0 || bwt < 0.0 {
            return Err(Error::InvalidParameter("weights must all be >= 0.0".into()));
        }
        let sum = rwt + gwt + bwt;
        if sum <= 0.0 {
            return Err(Error::InvalidParameter("weights must not all be 0.0".into()));
        }
        let (rwt, gwt, bwt) = if (sum - 1.0).abs() > 0.0001 {
            (rwt / sum, gwt / sum, bwt / sum)
        } else {
            (rwt, gwt, bwt)
        };

        let w = self.width();
        let h = self.height();
        let mut result_mut = Pix::new(w, h, PixelDepth::Bit8)?.to_mut();
        result_mut.copy_resolution_from(self);

        for y in 0..h {
            for x in 0..w {
                let pixel = self.get_pixel_unchecked(x, y);
                let r = color::red(pixel) as f32;
                let g = color::green(pixel) as f32;
                let b = color::blue(pixel) as f32;
                let gray = (rwt * r + gwt * g + bwt * b + 0.5) as u32;
                result_mut.set_pixel_unchecked(x, y, gray.min(255));
            }
        }

        Ok(result_mut.into())
    }

    /// Convert 1 bpp to 8 bpp, mapping 0 to `val0` and 1 to `val1`.
    pub fn convert_1_to_8(&self, val0: u8, val1: u8) -> Result<Pix> {
        if self.depth() != PixelDepth::Bit1 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        let w = self.width();
        let h = self.height();
        let mut result_mut = Pix::new(w, h, PixelDepth::Bit8)?.to_mut();
        result_mut.copy_resolution_from(self);

        for y in 0..h {
            for x in 0..w {
                let v = if self.get_pixel_unchecked(x, y) != 0 {
                    val1
                } else {
                    val0
                };
                result_mut.set_pixel_unchecked(x, y, v as u32);
            }
        }

        Ok(result_mut.into())
    }

    /// Convert 8 bpp to 32 bpp gray RGB (R = G = B).
    pub fn convert_8_to_32(&self) -> Result<Pix> {
        if self.depth() != PixelDepth::Bit8 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        let w = self.width();
        let h = self.height();
        let mut result_mut = Pix::new(w, h, PixelDepth::Bit32)?.to_mut();
        result_mut.copy_resolution_from(self);

        for y in 0..h {
            for x in 0..w {
                let v = self.get_pixel_unchecked(x, y) as u8;
                result_mut.set_pixel_unchecked(x, y, color::compose_rgb(v, v, v));
            }
        }

        Ok(result_mut.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_rgb_to_luminance() {
        let mut pm = Pix::new(3, 1, PixelDepth::Bit32).unwrap().to_mut();
        pm.set_rgb(0, 0, 100, 100, 100).unwrap();
        pm.set_rgb(1, 0, 255, 0, 0).unwrap();
        pm.set_rgb(2, 0, 0, 255, 0).unwrap();
        let pix: Pix = pm.into();

        let gray = pix.convert_rgb_to_luminance().unwrap();
        assert_eq!(gray.depth(), PixelDepth::Bit8);
        assert_eq!(gray.width(), 3);
        assert_eq!(gray.get_pixel(0, 0), Some(100));
        // 0.299 * 255 + 0.5 = 76.7
        assert_eq!(gray.get_pixel(1, 0), Some(76));
        // 0.587 * 255 + 0.5 = 150.2
        assert_eq!(gray.get_pixel(2, 0), Some(150));
    }

    #[test]
    fn test_gray_equivalent_rgb_is_noop() {
        let mut pm = Pix::new(256, 1, PixelDepth::Bit32).unwrap().to_mut();
        for v in 0..256u32 {
            pm.set_rgb(v, 0, v as u8, v as u8, v as u8).unwrap();
        }
        let gray = Pix::from(pm).convert_to_8().unwrap();
        for v in 0..256u32 {
            assert_eq!(gray.get_pixel(v, 0), Some(v));
        }
    }

    #[test]
    fn test_convert_rgb_to_gray_custom_weights() {
        let mut pm = Pix::new(1, 1, PixelDepth::Bit32).unwrap().to_mut();
        pm.set_rgb(0, 0, 200, 100, 50).unwrap();
        let pix: Pix = pm.into();

        // Equal weights, unnormalized: (200 + 100 + 50) / 3 = 116.67
        let gray = pix.convert_rgb_to_gray(1.0, 1.0, 1.0).unwrap();
        assert_eq!(gray.get_pixel(0, 0), Some(117));
    }

    #[test]
    fn test_convert_rgb_to_gray_rejects_bad_input() {
        let pix8 = Pix::new(10, 10, PixelDepth::Bit8).unwrap();
        assert!(pix8.convert_rgb_to_luminance().is_err());

        let pix32 = Pix::new(10, 10, PixelDepth::Bit32).unwrap();
        assert!(pix32.convert_rgb_to_gray(-1.0, 1.0, 1.0).is_err());
        assert!(pix32.convert_rgb_to_gray(0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_convert_1_to_8() {
        let mut pm = Pix::new(2, 1, PixelDepth::Bit1).unwrap().to_mut();
        pm.set_pixel(1, 0, 1).unwrap();
        let gray = Pix::from(pm).convert_to_8().unwrap();
        assert_eq!(gray.get_pixel(0, 0), Some(0));
        assert_eq!(gray.get_pixel(1, 0), Some(255));
    }

    #[test]
    fn test_convert_8_shares_data() {
        let pix = Pix::new(4, 4, PixelDepth::Bit8).unwrap();
        let same = pix.convert_to_8().unwrap();
        assert_eq!(same.data().as_ptr(), pix.data().as_ptr());
    }

    #[test]
    fn test_convert_8_to_32_roundtrip_gray() {
        let mut pm = Pix::new(2, 1, PixelDepth::Bit8).unwrap().to_mut();
        pm.set_pixel(0, 0, 37).unwrap();
        pm.set_pixel(1, 0, 250).unwrap();
        let rgb = Pix::from(pm).convert_8_to_32().unwrap();
        assert_eq!(rgb.get_rgb(0, 0), Some((37, 37, 37)));
        let back = rgb.convert_to_8().unwrap();
        assert_eq!(back.get_pixel(1, 0), Some(250));
    }
}
