//! Convolution kernels
//!
//! Defines the kernel structure used by [`crate::convolve`] and the
//! fixed Sobel operators used for gradient estimation.

use crate::{FilterError, FilterResult};

/// A 2D convolution kernel
///
/// Values are stored in row-major order. The center is the kernel cell
/// aligned with the output pixel.
#[derive(Debug, Clone)]
pub struct Kernel {
    /// Width of the kernel
    width: u32,
    /// Height of the kernel
    height: u32,
    /// X coordinate of the center
    cx: u32,
    /// Y coordinate of the center
    cy: u32,
    /// Kernel data (row-major order)
    data: Vec<f32>,
}

impl Kernel {
    /// Create a zero-filled kernel with the center in the middle.
    pub fn new(width: u32, height: u32) -> FilterResult<Self> {
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "kernel dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            cx: width / 2,
            cy: height / 2,
            data: vec![0.0; (width * height) as usize],
        })
    }

    /// Create a kernel from a slice of row-major values.
    pub fn from_slice(width: u32, height: u32, data: &[f32]) -> FilterResult<Self> {
        let mut kernel = Self::new(width, height)?;
        if data.len() != kernel.data.len() {
            return Err(FilterError::InvalidKernel(format!(
                "expected {} values, got {}",
                kernel.data.len(),
                data.len()
            )));
        }
        kernel.data.copy_from_slice(data);
        Ok(kernel)
    }

    /// Create a normalized Gaussian kernel.
    ///
    /// `size` must be odd; `sigma` must be positive and finite.
    pub fn gaussian(size: u32, sigma: f32) -> FilterResult<Self> {
        if size == 0 || size % 2 == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "gaussian size must be odd, got {}",
                size
            )));
        }
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(FilterError::InvalidParameters(format!(
                "sigma must be > 0, got {}",
                sigma
            )));
        }

        let mut kernel = Self::new(size, size)?;
        let c = (size / 2) as f32;
        let denom = 2.0 * sigma * sigma;
        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 - c;
                let dy = y as f32 - c;
                kernel.set(x, y, (-(dx * dx + dy * dy) / denom).exp());
            }
        }
        kernel.normalize();
        Ok(kernel)
    }

    /// Sobel operator for the horizontal derivative (right minus left).
    pub fn sobel_x() -> Self {
        Self {
            width: 3,
            height: 3,
            cx: 1,
            cy: 1,
            data: vec![-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0],
        }
    }

    /// Sobel operator for the vertical derivative (below minus above).
    pub fn sobel_y() -> Self {
        Self {
            width: 3,
            height: 3,
            cx: 1,
            cy: 1,
            data: vec![-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0],
        }
    }

    /// Get the kernel width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the kernel height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the center X coordinate.
    #[inline]
    pub fn center_x(&self) -> u32 {
        self.cx
    }

    /// Get the center Y coordinate.
    #[inline]
    pub fn center_y(&self) -> u32 {
        self.cy
    }

    /// Set the center coordinates.
    pub fn set_center(&mut self, cx: u32, cy: u32) -> FilterResult<()> {
        if cx >= self.width || cy >= self.height {
            return Err(FilterError::InvalidKernel(format!(
                "center ({}, {}) outside {}x{} kernel",
                cx, cy, self.width, self.height
            )));
        }
        self.cx = cx;
        self.cy = cy;
        Ok(())
    }

    /// Get the kernel data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Get a value at (x, y).
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[(y * self.width + x) as usize])
    }

    /// Set a value at (x, y). Out-of-range positions are ignored.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = value;
        }
    }

    /// Normalize the kernel so that values sum to 1.
    ///
    /// A kernel summing to zero is left unchanged.
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum.abs() > f32::EPSILON {
            self.data.iter_mut().for_each(|v| *v /= sum);
        }
    }

    /// Get the sum of all kernel values.
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_is_normalized_and_symmetric() {
        let k = Kernel::gaussian(5, 1.2).unwrap();
        assert!((k.sum() - 1.0).abs() < 1e-5);
        assert_eq!(k.center_x(), 2);
        assert_eq!(k.get(0, 2), k.get(4, 2));
        assert!(k.get(2, 2).unwrap() > k.get(1, 2).unwrap());
    }

    #[test]
    fn test_gaussian_rejects_bad_input() {
        assert!(Kernel::gaussian(4, 1.0).is_err());
        assert!(Kernel::gaussian(3, 0.0).is_err());
        assert!(Kernel::gaussian(3, f32::NAN).is_err());
    }

    #[test]
    fn test_sobel_kernels_sum_to_zero() {
        assert_eq!(Kernel::sobel_x().sum(), 0.0);
        assert_eq!(Kernel::sobel_y().sum(), 0.0);
        assert_eq!(Kernel::sobel_x().get(2, 1), Some(2.0));
        assert_eq!(Kernel::sobel_y().get(1, 0), Some(-2.0));
    }

    #[test]
    fn test_from_slice_and_center() {
        let mut k = Kernel::from_slice(2, 1, &[0.5, 0.5]).unwrap();
        assert_eq!(k.center_x(), 1);
        k.set_center(0, 0).unwrap();
        assert_eq!(k.center_x(), 0);
        assert!(k.set_center(2, 0).is_err());
        assert!(Kernel::from_slice(2, 2, &[1.0]).is_err());
        assert!(Kernel::new(0, 3).is_err());
    }
}
