//! morphomoss-filter - Image filtering operations
//!
//! This crate provides the image operations that turn a grayscale
//! micrograph into a binary edge map:
//!
//! - Convolution with arbitrary kernels and Gaussian blur
//! - Contrast enhancement through an arctangent tone curve
//! - Sobel gradients and thresholded Sobel edges
//! - Canny edge detection with hysteresis thresholds

pub mod convolve;
pub mod edge;
pub mod enhance;
mod error;
pub mod kernel;

pub use error::{FilterError, FilterResult};
pub use kernel::Kernel;

// Re-export commonly used functions
pub use convolve::{convolve_gray, convolve_gray_raw, gaussian_blur};
pub use edge::{
    CannyParams, EdgeDetector, Gradients, canny_edge, sobel_gradients, sobel_threshold,
};
pub use enhance::{TrcLut, contrast_trc, contrast_trc_pix, trc_map};
