//! MorphoMoss Core - Basic data structures for image measurement
//!
//! This crate provides the image container shared by every stage of the
//! peristome measurement pipeline:
//!
//! - [`Pix`] / [`PixMut`] - The main image container (immutable / mutable)
//! - [`PixelDepth`] - Supported sample depths (1, 8 and 32 bpp)
//! - [`ImageFormat`] - Source file format recorded on loaded images
//!
//! Binary edge masks are 1 bpp images, grayscale intensity images are
//! 8 bpp, and color images are 32 bpp packed RGBA.

pub mod error;
pub mod pix;

pub use error::{Error, Result};
pub use pix::{ImageFormat, Pix, PixMut, PixelDepth};

/// Color channel helpers for 32-bit RGBA pixels.
///
/// # Pixel format
///
/// 32-bit pixels are stored as `0xRRGGBBAA` (red in MSB, alpha in LSB).
pub mod color {
    /// Shift amounts for extracting color channels
    pub const RED_SHIFT: u32 = 24;
    pub const GREEN_SHIFT: u32 = 16;
    pub const BLUE_SHIFT: u32 = 8;
    pub const ALPHA_SHIFT: u32 = 0;

    /// ITU-R BT.601 luma weight for red.
    pub const LUMA_RED_WEIGHT: f32 = 0.299;
    /// ITU-R BT.601 luma weight for green.
    pub const LUMA_GREEN_WEIGHT: f32 = 0.587;
    /// ITU-R BT.601 luma weight for blue.
    pub const LUMA_BLUE_WEIGHT: f32 = 0.114;

    /// Extract red component from a 32-bit pixel.
    #[inline]
    pub fn red(pixel: u32) -> u8 {
        ((pixel >> RED_SHIFT) & 0xff) as u8
    }

    /// Extract green component from a 32-bit pixel.
    #[inline]
    pub fn green(pixel: u32) -> u8 {
        ((pixel >> GREEN_SHIFT) & 0xff) as u8
    }

    /// Extract blue component from a 32-bit pixel.
    #[inline]
    pub fn blue(pixel: u32) -> u8 {
        ((pixel >> BLUE_SHIFT) & 0xff) as u8
    }

    /// Extract alpha component from a 32-bit pixel.
    #[inline]
    pub fn alpha(pixel: u32) -> u8 {
        ((pixel >> ALPHA_SHIFT) & 0xff) as u8
    }

    /// Compose a 32-bit RGB pixel (alpha = 255).
    #[inline]
    pub fn compose_rgb(r: u8, g: u8, b: u8) -> u32 {
        compose_rgba(r, g, b, 255)
    }

    /// Compose a 32-bit RGBA pixel.
    #[inline]
    pub fn compose_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
        ((r as u32) << RED_SHIFT)
            | ((g as u32) << GREEN_SHIFT)
            | ((b as u32) << BLUE_SHIFT)
            | ((a as u32) << ALPHA_SHIFT)
    }

    /// Extract RGB values from a 32-bit pixel.
    #[inline]
    pub fn extract_rgb(pixel: u32) -> (u8, u8, u8) {
        (red(pixel), green(pixel), blue(pixel))
    }

    /// Convert a CMYK sample to RGB.
    ///
    /// Each channel is `255 * (1 - ink) * (1 - k)`.
    #[inline]
    pub fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> (u8, u8, u8) {
        let k = 255 - k as u32;
        let channel = |ink: u8| ((255 - ink as u32) * k / 255) as u8;
        (channel(c), channel(m), channel(y))
    }

}
