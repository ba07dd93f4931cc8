//! MorphoMoss - Peristome tooth length measurement
//!
//! Estimates the average length of moss peristome teeth from a
//! microscopy image. The pipeline converts the image to grayscale,
//! finds edges with Canny, traces the external contours of the edge
//! map and averages half of each contour's open arc length, ignoring
//! sub-pixel edge fragments. A scale factor in micrometers per pixel
//! converts the result to physical units.
//!
//! # Example
//!
//! ```
//! use morphomoss::{LengthUnit, MeasureOptions, Pix, PixelDepth, measure_pix};
//!
//! // A bright 40x8 bar on black
//! let mut pm = Pix::new(64, 32, PixelDepth::Bit8).unwrap().to_mut();
//! for y in 12..20 {
//!     for x in 12..52 {
//!         pm.set_pixel(x, y, 255).unwrap();
//!     }
//! }
//! let pix: Pix = pm.into();
//!
//! let m = measure_pix(&pix, Some(0.5), &MeasureOptions::default()).unwrap();
//! assert_eq!(m.unit, LengthUnit::Micrometers);
//! assert!(m.value > 0.0);
//! assert_eq!(m.value, m.mean_px * 0.5);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use morphomoss_core::*;

// Re-export stage crates as modules to avoid name conflicts
pub use morphomoss_filter as filter;
pub use morphomoss_io as io;
pub use morphomoss_region as region;

pub mod measure;

pub use measure::{
    DEFAULT_MIN_LENGTH_PX, GaussianBlur, LengthUnit, MeasureError, MeasureOptions, MeasureResult,
    PreprocessOptions, ToothMeasurement, detect_edges, load_image, measure_edges, measure_pix,
    measure_teeth, measure_tooth_length,
};
