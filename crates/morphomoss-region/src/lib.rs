//! morphomoss-region - Region processing for MorphoMoss
//!
//! This crate turns a binary edge map into measurable outlines:
//!
//! - **Connected component analysis** - labeling foreground regions and
//!   classifying them as external (not enclosed by another region)
//! - **Border tracing** - following the outer border of each external
//!   region pixel by pixel, with its chain code
//! - **Contours** - border polylines, optionally compressed to the
//!   points where the chain direction changes, and their arc length
//!
//! # Example
//!
//! ```
//! use morphomoss_core::{Pix, PixelDepth};
//! use morphomoss_region::{ChainApprox, find_external_contours};
//!
//! let mut pm = Pix::new(8, 3, PixelDepth::Bit1).unwrap().to_mut();
//! for x in 1..6 {
//!     pm.set_pixel(x, 1, 1).unwrap();
//! }
//! let pix: Pix = pm.into();
//!
//! let contours = find_external_contours(&pix, ChainApprox::Simple).unwrap();
//! assert_eq!(contours.len(), 1);
//! assert_eq!(contours[0].len(), 2);
//! assert_eq!(contours[0].arc_length(false), 4.0);
//! ```

pub mod ccbord;
pub mod conncomp;
pub mod contour;
mod error;

pub use ccbord::{
    Border, BorderPoint, Direction, get_external_borders, render_borders, trace_outer_border,
};
pub use conncomp::{
    Bounds, ComponentLabels, ConnectedComponent, ConnectivityType, label_components,
};
pub use contour::{ChainApprox, Contour, arc_length, find_external_contours};
pub use error::{RegionError, RegionResult};
