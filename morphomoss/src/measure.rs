//! Tooth length measurement pipeline
//!
//! ```text
//! image -> 8 bpp gray -> [contrast] -> [blur] -> edge map
//!       -> external contours -> open arc length / 2 per contour -> mean
//! ```
//!
//! # Length approximation
//!
//! Each contour of the edge map is the outline of one tooth. Half of the
//! outline's open arc length (the chain-simplified polyline without its
//! closing segment) is taken as the tooth length. For a long thin tooth
//! this is close to its length, but the dropped closing segment makes it
//! an underestimate that grows with the tooth's width. The value is a
//! proxy, not a skeleton length.

use morphomoss_core::Pix;
use morphomoss_filter::{
    CannyParams, EdgeDetector, FilterError, contrast_trc_pix, gaussian_blur,
};
use morphomoss_io::IoError;
use morphomoss_region::{ChainApprox, RegionError, find_external_contours};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from the measurement pipeline
#[derive(Debug, Error)]
pub enum MeasureError {
    /// The image could not be read or decoded
    #[error("could not load image from {path}: {source}")]
    Load {
        /// Path as given by the caller
        path: String,
        /// Underlying I/O or decode error
        #[source]
        source: IoError,
    },

    /// An intermediate image could not be written
    #[error("could not write image to {path}: {source}")]
    Save {
        /// Destination path
        path: String,
        /// Underlying I/O or encode error
        #[source]
        source: IoError,
    },

    /// The edge map has no contours to measure
    #[error("no teeth contours detected")]
    NoContours,

    /// Scale factor is zero, negative or not finite
    #[error("invalid scale factor {0}: must be a positive finite number")]
    InvalidScale(f64),

    /// Invalid detector or preprocessing option
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Filtering error
    #[error("edge detection failed: {0}")]
    Filter(#[from] FilterError),

    /// Contour extraction error
    #[error("contour extraction failed: {0}")]
    Region(#[from] RegionError),

    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] morphomoss_core::Error),
}

impl MeasureError {
    fn from_options(err: FilterError) -> Self {
        match err {
            FilterError::InvalidParameters(msg) | FilterError::InvalidKernel(msg) => {
                Self::InvalidParameter(msg)
            }
            other => Self::Filter(other),
        }
    }
}

/// Result type for measurement operations
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Gaussian noise reduction settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianBlur {
    /// Kernel half-size; the kernel is `2 * radius + 1` pixels square
    pub radius: u32,
    /// Standard deviation in pixels
    pub sigma: f32,
}

impl GaussianBlur {
    /// Blur with a radius of `ceil(3 * sigma)`, at least 1.
    pub fn from_sigma(sigma: f32) -> Self {
        let radius = if sigma.is_finite() && sigma > 0.0 {
            ((3.0 * sigma).ceil() as u32).max(1)
        } else {
            1
        };
        Self { radius, sigma }
    }
}

/// Optional image cleanup applied before edge detection.
///
/// Both steps are off by default.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PreprocessOptions {
    /// Contrast enhancement factor for the atan tone curve
    pub contrast: Option<f32>,
    /// Gaussian blur for noise reduction
    pub blur: Option<GaussianBlur>,
}

impl PreprocessOptions {
    /// Whether any preprocessing step is enabled.
    pub fn is_enabled(&self) -> bool {
        self.contrast.is_some() || self.blur.is_some()
    }

    /// Check preprocessing parameters.
    pub fn validate(&self) -> MeasureResult<()> {
        if let Some(factor) = self.contrast.filter(|f| !f.is_finite() || *f < 0.0) {
            return Err(MeasureError::InvalidParameter(format!(
                "contrast factor must be finite and >= 0, got {}",
                factor
            )));
        }
        if let Some(blur) = self
            .blur
            .filter(|b| !b.sigma.is_finite() || b.sigma <= 0.0 || b.radius == 0)
        {
            return Err(MeasureError::InvalidParameter(format!(
                "blur needs sigma > 0 and radius >= 1, got sigma={} radius={}",
                blur.sigma, blur.radius
            )));
        }
        Ok(())
    }
}

/// Default lower bound on a per-tooth length, in pixels.
///
/// Edge fragments of one or two pixels (per-tooth length below 1) are
/// dropped before averaging.
pub const DEFAULT_MIN_LENGTH_PX: f64 = 1.0;

/// Options for the measurement pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureOptions {
    /// Edge detector (default: Canny with thresholds 50 / 150)
    pub detector: EdgeDetector,
    /// Preprocessing before edge detection (default: none)
    pub preprocess: PreprocessOptions,
    /// Per-tooth lengths below this many pixels are ignored
    /// (default: [`DEFAULT_MIN_LENGTH_PX`]; 0 keeps every contour)
    pub min_length_px: f64,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            detector: EdgeDetector::default(),
            preprocess: PreprocessOptions::default(),
            min_length_px: DEFAULT_MIN_LENGTH_PX,
        }
    }
}

impl MeasureOptions {
    /// Use the given edge detector.
    pub fn with_detector(mut self, detector: EdgeDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Use Canny with the given thresholds.
    pub fn with_canny(self, params: CannyParams) -> Self {
        self.with_detector(EdgeDetector::Canny(params))
    }

    /// Use the given preprocessing.
    pub fn with_preprocess(mut self, preprocess: PreprocessOptions) -> Self {
        self.preprocess = preprocess;
        self
    }

    /// Ignore teeth shorter than `min_length_px`.
    pub fn with_min_length(mut self, min_length_px: f64) -> Self {
        self.min_length_px = min_length_px;
        self
    }

    /// Check all options.
    pub fn validate(&self) -> MeasureResult<()> {
        self.detector.validate().map_err(MeasureError::from_options)?;
        self.preprocess.validate()?;
        if !self.min_length_px.is_finite() || self.min_length_px < 0.0 {
            return Err(MeasureError::InvalidParameter(format!(
                "minimum length must be finite and >= 0, got {}",
                self.min_length_px
            )));
        }
        Ok(())
    }
}

/// Unit of a reported length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    /// Scaled by a micrometers-per-pixel factor
    Micrometers,
    /// Unscaled
    Pixels,
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Micrometers => "micrometers",
            Self::Pixels => "pixels",
        })
    }
}

/// Result of a measurement
#[derive(Debug, Clone, PartialEq)]
pub struct ToothMeasurement {
    /// Number of external contours in the edge map
    pub contour_count: usize,
    /// Per-tooth lengths in pixels that entered the mean, in contour order
    pub lengths_px: Vec<f64>,
    /// Mean tooth length in pixels
    pub mean_px: f64,
    /// Mean tooth length in `unit`
    pub value: f64,
    /// Unit of `value`
    pub unit: LengthUnit,
}

impl ToothMeasurement {
    /// Number of teeth that entered the mean.
    pub fn tooth_count(&self) -> usize {
        self.lengths_px.len()
    }
}

fn validate_scale(scale: Option<f64>) -> MeasureResult<()> {
    match scale {
        Some(s) if !s.is_finite() || s <= 0.0 => Err(MeasureError::InvalidScale(s)),
        _ => Ok(()),
    }
}

/// Load an image for measurement.
pub fn load_image<P: AsRef<Path>>(path: P) -> MeasureResult<Pix> {
    let path = path.as_ref();
    let pix = morphomoss_io::read_image(path).map_err(|source| MeasureError::Load {
        path: path.display().to_string(),
        source,
    })?;
    debug!(
        path = %path.display(),
        width = pix.width(),
        height = pix.height(),
        depth = pix.depth().bits(),
        "loaded image"
    );
    Ok(pix)
}

/// Run grayscale conversion, preprocessing and edge detection.
///
/// Returns a 1 bpp edge map the size of `pix`.
pub fn detect_edges(pix: &Pix, options: &MeasureOptions) -> MeasureResult<Pix> {
    options.validate()?;

    let mut gray = pix.convert_to_8()?;
    debug!(from_bpp = pix.depth().bits(), "converted to grayscale");

    if let Some(factor) = options.preprocess.contrast {
        gray = contrast_trc_pix(&gray, factor)?;
        debug!(factor, "applied contrast enhancement");
    }
    if let Some(blur) = options.preprocess.blur {
        gray = gaussian_blur(&gray, blur.radius, blur.sigma)?;
        debug!(radius = blur.radius, sigma = blur.sigma, "applied gaussian blur");
    }

    let edges = options.detector.detect(&gray)?;
    let edge_pixels = edges.count_pixels();
    debug!(detector = options.detector.name(), edge_pixels, "detected edges");
    if edge_pixels == 0 {
        warn!("edge map is empty");
    }
    Ok(edges)
}

/// Measure teeth on an existing 1 bpp edge map.
pub fn measure_edges(
    edges: &Pix,
    scale: Option<f64>,
    options: &MeasureOptions,
) -> MeasureResult<ToothMeasurement> {
    validate_scale(scale)?;

    let contours = find_external_contours(edges, ChainApprox::Simple)?;
    debug!(contours = contours.len(), "extracted external contours");

    let lengths_px: Vec<f64> = contours
        .iter()
        .map(|c| c.arc_length(false) / 2.0)
        .filter(|&len| len >= options.min_length_px)
        .collect();
    if lengths_px.len() < contours.len() {
        debug!(
            dropped = contours.len() - lengths_px.len(),
            min_length_px = options.min_length_px,
            "dropped short contours"
        );
    }
    if lengths_px.is_empty() {
        return Err(MeasureError::NoContours);
    }

    let mean_px = lengths_px.iter().sum::<f64>() / lengths_px.len() as f64;
    let (value, unit) = match scale {
        Some(s) => (mean_px * s, LengthUnit::Micrometers),
        None => (mean_px, LengthUnit::Pixels),
    };
    info!(
        teeth = lengths_px.len(),
        mean_px,
        value,
        unit = %unit,
        "measured tooth length"
    );

    Ok(ToothMeasurement {
        contour_count: contours.len(),
        lengths_px,
        mean_px,
        value,
        unit,
    })
}

/// Measure teeth in an in-memory image.
pub fn measure_pix(
    pix: &Pix,
    scale: Option<f64>,
    options: &MeasureOptions,
) -> MeasureResult<ToothMeasurement> {
    validate_scale(scale)?;
    let edges = detect_edges(pix, options)?;
    measure_edges(&edges, scale, options)
}

/// Measure teeth in an image file.
///
/// The scale factor is checked before the file is opened.
///
/// # Errors
///
/// - [`MeasureError::InvalidScale`] if `scale` is not positive and finite
/// - [`MeasureError::Load`] if the file cannot be read or decoded
/// - [`MeasureError::NoContours`] if no tooth outline is found
pub fn measure_teeth<P: AsRef<Path>>(
    path: P,
    scale: Option<f64>,
    options: &MeasureOptions,
) -> MeasureResult<ToothMeasurement> {
    validate_scale(scale)?;
    let pix = load_image(path)?;
    measure_pix(&pix, scale, options)
}

/// Average tooth length of an image file with default options.
///
/// Returns micrometers when `scale` (micrometers per pixel) is given,
/// pixels otherwise.
pub fn measure_tooth_length<P: AsRef<Path>>(path: P, scale: Option<f64>) -> MeasureResult<f64> {
    measure_teeth(path, scale, &MeasureOptions::default()).map(|m| m.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphomoss_core::PixelDepth;
    use morphomoss_test::synth;

    #[test]
    fn test_invalid_scale_checked_first() {
        for bad in [0.0, -1.5, f64::NAN, f64::INFINITY] {
            let err = measure_tooth_length("/nonexistent/teeth.png", Some(bad)).unwrap_err();
            assert!(matches!(err, MeasureError::InvalidScale(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = measure_tooth_length("/nonexistent/teeth.png", None).unwrap_err();
        assert!(matches!(err, MeasureError::Load { .. }));
        assert!(err.to_string().starts_with("could not load image from"));
    }

    #[test]
    fn test_blank_image_has_no_contours() {
        let pix = synth::blank(50, 50, 0).unwrap();
        let err = measure_pix(&pix, None, &MeasureOptions::default()).unwrap_err();
        assert!(matches!(err, MeasureError::NoContours));
        assert_eq!(err.to_string(), "no teeth contours detected");
    }

    #[test]
    fn test_measure_edges_exact() {
        // 3x3 outline: simplified open length 6, tooth length 3
        let edges = synth::binary_from_ascii(&[".....", ".###.", ".#.#.", ".###.", "....."]).unwrap();
        let m = measure_edges(&edges, None, &MeasureOptions::default()).unwrap();
        assert_eq!(m.contour_count, 1);
        assert_eq!(m.lengths_px, vec![3.0]);
        assert_eq!(m.value, 3.0);
        assert_eq!(m.unit, LengthUnit::Pixels);

        let scaled = measure_edges(&edges, Some(2.5), &MeasureOptions::default()).unwrap();
        assert_eq!(scaled.value, 7.5);
        assert_eq!(scaled.unit, LengthUnit::Micrometers);
    }

    #[test]
    fn test_min_length_filters_teeth() {
        // A single pixel (length 0) and a 5-pixel line (length 2)
        let edges = synth::binary_from_ascii(&["#......", ".......", ".#####."]).unwrap();
        let all_opts = MeasureOptions::default().with_min_length(0.0);
        let all = measure_edges(&edges, None, &all_opts).unwrap();
        assert_eq!(all.lengths_px, vec![0.0, 2.0]);
        assert_eq!(all.mean_px, 1.0);

        let long = measure_edges(&edges, None, &MeasureOptions::default()).unwrap();
        assert_eq!(long.contour_count, 2);
        assert_eq!(long.tooth_count(), 1);
        assert_eq!(long.mean_px, 2.0);

        let none = MeasureOptions::default().with_min_length(10.0);
        assert!(matches!(
            measure_edges(&edges, None, &none),
            Err(MeasureError::NoContours)
        ));
    }

    #[test]
    fn test_default_drops_edge_fragments() {
        // Two-pixel diagonal fragment (0.707) and a 7-pixel diagonal (4.243)
        let edges = synth::binary_from_ascii(&[
            "#.........",
            ".#........",
            "..........",
            "...#......",
            "....#.....",
            ".....#....",
            "......#...",
            ".......#..",
            "........#.",
            ".........#",
        ])
        .unwrap();
        let m = measure_edges(&edges, None, &MeasureOptions::default()).unwrap();
        assert_eq!(m.contour_count, 2);
        assert_eq!(m.tooth_count(), 1);
        assert!((m.mean_px - 3.0 * 2f64.sqrt()).abs() < 1e-9);

        let keep_all = MeasureOptions::default().with_min_length(0.0);
        let all = measure_edges(&edges, None, &keep_all).unwrap();
        assert_eq!(all.tooth_count(), 2);
        assert!(all.mean_px < m.mean_px);
    }

    #[test]
    fn test_invalid_options() {
        let pix = synth::blank(10, 10, 0).unwrap();
        let bad_canny = MeasureOptions::default().with_canny(CannyParams::new(200.0, 100.0));
        assert!(matches!(
            measure_pix(&pix, None, &bad_canny),
            Err(MeasureError::InvalidParameter(_))
        ));

        let bad_blur = MeasureOptions::default().with_preprocess(PreprocessOptions {
            contrast: None,
            blur: Some(GaussianBlur {
                radius: 2,
                sigma: 0.0,
            }),
        });
        assert!(matches!(
            measure_pix(&pix, None, &bad_blur),
            Err(MeasureError::InvalidParameter(_))
        ));

        let bad_min = MeasureOptions::default().with_min_length(-1.0);
        assert!(bad_min.validate().is_err());
    }

    #[test]
    fn test_blur_from_sigma() {
        assert_eq!(GaussianBlur::from_sigma(1.0).radius, 3);
        assert_eq!(GaussianBlur::from_sigma(0.2).radius, 1);
        assert!(!PreprocessOptions::default().is_enabled());
    }

    #[test]
    fn test_gray_and_rgb_agree() {
        let gray = synth::filled_rect(80, 60, 10, 20, 50, 12, 230, 20).unwrap();
        let rgb = gray.convert_8_to_32().unwrap();
        assert_eq!(rgb.depth(), PixelDepth::Bit32);

        let opts = MeasureOptions::default();
        let a = measure_pix(&gray, None, &opts).unwrap();
        let b = measure_pix(&rgb, None, &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_detect_edges_keeps_size() {
        let pix = synth::filled_rect(40, 30, 5, 5, 20, 10, 255, 0).unwrap();
        let edges = detect_edges(&pix, &MeasureOptions::default()).unwrap();
        assert_eq!(edges.depth(), PixelDepth::Bit1);
        assert_eq!((edges.width(), edges.height()), (40, 30));
        assert!(edges.count_pixels() > 0);
    }
}
