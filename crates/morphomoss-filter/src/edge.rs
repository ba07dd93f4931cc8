//! Edge detection
//!
//! Two detectors produce binary edge maps (1 bpp, foreground = edge):
//!
//! - [`canny_edge`]: Sobel gradients, non-maximum suppression along the
//!   quantized gradient direction, and double-threshold hysteresis
//! - [`sobel_threshold`]: Sobel gradient magnitude above a single cutoff
//!
//! Gradients use the 3x3 Sobel operators with a replicated border and
//! the L1 magnitude `|gx| + |gy|`.

use crate::convolve::convolve_gray_raw;
use crate::{FilterError, FilterResult, Kernel};
use morphomoss_core::{Pix, PixelDepth};
use std::collections::VecDeque;

/// tan(22.5 deg) in Q15 fixed point
const TG22: i64 = 13573;

/// Per-pixel Sobel derivatives of an 8 bpp image.
#[derive(Debug, Clone)]
pub struct Gradients {
    width: u32,
    height: u32,
    gx: Vec<i32>,
    gy: Vec<i32>,
}

impl Gradients {
    /// L1 gradient magnitude at (x, y); 0 outside the image.
    #[inline]
    pub fn magnitude(&self, x: i64, y: i64) -> i32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0;
        }
        let i = (y as u32 * self.width + x as u32) as usize;
        self.gx[i].abs() + self.gy[i].abs()
    }
}

fn check_grayscale(pix: &Pix) -> FilterResult<()> {
    if pix.depth() != PixelDepth::Bit8 {
        return Err(FilterError::UnsupportedDepth {
            expected: "8-bpp grayscale",
            actual: pix.depth().bits(),
        });
    }
    Ok(())
}

/// Compute Sobel derivatives of an 8 bpp image.
pub fn sobel_gradients(pix: &Pix) -> FilterResult<Gradients> {
    check_grayscale(pix)?;
    let to_int = |v: Vec<f32>| v.into_iter().map(|s| s.round() as i32).collect::<Vec<_>>();
    let gx = to_int(convolve_gray_raw(pix, &Kernel::sobel_x())?);
    let gy = to_int(convolve_gray_raw(pix, &Kernel::sobel_y())?);
    Ok(Gradients {
        width: pix.width(),
        height: pix.height(),
        gx,
        gy,
    })
}

/// Binary edges where the L1 Sobel magnitude is at least `threshold`.
pub fn sobel_threshold(pix: &Pix, threshold: f32) -> FilterResult<Pix> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(FilterError::InvalidParameters(format!(
            "sobel threshold must be finite and >= 0, got {}",
            threshold
        )));
    }
    let grad = sobel_gradients(pix)?;
    let w = pix.width();
    let h = pix.height();

    let mut out = Pix::new(w, h, PixelDepth::Bit1)?.to_mut();
    out.copy_resolution_from(pix);
    for y in 0..h {
        for x in 0..w {
            if grad.magnitude(x as i64, y as i64) as f32 >= threshold {
                out.set_pixel_unchecked(x, y, 1);
            }
        }
    }
    Ok(out.into())
}

/// Hysteresis thresholds for [`canny_edge`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyParams {
    /// Magnitudes below this are never edges
    pub low_threshold: f32,
    /// Magnitudes at or above this seed edges
    pub high_threshold: f32,
}

impl Default for CannyParams {
    fn default() -> Self {
        Self {
            low_threshold: 50.0,
            high_threshold: 150.0,
        }
    }
}

impl CannyParams {
    /// Create parameters with explicit thresholds.
    pub fn new(low_threshold: f32, high_threshold: f32) -> Self {
        Self {
            low_threshold,
            high_threshold,
        }
    }

    /// Replace the low threshold.
    pub fn with_low_threshold(mut self, low: f32) -> Self {
        self.low_threshold = low;
        self
    }

    /// Replace the high threshold.
    pub fn with_high_threshold(mut self, high: f32) -> Self {
        self.high_threshold = high;
        self
    }

    /// Check that both thresholds are finite, non-negative and ordered.
    pub fn validate(&self) -> FilterResult<()> {
        let (low, high) = (self.low_threshold, self.high_threshold);
        if !low.is_finite() || !high.is_finite() || low < 0.0 || high < 0.0 {
            return Err(FilterError::InvalidParameters(format!(
                "canny thresholds must be finite and >= 0, got low={} high={}",
                low, high
            )));
        }
        if low > high {
            return Err(FilterError::InvalidParameters(format!(
                "canny low threshold {} exceeds high threshold {}",
                low, high
            )));
        }
        Ok(())
    }
}

/// Whether (x, y) is a local maximum across the gradient direction.
///
/// The direction is quantized to horizontal, vertical or one of the two
/// diagonals. Ties are broken toward the later neighbor so that a plateau
/// two pixels wide keeps exactly one pixel.
fn is_local_max(grad: &Gradients, x: u32, y: u32, m: i32) -> bool {
    let i = (y * grad.width + x) as usize;
    let (dx, dy) = (grad.gx[i], grad.gy[i]);
    let (xs, ys) = (dx.unsigned_abs() as i64, dy.unsigned_abs() as i64);
    let (x, y) = (x as i64, y as i64);

    let tg22x = xs * TG22;
    let yq = ys << 15;

    if yq < tg22x {
        m > grad.magnitude(x - 1, y) && m >= grad.magnitude(x + 1, y)
    } else {
        let tg67x = tg22x + (xs << 16);
        if yq > tg67x {
            m > grad.magnitude(x, y - 1) && m >= grad.magnitude(x, y + 1)
        } else {
            let s = if (dx ^ dy) < 0 { -1 } else { 1 };
            m > grad.magnitude(x - s, y - 1) && m > grad.magnitude(x + s, y + 1)
        }
    }
}

/// Keep weak candidates only when 8-connected to a strong one.
///
/// `candidates` holds the suppressed magnitude of each pixel (0 where
/// suppressed). Returns a row-major edge flag per pixel.
pub(crate) fn hysteresis(
    candidates: &[i32],
    width: u32,
    height: u32,
    low: f32,
    high: f32,
) -> Vec<bool> {
    let (w, h) = (width as i64, height as i64);
    let mut edges = vec![false; candidates.len()];
    let mut queue = VecDeque::new();

    for (i, &m) in candidates.iter().enumerate() {
        if m > 0 && m as f32 >= high {
            edges[i] = true;
            queue.push_back(i);
        }
    }

    while let Some(i) = queue.pop_front() {
        let (cx, cy) = ((i as i64) % w, (i as i64) / w);
        for ny in (cy - 1)..=(cy + 1) {
            for nx in (cx - 1)..=(cx + 1) {
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let j = (ny * w + nx) as usize;
                let m = candidates[j];
                if !edges[j] && m > 0 && m as f32 >= low {
                    edges[j] = true;
                    queue.push_back(j);
                }
            }
        }
    }

    edges
}

/// Apply Canny edge detection to an 8 bpp image.
///
/// A pixel is an edge when its L1 gradient magnitude is a local maximum
/// across the edge and either reaches `high_threshold`, or reaches
/// `low_threshold` and is 8-connected through such pixels to one that
/// reaches `high_threshold`.
///
/// # Errors
///
/// Returns [`FilterError::UnsupportedDepth`] for non-8 bpp input and
/// [`FilterError::InvalidParameters`] if the thresholds are invalid.
pub fn canny_edge(pix: &Pix, params: &CannyParams) -> FilterResult<Pix> {
    params.validate()?;
    let grad = sobel_gradients(pix)?;
    let w = pix.width();
    let h = pix.height();

    let mut candidates = vec![0i32; (w * h) as usize];
    for y in 0..h {
        for x in 0..w {
            let m = grad.magnitude(x as i64, y as i64);
            if m > 0 && m as f32 >= params.low_threshold && is_local_max(&grad, x, y, m) {
                candidates[(y * w + x) as usize] = m;
            }
        }
    }

    let edges = hysteresis(
        &candidates,
        w,
        h,
        params.low_threshold,
        params.high_threshold,
    );

    let mut out = Pix::new(w, h, PixelDepth::Bit1)?.to_mut();
    out.copy_resolution_from(pix);
    for (i, _) in edges.iter().enumerate().filter(|(_, e)| **e) {
        out.set_pixel_unchecked(i as u32 % w, i as u32 / w, 1);
    }
    Ok(out.into())
}

/// Choice of edge detector for the measurement pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeDetector {
    /// Canny with hysteresis thresholds
    Canny(CannyParams),
    /// Thresholded L1 Sobel magnitude
    Sobel {
        /// Minimum magnitude for an edge pixel
        threshold: f32,
    },
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::Canny(CannyParams::default())
    }
}

impl EdgeDetector {
    /// Check detector parameters without running it.
    pub fn validate(&self) -> FilterResult<()> {
        match self {
            Self::Canny(params) => params.validate(),
            Self::Sobel { threshold } if !threshold.is_finite() || *threshold < 0.0 => {
                Err(FilterError::InvalidParameters(format!(
                    "sobel threshold must be finite and >= 0, got {}",
                    threshold
                )))
            }
            Self::Sobel { .. } => Ok(()),
        }
    }

    /// Run the detector on an 8 bpp image, returning a 1 bpp edge map.
    pub fn detect(&self, pix: &Pix) -> FilterResult<Pix> {
        match self {
            Self::Canny(params) => canny_edge(pix, params),
            Self::Sobel { threshold } => sobel_threshold(pix, *threshold),
        }
    }

    /// Short lowercase name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Canny(_) => "canny",
            Self::Sobel { .. } => "sobel",
        }
    }
}
