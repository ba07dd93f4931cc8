//! Contours and arc length
//!
//! A [`Contour`] is the polyline of one external border, either with
//! every border pixel or compressed to the points where the chain
//! direction changes.

use crate::ccbord::{Border, BorderPoint, get_external_borders};
use crate::error::RegionResult;
use morphomoss_core::Pix;

/// How border pixels are turned into contour points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainApprox {
    /// Keep every border pixel
    None,
    /// Keep only the end points of straight horizontal, vertical and
    /// diagonal runs
    #[default]
    Simple,
}

/// The outline of one external component
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    points: Vec<BorderPoint>,
}

impl Contour {
    /// Build a contour from a traced border
    pub fn from_border(border: &Border, approx: ChainApprox) -> Self {
        let points = match approx {
            ChainApprox::None => border.points.clone(),
            ChainApprox::Simple => border.simplified(),
        };
        Self { points }
    }

    /// Contour points in traversal order
    pub fn points(&self) -> &[BorderPoint] {
        &self.points
    }

    /// Number of points
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the contour has no points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Polyline length; see [`arc_length`].
    pub fn arc_length(&self, closed: bool) -> f64 {
        arc_length(&self.points, closed)
    }
}

/// Sum of Euclidean distances between consecutive points
///
/// When `closed` is true the segment from the last point back to the
/// first is included. Fewer than two points give 0.
pub fn arc_length(points: &[BorderPoint], closed: bool) -> f64 {
    let open: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    match (closed, points.first(), points.last()) {
        (true, Some(&first), Some(&last)) if points.len() > 1 => open + last.distance(first),
        _ => open,
    }
}

/// Find the contours of all external components of a binary image
///
/// Accepts 1 bpp images, or 8 bpp images where any non-zero sample is
/// foreground. Components are 8-connected; a component inside a hole of
/// another is not reported. Contours are ordered by the raster position
/// of their topmost-leftmost pixel.
pub fn find_external_contours(pix: &Pix, approx: ChainApprox) -> RegionResult<Vec<Contour>> {
    let borders = get_external_borders(pix)?;
    Ok(borders
        .iter()
        .map(|b| Contour::from_border(b, approx))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphomoss_core::PixelDepth;
    use morphomoss_test::synth::binary_from_ascii;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_arc_length_open_and_closed() {
        let square: Vec<BorderPoint> = [(1, 1), (1, 3), (3, 3), (3, 1)]
            .iter()
            .map(|&(x, y)| BorderPoint::new(x, y))
            .collect();
        assert!((arc_length(&square, false) - 6.0).abs() < EPS);
        assert!((arc_length(&square, true) - 8.0).abs() < EPS);
        assert_eq!(arc_length(&[], true), 0.0);
        assert_eq!(arc_length(&[BorderPoint::new(4, 4)], true), 0.0);
    }

    #[test]
    fn test_square_contour() {
        let pix = binary_from_ascii(&[".....", ".###.", ".###.", ".###.", "....."]).unwrap();

        let simple = find_external_contours(&pix, ChainApprox::Simple).unwrap();
        assert_eq!(simple.len(), 1);
        assert_eq!(simple[0].len(), 4);
        assert!((simple[0].arc_length(false) - 6.0).abs() < EPS);

        let full = find_external_contours(&pix, ChainApprox::None).unwrap();
        assert_eq!(full[0].len(), 8);
        assert!((full[0].arc_length(false) - 7.0).abs() < EPS);
        assert!((full[0].arc_length(true) - 8.0).abs() < EPS);
    }

    #[test]
    fn test_diagonal_contour_length() {
        let pix = binary_from_ascii(&["#....", ".#...", "..#..", "...#.", "....#"]).unwrap();
        let contours = find_external_contours(&pix, ChainApprox::Simple).unwrap();
        assert_eq!(contours.len(), 1);
        let expected = 4.0 * std::f64::consts::SQRT_2;
        assert!((contours[0].arc_length(false) - expected).abs() < EPS);
    }

    #[test]
    fn test_single_pixel_contour() {
        let pix = binary_from_ascii(&["...", ".#.", "..."]).unwrap();
        let contours = find_external_contours(&pix, ChainApprox::Simple).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points(), &[BorderPoint::new(1, 1)]);
        assert_eq!(contours[0].arc_length(false), 0.0);
    }

    #[test]
    fn test_contour_order_and_empty_image() {
        let pix = binary_from_ascii(&["....#", ".....", "#...."]).unwrap();
        let contours = find_external_contours(&pix, ChainApprox::Simple).unwrap();
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].points()[0], BorderPoint::new(4, 0));
        assert_eq!(contours[1].points()[0], BorderPoint::new(0, 2));

        let blank = Pix::new(10, 10, PixelDepth::Bit1).unwrap();
        assert!(find_external_contours(&blank, ChainApprox::Simple)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rgb_rejected() {
        let pix = Pix::new(4, 4, PixelDepth::Bit32).unwrap();
        assert!(find_external_contours(&pix, ChainApprox::Simple).is_err());
    }
}
