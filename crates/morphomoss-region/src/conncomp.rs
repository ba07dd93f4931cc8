//! Connected component analysis
//!
//! Labels foreground regions of a binary image with a breadth-first
//! flood fill and classifies each region as external or enclosed.
//!
//! Foreground and background use complementary connectivity: with
//! 8-way foreground the background is 4-way, and the reverse. A region
//! is external when it touches the background that is connected to the
//! area outside the image.

use crate::error::{RegionError, RegionResult};
use morphomoss_core::{Pix, PixelDepth};
use std::collections::VecDeque;

/// Connectivity type for component analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityType {
    /// 4-way connectivity (up, down, left, right)
    #[default]
    FourWay,
    /// 8-way connectivity (includes diagonals)
    EightWay,
}

impl ConnectivityType {
    /// Neighbor offsets for this connectivity.
    pub fn offsets(self) -> &'static [(i64, i64)] {
        const FOUR: [(i64, i64); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];
        const EIGHT: [(i64, i64); 8] = [
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ];
        match self {
            Self::FourWay => &FOUR,
            Self::EightWay => &EIGHT,
        }
    }

    /// The connectivity used for the background when this one is used
    /// for the foreground.
    pub fn complement(self) -> Self {
        match self {
            Self::FourWay => Self::EightWay,
            Self::EightWay => Self::FourWay,
        }
    }
}

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    /// Left column
    pub x: u32,
    /// Top row
    pub y: u32,
    /// Width in pixels
    pub w: u32,
    /// Height in pixels
    pub h: u32,
}

/// A connected component in an image
#[derive(Debug, Clone)]
pub struct ConnectedComponent {
    /// Label, starting at 1 in raster order of first pixel
    pub label: u32,
    /// Number of pixels in this component
    pub pixel_count: u32,
    /// Bounding box of this component
    pub bounds: Bounds,
    /// Topmost, then leftmost, pixel
    pub first: (u32, u32),
    /// Whether the component touches the outside background
    pub external: bool,
}

/// Result of [`label_components`].
#[derive(Debug, Clone)]
pub struct ComponentLabels {
    width: u32,
    height: u32,
    labels: Vec<u32>,
    components: Vec<ConnectedComponent>,
}

impl ComponentLabels {
    /// Image width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Label at (x, y); 0 for background, `None` out of bounds.
    pub fn label_at(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.labels[(y * self.width + x) as usize])
    }

    /// All components in label order.
    pub fn components(&self) -> &[ConnectedComponent] {
        &self.components
    }

    /// Components not enclosed by any other component.
    pub fn external(&self) -> impl Iterator<Item = &ConnectedComponent> {
        self.components.iter().filter(|c| c.external)
    }
}

/// Foreground flags of a binary image, row-major.
///
/// 1 bpp images use the bit value; 8 bpp images treat any non-zero
/// sample as foreground.
pub(crate) fn foreground_mask(pix: &Pix) -> RegionResult<Vec<bool>> {
    match pix.depth() {
        PixelDepth::Bit1 | PixelDepth::Bit8 => {}
        d => {
            return Err(RegionError::UnsupportedDepth {
                expected: "1 or 8 bpp",
                actual: d.bits(),
            });
        }
    }
    let (w, h) = (pix.width(), pix.height());
    let mut mask = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        for x in 0..w {
            mask.push(pix.get_pixel_unchecked(x, y) != 0);
        }
    }
    Ok(mask)
}

/// Background pixels connected to the outside of the image.
fn outside_background(mask: &[bool], width: u32, height: u32, conn: ConnectivityType) -> Vec<bool> {
    let (w, h) = (width as i64, height as i64);
    let mut reached = vec![false; mask.len()];
    let mut queue = VecDeque::new();

    for y in 0..h {
        for x in 0..w {
            let on_frame = x == 0 || y == 0 || x == w - 1 || y == h - 1;
            let i = (y * w + x) as usize;
            if on_frame && !mask[i] {
                reached[i] = true;
                queue.push_back((x, y));
            }
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        for &(dx, dy) in conn.offsets() {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                continue;
            }
            let j = (ny * w + nx) as usize;
            if !mask[j] && !reached[j] {
                reached[j] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    reached
}

/// Label all connected components in a binary image
///
/// Components are numbered from 1 in raster order of their first pixel.
/// `connectivity` applies to the foreground; the background uses the
/// complement when deciding which components are external.
pub fn label_components(pix: &Pix, connectivity: ConnectivityType) -> RegionResult<ComponentLabels> {
    let mask = foreground_mask(pix)?;
    let (width, height) = (pix.width(), pix.height());
    let (w, h) = (width as i64, height as i64);
    let outside = outside_background(&mask, width, height, connectivity.complement());
    let bg_offsets = connectivity.complement().offsets();

    let mut labels = vec![0u32; mask.len()];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for sy in 0..h {
        for sx in 0..w {
            let si = (sy * w + sx) as usize;
            if !mask[si] || labels[si] != 0 {
                continue;
            }

            let label = components.len() as u32 + 1;
            labels[si] = label;
            queue.push_back((sx, sy));

            let (mut x0, mut y0, mut x1, mut y1) = (sx, sy, sx, sy);
            let mut count = 0u32;
            let mut external = false;

            while let Some((x, y)) = queue.pop_front() {
                count += 1;
                x0 = x0.min(x);
                x1 = x1.max(x);
                y0 = y0.min(y);
                y1 = y1.max(y);

                if !external {
                    external = bg_offsets.iter().any(|&(dx, dy)| {
                        let (nx, ny) = (x + dx, y + dy);
                        nx < 0 || ny < 0 || nx >= w || ny >= h || outside[(ny * w + nx) as usize]
                    });
                }

                for &(dx, dy) in connectivity.offsets() {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    let j = (ny * w + nx) as usize;
                    if mask[j] && labels[j] == 0 {
                        labels[j] = label;
                        queue.push_back((nx, ny));
                    }
                }
            }

            components.push(ConnectedComponent {
                label,
                pixel_count: count,
                bounds: Bounds {
                    x: x0 as u32,
                    y: y0 as u32,
                    w: (x1 - x0 + 1) as u32,
                    h: (y1 - y0 + 1) as u32,
                },
                first: (sx as u32, sy as u32),
                external,
            });
        }
    }

    Ok(ComponentLabels {
        width,
        height,
        labels,
        components,
    })
}
