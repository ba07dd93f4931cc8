//! Border tracing for connected components
//!
//! Follows the outer border of each external 8-connected component with
//! the Suzuki-Abe border-following rule. The trace visits border pixels
//! counter-clockwise (as seen on screen, y pointing down), starting at
//! the topmost-leftmost pixel, and records the chain code of every step.

use crate::conncomp::{ConnectivityType, foreground_mask, label_components};
use crate::error::{RegionError, RegionResult};
use morphomoss_core::{Pix, PixelDepth};

/// Direction for border traversal (8-connected, clockwise from West)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// West (-1, 0)
    West = 0,
    /// Northwest (-1, -1)
    NorthWest = 1,
    /// North (0, -1)
    North = 2,
    /// Northeast (1, -1)
    NorthEast = 3,
    /// East (1, 0)
    East = 4,
    /// Southeast (1, 1)
    SouthEast = 5,
    /// South (0, 1)
    South = 6,
    /// Southwest (-1, 1)
    SouthWest = 7,
}

impl Direction {
    /// Get the x offset for this direction
    #[inline]
    pub fn dx(self) -> i32 {
        XPOSTAB[self as usize]
    }

    /// Get the y offset for this direction
    #[inline]
    pub fn dy(self) -> i32 {
        YPOSTAB[self as usize]
    }

    #[inline]
    fn from_index(idx: usize) -> Self {
        match idx % 8 {
            0 => Direction::West,
            1 => Direction::NorthWest,
            2 => Direction::North,
            3 => Direction::NorthEast,
            4 => Direction::East,
            5 => Direction::SouthEast,
            6 => Direction::South,
            _ => Direction::SouthWest,
        }
    }

    /// Next direction clockwise (on screen)
    #[inline]
    pub fn clockwise(self) -> Self {
        Self::from_index(self as usize + 1)
    }

    /// Next direction counter-clockwise (on screen)
    #[inline]
    pub fn counter_clockwise(self) -> Self {
        Self::from_index(self as usize + 7)
    }

    /// Reverse direction
    #[inline]
    pub fn opposite(self) -> Self {
        Self::from_index(self as usize + 4)
    }
}

/// X offset for each direction
const XPOSTAB: [i32; 8] = [-1, -1, 0, 1, 1, 1, 0, -1];

/// Y offset for each direction
const YPOSTAB: [i32; 8] = [0, -1, -1, -1, 0, 1, 1, 1];

/// A point on a border
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BorderPoint {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl BorderPoint {
    /// Create a new border point
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move in the given direction
    #[inline]
    pub fn moved(self, dir: Direction) -> Self {
        Self {
            x: self.x + dir.dx(),
            y: self.y + dir.dy(),
        }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(self, other: BorderPoint) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx.hypot(dy)
    }
}

impl From<(i32, i32)> for BorderPoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl From<(u32, u32)> for BorderPoint {
    fn from((x, y): (u32, u32)) -> Self {
        Self::new(x as i32, y as i32)
    }
}

/// The traced outer border of one component
#[derive(Debug, Clone, Default)]
pub struct Border {
    /// Starting point (topmost-leftmost pixel of the component)
    pub start: BorderPoint,
    /// Every border pixel in traversal order
    pub points: Vec<BorderPoint>,
    /// Step taken from each point to the next; same length as `points`
    pub chain_code: Vec<Direction>,
    /// Direction from the start to the first neighbor found by the
    /// clockwise search; `None` for an isolated pixel
    pub first_step: Option<Direction>,
}

impl Border {
    /// Get the number of points in this border
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the border is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keep only the points where the chain direction changes.
    ///
    /// Straight horizontal, vertical and diagonal runs collapse to their
    /// end points. The first point is kept unless the trace enters it
    /// moving in the direction it leaves.
    pub fn simplified(&self) -> Vec<BorderPoint> {
        let Some(first) = self.first_step else {
            return self.points.clone();
        };

        let mut prev = first.opposite();
        let mut out = Vec::new();
        for (&p, &dir) in self.points.iter().zip(&self.chain_code) {
            if dir != prev {
                out.push(p);
                prev = dir;
            }
        }
        out
    }
}

/// Trace the outer border of the component containing `start`.
///
/// `mask` holds the row-major foreground flags of a `width` x `height`
/// image; pixels outside the image count as background. `start` must be
/// the topmost-leftmost pixel of its component.
pub fn trace_outer_border(
    mask: &[bool],
    width: u32,
    height: u32,
    start: BorderPoint,
) -> RegionResult<Border> {
    if mask.len() != (width as usize) * (height as usize) {
        return Err(RegionError::InvalidParameters(format!(
            "mask has {} entries for a {}x{} image",
            mask.len(),
            width,
            height
        )));
    }

    let fg = |p: BorderPoint| {
        p.x >= 0
            && p.y >= 0
            && (p.x as u32) < width
            && (p.y as u32) < height
            && mask[p.y as usize * width as usize + p.x as usize]
    };

    if !fg(start) {
        return Err(RegionError::InvalidParameters(format!(
            "start point ({}, {}) is not foreground",
            start.x, start.y
        )));
    }

    // Clockwise search around the start for the first neighbor
    let mut s = Direction::West;
    loop {
        s = s.clockwise();
        if s == Direction::West {
            return Ok(Border {
                start,
                points: vec![start],
                chain_code: Vec::new(),
                first_step: None,
            });
        }
        if fg(start.moved(s)) {
            break;
        }
    }

    let first_step = s;
    let p1 = start.moved(s);
    let mut p3 = start;
    let mut points = Vec::new();
    let mut chain_code = Vec::new();

    loop {
        let mut d = s;
        let p4 = loop {
            d = d.counter_clockwise();
            let p4 = p3.moved(d);
            if fg(p4) {
                break p4;
            }
        };
        s = d;

        points.push(p3);
        chain_code.push(s);

        if p4 == start && p3 == p1 {
            break;
        }
        p3 = p4;
        s = s.opposite();
    }

    Ok(Border {
        start,
        points,
        chain_code,
        first_step: Some(first_step),
    })
}

/// Get the outer borders of all external components.
///
/// Components are 8-connected. A component lying inside a hole of
/// another component is skipped. Borders are returned in raster order
/// of their start points.
pub fn get_external_borders(pix: &Pix) -> RegionResult<Vec<Border>> {
    let labels = label_components(pix, ConnectivityType::EightWay)?;
    let mask = foreground_mask(pix)?;

    labels
        .external()
        .map(|c| trace_outer_border(&mask, pix.width(), pix.height(), c.first.into()))
        .collect()
}

/// Render borders into a 1 bpp image of the given size
///
/// Points outside the image are ignored.
pub fn render_borders(borders: &[Border], width: u32, height: u32) -> RegionResult<Pix> {
    let pix = Pix::new(width, height, PixelDepth::Bit1)?;
    let mut pix_mut = pix.try_into_mut().unwrap();

    for p in borders.iter().flat_map(|b| &b.points) {
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
            pix_mut.set_pixel_unchecked(p.x as u32, p.y as u32, 1);
        }
    }

    Ok(pix_mut.into())
}
