//! Rectangles in world (Web Mercator meters) and tile coordinate space.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::TileCoord;

/// An axis-aligned rectangle in Web Mercator meters.
///
/// The default value is empty: extending it by any point makes it cover that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Rect {
    fn default() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }
}

impl Rect {
    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// A rectangle covering a single point
    #[must_use]
    pub fn from_point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    /// A rectangle covering every point of the iterator, or an empty one
    pub fn from_points<I: IntoIterator<Item = [f64; 2]>>(points: I) -> Self {
        let mut rect = Self::default();
        for [x, y] in points {
            rect.extend_by_point(x, y);
        }
        rect
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn extend_by_point(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn extend(&mut self, other: &Self) {
        if !other.is_empty() {
            self.extend_by_point(other.min_x, other.min_y);
            self.extend_by_point(other.max_x, other.max_y);
        }
    }

    /// Grow the rectangle by `margin` on every side
    #[must_use]
    pub fn buffered(&self, margin: f64) -> Self {
        Self::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    /// Edges are inclusive, so rectangles that only touch are intersecting
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// A rectangular region in tile coordinate space.
///
/// The rectangle is inclusive of both min and max coordinates.
///
/// ```
/// # use mvtiler_tile_utils::TileRect;
/// let rect = TileRect::new(10, 0, 0, 255, 255);
/// assert_eq!(rect.size(), 256 * 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    /// The zoom level of the tiles
    pub zoom: u8,
    /// The minimum X coordinate (inclusive)
    pub min_x: u64,
    /// The minimum Y coordinate (inclusive)
    pub min_y: u64,
    /// The maximum X coordinate (inclusive)
    pub max_x: u64,
    /// The maximum Y coordinate (inclusive)
    pub max_y: u64,
}

impl Display for TileRect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: ({},{}) - ({},{})",
            self.zoom, self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl TileRect {
    /// # Panics
    ///
    /// Panics if `min_x > max_x` or `min_y > max_y`.
    #[must_use]
    pub fn new(zoom: u8, min_x: u64, min_y: u64, max_x: u64, max_y: u64) -> Self {
        assert!(min_x <= max_x);
        assert!(min_y <= max_y);
        TileRect {
            zoom,
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Total number of tiles contained in this rectangle.
    #[must_use]
    pub fn size(&self) -> u64 {
        (self.max_x - self.min_x + 1) * (self.max_y - self.min_y + 1)
    }

    #[must_use]
    pub fn contains(&self, xyz: TileCoord) -> bool {
        xyz.z == self.zoom
            && (self.min_x..=self.max_x).contains(&xyz.x)
            && (self.min_y..=self.max_y).contains(&xyz.y)
    }

    /// Iterate over all tiles in the rectangle, row by row
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + use<> {
        let Self {
            zoom,
            min_x,
            min_y,
            max_x,
            max_y,
        } = *self;
        (min_y..=max_y).flat_map(move |y| (min_x..=max_x).map(move |x| TileCoord::new(zoom, x, y)))
    }
}
