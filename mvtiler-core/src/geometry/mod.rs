use enum_display::EnumDisplay;
use serde::{Deserialize, Serialize};

mod clip;
pub use clip::{ClippedLines, clip_line, clip_ring};

mod projector;
pub use projector::{TileContext, TileProjector};

mod simplify;
pub use simplify::simplify;

/// Integer point in tile-local pixel space, with `y` growing downwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePoint {
    /// Column in pixels
    pub x: i32,
    /// Row in pixels
    pub y: i32,
}

impl TilePoint {
    /// Creates a new point
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for TilePoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Projected pixel position before clipping.
///
/// At high zoom levels a feature far away from the tile lands billions of pixels
/// outside of it, so paths keep 64-bit coordinates until clipping brings them
/// back into the tile's padded viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    /// Column in pixels
    pub x: i64,
    /// Row in pixels
    pub y: i64,
}

impl PixelPoint {
    /// Creates a new point
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl From<TilePoint> for PixelPoint {
    fn from(p: TilePoint) -> Self {
        Self::new(i64::from(p.x), i64::from(p.y))
    }
}

/// Padded tile viewport used for clipping. All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipRect {
    /// Left edge
    pub x_min: i32,
    /// Right edge
    pub x_max: i32,
    /// Top edge (smallest row)
    pub y_min: i32,
    /// Bottom edge (largest row)
    pub y_max: i32,
}

impl ClipRect {
    /// Creates a clip rectangle from explicit bounds
    #[must_use]
    pub const fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// The tile's pixel square `0..=tile_size` grown by `margin` pixels on every side
    #[must_use]
    pub fn for_tile(tile_size: u32, margin: u32) -> Self {
        let size = tile_size as i32;
        let margin = margin as i32;
        Self::new(-margin, size + margin, -margin, size + margin)
    }

    /// True if the point lies inside the rectangle or on its edge
    #[must_use]
    pub fn contains(&self, p: TilePoint) -> bool {
        (self.x_min..=self.x_max).contains(&p.x) && (self.y_min..=self.y_max).contains(&p.y)
    }
}

/// Geometry type of a feature, with the same numbering as the MVT `GeomType`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumDisplay, Serialize, Deserialize,
)]
#[enum_display(case = "Kebab")]
#[serde(rename_all = "kebab-case")]
pub enum GeometryKind {
    /// Not emitted into tiles
    #[default]
    Unknown = 0,
    /// One or more points
    Point = 1,
    /// One or more line strings
    LineString = 2,
    /// One or more rings
    Polygon = 3,
}

/// Shoelace sum of a ring, i.e. twice its signed area.
///
/// The ring is treated as closed whether or not the last point repeats the first.
/// Each cross product of two `i32` points needs 63 bits, so the sum is kept in `i128`.
#[must_use]
pub fn signed_area(ring: &[TilePoint]) -> i128 {
    let Some(last) = ring.last() else {
        return 0;
    };
    let mut prev = *last;
    let mut sum = 0_i128;
    for p in ring {
        sum += i128::from(prev.x) * i128::from(p.y) - i128::from(p.x) * i128::from(prev.y);
        prev = *p;
    }
    sum
}

/// Rings with a positive shoelace area are holes.
#[must_use]
pub fn is_hole(ring: &[TilePoint]) -> bool {
    signed_area(ring) > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(i32, i32)]) -> Vec<TilePoint> {
        points.iter().copied().map(TilePoint::from).collect()
    }

    #[test]
    fn clip_rect_for_tile() {
        let rect = ClipRect::for_tile(512, 20);
        assert_eq!(rect, ClipRect::new(-20, 532, -20, 532));
        assert!(rect.contains(TilePoint::new(-20, 532)));
        assert!(!rect.contains(TilePoint::new(-21, 0)));
    }

    #[test]
    fn area_sign_follows_point_order() {
        let square = ring(&[(0, 0), (10, 0), (10, 10), (0, 10), (0, 0)]);
        assert_eq!(signed_area(&square), 200);
        assert!(is_hole(&square));

        let reversed: Vec<_> = square.iter().rev().copied().collect();
        assert_eq!(signed_area(&reversed), -200);
        assert!(!is_hole(&reversed));

        // the closing point is optional
        assert_eq!(signed_area(&square[..4]), 200);
        assert_eq!(signed_area(&[]), 0);
    }

    #[test]
    fn area_of_saturated_ring() {
        // a ring spanning the whole i32 range, as saturated coordinates produce
        let (lo, hi) = (i32::MIN, i32::MAX);
        let square = ring(&[(lo, lo), (hi, lo), (hi, hi), (lo, hi), (lo, lo)]);
        let side = i128::from(hi) - i128::from(lo);
        assert_eq!(signed_area(&square), 2 * side * side);
        assert!(is_hole(&square));

        let reversed: Vec<_> = square.iter().rev().copied().collect();
        assert!(!is_hole(&reversed));
    }

    #[test]
    fn pixel_point_from_tile_point() {
        assert_eq!(
            PixelPoint::from(TilePoint::new(-3, 7)),
            PixelPoint::new(-3, 7)
        );
    }

    #[test]
    fn kind_display() {
        assert_eq!(GeometryKind::LineString.to_string(), "line-string");
        assert_eq!(GeometryKind::Polygon as i32, 3);
    }
}
