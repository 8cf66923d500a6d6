use crate::{EARTH_CIRCUMFERENCE, Rect, TileCoord, TileRect, tiles_per_side};

/// Web Mercator tile grid for a given tile size in pixels.
///
/// Tile `0,0,0` covers the whole world; rows grow southwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileMatrix {
    tile_size: u32,
}

impl Default for TileMatrix {
    fn default() -> Self {
        Self::new(512)
    }
}

impl TileMatrix {
    #[must_use]
    pub fn new(tile_size: u32) -> Self {
        Self { tile_size }
    }

    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Side length of a tile at `zoom`, in meters
    #[must_use]
    pub fn tile_length(&self, zoom: u8) -> f64 {
        EARTH_CIRCUMFERENCE / tiles_per_side(zoom) as f64
    }

    /// Meters per pixel at `zoom`
    #[must_use]
    pub fn resolution(&self, zoom: u8) -> f64 {
        self.tile_length(zoom) / f64::from(self.tile_size)
    }

    /// Pixels per meter at `zoom`
    #[must_use]
    pub fn scale(&self, zoom: u8) -> f64 {
        f64::from(self.tile_size) / EARTH_CIRCUMFERENCE * 2_f64.powi(i32::from(zoom))
    }

    /// Tile extent in Web Mercator meters
    #[must_use]
    pub fn tile_bounds(&self, xyz: TileCoord) -> Rect {
        let half = EARTH_CIRCUMFERENCE / 2.0;
        let len = self.tile_length(xyz.z);
        let min_x = xyz.x as f64 * len - half;
        let max_y = half - xyz.y as f64 * len;
        Rect::new(min_x, max_y - len, min_x + len, max_y)
    }

    /// All tiles at `zoom` intersecting `bounds`, clamped to the world.
    ///
    /// Returns `None` for empty bounds or bounds entirely outside the world.
    #[must_use]
    pub fn tile_range(&self, bounds: &Rect, zoom: u8) -> Option<TileRect> {
        let half = EARTH_CIRCUMFERENCE / 2.0;
        let world = Rect::new(-half, -half, half, half);
        if !bounds.intersects(&world) {
            return None;
        }
        let len = self.tile_length(zoom);
        let last = (tiles_per_side(zoom) - 1) as f64;
        let to_index = |v: f64| (v / len).floor().clamp(0.0, last) as u64;
        Some(TileRect::new(
            zoom,
            to_index(bounds.min_x + half),
            to_index(half - bounds.max_y),
            to_index(bounds.max_x + half),
            to_index(half - bounds.min_y),
        ))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_world_tile() {
        let matrix = TileMatrix::default();
        let half = EARTH_CIRCUMFERENCE / 2.0;
        let b = matrix.tile_bounds(TileCoord::new(0, 0, 0));
        assert_relative_eq!(b.min_x, -half);
        assert_relative_eq!(b.min_y, -half);
        assert_relative_eq!(b.max_x, half);
        assert_relative_eq!(b.max_y, half);
        assert_relative_eq!(matrix.resolution(0) * 512.0, EARTH_CIRCUMFERENCE);
        assert_relative_eq!(matrix.scale(0) * EARTH_CIRCUMFERENCE, 512.0);
    }

    #[test]
    fn test_north_west_child() {
        let matrix = TileMatrix::new(256);
        let half = EARTH_CIRCUMFERENCE / 2.0;
        let b = matrix.tile_bounds(TileCoord::new(1, 0, 0));
        assert_relative_eq!(b.min_x, -half);
        assert_relative_eq!(b.max_x, 0.0);
        assert_relative_eq!(b.min_y, 0.0);
        assert_relative_eq!(b.max_y, half);
    }

    #[rstest]
    #[case(0, TileRect::new(0, 0, 0, 0, 0))]
    #[case(1, TileRect::new(1, 1, 0, 1, 0))]
    #[case(3, TileRect::new(3, 4, 3, 4, 3))]
    fn test_point_range(#[case] zoom: u8, #[case] expected: TileRect) {
        let matrix = TileMatrix::default();
        let bounds = Rect::from_point(1000.0, 1000.0);
        assert_eq!(matrix.tile_range(&bounds, zoom), Some(expected));
    }

    #[test]
    fn test_range_clamped_to_world() {
        let matrix = TileMatrix::default();
        let huge = Rect::new(-1e9, -1e9, 1e9, 1e9);
        assert_eq!(
            matrix.tile_range(&huge, 2),
            Some(TileRect::new(2, 0, 0, 3, 3))
        );
        assert_eq!(matrix.tile_range(&Rect::default(), 2), None);
        assert_eq!(
            matrix.tile_range(&Rect::new(3e7, 0.0, 4e7, 1.0), 2),
            None
        );
    }

    #[test]
    fn test_bounds_and_range_agree() {
        let matrix = TileMatrix::default();
        let xyz = TileCoord::new(7, 37, 101);
        let b = matrix.tile_bounds(xyz);
        let (cx, cy) = b.center();
        let range = matrix.tile_range(&Rect::from_point(cx, cy), 7).unwrap();
        assert_eq!(range, TileRect::new(7, 37, 101, 37, 101));
    }
}
