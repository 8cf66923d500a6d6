use moka::sync::Cache;
use mvtiler_tile_utils::{MAX_ZOOM, Rect, TileCoord, TileMatrix, tiles_per_side};
use tracing::trace;

use crate::geometry::{PixelPoint, TilePoint};
use crate::{TilerError, TilerResult};

/// Default number of tile bounds kept by [`TileProjector`]
const BOUNDS_CACHE_SIZE: u64 = 16_384;

/// Maps Web Mercator coordinates into the pixel space of individual tiles.
///
/// Tile bounds are memoized per tile, because every feature of a tile is projected
/// against the same bounds. The projector is cheap to clone and safe to share
/// between worker threads.
#[derive(Debug, Clone)]
pub struct TileProjector {
    matrix: TileMatrix,
    bounds: Cache<TileCoord, Rect>,
}

impl TileProjector {
    /// Creates a projector for tiles of `tile_size` pixels
    pub fn new(tile_size: u32) -> TilerResult<Self> {
        Self::with_cache_size(tile_size, BOUNDS_CACHE_SIZE)
    }

    /// Creates a projector keeping at most `max_cached` tile bounds
    pub fn with_cache_size(tile_size: u32, max_cached: u64) -> TilerResult<Self> {
        if tile_size == 0 {
            return Err(TilerError::InvalidTileSize(tile_size));
        }
        Ok(Self {
            matrix: TileMatrix::new(tile_size),
            bounds: Cache::builder()
                .name("tile_bounds")
                .max_capacity(max_cached)
                .build(),
        })
    }

    /// The tile matrix used for bounds and scale lookups
    #[must_use]
    pub fn matrix(&self) -> &TileMatrix {
        &self.matrix
    }

    /// Tile size in pixels
    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.matrix.tile_size()
    }

    /// World bounds of a tile in Web Mercator meters
    pub fn tile_bounds(&self, xyz: TileCoord) -> TilerResult<Rect> {
        if xyz.z > MAX_ZOOM {
            return Err(TilerError::InvalidZoom(xyz.z));
        }
        let side = tiles_per_side(xyz.z);
        if xyz.x >= side || xyz.y >= side {
            return Err(TilerError::InvalidTile(xyz));
        }
        Ok(self.bounds.get_with(xyz, || {
            trace!("Computing bounds of tile {xyz}");
            self.matrix.tile_bounds(xyz)
        }))
    }

    /// Projection parameters for one tile
    pub fn context(&self, xyz: TileCoord) -> TilerResult<TileContext> {
        let bounds = self.tile_bounds(xyz)?;
        Ok(TileContext {
            xyz,
            left: bounds.min_x,
            top: bounds.max_y,
            scale: self.matrix.scale(xyz.z),
        })
    }

    /// Number of cached tile bounds
    #[must_use]
    pub fn cached_bounds(&self) -> u64 {
        self.bounds.run_pending_tasks();
        self.bounds.entry_count()
    }
}

/// Projection of one tile: its top-left corner in meters and pixels per meter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileContext {
    /// The projected tile
    pub xyz: TileCoord,
    /// Western edge of the tile in meters
    pub left: f64,
    /// Northern edge of the tile in meters
    pub top: f64,
    /// Pixels per meter at the tile's zoom
    pub scale: f64,
}

impl TileContext {
    /// Project a Web Mercator coordinate into this tile's pixels, rounding half to even.
    ///
    /// Coordinates far outside the tile are not clamped here, only saturated to the `i32` range.
    #[must_use]
    pub fn project(&self, x: f64, y: f64) -> TilePoint {
        TilePoint::new(
            ((x - self.left) * self.scale).round_ties_even() as i32,
            ((self.top - y) * self.scale).round_ties_even() as i32,
        )
    }

    /// Project a Web Mercator coordinate without narrowing it to `i32`.
    ///
    /// Used for paths that are clipped afterwards, so that the direction of segments
    /// reaching far outside the tile is kept at any zoom level.
    #[must_use]
    pub fn project_wide(&self, x: f64, y: f64) -> PixelPoint {
        PixelPoint::new(
            ((x - self.left) * self.scale).round_ties_even() as i64,
            ((self.top - y) * self.scale).round_ties_even() as i64,
        )
    }

    /// Project every coordinate of a path, keeping 64-bit pixel coordinates
    #[must_use]
    pub fn project_path(&self, path: &[[f64; 2]]) -> Vec<PixelPoint> {
        path.iter().map(|[x, y]| self.project_wide(*x, *y)).collect()
    }

    /// Convert a distance in pixels into meters at this tile's zoom
    #[must_use]
    pub fn pixels_to_meters(&self, pixels: f64) -> f64 {
        pixels / self.scale
    }
}
