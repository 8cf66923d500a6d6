use mvtiler_tile_utils::MAX_ZOOM;

use crate::{TilerError, TilerResult};

/// Default size of tiles in pixels
pub const DEFAULT_TILE_SIZE: u32 = 512;
/// Default Douglas-Peucker tolerance in pixels
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 1.0;
/// Default clip margin around each tile in pixels
pub const DEFAULT_BUFFER: u32 = 20;
/// Default maximum number of features kept in the feature cache
pub const DEFAULT_FEATURE_CACHE_SIZE: usize = 100_000;

/// Validated inclusive range of zoom levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
    min: u8,
    max: u8,
}

impl ZoomRange {
    /// Creates a range, rejecting zooms above the maximum zoom and `min > max`
    pub fn new(min: u8, max: u8) -> TilerResult<Self> {
        for zoom in [min, max] {
            if zoom > MAX_ZOOM {
                return Err(TilerError::InvalidZoom(zoom));
            }
        }
        if min > max {
            return Err(TilerError::InvalidZoomRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lowest zoom, where the root tiles are enumerated
    #[must_use]
    pub fn min(&self) -> u8 {
        self.min
    }

    /// Highest zoom that is generated
    #[must_use]
    pub fn max(&self) -> u8 {
        self.max
    }

    /// True if `zoom` is part of the range
    #[must_use]
    pub fn contains(&self, zoom: u8) -> bool {
        (self.min..=self.max).contains(&zoom)
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 0, max: 14 }
    }
}

impl TryFrom<(u8, u8)> for ZoomRange {
    type Error = TilerError;

    fn try_from((min, max): (u8, u8)) -> TilerResult<Self> {
        Self::new(min, max)
    }
}

impl From<ZoomRange> for (u8, u8) {
    fn from(range: ZoomRange) -> Self {
        (range.min, range.max)
    }
}

/// Parameters of one pyramid run.
#[derive(Debug, Clone, PartialEq)]
pub struct TilingOptions {
    /// Zoom levels to generate
    pub zooms: ZoomRange,
    /// Tile size in pixels, also used as the layer extent
    pub tile_size: u32,
    /// Douglas-Peucker tolerance in pixels
    pub simplify_tolerance: f64,
    /// Clip margin around each tile in pixels
    pub buffer: u32,
    /// Name of the single layer written into each tile
    pub layer_name: String,
    /// Maximum number of tiles generated at the same time
    pub concurrency: usize,
    /// Gzip the encoded tiles
    pub compress: bool,
    /// Maximum number of features kept in the feature cache, zero disables it
    pub feature_cache_size: usize,
}

impl Default for TilingOptions {
    fn default() -> Self {
        Self {
            zooms: ZoomRange::default(),
            tile_size: DEFAULT_TILE_SIZE,
            simplify_tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
            buffer: DEFAULT_BUFFER,
            layer_name: "features".to_string(),
            concurrency: num_cpus::get(),
            compress: true,
            feature_cache_size: DEFAULT_FEATURE_CACHE_SIZE,
        }
    }
}
