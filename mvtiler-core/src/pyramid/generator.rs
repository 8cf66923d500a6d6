use std::sync::Arc;

use mvtiler_tile_utils::{TileCoord, encode_gzip};
use tracing::trace;

use crate::TilerResult;
use crate::feature::{FeatureCache, FeatureSource, TileFeatureBuilder};
use crate::geometry::{ClipRect, TileProjector};
use crate::mvt::{Tile, TileLayer};
use crate::pyramid::TilingOptions;

/// Encoded bytes of one non-empty tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTile {
    /// Tile coordinates, rows counted from the north
    pub xyz: TileCoord,
    /// Protobuf bytes, gzipped unless compression is disabled
    pub data: Vec<u8>,
    /// Number of features in the tile
    pub features: usize,
}

/// Generates single tiles from a feature source. Shared by all tile workers.
#[derive(Debug)]
pub struct TileGenerator {
    source: Arc<dyn FeatureSource>,
    projector: TileProjector,
    cache: FeatureCache,
    clip: ClipRect,
    options: TilingOptions,
}

impl TileGenerator {
    /// Creates a generator, validating the tile size
    pub fn new(source: Arc<dyn FeatureSource>, options: TilingOptions) -> TilerResult<Self> {
        Ok(Self {
            projector: TileProjector::new(options.tile_size)?,
            cache: FeatureCache::new(options.feature_cache_size),
            clip: ClipRect::for_tile(options.tile_size, options.buffer),
            source,
            options,
        })
    }

    /// Options of this run
    #[must_use]
    pub fn options(&self) -> &TilingOptions {
        &self.options
    }

    /// The feature source
    #[must_use]
    pub fn source(&self) -> &Arc<dyn FeatureSource> {
        &self.source
    }

    /// The projector, including its tile matrix
    #[must_use]
    pub fn projector(&self) -> &TileProjector {
        &self.projector
    }

    /// The shared feature cache
    #[must_use]
    pub fn cache(&self) -> &FeatureCache {
        &self.cache
    }

    /// Generates one tile, returning `None` if no feature is left in it.
    ///
    /// Features are selected by their bounding box against the tile bounds grown by the
    /// clip margin, then projected, simplified, clipped and encoded into a single layer.
    pub fn generate_tile(&self, xyz: TileCoord) -> TilerResult<Option<GeneratedTile>> {
        let context = self.projector.context(xyz)?;
        let margin = context.pixels_to_meters(f64::from(self.options.buffer));
        let bbox = self.projector.tile_bounds(xyz)?.buffered(margin);
        let ids = self.source.query(&bbox)?;

        let builder =
            TileFeatureBuilder::new(context, self.options.simplify_tolerance, self.clip);
        let mut layer = TileLayer::new(self.options.layer_name.clone(), self.options.tile_size);
        for id in ids {
            if let Some(feature) = self.cache.get_or_fetch(id, self.source.as_ref())? {
                layer.features.extend(builder.build(&feature));
            }
        }

        let features = layer.features.len();
        if features == 0 {
            trace!("Tile {xyz} is empty");
            return Ok(None);
        }

        let mut data = Tile::new(vec![layer]).encode()?;
        if self.options.compress {
            data = encode_gzip(&data)?;
        }
        trace!("Tile {xyz} has {features} features in {} bytes", data.len());
        Ok(Some(GeneratedTile {
            xyz,
            data,
            features,
        }))
    }
}
