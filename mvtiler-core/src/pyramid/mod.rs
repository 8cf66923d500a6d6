use std::sync::Arc;

use futures::{StreamExt as _, stream};
use mvtiler_tile_utils::TileCoord;
use tokio::sync::mpsc::Sender;
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{TilerError, TilerResult};

mod events;
pub use events::{EventSink, NoopSink, TilingEvent};

mod generator;
pub use generator::{GeneratedTile, TileGenerator};

mod options;
pub use options::{
    DEFAULT_BUFFER, DEFAULT_FEATURE_CACHE_SIZE, DEFAULT_SIMPLIFY_TOLERANCE, DEFAULT_TILE_SIZE,
    TilingOptions, ZoomRange,
};

/// Counters of a pyramid run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PyramidStats {
    /// Tiles with at least one feature, each sent to the output
    pub non_empty: u64,
    /// Tiles without features
    pub empty: u64,
    /// Features over all non-empty tiles
    pub features: u64,
    /// Zoom levels that were fully processed
    pub levels: u8,
}

impl PyramidStats {
    /// Number of generated tiles, empty or not
    #[must_use]
    pub fn tiles(&self) -> u64 {
        self.non_empty + self.empty
    }
}

/// How a pyramid run ended. Cancellation is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyramidOutcome {
    /// Every tile of the pyramid was generated
    Completed(PyramidStats),
    /// The run stopped early because the cancellation token fired
    Cancelled(PyramidStats),
}

impl PyramidOutcome {
    /// Counters up to the end of the run
    #[must_use]
    pub fn stats(&self) -> PyramidStats {
        match self {
            Self::Completed(stats) | Self::Cancelled(stats) => *stats,
        }
    }

    /// True if the run was cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

enum TileWork {
    Skipped,
    Empty(TileCoord),
    Done(GeneratedTile),
}

/// Generates one tile on a blocking worker thread, unless the run is cancelled
async fn generate_one(
    generator: Arc<TileGenerator>,
    xyz: TileCoord,
    cancel: &CancellationToken,
) -> TilerResult<TileWork> {
    if cancel.is_cancelled() {
        return Ok(TileWork::Skipped);
    }
    let tile = spawn_blocking(move || generator.generate_tile(xyz)).await??;
    Ok(match tile {
        Some(tile) => TileWork::Done(tile),
        None => TileWork::Empty(xyz),
    })
}

/// Generates the tile pyramid of the generator's source, sending non-empty tiles to `output`.
///
/// Root tiles cover the source bounds at the minimum zoom. The pyramid is walked one zoom
/// level at a time, with at most `concurrency` tiles generated on blocking worker threads.
/// Only non-empty tiles below the maximum zoom queue their four children, so subtrees
/// without features are never visited. Cancellation is checked before every level and
/// before every tile.
pub async fn generate_pyramid(
    generator: Arc<TileGenerator>,
    output: Sender<GeneratedTile>,
    events: &dyn EventSink,
    cancel: &CancellationToken,
) -> TilerResult<PyramidOutcome> {
    let options = generator.options();
    let zooms = options.zooms;
    let concurrency = options.concurrency.max(1);
    let mut stats = PyramidStats::default();

    let bounds = generator.source().bounds();
    let Some(roots) = generator.projector().matrix().tile_range(&bounds, zooms.min()) else {
        info!("The source has no features inside the world bounds, no tiles to generate");
        return Ok(PyramidOutcome::Completed(stats));
    };
    info!("Generating zoom levels {}..={} from {roots}", zooms.min(), zooms.max());

    let mut level: Vec<TileCoord> = roots.iter().collect();
    let mut zoom = zooms.min();

    while !level.is_empty() {
        if cancel.is_cancelled() {
            info!("Cancelled before zoom {zoom}");
            return Ok(PyramidOutcome::Cancelled(stats));
        }
        debug!("Zoom {zoom}: {} tiles queued", level.len());
        events.on_event(&TilingEvent::LevelStarted {
            zoom,
            tiles: level.len(),
        });

        let mut results = stream::iter(level)
            .map(|xyz| generate_one(Arc::clone(&generator), xyz, cancel))
            .buffer_unordered(concurrency);

        let mut next = Vec::new();
        let (mut non_empty, mut empty, mut skipped) = (0, 0, 0);
        while let Some(work) = results.next().await {
            match work? {
                TileWork::Skipped => skipped += 1,
                TileWork::Empty(xyz) => {
                    empty += 1;
                    events.on_event(&TilingEvent::TileDone { xyz, features: 0 });
                }
                TileWork::Done(tile) => {
                    non_empty += 1;
                    stats.features += tile.features as u64;
                    let xyz = tile.xyz;
                    events.on_event(&TilingEvent::TileDone {
                        xyz,
                        features: tile.features,
                    });
                    if zoom < zooms.max() {
                        next.extend(xyz.children());
                    }
                    output
                        .send(tile)
                        .await
                        .map_err(|_| TilerError::OutputClosed)?;
                }
            }
        }

        stats.non_empty += non_empty;
        stats.empty += empty;
        events.on_event(&TilingEvent::LevelFinished {
            zoom,
            non_empty,
            empty,
        });
        if skipped == 0 {
            stats.levels += 1;
        }
        if cancel.is_cancelled() {
            info!("Cancelled after zoom {zoom}, {skipped} tiles of it were skipped");
            return Ok(PyramidOutcome::Cancelled(stats));
        }
        info!("Zoom {zoom} done: {non_empty} tiles with features, {empty} empty");

        next.sort_unstable_by_key(|xyz| (xyz.y, xyz.x));
        level = next;
        zoom += 1;
    }

    Ok(PyramidOutcome::Completed(stats))
}
