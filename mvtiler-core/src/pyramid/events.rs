use std::fmt::Debug;

use mvtiler_tile_utils::TileCoord;

/// Progress of a pyramid run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TilingEvent {
    /// Work on a zoom level begins
    LevelStarted {
        /// Zoom of the level
        zoom: u8,
        /// Number of tiles queued at this level
        tiles: usize,
    },
    /// A tile was generated, `features` is zero for empty tiles
    TileDone {
        /// The generated tile
        xyz: TileCoord,
        /// Number of features written into the tile
        features: usize,
    },
    /// All tiles of a zoom level are done
    LevelFinished {
        /// Zoom of the level
        zoom: u8,
        /// Tiles with at least one feature
        non_empty: u64,
        /// Tiles without features, whose subtrees are pruned
        empty: u64,
    },
}

/// Receives [`TilingEvent`]s from the pyramid driver, possibly from several tasks.
pub trait EventSink: Send + Sync {
    /// Called for every event
    fn on_event(&self, event: &TilingEvent);
}

impl<F: Fn(&TilingEvent) + Send + Sync> EventSink for F {
    fn on_event(&self, event: &TilingEvent) {
        self(event);
    }
}

/// Sink ignoring all events
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn on_event(&self, _event: &TilingEvent) {}
}
