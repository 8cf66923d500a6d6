use mvtiler_tile_utils::{MAX_ZOOM, TileCoord};

use crate::geometry::GeometryKind;

/// Errors that can occur while generating vector tiles.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum TilerError {
    /// Zoom level above the supported maximum.
    #[error("Zoom level {0} is not supported, it must be between 0 and {max}", max = MAX_ZOOM)]
    InvalidZoom(u8),

    /// Minimum zoom above the maximum zoom.
    #[error("Invalid zoom range {min}..={max}, the minimum zoom must not exceed the maximum zoom")]
    InvalidZoomRange {
        /// Requested minimum zoom
        min: u8,
        /// Requested maximum zoom
        max: u8,
    },

    /// Tile column or row outside of the grid at its zoom level.
    #[error("Tile {0} is outside of the tile grid")]
    InvalidTile(TileCoord),

    /// Tile size of zero pixels.
    #[error("Invalid tile size {0}, it must be greater than zero")]
    InvalidTileSize(u32),

    /// A geometry of unknown kind reached the encoder.
    #[error("Unable to encode a geometry of unknown kind")]
    UnknownGeometryKind,

    /// An empty point group, line, or ring reached the encoder.
    #[error("Unable to encode an empty {0} geometry part")]
    EmptyGeometry(GeometryKind),

    /// The command stream contains a command id other than MoveTo, LineTo, or ClosePath.
    #[error("Unknown geometry command id {0}")]
    UnknownCommand(u32),

    /// The command stream ends in the middle of a command's parameters.
    #[error("Geometry command stream ends before all command parameters were read")]
    TruncatedGeometry,

    /// ClosePath found in a point geometry.
    #[error("ClosePath command is not allowed in a point geometry")]
    ClosePathOnPoint,

    /// A feature tag references a key or value outside of the layer tables.
    #[error("Feature tag index {index} is out of range, the layer has {len} entries")]
    InvalidTagIndex {
        /// The offending index
        index: u32,
        /// Length of the table the index points into
        len: usize,
    },

    /// A feature has an odd number of tag indexes.
    #[error("Feature tags must come in key/value pairs, got {0} indexes")]
    OddTagCount(usize),

    /// A layer value has none of its fields set.
    #[error("Layer value has no field set")]
    EmptyValue,

    /// The tile bytes are not a valid vector tile.
    #[error("Unable to decode vector tile: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The feature source failed.
    #[error("Feature source error: {0}")]
    Source(String),

    /// IO error, e.g. during tile compression.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A tile worker task panicked or was aborted.
    #[error("Tile worker failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// The receiving side of the tile channel was dropped.
    #[error("The tile writer stopped accepting tiles")]
    OutputClosed,
}

/// A convenience [`Result`] for `mvtiler-core`.
pub type TilerResult<T> = Result<T, TilerError>;
