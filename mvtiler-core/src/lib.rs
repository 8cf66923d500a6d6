#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod error;
pub use error::{TilerError, TilerResult};

/// Tile-space geometry: primitives, projection, simplification and clipping
pub mod geometry;

/// Mapbox Vector Tile wire format and geometry command codec
pub mod mvt;

/// Source features, feature sources and the per-tile feature builder
pub mod feature;

/// Tile pyramid driver
pub mod pyramid;
