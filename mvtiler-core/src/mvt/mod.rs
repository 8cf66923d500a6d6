pub mod proto;

mod commands;
pub use commands::{Command, zigzag_decode, zigzag_encode};

mod geometry_encoding;
pub use geometry_encoding::{decode_geometry, encode_geometry};

mod tags;
pub use tags::TagsBuilder;

mod tile;
pub use tile::{DEFAULT_EXTENT, LAYER_VERSION, Tile, TileFeature, TileLayer};

mod tile_value;
pub use tile_value::TileValue;
