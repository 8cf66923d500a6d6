#![doc = include_str!("../README.md")]

mod errors;
pub use errors::{MbtError, MbtResult};

mod mbtiles;
pub use mbtiles::{CopyDuplicateMode, Mbtiles};

mod metadata;
pub use metadata::Metadata;

mod queries;
pub use queries::{create_flat_tables, create_metadata_table, init_mbtiles_schema, is_empty_database};

// Re-export sqlx so that callers can name the connection type
pub use sqlx;
