use std::io;
use std::path::PathBuf;

use mbtiles::MbtError;
use mvtiler_core::TilerError;

/// A convenience [`Result`] for the mvtiler crate.
pub type MvtilerResult<T> = Result<T, MvtilerError>;

#[derive(thiserror::Error, Debug)]
pub enum MvtilerError {
    #[error("Unable to load config file {1}: {0}")]
    ConfigLoadError(#[source] io::Error, PathBuf),

    #[error("Unable to parse config file {1}: {0}")]
    ConfigParseError(#[source] serde_yaml::Error, PathBuf),

    #[error("Unable to write config file {1}: {0}")]
    ConfigWriteError(#[source] io::Error, PathBuf),

    #[error("Unable to serialize the configuration: {0}")]
    ConfigSerializeError(#[source] serde_yaml::Error),

    #[error("No input file given. Pass a GeoJSON file as the first argument or set `input` in the config file")]
    NoInput,

    #[error("No output given. Use --output or set `output` in the config file")]
    NoOutput,

    #[error("Invalid simplification tolerance {0}, it must be a finite number of pixels, 0 or more")]
    InvalidSimplifyTolerance(f64),

    #[error("Unable to read GeoJSON file {1}: {0}")]
    GeoJsonReadError(#[source] io::Error, PathBuf),

    #[error("File {1} is not valid GeoJSON: {0}")]
    NotValidGeoJson(#[source] Box<geojson::Error>, PathBuf),

    #[error("Unable to convert feature #{index} of {path}: {reason}")]
    InvalidFeature {
        index: usize,
        path: PathBuf,
        reason: String,
    },

    #[error("File {0} contains no features with a geometry")]
    NoFeatures(PathBuf),

    #[error(
        "Bounds of {0} are outside of the Web Mercator world. Check that --input-crs matches the file's coordinates"
    )]
    InvalidBoundingBox(PathBuf),

    #[error("Unable to write tile file {1}: {0}")]
    TileWriteError(#[source] io::Error, PathBuf),

    #[error("Unable to read tile file {1}: {0}")]
    TileReadError(#[source] io::Error, PathBuf),

    #[error("Unable to decode tile: {0}")]
    InvalidTile(#[source] io::Error),

    #[error(transparent)]
    Tiler(#[from] TilerError),

    #[error(transparent)]
    Mbt(#[from] MbtError),

    #[error(transparent)]
    IoError(#[from] io::Error),
}
