use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum MbtError {
    #[error(transparent)]
    SqlxError(#[from] sqlx::Error),

    #[error(transparent)]
    JsonSerdeError(#[from] serde_json::Error),

    #[error("MBTile filepath contains unsupported characters: {}", .0.display())]
    UnsupportedCharsInFilepath(PathBuf),

    #[error("Invalid zoom value {0}={1}, expecting an integer between 0..{max}", max = mvtiler_tile_utils::MAX_ZOOM)]
    InvalidZoomValue(&'static str, String),

    #[error(
        "The destination file {} is not empty. Use --on-duplicate to write into an existing file.",
        .0.display()
    )]
    NonEmptyTargetFile(PathBuf),
}

pub type MbtResult<T> = Result<T, MbtError>;
