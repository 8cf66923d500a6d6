use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mvtiler_core::pyramid::GeneratedTile;

use crate::MvtilerResult;

mod dir;
pub use dir::DirWriter;

mod mbt;
pub use mbt::MbtilesWriter;

/// Where generated tiles are stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// A single MBTiles file
    Mbtiles(PathBuf),
    /// A directory of `{z}_{x}_{y}.mvt` files
    Directory(PathBuf),
}

impl OutputTarget {
    /// Paths ending in `.mbtiles` are MBTiles files, anything else is a directory
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let is_mbtiles = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mbtiles"));
        if is_mbtiles {
            Self::Mbtiles(path.to_path_buf())
        } else {
            Self::Directory(path.to_path_buf())
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Mbtiles(path) | Self::Directory(path) => path,
        }
    }
}

impl Display for OutputTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mbtiles(path) => write!(f, "MBTiles file {}", path.display()),
            Self::Directory(path) => write!(f, "directory {}", path.display()),
        }
    }
}

/// Stores batches of generated tiles. Only ever used by a single task.
#[async_trait]
pub trait TileWriter: Send {
    /// Stores all tiles of the batch. A failed batch is not partially kept where the
    /// storage supports transactions.
    async fn write_tiles(&mut self, tiles: &[GeneratedTile]) -> MvtilerResult<()>;

    /// Called once after the last batch
    async fn finish(&mut self) -> MvtilerResult<()>;
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("out/world.mbtiles", true)]
    #[case("WORLD.MBTILES", true)]
    #[case("out/tiles", false)]
    #[case("out/world.mbtiles.d/", false)]
    fn output_kind_from_path(#[case] path: &str, #[case] is_mbtiles: bool) {
        let target = OutputTarget::from_path(Path::new(path));
        assert_eq!(matches!(target, OutputTarget::Mbtiles(_)), is_mbtiles);
        assert_eq!(target.path(), Path::new(path));
    }
}
