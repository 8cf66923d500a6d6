use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mvtiler_core::pyramid::GeneratedTile;
use mvtiler_tile_utils::TileCoord;
use tokio::fs;
use tracing::debug;

use crate::output::TileWriter;
use crate::{MvtilerError, MvtilerResult};

/// Writes every tile into its own `{z}_{x}_{y}.mvt` file of a single directory.
#[derive(Debug, Clone)]
pub struct DirWriter {
    dir: PathBuf,
    written: u64,
}

impl DirWriter {
    /// Creates the directory if it is missing. Existing tile files are overwritten.
    pub async fn create(dir: &Path) -> MvtilerResult<Self> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| MvtilerError::TileWriteError(e, dir.to_path_buf()))?;
        debug!("Writing tile files into {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    /// Path of the file holding a tile
    #[must_use]
    pub fn tile_path(&self, xyz: TileCoord) -> PathBuf {
        self.dir.join(format!("{}_{}_{}.mvt", xyz.z, xyz.x, xyz.y))
    }

    /// Number of files written so far
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }
}

#[async_trait]
impl TileWriter for DirWriter {
    async fn write_tiles(&mut self, tiles: &[GeneratedTile]) -> MvtilerResult<()> {
        for tile in tiles {
            let path = self.tile_path(tile.xyz);
            fs::write(&path, &tile.data)
                .await
                .map_err(|e| MvtilerError::TileWriteError(e, path))?;
            self.written += 1;
        }
        Ok(())
    }

    async fn finish(&mut self) -> MvtilerResult<()> {
        debug!("Wrote {} tile files into {}", self.written, self.dir.display());
        Ok(())
    }
}
