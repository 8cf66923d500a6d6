use std::path::Path;

use async_trait::async_trait;
use mbtiles::sqlx::SqliteConnection;
use mbtiles::{CopyDuplicateMode, MbtError, Mbtiles, init_mbtiles_schema, is_empty_database};
use mvtiler_core::pyramid::GeneratedTile;
use tilejson::TileJSON;
use tracing::{debug, info};

use crate::MvtilerResult;
use crate::output::TileWriter;

/// Writes tiles into an MBTiles file through a single connection.
///
/// Rows are flipped to the TMS convention by [`Mbtiles::insert_tiles`], and every batch
/// is inserted in its own transaction.
#[derive(Debug)]
pub struct MbtilesWriter {
    mbt: Mbtiles,
    conn: SqliteConnection,
    on_duplicate: CopyDuplicateMode,
    set_meta: Vec<(String, String)>,
}

impl MbtilesWriter {
    /// Opens or creates the file, creating the schema and storing `tilejson` as metadata.
    ///
    /// Writing into a non-empty file requires `on_duplicate`, otherwise
    /// [`MbtError::NonEmptyTargetFile`] is returned. `set_meta` values are written last and
    /// override the generated metadata.
    pub async fn open(
        path: &Path,
        on_duplicate: Option<CopyDuplicateMode>,
        tilejson: &TileJSON,
        set_meta: Vec<(String, String)>,
    ) -> MvtilerResult<Self> {
        let mbt = Mbtiles::new(path)?;
        let mut conn = mbt.open_or_new().await?;
        let on_duplicate = if let Some(on_duplicate) = on_duplicate {
            on_duplicate
        } else if !is_empty_database(&mut conn).await? {
            return Err(MbtError::NonEmptyTargetFile(path.to_path_buf()).into());
        } else {
            CopyDuplicateMode::Override
        };

        init_mbtiles_schema(&mut conn).await?;
        mbt.insert_metadata(&mut conn, tilejson).await?;
        debug!("Writing into {mbt} with on-duplicate={on_duplicate}");

        Ok(Self {
            mbt,
            conn,
            on_duplicate,
            set_meta,
        })
    }

    /// The MBTiles file
    #[must_use]
    pub fn mbtiles(&self) -> &Mbtiles {
        &self.mbt
    }
}

#[async_trait]
impl TileWriter for MbtilesWriter {
    async fn write_tiles(&mut self, tiles: &[GeneratedTile]) -> MvtilerResult<()> {
        let batch: Vec<_> = tiles
            .iter()
            .map(|tile| (tile.xyz.z, tile.xyz.x, tile.xyz.y, tile.data.clone()))
            .collect();
        self.mbt
            .insert_tiles(&mut self.conn, self.on_duplicate, &batch)
            .await?;
        Ok(())
    }

    async fn finish(&mut self) -> MvtilerResult<()> {
        for (key, value) in &self.set_meta {
            info!("Setting metadata key={key} value={value}");
            self.mbt
                .set_metadata_value(&mut self.conn, key, value)
                .await?;
        }
        Ok(())
    }
}
