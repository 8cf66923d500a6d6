use std::ffi::OsStr;
use std::fmt::{Display, Formatter};
use std::path::Path;

#[cfg(feature = "cli")]
use clap::ValueEnum;
use enum_display::EnumDisplay;
use mvtiler_tile_utils::invert_y_value;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection as _, Row as _, SqliteConnection, SqliteExecutor, query};
use tracing::debug;

use crate::errors::{MbtError, MbtResult};

/// What to do when a tile with the same Z/X/Y already exists in the file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumDisplay, Serialize, Deserialize)]
#[enum_display(case = "Kebab")]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
pub enum CopyDuplicateMode {
    /// Replace the existing tile
    #[default]
    Override,
    /// Keep the existing tile
    Ignore,
    /// Fail the whole batch
    Abort,
}

impl CopyDuplicateMode {
    #[must_use]
    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::Override => "OR REPLACE",
            Self::Ignore => "OR IGNORE",
            Self::Abort => "OR ABORT",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Mbtiles {
    filepath: String,
    filename: String,
}

impl Display for Mbtiles {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.filepath)
    }
}

impl Mbtiles {
    pub fn new<P: AsRef<Path>>(filepath: P) -> MbtResult<Self> {
        let path = filepath.as_ref();
        Ok(Self {
            filepath: path
                .to_str()
                .ok_or_else(|| MbtError::UnsupportedCharsInFilepath(path.to_path_buf()))?
                .to_string(),
            filename: path
                .file_stem()
                .unwrap_or_else(|| OsStr::new("unknown"))
                .to_string_lossy()
                .to_string(),
        })
    }

    pub async fn open(&self) -> MbtResult<SqliteConnection> {
        debug!("Opening w/ defaults {self}");
        let opt = SqliteConnectOptions::new().filename(self.filepath());
        Ok(SqliteConnection::connect_with(&opt).await?)
    }

    pub async fn open_or_new(&self) -> MbtResult<SqliteConnection> {
        debug!("Opening or creating {self}");
        let opt = SqliteConnectOptions::new()
            .filename(self.filepath())
            .create_if_missing(true);
        Ok(SqliteConnection::connect_with(&opt).await?)
    }

    pub async fn open_readonly(&self) -> MbtResult<SqliteConnection> {
        debug!("Opening as readonly {self}");
        let opt = SqliteConnectOptions::new()
            .filename(self.filepath())
            .read_only(true);
        Ok(SqliteConnection::connect_with(&opt).await?)
    }

    #[must_use]
    pub fn filepath(&self) -> &str {
        &self.filepath
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Read a single tile. `y` uses the XYZ (north-up) convention.
    pub async fn get_tile<T>(
        &self,
        conn: &mut T,
        z: u8,
        x: u64,
        y: u64,
    ) -> MbtResult<Option<Vec<u8>>>
    where
        for<'e> &'e mut T: SqliteExecutor<'e>,
    {
        let y = invert_y_value(z, y);
        let row = query(
            "SELECT tile_data FROM tiles WHERE zoom_level = ? AND tile_column = ? AND tile_row = ?",
        )
        .bind(z)
        .bind(x as i64)
        .bind(y as i64)
        .fetch_optional(conn)
        .await?;
        Ok(match row {
            Some(row) => row.try_get::<Option<Vec<u8>>, _>(0)?,
            None => None,
        })
    }

    /// Number of rows in the `tiles` table
    pub async fn count_tiles<T>(&self, conn: &mut T) -> MbtResult<u64>
    where
        for<'e> &'e mut T: SqliteExecutor<'e>,
    {
        let row = query("SELECT COUNT(*) FROM tiles").fetch_one(conn).await?;
        Ok(row.try_get::<i64, _>(0)? as u64)
    }

    /// Insert a batch of `(z, x, y, data)` tiles in a single transaction.
    ///
    /// Rows use the XYZ convention and are flipped to TMS on write.
    /// If any insert fails, the transaction is dropped without commit and nothing
    /// from this batch is kept.
    pub async fn insert_tiles(
        &self,
        conn: &mut SqliteConnection,
        on_duplicate: CopyDuplicateMode,
        batch: &[(u8, u64, u64, Vec<u8>)],
    ) -> MbtResult<()> {
        debug!(
            "Inserting a batch of {} tiles into {self} ({on_duplicate})",
            batch.len()
        );
        let sql = format!(
            "INSERT {} INTO tiles (zoom_level, tile_column, tile_row, tile_data) VALUES(?, ?, ?, ?)",
            on_duplicate.to_sql()
        );
        let mut tx = conn.begin().await?;
        for (z, x, y, tile_data) in batch {
            let y = invert_y_value(*z, *y);
            query(&sql)
                .bind(*z)
                .bind(*x as i64)
                .bind(y as i64)
                .bind(tile_data.as_slice())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub async fn open(filepath: &str) -> MbtResult<(SqliteConnection, Mbtiles)> {
        let mbt = Mbtiles::new(filepath)?;
        mbt.open_or_new().await.map(|conn| (conn, mbt))
    }

    #[test]
    fn mbtiles_names() -> MbtResult<()> {
        let mbt = Mbtiles::new("some/dir/world_cities.mbtiles")?;
        assert_eq!(mbt.filepath(), "some/dir/world_cities.mbtiles");
        assert_eq!(mbt.filename(), "world_cities");
        assert_eq!(mbt.to_string(), "some/dir/world_cities.mbtiles");
        Ok(())
    }

    #[test]
    fn duplicate_mode() {
        assert_eq!(CopyDuplicateMode::default(), CopyDuplicateMode::Override);
        assert_eq!(CopyDuplicateMode::Ignore.to_string(), "ignore");
        assert_eq!(CopyDuplicateMode::Abort.to_sql(), "OR ABORT");
    }
}
