use sqlx::{Executor as _, SqliteExecutor, query};
use tracing::debug;

use crate::errors::MbtResult;

/// Returns true if the database is empty (no tables/indexes/...)
pub async fn is_empty_database<T>(conn: &mut T) -> MbtResult<bool>
where
    for<'e> &'e mut T: SqliteExecutor<'e>,
{
    Ok(query("SELECT 1 as has_rows FROM sqlite_schema LIMIT 1")
        .fetch_optional(&mut *conn)
        .await?
        .is_none())
}

pub async fn create_metadata_table<T>(conn: &mut T) -> MbtResult<()>
where
    for<'e> &'e mut T: SqliteExecutor<'e>,
{
    debug!("Creating metadata table if it doesn't already exist");
    conn.execute(
        "CREATE TABLE IF NOT EXISTS metadata (
             name text NOT NULL PRIMARY KEY,
             value text);",
    )
    .await?;

    Ok(())
}

pub async fn create_flat_tables<T>(conn: &mut T) -> MbtResult<()>
where
    for<'e> &'e mut T: SqliteExecutor<'e>,
{
    debug!("Creating if needed flat table: tiles(z,x,y,data)");
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tiles (
             zoom_level integer NOT NULL,
             tile_column integer NOT NULL,
             tile_row integer NOT NULL,
             tile_data blob,
             PRIMARY KEY(zoom_level, tile_column, tile_row));",
    )
    .await?;

    Ok(())
}

/// Create the `metadata` and flat `tiles` tables if they are missing
pub async fn init_mbtiles_schema<T>(conn: &mut T) -> MbtResult<()>
where
    for<'e> &'e mut T: SqliteExecutor<'e>,
{
    create_metadata_table(&mut *conn).await?;
    create_flat_tables(&mut *conn).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mbtiles::tests::open;

    #[tokio::test]
    async fn init_schema_once() -> MbtResult<()> {
        let (mut conn, _) = open("file:init_schema_once_mem_db?mode=memory&cache=shared").await?;
        assert!(is_empty_database(&mut conn).await?);
        init_mbtiles_schema(&mut conn).await?;
        assert!(!is_empty_database(&mut conn).await?);
        // a second call must not fail on existing tables
        init_mbtiles_schema(&mut conn).await?;
        Ok(())
    }
}
