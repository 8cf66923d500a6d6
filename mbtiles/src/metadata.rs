use std::fmt::Display;
use std::str::FromStr;

use futures::TryStreamExt as _;
use serde::Serialize;
use serde_json::{Value as JSONValue, Value, json};
use sqlx::{Row as _, SqliteExecutor, query};
use tilejson::{Bounds, Center, TileJSON, tilejson};
use tracing::{info, warn};

use crate::MbtError::InvalidZoomValue;
use crate::Mbtiles;
use crate::errors::MbtResult;

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Metadata {
    pub id: String,
    pub tilejson: TileJSON,
    pub json: Option<JSONValue>,
}

impl Mbtiles {
    fn to_val<V, E: Display>(&self, val: Result<V, E>, title: &str) -> Option<V> {
        match val {
            Ok(v) => Some(v),
            Err(err) => {
                let name = &self.filename();
                warn!("Unable to parse metadata {title} value in {name}: {err}");
                None
            }
        }
    }

    /// Get a single metadata value from the metadata table
    pub async fn get_metadata_value<T>(&self, conn: &mut T, key: &str) -> MbtResult<Option<String>>
    where
        for<'e> &'e mut T: SqliteExecutor<'e>,
    {
        let row = query("SELECT value FROM metadata WHERE name = ?")
            .bind(key)
            .fetch_optional(conn)
            .await?;
        Ok(match row {
            Some(row) => row.try_get::<Option<String>, _>(0)?,
            None => None,
        })
    }

    pub async fn get_metadata_zoom_value<T>(
        &self,
        conn: &mut T,
        zoom_name: &'static str,
    ) -> MbtResult<Option<u8>>
    where
        for<'e> &'e mut T: SqliteExecutor<'e>,
    {
        self.get_metadata_value(conn, zoom_name)
            .await?
            .map(|v| v.parse().map_err(|_| InvalidZoomValue(zoom_name, v)))
            .transpose()
    }

    pub async fn set_metadata_value<T, S>(&self, conn: &mut T, key: &str, value: S) -> MbtResult<()>
    where
        S: ToString,
        for<'e> &'e mut T: SqliteExecutor<'e>,
    {
        let value = value.to_string();
        query("INSERT OR REPLACE INTO metadata(name, value) VALUES(?, ?)")
            .bind(key)
            .bind(value)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn get_metadata<T>(&self, conn: &mut T) -> MbtResult<Metadata>
    where
        for<'e> &'e mut T: SqliteExecutor<'e>,
    {
        let mut rows = query("SELECT name, value FROM metadata WHERE value IS NOT ''").fetch(conn);

        let mut tj = tilejson! { tiles: vec![] };
        let mut json: Option<JSONValue> = None;

        while let Some(row) = rows.try_next().await? {
            let name: Option<String> = row.try_get(0)?;
            let value: Option<String> = row.try_get(1)?;
            if let (Some(name), Some(value)) = (name, value) {
                match name.as_ref() {
                    // This list should loosely match the `insert_metadata` function below
                    "name" => tj.name = Some(value),
                    "version" => tj.version = Some(value),
                    "bounds" => tj.bounds = self.to_val(Bounds::from_str(value.as_str()), &name),
                    "center" => tj.center = self.to_val(Center::from_str(value.as_str()), &name),
                    "minzoom" => tj.minzoom = self.to_val(value.parse(), &name),
                    "maxzoom" => tj.maxzoom = self.to_val(value.parse(), &name),
                    "description" => tj.description = Some(value),
                    "attribution" => tj.attribution = Some(value),
                    "json" => json = self.to_val(serde_json::from_str(&value), &name),
                    "format" | "generator" => {
                        tj.other.insert(name, Value::String(value));
                    }
                    _ => {
                        let file = &self.filename();
                        info!("{file} has an unrecognized metadata value {name}={value}");
                        tj.other.insert(name, Value::String(value));
                    }
                }
            }
        }

        if let Some(JSONValue::Object(obj)) = &mut json {
            if let Some(value) = obj.remove("vector_layers") {
                if let Ok(v) = serde_json::from_value(value) {
                    tj.vector_layers = Some(v);
                } else {
                    warn!(
                        "Unable to parse metadata vector_layers value in {}",
                        self.filename()
                    );
                }
            }
            if obj.is_empty() {
                json = None;
            }
        }

        Ok(Metadata {
            id: self.filename().to_string(),
            tilejson: tj,
            json,
        })
    }

    pub async fn insert_metadata<T>(&self, conn: &mut T, tile_json: &TileJSON) -> MbtResult<()>
    where
        for<'e> &'e mut T: SqliteExecutor<'e>,
    {
        for (key, value) in &tile_json.other {
            if let Some(value) = value.as_str() {
                self.set_metadata_value(&mut *conn, key, value).await?;
            } else {
                self.set_metadata_value(&mut *conn, key, &serde_json::to_string(value)?)
                    .await?;
            }
        }
        for (key, value) in &[
            ("name", tile_json.name.as_deref()),
            ("version", tile_json.version.as_deref()),
            ("description", tile_json.description.as_deref()),
            ("attribution", tile_json.attribution.as_deref()),
        ] {
            if let Some(value) = value {
                self.set_metadata_value(&mut *conn, key, value).await?;
            }
        }
        if let Some(bounds) = &tile_json.bounds {
            self.set_metadata_value(&mut *conn, "bounds", bounds).await?;
        }
        if let Some(center) = &tile_json.center {
            self.set_metadata_value(&mut *conn, "center", center).await?;
        }
        if let Some(minzoom) = &tile_json.minzoom {
            self.set_metadata_value(&mut *conn, "minzoom", minzoom).await?;
        }
        if let Some(maxzoom) = &tile_json.maxzoom {
            self.set_metadata_value(&mut *conn, "maxzoom", maxzoom).await?;
        }
        if let Some(vector_layers) = &tile_json.vector_layers {
            self.set_metadata_value(
                &mut *conn,
                "json",
                &serde_json::to_string(&json!({ "vector_layers": vector_layers }))?,
            )
            .await?;
        }

        Ok(())
    }
}
