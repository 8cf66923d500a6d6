//! `GeoJSON` feature source.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::ValueEnum;
use geojson::{GeoJson, Geometry, JsonObject, JsonValue, Value};
use mvtiler_core::TilerResult;
use mvtiler_core::feature::{FeatureGeometry, FeatureSource, MemorySource, SourceFeature};
use mvtiler_core::mvt::TileValue;
use mvtiler_tile_utils::{EARTH_CIRCUMFERENCE, Rect, webmercator_to_wgs84, wgs84_to_webmercator};
use serde::{Deserialize, Serialize};
use tilejson::{Bounds, VectorLayer};
use tracing::{debug, info, warn};

use crate::{MvtilerError, MvtilerResult};

/// Coordinate reference system of the input coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputCrs {
    /// Longitude and latitude in degrees (EPSG:4326)
    #[default]
    #[serde(alias = "epsg:4326")]
    Wgs84,
    /// Web Mercator meters (EPSG:3857)
    #[serde(rename = "webmercator", alias = "epsg:3857")]
    #[value(name = "webmercator")]
    WebMercator,
}

impl InputCrs {
    fn project(self, position: &[f64]) -> Result<[f64; 2], String> {
        let [x, y, ..] = position else {
            return Err(format!(
                "position {position:?} needs at least two coordinates"
            ));
        };
        if !x.is_finite() || !y.is_finite() {
            return Err(format!("position {position:?} is not finite"));
        }
        Ok(match self {
            Self::Wgs84 => {
                let (x, y) = wgs84_to_webmercator(*x, *y);
                [x, y]
            }
            Self::WebMercator => [*x, *y],
        })
    }

    fn path(self, positions: &[Vec<f64>]) -> Result<Vec<[f64; 2]>, String> {
        positions.iter().map(|p| self.project(p)).collect()
    }
}

/// Features of a `GeoJSON` file, projected to Web Mercator and indexed in memory.
///
/// Every feature gets its position in the file as id. Geometry collections are split into
/// one feature per member, sharing the properties.
#[derive(Debug)]
pub struct GeoJsonSource {
    path: PathBuf,
    features: MemorySource,
    fields: BTreeMap<String, String>,
}

impl GeoJsonSource {
    /// Reads and indexes a `GeoJSON` file
    pub fn from_file(path: &Path, crs: InputCrs) -> MvtilerResult<Self> {
        info!("Loading {} ({crs:?})", path.display());
        let file =
            File::open(path).map_err(|e| MvtilerError::GeoJsonReadError(e, path.to_path_buf()))?;
        let geojson = GeoJson::from_reader(BufReader::new(file))
            .map_err(|e| MvtilerError::NotValidGeoJson(Box::new(e.into()), path.to_path_buf()))?;
        Self::new(geojson, path, crs)
    }

    /// Indexes already parsed `GeoJSON`. `path` is only used in messages.
    pub fn new(geojson: GeoJson, path: &Path, crs: InputCrs) -> MvtilerResult<Self> {
        let inputs: Vec<(Option<Geometry>, Option<JsonObject>)> = match geojson {
            GeoJson::Geometry(geometry) => vec![(Some(geometry), None)],
            GeoJson::Feature(feature) => vec![(feature.geometry, feature.properties)],
            GeoJson::FeatureCollection(collection) => collection
                .features
                .into_iter()
                .map(|f| (f.geometry, f.properties))
                .collect(),
        };

        let mut fields = BTreeMap::new();
        let mut features = Vec::with_capacity(inputs.len());
        let mut without_geometry = 0_usize;
        for (index, (geometry, properties)) in inputs.into_iter().enumerate() {
            let Some(geometry) = geometry else {
                without_geometry += 1;
                continue;
            };
            let properties = properties.unwrap_or_default();
            for (key, value) in &properties {
                if let Some(kind) = field_type(value) {
                    fields.insert(key.clone(), kind.to_string());
                }
            }
            let properties = convert_properties(properties);

            let geometries =
                convert_geometry(&geometry.value, crs).map_err(|reason| {
                    MvtilerError::InvalidFeature {
                        index,
                        path: path.to_path_buf(),
                        reason,
                    }
                })?;
            for geometry in geometries {
                features.push(SourceFeature {
                    id: features.len() as u64,
                    geometry,
                    properties: properties.clone(),
                });
            }
        }
        if without_geometry > 0 {
            warn!(
                "Skipped {without_geometry} features without geometry in {}",
                path.display()
            );
        }

        let features = MemorySource::new(features);
        let bounds = features.bounds();
        if bounds.is_empty() {
            return Err(MvtilerError::NoFeatures(path.to_path_buf()));
        }
        let half = EARTH_CIRCUMFERENCE / 2.0;
        if bounds.min_x < -half || bounds.max_x > half || bounds.min_y < -half || bounds.max_y > half
        {
            return Err(MvtilerError::InvalidBoundingBox(path.to_path_buf()));
        }
        debug!(
            "Loaded {} features with {} property fields from {}",
            features.len(),
            fields.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            features,
            fields,
        })
    }

    /// The file the features were read from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of features, counting geometry collection members separately
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Property names and their `TileJSON` types
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Bounds of all features in longitude and latitude
    #[must_use]
    pub fn wgs84_bounds(&self) -> Bounds {
        let bounds = self.features.bounds();
        let (left, bottom) = webmercator_to_wgs84(bounds.min_x, bounds.min_y);
        let (right, top) = webmercator_to_wgs84(bounds.max_x, bounds.max_y);
        Bounds::new(left, bottom, right, top)
    }

    /// `TileJSON` description of the single layer generated from this source
    #[must_use]
    pub fn vector_layer(&self, id: &str, minzoom: u8, maxzoom: u8) -> VectorLayer {
        let mut layer = VectorLayer::new(id.to_string(), self.fields.clone());
        layer.minzoom = Some(minzoom);
        layer.maxzoom = Some(maxzoom);
        layer
    }
}

impl FeatureSource for GeoJsonSource {
    fn bounds(&self) -> Rect {
        self.features.bounds()
    }

    fn query(&self, bbox: &Rect) -> TilerResult<Vec<u64>> {
        self.features.query(bbox)
    }

    fn feature(&self, id: u64) -> TilerResult<Option<Arc<SourceFeature>>> {
        self.features.feature(id)
    }
}

fn convert_geometry(value: &Value, crs: InputCrs) -> Result<Vec<FeatureGeometry>, String> {
    Ok(match value {
        Value::Point(point) => vec![FeatureGeometry::Points(vec![crs.project(point)?])],
        Value::MultiPoint(points) => vec![FeatureGeometry::Points(crs.path(points)?)],
        Value::LineString(line) => vec![FeatureGeometry::Lines(vec![crs.path(line)?])],
        Value::MultiLineString(lines) => vec![FeatureGeometry::Lines(
            lines
                .iter()
                .map(|line| crs.path(line))
                .collect::<Result<_, _>>()?,
        )],
        Value::Polygon(rings) => vec![FeatureGeometry::Polygons(vec![polygon(rings, crs)?])],
        Value::MultiPolygon(polygons) => vec![FeatureGeometry::Polygons(
            polygons
                .iter()
                .map(|rings| polygon(rings, crs))
                .collect::<Result<_, _>>()?,
        )],
        Value::GeometryCollection(geometries) => {
            let mut result = Vec::new();
            for geometry in geometries {
                result.extend(convert_geometry(&geometry.value, crs)?);
            }
            result
        }
    })
}

fn polygon(rings: &[Vec<Vec<f64>>], crs: InputCrs) -> Result<Vec<Vec<[f64; 2]>>, String> {
    rings
        .iter()
        .map(|ring| {
            let mut ring = crs.path(ring)?;
            if ring.first() != ring.last() {
                ring.push(ring[0]);
            }
            Ok(ring)
        })
        .collect()
}

/// Maps JSON properties to tile values sorted by key. Nulls are dropped, arrays and
/// objects are kept as their JSON text.
fn convert_properties(properties: JsonObject) -> Vec<(String, TileValue)> {
    let mut converted: Vec<_> = properties
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                JsonValue::Null => return None,
                JsonValue::Bool(v) => TileValue::Bool(v),
                JsonValue::String(v) => TileValue::Str(v),
                JsonValue::Number(n) => {
                    if let Some(v) = n.as_u64() {
                        TileValue::Uint(v)
                    } else if let Some(v) = n.as_i64() {
                        TileValue::Sint(v)
                    } else {
                        TileValue::Double(n.as_f64()?)
                    }
                }
                value @ (JsonValue::Array(_) | JsonValue::Object(_)) => {
                    TileValue::Str(value.to_string())
                }
            };
            Some((key, value))
        })
        .collect();
    converted.sort_by(|a, b| a.0.cmp(&b.0));
    converted
}

/// `TileJSON` field type of a property
fn field_type(value: &JsonValue) -> Option<&'static str> {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(_) => Some("Boolean"),
        JsonValue::Number(_) => Some("Number"),
        JsonValue::String(_) | JsonValue::Array(_) | JsonValue::Object(_) => Some("String"),
    }
}
