use prost::Message as _;
use tracing::{trace, warn};

use crate::geometry::{GeometryKind, TilePoint};
use crate::mvt::geometry_encoding::{decode_geometry, encode_geometry};
use crate::mvt::tags::TagsBuilder;
use crate::mvt::{TileValue, proto};
use crate::{TilerError, TilerResult};

/// Layer version written into every encoded layer
pub const LAYER_VERSION: u32 = 2;

/// Extent assumed for layers that do not declare one
pub const DEFAULT_EXTENT: u32 = 4096;

/// A feature in tile pixel space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileFeature {
    /// Feature id. Ignored when encoding, where features are numbered from 1 in
    /// layer order, and set when decoding.
    pub id: Option<u64>,
    /// Geometry kind of all parts
    pub kind: GeometryKind,
    /// Point groups, lines, or rings, in source order
    pub geometry: Vec<Vec<TilePoint>>,
    /// Attributes, in source order
    pub attributes: Vec<(String, TileValue)>,
}

/// A named layer of features.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    /// Layer name
    pub name: String,
    /// Size of the pixel space the features are expressed in
    pub extent: u32,
    /// Features of the layer
    pub features: Vec<TileFeature>,
}

impl TileLayer {
    /// Creates an empty layer
    #[must_use]
    pub fn new(name: impl Into<String>, extent: u32) -> Self {
        Self {
            name: name.into(),
            extent,
            features: Vec::new(),
        }
    }

    fn to_proto(&self) -> TilerResult<proto::Layer> {
        let mut tags = TagsBuilder::new();
        let mut features = Vec::with_capacity(self.features.len());

        for (idx, feature) in self.features.iter().enumerate() {
            let geometry = encode_geometry(feature.kind, &feature.geometry)?;
            let mut feature_tags = Vec::with_capacity(feature.attributes.len() * 2);
            for (key, value) in &feature.attributes {
                let (key_idx, value_idx) = tags.insert(key, value);
                feature_tags.push(key_idx);
                feature_tags.push(value_idx);
            }
            features.push(proto::Feature {
                id: Some(idx as u64 + 1),
                tags: feature_tags,
                r#type: Some(feature.kind as i32),
                geometry,
            });
        }

        let (keys, values) = tags.into_tags();
        Ok(proto::Layer {
            version: LAYER_VERSION,
            name: self.name.clone(),
            features,
            keys,
            values: values.into_iter().map(Into::into).collect(),
            extent: Some(self.extent),
        })
    }

    /// Resolves the tag indices of every feature.
    ///
    /// Features with an unknown or missing type are kept with their attributes but without
    /// geometry, because their command stream cannot be interpreted.
    fn from_proto(layer: proto::Layer) -> TilerResult<Self> {
        let values = layer
            .values
            .into_iter()
            .map(TileValue::try_from)
            .collect::<TilerResult<Vec<_>>>()?;
        let keys = layer.keys;

        let features = layer
            .features
            .into_iter()
            .map(|feature| {
                let kind = geometry_kind(feature.r#type());
                let geometry = if kind == GeometryKind::Unknown {
                    warn!(
                        "Ignoring the geometry of feature {:?} in layer '{}', its type is unknown",
                        feature.id, layer.name
                    );
                    Vec::new()
                } else {
                    decode_geometry(kind, &feature.geometry)?
                };
                if feature.tags.len() % 2 != 0 {
                    return Err(TilerError::OddTagCount(feature.tags.len()));
                }
                let attributes = feature
                    .tags
                    .chunks_exact(2)
                    .map(|pair| {
                        let key = lookup(&keys, pair[0])?;
                        let value = lookup(&values, pair[1])?;
                        Ok((key.clone(), value.clone()))
                    })
                    .collect::<TilerResult<Vec<_>>>()?;
                Ok(TileFeature {
                    id: feature.id,
                    kind,
                    geometry,
                    attributes,
                })
            })
            .collect::<TilerResult<Vec<_>>>()?;

        Ok(Self {
            name: layer.name,
            extent: layer.extent.unwrap_or(DEFAULT_EXTENT),
            features,
        })
    }
}

fn lookup<T>(table: &[T], index: u32) -> TilerResult<&T> {
    table
        .get(index as usize)
        .ok_or(TilerError::InvalidTagIndex {
            index,
            len: table.len(),
        })
}

fn geometry_kind(geom_type: proto::GeomType) -> GeometryKind {
    match geom_type {
        proto::GeomType::Unknown => GeometryKind::Unknown,
        proto::GeomType::Point => GeometryKind::Point,
        proto::GeomType::Linestring => GeometryKind::LineString,
        proto::GeomType::Polygon => GeometryKind::Polygon,
    }
}

/// A vector tile: an ordered list of layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tile {
    /// Layers of the tile
    pub layers: Vec<TileLayer>,
}

impl Tile {
    /// Creates a tile from its layers
    #[must_use]
    pub fn new(layers: Vec<TileLayer>) -> Self {
        Self { layers }
    }

    /// Total number of features over all layers
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.layers.iter().map(|l| l.features.len()).sum()
    }

    /// Converts into wire messages, building the key and value tables of every layer
    pub fn to_proto(&self) -> TilerResult<proto::Tile> {
        Ok(proto::Tile {
            layers: self
                .layers
                .iter()
                .map(TileLayer::to_proto)
                .collect::<TilerResult<_>>()?,
        })
    }

    /// Resolves wire messages into decoded features
    pub fn from_proto(tile: proto::Tile) -> TilerResult<Self> {
        Ok(Self {
            layers: tile
                .layers
                .into_iter()
                .map(TileLayer::from_proto)
                .collect::<TilerResult<_>>()?,
        })
    }

    /// Serializes the tile into protobuf bytes
    pub fn encode(&self) -> TilerResult<Vec<u8>> {
        let data = self.to_proto()?.encode_to_vec();
        trace!(
            "Encoded {} features in {} layers into {} bytes",
            self.feature_count(),
            self.layers.len(),
            data.len()
        );
        Ok(data)
    }

    /// Parses uncompressed protobuf bytes
    pub fn decode(data: &[u8]) -> TilerResult<Self> {
        Self::from_proto(proto::Tile::decode(data)?)
    }
}
