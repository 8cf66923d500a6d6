use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use itertools::Itertools as _;
use mvtiler_core::geometry::GeometryKind;
use mvtiler_core::mvt::{Tile, TileLayer};
use mvtiler_tile_utils::{decode_gzip, is_gzipped};

use crate::{MvtilerError, MvtilerResult};

/// Overview of a single encoded tile
#[derive(Debug, Clone, PartialEq)]
pub struct TileSummary {
    /// Size of the data as stored
    pub size: usize,
    pub gzipped: bool,
    pub layers: Vec<LayerSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    pub name: String,
    pub extent: u32,
    pub points: usize,
    pub lines: usize,
    pub polygons: usize,
    /// Attribute keys used by any feature
    pub keys: BTreeSet<String>,
}

impl LayerSummary {
    fn new(layer: &TileLayer) -> Self {
        let count = |kind| layer.features.iter().filter(|f| f.kind == kind).count();
        Self {
            name: layer.name.clone(),
            extent: layer.extent,
            points: count(GeometryKind::Point),
            lines: count(GeometryKind::LineString),
            polygons: count(GeometryKind::Polygon),
            keys: layer
                .features
                .iter()
                .flat_map(|f| f.attributes.iter().map(|(key, _)| key.clone()))
                .collect(),
        }
    }

    #[must_use]
    pub fn features(&self) -> usize {
        self.points + self.lines + self.polygons
    }
}

impl Display for TileSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let encoding = if self.gzipped { "gzip" } else { "uncompressed" };
        write!(f, "{} bytes ({encoding}), {} layers", self.size, self.layers.len())?;
        for layer in &self.layers {
            write!(
                f,
                "\n  {}: extent {}, {} features ({} points, {} lines, {} polygons)",
                layer.name,
                layer.extent,
                layer.features(),
                layer.points,
                layer.lines,
                layer.polygons
            )?;
            if !layer.keys.is_empty() {
                write!(f, "\n    keys: {}", layer.keys.iter().join(", "))?;
            }
        }
        Ok(())
    }
}

/// Decodes a tile, gunzipping it first if needed
pub fn inspect_tile(data: &[u8]) -> MvtilerResult<TileSummary> {
    let gzipped = is_gzipped(data);
    let tile = if gzipped {
        Tile::decode(&decode_gzip(data).map_err(MvtilerError::InvalidTile)?)?
    } else {
        Tile::decode(data)?
    };
    Ok(TileSummary {
        size: data.len(),
        gzipped,
        layers: tile.layers.iter().map(LayerSummary::new).collect(),
    })
}

/// Reads a tile file and decodes it
pub fn inspect_file(path: &Path) -> MvtilerResult<TileSummary> {
    let data = fs::read(path).map_err(|e| MvtilerError::TileReadError(e, path.to_path_buf()))?;
    inspect_tile(&data)
}

#[cfg(test)]
mod tests {
    use mvtiler_core::geometry::TilePoint;
    use mvtiler_core::mvt::{TileFeature, TileValue};
    use mvtiler_tile_utils::encode_gzip;
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_tile() -> Vec<u8> {
        let mut layer = TileLayer::new("roads", 512);
        layer.features.push(TileFeature {
            kind: GeometryKind::LineString,
            geometry: vec![vec![TilePoint::new(1, 1), TilePoint::new(10, 10)]],
            attributes: vec![("name".to_string(), TileValue::Str("Main".to_string()))],
            ..TileFeature::default()
        });
        layer.features.push(TileFeature {
            kind: GeometryKind::Point,
            geometry: vec![vec![TilePoint::new(5, 5)]],
            attributes: vec![("lanes".to_string(), TileValue::Uint(2))],
            ..TileFeature::default()
        });
        Tile::new(vec![layer]).encode().unwrap()
    }

    #[test]
    fn summarizes_plain_and_gzipped_tiles() {
        let data = sample_tile();
        let plain = inspect_tile(&data).unwrap();
        assert!(!plain.gzipped);
        assert_eq!(plain.size, data.len());
        assert_eq!(
            plain.layers,
            vec![LayerSummary {
                name: "roads".to_string(),
                extent: 512,
                points: 1,
                lines: 1,
                polygons: 0,
                keys: ["lanes", "name"].into_iter().map(String::from).collect(),
            }]
        );

        let gzipped = inspect_tile(&encode_gzip(&data).unwrap()).unwrap();
        assert!(gzipped.gzipped);
        assert_eq!(gzipped.layers, plain.layers);
        assert!(gzipped.to_string().contains(
            "\n  roads: extent 512, 2 features (1 points, 1 lines, 0 polygons)\n    keys: lanes, name"
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(inspect_tile(&[0x1f, 0x8b, 0, 1, 2]).is_err());
        assert!(inspect_tile(&[0xff, 0xff, 0xff]).is_err());
    }
}
