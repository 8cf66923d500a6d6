use mvtiler_tile_utils::Rect;

use crate::geometry::GeometryKind;
use crate::mvt::TileValue;

mod builder;
pub use builder::TileFeatureBuilder;

mod cache;
pub use cache::FeatureCache;

mod source;
pub use source::{FeatureSource, MemorySource};

/// Geometry of a source feature in Web Mercator meters.
///
/// Polygons are lists of rings, the first being the outer ring.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// One or more points
    Points(Vec<[f64; 2]>),
    /// One or more line strings
    Lines(Vec<Vec<[f64; 2]>>),
    /// One or more polygons
    Polygons(Vec<Vec<Vec<[f64; 2]>>>),
    /// Geometry that cannot be tiled, e.g. a geometry collection
    Unknown,
}

impl FeatureGeometry {
    /// Geometry kind emitted into tiles
    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Points(_) => GeometryKind::Point,
            Self::Lines(_) => GeometryKind::LineString,
            Self::Polygons(_) => GeometryKind::Polygon,
            Self::Unknown => GeometryKind::Unknown,
        }
    }

    /// Bounding box of all coordinates, empty if there are none
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Points(points) => Rect::from_points(points.iter().copied()),
            Self::Lines(lines) => Rect::from_points(lines.iter().flatten().copied()),
            Self::Polygons(polygons) => {
                Rect::from_points(polygons.iter().flatten().flatten().copied())
            }
            Self::Unknown => Rect::default(),
        }
    }
}

/// A feature as provided by a [`FeatureSource`].
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFeature {
    /// Identifier, unique within its source
    pub id: u64,
    /// Geometry in Web Mercator meters
    pub geometry: FeatureGeometry,
    /// Attributes copied into every tile the feature appears in
    pub properties: Vec<(String, TileValue)>,
}

impl SourceFeature {
    /// Creates a feature without properties
    #[must_use]
    pub fn new(id: u64, geometry: FeatureGeometry) -> Self {
        Self {
            id,
            geometry,
            properties: Vec::new(),
        }
    }

    /// Adds a property
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<TileValue>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_bounds() {
        let lines = FeatureGeometry::Lines(vec![
            vec![[0.0, 0.0], [10.0, 5.0]],
            vec![[-3.0, 2.0], [4.0, 8.0]],
        ]);
        assert_eq!(lines.kind(), GeometryKind::LineString);
        assert_eq!(lines.bounds(), Rect::new(-3.0, 0.0, 10.0, 8.0));
        assert!(FeatureGeometry::Unknown.bounds().is_empty());
        assert!(FeatureGeometry::Points(vec![]).bounds().is_empty());
    }
}
