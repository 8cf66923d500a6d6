use crate::feature::{FeatureGeometry, SourceFeature};
use crate::geometry::{ClipRect, TileContext, TilePoint, clip_line, clip_ring, simplify};
use crate::mvt::TileFeature;

/// Minimum number of points of a closed ring, including the closing point
const MIN_RING_POINTS: usize = 4;

/// Turns source features into tile features for one tile.
#[derive(Debug, Clone, Copy)]
pub struct TileFeatureBuilder {
    context: TileContext,
    tolerance: f64,
    clip: ClipRect,
}

impl TileFeatureBuilder {
    /// Creates a builder projecting into `context`, simplifying with `tolerance`
    /// pixels and clipping to `clip`
    #[must_use]
    pub fn new(context: TileContext, tolerance: f64, clip: ClipRect) -> Self {
        Self {
            context,
            tolerance,
            clip,
        }
    }

    /// Builds the tile geometry of a feature, or `None` if nothing of it is left in this tile.
    ///
    /// Points are only projected. Lines and rings are projected, simplified and clipped,
    /// and rings shorter than four points are dropped. Lines and rings are narrowed to
    /// tile coordinates only after clipping.
    #[must_use]
    pub fn build(&self, feature: &SourceFeature) -> Option<TileFeature> {
        let kind = feature.geometry.kind();
        let geometry = match &feature.geometry {
            FeatureGeometry::Points(points) => {
                let projected: Vec<TilePoint> = points
                    .iter()
                    .map(|[x, y]| self.context.project(*x, *y))
                    .collect();
                if projected.is_empty() {
                    Vec::new()
                } else {
                    vec![projected]
                }
            }
            FeatureGeometry::Lines(lines) => lines
                .iter()
                .flat_map(|line| {
                    let simplified = simplify(&self.context.project_path(line), self.tolerance);
                    clip_line(&simplified, &self.clip).into_parts()
                })
                .collect(),
            FeatureGeometry::Polygons(polygons) => polygons
                .iter()
                .flatten()
                .filter_map(|ring| self.build_ring(ring))
                .collect(),
            FeatureGeometry::Unknown => return None,
        };

        if geometry.is_empty() {
            return None;
        }
        Some(TileFeature {
            id: None,
            kind,
            geometry,
            attributes: feature.properties.clone(),
        })
    }

    fn build_ring(&self, ring: &[[f64; 2]]) -> Option<Vec<TilePoint>> {
        let simplified = simplify(&self.context.project_path(ring), self.tolerance);
        let clipped = clip_ring(&simplified, &self.clip);
        (clipped.len() >= MIN_RING_POINTS).then_some(clipped)
    }
}

#[cfg(test)]
mod tests {
    use mvtiler_tile_utils::{EARTH_CIRCUMFERENCE, TileCoord};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::geometry::{GeometryKind, TileProjector, is_hole};
    use crate::mvt::TileValue;

    const HALF: f64 = EARTH_CIRCUMFERENCE / 2.0;

    /// World tile of 512 pixels, so one pixel is `HALF / 256` meters
    fn builder() -> TileFeatureBuilder {
        let projector = TileProjector::new(512).unwrap();
        let context = projector.context(TileCoord::new(0, 0, 0)).unwrap();
        TileFeatureBuilder::new(context, 1.0, ClipRect::for_tile(512, 20))
    }

    /// Meters of a pixel position in the world tile
    fn m(px: f64, py: f64) -> [f64; 2] {
        let pixel = HALF / 256.0;
        [px * pixel - HALF, HALF - py * pixel]
    }

    fn pts(points: &[(i32, i32)]) -> Vec<TilePoint> {
        points.iter().copied().map(TilePoint::from).collect()
    }

    #[test]
    fn points_are_only_projected() {
        let feature = SourceFeature::new(
            7,
            FeatureGeometry::Points(vec![m(100.0, 200.0), m(700.0, 5.0)]),
        )
        .with_property("name", "a");
        let built = builder().build(&feature).unwrap();
        assert_eq!(built.kind, GeometryKind::Point);
        assert_eq!(built.geometry, vec![pts(&[(100, 200), (700, 5)])]);
        assert_eq!(
            built.attributes,
            vec![("name".to_string(), TileValue::from("a"))]
        );
    }

    #[test]
    fn lines_are_simplified_and_clipped() {
        let feature = SourceFeature::new(
            1,
            FeatureGeometry::Lines(vec![
                vec![m(-30.0, 5.0), m(100.0, 5.0), m(600.0, 5.0)],
                vec![m(600.0, 600.0), m(700.0, 700.0)],
            ]),
        );
        let built = builder().build(&feature).unwrap();
        assert_eq!(built.kind, GeometryKind::LineString);
        assert_eq!(built.geometry, vec![pts(&[(-20, 5), (532, 5)])]);
    }

    #[test]
    fn polygon_rings_keep_order_and_orientation() {
        let outer = vec![
            m(-50.0, -50.0),
            m(100.0, -50.0),
            m(100.0, 100.0),
            m(-50.0, 100.0),
            m(-50.0, -50.0),
        ];
        let hole = vec![
            m(10.0, 10.0),
            m(10.0, 50.0),
            m(50.0, 50.0),
            m(50.0, 10.0),
            m(10.0, 10.0),
        ];
        let feature = SourceFeature::new(1, FeatureGeometry::Polygons(vec![vec![outer, hole]]));
        let built = builder().build(&feature).unwrap();

        assert_eq!(
            built.geometry,
            vec![
                pts(&[(-20, -20), (100, -20), (100, 100), (-20, 100), (-20, -20)]),
                pts(&[(10, 10), (10, 50), (50, 50), (50, 10), (10, 10)]),
            ]
        );
        // the two rings keep their opposite winding
        assert!(is_hole(&built.geometry[0]));
        assert!(!is_hole(&built.geometry[1]));
    }

    #[test]
    fn degenerate_rings_are_dropped() {
        // only three points survive clipping at the buffered tile corner
        let sliver = vec![m(-100.0, -100.0), m(-10.0, -25.0), m(-25.0, -10.0), m(-100.0, -100.0)];
        let feature = SourceFeature::new(1, FeatureGeometry::Polygons(vec![vec![sliver]]));
        assert_eq!(builder().build(&feature), None);
    }

    #[test]
    fn world_polygon_at_deep_zoom_covers_the_tile() {
        let projector = TileProjector::new(512).unwrap();
        let mid = 1 << 29;
        let context = projector.context(TileCoord::new(30, mid, mid)).unwrap();
        let builder = TileFeatureBuilder::new(context, 1.0, ClipRect::for_tile(512, 20));

        let world = vec![
            [-HALF, -HALF],
            [HALF, -HALF],
            [HALF, HALF],
            [-HALF, HALF],
            [-HALF, -HALF],
        ];
        let feature = SourceFeature::new(1, FeatureGeometry::Polygons(vec![vec![world]]));
        let built = builder.build(&feature).unwrap();
        assert_eq!(built.kind, GeometryKind::Polygon);
        assert_eq!(built.geometry.len(), 1);

        let ring = &built.geometry[0];
        assert_eq!(ring.first(), ring.last());
        assert!(ring.iter().all(|p| ClipRect::for_tile(512, 20).contains(*p)));
        let corners = pts(&[(-20, -20), (532, -20), (532, 532), (-20, 532)]);
        assert!(corners.iter().all(|c| ring.contains(c)), "{ring:?}");
        // counter-clockwise in Mercator, so not a hole once the y axis points down
        assert!(!is_hole(ring));
    }

    #[test]
    fn deep_zoom_line_keeps_its_direction() {
        let projector = TileProjector::new(512).unwrap();
        let mid = 1 << 29;
        let context = projector.context(TileCoord::new(30, mid, mid)).unwrap();
        let builder = TileFeatureBuilder::new(context, 1.0, ClipRect::for_tile(512, 20));

        // crosses the tile's top-left corner diagonally, from the north-west to the south-east
        let line = vec![[-HALF, HALF], [HALF, -HALF]];
        let feature = SourceFeature::new(1, FeatureGeometry::Lines(vec![line]));
        let built = builder.build(&feature).unwrap();
        assert_eq!(built.geometry, vec![pts(&[(-20, -20), (532, 532)])]);
    }

    #[test]
    fn nothing_left_is_none() {
        let outside = SourceFeature::new(
            1,
            FeatureGeometry::Lines(vec![vec![m(600.0, 600.0), m(700.0, 700.0)]]),
        );
        assert_eq!(builder().build(&outside), None);
        assert_eq!(
            builder().build(&SourceFeature::new(2, FeatureGeometry::Unknown)),
            None
        );
        assert_eq!(
            builder().build(&SourceFeature::new(3, FeatureGeometry::Points(vec![]))),
            None
        );
    }
}
