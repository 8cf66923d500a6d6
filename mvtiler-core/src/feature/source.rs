use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use mvtiler_tile_utils::Rect;
use rstar::{AABB, RTree, RTreeObject};
use tracing::{debug, warn};

use crate::TilerResult;
use crate::feature::SourceFeature;

/// Provides features by bounding box, for concurrent use by tile workers.
pub trait FeatureSource: Send + Sync + Debug {
    /// Bounding box of all features in Web Mercator meters
    fn bounds(&self) -> Rect;

    /// Ids of the features whose bounding box intersects `bbox`, in ascending order
    fn query(&self, bbox: &Rect) -> TilerResult<Vec<u64>>;

    /// Looks up a feature by id
    fn feature(&self, id: u64) -> TilerResult<Option<Arc<SourceFeature>>>;
}

#[derive(Debug, Clone, PartialEq)]
struct IndexedBounds {
    id: u64,
    bounds: Rect,
}

impl RTreeObject for IndexedBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min_x, self.bounds.min_y],
            [self.bounds.max_x, self.bounds.max_y],
        )
    }
}

/// Features held in memory, indexed by an R-tree of their bounding boxes.
#[derive(Debug)]
pub struct MemorySource {
    features: HashMap<u64, Arc<SourceFeature>>,
    index: RTree<IndexedBounds>,
    bounds: Rect,
}

impl MemorySource {
    /// Indexes the given features. Features without coordinates are kept but never
    /// returned by queries. A repeated id replaces the earlier feature.
    #[must_use]
    pub fn new(features: impl IntoIterator<Item = SourceFeature>) -> Self {
        let mut by_id = HashMap::new();
        for feature in features {
            let id = feature.id;
            if by_id.insert(id, Arc::new(feature)).is_some() {
                warn!("Feature id {id} is used more than once, keeping the last feature");
            }
        }

        let mut bounds = Rect::default();
        let mut entries = Vec::with_capacity(by_id.len());
        for feature in by_id.values() {
            let feature_bounds = feature.geometry.bounds();
            if !feature_bounds.is_empty() {
                bounds.extend(&feature_bounds);
                entries.push(IndexedBounds {
                    id: feature.id,
                    bounds: feature_bounds,
                });
            }
        }
        debug!(
            "Indexed {} of {} features, bounds {bounds:?}",
            entries.len(),
            by_id.len()
        );

        Self {
            features: by_id,
            index: RTree::bulk_load(entries),
            bounds,
        }
    }

    /// Number of features
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True if the source has no features
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FeatureSource for MemorySource {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn query(&self, bbox: &Rect) -> TilerResult<Vec<u64>> {
        if bbox.is_empty() {
            return Ok(Vec::new());
        }
        let envelope = AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]);
        let mut ids: Vec<u64> = self
            .index
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn feature(&self, id: u64) -> TilerResult<Option<Arc<SourceFeature>>> {
        Ok(self.features.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::feature::FeatureGeometry;

    fn source() -> MemorySource {
        MemorySource::new([
            SourceFeature::new(3, FeatureGeometry::Points(vec![[5.0, 5.0]])),
            SourceFeature::new(
                1,
                FeatureGeometry::Lines(vec![vec![[0.0, 0.0], [20.0, 10.0]]]),
            ),
            SourceFeature::new(
                2,
                FeatureGeometry::Polygons(vec![vec![vec![
                    [100.0, 100.0],
                    [110.0, 100.0],
                    [110.0, 110.0],
                    [100.0, 100.0],
                ]]]),
            ),
            SourceFeature::new(4, FeatureGeometry::Unknown),
        ])
    }

    #[test]
    fn bounds_cover_all_features() {
        let source = source();
        assert_eq!(source.len(), 4);
        assert_eq!(source.bounds(), Rect::new(0.0, 0.0, 110.0, 110.0));
    }

    #[test]
    fn query_by_bbox() {
        let source = source();
        assert_eq!(source.query(&Rect::new(-1.0, -1.0, 6.0, 6.0)).unwrap(), vec![1, 3]);
        assert_eq!(source.query(&Rect::new(105.0, 105.0, 200.0, 200.0)).unwrap(), vec![2]);
        // touching edges intersect
        assert_eq!(source.query(&Rect::new(20.0, 10.0, 30.0, 30.0)).unwrap(), vec![1]);
        assert!(source.query(&Rect::new(50.0, 50.0, 60.0, 60.0)).unwrap().is_empty());
        assert!(source.query(&Rect::default()).unwrap().is_empty());
    }

    #[test]
    fn lookup_by_id() {
        let source = source();
        assert_eq!(source.feature(4).unwrap().unwrap().id, 4);
        assert!(source.feature(99).unwrap().is_none());
    }
}
