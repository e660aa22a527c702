use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::{
    core::{bounds::Bounds, geo::Point},
    data::feature::FeatureId,
};

/// An indexed entry: a feature identity plus the bounding box of its
/// geometry. Feature data itself lives in the owning source; the index
/// only answers "which ids are near here".
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: FeatureId,
    pub bounds: Bounds,
}

impl IndexEntry {
    pub fn new(id: FeatureId, bounds: Bounds) -> Self {
        Self { id, bounds }
    }
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min.x, self.bounds.min.y],
            [self.bounds.max.x, self.bounds.max.y],
        )
    }
}

impl PointDistance for IndexEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let center = self.bounds.center();
        let dx = center.x - point[0];
        let dy = center.y - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.bounds.contains(&Point::new(point[0], point[1]))
    }
}

/// R-tree spatial index over one layer's features
pub struct SpatialIndex {
    rtree: RTree<IndexEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { rtree: RTree::new() }
    }

    pub fn insert(&mut self, id: FeatureId, bounds: Bounds) {
        self.rtree.insert(IndexEntry::new(id, bounds));
    }

    /// Ids of entries whose bounds intersect the query bounds
    pub fn query(&self, bounds: &Bounds) -> Vec<&FeatureId> {
        let envelope =
            AABB::from_corners([bounds.min.x, bounds.min.y], [bounds.max.x, bounds.max.y]);
        self.rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| &entry.id)
            .collect()
    }

    /// Ids of entries whose bounds contain the coordinate
    pub fn query_point(&self, point: &Point) -> Vec<&FeatureId> {
        self.rtree
            .locate_all_at_point(&[point.x, point.y])
            .map(|entry| &entry.id)
            .collect()
    }

    pub fn remove(&mut self, id: &FeatureId) -> bool {
        let found = self.rtree.iter().find(|entry| &entry.id == id).cloned();
        match found {
            Some(entry) => self.rtree.remove(&entry).is_some(),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(local: &str) -> FeatureId {
        FeatureId::new("traffic_sign_real", local)
    }

    #[test]
    fn test_query_by_bounds() {
        let mut index = SpatialIndex::new();
        index.insert(id("a"), Bounds::from_coords(0.0, 0.0, 1.0, 1.0));
        index.insert(id("b"), Bounds::from_coords(100.0, 100.0, 101.0, 101.0));

        let hits = index.query(&Bounds::from_coords(-1.0, -1.0, 2.0, 2.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].local(), "a");
    }

    #[test]
    fn test_query_point() {
        let mut index = SpatialIndex::new();
        index.insert(id("a"), Bounds::from_coords(0.0, 0.0, 10.0, 10.0));

        assert_eq!(index.query_point(&Point::new(5.0, 5.0)).len(), 1);
        assert!(index.query_point(&Point::new(50.0, 50.0)).is_empty());
    }

    #[test]
    fn test_remove() {
        let mut index = SpatialIndex::new();
        index.insert(id("a"), Bounds::from_coords(0.0, 0.0, 1.0, 1.0));
        assert!(index.remove(&id("a")));
        assert!(!index.remove(&id("a")));
        assert!(index.is_empty());
    }
}
