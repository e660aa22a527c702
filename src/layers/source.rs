//! In-memory feature sources.
//!
//! Each overlay layer owns one [`FeatureSource`]: a feature store plus an
//! R-tree index. Fetch completions merge into the source rather than
//! replacing it, so already-rendered features survive incremental loads.
//! Whether a layer presents raw features or pre-clustered aggregates is a
//! mode tag fixed at configuration time, not a separate code path.

use crate::{
    core::{bounds::Bounds, geo::Point},
    data::feature::{Feature, FeatureId},
    prelude::HashMap,
    spatial::{
        clustering::{cluster_features, Cluster, DEFAULT_CLUSTER_RADIUS_PX},
        index::SpatialIndex,
    },
};

/// How a layer presents its visible feature set; fixed for the layer's
/// lifetime by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    Plain,
    Clustered,
}

/// The visible feature set of one layer for a style or hit-test pass
#[derive(Debug, Clone)]
pub enum VisibleSet {
    Plain(Vec<Feature>),
    Clustered(Vec<Cluster>),
}

/// One layer's live feature store
pub struct FeatureSource {
    mode: ProviderMode,
    features: HashMap<FeatureId, Feature>,
    /// Insertion order, for deterministic iteration and hit ordering
    order: Vec<FeatureId>,
    index: SpatialIndex,
}

impl FeatureSource {
    pub fn new(mode: ProviderMode) -> Self {
        Self {
            mode,
            features: HashMap::default(),
            order: Vec::new(),
            index: SpatialIndex::new(),
        }
    }

    pub fn mode(&self) -> ProviderMode {
        self.mode
    }

    /// Merges features into the source. Existing ids are replaced in
    /// place; new ids append, preserving iteration order of survivors.
    pub fn add_features(&mut self, features: Vec<Feature>) {
        for feature in features {
            let Some(bounds) = feature.geometry.bounds() else {
                log::debug!("skipping feature {} without coordinates", feature.id);
                continue;
            };
            if self.features.insert(feature.id.clone(), feature.clone()).is_some() {
                self.index.remove(&feature.id);
            } else {
                self.order.push(feature.id.clone());
            }
            self.index.insert(feature.id, bounds);
        }
    }

    /// Drops every feature (explicit full reload)
    pub fn clear(&mut self) {
        self.features.clear();
        self.order.clear();
        self.index.clear();
    }

    pub fn get(&self, id: &FeatureId) -> Option<&Feature> {
        self.features.get(id)
    }

    /// Features in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.order.iter().filter_map(|id| self.features.get(id))
    }

    /// Features whose geometry exactly contains the coordinate, in
    /// insertion order
    pub fn features_at_coordinate(&self, coordinate: &Point) -> Vec<&Feature> {
        let mut candidates: Vec<&FeatureId> = self.index.query_point(coordinate);
        candidates.sort_by_key(|id| self.order.iter().position(|o| &o == id));
        candidates
            .into_iter()
            .filter_map(|id| self.features.get(id))
            .filter(|f| f.geometry.contains_coordinate(coordinate))
            .collect()
    }

    /// The visible feature set at a given resolution: raw features for
    /// plain layers, pixel-radius clusters for clustered layers
    pub fn visible_set(&self, resolution: f64) -> VisibleSet {
        match self.mode {
            ProviderMode::Plain => VisibleSet::Plain(self.iter().cloned().collect()),
            ProviderMode::Clustered => VisibleSet::Clustered(cluster_features(
                self.iter(),
                resolution,
                DEFAULT_CLUSTER_RADIUS_PX,
            )),
        }
    }

    /// Features in a bounding box, in insertion order
    pub fn features_in(&self, bounds: &Bounds) -> Vec<&Feature> {
        let mut candidates: Vec<&FeatureId> = self.index.query(bounds);
        candidates.sort_by_key(|id| self.order.iter().position(|o| &o == id));
        candidates
            .into_iter()
            .filter_map(|id| self.features.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geojson::Geometry;

    fn feature(local: &str, x: f64, y: f64) -> Feature {
        Feature::new(
            FeatureId::new("traffic_sign_real", local),
            Geometry::Point {
                coordinates: [x, y],
            },
        )
    }

    #[test]
    fn test_add_merges_instead_of_replacing() {
        let mut source = FeatureSource::new(ProviderMode::Plain);
        source.add_features(vec![feature("a", 0.0, 0.0)]);
        source.add_features(vec![feature("b", 10.0, 10.0)]);
        assert_eq!(source.len(), 2);

        // Re-adding an existing id updates it in place
        source.add_features(vec![feature("a", 5.0, 5.0)]);
        assert_eq!(source.len(), 2);
        assert!(source
            .features_at_coordinate(&Point::new(5.0, 5.0))
            .iter()
            .any(|f| f.id.local() == "a"));
    }

    #[test]
    fn test_iteration_order_is_stable() {
        let mut source = FeatureSource::new(ProviderMode::Plain);
        source.add_features(vec![feature("a", 0.0, 0.0), feature("b", 1.0, 1.0)]);
        source.add_features(vec![feature("c", 2.0, 2.0)]);
        let order: Vec<&str> = source.iter().map(|f| f.id.local()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_exact_coordinate_hit() {
        let mut source = FeatureSource::new(ProviderMode::Plain);
        source.add_features(vec![feature("a", 25_496_040.0, 6_676_200.0)]);

        let hits = source.features_at_coordinate(&Point::new(25_496_040.0, 6_676_200.0));
        assert_eq!(hits.len(), 1);
        assert!(source
            .features_at_coordinate(&Point::new(25_496_041.0, 6_676_200.0))
            .is_empty());
    }

    #[test]
    fn test_visible_set_respects_mode() {
        let mut plain = FeatureSource::new(ProviderMode::Plain);
        plain.add_features(vec![feature("a", 0.0, 0.0), feature("b", 1.0, 0.0)]);
        assert!(matches!(plain.visible_set(1.0), VisibleSet::Plain(f) if f.len() == 2));

        let mut clustered = FeatureSource::new(ProviderMode::Clustered);
        clustered.add_features(vec![feature("a", 0.0, 0.0), feature("b", 1.0, 0.0)]);
        match clustered.visible_set(1.0) {
            VisibleSet::Clustered(clusters) => {
                assert_eq!(clusters.len(), 1);
                assert_eq!(clusters[0].count(), 2);
            }
            other => panic!("expected clusters, got {other:?}"),
        }
    }

    #[test]
    fn test_clear() {
        let mut source = FeatureSource::new(ProviderMode::Plain);
        source.add_features(vec![feature("a", 0.0, 0.0)]);
        source.clear();
        assert!(source.is_empty());
        assert!(source
            .features_at_coordinate(&Point::new(0.0, 0.0))
            .is_empty());
    }
}
