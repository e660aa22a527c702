//! Point clustering for dense layers.
//!
//! Clusters are ephemeral aggregates recomputed on every style or
//! hit-test pass: point features within a fixed pixel radius at the
//! current resolution collapse into one cluster feature. Non-point
//! geometries take part through their extent's center point.

use crate::{
    core::geo::Point,
    data::feature::Feature,
};

/// Clustering distance threshold in pixels
pub const DEFAULT_CLUSTER_RADIUS_PX: f64 = 40.0;

/// An ephemeral aggregate of one or more features sharing a display
/// pixel neighborhood
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Anchor coordinate in map units
    pub center: Point,
    /// Member features, in insertion order
    pub members: Vec<Feature>,
}

impl Cluster {
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// A cluster of one renders and hit-tests as its bare member
    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }
}

/// Groups features into clusters using a pixel-distance threshold.
///
/// The threshold is `radius_px` at the given resolution, so the same
/// feature set clusters differently at every zoom level. Each feature
/// joins the first cluster whose anchor lies within the threshold,
/// otherwise it opens a new cluster anchored at its own reference point.
pub fn cluster_features<'a, I>(features: I, resolution: f64, radius_px: f64) -> Vec<Cluster>
where
    I: IntoIterator<Item = &'a Feature>,
{
    let threshold = radius_px * resolution;
    let mut clusters: Vec<Cluster> = Vec::new();

    for feature in features {
        let Some(anchor) = feature.geometry.reference_point() else {
            continue;
        };

        match clusters
            .iter_mut()
            .find(|cluster| cluster.center.distance_to(&anchor) <= threshold)
        {
            Some(cluster) => cluster.members.push(feature.clone()),
            None => clusters.push(Cluster {
                center: anchor,
                members: vec![feature.clone()],
            }),
        }
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{feature::FeatureId, geojson::Geometry};

    fn point_feature(local: &str, x: f64, y: f64) -> Feature {
        Feature::new(
            FeatureId::new("furniture_real", local),
            Geometry::Point {
                coordinates: [x, y],
            },
        )
    }

    #[test]
    fn test_nearby_points_cluster() {
        let features = vec![
            point_feature("a", 0.0, 0.0),
            point_feature("b", 10.0, 0.0),
            point_feature("c", 0.0, 10.0),
        ];
        // 40 px at resolution 1.0 => 40 map units
        let clusters = cluster_features(&features, 1.0, DEFAULT_CLUSTER_RADIUS_PX);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count(), 3);
    }

    #[test]
    fn test_distant_points_stay_apart() {
        let features = vec![point_feature("a", 0.0, 0.0), point_feature("b", 100.0, 0.0)];
        let clusters = cluster_features(&features, 1.0, DEFAULT_CLUSTER_RADIUS_PX);
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(Cluster::is_single));
    }

    #[test]
    fn test_threshold_scales_with_resolution() {
        let features = vec![point_feature("a", 0.0, 0.0), point_feature("b", 100.0, 0.0)];
        // Zoomed out: 40 px covers 160 map units, so the points merge
        let clusters = cluster_features(&features, 4.0, DEFAULT_CLUSTER_RADIUS_PX);
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn test_non_point_geometry_uses_extent_center() {
        let line = Feature::new(
            FeatureId::new("furniture_real", "line"),
            Geometry::LineString {
                coordinates: vec![[0.0, 0.0], [20.0, 0.0]],
            },
        );
        let features = vec![line, point_feature("p", 12.0, 0.0)];
        let clusters = cluster_features(&features, 1.0, DEFAULT_CLUSTER_RADIUS_PX);
        // Line center (10, 0) is within 40 units of (12, 0)
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count(), 2);
    }
}
