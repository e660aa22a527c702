//! Area-coverage tracking.
//!
//! Per layer, the cache keeps the union of geographic areas already
//! fetched so repeated pans never refetch the same ground. Stored
//! polygons are pairwise disjoint: every insertion merges the new area
//! with whatever it touches, so the set stays minimal while only ever
//! growing in total area.

use geo::{Area, BooleanOps, Intersects, MultiPolygon, Polygon};

use crate::{core::bounds::Bounds, prelude::HashMap};

/// Area below which a remainder counts as fully covered, in square map units
const COVERAGE_EPSILON: f64 = 1e-6;

/// Per-layer record of already-fetched areas
#[derive(Default)]
pub struct CoverageCache {
    areas: HashMap<String, Vec<Polygon<f64>>>,
}

impl CoverageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `bbox` has been fetched for the layer.
    ///
    /// Every stored polygon intersecting the new area is merged into it;
    /// non-intersecting polygons pass through unchanged. A failed merge
    /// keeps the pre-existing polygon rather than dropping coverage.
    pub fn add_fetched_area(&mut self, layer: &str, bbox: &Bounds) {
        if !bbox.is_valid() {
            log::warn!("ignoring invalid fetched area for layer {layer}");
            return;
        }

        let entry = self.areas.entry(layer.to_string()).or_default();
        let mut merged = bbox.to_polygon();
        let mut kept = Vec::with_capacity(entry.len() + 1);

        for existing in entry.drain(..) {
            if existing.intersects(&merged) {
                match try_union(&merged, &existing) {
                    Some(union) => merged = union,
                    None => {
                        log::warn!("degenerate geometry while merging coverage for {layer}");
                        kept.push(existing);
                    }
                }
            } else {
                kept.push(existing);
            }
        }

        kept.push(merged);
        *entry = kept;
    }

    /// The covered polygons recorded for a layer
    pub fn polygons(&self, layer: &str) -> &[Polygon<f64>] {
        self.areas.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the bbox lies entirely inside the layer's covered area
    pub fn is_covered(&self, layer: &str, bbox: &Bounds) -> bool {
        is_fully_covered(self.polygons(layer), bbox)
    }

    /// Drops a layer's coverage record (used by explicit full reloads)
    pub fn clear_layer(&mut self, layer: &str) {
        self.areas.remove(layer);
    }

    /// Total covered area for a layer. Stored polygons are disjoint, so
    /// the plain sum is exact.
    pub fn total_area(&self, layer: &str) -> f64 {
        self.polygons(layer).iter().map(|p| p.unsigned_area()).sum()
    }
}

/// Containment of `bbox` in the union of `covered`, computed as a
/// difference-area test: nothing remains of the bbox once every covered
/// polygon is subtracted
pub fn is_fully_covered(covered: &[Polygon<f64>], bbox: &Bounds) -> bool {
    if covered.is_empty() || !bbox.is_valid() {
        return false;
    }

    let mut remaining = MultiPolygon::new(vec![bbox.to_polygon()]);
    for polygon in covered {
        let Some(difference) = try_difference(&remaining, polygon) else {
            // Unreliable geometry: treat the area as uncovered and refetch
            return false;
        };
        remaining = difference;
        if remaining.unsigned_area() <= COVERAGE_EPSILON {
            return true;
        }
    }

    remaining.unsigned_area() <= COVERAGE_EPSILON
}

fn polygon_is_sane(polygon: &Polygon<f64>) -> bool {
    let exterior = polygon.exterior();
    exterior.0.len() >= 4 && exterior.0.iter().all(|c| c.x.is_finite() && c.y.is_finite())
}

/// Union of two intersecting polygons. The boolean-op kernel aborts on
/// degenerate rings, so inputs are validated and the operation is
/// isolated; `None` signals "leave the inputs unmerged".
fn try_union(a: &Polygon<f64>, b: &Polygon<f64>) -> Option<Polygon<f64>> {
    if !polygon_is_sane(a) || !polygon_is_sane(b) {
        return None;
    }
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| a.union(b))).ok()?;
    // Intersecting inputs union into a single connected polygon; anything
    // else means the kernel gave up on the geometry
    match result.0.len() {
        1 => result.0.into_iter().next(),
        _ => None,
    }
}

fn try_difference(a: &MultiPolygon<f64>, b: &Polygon<f64>) -> Option<MultiPolygon<f64>> {
    if !polygon_is_sane(b) || !a.0.iter().all(polygon_is_sane) {
        return None;
    }
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        a.difference(&MultiPolygon::new(vec![b.clone()]))
    }))
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYER: &str = "traffic_sign_real";

    fn bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Bounds {
        Bounds::from_coords(min_x, min_y, max_x, max_y)
    }

    #[test]
    fn test_empty_cache_covers_nothing() {
        let cache = CoverageCache::new();
        assert!(!cache.is_covered(LAYER, &bounds(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_added_area_is_covered() {
        let mut cache = CoverageCache::new();
        cache.add_fetched_area(LAYER, &bounds(0.0, 0.0, 100.0, 100.0));
        assert!(cache.is_covered(LAYER, &bounds(0.0, 0.0, 100.0, 100.0)));
        assert!(cache.is_covered(LAYER, &bounds(10.0, 10.0, 50.0, 50.0)));
        assert!(!cache.is_covered(LAYER, &bounds(50.0, 50.0, 150.0, 150.0)));
    }

    #[test]
    fn test_coverage_is_per_layer() {
        let mut cache = CoverageCache::new();
        cache.add_fetched_area(LAYER, &bounds(0.0, 0.0, 100.0, 100.0));
        assert!(!cache.is_covered("other_layer", &bounds(10.0, 10.0, 20.0, 20.0)));
    }

    #[test]
    fn test_intersecting_areas_merge() {
        let mut cache = CoverageCache::new();
        cache.add_fetched_area(LAYER, &bounds(0.0, 0.0, 60.0, 100.0));
        cache.add_fetched_area(LAYER, &bounds(40.0, 0.0, 100.0, 100.0));
        // Merged into one polygon covering the full rectangle
        assert_eq!(cache.polygons(LAYER).len(), 1);
        assert!(cache.is_covered(LAYER, &bounds(0.0, 0.0, 100.0, 100.0)));
    }

    #[test]
    fn test_disjoint_areas_stay_separate() {
        let mut cache = CoverageCache::new();
        cache.add_fetched_area(LAYER, &bounds(0.0, 0.0, 10.0, 10.0));
        cache.add_fetched_area(LAYER, &bounds(50.0, 50.0, 60.0, 60.0));
        assert_eq!(cache.polygons(LAYER).len(), 2);
        assert!(!cache.is_covered(LAYER, &bounds(0.0, 0.0, 60.0, 60.0)));
    }

    #[test]
    fn test_union_is_order_independent() {
        let a = bounds(0.0, 0.0, 60.0, 100.0);
        let b = bounds(40.0, 0.0, 100.0, 100.0);

        let mut forward = CoverageCache::new();
        forward.add_fetched_area(LAYER, &a);
        forward.add_fetched_area(LAYER, &b);

        let mut reverse = CoverageCache::new();
        reverse.add_fetched_area(LAYER, &b);
        reverse.add_fetched_area(LAYER, &a);

        assert!((forward.total_area(LAYER) - reverse.total_area(LAYER)).abs() < 1e-6);
        assert!((forward.total_area(LAYER) - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_adding_same_bbox_twice_is_idempotent() {
        let mut cache = CoverageCache::new();
        let area = bounds(0.0, 0.0, 100.0, 100.0);
        cache.add_fetched_area(LAYER, &area);
        let first = cache.total_area(LAYER);
        cache.add_fetched_area(LAYER, &area);
        assert!((cache.total_area(LAYER) - first).abs() < 1e-6);
        assert_eq!(cache.polygons(LAYER).len(), 1);
    }

    #[test]
    fn test_invalid_bbox_keeps_existing_coverage() {
        let mut cache = CoverageCache::new();
        cache.add_fetched_area(LAYER, &bounds(0.0, 0.0, 100.0, 100.0));
        cache.add_fetched_area(LAYER, &bounds(f64::NAN, 0.0, 10.0, 10.0));
        assert_eq!(cache.polygons(LAYER).len(), 1);
        assert!(cache.is_covered(LAYER, &bounds(10.0, 10.0, 20.0, 20.0)));
    }

    #[test]
    fn test_clear_layer() {
        let mut cache = CoverageCache::new();
        cache.add_fetched_area(LAYER, &bounds(0.0, 0.0, 100.0, 100.0));
        cache.clear_layer(LAYER);
        assert!(!cache.is_covered(LAYER, &bounds(10.0, 10.0, 20.0, 20.0)));
    }
}
