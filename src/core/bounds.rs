use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// An extent in the `[min_x, min_y, max_x, max_y]` array form used by the
/// backend configuration and WFS envelopes
pub type Extent = [f64; 4];

/// Represents a bounding box in projected map coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Creates new bounds from two points
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    /// Creates bounds from an extent array
    pub fn from_extent(extent: Extent) -> Self {
        Self::from_coords(extent[0], extent[1], extent[2], extent[3])
    }

    /// Creates bounds from a center point and size
    pub fn from_center_and_size(center: Point, width: f64, height: f64) -> Self {
        let half_width = width / 2.0;
        let half_height = height / 2.0;
        Self::new(
            Point::new(center.x - half_width, center.y - half_height),
            Point::new(center.x + half_width, center.y + half_height),
        )
    }

    /// Converts to the extent array form
    pub fn to_extent(&self) -> Extent {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }

    /// Gets the width of the bounds
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Gets the height of the bounds
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Checks if the bounds intersect with another bounds
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y)
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &Point) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Extends the bounds to include another bounds
    pub fn extend_bounds(&mut self, other: &Bounds) {
        self.extend(&other.min);
        self.extend(&other.max);
    }

    /// Returns a new bounds expanded by the given amount on every side
    pub fn expanded(&self, amount: f64) -> Bounds {
        Bounds::new(
            Point::new(self.min.x - amount, self.min.y - amount),
            Point::new(self.max.x + amount, self.max.y + amount),
        )
    }

    /// Checks if the bounds are valid (min <= max, finite coordinates)
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
    }

    /// Gets the area of the bounds
    pub fn area(&self) -> f64 {
        if !self.is_valid() {
            0.0
        } else {
            self.width() * self.height()
        }
    }

    /// Gets the four corner points of the bounds
    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
        ]
    }

    /// Creates empty bounds (invalid bounds that can be extended)
    pub fn empty() -> Self {
        Self::new(
            Point::new(f64::INFINITY, f64::INFINITY),
            Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        )
    }

    /// Converts the bounds to a closed `geo` polygon for boolean operations
    pub fn to_polygon(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(
            geo::LineString::from(vec![
                (self.min.x, self.min.y),
                (self.max.x, self.min.y),
                (self.max.x, self.max.y),
                (self.min.x, self.max.y),
                (self.min.x, self.min.y),
            ]),
            vec![],
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(Point::new(0.0, 0.0), Point::new(0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_creation() {
        let bounds = Bounds::from_coords(10.0, 20.0, 30.0, 40.0);
        assert_eq!(bounds.width(), 20.0);
        assert_eq!(bounds.height(), 20.0);
        assert_eq!(bounds.center(), Point::new(20.0, 30.0));
    }

    #[test]
    fn test_bounds_extent_roundtrip() {
        let extent = [0.0, 0.0, 100.0, 100.0];
        assert_eq!(Bounds::from_extent(extent).to_extent(), extent);
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = Bounds::from_coords(10.0, 20.0, 30.0, 40.0);
        assert!(bounds.contains(&Point::new(15.0, 25.0)));
        assert!(!bounds.contains(&Point::new(5.0, 25.0)));
    }

    #[test]
    fn test_bounds_intersects() {
        let bounds1 = Bounds::from_coords(0.0, 0.0, 10.0, 10.0);
        let bounds2 = Bounds::from_coords(5.0, 5.0, 15.0, 15.0);
        let bounds3 = Bounds::from_coords(20.0, 20.0, 25.0, 25.0);

        assert!(bounds1.intersects(&bounds2));
        assert!(!bounds1.intersects(&bounds3));
    }

    #[test]
    fn test_bounds_to_polygon_area() {
        use geo::Area;
        let bounds = Bounds::from_coords(0.0, 0.0, 10.0, 20.0);
        assert_eq!(bounds.to_polygon().unsigned_area(), 200.0);
    }
}
