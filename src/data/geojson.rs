use serde::{Deserialize, Serialize};

use crate::core::{bounds::Bounds, geo::Point};

/// Geometry in projected map coordinates, mirroring the GeoJSON geometry
/// vocabulary. The extra `Circle` variant covers radius geometries the
/// backend produces for certain device areas; it never appears in plain
/// GeoJSON payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
    Circle {
        center: [f64; 2],
        radius: f64,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
}

const LINE_TOLERANCE: f64 = 1e-9;

impl Geometry {
    /// Exact containment/intersection test of a click coordinate against
    /// the geometry: point equality, line intersection, polygon
    /// containment, circle radius, recursively for collections.
    pub fn contains_coordinate(&self, coordinate: &Point) -> bool {
        match self {
            Geometry::Point { coordinates } => {
                coordinates[0] == coordinate.x && coordinates[1] == coordinate.y
            }
            Geometry::MultiPoint { coordinates } => coordinates
                .iter()
                .any(|c| c[0] == coordinate.x && c[1] == coordinate.y),
            Geometry::LineString { coordinates } => point_on_line(coordinate, coordinates),
            Geometry::MultiLineString { coordinates } => coordinates
                .iter()
                .any(|line| point_on_line(coordinate, line)),
            Geometry::Polygon { coordinates } => point_in_rings(coordinate, coordinates),
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .any(|polygon| point_in_rings(coordinate, polygon)),
            Geometry::Circle { center, radius } => {
                let dx = coordinate.x - center[0];
                let dy = coordinate.y - center[1];
                (dx * dx + dy * dy).sqrt() <= *radius
            }
            Geometry::GeometryCollection { geometries } => geometries
                .iter()
                .any(|geometry| geometry.contains_coordinate(coordinate)),
        }
    }

    /// The geometry's bounding box, if it has any coordinates
    pub fn bounds(&self) -> Option<Bounds> {
        let mut bounds = Bounds::empty();
        self.extend_bounds(&mut bounds);
        bounds.is_valid().then_some(bounds)
    }

    fn extend_bounds(&self, bounds: &mut Bounds) {
        match self {
            Geometry::Point { coordinates } => bounds.extend(&Point::from(*coordinates)),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                for c in coordinates {
                    bounds.extend(&Point::from(*c));
                }
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                for line in coordinates {
                    for c in line {
                        bounds.extend(&Point::from(*c));
                    }
                }
            }
            Geometry::MultiPolygon { coordinates } => {
                for polygon in coordinates {
                    for ring in polygon {
                        for c in ring {
                            bounds.extend(&Point::from(*c));
                        }
                    }
                }
            }
            Geometry::Circle { center, radius } => {
                bounds.extend(&Point::new(center[0] - radius, center[1] - radius));
                bounds.extend(&Point::new(center[0] + radius, center[1] + radius));
            }
            Geometry::GeometryCollection { geometries } => {
                for geometry in geometries {
                    geometry.extend_bounds(bounds);
                }
            }
        }
    }

    /// The reference point used for distance computation and clustering:
    /// the point itself for point geometries, the extent center otherwise
    pub fn reference_point(&self) -> Option<Point> {
        match self {
            Geometry::Point { coordinates } => Some(Point::from(*coordinates)),
            _ => self.bounds().map(|b| b.center()),
        }
    }

    /// Whether this is a bare point geometry
    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Point { .. })
    }

    /// Coarse classification used for shape-style selection
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point { .. } | Geometry::MultiPoint { .. } => GeometryKind::Point,
            Geometry::LineString { .. } | Geometry::MultiLineString { .. } => GeometryKind::Line,
            Geometry::Polygon { .. }
            | Geometry::MultiPolygon { .. }
            | Geometry::Circle { .. } => GeometryKind::Area,
            Geometry::GeometryCollection { .. } => GeometryKind::Collection,
        }
    }
}

/// Coarse geometry classes with distinct default styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    Line,
    Area,
    Collection,
}

/// Point-in-polygon over a ring set: inside the exterior ring and outside
/// every interior ring
fn point_in_rings(point: &Point, rings: &[Vec<[f64; 2]>]) -> bool {
    let Some(exterior) = rings.first() else {
        return false;
    };
    if !point_in_ring(point, exterior) {
        return false;
    }
    !rings[1..].iter().any(|hole| point_in_ring(point, hole))
}

fn point_in_ring(point: &Point, ring: &[[f64; 2]]) -> bool {
    if ring.is_empty() {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let xi = ring[i][0];
        let yi = ring[i][1];
        let xj = ring[j][0];
        let yj = ring[j][1];

        if ((yi > point.y) != (yj > point.y))
            && (point.x < (xj - xi) * (point.y - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

fn point_on_line(point: &Point, line: &[[f64; 2]]) -> bool {
    for i in 0..line.len().saturating_sub(1) {
        let distance = point_to_segment_distance(
            point.x, point.y, line[i][0], line[i][1], line[i + 1][0], line[i + 1][1],
        );
        if distance < LINE_TOLERANCE {
            return true;
        }
    }
    false
}

fn point_to_segment_distance(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;

    if dx == 0.0 && dy == 0.0 {
        return ((px - x1).powi(2) + (py - y1).powi(2)).sqrt();
    }

    let t = (((px - x1) * dx + (py - y1) * dy) / (dx * dx + dy * dy)).clamp(0.0, 1.0);

    let closest_x = x1 + t * dx;
    let closest_y = y1 + t * dy;

    ((px - closest_x).powi(2) + (py - closest_y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_contains_itself() {
        let geometry = Geometry::Point {
            coordinates: [25_496_040.0, 6_676_200.0],
        };
        assert!(geometry.contains_coordinate(&Point::new(25_496_040.0, 6_676_200.0)));
        assert!(!geometry.contains_coordinate(&Point::new(25_496_041.0, 6_676_200.0)));
    }

    #[test]
    fn test_line_contains_point_on_segment() {
        let geometry = Geometry::LineString {
            coordinates: vec![[0.0, 0.0], [10.0, 0.0]],
        };
        assert!(geometry.contains_coordinate(&Point::new(5.0, 0.0)));
        assert!(!geometry.contains_coordinate(&Point::new(5.0, 1.0)));
    }

    #[test]
    fn test_polygon_containment_with_hole() {
        let geometry = Geometry::Polygon {
            coordinates: vec![
                vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
                vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0], [4.0, 4.0]],
            ],
        };
        assert!(geometry.contains_coordinate(&Point::new(2.0, 2.0)));
        assert!(!geometry.contains_coordinate(&Point::new(5.0, 5.0)));
        assert!(!geometry.contains_coordinate(&Point::new(15.0, 5.0)));
    }

    #[test]
    fn test_circle_radius_test() {
        let geometry = Geometry::Circle {
            center: [0.0, 0.0],
            radius: 5.0,
        };
        assert!(geometry.contains_coordinate(&Point::new(3.0, 4.0)));
        assert!(!geometry.contains_coordinate(&Point::new(4.0, 4.0)));
    }

    #[test]
    fn test_collection_recurses() {
        let geometry = Geometry::GeometryCollection {
            geometries: vec![
                Geometry::Point {
                    coordinates: [1.0, 1.0],
                },
                Geometry::Circle {
                    center: [10.0, 10.0],
                    radius: 2.0,
                },
            ],
        };
        assert!(geometry.contains_coordinate(&Point::new(1.0, 1.0)));
        assert!(geometry.contains_coordinate(&Point::new(11.0, 10.0)));
        assert!(!geometry.contains_coordinate(&Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_reference_point() {
        let point = Geometry::Point {
            coordinates: [3.0, 4.0],
        };
        assert_eq!(point.reference_point(), Some(Point::new(3.0, 4.0)));

        let line = Geometry::LineString {
            coordinates: vec![[0.0, 0.0], [10.0, 20.0]],
        };
        assert_eq!(line.reference_point(), Some(Point::new(5.0, 10.0)));
    }

    #[test]
    fn test_geojson_wire_parsing() {
        let json = r#"{"type": "Point", "coordinates": [25496040.0, 6676200.0]}"#;
        let geometry: Geometry = serde_json::from_str(json).unwrap();
        assert!(geometry.is_point());
    }
}
