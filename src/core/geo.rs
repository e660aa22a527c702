use serde::{Deserialize, Serialize};

use crate::core::bounds::Extent;

/// GRS80 ellipsoid constants
const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_222_101;

/// Represents a point in projected map coordinates (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    /// Euclidean distance in map units
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl From<[f64; 2]> for Point {
    fn from(coords: [f64; 2]) -> Self {
        Self::new(coords[0], coords[1])
    }
}

/// Represents a geographical coordinate in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lon >= -180.0 && self.lon <= 180.0
    }
}

/// A transverse-Mercator map projection over the GRS80 ellipsoid.
///
/// Municipal coordinate systems of the ETRS89-GK family (EPSG:3879 and
/// friends) are plain Gauss-Kruger zones: a central meridian, unit scale
/// factor and a large false easting. The forward and inverse transforms
/// below follow the standard series expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Projection code, e.g. "EPSG:3879"
    pub code: String,
    /// Validity extent in projected coordinates
    pub extent: Extent,
    /// Central meridian in degrees
    pub central_meridian: f64,
    /// False easting in meters
    pub false_easting: f64,
}

impl Projection {
    pub fn new(code: &str, extent: Extent, central_meridian: f64, false_easting: f64) -> Self {
        Self {
            code: code.to_string(),
            extent,
            central_meridian,
            false_easting,
        }
    }

    /// The Helsinki-region ETRS89-GK25 projection (EPSG:3879)
    pub fn epsg_3879() -> Self {
        Self::new(
            "EPSG:3879",
            [25_440_000.0, 6_630_000.0, 25_571_072.0, 6_761_072.0],
            25.0,
            25_500_000.0,
        )
    }

    /// Projects a WGS84 coordinate into map coordinates
    pub fn project(&self, coord: &LonLat) -> Point {
        let e2 = FLATTENING * (2.0 - FLATTENING);
        let ep2 = e2 / (1.0 - e2);

        let phi = coord.lat.to_radians();
        let dlam = (coord.lon - self.central_meridian).to_radians();

        let sin_phi = phi.sin();
        let cos_phi = phi.cos();

        let n = SEMI_MAJOR_AXIS / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = (phi.tan()).powi(2);
        let c = ep2 * cos_phi * cos_phi;
        let a = dlam * cos_phi;

        let m = meridional_arc(phi, e2);

        let x = self.false_easting
            + n * (a
                + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);
        let y = m
            + n * phi.tan()
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0);

        Point::new(x, y)
    }

    /// Unprojects map coordinates back into WGS84
    pub fn unproject(&self, point: &Point) -> LonLat {
        let e2 = FLATTENING * (2.0 - FLATTENING);
        let ep2 = e2 / (1.0 - e2);
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let x = point.x - self.false_easting;
        let m = point.y;

        // Footpoint latitude
        let mu = m
            / (SEMI_MAJOR_AXIS
                * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0));
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();

        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = (phi1.tan()).powi(2);
        let n1 = SEMI_MAJOR_AXIS / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
        let r1 = SEMI_MAJOR_AXIS * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
        let d = x / n1;

        let lat = phi1
            - (n1 * phi1.tan() / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lon = self.central_meridian.to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        LonLat::new(lon.to_degrees(), lat.to_degrees())
    }
}

/// Meridional arc length from the equator to latitude `phi`
fn meridional_arc(phi: f64, e2: f64) -> f64 {
    SEMI_MAJOR_AXIS
        * ((1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e2 * e2 / 32.0 + 45.0 * e2.powi(3) / 1024.0)
                * (2.0 * phi).sin()
            + (15.0 * e2 * e2 / 256.0 + 45.0 * e2.powi(3) / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e2.powi(3) / 3072.0) * (6.0 * phi).sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn test_lonlat_validity() {
        assert!(LonLat::new(24.94, 60.17).is_valid());
        assert!(!LonLat::new(200.0, 60.17).is_valid());
        assert!(!LonLat::new(24.94, 95.0).is_valid());
    }

    #[test]
    fn test_projection_central_meridian_maps_to_false_easting() {
        let proj = Projection::epsg_3879();
        let projected = proj.project(&LonLat::new(25.0, 60.2));
        assert!((projected.x - 25_500_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_projection_roundtrip() {
        let proj = Projection::epsg_3879();
        let original = LonLat::new(24.941, 60.172);
        let projected = proj.project(&original);
        let back = proj.unproject(&projected);
        assert!((back.lon - original.lon).abs() < 1e-7);
        assert!((back.lat - original.lat).abs() < 1e-7);
    }

    #[test]
    fn test_helsinki_projects_inside_extent() {
        let proj = Projection::epsg_3879();
        let projected = proj.project(&LonLat::new(24.941, 60.172));
        let [min_x, min_y, max_x, max_y] = proj.extent;
        assert!(projected.x > min_x && projected.x < max_x);
        assert!(projected.y > min_y && projected.y < max_y);
    }
}
