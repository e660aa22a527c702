use crate::core::{
    bounds::Bounds,
    geo::{Point, Projection},
};

/// Resolution ladder used when the configuration does not provide one,
/// in map units per pixel from the most zoomed-out level down
pub const DEFAULT_RESOLUTIONS: [f64; 13] = [
    256.0, 128.0, 64.0, 32.0, 16.0, 8.0, 4.0, 2.0, 1.0, 0.5, 0.25, 0.125, 0.0625,
];

/// The map view state: projection, center, zoom/resolution and viewport
/// size. Mutated only by pan/zoom and search-driven recentering; the
/// current visible extent drives every fetch decision.
#[derive(Debug, Clone)]
pub struct MapView {
    projection: Projection,
    center: Point,
    resolutions: Vec<f64>,
    zoom: usize,
    /// Viewport size in pixels
    size: Point,
}

impl MapView {
    pub fn new(projection: Projection, center: Point, zoom: usize, size: Point) -> Self {
        let resolutions = DEFAULT_RESOLUTIONS.to_vec();
        let zoom = zoom.min(resolutions.len() - 1);
        Self {
            projection,
            center,
            resolutions,
            zoom,
            size,
        }
    }

    pub fn with_resolutions(mut self, resolutions: Vec<f64>) -> Self {
        if !resolutions.is_empty() {
            self.zoom = self.zoom.min(resolutions.len() - 1);
            self.resolutions = resolutions;
        }
        self
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn zoom(&self) -> usize {
        self.zoom
    }

    /// Current resolution in map units per pixel
    pub fn resolution(&self) -> f64 {
        self.resolutions[self.zoom]
    }

    pub fn size(&self) -> Point {
        self.size
    }

    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    pub fn set_center(&mut self, center: Point) {
        self.center = center;
    }

    pub fn set_zoom(&mut self, zoom: usize) {
        self.zoom = zoom.min(self.resolutions.len() - 1);
    }

    /// Pans the view by a pixel delta
    pub fn pan_by(&mut self, delta: Point) {
        let resolution = self.resolution();
        self.center = Point::new(
            self.center.x + delta.x * resolution,
            self.center.y - delta.y * resolution,
        );
    }

    /// The currently visible extent in map coordinates
    pub fn visible_extent(&self) -> Bounds {
        let resolution = self.resolution();
        Bounds::from_center_and_size(
            self.center,
            self.size.x * resolution,
            self.size.y * resolution,
        )
    }

    /// Converts a viewport pixel (origin top-left, y down) to map coordinates
    pub fn pixel_to_map(&self, pixel: Point) -> Point {
        let resolution = self.resolution();
        let extent = self.visible_extent();
        Point::new(
            extent.min.x + pixel.x * resolution,
            extent.max.y - pixel.y * resolution,
        )
    }

    /// Converts map coordinates to a viewport pixel
    pub fn map_to_pixel(&self, coordinate: Point) -> Point {
        let resolution = self.resolution();
        let extent = self.visible_extent();
        Point::new(
            (coordinate.x - extent.min.x) / resolution,
            (extent.max.y - coordinate.y) / resolution,
        )
    }
}
