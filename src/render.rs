//! Rendering capability boundary.
//!
//! Drawing, projection widgets and raster compositing live outside the
//! engine. The engine only needs one thing back from the renderer: which
//! rendered objects occupy a given pixel, because icon hit regions and
//! antialiased edges extend beyond the exact feature geometry.

use crate::{core::geo::Point, data::feature::FeatureId};

/// A renderer-reported hit at a pixel
#[derive(Debug, Clone, PartialEq)]
pub enum RenderHit {
    /// A plain feature
    Feature(FeatureId),
    /// A cluster symbol; carries its constituent feature ids so the
    /// engine can expand it
    Cluster { members: Vec<FeatureId> },
}

/// Pixel-level hit-testing provided by the host's renderer
pub trait Renderer: Send + Sync {
    /// Rendered objects of `layer` that occupy `pixel`
    fn hits_at_pixel(&self, layer: &str, pixel: Point) -> Vec<RenderHit>;
}

/// Renderer stub reporting no pixel hits; exact geometric hit-testing
/// still works against it
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn hits_at_pixel(&self, _layer: &str, _pixel: Point) -> Vec<RenderHit> {
        Vec::new()
    }
}
