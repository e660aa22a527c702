//! # inframap
//!
//! A headless, async-aware map engine for municipal infrastructure data
//! (traffic signs, city furniture) overlaid on WMS/WFS basemaps.
//!
//! The engine owns layer state, incremental spatial fetching with
//! area-coverage tracking, click resolution across overlapping and
//! clustered layers, and plan/real device-pair differencing. Rendering
//! and UI chrome live outside the crate: the engine consumes a
//! [`render::Renderer`] capability and reports results through observer
//! registrations.

pub mod core;
pub mod data;
pub mod layers;
pub mod net;
pub mod query;
pub mod render;
pub mod spatial;
pub mod style;

pub mod prelude;

// Re-export public API
pub use crate::core::{
    bounds::Bounds,
    config::{MapConfig, OverlayLayerConfig},
    geo::{LonLat, Point, Projection},
    map::MapEngine,
    view::MapView,
};

pub use data::{
    feature::{Feature, FeatureId},
    geojson::Geometry,
};

pub use layers::{diff::DiffEngine, manager::LayerManager, source::FeatureSource};

pub use input::hit_test::HitTestResolver;

pub use query::{coverage::CoverageCache, filter::{QueryBuilder, QueryOutcome}};

pub use spatial::{clustering::Cluster, index::SpatialIndex};

pub use style::{resolve_feature_style, IconSettings, StylePrimitive};

pub use net::service::{FeatureService, HttpFeatureService};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error type alias for convenience
pub type Error = MapError;
