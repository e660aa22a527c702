//! Prelude module for common inframap types and traits
//!
//! Re-exports the most commonly used types, traits, and functions for the
//! crate's internal modules.

pub use crate::core::{
    bounds::{Bounds, Extent},
    config::{LayerConfig, MapConfig, OverlayLayerConfig},
    geo::{LonLat, Point, Projection},
    view::MapView,
};

pub use crate::data::{
    feature::{Feature, FeatureId},
    geojson::Geometry,
};

pub use crate::{Error as MapError, Result};

pub use instant::Instant;
pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
