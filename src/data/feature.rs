use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{data::geojson::Geometry, Result};

/// Feature identity of the form `<layerIdentifier>.<uuid>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureId {
    layer: String,
    local: String,
}

impl FeatureId {
    pub fn new(layer: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            local: local.into(),
        }
    }

    /// Parses a `<layer>.<uuid>` identifier. Layer identifiers never
    /// contain dots, so the split happens at the first one.
    pub fn parse(id: &str) -> Result<Self> {
        match id.split_once('.') {
            Some((layer, local)) if !layer.is_empty() && !local.is_empty() => {
                Ok(Self::new(layer, local))
            }
            _ => Err(Box::new(crate::Error::ParseError(format!(
                "malformed feature id: {id:?}"
            )))),
        }
    }

    /// The feature type, i.e. the owning layer's identifier
    pub fn feature_type(&self) -> &str {
        &self.layer
    }

    /// The per-layer unique part of the id
    pub fn local(&self) -> &str {
        &self.local
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.layer, self.local)
    }
}

impl TryFrom<String> for FeatureId {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, String> {
        FeatureId::parse(&value).map_err(|e| e.to_string())
    }
}

impl From<FeatureId> for String {
    fn from(id: FeatureId) -> Self {
        id.to_string()
    }
}

/// A single map feature: a geometry plus an opaque attribute map. Owned
/// by whichever layer source holds it; lifetime bounded by that source's
/// clear/reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Owning app name, attached during hit-testing (requires the
    /// overlay configuration), not at parse time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Geometry) -> Self {
        Self {
            id,
            geometry,
            properties: serde_json::Map::new(),
            app_name: None,
        }
    }

    pub fn with_property(mut self, key: &str, value: serde_json::Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    fn str_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }

    /// Device type code, when present and non-null
    pub fn device_type_code(&self) -> Option<&str> {
        self.str_property("device_type_code")
    }

    /// Overridden icon file name, when present
    pub fn device_type_icon(&self) -> Option<&str> {
        self.str_property("device_type_icon").filter(|s| !s.is_empty())
    }

    /// Reference to the paired plan feature, carried by "real" features
    pub fn device_plan_id(&self) -> Option<&str> {
        self.str_property("device_plan_id").filter(|s| !s.is_empty())
    }

    /// Facing direction in degrees clockwise. The backend serves this as
    /// either a number or a numeric string.
    pub fn direction_degrees(&self) -> Option<f64> {
        match self.properties.get("direction")? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// One feature as it appears in a WFS GeoJSON response
#[derive(Debug, Deserialize)]
struct WireFeature {
    id: Option<String>,
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WireFeatureCollection {
    #[serde(default)]
    features: Vec<WireFeature>,
}

/// Parses a WFS GeoJSON feature collection. Features without an id or a
/// geometry are skipped with a log entry rather than failing the batch.
pub fn parse_feature_collection(body: &str) -> Result<Vec<Feature>> {
    let collection: WireFeatureCollection =
        serde_json::from_str(body).map_err(crate::Error::Serialization)?;

    let mut features = Vec::with_capacity(collection.features.len());
    for wire in collection.features {
        let (Some(id), Some(geometry)) = (wire.id, wire.geometry) else {
            log::debug!("skipping feature without id or geometry");
            continue;
        };
        match FeatureId::parse(&id) {
            Ok(id) => features.push(Feature {
                id,
                geometry,
                properties: wire.properties,
                app_name: None,
            }),
            Err(e) => log::warn!("skipping feature with malformed id: {e}"),
        }
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_id_parse() {
        let id = FeatureId::parse("traffic_sign_real.7b8e…-uuid").unwrap();
        assert_eq!(id.feature_type(), "traffic_sign_real");
        assert_eq!(id.local(), "7b8e…-uuid");
        assert!(FeatureId::parse("no-dot-here").is_err());
        assert!(FeatureId::parse(".missing-layer").is_err());
    }

    #[test]
    fn test_feature_property_accessors() {
        let feature = Feature::new(
            FeatureId::new("traffic_sign_real", "abc"),
            Geometry::Point {
                coordinates: [0.0, 0.0],
            },
        )
        .with_property("device_type_code", serde_json::json!("A1"))
        .with_property("direction", serde_json::json!("45"))
        .with_property("device_plan_id", serde_json::json!(""));

        assert_eq!(feature.device_type_code(), Some("A1"));
        assert_eq!(feature.direction_degrees(), Some(45.0));
        // Empty-string plan id counts as absent
        assert_eq!(feature.device_plan_id(), None);
    }

    #[test]
    fn test_parse_feature_collection_skips_malformed() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "id": "traffic_sign_real.aaa",
                    "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
                    "properties": {"txt": "stop"}
                },
                {
                    "id": "missing_geometry.bbb",
                    "geometry": null,
                    "properties": {}
                },
                {
                    "id": "not-an-id",
                    "geometry": {"type": "Point", "coordinates": [3.0, 4.0]},
                    "properties": {}
                }
            ]
        }"#;

        let features = parse_feature_collection(body).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id.to_string(), "traffic_sign_real.aaa");
        assert_eq!(features[0].properties["txt"], "stop");
    }
}
