//! Inbound map-configuration models.
//!
//! The backend serves one JSON document describing basemaps, overlay
//! layers, icon settings and admin-link construction data. Field names
//! follow the wire format, which mixes camelCase container keys with
//! snake_case layer attributes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::bounds::Extent;

/// App name used when a feature type has no matching overlay layer
pub const DEFAULT_APP_NAME: &str = "traffic_control";

/// One basemap entry: a WMS layer name plus its display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasemapLayerConfig {
    pub identifier: String,
    pub name: String,
}

/// Extra feature-info field definition: display title plus ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraInfoField {
    pub title: String,
    #[serde(default)]
    pub order: i32,
}

/// One overlay layer descriptor. Immutable once loaded from configuration;
/// the clustered flag in particular is fixed for the layer's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayLayerConfig {
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub filter_fields: Vec<String>,
    #[serde(default)]
    pub use_traffic_sign_icons: bool,
    #[serde(default)]
    pub clustered: bool,
    #[serde(default)]
    pub extra_feature_info: HashMap<String, ExtraInfoField>,
}

impl OverlayLayerConfig {
    pub fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }
}

/// A group of layers sharing one source endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig<T> {
    pub name: String,
    pub layers: Vec<T>,
    #[serde(rename = "sourceUrl")]
    pub source_url: String,
}

impl LayerConfig<OverlayLayerConfig> {
    /// Finds the overlay layer owning the given feature type (the
    /// `<layer>` part of a feature id)
    pub fn layer_for_feature_type(&self, feature_type: &str) -> Option<&OverlayLayerConfig> {
        self.layers.iter().find(|l| l.identifier == feature_type)
    }

    /// The owning app name for a feature type, falling back to the
    /// default app rather than failing lookup
    pub fn app_name_for_feature_type(&self, feature_type: &str) -> &str {
        self.layer_for_feature_type(feature_type)
            .map(|l| l.app_name())
            .unwrap_or(DEFAULT_APP_NAME)
    }
}

/// Static overview image shown next to the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewConfig {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "imageExtent")]
    pub image_extent: Extent,
}

/// Server-provided icon display defaults; user settings validate against
/// these and fall back to them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconDefaults {
    #[serde(default = "default_icon_scale")]
    pub icon_scale: f64,
    #[serde(default = "default_icon_type")]
    pub icon_type: String,
    #[serde(default = "default_icon_size")]
    pub icon_size: u32,
}

fn default_icon_scale() -> f64 {
    1.0
}

fn default_icon_type() -> String {
    "svg".to_string()
}

fn default_icon_size() -> u32 {
    64
}

impl Default for IconDefaults {
    fn default() -> Self {
        Self {
            icon_scale: default_icon_scale(),
            icon_type: default_icon_type(),
            icon_size: default_icon_size(),
        }
    }
}

/// The complete inbound map configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(rename = "basemapConfig")]
    pub basemap_config: LayerConfig<BasemapLayerConfig>,
    #[serde(rename = "overlayConfig")]
    pub overlay_config: LayerConfig<OverlayLayerConfig>,
    #[serde(rename = "overviewConfig")]
    pub overview_config: Option<OverviewConfig>,
    pub traffic_sign_icons_url: String,
    #[serde(rename = "iconDefaults", default)]
    pub icon_defaults: IconDefaults,
    #[serde(rename = "addressSearchUrl", default)]
    pub address_search_url: String,
    #[serde(rename = "featureTypeEditNameMapping", default)]
    pub feature_type_edit_name_mapping: HashMap<String, String>,
}

impl MapConfig {
    /// Builds the admin change URL for a feature:
    /// `<base>/admin/<app>/<feature-type-without-underscores>/<id>/change`.
    ///
    /// The edit-name mapping overrides the derived path segment for
    /// feature types whose admin route does not match their identifier.
    /// The URL is opened in a new browsing context by the UI, never
    /// fetched by the engine.
    pub fn admin_change_url(&self, base: &str, feature_type: &str, local_id: &str) -> String {
        let app_name = self
            .overlay_config
            .app_name_for_feature_type(feature_type);
        let edit_name = self
            .feature_type_edit_name_mapping
            .get(feature_type)
            .cloned()
            .unwrap_or_else(|| feature_type.replace('_', ""));
        format!(
            "{}/admin/{}/{}/{}/change",
            base.trim_end_matches('/'),
            app_name,
            edit_name,
            local_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config_json() -> &'static str {
        r#"{
            "basemapConfig": {
                "name": "Basemaps",
                "layers": [{"identifier": "avoindata:Kartta", "name": "Map"}],
                "sourceUrl": "https://example.test/wms"
            },
            "overlayConfig": {
                "name": "Overlays",
                "layers": [
                    {
                        "identifier": "traffic_sign_real",
                        "name": "Traffic signs",
                        "app_name": "traffic_control",
                        "filter_fields": ["txt", "responsible_entity"],
                        "use_traffic_sign_icons": true,
                        "clustered": false,
                        "extra_feature_info": {
                            "value": {"title": "Value", "order": 1}
                        }
                    },
                    {
                        "identifier": "furniture_real",
                        "name": "City furniture",
                        "app_name": "city_furniture",
                        "clustered": true
                    }
                ],
                "sourceUrl": "https://example.test/wfs"
            },
            "overviewConfig": {
                "imageUrl": "https://example.test/overview.png",
                "imageExtent": [25490088.0, 6665065.0, 25512616.0, 6687593.0]
            },
            "traffic_sign_icons_url": "https://example.test/static/svg/traffic_sign_icons/",
            "iconDefaults": {"icon_scale": 1.0, "icon_type": "svg", "icon_size": 64},
            "addressSearchUrl": "https://example.test/search/",
            "featureTypeEditNameMapping": {"furniture_real": "furnituredevice"}
        }"#
    }

    #[test]
    fn test_config_parses_from_wire_format() {
        let config: MapConfig = serde_json::from_str(sample_config_json()).unwrap();
        assert_eq!(config.basemap_config.layers.len(), 1);
        assert_eq!(config.overlay_config.layers.len(), 2);
        let sign = &config.overlay_config.layers[0];
        assert!(sign.use_traffic_sign_icons);
        assert!(!sign.clustered);
        assert_eq!(sign.extra_feature_info["value"].title, "Value");
        assert!(config.overlay_config.layers[1].clustered);
    }

    #[test]
    fn test_app_name_falls_back_for_unknown_type() {
        let config: MapConfig = serde_json::from_str(sample_config_json()).unwrap();
        assert_eq!(
            config.overlay_config.app_name_for_feature_type("mystery_layer"),
            DEFAULT_APP_NAME
        );
        assert_eq!(
            config.overlay_config.app_name_for_feature_type("furniture_real"),
            "city_furniture"
        );
    }

    #[test]
    fn test_admin_change_url() {
        let config: MapConfig = serde_json::from_str(sample_config_json()).unwrap();
        assert_eq!(
            config.admin_change_url("https://city.test", "traffic_sign_real", "abc-123"),
            "https://city.test/admin/traffic_control/trafficsignreal/abc-123/change"
        );
        // Mapped override wins over the derived segment
        assert_eq!(
            config.admin_change_url("https://city.test/", "furniture_real", "id1"),
            "https://city.test/admin/city_furniture/furnituredevice/id1/change"
        );
    }
}
