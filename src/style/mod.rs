//! Feature styling.
//!
//! Styles are small tagged variants composed into ordered lists: a base
//! style (traffic-sign icon or shape-by-geometry) optionally stacked with
//! a directional arrow overlay, and a count badge for multi-feature
//! clusters. The renderer consumes the list in order.

pub mod settings;

pub use settings::{IconSettings, IconType, MemorySettingsStore, SettingsStore};

use once_cell::sync::Lazy;

use crate::{
    core::config::OverlayLayerConfig,
    data::{feature::Feature, geojson::GeometryKind},
};

/// File name of the direction arrow asset, resolved against the icon base URL
const DIRECTION_ARROW_FILE: &str = "arrow.svg";

/// Scale applied to the direction arrow overlay
const DIRECTION_ARROW_SCALE: f64 = 2.0;

/// One renderable style primitive. A feature's full style is an ordered
/// list of these; later entries draw on top of earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub enum StylePrimitive {
    /// Bitmap/vector icon, rotation in radians clockwise
    Icon {
        src: String,
        scale: f64,
        rotation: f64,
    },
    /// Circle marker for point-like geometries
    CircleMarker {
        radius: f64,
        fill: String,
        stroke: String,
        stroke_width: f64,
    },
    /// Line stroke
    Stroke { color: String, width: f64 },
    /// Area fill
    Fill { color: String },
    /// Numeric count badge for clusters of more than one feature
    Badge { count: usize },
}

/// Default shape styles per geometry class
static GEOMETRY_STYLES: Lazy<Vec<(GeometryKind, Vec<StylePrimitive>)>> = Lazy::new(|| {
    let point_marker = StylePrimitive::CircleMarker {
        radius: 5.0,
        fill: "magenta".to_string(),
        stroke: "#000".to_string(),
        stroke_width: 2.0,
    };
    vec![
        (GeometryKind::Point, vec![point_marker.clone()]),
        (
            GeometryKind::Line,
            vec![StylePrimitive::Stroke {
                color: "#000".to_string(),
                width: 2.0,
            }],
        ),
        (
            GeometryKind::Area,
            vec![
                StylePrimitive::Fill {
                    color: "magenta".to_string(),
                },
                StylePrimitive::Stroke {
                    color: "black".to_string(),
                    width: 2.0,
                },
            ],
        ),
        (
            GeometryKind::Collection,
            vec![
                StylePrimitive::Fill {
                    color: "magenta".to_string(),
                },
                StylePrimitive::Stroke {
                    color: "black".to_string(),
                    width: 2.0,
                },
                point_marker,
            ],
        ),
    ]
});

/// Default shape styles for a geometry class
pub fn styles_for_geometry(kind: GeometryKind) -> Vec<StylePrimitive> {
    GEOMETRY_STYLES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, styles)| styles.clone())
        .unwrap_or_default()
}

/// Resolves the ordered style list for a single feature.
///
/// Icon-configured layers render a type-specific traffic-sign icon when
/// the feature carries a non-null type code; everything else falls back
/// to the default shape for its geometry class. A feature with a
/// direction attribute additionally gets a rotated arrow overlay.
pub fn resolve_feature_style(
    feature: &Feature,
    layer: &OverlayLayerConfig,
    icons_url: &str,
    settings: &IconSettings,
) -> Vec<StylePrimitive> {
    let mut styles = match feature.device_type_code() {
        Some(code) if layer.use_traffic_sign_icons => vec![StylePrimitive::Icon {
            src: icon_src(
                icons_url,
                settings.icon_type,
                settings.icon_size,
                code,
                feature.device_type_icon(),
            ),
            scale: settings.icon_scale,
            rotation: 0.0,
        }],
        _ => styles_for_geometry(feature.geometry.kind()),
    };

    if let Some(direction) = feature.direction_degrees() {
        // Degrees clockwise from north; the renderer rotation convention
        // is radians clockwise
        styles.push(StylePrimitive::Icon {
            src: format!("{icons_url}{DIRECTION_ARROW_FILE}"),
            scale: DIRECTION_ARROW_SCALE,
            rotation: direction.to_radians(),
        });
    }

    styles
}

/// Resolves the style for a cluster: a single member renders with its own
/// feature style, anything larger renders as a count badge
pub fn resolve_cluster_style(
    members: &[Feature],
    layer: &OverlayLayerConfig,
    icons_url: &str,
    settings: &IconSettings,
) -> Vec<StylePrimitive> {
    match members {
        [single] => resolve_feature_style(single, layer, icons_url, settings),
        _ => vec![StylePrimitive::Badge {
            count: members.len(),
        }],
    }
}

/// Builds a traffic-sign icon URL.
///
/// The base URL points at the `svg` icon directory. SVG icons resolve to
/// `<base><code>.svg` (or an overridden file name, which always carries
/// the `.svg` suffix); PNG icons swap the `/svg/` path segment for
/// `/png/<size>/` and the suffix for `.png`.
pub fn icon_src(
    icons_url: &str,
    icon_type: IconType,
    icon_size: u32,
    device_type_code: &str,
    overridden_icon: Option<&str>,
) -> String {
    let file = match overridden_icon {
        Some(icon) => icon.to_string(),
        None => format!("{device_type_code}.svg"),
    };

    match icon_type {
        IconType::Svg => format!("{icons_url}{file}"),
        IconType::Png => {
            let base = icons_url.replace("/svg/", &format!("/png/{icon_size}/"));
            let file = file.replace(".svg", ".png");
            format!("{base}{file}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{feature::FeatureId, geojson::Geometry};

    const ICONS_URL: &str = "https://city.test/static/svg/traffic_sign_icons/";

    fn icon_layer() -> OverlayLayerConfig {
        OverlayLayerConfig {
            identifier: "traffic_sign_real".to_string(),
            name: "Traffic signs".to_string(),
            app_name: Some("traffic_control".to_string()),
            filter_fields: vec![],
            use_traffic_sign_icons: true,
            clustered: false,
            extra_feature_info: Default::default(),
        }
    }

    fn point_feature() -> Feature {
        Feature::new(
            FeatureId::new("traffic_sign_real", "abc"),
            Geometry::Point {
                coordinates: [0.0, 0.0],
            },
        )
    }

    #[test]
    fn test_svg_icon_src() {
        let src = icon_src(ICONS_URL, IconType::Svg, 64, "A1", None);
        assert_eq!(
            src,
            "https://city.test/static/svg/traffic_sign_icons/A1.svg"
        );
    }

    #[test]
    fn test_png_icon_src_swaps_directory_and_suffix() {
        let src = icon_src(ICONS_URL, IconType::Png, 128, "A1", None);
        assert!(src.contains("/png/128/"));
        assert!(!src.contains("/svg/"));
        assert!(src.ends_with("A1.png"));
    }

    #[test]
    fn test_overridden_icon_wins() {
        let src = icon_src(ICONS_URL, IconType::Svg, 64, "A1", Some("special.svg"));
        assert!(src.ends_with("special.svg"));
    }

    #[test]
    fn test_icon_style_for_typed_feature() {
        let feature =
            point_feature().with_property("device_type_code", serde_json::json!("A1"));
        let styles = resolve_feature_style(
            &feature,
            &icon_layer(),
            ICONS_URL,
            &IconSettings::default(),
        );
        assert!(matches!(styles[0], StylePrimitive::Icon { .. }));
    }

    #[test]
    fn test_shape_style_without_type_code() {
        let styles = resolve_feature_style(
            &point_feature(),
            &icon_layer(),
            ICONS_URL,
            &IconSettings::default(),
        );
        assert!(matches!(styles[0], StylePrimitive::CircleMarker { .. }));
    }

    #[test]
    fn test_direction_arrow_stacks_on_top() {
        let feature = point_feature()
            .with_property("device_type_code", serde_json::json!("A1"))
            .with_property("direction", serde_json::json!(90));
        let styles = resolve_feature_style(
            &feature,
            &icon_layer(),
            ICONS_URL,
            &IconSettings::default(),
        );
        assert_eq!(styles.len(), 2);
        match &styles[1] {
            StylePrimitive::Icon { rotation, src, .. } => {
                assert!((rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
                assert!(src.ends_with("arrow.svg"));
            }
            other => panic!("expected arrow icon, got {other:?}"),
        }
    }

    #[test]
    fn test_cluster_style_badge_vs_single() {
        let layer = icon_layer();
        let settings = IconSettings::default();
        let members: Vec<Feature> = (0..3)
            .map(|i| {
                Feature::new(
                    FeatureId::new("traffic_sign_real", format!("f{i}")),
                    Geometry::Point {
                        coordinates: [i as f64, 0.0],
                    },
                )
            })
            .collect();

        let styles = resolve_cluster_style(&members, &layer, ICONS_URL, &settings);
        assert_eq!(styles, vec![StylePrimitive::Badge { count: 3 }]);

        let styles = resolve_cluster_style(&members[..1], &layer, ICONS_URL, &settings);
        assert!(matches!(styles[0], StylePrimitive::CircleMarker { .. }));
    }
}
