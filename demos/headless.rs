use std::sync::Arc;

use async_trait::async_trait;
use inframap::{
    core::map::MapEngine,
    data::feature::{Feature, FeatureId},
    prelude::Instant,
    render::NullRenderer,
    style::MemorySettingsStore,
    FeatureService, Geometry, MapConfig, Point,
};

/// Serves a handful of canned features without touching the network
struct CannedService;

#[async_trait]
impl FeatureService for CannedService {
    async fn fetch_features(
        &self,
        layer: &str,
        _filter: &str,
    ) -> inframap::Result<Vec<Feature>> {
        log::info!("serving canned features for {layer}");
        Ok(match layer {
            "traffic_sign_real" => vec![Feature::new(
                FeatureId::new(layer, "5a2b"),
                Geometry::Point {
                    coordinates: [25_496_040.0, 6_676_200.0],
                },
            )
            .with_property("device_type_code", serde_json::json!("A1"))
            .with_property("device_plan_id", serde_json::json!("7c1d"))],
            "traffic_sign_plan" => vec![Feature::new(
                FeatureId::new(layer, "7c1d"),
                Geometry::Point {
                    coordinates: [25_496_000.0, 6_676_200.0],
                },
            )],
            _ => Vec::new(),
        })
    }

    async fn fetch_feature_by_id(&self, id: &FeatureId) -> inframap::Result<Option<Feature>> {
        Ok(self
            .fetch_features(id.feature_type(), "")
            .await?
            .into_iter()
            .find(|f| &f.id == id))
    }
}

/// Example of driving the engine headless, without any UI or network
#[tokio::main]
async fn main() -> inframap::Result<()> {
    env_logger::init();

    let config: MapConfig = serde_json::from_str(include_str!("map_config.json"))
        .map_err(inframap::MapError::Serialization)?;
    let store = MemorySettingsStore::default();
    let mut engine = MapEngine::new(
        config,
        Arc::new(CannedService),
        Arc::new(NullRenderer),
        &store,
        Point::new(1024.0, 768.0),
        "fi",
    );

    engine.register_feature_info_observer(Box::new(|features| {
        for feature in features {
            println!("   feature info: {}", feature.id);
        }
    }));
    engine.register_fetch_observer(Box::new(|ongoing| {
        println!("   ongoing fetches: {ongoing:?}");
    }));

    println!("engine ready, basemap: {:?}", engine.visible_basemap());

    engine.recenter(Point::new(25_496_040.0, 6_676_200.0));
    engine.set_zoom(8);

    println!("\ntoggling traffic signs visible:");
    engine.set_overlay_visible("traffic_sign_real", true).await?;

    println!("\nclicking the sign at the viewport center:");
    let hits = engine.handle_click(Point::new(512.0, 384.0)).await;
    println!("   {} feature(s) under the click", hits.len());

    println!("\nselecting the sign to diff against its plan:");
    let distance = engine
        .select_feature(&FeatureId::new("traffic_sign_real", "5a2b"))
        .await;
    println!("   plan/real distance: {distance:?} m");
    for line in engine.diff_lines("traffic_sign_real") {
        println!("   diff line {} -> {}", line.real, line.plan);
    }

    println!("\npanning away and letting the debounced fetch settle:");
    engine.recenter(Point::new(25_497_000.0, 6_676_200.0));
    let now = Instant::now();
    engine.handle_move_end(now);
    let loaded = engine.pump(now + std::time::Duration::from_millis(1100)).await;
    println!("   layers refreshed after move: {loaded:?}");

    Ok(())
}
