//! The map engine.
//!
//! An explicitly owned orchestrator composing the view, the layer
//! manager, the diff engine and the basemap set. Hosts construct it with
//! configuration (or let [`MapEngine::initialize`] fetch it), register
//! observers for feature-info results and ongoing-fetch activity, and
//! drive it with click/move events from their input loop. Dropping the
//! engine tears everything down.

use instant::Instant;
use std::sync::{Arc, Mutex};

use crate::{
    core::{
        config::MapConfig,
        geo::{Point, Projection},
        view::MapView,
    },
    data::feature::{Feature, FeatureId},
    input::hit_test::HitTestResolver,
    layers::{
        diff::{plan_layer_for, real_layer_for, DiffEngine, DiffLine},
        manager::LayerManager,
        source::VisibleSet,
        wms::BasemapSet,
    },
    net::{
        address::{Address, AddressSearch},
        service::{fetch_map_config, FeatureService, HttpFeatureService},
    },
    render::Renderer,
    style::{
        resolve_cluster_style, resolve_feature_style, IconSettings, SettingsStore, StylePrimitive,
    },
    Result,
};

/// Default map center (central Helsinki in EPSG:3879)
pub const DEFAULT_CENTER: Point = Point {
    x: 25_499_052.02,
    y: 6_675_851.38,
};

/// Default starting zoom level
pub const DEFAULT_ZOOM: usize = 5;

/// Observer for resolved feature-info results
pub type FeatureInfoObserver = Box<dyn Fn(&[Feature]) + Send + Sync>;

/// Observer for the set of layers with in-flight fetches
pub type FetchActivityObserver = Box<dyn Fn(&[String]) + Send + Sync>;

pub struct MapEngine {
    config: MapConfig,
    view: MapView,
    layers: LayerManager,
    basemaps: BasemapSet,
    diff: DiffEngine,
    settings: IconSettings,
    service: Arc<dyn FeatureService>,
    renderer: Arc<dyn Renderer>,
    address_search: AddressSearch,
    feature_info_observers: Vec<FeatureInfoObserver>,
    fetch_observers: Arc<Mutex<Vec<FetchActivityObserver>>>,
    selected: Option<FeatureId>,
}

impl MapEngine {
    /// Builds an engine from an already-fetched configuration
    pub fn new(
        config: MapConfig,
        service: Arc<dyn FeatureService>,
        renderer: Arc<dyn Renderer>,
        settings_store: &dyn SettingsStore,
        viewport_size: Point,
        language: &str,
    ) -> Self {
        let projection = Projection::epsg_3879();
        let srs_name = projection.code.clone();
        let view = MapView::new(projection, DEFAULT_CENTER, DEFAULT_ZOOM, viewport_size);

        let mut layers = LayerManager::new(&config.overlay_config, &srs_name);
        let fetch_observers: Arc<Mutex<Vec<FetchActivityObserver>>> =
            Arc::new(Mutex::new(Vec::new()));
        let observers = Arc::clone(&fetch_observers);
        layers.set_fetch_observer(Box::new(move |ongoing| {
            for observer in observers.lock().expect("observer list poisoned").iter() {
                observer(ongoing);
            }
        }));

        let basemaps = BasemapSet::new(&config.basemap_config, &srs_name);
        let settings = IconSettings::load(settings_store, &config.icon_defaults);
        let address_search = AddressSearch::new(
            reqwest::Client::new(),
            &config.address_search_url,
            "helsinki",
            language,
        );

        Self {
            config,
            view,
            layers,
            basemaps,
            diff: DiffEngine::new(),
            settings,
            service,
            renderer,
            address_search,
            feature_info_observers: Vec::new(),
            fetch_observers,
            selected: None,
        }
    }

    /// Fetches the map configuration and builds the engine around it.
    /// Configuration failures are fatal: the error propagates and no
    /// partial map is constructed.
    pub async fn initialize(
        client: reqwest::Client,
        config_url: &str,
        renderer: Arc<dyn Renderer>,
        settings_store: &dyn SettingsStore,
        viewport_size: Point,
        language: &str,
    ) -> Result<Self> {
        let config = fetch_map_config(&client, config_url).await?;
        let service = Arc::new(HttpFeatureService::new(
            client,
            &config.overlay_config.source_url,
            &Projection::epsg_3879().code,
        ));
        Ok(Self::new(
            config,
            service,
            renderer,
            settings_store,
            viewport_size,
            language,
        ))
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    // -- observers ------------------------------------------------------

    pub fn register_feature_info_observer(&mut self, observer: FeatureInfoObserver) {
        self.feature_info_observers.push(observer);
    }

    pub fn register_fetch_observer(&mut self, observer: FetchActivityObserver) {
        self.fetch_observers
            .lock()
            .expect("observer list poisoned")
            .push(observer);
    }

    // -- basemaps -------------------------------------------------------

    pub fn visible_basemap(&self) -> Option<&str> {
        self.basemaps.visible_basemap()
    }

    pub fn set_visible_basemap(&mut self, identifier: &str) -> Result<()> {
        self.basemaps.set_visible_basemap(identifier)
    }

    pub fn basemaps_mut(&mut self) -> &mut BasemapSet {
        &mut self.basemaps
    }

    // -- overlays -------------------------------------------------------

    /// Toggles an overlay layer. Turning a layer visible fetches the
    /// uncovered part of the current extent and refreshes the pair's
    /// difference lines.
    pub async fn set_overlay_visible(&mut self, identifier: &str, visible: bool) -> Result<()> {
        let extent = self.view.visible_extent();
        self.layers
            .set_overlay_visible(identifier, visible, &extent, self.service.as_ref())
            .await?;
        if visible {
            self.recompute_diff_for(identifier);
        }
        Ok(())
    }

    pub fn is_overlay_visible(&self, identifier: &str) -> bool {
        self.layers.is_visible(identifier)
    }

    pub fn ongoing_fetches(&self) -> Vec<String> {
        self.layers.ongoing_fetches()
    }

    /// The visible feature set of one layer at the current resolution,
    /// for the host renderer
    pub fn visible_set(&self, identifier: &str) -> Option<VisibleSet> {
        if !self.layers.is_visible(identifier) {
            return None;
        }
        self.layers
            .source(identifier)
            .map(|source| source.visible_set(self.view.resolution()))
    }

    // -- view movement --------------------------------------------------

    /// Recenters the view (user pan or search-driven)
    pub fn recenter(&mut self, center: Point) {
        self.view.set_center(center);
    }

    pub fn set_zoom(&mut self, zoom: usize) {
        self.view.set_zoom(zoom);
    }

    /// Records a pan/zoom settle. The fetch pass itself runs from
    /// [`MapEngine::pump`] once the debounce window elapses, against the
    /// extent current at that moment.
    pub fn handle_move_end(&mut self, now: Instant) {
        self.layers.note_move(now);
    }

    /// Drives debounced work; hosts call this from their event loop.
    /// Returns the layers that received new features.
    pub async fn pump(&mut self, now: Instant) -> Vec<String> {
        if !self.layers.move_fetch_due(now) {
            return Vec::new();
        }
        let extent = self.view.visible_extent();
        let loaded = self
            .layers
            .run_move_fetches(&extent, self.service.as_ref())
            .await;
        for identifier in &loaded {
            self.recompute_diff_for(identifier);
        }
        loaded
    }

    // -- clicks and feature info ----------------------------------------

    /// Resolves a click at a viewport pixel. Features found under the
    /// click are delivered to the feature-info observers; an empty
    /// result triggers no callback and leaves the UI unchanged.
    pub async fn handle_click(&mut self, pixel: Point) -> Vec<Feature> {
        let coordinate = self.view.pixel_to_map(pixel);
        let features = HitTestResolver::resolve(
            &self.layers,
            &self.config.overlay_config,
            self.renderer.as_ref(),
            pixel,
            coordinate,
        )
        .await;

        if !features.is_empty() {
            for observer in &self.feature_info_observers {
                observer(&features);
            }
        }
        features
    }

    /// Selects a single real feature from feature-info navigation. Its
    /// plan counterpart is fetched on demand when not already loaded;
    /// returns the rounded distance between the pair, or `None` when the
    /// feature has no resolvable counterpart.
    pub async fn select_feature(&mut self, id: &FeatureId) -> Option<f64> {
        let feature = self
            .layers
            .source(id.feature_type())
            .and_then(|source| source.get(id))
            .cloned()?;

        self.selected = Some(id.clone());

        let plan_id = feature.device_plan_id()?;
        let plan_layer = plan_layer_for(id.feature_type())?;
        let plan_feature_id = FeatureId::new(plan_layer.clone(), plan_id);

        let plan = match self
            .layers
            .source(&plan_layer)
            .and_then(|source| source.get(&plan_feature_id))
            .cloned()
        {
            Some(plan) => plan,
            None => match self.service.fetch_feature_by_id(&plan_feature_id).await {
                Ok(Some(plan)) => plan,
                Ok(None) => return None,
                Err(e) => {
                    log::warn!("plan counterpart fetch for {plan_feature_id} failed: {e}");
                    return None;
                }
            },
        };

        self.diff.add_selected_pair(&feature, &plan)
    }

    /// Deselects the current feature-info feature, clearing only the
    /// lines of its own diff layer
    pub fn deselect_feature(&mut self) {
        if let Some(id) = self.selected.take() {
            self.diff.clear_layer(id.feature_type());
        }
    }

    // -- differencing ---------------------------------------------------

    pub fn diff_lines(&self, real_layer: &str) -> &[DiffLine] {
        self.diff.lines(real_layer)
    }

    /// Hides one pair's difference display, clearing only that layer's
    /// lines
    pub fn hide_differences(&mut self, real_layer: &str) {
        self.diff.clear_layer(real_layer);
    }

    fn recompute_diff_for(&mut self, identifier: &str) {
        let real_layer = if plan_layer_for(identifier).is_some() {
            identifier.to_string()
        } else if let Some(real) = real_layer_for(identifier) {
            real
        } else {
            return;
        };
        let Some(plan_layer) = plan_layer_for(&real_layer) else {
            return;
        };
        let (Some(real_source), Some(plan_source)) = (
            self.layers.source(&real_layer),
            self.layers.source(&plan_layer),
        ) else {
            return;
        };
        self.diff.recompute_pair(&real_layer, real_source, plan_source);
    }

    // -- project filters ------------------------------------------------

    /// Restricts eligible layers to one project/responsible entity via
    /// an explicit full reload of each layer's source
    pub async fn apply_project_filters(&mut self, project_id: &str) -> Vec<String> {
        let extent = self.view.visible_extent();
        let reloaded = self
            .layers
            .apply_project_filters(project_id, &extent, self.service.as_ref())
            .await;
        for identifier in &reloaded {
            self.recompute_diff_for(identifier);
        }
        reloaded
    }

    // -- styling --------------------------------------------------------

    pub fn icon_settings(&self) -> IconSettings {
        self.settings
    }

    pub fn update_icon_settings(
        &mut self,
        settings: IconSettings,
        store: &mut dyn SettingsStore,
    ) {
        self.settings = settings;
        self.settings.save(store);
    }

    pub fn reset_icon_settings(&mut self, store: &mut dyn SettingsStore) {
        self.settings = IconSettings::reset(store, &self.config.icon_defaults);
    }

    /// The ordered style list for one feature
    pub fn style_for_feature(&self, feature: &Feature) -> Vec<StylePrimitive> {
        match self
            .config
            .overlay_config
            .layer_for_feature_type(feature.id.feature_type())
        {
            Some(layer) => resolve_feature_style(
                feature,
                layer,
                &self.config.traffic_sign_icons_url,
                &self.settings,
            ),
            None => crate::style::styles_for_geometry(feature.geometry.kind()),
        }
    }

    /// The style for a cluster of one layer
    pub fn style_for_cluster(
        &self,
        identifier: &str,
        members: &[Feature],
    ) -> Vec<StylePrimitive> {
        match self.config.overlay_config.layer_for_feature_type(identifier) {
            Some(layer) => resolve_cluster_style(
                members,
                layer,
                &self.config.traffic_sign_icons_url,
                &self.settings,
            ),
            None => Vec::new(),
        }
    }

    // -- external links and search --------------------------------------

    /// Admin change-URL for a feature; opened by the UI in a new
    /// browsing context, never fetched here
    pub fn admin_link(&self, base: &str, feature: &Feature) -> String {
        self.config
            .admin_change_url(base, feature.id.feature_type(), feature.id.local())
    }

    /// Address search against the configured geocoding endpoint; only
    /// the first result page is consumed, and failures yield no results
    pub async fn search_address(&self, query: &str) -> Vec<Address> {
        self.address_search.search(query).await
    }

    /// Map coordinate of an address result in the view's projection
    pub fn address_coordinate(&self, address: &Address) -> Point {
        address.map_coordinate(self.view.projection())
    }
}
