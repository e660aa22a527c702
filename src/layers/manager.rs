//! Overlay layer management.
//!
//! The manager owns one [`FeatureSource`] and a visibility flag per
//! configured overlay layer and orchestrates fetch-on-demand: a layer
//! turning visible, or the view settling after a pan/zoom, triggers a
//! bounded fetch for whatever part of the current extent is not yet
//! covered. Turning a layer invisible only flips the flag; fetched data
//! stays warm for the next toggle.

use instant::Instant;
use std::time::Duration;

use crate::{
    core::{
        bounds::Bounds,
        config::{LayerConfig, OverlayLayerConfig},
    },
    layers::source::{FeatureSource, ProviderMode},
    net::service::FeatureService,
    prelude::{HashMap, HashSet},
    query::{
        coverage::CoverageCache,
        filter::{QueryBuilder, QueryOutcome},
    },
    Result,
};

/// Quiet window after the last move event before fetches run
pub const MOVE_DEBOUNCE_WINDOW: Duration = Duration::from_millis(1000);

/// Attribute restricting layers to a project/responsible entity
pub const PROJECT_FILTER_FIELD: &str = "responsible_entity";

/// Observer notified whenever the set of layers with in-flight fetches
/// changes; purely UI feedback
pub type FetchObserver = Box<dyn Fn(&[String]) + Send + Sync>;

/// Collapses bursts of move events into a single fetch pass. The
/// deadline restarts on every event, and the extent is taken at
/// execution time, not at scheduling time.
#[derive(Debug)]
pub struct MoveDebouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl MoveDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn note_move(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// True once the quiet window has elapsed; clears the pending state
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

/// Per-layer runtime state
pub struct OverlayState {
    config: OverlayLayerConfig,
    source: FeatureSource,
    visible: bool,
    /// Persistent attribute filter applied to every query of this layer
    attribute_filter: Option<(String, String)>,
}

impl OverlayState {
    pub fn config(&self) -> &OverlayLayerConfig {
        &self.config
    }

    pub fn source(&self) -> &FeatureSource {
        &self.source
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Owns all overlay layers and their fetch lifecycle
pub struct LayerManager {
    layers: HashMap<String, OverlayState>,
    /// Configuration order, for deterministic iteration
    order: Vec<String>,
    coverage: CoverageCache,
    query_builder: QueryBuilder,
    ongoing: HashSet<String>,
    debouncer: MoveDebouncer,
    fetch_observer: Option<FetchObserver>,
}

impl LayerManager {
    pub fn new(config: &LayerConfig<OverlayLayerConfig>, srs_name: &str) -> Self {
        let mut layers = HashMap::default();
        let mut order = Vec::with_capacity(config.layers.len());

        for layer in &config.layers {
            let mode = if layer.clustered {
                ProviderMode::Clustered
            } else {
                ProviderMode::Plain
            };
            layers.insert(
                layer.identifier.clone(),
                OverlayState {
                    config: layer.clone(),
                    source: FeatureSource::new(mode),
                    visible: false,
                    attribute_filter: None,
                },
            );
            order.push(layer.identifier.clone());
        }

        Self {
            layers,
            order,
            coverage: CoverageCache::new(),
            query_builder: QueryBuilder::new(srs_name),
            ongoing: HashSet::default(),
            debouncer: MoveDebouncer::new(MOVE_DEBOUNCE_WINDOW),
            fetch_observer: None,
        }
    }

    pub fn set_fetch_observer(&mut self, observer: FetchObserver) {
        self.fetch_observer = Some(observer);
    }

    pub fn layer(&self, identifier: &str) -> Option<&OverlayState> {
        self.layers.get(identifier)
    }

    pub fn source(&self, identifier: &str) -> Option<&FeatureSource> {
        self.layers.get(identifier).map(|s| &s.source)
    }

    pub fn config(&self, identifier: &str) -> Option<&OverlayLayerConfig> {
        self.layers.get(identifier).map(|s| &s.config)
    }

    /// Layer identifiers in configuration order
    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn visible_layer_ids(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.layers.get(*id).is_some_and(|s| s.visible))
            .cloned()
            .collect()
    }

    pub fn is_visible(&self, identifier: &str) -> bool {
        self.layers.get(identifier).is_some_and(|s| s.visible)
    }

    /// Layers currently awaiting a network response, in stable order
    pub fn ongoing_fetches(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.ongoing.contains(*id))
            .cloned()
            .collect()
    }

    /// Flips a layer's visibility. Turning a layer on triggers a bounded
    /// fetch for the current extent; turning it off keeps fetched data
    /// warm for the next toggle. Returns whether new features loaded.
    pub async fn set_overlay_visible(
        &mut self,
        identifier: &str,
        visible: bool,
        extent: &Bounds,
        service: &dyn FeatureService,
    ) -> Result<bool> {
        let Some(state) = self.layers.get_mut(identifier) else {
            return Err(Box::new(crate::Error::Layer(format!(
                "unknown overlay layer {identifier}"
            ))));
        };

        let was_visible = state.visible;
        state.visible = visible;

        if !visible || was_visible {
            return Ok(false);
        }

        Ok(self.fetch_if_needed(identifier, extent, service).await)
    }

    /// Issues a fetch for the uncovered part of `extent`, if any.
    ///
    /// Fetch failures are not surfaced: the layer keeps whatever it
    /// already had, the extent stays uncovered and the next pass retries.
    /// Returns whether new features were merged.
    pub async fn fetch_if_needed(
        &mut self,
        identifier: &str,
        extent: &Bounds,
        service: &dyn FeatureService,
    ) -> bool {
        let Some(state) = self.layers.get(identifier) else {
            return false;
        };

        let attribute = state
            .attribute_filter
            .as_ref()
            .map(|(field, value)| (field.as_str(), value.as_str()));
        let outcome = self.query_builder.feature_query(
            attribute,
            Some(extent),
            self.coverage.polygons(identifier),
        );

        let QueryOutcome::Filter(filter) = outcome else {
            return false;
        };

        self.mark_fetch_started(identifier);
        let fetched = service.fetch_features(identifier, &filter).await;
        self.mark_fetch_finished(identifier);

        match fetched {
            Ok(features) => {
                let count = features.len();
                if let Some(state) = self.layers.get_mut(identifier) {
                    state.source.add_features(features);
                }
                self.coverage.add_fetched_area(identifier, extent);
                log::debug!("merged {count} features into {identifier}");
                true
            }
            Err(e) => {
                log::warn!("feature fetch for {identifier} failed: {e}");
                false
            }
        }
    }

    /// Records a view move; the fetch pass runs once the quiet window
    /// has elapsed
    pub fn note_move(&mut self, now: Instant) {
        self.debouncer.note_move(now);
    }

    pub fn move_fetch_due(&mut self, now: Instant) -> bool {
        self.debouncer.take_due(now)
    }

    pub fn move_fetch_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Runs the fetch-if-needed pass for every visible layer against the
    /// current extent. Returns the layers that received new features.
    pub async fn run_move_fetches(
        &mut self,
        extent: &Bounds,
        service: &dyn FeatureService,
    ) -> Vec<String> {
        let mut loaded = Vec::new();
        for identifier in self.visible_layer_ids() {
            if self.fetch_if_needed(&identifier, extent, service).await {
                loaded.push(identifier);
            }
        }
        loaded
    }

    /// Restricts every eligible layer to one project/responsible entity.
    ///
    /// Unlike incremental area fetches this is an explicit full reload:
    /// the layer's source and coverage are dropped and the query reissued
    /// with the added attribute filter. An empty project id clears the
    /// restriction. Invisible eligible layers are cleared and refetch on
    /// their next visibility toggle.
    pub async fn apply_project_filters(
        &mut self,
        project_id: &str,
        extent: &Bounds,
        service: &dyn FeatureService,
    ) -> Vec<String> {
        let eligible: Vec<String> = self
            .order
            .iter()
            .filter(|id| {
                self.layers
                    .get(*id)
                    .is_some_and(|s| s.config.filter_fields.iter().any(|f| f == PROJECT_FILTER_FIELD))
            })
            .cloned()
            .collect();

        let mut reloaded = Vec::new();
        for identifier in eligible {
            let visible = {
                let state = self.layers.get_mut(&identifier).expect("eligible layer exists");
                state.attribute_filter = if project_id.is_empty() {
                    None
                } else {
                    Some((PROJECT_FILTER_FIELD.to_string(), project_id.to_string()))
                };
                state.source.clear();
                state.visible
            };
            self.coverage.clear_layer(&identifier);

            if visible && self.fetch_if_needed(&identifier, extent, service).await {
                reloaded.push(identifier);
            }
        }
        reloaded
    }

    fn mark_fetch_started(&mut self, identifier: &str) {
        self.ongoing.insert(identifier.to_string());
        self.notify_fetch_observer();
    }

    fn mark_fetch_finished(&mut self, identifier: &str) {
        self.ongoing.remove(identifier);
        self.notify_fetch_observer();
    }

    fn notify_fetch_observer(&self) {
        if let Some(observer) = &self.fetch_observer {
            observer(&self.ongoing_fetches());
        }
    }
}

#[cfg(test)]
impl LayerManager {
    pub(crate) fn merge_features_for_test(
        &mut self,
        identifier: &str,
        features: Vec<crate::data::feature::Feature>,
    ) {
        if let Some(state) = self.layers.get_mut(identifier) {
            state.source.add_features(features);
        }
    }

    pub(crate) fn set_visible_for_test(&mut self, identifier: &str) {
        if let Some(state) = self.layers.get_mut(identifier) {
            state.visible = true;
        }
    }
}
