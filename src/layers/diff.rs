//! Plan/real differencing.
//!
//! Layers whose identifiers differ only by the substring `real` vs
//! `plan` form a diff-capable pair. "Real" features referencing a plan
//! counterpart (via `device_plan_id`) get a connecting line drawn into a
//! dedicated overlay, one overlay per pair, keyed by the real layer's
//! identifier. The line visualizes spatial drift between designed and
//! as-built placement.

use crate::{
    core::geo::Point,
    data::feature::{Feature, FeatureId},
    layers::source::FeatureSource,
    prelude::HashMap,
};

/// A connecting line between a real feature and its plan counterpart
#[derive(Debug, Clone, PartialEq)]
pub struct DiffLine {
    pub real: FeatureId,
    pub plan: FeatureId,
    pub from: Point,
    pub to: Point,
}

impl DiffLine {
    /// Euclidean distance between the endpoints in map units, rounded
    /// to two decimal places
    pub fn distance(&self) -> f64 {
        round_distance(self.from.distance_to(&self.to))
    }
}

/// The plan-layer identifier paired with a real layer, when the layer is
/// diff-capable at all
pub fn plan_layer_for(real_layer: &str) -> Option<String> {
    real_layer
        .contains("real")
        .then(|| real_layer.replace("real", "plan"))
}

/// The real-layer identifier paired with a plan layer
pub fn real_layer_for(plan_layer: &str) -> Option<String> {
    plan_layer
        .contains("plan")
        .then(|| plan_layer.replace("plan", "real"))
}

fn round_distance(distance: f64) -> f64 {
    (distance * 100.0).round() / 100.0
}

/// Computes and stores connecting lines per diff-capable layer pair
#[derive(Default)]
pub struct DiffEngine {
    /// Lines keyed by the real layer's identifier
    lines: HashMap<String, Vec<DiffLine>>,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the full line set for one pair from the currently
    /// loaded features.
    ///
    /// Real features without a plan id take no part; real features whose
    /// plan counterpart is not loaded yet are skipped silently and
    /// reconsidered on the next recompute.
    pub fn recompute_pair(
        &mut self,
        real_layer: &str,
        real_source: &FeatureSource,
        plan_source: &FeatureSource,
    ) {
        let Some(plan_layer) = plan_layer_for(real_layer) else {
            return;
        };

        let mut lines = Vec::new();
        for feature in real_source.iter() {
            let Some(plan_id) = feature.device_plan_id() else {
                continue;
            };
            let Some(plan) = plan_source.get(&FeatureId::new(plan_layer.clone(), plan_id)) else {
                continue;
            };
            if let Some(line) = connect(feature, plan) {
                lines.push(line);
            }
        }

        self.lines.insert(real_layer.to_string(), lines);
    }

    /// Adds the single line for one explicitly selected real feature and
    /// its (already fetched) plan counterpart; returns the rounded
    /// distance between the pair
    pub fn add_selected_pair(&mut self, real: &Feature, plan: &Feature) -> Option<f64> {
        let line = connect(real, plan)?;
        let distance = line.distance();
        let entry = self.lines.entry(real.id.feature_type().to_string()).or_default();
        if !entry.contains(&line) {
            entry.push(line);
        }
        Some(distance)
    }

    /// The connecting lines of one diff layer
    pub fn lines(&self, real_layer: &str) -> &[DiffLine] {
        self.lines.get(real_layer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Clears only the lines of the given diff layer, never all of them
    pub fn clear_layer(&mut self, real_layer: &str) {
        self.lines.remove(real_layer);
    }

    /// Identifiers of diff layers currently holding lines
    pub fn active_layers(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(_, lines)| !lines.is_empty())
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

fn connect(real: &Feature, plan: &Feature) -> Option<DiffLine> {
    let from = real.geometry.reference_point()?;
    let to = plan.geometry.reference_point()?;
    Some(DiffLine {
        real: real.id.clone(),
        plan: plan.id.clone(),
        from,
        to,
    })
}
