//! Spatial/attribute query filter construction.
//!
//! Filters are encoded as OGC Filter XML carried in the `filter` query
//! parameter of WFS GetFeature requests: an attribute like-filter, a
//! bounding-envelope filter and a covered-area exclusion, combined with
//! logical AND. When the requested bbox is already fully covered the
//! builder reports that no query is needed at all.

use geo::Polygon;

use crate::{core::bounds::Bounds, query::coverage::is_fully_covered};

/// Outcome of planning a feature query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The target area is already covered (or no filter applies); issue
    /// no request
    NotNeeded,
    /// Filter XML for the GetFeature request
    Filter(String),
}

/// Builds OGC filter expressions for one feature-source endpoint
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    srs_name: String,
    geometry_field: String,
}

impl QueryBuilder {
    pub fn new(srs_name: &str) -> Self {
        Self {
            srs_name: srs_name.to_string(),
            geometry_field: "geometry".to_string(),
        }
    }

    /// Plans a feature query from the active filters.
    ///
    /// Returns [`QueryOutcome::NotNeeded`] when the bbox is entirely
    /// inside the covered area, and also when no filter at all is active
    /// rather than issuing an unfiltered full-layer query.
    pub fn feature_query(
        &self,
        attribute: Option<(&str, &str)>,
        bbox: Option<&Bounds>,
        covered: &[Polygon<f64>],
    ) -> QueryOutcome {
        if let Some(bbox) = bbox {
            if is_fully_covered(covered, bbox) {
                return QueryOutcome::NotNeeded;
            }
        }

        let mut parts = Vec::new();

        // Empty attribute values mean "no attribute filter", they are
        // never matched literally
        if let Some((field, value)) = attribute {
            if !value.is_empty() {
                parts.push(self.attribute_filter(field, value));
            }
        }

        if let Some(bbox) = bbox {
            parts.push(self.bbox_filter(bbox));
            if !covered.is_empty() {
                parts.push(self.exclusion_filter(covered));
            }
        }

        match parts.len() {
            0 => QueryOutcome::NotNeeded,
            1 => QueryOutcome::Filter(format!("<Filter>{}</Filter>", parts[0])),
            _ => QueryOutcome::Filter(format!("<Filter><And>{}</And></Filter>", parts.concat())),
        }
    }

    /// Exact identity filter for a single feature. Resource ids resolve
    /// directly in the source's index, unlike pattern matching.
    pub fn resource_id_query(&self, feature_id: &str) -> String {
        format!(
            "<Filter><ResourceId rid=\"{}\"/></Filter>",
            escape_xml(feature_id)
        )
    }

    /// Case-sensitive substring match on an attribute
    fn attribute_filter(&self, field: &str, value: &str) -> String {
        format!(
            "<PropertyIsLike wildCard=\"*\" singleChar=\".\" escapeChar=\"!\">\
             <ValueReference>{}</ValueReference><Literal>*{}*</Literal></PropertyIsLike>",
            escape_xml(field),
            escape_xml(value)
        )
    }

    fn bbox_filter(&self, bbox: &Bounds) -> String {
        format!(
            "<BBOX><ValueReference>{}</ValueReference>\
             <Envelope srsName=\"{}\"><lowerCorner>{} {}</lowerCorner>\
             <upperCorner>{} {}</upperCorner></Envelope></BBOX>",
            self.geometry_field, self.srs_name, bbox.min.x, bbox.min.y, bbox.max.x, bbox.max.y
        )
    }

    /// Logical NOT over the union of covered polygons, expressed as a
    /// per-polygon intersects predicate
    fn exclusion_filter(&self, covered: &[Polygon<f64>]) -> String {
        let intersects: String = covered.iter().map(|p| self.intersects_predicate(p)).collect();
        if covered.len() == 1 {
            format!("<Not>{intersects}</Not>")
        } else {
            format!("<Not><Or>{intersects}</Or></Not>")
        }
    }

    fn intersects_predicate(&self, polygon: &Polygon<f64>) -> String {
        let pos_list: Vec<String> = polygon
            .exterior()
            .0
            .iter()
            .map(|c| format!("{} {}", c.x, c.y))
            .collect();
        format!(
            "<Intersects><ValueReference>{}</ValueReference>\
             <Polygon srsName=\"{}\"><exterior><LinearRing><posList>{}</posList>\
             </LinearRing></exterior></Polygon></Intersects>",
            self.geometry_field,
            self.srs_name,
            pos_list.join(" ")
        )
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
