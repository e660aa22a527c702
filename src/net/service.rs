//! Feature-source access.
//!
//! All network traffic funnels through the [`FeatureService`] trait so
//! the engine can run against an HTTP-backed WFS endpoint in production
//! and an in-memory double in tests.

use async_trait::async_trait;

use crate::{
    core::config::MapConfig,
    data::feature::{parse_feature_collection, Feature, FeatureId},
    query::filter::QueryBuilder,
    Result,
};

/// Length of the response-body excerpt included in error logs
const LOG_EXCERPT_LEN: usize = 200;

/// Asynchronous access to the vector feature source
#[async_trait]
pub trait FeatureService: Send + Sync {
    /// Fetches features of one layer matching an OGC filter expression
    async fn fetch_features(&self, layer: &str, filter: &str) -> Result<Vec<Feature>>;

    /// Fetches a single feature by exact resource identity
    async fn fetch_feature_by_id(&self, id: &FeatureId) -> Result<Option<Feature>>;
}

/// WFS-backed feature service
pub struct HttpFeatureService {
    client: reqwest::Client,
    wfs_url: String,
    query_builder: QueryBuilder,
}

impl HttpFeatureService {
    pub fn new(client: reqwest::Client, wfs_url: &str, srs_name: &str) -> Self {
        Self {
            client,
            wfs_url: wfs_url.to_string(),
            query_builder: QueryBuilder::new(srs_name),
        }
    }

    async fn get_feature(&self, layer: &str, filter: &str) -> Result<Vec<Feature>> {
        let response = self
            .client
            .get(&self.wfs_url)
            .query(&[
                ("service", "WFS"),
                ("version", "2.0.0"),
                ("request", "GetFeature"),
                ("typeNames", layer),
                ("outputFormat", "application/json"),
                ("filter", filter),
            ])
            .send()
            .await
            .map_err(crate::Error::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(crate::Error::Network)?;
        if !status.is_success() {
            return Err(Box::new(crate::Error::Layer(format!(
                "feature fetch for {layer} failed with {status}: {}",
                excerpt(&body)
            ))));
        }

        parse_feature_collection(&body)
    }
}

#[async_trait]
impl FeatureService for HttpFeatureService {
    async fn fetch_features(&self, layer: &str, filter: &str) -> Result<Vec<Feature>> {
        self.get_feature(layer, filter).await
    }

    async fn fetch_feature_by_id(&self, id: &FeatureId) -> Result<Option<Feature>> {
        let filter = self.query_builder.resource_id_query(&id.to_string());
        let features = self.get_feature(id.feature_type(), &filter).await?;
        Ok(features.into_iter().find(|f| &f.id == id))
    }
}

/// Fetches the map configuration. Failures here are fatal to startup:
/// the error is logged with a response excerpt and propagated, and no
/// partial map is shown.
pub async fn fetch_map_config(client: &reqwest::Client, url: &str) -> Result<MapConfig> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(crate::Error::Network)?;

    let status = response.status();
    let body = response.text().await.map_err(crate::Error::Network)?;
    if !status.is_success() {
        log::error!(
            "map configuration fetch failed with {status}: {}",
            excerpt(&body)
        );
        return Err(Box::new(crate::Error::Config(format!(
            "map configuration fetch failed with {status}"
        ))));
    }

    serde_json::from_str(&body).map_err(|e| {
        log::error!("malformed map configuration: {e}: {}", excerpt(&body));
        Box::new(crate::Error::Serialization(e)) as _
    })
}

fn excerpt(body: &str) -> &str {
    if body.len() <= LOG_EXCERPT_LEN {
        return body;
    }
    let mut end = LOG_EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
