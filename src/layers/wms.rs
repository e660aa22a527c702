//! WMS raster basemaps.
//!
//! Basemaps and raster overlays are plain image-service layers addressed
//! by layer name. Exactly one basemap is visible at a time. Fetched
//! images are kept in a small LRU cache keyed by request URL so
//! re-toggling basemaps and panning back do not refetch.

use lru::LruCache;
use std::num::NonZeroUsize;

use crate::{
    core::{bounds::Bounds, config::{BasemapLayerConfig, LayerConfig}},
    Result,
};

/// Raster images kept per basemap set
const IMAGE_CACHE_SIZE: usize = 64;

/// One WMS image source
#[derive(Debug, Clone)]
pub struct WmsSource {
    url: String,
    layer_name: String,
}

impl WmsSource {
    pub fn new(url: &str, layer_name: &str) -> Self {
        Self {
            url: url.to_string(),
            layer_name: layer_name.to_string(),
        }
    }

    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    /// GetMap URL for one extent at a pixel size
    pub fn image_url(&self, extent: &Bounds, width: u32, height: u32, srs_name: &str) -> String {
        let [min_x, min_y, max_x, max_y] = extent.to_extent();
        format!(
            "{}?SERVICE=WMS&VERSION=1.3.0&REQUEST=GetMap&LAYERS={}&CRS={}&BBOX={},{},{},{}&WIDTH={}&HEIGHT={}&FORMAT=image/png",
            self.url, self.layer_name, srs_name, min_x, min_y, max_x, max_y, width, height
        )
    }
}

/// The configured basemaps with a single-visible invariant
pub struct BasemapSet {
    sources: Vec<WmsSource>,
    visible: usize,
    srs_name: String,
    cache: LruCache<String, Vec<u8>>,
}

impl BasemapSet {
    /// Builds the set from configuration; the first basemap starts visible
    pub fn new(config: &LayerConfig<BasemapLayerConfig>, srs_name: &str) -> Self {
        let sources = config
            .layers
            .iter()
            .map(|layer| WmsSource::new(&config.source_url, &layer.identifier))
            .collect();
        Self {
            sources,
            visible: 0,
            srs_name: srs_name.to_string(),
            cache: LruCache::new(NonZeroUsize::new(IMAGE_CACHE_SIZE).expect("nonzero cache size")),
        }
    }

    /// The identifier of the currently visible basemap
    pub fn visible_basemap(&self) -> Option<&str> {
        self.sources.get(self.visible).map(WmsSource::layer_name)
    }

    /// Switches the visible basemap; there can be only one
    pub fn set_visible_basemap(&mut self, identifier: &str) -> Result<()> {
        match self
            .sources
            .iter()
            .position(|s| s.layer_name() == identifier)
        {
            Some(index) => {
                self.visible = index;
                Ok(())
            }
            None => Err(Box::new(crate::Error::Layer(format!(
                "unknown basemap {identifier}"
            )))),
        }
    }

    /// Fetches the visible basemap image for an extent, consulting the
    /// LRU cache first
    pub async fn fetch_visible_image(
        &mut self,
        client: &reqwest::Client,
        extent: &Bounds,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>> {
        let Some(source) = self.sources.get(self.visible) else {
            return Err(Box::new(crate::Error::Layer(
                "no basemap configured".to_string(),
            )));
        };
        let url = source.image_url(extent, width, height, &self.srs_name);

        if let Some(image) = self.cache.get(&url) {
            return Ok(image.clone());
        }

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(crate::Error::Network)?
            .error_for_status()
            .map_err(crate::Error::Network)?;
        let bytes = response.bytes().await.map_err(crate::Error::Network)?.to_vec();

        self.cache.put(url, bytes.clone());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LayerConfig<BasemapLayerConfig> {
        LayerConfig {
            name: "Basemaps".to_string(),
            layers: vec![
                BasemapLayerConfig {
                    identifier: "avoindata:Kartta".to_string(),
                    name: "Map".to_string(),
                },
                BasemapLayerConfig {
                    identifier: "avoindata:Ortoilmakuva".to_string(),
                    name: "Aerial".to_string(),
                },
            ],
            source_url: "https://example.test/wms".to_string(),
        }
    }

    #[test]
    fn test_first_basemap_starts_visible() {
        let set = BasemapSet::new(&config(), "EPSG:3879");
        assert_eq!(set.visible_basemap(), Some("avoindata:Kartta"));
    }

    #[test]
    fn test_single_visible_invariant() {
        let mut set = BasemapSet::new(&config(), "EPSG:3879");
        set.set_visible_basemap("avoindata:Ortoilmakuva").unwrap();
        assert_eq!(set.visible_basemap(), Some("avoindata:Ortoilmakuva"));
        assert!(set.set_visible_basemap("nope").is_err());
    }

    #[test]
    fn test_image_url_carries_layer_and_bbox() {
        let source = WmsSource::new("https://example.test/wms", "avoindata:Kartta");
        let url = source.image_url(
            &Bounds::from_coords(0.0, 0.0, 100.0, 200.0),
            800,
            600,
            "EPSG:3879",
        );
        assert!(url.contains("LAYERS=avoindata:Kartta"));
        assert!(url.contains("BBOX=0,0,100,200"));
        assert!(url.contains("WIDTH=800&HEIGHT=600"));
    }
}
