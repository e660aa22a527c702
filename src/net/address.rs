//! Address geocoding search.
//!
//! Queries a paginated geocoding endpoint and consumes only the first
//! results page. Result coordinates arrive in WGS84 and are reprojected
//! into map coordinates before use. Search failures degrade to an empty
//! result list so the search UI shows "no results" instead of an error.

use serde::Deserialize;

use crate::core::geo::{LonLat, Point, Projection};

/// Localized name variants of an address or street
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalizedName {
    #[serde(default)]
    pub fi: Option<String>,
    #[serde(default)]
    pub sv: Option<String>,
    #[serde(default)]
    pub en: Option<String>,
}

impl LocalizedName {
    /// The name in the requested language, falling back to English and
    /// then to any variant present
    pub fn resolve(&self, language: &str) -> Option<&str> {
        let preferred = match language {
            "fi" => self.fi.as_deref(),
            "sv" => self.sv.as_deref(),
            "en" => self.en.as_deref(),
            _ => None,
        };
        preferred
            .or(self.en.as_deref())
            .or(self.fi.as_deref())
            .or(self.sv.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressLocation {
    /// `[longitude, latitude]` in WGS84
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Street {
    #[serde(default)]
    pub name: LocalizedName,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Municipality {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: LocalizedName,
}

/// One geocoding result
#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub name: LocalizedName,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub street: Street,
    #[serde(default)]
    pub municipality: Municipality,
    pub location: AddressLocation,
}

impl Address {
    /// Display label in the requested language
    pub fn label(&self, language: &str) -> String {
        if let Some(name) = self.name.resolve(language) {
            return name.to_string();
        }
        match (self.street.name.resolve(language), self.number.as_deref()) {
            (Some(street), Some(number)) => format!("{street} {number}"),
            (Some(street), None) => street.to_string(),
            _ => String::new(),
        }
    }

    /// Result coordinate projected into map units
    pub fn map_coordinate(&self, projection: &Projection) -> Point {
        let [lon, lat] = self.location.coordinates;
        projection.project(&LonLat::new(lon, lat))
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<Address>,
}

/// Geocoding client bound to one municipality and language
pub struct AddressSearch {
    client: reqwest::Client,
    base_url: String,
    municipality: String,
    language: String,
}

impl AddressSearch {
    pub fn new(client: reqwest::Client, base_url: &str, municipality: &str, language: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            municipality: municipality.to_string(),
            language: language.to_string(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Runs an address search, returning the first page of results.
    /// Any failure yields an empty list.
    pub async fn search(&self, query: &str) -> Vec<Address> {
        match self.try_search(query).await {
            Ok(results) => results,
            Err(e) => {
                log::warn!("address search failed: {e}");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str) -> crate::Result<Vec<Address>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("type", "address"),
                ("municipality", &self.municipality),
                ("language", &self.language),
            ])
            .send()
            .await
            .map_err(crate::Error::Network)?
            .error_for_status()
            .map_err(crate::Error::Network)?;

        let page: SearchPage = response.json().await.map_err(crate::Error::Network)?;
        Ok(page.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address_json() -> &'static str {
        r#"{
            "name": {},
            "number": "12",
            "street": {"name": {"fi": "Mannerheimintie", "sv": "Mannerheimvägen"}},
            "municipality": {"id": "helsinki", "name": {"fi": "Helsinki"}},
            "location": {"type": "Point", "coordinates": [24.941, 60.172]}
        }"#
    }

    #[test]
    fn test_label_resolution_with_fallbacks() {
        let address: Address = serde_json::from_str(address_json()).unwrap();
        assert_eq!(address.label("fi"), "Mannerheimintie 12");
        assert_eq!(address.label("sv"), "Mannerheimvägen 12");
        // No English street name: falls back to any present variant
        assert_eq!(address.label("en"), "Mannerheimintie 12");
    }

    #[test]
    fn test_map_coordinate_is_projected() {
        let address: Address = serde_json::from_str(address_json()).unwrap();
        let projection = Projection::epsg_3879();
        let point = address.map_coordinate(&projection);
        let [min_x, min_y, max_x, max_y] = projection.extent;
        assert!(point.x > min_x && point.x < max_x);
        assert!(point.y > min_y && point.y < max_y);
    }

    #[test]
    fn test_first_page_parsing_ignores_pagination() {
        let page: SearchPage = serde_json::from_str(&format!(
            r#"{{"count": 40, "next": "page2", "previous": null, "results": [{}]}}"#,
            address_json()
        ))
        .unwrap();
        assert_eq!(page.results.len(), 1);
    }
}
