use super::{check_status, Geocoder};
use crate::config::NominatimConfig;
use crate::error::{AgroFusionError, Result};
use crate::models::{Coordinates, Location};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const SOURCE: &str = "Nominatim";

/// OpenStreetMap Nominatim geocoder. Requires a descriptive User-Agent.
pub struct NominatimClient {
    client: reqwest::Client,
    config: NominatimConfig,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// "Locality, State", falling back to the country when no state is given.
    fn label(&self) -> Option<String> {
        let locality = self
            .city
            .as_ref()
            .or(self.town.as_ref())
            .or(self.village.as_ref())
            .or(self.county.as_ref())
            .or(self.state_district.as_ref())?;

        match self.state.as_ref().or(self.country.as_ref()) {
            Some(area) if area != locality => Some(format!("{}, {}", locality, area)),
            _ => Some(locality.clone()),
        }
    }
}

impl NominatimClient {
    pub fn new(config: NominatimConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn search_text(&self, place: &str) -> String {
        match &self.config.country_hint {
            Some(country) if !place.to_lowercase().contains(&country.to_lowercase()) => {
                format!("{}, {}", place, country)
            }
            _ => place.to_string(),
        }
    }

    async fn get(&self, url: reqwest::Url) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AgroFusionError::DataSourceUnavailable(format!("{}: {}", SOURCE, e)))?;
        check_status(SOURCE, response).await
    }
}

fn parse_url(base: &str, path: &str, params: &[(&str, String)]) -> Result<reqwest::Url> {
    reqwest::Url::parse_with_params(&format!("{}/{}", base.trim_end_matches('/'), path), params)
        .map_err(|e| AgroFusionError::Config(format!("Invalid Nominatim URL: {}", e)))
}

fn place_to_location(place: NominatimPlace) -> Result<Location> {
    let lat: f64 = place
        .lat
        .parse()
        .map_err(|_| AgroFusionError::InvalidData(format!("bad latitude '{}'", place.lat)))?;
    let lon: f64 = place
        .lon
        .parse()
        .map_err(|_| AgroFusionError::InvalidData(format!("bad longitude '{}'", place.lon)))?;

    let name = place
        .address
        .as_ref()
        .and_then(NominatimAddress::label)
        .unwrap_or(place.display_name);

    Ok(Location::new(name, lat, lon))
}

#[async_trait]
impl Geocoder for NominatimClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn forward(&self, place: &str) -> Result<Option<Location>> {
        let url = parse_url(
            &self.config.base_url,
            "search",
            &[
                ("q", self.search_text(place)),
                ("format", "json".into()),
                ("limit", "1".into()),
                ("addressdetails", "1".into()),
                ("accept-language", "en".into()),
            ],
        )?;

        let places: Vec<NominatimPlace> = self.get(url).await?.json().await.map_err(|e| {
            let message = format!("Failed to parse Nominatim search: {}", e);
            AgroFusionError::DataSourceUnavailable(message)
        })?;

        places.into_iter().next().map(place_to_location).transpose()
    }

    async fn reverse(&self, coords: Coordinates) -> Result<Option<String>> {
        let url = parse_url(
            &self.config.base_url,
            "reverse",
            &[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
                ("format", "json".into()),
                ("zoom", "10".into()),
                ("accept-language", "en".into()),
            ],
        )?;

        let body: NominatimReverse = self.get(url).await?.json().await.map_err(|e| {
            let message = format!("Failed to parse Nominatim reverse: {}", e);
            AgroFusionError::DataSourceUnavailable(message)
        })?;

        Ok(body.address.as_ref().and_then(NominatimAddress::label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_label_prefers_city_then_state() {
        let address = NominatimAddress {
            city: Some("Agra".into()),
            county: Some("Agra District".into()),
            state: Some("Uttar Pradesh".into()),
            ..Default::default()
        };
        assert_eq!(address.label().as_deref(), Some("Agra, Uttar Pradesh"));
    }

    #[test]
    fn address_label_falls_back_to_village_and_country() {
        let address = NominatimAddress {
            village: Some("Dankaur".into()),
            country: Some("India".into()),
            ..Default::default()
        };
        assert_eq!(address.label().as_deref(), Some("Dankaur, India"));

        assert!(NominatimAddress::default().label().is_none());
    }

    #[test]
    fn search_result_parses_into_location() {
        let places: Vec<NominatimPlace> = serde_json::from_str(
            r#"[{"lat":"27.1767","lon":"78.0081",
                 "display_name":"Agra, Agra District, Uttar Pradesh, 282001, India",
                 "address":{"city":"Agra","state":"Uttar Pradesh","country":"India"}}]"#,
        )
        .unwrap();
        let location = places.into_iter().next().map(place_to_location).unwrap().unwrap();

        assert_eq!(location.name, "Agra, Uttar Pradesh");
        assert!((location.lat - 27.1767).abs() < 1e-9);
    }

    #[test]
    fn reverse_error_body_has_no_address() {
        let body: NominatimReverse =
            serde_json::from_str(r#"{"error":"Unable to geocode"}"#).unwrap();
        assert!(body.address.is_none());
    }

    #[test]
    fn country_hint_is_appended_once() {
        let client =
            NominatimClient::new(NominatimConfig::default(), Duration::from_secs(5)).unwrap();
        assert_eq!(client.search_text("Mathura"), "Mathura, India");
        assert_eq!(client.search_text("Pune, India"), "Pune, India");
    }
}
