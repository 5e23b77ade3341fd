pub mod agromonitoring;
pub mod catalog;
pub mod market;
pub mod nominatim;
pub mod openmeteo;
pub mod seasonal;

#[cfg(test)]
pub mod mock;

pub use agromonitoring::AgromonitoringClient;
pub use catalog::{NearestRegion, RegionCatalog, RegionRecord};
pub use market::{MarketBook, MarketEntry};
pub use nominatim::NominatimClient;
pub use openmeteo::OpenMeteoClient;
pub use seasonal::SeasonalNdviEstimate;

use crate::config::ProvidersConfig;
use crate::error::{AgroFusionError, Result};
use crate::models::{Coordinates, Location, SoilReading, VegetationReading, WeatherReading};
use async_trait::async_trait;
use std::sync::Arc;

/// Place name <-> coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Best match for a place name, or None when the place is unknown.
    async fn forward(&self, place: &str) -> Result<Option<Location>>;

    /// Human-readable name for a point, or None when nothing is known there.
    async fn reverse(&self, coords: Coordinates) -> Result<Option<String>>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_weather(&self, location: &Location) -> Result<WeatherReading>;

    async fn test_connection(&self) -> Result<bool> {
        Ok(true)
    }
}

#[async_trait]
pub trait SoilProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_soil(&self, location: &Location) -> Result<SoilReading>;

    async fn test_connection(&self) -> Result<bool> {
        Ok(true)
    }
}

#[async_trait]
pub trait VegetationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_vegetation(&self, location: &Location) -> Result<VegetationReading>;

    async fn test_connection(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Tries each geocoder in turn; the first definite answer wins.
/// A failing geocoder is logged and skipped.
pub struct GeocoderChain {
    geocoders: Vec<Arc<dyn Geocoder>>,
}

impl GeocoderChain {
    pub fn new(geocoders: Vec<Arc<dyn Geocoder>>) -> Self {
        Self { geocoders }
    }
}

#[async_trait]
impl Geocoder for GeocoderChain {
    fn name(&self) -> &'static str {
        "Geocoder Chain"
    }

    async fn forward(&self, place: &str) -> Result<Option<Location>> {
        for geocoder in &self.geocoders {
            match geocoder.forward(place).await {
                Ok(Some(location)) => return Ok(Some(location)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("{} could not geocode '{}': {}", geocoder.name(), place, e)
                }
            }
        }
        Ok(None)
    }

    async fn reverse(&self, coords: Coordinates) -> Result<Option<String>> {
        for geocoder in &self.geocoders {
            match geocoder.reverse(coords).await {
                Ok(Some(name)) => return Ok(Some(name)),
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    "{} could not reverse geocode ({}, {}): {}",
                    geocoder.name(),
                    coords.lat,
                    coords.lon,
                    e
                ),
            }
        }
        Ok(None)
    }
}

/// Stands in for a provider that is switched off in config. Every fetch fails,
/// so fusion reports the signal as missing.
pub struct DisabledSource {
    name: &'static str,
}

impl DisabledSource {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    fn unavailable(&self) -> AgroFusionError {
        AgroFusionError::DataSourceUnavailable(format!("{} is disabled", self.name))
    }
}

#[async_trait]
impl WeatherProvider for DisabledSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_weather(&self, _location: &Location) -> Result<WeatherReading> {
        Err(self.unavailable())
    }

    async fn test_connection(&self) -> Result<bool> {
        Ok(false)
    }
}

#[async_trait]
impl SoilProvider for DisabledSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_soil(&self, _location: &Location) -> Result<SoilReading> {
        Err(self.unavailable())
    }

    async fn test_connection(&self) -> Result<bool> {
        Ok(false)
    }
}

/// Every external collaborator the pipeline talks to.
#[derive(Clone)]
pub struct ProviderSet {
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherProvider>,
    pub soil: Arc<dyn SoilProvider>,
    pub vegetation: Arc<dyn VegetationProvider>,
    pub catalog: Arc<RegionCatalog>,
    pub market: Arc<MarketBook>,
}

impl ProviderSet {
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let timeout = config.timeout();
        let catalog = Arc::new(RegionCatalog::embedded()?);
        let market = Arc::new(MarketBook::embedded()?);

        let mut geocoders: Vec<Arc<dyn Geocoder>> = vec![catalog.clone() as Arc<dyn Geocoder>];
        if config.nominatim.enabled {
            geocoders.push(Arc::new(NominatimClient::new(
                config.nominatim.clone(),
                timeout,
            )?));
            tracing::info!("Nominatim geocoding enabled as catalog fallback");
        } else {
            tracing::info!("Nominatim disabled - only catalog regions will resolve");
        }
        geocoders.push(Arc::new(NearestRegion::new(catalog.clone())));

        let (weather, soil): (Arc<dyn WeatherProvider>, Arc<dyn SoilProvider>) =
            if config.open_meteo.enabled {
                let client = Arc::new(OpenMeteoClient::new(config.open_meteo.clone(), timeout)?);
                (client.clone() as Arc<dyn WeatherProvider>, client as Arc<dyn SoilProvider>)
            } else {
                tracing::warn!("Open-Meteo disabled - weather and soil readings will be missing");
                (
                    Arc::new(DisabledSource::new(openmeteo::WEATHER_SOURCE))
                        as Arc<dyn WeatherProvider>,
                    Arc::new(DisabledSource::new(openmeteo::SOIL_SOURCE)) as Arc<dyn SoilProvider>,
                )
            };

        let vegetation: Arc<dyn VegetationProvider> = match config
            .agromonitoring
            .as_ref()
            .filter(|c| c.enabled && !c.api_key.is_empty() && !c.api_key.starts_with("${"))
        {
            Some(agro) => {
                tracing::info!("Agromonitoring configured for satellite NDVI");
                Arc::new(AgromonitoringClient::new(agro.clone(), timeout)?)
            }
            None => {
                tracing::info!("No Agromonitoring key - using seasonal NDVI estimate");
                Arc::new(SeasonalNdviEstimate::new())
            }
        };

        Ok(Self {
            geocoder: Arc::new(GeocoderChain::new(geocoders)),
            weather,
            soil,
            vegetation,
            catalog,
            market,
        })
    }
}

impl ProviderSet {
    /// Probes the weather, soil and vegetation providers concurrently.
    pub async fn check_connections(&self) -> Vec<(&'static str, bool)> {
        let (weather, soil, vegetation) = tokio::join!(
            self.weather.test_connection(),
            self.soil.test_connection(),
            self.vegetation.test_connection(),
        );
        [
            (self.weather.name(), weather),
            (self.soil.name(), soil),
            (self.vegetation.name(), vegetation),
        ]
        .into_iter()
        .map(|(name, result)| {
            let connected = result.unwrap_or_else(|e| {
                tracing::warn!("{} connection test failed: {}", name, e);
                false
            });
            (name, connected)
        })
        .collect()
    }
}

/// Maps a non-success HTTP status into a provider error, keeping the body for context.
pub(crate) async fn check_status(
    source: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AgroFusionError::DataSourceUnavailable(format!(
        "{} returned {}: {}",
        source, status, body
    )))
}

#[cfg(test)]
mod tests {
    use super::mock::{self, MockGeocoder};
    use super::*;

    #[tokio::test]
    async fn chain_falls_through_to_next_geocoder() {
        let empty: Arc<dyn Geocoder> = Arc::new(MockGeocoder::default());
        let failing: Arc<dyn Geocoder> = Arc::new(MockGeocoder::failing());
        let known: Arc<dyn Geocoder> =
            Arc::new(MockGeocoder::default().with_place("Agra", 27.18, 78.01));

        let chain = GeocoderChain::new(vec![empty, failing, known]);
        let found = chain.forward("Agra").await.unwrap().unwrap();
        assert_eq!(found.name, "Agra");

        assert!(chain.forward("Atlantis").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn chain_reverse_uses_first_answer() {
        let first: Arc<dyn Geocoder> =
            Arc::new(MockGeocoder::default().with_reverse_name("Agra, Uttar Pradesh"));
        let second: Arc<dyn Geocoder> =
            Arc::new(MockGeocoder::default().with_reverse_name("Somewhere else"));

        let chain = GeocoderChain::new(vec![first, second]);
        let name = chain.reverse(Coordinates::new(27.18, 78.01)).await.unwrap();
        assert_eq!(name.as_deref(), Some("Agra, Uttar Pradesh"));
    }

    #[tokio::test]
    async fn disabled_source_always_fails() {
        let source = DisabledSource::new("Open-Meteo Weather");
        let location = Location::new("Agra", 27.18, 78.01);
        assert!(source.fetch_weather(&location).await.is_err());
        assert!(!WeatherProvider::test_connection(&source).await.unwrap());
    }

    #[test]
    fn default_provider_set_builds_offline_pieces() {
        let set = ProviderSet::from_config(&ProvidersConfig::default()).unwrap();
        assert_eq!(set.vegetation.name(), "Seasonal NDVI Estimate");
        assert_eq!(set.weather.name(), "Open-Meteo Weather");
        assert_eq!(set.soil.name(), "Open-Meteo Soil");
        assert!(set.market.get("potato").is_some());
    }

    #[tokio::test]
    async fn connection_check_reports_each_provider() {
        let set = mock::provider_set_with(
            Arc::new(DisabledSource::new("Open-Meteo Weather")),
            Arc::new(mock::soil(30.0)),
            Arc::new(mock::vegetation(0.5)),
        );
        assert_eq!(
            set.check_connections().await,
            vec![
                ("Open-Meteo Weather", false),
                ("Mock Soil", true),
                ("Mock Vegetation", true),
            ]
        );
    }
}
