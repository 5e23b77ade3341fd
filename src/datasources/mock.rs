//! Deterministic stand-ins for the external providers.

use super::{
    Geocoder, MarketBook, ProviderSet, RegionCatalog, SoilProvider, VegetationProvider,
    WeatherProvider,
};
use crate::error::{AgroFusionError, Result};
use crate::models::{Coordinates, Location, SoilReading, VegetationReading, WeatherReading};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn failure(name: &str) -> AgroFusionError {
    AgroFusionError::DataSourceUnavailable(format!("{} is down", name))
}

#[derive(Default)]
pub struct MockGeocoder {
    places: HashMap<String, Location>,
    reverse_name: Option<String>,
    fail: bool,
    pub forward_calls: AtomicUsize,
}

impl MockGeocoder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_place(mut self, name: &str, lat: f64, lon: f64) -> Self {
        self.places
            .insert(name.to_lowercase(), Location::new(name, lat, lon));
        self
    }

    pub fn with_reverse_name(mut self, name: &str) -> Self {
        self.reverse_name = Some(name.to_string());
        self
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    fn name(&self) -> &'static str {
        "Mock Geocoder"
    }

    async fn forward(&self, place: &str) -> Result<Option<Location>> {
        self.forward_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(failure("Mock Geocoder"));
        }
        Ok(self.places.get(&place.trim().to_lowercase()).cloned())
    }

    async fn reverse(&self, _coords: Coordinates) -> Result<Option<String>> {
        if self.fail {
            return Err(failure("Mock Geocoder"));
        }
        Ok(self.reverse_name.clone())
    }
}

/// A provider answering with a fixed reading, after an optional delay.
/// `None` as the reading makes every call fail.
pub struct MockSource<T> {
    name: &'static str,
    reading: Option<T>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl<T: Clone + Send + Sync> MockSource<T> {
    pub fn new(name: &'static str, reading: T) -> Self {
        Self {
            name,
            reading: Some(reading),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            reading: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reading.clone().ok_or_else(|| failure(self.name))
    }
}

pub type MockWeather = MockSource<WeatherReading>;
pub type MockSoil = MockSource<SoilReading>;
pub type MockVegetation = MockSource<VegetationReading>;

pub fn weather(temperature_avg_c: f64, rainfall_mm: f64) -> MockWeather {
    MockSource::new(
        "Mock Weather",
        WeatherReading {
            temperature_avg_c,
            rainfall_mm,
        },
    )
}

pub fn soil(moisture_pct: f64) -> MockSoil {
    MockSource::new("Mock Soil", SoilReading { moisture_pct })
}

pub fn vegetation(ndvi: f64) -> MockVegetation {
    MockSource::new("Mock Vegetation", VegetationReading { ndvi })
}

#[async_trait]
impl WeatherProvider for MockSource<WeatherReading> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_weather(&self, _location: &Location) -> Result<WeatherReading> {
        self.answer().await
    }
}

#[async_trait]
impl SoilProvider for MockSource<SoilReading> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_soil(&self, _location: &Location) -> Result<SoilReading> {
        self.answer().await
    }
}

#[async_trait]
impl VegetationProvider for MockSource<VegetationReading> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_vegetation(&self, _location: &Location) -> Result<VegetationReading> {
        self.answer().await
    }
}

/// Geocoder knowing Agra, Mathura and Greater Noida.
pub fn geocoder() -> MockGeocoder {
    MockGeocoder::default()
        .with_place("Agra", 27.18, 78.01)
        .with_place("Mathura", 27.49, 77.675)
        .with_place("Greater Noida", 28.475, 77.525)
}

/// Healthy, moist, warm readings from every provider.
pub fn provider_set() -> ProviderSet {
    provider_set_with(
        Arc::new(weather(31.0, 40.0)),
        Arc::new(soil(38.0)),
        Arc::new(vegetation(0.62)),
    )
}

pub fn provider_set_with(
    weather: Arc<dyn WeatherProvider>,
    soil: Arc<dyn SoilProvider>,
    vegetation: Arc<dyn VegetationProvider>,
) -> ProviderSet {
    ProviderSet {
        geocoder: Arc::new(geocoder()),
        weather,
        soil,
        vegetation,
        catalog: Arc::new(RegionCatalog::embedded().expect("embedded catalog")),
        market: Arc::new(MarketBook::embedded().expect("embedded market book")),
    }
}
