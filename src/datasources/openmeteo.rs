use super::{check_status, SoilProvider, WeatherProvider};
use crate::config::OpenMeteoConfig;
use crate::error::{AgroFusionError, Result};
use crate::logic::calculations::mean;
use crate::models::{Location, SoilReading, WeatherReading};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub const WEATHER_SOURCE: &str = "Open-Meteo Weather";
pub const SOIL_SOURCE: &str = "Open-Meteo Soil";

/// Open-Meteo forecast API. One client serves both the weather and the
/// soil-moisture signal; each is attributed under its own source name.
pub struct OpenMeteoClient {
    client: reqwest::Client,
    config: OpenMeteoConfig,
}

// Open-Meteo API response structures
#[derive(Debug, Deserialize)]
struct OmDailyResponse {
    daily: OmDaily,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmHourlyResponse {
    hourly: OmHourly,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    #[serde(default)]
    soil_moisture_0_to_1cm: Vec<Option<f64>>,
}

impl OpenMeteoClient {
    pub fn new(config: OpenMeteoConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, source: &str, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AgroFusionError::DataSourceUnavailable(format!("{}: {}", source, e)))?;

        let response = check_status(source, response).await?;

        response.json().await.map_err(|e| {
            AgroFusionError::DataSourceUnavailable(format!(
                "Failed to parse {} response: {}",
                source, e
            ))
        })
    }

    async fn ping(&self) -> Result<bool> {
        let url = format!(
            "{}/forecast?latitude=0&longitude=0&current=temperature_2m",
            self.config.base_url
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AgroFusionError::DataSourceUnavailable(format!("Open-Meteo: {}", e)))?;
        Ok(response.status().is_success())
    }
}

/// Mean temperature and total rainfall over the returned daily window.
fn summarize_daily(daily: &OmDaily) -> Result<WeatherReading> {
    let temps: Vec<f64> = daily.temperature_2m_mean.iter().flatten().copied().collect();
    let temperature_avg_c = mean(&temps).ok_or_else(|| {
        AgroFusionError::InvalidData("Open-Meteo returned no temperature values".into())
    })?;

    let rainfall_mm = daily.precipitation_sum.iter().flatten().sum::<f64>();

    Ok(WeatherReading {
        temperature_avg_c,
        rainfall_mm,
    })
}

/// Volumetric soil moisture (m³/m³) averaged and converted to percent.
fn summarize_soil(hourly: &OmHourly) -> Result<SoilReading> {
    let values: Vec<f64> = hourly.soil_moisture_0_to_1cm.iter().flatten().copied().collect();
    let fraction = mean(&values).ok_or_else(|| {
        AgroFusionError::InvalidData("Open-Meteo returned no soil moisture values".into())
    })?;

    Ok(SoilReading {
        moisture_pct: fraction * 100.0,
    })
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    fn name(&self) -> &'static str {
        WEATHER_SOURCE
    }

    /// Past seven days plus today
    async fn fetch_weather(&self, location: &Location) -> Result<WeatherReading> {
        let url = format!(
            concat!(
                "{}/forecast?latitude={}&longitude={}",
                "&daily=temperature_2m_mean,precipitation_sum",
                "&past_days=7&forecast_days=1&timezone=auto"
            ),
            self.config.base_url, location.lat, location.lon
        );
        let body: OmDailyResponse = self.get_json(WEATHER_SOURCE, &url).await?;
        summarize_daily(&body.daily)
    }

    async fn test_connection(&self) -> Result<bool> {
        self.ping().await
    }
}

#[async_trait]
impl SoilProvider for OpenMeteoClient {
    fn name(&self) -> &'static str {
        SOIL_SOURCE
    }

    async fn fetch_soil(&self, location: &Location) -> Result<SoilReading> {
        let url = format!(
            concat!(
                "{}/forecast?latitude={}&longitude={}",
                "&hourly=soil_moisture_0_to_1cm&past_days=1&forecast_days=1"
            ),
            self.config.base_url, location.lat, location.lon
        );
        let body: OmHourlyResponse = self.get_json(SOIL_SOURCE, &url).await?;
        summarize_soil(&body.hourly)
    }

    async fn test_connection(&self) -> Result<bool> {
        self.ping().await
    }
}
