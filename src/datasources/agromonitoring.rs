use super::{check_status, VegetationProvider};
use crate::config::AgromonitoringConfig;
use crate::error::{AgroFusionError, Result};
use crate::models::{Location, VegetationReading};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;

const SOURCE: &str = "Agromonitoring NDVI";

/// Half-width of the square polygon registered around a location, in degrees.
const POLYGON_HALF_SIDE_DEG: f64 = 0.01;

/// How far back to look for a usable satellite pass.
const HISTORY_DAYS: i64 = 30;

/// Satellite NDVI from the Agromonitoring API. NDVI is served per registered
/// polygon, so a small square is created around each new location on first use.
pub struct AgromonitoringClient {
    client: reqwest::Client,
    config: AgromonitoringConfig,
}

#[derive(Debug, Deserialize)]
struct AgroPolygon {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AgroNdviEntry {
    dt: i64,
    data: AgroNdviStats,
}

#[derive(Debug, Deserialize)]
struct AgroNdviStats {
    mean: f64,
}

fn polygon_name(location: &Location) -> String {
    format!("agrofusion-{:.4}-{:.4}", location.lat, location.lon)
}

/// GeoJSON polygon around the point. Rings are closed and in lon/lat order.
fn polygon_body(location: &Location) -> serde_json::Value {
    let d = POLYGON_HALF_SIDE_DEG;
    let (lat, lon) = (location.lat, location.lon);
    serde_json::json!({
        "name": polygon_name(location),
        "geo_json": {
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [lon - d, lat - d],
                    [lon + d, lat - d],
                    [lon + d, lat + d],
                    [lon - d, lat + d],
                    [lon - d, lat - d]
                ]]
            }
        }
    })
}

/// Mean NDVI of the most recent pass.
fn latest_ndvi(entries: &[AgroNdviEntry]) -> Option<f64> {
    entries.iter().max_by_key(|e| e.dt).map(|e| e.data.mean)
}

impl AgromonitoringClient {
    pub fn new(config: AgromonitoringConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn unavailable(e: impl std::fmt::Display) -> AgroFusionError {
        AgroFusionError::DataSourceUnavailable(format!("{}: {}", SOURCE, e))
    }

    async fn polygon_id(&self, location: &Location) -> Result<String> {
        let url = format!(
            "{}/polygons?appid={}",
            self.config.base_url, self.config.api_key
        );
        let response = self.client.get(&url).send().await.map_err(Self::unavailable)?;
        let polygons: Vec<AgroPolygon> = check_status(SOURCE, response)
            .await?
            .json()
            .await
            .map_err(Self::unavailable)?;

        let wanted = polygon_name(location);
        if let Some(existing) = polygons.into_iter().find(|p| p.name == wanted) {
            return Ok(existing.id);
        }

        tracing::debug!("Registering Agromonitoring polygon {}", wanted);
        let response = self
            .client
            .post(&url)
            .json(&polygon_body(location))
            .send()
            .await
            .map_err(Self::unavailable)?;
        let created: AgroPolygon = check_status(SOURCE, response)
            .await?
            .json()
            .await
            .map_err(Self::unavailable)?;

        Ok(created.id)
    }
}

#[async_trait]
impl VegetationProvider for AgromonitoringClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch_vegetation(&self, location: &Location) -> Result<VegetationReading> {
        let polygon_id = self.polygon_id(location).await?;

        let end = Utc::now().timestamp();
        let start = end - HISTORY_DAYS * 24 * 3600;
        let url = format!(
            "{}/ndvi/history?polyid={}&start={}&end={}&appid={}",
            self.config.base_url, polygon_id, start, end, self.config.api_key
        );

        let response = self.client.get(&url).send().await.map_err(Self::unavailable)?;
        let entries: Vec<AgroNdviEntry> = check_status(SOURCE, response)
            .await?
            .json()
            .await
            .map_err(Self::unavailable)?;

        let ndvi = latest_ndvi(&entries).ok_or_else(|| {
            AgroFusionError::DataSourceUnavailable(format!(
                "{}: no satellite pass in the last {} days",
                SOURCE, HISTORY_DAYS
            ))
        })?;

        Ok(VegetationReading { ndvi })
    }

    async fn test_connection(&self) -> Result<bool> {
        let url = format!(
            "{}/polygons?appid={}",
            self.config.base_url, self.config.api_key
        );
        let response = self.client.get(&url).send().await.map_err(Self::unavailable)?;
        Ok(response.status().is_success())
    }
}
