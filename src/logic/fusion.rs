use crate::datasources::{ProviderSet, SoilProvider, VegetationProvider, WeatherProvider};
use crate::error::{AgroFusionError, Result};
use crate::models::{FusedRecord, Location};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Read-through cache for the designated default location.
///
/// Holds at most one record and only ever a complete one, so a reader either
/// sees nothing cached or sees a record every provider contributed to.
pub struct DefaultLocationMemo {
    location: Location,
    cell: OnceCell<FusedRecord>,
}

enum MemoMiss {
    Partial(FusedRecord),
    Failed(AgroFusionError),
}

impl DefaultLocationMemo {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            cell: OnceCell::new(),
        }
    }

    pub fn covers(&self, location: &Location) -> bool {
        self.location.same_region(location)
    }

    #[cfg(test)]
    pub fn cached(&self) -> Option<&FusedRecord> {
        self.cell.get()
    }
}

/// Joins weather, soil and vegetation readings for a location into one record.
pub struct DataFusionEngine {
    weather: Arc<dyn WeatherProvider>,
    soil: Arc<dyn SoilProvider>,
    vegetation: Arc<dyn VegetationProvider>,
    timeout: Duration,
    memo: Option<DefaultLocationMemo>,
}

impl DataFusionEngine {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        soil: Arc<dyn SoilProvider>,
        vegetation: Arc<dyn VegetationProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            weather,
            soil,
            vegetation,
            timeout,
            memo: None,
        }
    }

    pub fn from_providers(providers: &ProviderSet, timeout: Duration) -> Self {
        Self::new(
            providers.weather.clone(),
            providers.soil.clone(),
            providers.vegetation.clone(),
            timeout,
        )
    }

    pub fn with_memo(mut self, memo: DefaultLocationMemo) -> Self {
        self.memo = Some(memo);
        self
    }

    #[cfg(test)]
    pub fn memo(&self) -> Option<&DefaultLocationMemo> {
        self.memo.as_ref()
    }

    /// Fails with `DataUnavailable` only when no provider answered.
    pub async fn fuse(&self, location: &Location) -> Result<FusedRecord> {
        match &self.memo {
            Some(memo) if memo.covers(location) => self.fuse_memoized(memo, location).await,
            _ => self.fuse_uncached(location).await,
        }
    }

    /// Fuses every location concurrently, keeping input order.
    pub async fn fuse_many(&self, locations: &[Location]) -> Vec<Result<FusedRecord>> {
        join_all(locations.iter().map(|location| self.fuse(location))).await
    }

    async fn fuse_memoized(
        &self,
        memo: &DefaultLocationMemo,
        location: &Location,
    ) -> Result<FusedRecord> {
        let outcome = memo
            .cell
            .get_or_try_init(|| async {
                match self.fuse_uncached(&memo.location).await {
                    Ok(record) if record.is_complete() => Ok(record),
                    Ok(partial) => Err(MemoMiss::Partial(partial)),
                    Err(e) => Err(MemoMiss::Failed(e)),
                }
            })
            .await;

        let mut record = match outcome {
            Ok(cached) => {
                tracing::debug!("Default-location memo hit for {}", location.name);
                cached.clone()
            }
            Err(MemoMiss::Partial(partial)) => {
                tracing::debug!("Partial record for default location not memoized");
                partial
            }
            Err(MemoMiss::Failed(e)) => return Err(e),
        };
        record.location = location.clone();
        Ok(record)
    }

    async fn fuse_uncached(&self, location: &Location) -> Result<FusedRecord> {
        let (weather, soil, vegetation) = tokio::join!(
            self.bounded(self.weather.name(), self.weather.fetch_weather(location)),
            self.bounded(self.soil.name(), self.soil.fetch_soil(location)),
            self.bounded(
                self.vegetation.name(),
                self.vegetation.fetch_vegetation(location)
            ),
        );

        let mut record = FusedRecord::empty(location.clone());
        if let Some(reading) = weather {
            record = record.with_weather(self.weather.name(), reading);
        }
        if let Some(reading) = soil {
            record = record.with_soil(self.soil.name(), reading);
        }
        if let Some(reading) = vegetation {
            record = record.with_vegetation(self.vegetation.name(), reading);
        }

        if record.data_sources.is_empty() {
            return Err(AgroFusionError::DataUnavailable(format!(
                "no provider answered for {}",
                location.name
            )));
        }

        tracing::debug!(
            "Fused {} from {} source(s): {:?}",
            location.name,
            record.data_sources.len(),
            record.data_sources
        );
        Ok(record)
    }

    /// Runs one provider call under the timeout; any failure becomes None.
    async fn bounded<T>(&self, source: &str, call: impl Future<Output = Result<T>>) -> Option<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(reading)) => Some(reading),
            Ok(Err(e)) => {
                tracing::warn!("{} failed: {}", source, e);
                None
            }
            Err(_) => {
                tracing::warn!("{} timed out after {:?}", source, self.timeout);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasources::mock::{self, MockSoil, MockVegetation, MockWeather};
    use crate::models::MISSING_READING;

    fn agra() -> Location {
        Location::new("Agra, Uttar Pradesh", 27.18, 78.01)
    }

    fn engine(
        weather: MockWeather,
        soil: MockSoil,
        vegetation: MockVegetation,
    ) -> DataFusionEngine {
        DataFusionEngine::new(
            Arc::new(weather),
            Arc::new(soil),
            Arc::new(vegetation),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn all_providers_answer() {
        let engine = engine(mock::weather(31.0, 12.0), mock::soil(38.0), mock::vegetation(0.6));
        let record = engine.fuse(&agra()).await.unwrap();

        assert!(record.is_complete());
        assert_eq!(
            record.data_sources,
            vec!["Mock Weather", "Mock Soil", "Mock Vegetation"]
        );
        assert_eq!(record.region(), "Agra, Uttar Pradesh");
    }

    #[tokio::test]
    async fn weather_failure_is_isolated() {
        let engine = engine(
            MockWeather::failing("Mock Weather"),
            mock::soil(38.0),
            mock::vegetation(0.6),
        );
        let record = engine.fuse(&agra()).await.unwrap();

        assert_eq!(record.data_sources, vec!["Mock Soil", "Mock Vegetation"]);
        assert_eq!(record.temperature_avg_c, MISSING_READING);
        assert_eq!(record.rainfall_mm, MISSING_READING);
        assert_eq!(record.soil_moisture_pct, 38.0);
    }

    #[tokio::test]
    async fn timeout_counts_as_failure_of_that_signal() {
        let engine = engine(
            mock::weather(31.0, 12.0),
            mock::soil(38.0).with_delay(Duration::from_secs(5)),
            mock::vegetation(0.6),
        );
        let record = engine.fuse(&agra()).await.unwrap();

        assert_eq!(record.data_sources, vec!["Mock Weather", "Mock Vegetation"]);
        assert!(!record.has_soil_moisture());
    }

    #[tokio::test]
    async fn total_failure_is_data_unavailable() {
        let engine = engine(
            MockWeather::failing("Mock Weather"),
            MockSoil::failing("Mock Soil"),
            MockVegetation::failing("Mock Vegetation"),
        );
        assert!(matches!(
            engine.fuse(&agra()).await,
            Err(AgroFusionError::DataUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn fusion_is_idempotent_with_deterministic_providers() {
        let engine = engine(mock::weather(29.4, 3.2), mock::soil(22.5), mock::vegetation(0.41));
        let first = engine.fuse(&agra()).await.unwrap();
        let second = engine.fuse(&agra()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn fuse_many_keeps_order() {
        let engine = engine(mock::weather(29.4, 3.2), mock::soil(22.5), mock::vegetation(0.41));
        let locations = vec![
            Location::new("Mathura", 27.49, 77.675),
            Location::new("Agra", 27.18, 78.01),
        ];
        let records = engine.fuse_many(&locations).await;
        let names: Vec<String> = records
            .into_iter()
            .map(|r| r.unwrap().location.name)
            .collect();
        assert_eq!(names, vec!["Mathura", "Agra"]);
    }

    #[tokio::test]
    async fn memo_serves_repeat_calls_without_refetching() {
        let weather = Arc::new(mock::weather(31.0, 12.0));
        let engine = DataFusionEngine::new(
            weather.clone(),
            Arc::new(mock::soil(38.0)),
            Arc::new(mock::vegetation(0.6)),
            Duration::from_millis(200),
        )
        .with_memo(DefaultLocationMemo::new(agra()));

        let uncached = engine.fuse_uncached(&agra()).await.unwrap();
        let first = engine.fuse(&agra()).await.unwrap();
        let second = engine.fuse(&agra()).await.unwrap();

        assert_eq!(first, uncached);
        assert_eq!(second, uncached);
        // one direct call plus one memo fill
        assert_eq!(weather.call_count(), 2);
    }

    #[tokio::test]
    async fn memo_keeps_requested_location_name() {
        let engine = engine(mock::weather(31.0, 12.0), mock::soil(38.0), mock::vegetation(0.6))
            .with_memo(DefaultLocationMemo::new(agra()));
        let nearby = Location::new("Agra", 27.185, 78.005);

        let record = engine.fuse(&nearby).await.unwrap();
        assert_eq!(record.location, nearby);
    }

    #[tokio::test]
    async fn memo_never_stores_partial_records() {
        let engine = engine(
            MockWeather::failing("Mock Weather"),
            mock::soil(38.0),
            mock::vegetation(0.6),
        )
        .with_memo(DefaultLocationMemo::new(agra()));

        let record = engine.fuse(&agra()).await.unwrap();
        assert_eq!(record.data_sources.len(), 2);
        assert!(engine.memo().unwrap().cached().is_none());
    }

    #[tokio::test]
    async fn concurrent_memo_readers_see_complete_records() {
        let engine = Arc::new(
            engine(
                mock::weather(31.0, 12.0).with_delay(Duration::from_millis(20)),
                mock::soil(38.0),
                mock::vegetation(0.6),
            )
            .with_memo(DefaultLocationMemo::new(agra())),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.fuse(&agra()).await })
            })
            .collect();

        for handle in handles {
            let record = handle.await.unwrap().unwrap();
            assert!(record.is_complete());
        }
        assert!(engine.memo().unwrap().cached().unwrap().is_complete());
    }
}
