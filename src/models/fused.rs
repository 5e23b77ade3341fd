use super::location::Location;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Marker stored in a fused field whose provider did not answer.
/// Chosen far outside every physical range the fields can take.
pub const MISSING_READING: f64 = -9999.0;

pub fn is_available(value: f64) -> bool {
    value.is_finite() && value > MISSING_READING
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_avg_c: f64,
    pub rainfall_mm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilReading {
    pub moisture_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VegetationReading {
    pub ndvi: f64,
}

/// Weather, soil and vegetation readings for one location, merged once per query.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedRecord {
    pub location: Location,
    pub temperature_avg_c: f64,
    pub rainfall_mm: f64,
    pub soil_moisture_pct: f64,
    pub ndvi_avg: f64,
    /// Providers that answered, in the order they were queried
    pub data_sources: Vec<String>,
}

impl FusedRecord {
    /// A record with every signal missing; fields are filled as providers answer.
    pub fn empty(location: Location) -> Self {
        Self {
            location,
            temperature_avg_c: MISSING_READING,
            rainfall_mm: MISSING_READING,
            soil_moisture_pct: MISSING_READING,
            ndvi_avg: MISSING_READING,
            data_sources: Vec::new(),
        }
    }

    pub fn with_weather(mut self, source: &str, reading: WeatherReading) -> Self {
        self.temperature_avg_c = round_to(reading.temperature_avg_c, 1);
        self.rainfall_mm = round_to(reading.rainfall_mm.max(0.0), 1);
        self.push_source(source);
        self
    }

    pub fn with_soil(mut self, source: &str, reading: SoilReading) -> Self {
        self.soil_moisture_pct = round_to(reading.moisture_pct.clamp(0.0, 100.0), 1);
        self.push_source(source);
        self
    }

    pub fn with_vegetation(mut self, source: &str, reading: VegetationReading) -> Self {
        self.ndvi_avg = round_to(reading.ndvi.clamp(-1.0, 1.0), 3);
        self.push_source(source);
        self
    }

    fn push_source(&mut self, source: &str) {
        if !self.data_sources.iter().any(|s| s == source) {
            self.data_sources.push(source.to_string());
        }
    }

    pub fn region(&self) -> &str {
        &self.location.name
    }

    pub fn has_temperature(&self) -> bool {
        is_available(self.temperature_avg_c)
    }

    pub fn has_rainfall(&self) -> bool {
        is_available(self.rainfall_mm)
    }

    pub fn has_soil_moisture(&self) -> bool {
        is_available(self.soil_moisture_pct)
    }

    pub fn has_ndvi(&self) -> bool {
        is_available(self.ndvi_avg)
    }

    pub fn is_complete(&self) -> bool {
        self.has_temperature() && self.has_soil_moisture() && self.has_ndvi()
    }
}

// Wire shape flattens the location into `region`, `lat`, `lon`.
impl Serialize for FusedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FusedRecord", 8)?;
        state.serialize_field("region", &self.location.name)?;
        state.serialize_field("lat", &self.location.lat)?;
        state.serialize_field("lon", &self.location.lon)?;
        state.serialize_field("temperature_avg_c", &self.temperature_avg_c)?;
        state.serialize_field("rainfall_mm", &self.rainfall_mm)?;
        state.serialize_field("soil_moisture_pct", &self.soil_moisture_pct)?;
        state.serialize_field("ndvi_avg", &self.ndvi_avg)?;
        state.serialize_field("data_sources", &self.data_sources)?;
        state.end()
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
