use super::fused::FusedRecord;
use super::intent::Intent;
use super::location::Coordinates;
use super::recommendation::CropRecommendation;
use super::ui::UIInstruction;
use crate::error::{AgroFusionError, Result};
use serde::{Deserialize, Serialize};

pub const MAX_QUERY_CHARS: usize = 500;

/// Incoming query as received at the HTTP or CLI boundary.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// A request that passed boundary validation and may enter the core.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuery {
    pub text: String,
    pub hint: Option<Coordinates>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            lat: None,
            lon: None,
        }
    }

    pub fn with_coordinates(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    pub fn validate(&self) -> Result<ValidatedQuery> {
        if self.query.trim().is_empty() {
            return Err(AgroFusionError::Validation("query is empty".into()));
        }
        let length = self.query.chars().count();
        if length > MAX_QUERY_CHARS {
            return Err(AgroFusionError::Validation(format!(
                "query is {} characters; the limit is {}",
                length, MAX_QUERY_CHARS
            )));
        }

        let hint = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon).validate()?),
            (None, None) => None,
            _ => {
                return Err(AgroFusionError::Validation(
                    "lat and lon have to be supplied together".into(),
                ))
            }
        };

        Ok(ValidatedQuery {
            text: self.query.clone(),
            hint,
        })
    }
}

/// One answer for one resolved location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub intent: Intent,
    pub query_echo: String,
    pub fused_data: FusedRecord,
    pub guidance_text: String,
    pub recommendations: Vec<CropRecommendation>,
    pub ui_instructions: Vec<UIInstruction>,
}
