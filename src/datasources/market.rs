use crate::error::{AgroFusionError, Result};
use crate::models::{MarketSnapshot, PriceObservation};
use serde::Deserialize;

const MARKET_JSON: &str = include_str!("../../data/market.json");

/// Mandi price facts for one crop. Prices are INR per quintal.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketEntry {
    pub crop: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub price_min: f64,
    pub price_max: f64,
    #[serde(default)]
    pub msp: Option<f64>,
    pub trend: String,
    pub season: String,
    #[serde(default)]
    pub history: Vec<PriceObservation>,
}

impl MarketEntry {
    fn answers_to(&self, word: &str) -> bool {
        self.crop == word || self.aliases.iter().any(|a| a == word)
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            price_min: self.price_min,
            price_max: self.price_max,
            msp: self.msp,
            trend: self.trend.clone(),
            season: self.season.clone(),
        }
    }
}

/// In-memory market dataset, read-only after load.
#[derive(Debug, Clone)]
pub struct MarketBook {
    entries: Vec<MarketEntry>,
}

impl MarketBook {
    pub fn embedded() -> Result<Self> {
        Self::from_json(MARKET_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut entries: Vec<MarketEntry> = serde_json::from_str(json)?;
        for entry in &mut entries {
            entry.crop = entry.crop.to_lowercase();
            entry.aliases.iter_mut().for_each(|a| *a = a.to_lowercase());
            entry.history.sort_by_key(|o| o.period);
        }
        if entries.is_empty() {
            return Err(AgroFusionError::InvalidData("market book is empty".into()));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[MarketEntry] {
        &self.entries
    }

    /// Case-insensitive lookup by crop name or alias.
    pub fn get(&self, crop: &str) -> Option<&MarketEntry> {
        let wanted = crop.trim().to_lowercase();
        self.entries.iter().find(|e| e.answers_to(&wanted))
    }

    pub fn snapshot(&self, crop: &str) -> Option<MarketSnapshot> {
        self.get(crop).map(MarketEntry::snapshot)
    }

    /// Price history ordered by period; empty for unknown crops.
    pub fn history(&self, crop: &str) -> Vec<PriceObservation> {
        self.get(crop).map(|e| e.history.clone()).unwrap_or_default()
    }
}
