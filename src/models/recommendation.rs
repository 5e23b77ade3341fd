use super::soil::SoilType;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Indian cropping seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Rabi,
    Kharif,
    Zaid,
}

impl Season {
    /// Rabi Nov-Mar, Kharif Jun-Oct, Zaid Apr-May.
    pub fn from_month(month: u32) -> Self {
        match month {
            11 | 12 | 1 | 2 | 3 => Season::Rabi,
            6..=10 => Season::Kharif,
            _ => Season::Zaid,
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_month(date.month())
    }

    pub fn next(&self) -> Self {
        match self {
            Season::Kharif => Season::Rabi,
            Season::Rabi => Season::Zaid,
            Season::Zaid => Season::Kharif,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Rabi => "Rabi",
            Season::Kharif => "Kharif",
            Season::Zaid => "Zaid",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Season::Rabi => "Rabi (Nov-Mar)",
            Season::Kharif => "Kharif (Jun-Oct)",
            Season::Zaid => "Zaid (Apr-May)",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub crop_name: String,
    pub confidence: f64,
    pub reasoning: String,
    pub season: String,
    /// Mandi facts for the crop, when the market book quotes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketSnapshot>,
}

/// Recent mandi prices for one crop. INR per quintal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price_min: f64,
    pub price_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msp: Option<f64>,
    pub trend: String,
    pub season: String,
}

impl MarketSnapshot {
    pub fn trend_arrow(&self) -> &'static str {
        match self.trend.as_str() {
            "rising" => "↑",
            "falling" => "↓",
            "volatile" => "↕",
            "seasonal" => "~",
            _ => "→",
        }
    }
}

/// Typical soil of the catalog region around a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub region: String,
    pub soil_type: String,
    pub texture: String,
    pub ph: f64,
    pub common_crops: Vec<String>,
}

/// Whether a crop draws nitrogen out of the soil or puts it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientRole {
    Depleting,
    Fixing,
}

impl NutrientRole {
    pub fn opposite(&self) -> Self {
        match self {
            NutrientRole::Depleting => NutrientRole::Fixing,
            NutrientRole::Fixing => NutrientRole::Depleting,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientRole::Depleting => "nutrient-depleting",
            NutrientRole::Fixing => "nitrogen-fixing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalCrop {
    pub season: Season,
    pub crop: String,
    pub role: NutrientRole,
    pub note: String,
}

/// One point of a market series. `period` is a year or other ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub period: i32,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production: Option<f64>,
}

impl PriceObservation {
    pub fn new(period: i32, price: f64) -> Self {
        Self {
            period,
            price,
            production: None,
        }
    }

    pub fn with_production(mut self, production: f64) -> Self {
        self.production = Some(production);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceProjection {
    pub projected_period: i32,
    pub projected_price: f64,
    pub low: f64,
    pub high: f64,
    pub pct_change: f64,
    pub overproduction_risk: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PriceForecast {
    Projected(PriceProjection),
    InsufficientHistory { observed: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VegetationClass {
    Sparse,
    Moderate,
    Healthy,
    Unknown,
}

impl VegetationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            VegetationClass::Sparse => "sparse",
            VegetationClass::Moderate => "moderate",
            VegetationClass::Healthy => "healthy",
            VegetationClass::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoistureStatus {
    Dry,
    Adequate,
    Waterlogged,
    Unknown,
}

impl MoistureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoistureStatus::Dry => "dry",
            MoistureStatus::Adequate => "adequate",
            MoistureStatus::Waterlogged => "waterlogged",
            MoistureStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandHealthAssessment {
    pub vegetation: VegetationClass,
    pub moisture: MoistureStatus,
}

/// Typed output of the recommendation step, one variant per intent family.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationResult {
    Crops(Vec<CropRecommendation>),
    Price {
        crop: String,
        history: Vec<PriceObservation>,
        forecast: PriceForecast,
        market: Option<MarketSnapshot>,
    },
    Rotation {
        soil_type: SoilType,
        plan: Vec<SeasonalCrop>,
    },
    LandHealth(LandHealthAssessment),
    General,
}

impl RecommendationResult {
    pub fn crops(&self) -> &[CropRecommendation] {
        match self {
            RecommendationResult::Crops(crops) => crops,
            _ => &[],
        }
    }
}
