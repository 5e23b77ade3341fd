use crate::models::{round_to, CropRecommendation, FusedRecord, Season};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Number of crops returned by a recommendation.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// One scoring rule: when `applies` holds for the fused record, `crop` gains `weight`.
///
/// Predicates read the record through its `has_*` guards, so a missing
/// reading never satisfies a threshold.
#[derive(Clone, Copy)]
pub struct CropRule {
    pub id: &'static str,
    pub crop: &'static str,
    pub weight: f64,
    pub reason: &'static str,
    pub applies: fn(&FusedRecord) -> bool,
}

impl std::fmt::Debug for CropRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CropRule")
            .field("id", &self.id)
            .field("crop", &self.crop)
            .field("weight", &self.weight)
            .finish()
    }
}

fn temp_between(r: &FusedRecord, low: f64, high: f64) -> bool {
    r.has_temperature() && (low..=high).contains(&r.temperature_avg_c)
}

fn moisture_between(r: &FusedRecord, low: f64, high: f64) -> bool {
    r.has_soil_moisture() && (low..=high).contains(&r.soil_moisture_pct)
}

fn rain_between(r: &FusedRecord, low: f64, high: f64) -> bool {
    r.has_rainfall() && (low..high).contains(&r.rainfall_mm)
}

fn ndvi_between(r: &FusedRecord, low: f64, high: f64) -> bool {
    r.has_ndvi() && (low..high).contains(&r.ndvi_avg)
}

pub const CROP_RULES: &[CropRule] = &[
    CropRule {
        id: "rice_wet_soil",
        crop: "rice",
        weight: 0.45,
        reason: "soil moisture is high enough to support paddy",
        applies: |r| moisture_between(r, 35.0, 100.0),
    },
    CropRule {
        id: "rice_monsoon_rain",
        crop: "rice",
        weight: 0.35,
        reason: "recent rainfall suits a flooded crop",
        applies: |r| rain_between(r, 50.0, f64::INFINITY),
    },
    CropRule {
        id: "rice_warm",
        crop: "rice",
        weight: 0.25,
        reason: "temperatures sit in the paddy growing range",
        applies: |r| temp_between(r, 22.0, 35.0),
    },
    CropRule {
        id: "wheat_cool",
        crop: "wheat",
        weight: 0.5,
        reason: "cool temperatures favour wheat tillering",
        applies: |r| temp_between(r, 10.0, 25.0),
    },
    CropRule {
        id: "wheat_moderate_moisture",
        crop: "wheat",
        weight: 0.3,
        reason: "moderate soil moisture suits wheat establishment",
        applies: |r| moisture_between(r, 20.0, 35.0),
    },
    CropRule {
        id: "mustard_cool_dry",
        crop: "mustard",
        weight: 0.45,
        reason: "cool and mostly dry weeks suit mustard",
        applies: |r| temp_between(r, 10.0, 25.0) && rain_between(r, 0.0, 20.0),
    },
    CropRule {
        id: "chickpea_dry_soil",
        crop: "chickpea",
        weight: 0.4,
        reason: "chickpea tolerates the drier soil profile",
        applies: |r| moisture_between(r, 0.0, 25.0),
    },
    CropRule {
        id: "chickpea_mild",
        crop: "chickpea",
        weight: 0.3,
        reason: "mild temperatures suit pulse flowering",
        applies: |r| temp_between(r, 15.0, 30.0),
    },
    CropRule {
        id: "millet_heat",
        crop: "millet",
        weight: 0.4,
        reason: "millet copes well with heat",
        applies: |r| temp_between(r, 28.0, 60.0),
    },
    CropRule {
        id: "millet_low_rain",
        crop: "millet",
        weight: 0.35,
        reason: "low rainfall favours a drought-hardy cereal",
        applies: |r| rain_between(r, 0.0, 15.0),
    },
    CropRule {
        id: "millet_sparse_canopy",
        crop: "millet",
        weight: 0.2,
        reason: "sparse vegetation points to marginal land where millet may do better",
        applies: |r| ndvi_between(r, -1.0, 0.3),
    },
    CropRule {
        id: "maize_warm_moist",
        crop: "maize",
        weight: 0.5,
        reason: "warm weather with moderate moisture suits maize",
        applies: |r| temp_between(r, 21.0, 32.0) && moisture_between(r, 25.0, 40.0),
    },
    CropRule {
        id: "sugarcane_hot_wet",
        crop: "sugarcane",
        weight: 0.45,
        reason: "heat and moist soil support cane growth",
        applies: |r| temp_between(r, 25.0, 60.0) && moisture_between(r, 30.0, 100.0),
    },
    CropRule {
        id: "sugarcane_dense_canopy",
        crop: "sugarcane",
        weight: 0.2,
        reason: "a dense canopy suggests fertile ground for a long-duration crop",
        applies: |r| ndvi_between(r, 0.5, 1.01),
    },
    CropRule {
        id: "cotton_hot_dry",
        crop: "cotton",
        weight: 0.4,
        reason: "hot, relatively dry conditions suit cotton bolls",
        applies: |r| temp_between(r, 25.0, 60.0) && rain_between(r, 0.0, 30.0),
    },
    CropRule {
        id: "potato_cool",
        crop: "potato",
        weight: 0.45,
        reason: "cool temperatures favour tuber formation",
        applies: |r| temp_between(r, 12.0, 22.0),
    },
];

/// Scores every crop against the record and returns the best few.
///
/// Contributions per crop are summed and capped at 1.0. Ties break by name.
pub fn crop_recommendation(fused: &FusedRecord, today: NaiveDate) -> Vec<CropRecommendation> {
    let season = Season::from_date(today).label();

    let mut scores: BTreeMap<&'static str, (f64, Vec<&'static str>)> = BTreeMap::new();
    for rule in CROP_RULES.iter().filter(|rule| (rule.applies)(fused)) {
        let entry = scores.entry(rule.crop).or_insert((0.0, Vec::new()));
        entry.0 += rule.weight;
        entry.1.push(rule.reason);
    }

    let mut recommendations: Vec<CropRecommendation> = scores
        .into_iter()
        .map(|(crop, (score, reasons))| CropRecommendation {
            crop_name: crop.to_string(),
            confidence: round_to(score.clamp(0.0, 1.0), 2),
            reasoning: capitalize(&reasons.join("; ")),
            season: season.to_string(),
            market: None,
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.crop_name.cmp(&b.crop_name))
    });
    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
