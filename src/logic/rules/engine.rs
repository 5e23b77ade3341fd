use super::{crop_suitability, land_health, price_trend, rotation};
use crate::datasources::{MarketBook, RegionCatalog};
use crate::logic::intent::QueryMentions;
use crate::models::{FusedRecord, Intent, RecommendationResult, RegionProfile, Season, SoilType};
use chrono::NaiveDate;
use std::sync::Arc;

/// Crop quoted when neither the query nor the location suggests one.
pub const FALLBACK_PRICE_CROP: &str = "wheat";

/// Soil assumed when neither the query nor the region catalog names one.
pub const FALLBACK_SOIL: SoilType = SoilType::Loam;

fn staple_for(season: Season) -> &'static str {
    match season {
        Season::Kharif => "rice",
        Season::Rabi => "wheat",
        Season::Zaid => "maize",
    }
}

/// Dispatches a fused record to the rule set matching the query intent.
///
/// Holds only read-only reference data; every call is a pure function of
/// its arguments.
#[derive(Clone)]
pub struct RecommendationEngine {
    market: Arc<MarketBook>,
    catalog: Arc<RegionCatalog>,
}

impl RecommendationEngine {
    pub fn new(market: Arc<MarketBook>, catalog: Arc<RegionCatalog>) -> Self {
        Self { market, catalog }
    }

    pub fn run(
        &self,
        intent: Intent,
        fused: &FusedRecord,
        mentions: &QueryMentions,
        today: NaiveDate,
    ) -> RecommendationResult {
        match intent {
            Intent::CropRecommendation => {
                let crops = crop_suitability::crop_recommendation(fused, today)
                    .into_iter()
                    .map(|mut rec| {
                        rec.market = self.market.snapshot(&rec.crop_name);
                        rec
                    })
                    .collect();
                RecommendationResult::Crops(crops)
            }
            Intent::PricePrediction => {
                let crop = self.price_crop(fused, mentions, today);
                let history = self.market.history(&crop);
                let forecast = price_trend::price_prediction(&history);
                RecommendationResult::Price {
                    market: self.market.snapshot(&crop),
                    crop,
                    history,
                    forecast,
                }
            }
            Intent::RotationPlanning => {
                let season = Season::from_date(today);
                let crop = mentions
                    .crop
                    .clone()
                    .or_else(|| top_crop(fused, today))
                    .unwrap_or_else(|| staple_for(season).to_string());
                let soil_type = self.soil_for(fused, mentions);
                RecommendationResult::Rotation {
                    soil_type,
                    plan: rotation::rotation_planning(&crop, soil_type, season),
                }
            }
            Intent::LandHealth => RecommendationResult::LandHealth(land_health::assess(fused)),
            Intent::General => RecommendationResult::General,
        }
    }

    /// Named crop, else the best-scoring crop for the location, else wheat.
    /// Only crops the market book quotes are considered.
    fn price_crop(
        &self,
        fused: &FusedRecord,
        mentions: &QueryMentions,
        today: NaiveDate,
    ) -> String {
        if let Some(crop) = &mentions.crop {
            return crop.clone();
        }
        crop_suitability::crop_recommendation(fused, today)
            .into_iter()
            .map(|rec| rec.crop_name)
            .find(|crop| self.market.get(crop).is_some())
            .unwrap_or_else(|| FALLBACK_PRICE_CROP.to_string())
    }

    fn soil_for(&self, fused: &FusedRecord, mentions: &QueryMentions) -> SoilType {
        mentions
            .soil
            .or_else(|| self.catalog.soil_type_at(fused.location.coordinates()))
            .unwrap_or(FALLBACK_SOIL)
    }

    /// Soil profile of the catalog region at or near the record's location.
    pub fn region_profile(&self, fused: &FusedRecord) -> Option<RegionProfile> {
        self.catalog.profile_at(fused.location.coordinates())
    }

    /// Crop scoring rules as `(id, crop)` pairs.
    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        crop_suitability::CROP_RULES
            .iter()
            .map(|rule| (rule.id, rule.crop))
            .collect()
    }
}

fn top_crop(fused: &FusedRecord, today: NaiveDate) -> Option<String> {
    crop_suitability::crop_recommendation(fused, today)
        .into_iter()
        .next()
        .map(|rec| rec.crop_name)
}
