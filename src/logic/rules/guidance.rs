//! Plain-language guidance for each result family.
//!
//! Every sentence is hedged. The words in [`FORBIDDEN_WORDS`] overstate
//! certainty and never appear in generated text.

use super::land_health::{MOISTURE_DRY_BELOW, MOISTURE_WATERLOGGED_ABOVE};
use crate::models::{
    CropRecommendation, FusedRecord, LandHealthAssessment, MarketSnapshot, MoistureStatus,
    PriceForecast, PriceObservation, RecommendationResult, RegionProfile, SeasonalCrop, SoilType,
    VegetationClass,
};

pub const FORBIDDEN_WORDS: &[&str] = &["must", "will", "guaranteed"];

/// True when any forbidden word appears as a whole word, in any case.
pub fn contains_forbidden_language(text: &str) -> bool {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| FORBIDDEN_WORDS.contains(&word))
}

/// Lint over generated text that skips proper names such as "Will County".
/// Place names come from geocoders and are quoted as given.
pub fn is_hedged(text: &str, proper_names: &[&str]) -> bool {
    let mut remainder = text.to_string();
    for name in proper_names.iter().filter(|n| !n.is_empty()) {
        remainder = remainder.replace(name, " ");
    }
    !contains_forbidden_language(&remainder)
}

/// "pigeonpeas" -> "Pigeonpeas"
pub fn display_crop(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whole rupees grouped in thousands: `₹1,117`.
pub fn format_inr(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-₹{}", grouped)
    } else {
        format!("₹{}", grouped)
    }
}

/// `₹2,125-₹2,800/qtl ↑ (rising)`
pub fn market_display(market: &MarketSnapshot) -> String {
    format!(
        "{}-{}/qtl {} ({})",
        format_inr(market.price_min),
        format_inr(market.price_max),
        market.trend_arrow(),
        market.trend
    )
}

fn market_sentence(crop: &str, market: &MarketSnapshot) -> String {
    let mut text = format!(
        " Recent mandi prices for {} have run {} to {} per quintal ({})",
        crop,
        format_inr(market.price_min),
        format_inr(market.price_max),
        market.trend
    );
    if let Some(msp) = market.msp {
        text.push_str(&format!(", against a minimum support price of {}", format_inr(msp)));
    }
    text.push('.');
    text
}

fn profile_sentence(profile: &RegionProfile) -> String {
    format!(
        " Soils around {} are typically {} with a {} texture and a pH near {:.1}.",
        profile.region,
        profile.soil_type.to_lowercase(),
        profile.texture.to_lowercase(),
        profile.ph
    )
}

fn missing_signals(fused: &FusedRecord) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if !fused.has_temperature() {
        missing.push("weather");
    }
    if !fused.has_soil_moisture() {
        missing.push("soil moisture");
    }
    if !fused.has_ndvi() {
        missing.push("vegetation (NDVI)");
    }
    missing
}

fn coverage_note(fused: &FusedRecord) -> Option<String> {
    let missing = missing_signals(fused);
    if missing.is_empty() {
        None
    } else {
        Some(format!(
            "Readings for {} were unavailable, so this picture may be incomplete.",
            missing.join(" and ")
        ))
    }
}

fn common_crops_sentence(profile: &RegionProfile) -> Option<String> {
    if profile.common_crops.is_empty() {
        return None;
    }
    let crops: Vec<String> = profile.common_crops.iter().map(|c| display_crop(c)).collect();
    Some(format!(
        " Farms around {} commonly grow {}.",
        profile.region,
        crops.join(", ")
    ))
}

fn crops_text(
    fused: &FusedRecord,
    crops: &[CropRecommendation],
    profile: Option<&RegionProfile>,
) -> String {
    let Some(top) = crops.first() else {
        let mut text = format!(
            "None of the crop suitability rules matched the available readings for {}. \
             More complete weather, soil and vegetation data could help narrow the choice.",
            fused.region()
        );
        if let Some(sentence) = profile.and_then(common_crops_sentence) {
            text.push_str(&sentence);
        }
        return text;
    };

    let mut text = format!(
        "Based on current conditions in {}, {} looks like the strongest fit ({:.0}% confidence)",
        fused.region(),
        display_crop(&top.crop_name),
        top.confidence * 100.0
    );
    let others: Vec<String> = crops[1..].iter().map(|c| display_crop(&c.crop_name)).collect();
    if !others.is_empty() {
        text.push_str(&format!(", followed by {}", others.join(" and ")));
    }
    text.push_str(&format!(
        ". These suggestions apply to the {} season and may shift as conditions change.",
        top.season
    ));
    if let Some(market) = &top.market {
        text.push_str(&market_sentence(&display_crop(&top.crop_name), market));
    }
    if let Some(sentence) = profile.and_then(common_crops_sentence) {
        text.push_str(&sentence);
    }
    text
}

fn price_text(
    crop: &str,
    history: &[PriceObservation],
    forecast: &PriceForecast,
    market: Option<&MarketSnapshot>,
) -> String {
    let crop = display_crop(crop);
    let market_note = market
        .map(|m| market_sentence(&crop, m))
        .unwrap_or_default();
    match forecast {
        PriceForecast::InsufficientHistory { observed } => format!(
            "There is not enough price history for {} to estimate a trend \
             ({} observation{} available; at least 2 are needed).{}",
            crop,
            observed,
            if *observed == 1 { "" } else { "s" },
            market_note
        ),
        PriceForecast::Projected(p) => {
            let last = history.iter().max_by_key(|o| o.period).map(|o| o.price);
            let mut text = match last {
                Some(last) => format!(
                    "{} prices could move from {} to around {} per quintal in {} ({:+.1}%), \
                     likely within {} to {}.",
                    crop,
                    format_inr(last),
                    format_inr(p.projected_price),
                    p.projected_period,
                    p.pct_change,
                    format_inr(p.low),
                    format_inr(p.high)
                ),
                None => format!(
                    "{} prices could be around {} per quintal in {}.",
                    crop,
                    format_inr(p.projected_price),
                    p.projected_period
                ),
            };
            if p.overproduction_risk {
                text.push_str(
                    " Recent production is well above its three-period average, \
                     which might weigh on prices.",
                );
            }
            text.push_str(&market_note);
            text.push_str(" This is a simple trend line, not a market guarantee.");
            text
        }
    }
}

fn rotation_text(soil: SoilType, plan: &[SeasonalCrop]) -> String {
    let steps: Vec<String> = plan
        .iter()
        .map(|s| format!("{} ({})", display_crop(&s.crop), s.season))
        .collect();
    format!(
        "For {} soil, one possible sequence is {}. Alternating nutrient-depleting and \
         nitrogen-fixing crops may help keep the soil balanced.",
        soil.as_str().to_lowercase(),
        steps.join(" -> ")
    )
}

fn land_health_text(
    fused: &FusedRecord,
    assessment: &LandHealthAssessment,
    profile: Option<&RegionProfile>,
) -> String {
    let vegetation = match assessment.vegetation {
        VegetationClass::Unknown => "Vegetation data was unavailable".to_string(),
        class => format!(
            "Vegetation in {} appears {} (NDVI {:.2})",
            fused.region(),
            class.as_str(),
            fused.ndvi_avg
        ),
    };
    let moisture = match assessment.moisture {
        MoistureStatus::Unknown => "soil moisture could not be read".to_string(),
        status => format!(
            "soil moisture looks {} at {:.1}%",
            status.as_str(),
            fused.soil_moisture_pct
        ),
    };

    let advice = match (assessment.vegetation, assessment.moisture) {
        (_, MoistureStatus::Dry) => format!(
            " Moisture below {:.0}% suggests irrigation could help.",
            MOISTURE_DRY_BELOW
        ),
        (_, MoistureStatus::Waterlogged) => format!(
            " Moisture above {:.0}% may point to poor drainage.",
            MOISTURE_WATERLOGGED_ABOVE
        ),
        (VegetationClass::Sparse, _) => {
            " Sparse cover might indicate fallow land or crop stress worth checking.".to_string()
        }
        _ => String::new(),
    };

    let soil = profile.map(profile_sentence).unwrap_or_default();
    format!("{}, and {}.{}{}", vegetation, moisture, advice, soil)
}

fn reading(value: f64, available: bool, unit: &str, decimals: usize) -> String {
    if available {
        format!("{:.*}{}", decimals, value, unit)
    } else {
        "unavailable".to_string()
    }
}

fn general_text(fused: &FusedRecord, profile: Option<&RegionProfile>) -> String {
    format!(
        "Current conditions for {}: average temperature {}, rainfall {} over the past week, \
         soil moisture {}, NDVI {}.{}",
        fused.region(),
        reading(fused.temperature_avg_c, fused.has_temperature(), "°C", 1),
        reading(fused.rainfall_mm, fused.has_rainfall(), " mm", 1),
        reading(fused.soil_moisture_pct, fused.has_soil_moisture(), "%", 1),
        reading(fused.ndvi_avg, fused.has_ndvi(), "", 2),
        profile.map(profile_sentence).unwrap_or_default(),
    )
}

/// Explanation for a query that named no place and carried no coordinates.
pub fn no_location_text() -> String {
    "No place could be identified in this question, so local conditions could not be \
     looked up. Consider naming a city or district, or sharing coordinates."
        .to_string()
}

/// Explanation for a location where no provider answered.
pub fn no_readings_text(region: &str) -> String {
    format!(
        "Weather, soil and vegetation readings for {} could not be retrieved right now, \
         so no recommendation can be offered. Trying again shortly may help.",
        region
    )
}

/// Guidance paragraph for a result, followed by a note on any missing readings.
pub fn guidance_text(
    fused: &FusedRecord,
    result: &RecommendationResult,
    profile: Option<&RegionProfile>,
) -> String {
    let body = match result {
        RecommendationResult::Crops(crops) => crops_text(fused, crops, profile),
        RecommendationResult::Price {
            crop,
            history,
            forecast,
            market,
        } => price_text(crop, history, forecast, market.as_ref()),
        RecommendationResult::Rotation { soil_type, plan } => rotation_text(*soil_type, plan),
        RecommendationResult::LandHealth(assessment) => {
            land_health_text(fused, assessment, profile)
        }
        RecommendationResult::General => general_text(fused, profile),
    };

    match coverage_note(fused) {
        Some(note) => format!("{} {}", body, note),
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::{crop_suitability, land_health, price_trend, rotation};
    use crate::models::{
        Location, PriceObservation, Season, SoilReading, VegetationReading, WeatherReading,
    };
    use chrono::NaiveDate;

    fn potato_market() -> MarketSnapshot {
        MarketSnapshot {
            price_min: 800.0,
            price_max: 1400.0,
            msp: Some(1000.0),
            trend: "volatile".into(),
            season: "Rabi".into(),
        }
    }

    fn agra_profile() -> RegionProfile {
        RegionProfile {
            region: "Agra, Uttar Pradesh".into(),
            soil_type: "Alluvial".into(),
            texture: "Sandy Loam".into(),
            ph: 8.0,
            common_crops: vec!["potato".into(), "wheat".into(), "mustard".into()],
        }
    }

    fn full_record() -> FusedRecord {
        FusedRecord::empty(Location::new("Agra, Uttar Pradesh", 27.18, 78.01))
            .with_weather(
                "w",
                WeatherReading {
                    temperature_avg_c: 31.0,
                    rainfall_mm: 40.0,
                },
            )
            .with_soil("s", SoilReading { moisture_pct: 12.0 })
            .with_vegetation("v", VegetationReading { ndvi: 0.22 })
    }

    #[test]
    fn forbidden_words_match_whole_words_only() {
        assert!(contains_forbidden_language("Prices WILL rise"));
        assert!(contains_forbidden_language("a guaranteed yield"));
        assert!(contains_forbidden_language("you must irrigate"));
        assert!(!contains_forbidden_language("willow and mustard"));
        assert!(!contains_forbidden_language("prices may rise"));
    }

    #[test]
    fn inr_grouping() {
        assert_eq!(format_inr(1116.67), "₹1,117");
        assert_eq!(format_inr(950.0), "₹950");
        assert_eq!(format_inr(1234567.0), "₹1,234,567");
        assert_eq!(format_inr(0.0), "₹0");
    }

    #[test]
    fn missing_readings_are_called_out() {
        let partial = FusedRecord::empty(Location::new("Agra", 27.18, 78.01))
            .with_soil("s", SoilReading { moisture_pct: 30.0 });
        let text = guidance_text(&partial, &RecommendationResult::General, None);
        assert!(text.contains("temperature unavailable"));
        assert!(text.contains("weather and vegetation (NDVI) were unavailable"));
    }

    #[test]
    fn generated_text_is_hedged_for_every_result_family() {
        let fused = full_record();
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let history = vec![
            PriceObservation::new(2022, 1200.0),
            PriceObservation::new(2023, 1350.0),
            PriceObservation::new(2024, 1100.0).with_production(900.0),
        ];

        let results = vec![
            RecommendationResult::Crops(crop_suitability::crop_recommendation(&fused, today)),
            RecommendationResult::Crops(Vec::new()),
            RecommendationResult::Price {
                crop: "potato".into(),
                forecast: price_trend::price_prediction(&history),
                history: history.clone(),
                market: Some(potato_market()),
            },
            RecommendationResult::Price {
                crop: "millet".into(),
                history: vec![],
                forecast: price_trend::price_prediction(&[]),
                market: None,
            },
            RecommendationResult::Rotation {
                soil_type: SoilType::Clay,
                plan: rotation::rotation_planning("rice", SoilType::Clay, Season::Kharif),
            },
            RecommendationResult::LandHealth(land_health::assess(&fused)),
            RecommendationResult::General,
        ];

        for result in &results {
            for profile in [None, Some(&agra_profile())] {
                let text = guidance_text(&fused, result, profile);
                assert!(!text.is_empty());
                assert!(!contains_forbidden_language(&text), "unhedged: {}", text);
            }
        }
        assert!(!contains_forbidden_language(&no_location_text()));
        assert!(!contains_forbidden_language(&no_readings_text("Agra")));

        for crop in crop_suitability::crop_recommendation(&fused, today) {
            assert!(!contains_forbidden_language(&crop.reasoning));
        }
        for rule in crop_suitability::CROP_RULES {
            assert!(!contains_forbidden_language(rule.reason), "rule {}", rule.id);
        }
    }

    #[test]
    fn price_text_mentions_range() {
        let history = vec![
            PriceObservation::new(2022, 1200.0),
            PriceObservation::new(2023, 1350.0),
            PriceObservation::new(2024, 1100.0),
        ];
        let forecast = price_trend::price_prediction(&history);
        let text = price_text("potato", &history, &forecast, Some(&potato_market()));
        assert!(text.starts_with("Potato prices could move from ₹1,100 to around ₹1,117"));
        assert!(text.contains("2025"));
        assert!(text.contains("+1.5%"));
        assert!(text.contains("minimum support price of ₹1,000"));
    }

    #[test]
    fn top_crop_gets_market_and_regional_context() {
        let fused = full_record();
        let rice = CropRecommendation {
            crop_name: "rice".into(),
            confidence: 0.7,
            reasoning: "High soil moisture suits paddy".into(),
            season: "Kharif (Jun-Oct)".into(),
            market: Some(MarketSnapshot {
                price_min: 2040.0,
                price_max: 2600.0,
                msp: Some(2203.0),
                trend: "stable".into(),
                season: "Kharif".into(),
            }),
        };
        let text = crops_text(&fused, &[rice], Some(&agra_profile()));
        assert!(text.contains("Rice have run ₹2,040 to ₹2,600 per quintal (stable)"));
        assert!(text.contains("minimum support price of ₹2,203"));
        assert!(text.contains("commonly grow Potato, Wheat, Mustard"));

        let none = crops_text(&fused, &[], Some(&agra_profile()));
        assert!(none.contains("commonly grow Potato"));
    }

    #[test]
    fn market_display_shows_range_and_trend() {
        assert_eq!(market_display(&potato_market()), "₹800-₹1,400/qtl ↕ (volatile)");
    }

    #[test]
    fn soil_profile_sentence_for_general_and_land_health() {
        let fused = full_record();
        let general = guidance_text(&fused, &RecommendationResult::General, Some(&agra_profile()));
        assert!(general.contains("typically alluvial with a sandy loam texture and a pH near 8.0"));
        let land = land_health_text(&fused, &land_health::assess(&fused), Some(&agra_profile()));
        assert!(land.contains("pH near 8.0"));
    }

    #[test]
    fn place_names_are_exempt_from_the_lint() {
        let fused = FusedRecord::empty(Location::new("Will County, Illinois", 41.45, -87.98));
        let text = guidance_text(&fused, &RecommendationResult::General, None);
        assert!(contains_forbidden_language(&text));
        assert!(is_hedged(&text, &[fused.region()]));
        assert!(!is_hedged("Prices will rise in Will County", &["Will County"]));
    }

    #[test]
    fn dry_land_gets_irrigation_hint() {
        let fused = full_record();
        let text = land_health_text(&fused, &land_health::assess(&fused), None);
        assert!(text.contains("appears sparse"));
        assert!(text.contains("irrigation could help"));
    }
}
