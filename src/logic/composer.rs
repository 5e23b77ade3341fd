use crate::logic::rules::guidance::{
    display_crop, format_inr, guidance_text, is_hedged, market_display, no_location_text,
    no_readings_text,
};
use crate::logic::rules::price_trend::RANGE_FRACTION;
use crate::models::{
    BarFactor, CardColor, CardData, ChartPoint, CropRecommendation, FusedRecord, Intent,
    LandHealthAssessment, ListItem, Location, MarketSnapshot, PieSegment, PriceForecast,
    PriceObservation, PriceProjection, QueryResponse, RecommendationResult, RegionProfile,
    SeasonalCrop, SoilType, UIInstruction, VegetationClass,
};

/// Reference points drawn next to the measured values on the land-health chart.
const OPTIMAL_NDVI: f64 = 0.6;
const OPTIMAL_MOISTURE_PCT: f64 = 30.0;
const OPTIMAL_TEMPERATURE_C: f64 = 25.0;

const NOT_AVAILABLE: &str = "N/A";

/// Why a query produced no recommendation at all.
#[derive(Debug, Clone, PartialEq)]
pub enum Unanswered {
    /// The text named no place and no coordinates came with it
    NoLocation,
    /// Every provider failed for this location
    NoReadings(Location),
}

/// Builds the transport-ready response for one location. Deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseComposer;

impl ResponseComposer {
    pub fn new() -> Self {
        Self
    }

    pub fn compose(
        &self,
        query: &str,
        intent: Intent,
        fused: &FusedRecord,
        result: &RecommendationResult,
        profile: Option<&RegionProfile>,
    ) -> QueryResponse {
        let ui_instructions = match result {
            RecommendationResult::Crops(crops) => vec![crop_list(crops)],
            RecommendationResult::Price {
                crop,
                history,
                forecast,
                market,
            } => price_cards(crop, history, forecast, market.as_ref()),
            RecommendationResult::Rotation { soil_type, plan } => {
                vec![rotation_list(*soil_type, plan)]
            }
            RecommendationResult::LandHealth(assessment) => land_health_cards(fused, assessment),
            RecommendationResult::General => general_stats(fused),
        };

        let guidance = guidance_text(fused, result, profile);
        if !is_hedged(&guidance, &[fused.region()]) {
            tracing::warn!(region = fused.region(), "Guidance failed the hedged-language check");
        }

        QueryResponse {
            intent,
            query_echo: query.to_string(),
            fused_data: fused.clone(),
            guidance_text: guidance,
            recommendations: result.crops().to_vec(),
            ui_instructions,
        }
    }

    /// A renderable response explaining why nothing could be recommended.
    /// `fused_data` carries only missing-reading markers and no sources.
    pub fn unanswered(&self, query: &str, intent: Intent, reason: &Unanswered) -> QueryResponse {
        let (location, guidance, card) = match reason {
            Unanswered::NoLocation => (
                Location::unresolved(),
                no_location_text(),
                UIInstruction::stat(
                    "Location",
                    "Not found",
                    "Name a city or district, or share coordinates",
                    CardColor::Gray,
                ),
            ),
            Unanswered::NoReadings(location) => (
                location.clone(),
                no_readings_text(&location.name),
                UIInstruction::stat(
                    "Data Unavailable",
                    NOT_AVAILABLE,
                    "No weather, soil or vegetation provider answered",
                    CardColor::Gray,
                ),
            ),
        };

        QueryResponse {
            intent,
            query_echo: query.to_string(),
            fused_data: FusedRecord::empty(location),
            guidance_text: guidance,
            recommendations: Vec::new(),
            ui_instructions: vec![card],
        }
    }
}

fn crop_list(crops: &[CropRecommendation]) -> UIInstruction {
    let items = crops
        .iter()
        .map(|rec| ListItem {
            name: display_crop(&rec.crop_name),
            confidence: Some(rec.confidence),
            season: Some(rec.season.clone()),
            reasoning: Some(rec.reasoning.clone()),
            market: rec.market.as_ref().map(market_display),
        })
        .collect::<Vec<_>>();

    let (value, subtitle) = match crops.first() {
        Some(top) => (
            format!("{} crop{}", crops.len(), if crops.len() == 1 { "" } else { "s" }),
            top.season.clone(),
        ),
        None => ("No match".to_string(), "Not enough data to score crops".to_string()),
    };

    UIInstruction::new(
        "Recommended Crops",
        value,
        subtitle,
        CardColor::Green,
        CardData::List { items },
    )
}

fn price_points(
    history: &[PriceObservation],
    projection: Option<&PriceProjection>,
) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = history
        .iter()
        .map(|o| ChartPoint {
            label: o.period.to_string(),
            value: o.price,
        })
        .collect();
    if let Some(p) = projection {
        points.push(ChartPoint {
            label: format!("{} (proj.)", p.projected_period),
            value: p.projected_price,
        });
    }
    points
}

fn price_cards(
    crop: &str,
    history: &[PriceObservation],
    forecast: &PriceForecast,
    market: Option<&MarketSnapshot>,
) -> Vec<UIInstruction> {
    let title = format!("{} Price Trend", display_crop(crop));
    let unit = "INR/quintal".to_string();

    match forecast {
        PriceForecast::Projected(p) => {
            let value = match history.last() {
                Some(last) => format!(
                    "{} -> {}",
                    format_inr(last.price),
                    format_inr(p.projected_price)
                ),
                None => format_inr(p.projected_price),
            };
            let line = UIInstruction::new(
                title,
                value,
                format!("{:+.1}% projected for {}", p.pct_change, p.projected_period),
                CardColor::Emerald,
                CardData::ChartLine {
                    points: price_points(history, Some(p)),
                    unit,
                },
            );

            let (mut subtitle, color) = if p.overproduction_risk {
                ("Overproduction risk flagged".to_string(), CardColor::Red)
            } else {
                (
                    format!("±{:.0}% around the trend line", RANGE_FRACTION * 100.0),
                    CardColor::Yellow,
                )
            };
            if let Some(msp) = market.and_then(|m| m.msp) {
                subtitle.push_str(&format!("; MSP {}", format_inr(msp)));
            }
            let range = UIInstruction::stat(
                "Projected Range",
                format!("{} - {}", format_inr(p.low), format_inr(p.high)),
                subtitle,
                color,
            );
            vec![line, range]
        }
        PriceForecast::InsufficientHistory { observed } => vec![UIInstruction::new(
            title,
            market.map(market_display).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            format!("{} price observation(s); at least 2 needed", observed),
            CardColor::Gray,
            CardData::ChartLine {
                points: price_points(history, None),
                unit,
            },
        )],
    }
}

fn rotation_list(soil: SoilType, plan: &[SeasonalCrop]) -> UIInstruction {
    let items = plan
        .iter()
        .map(|step| ListItem {
            name: display_crop(&step.crop),
            season: Some(step.season.label().to_string()),
            reasoning: Some(format!("{}: {}", step.role.as_str(), step.note)),
            ..Default::default()
        })
        .collect::<Vec<_>>();

    UIInstruction::new(
        "Rotation Plan",
        format!("{} soil", soil),
        format!("{}-season sequence", plan.len()),
        CardColor::Cyan,
        CardData::List { items },
    )
}

fn land_health_cards(
    fused: &FusedRecord,
    assessment: &LandHealthAssessment,
) -> Vec<UIInstruction> {
    let mut factors = Vec::new();
    if fused.has_ndvi() {
        factors.push(BarFactor {
            name: "NDVI".into(),
            actual: fused.ndvi_avg,
            optimal: OPTIMAL_NDVI,
        });
    }
    if fused.has_soil_moisture() {
        factors.push(BarFactor {
            name: "Soil Moisture (%)".into(),
            actual: fused.soil_moisture_pct,
            optimal: OPTIMAL_MOISTURE_PCT,
        });
    }
    if fused.has_temperature() {
        factors.push(BarFactor {
            name: "Temperature (°C)".into(),
            actual: fused.temperature_avg_c,
            optimal: OPTIMAL_TEMPERATURE_C,
        });
    }

    let color = match assessment.vegetation {
        VegetationClass::Healthy => CardColor::Green,
        VegetationClass::Moderate => CardColor::Yellow,
        VegetationClass::Sparse => CardColor::Red,
        VegetationClass::Unknown => CardColor::Gray,
    };
    let bar = UIInstruction::new(
        "Land Health Factors",
        display_crop(assessment.vegetation.as_str()),
        format!("Soil moisture {}", assessment.moisture.as_str()),
        color,
        CardData::ChartBar { factors },
    );

    let pie = if fused.has_ndvi() {
        let vegetated = (fused.ndvi_avg.clamp(0.0, 1.0) * 100.0).round();
        UIInstruction::new(
            "Vegetation Cover",
            format!("{:.0}%", vegetated),
            "Share of green cover estimated from NDVI",
            CardColor::Emerald,
            CardData::ChartPie {
                segments: vec![
                    PieSegment {
                        name: "Vegetated".into(),
                        value: vegetated,
                    },
                    PieSegment {
                        name: "Bare".into(),
                        value: 100.0 - vegetated,
                    },
                ],
            },
        )
    } else {
        UIInstruction::new(
            "Vegetation Cover",
            NOT_AVAILABLE,
            "No vegetation reading",
            CardColor::Gray,
            CardData::ChartPie { segments: vec![] },
        )
    };

    vec![bar, pie]
}

fn stat_or_missing(
    title: &str,
    available: bool,
    value: String,
    subtitle: &str,
    color: CardColor,
) -> UIInstruction {
    if available {
        UIInstruction::stat(title, value, subtitle, color)
    } else {
        UIInstruction::stat(title, NOT_AVAILABLE, "Provider did not answer", CardColor::Gray)
    }
}

fn general_stats(fused: &FusedRecord) -> Vec<UIInstruction> {
    vec![
        stat_or_missing(
            "Temperature",
            fused.has_temperature(),
            format!("{:.1}°C", fused.temperature_avg_c),
            "7-day mean",
            CardColor::Orange,
        ),
        stat_or_missing(
            "Rainfall",
            fused.has_rainfall(),
            format!("{:.1} mm", fused.rainfall_mm),
            "7-day total",
            CardColor::Blue,
        ),
        stat_or_missing(
            "Soil Moisture",
            fused.has_soil_moisture(),
            format!("{:.1}%", fused.soil_moisture_pct),
            "Topsoil, 0-1 cm",
            CardColor::Cyan,
        ),
        stat_or_missing(
            "NDVI",
            fused.has_ndvi(),
            format!("{:.2}", fused.ndvi_avg),
            "Vegetation index",
            CardColor::Green,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::{crop_suitability, land_health, price_trend, rotation};
    use crate::models::{CardType, Season, SoilReading, VegetationReading, WeatherReading};
    use chrono::NaiveDate;

    fn record() -> FusedRecord {
        FusedRecord::empty(Location::new("Agra, Uttar Pradesh", 27.18, 78.01))
            .with_weather(
                "w",
                WeatherReading {
                    temperature_avg_c: 31.0,
                    rainfall_mm: 40.0,
                },
            )
            .with_soil("s", SoilReading { moisture_pct: 38.0 })
            .with_vegetation("v", VegetationReading { ndvi: 0.62 })
    }

    fn types(response: &QueryResponse) -> Vec<CardType> {
        response.ui_instructions.iter().map(|c| c.card_type()).collect()
    }

    #[test]
    fn price_gets_line_and_range_stat() {
        let history = vec![
            PriceObservation::new(2022, 1200.0),
            PriceObservation::new(2023, 1350.0),
            PriceObservation::new(2024, 1100.0),
        ];
        let result = RecommendationResult::Price {
            crop: "potato".into(),
            forecast: price_trend::price_prediction(&history),
            history,
            market: Some(MarketSnapshot {
                price_min: 800.0,
                price_max: 1400.0,
                msp: None,
                trend: "volatile".into(),
                season: "Rabi".into(),
            }),
        };
        let response = ResponseComposer::new().compose(
            "Potato price trend",
            Intent::PricePrediction,
            &record(),
            &result,
            None,
        );

        assert_eq!(types(&response), vec![CardType::ChartLine, CardType::Stat]);
        let line = &response.ui_instructions[0];
        assert_eq!(line.title, "Potato Price Trend");
        assert_eq!(line.value, "₹1,100 -> ₹1,117");
        match &line.data {
            CardData::ChartLine { points, .. } => {
                assert_eq!(points.len(), 4);
                assert_eq!(points[3].label, "2025 (proj.)");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(response.ui_instructions[1].value, "₹1,027 - ₹1,206");
        assert!(response.recommendations.is_empty());
    }

    #[test]
    fn insufficient_history_degrades_to_single_card() {
        let result = RecommendationResult::Price {
            crop: "millet".into(),
            history: vec![PriceObservation::new(2024, 2625.0)],
            forecast: PriceForecast::InsufficientHistory { observed: 1 },
            market: None,
        };
        let response = ResponseComposer::new().compose(
            "bajra price",
            Intent::PricePrediction,
            &record(),
            &result,
            None,
        );
        assert_eq!(types(&response), vec![CardType::ChartLine]);
        assert_eq!(response.ui_instructions[0].color, CardColor::Gray);
        assert_eq!(response.ui_instructions[0].value, NOT_AVAILABLE);
        assert!(response.guidance_text.contains("not enough price history"));
    }

    #[test]
    fn land_health_gets_bar_and_pie() {
        let fused = record();
        let result = RecommendationResult::LandHealth(land_health::assess(&fused));
        let response = ResponseComposer::new().compose(
            "NDVI for Agra",
            Intent::LandHealth,
            &fused,
            &result,
            None,
        );

        assert_eq!(types(&response), vec![CardType::ChartBar, CardType::ChartPie]);
        match &response.ui_instructions[1].data {
            CardData::ChartPie { segments } => {
                assert_eq!(segments[0].value, 62.0);
                assert_eq!(segments[1].value, 38.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn land_health_bar_skips_missing_signals() {
        let fused = FusedRecord::empty(Location::new("Agra", 27.18, 78.01))
            .with_soil("s", SoilReading { moisture_pct: 12.0 });
        let result = RecommendationResult::LandHealth(land_health::assess(&fused));
        let response =
            ResponseComposer::new().compose("ndvi", Intent::LandHealth, &fused, &result, None);

        match &response.ui_instructions[0].data {
            CardData::ChartBar { factors } => {
                assert_eq!(factors.len(), 1);
                assert_eq!(factors[0].name, "Soil Moisture (%)");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(response.ui_instructions[1].value, NOT_AVAILABLE);
    }

    #[test]
    fn crop_and_rotation_are_lists() {
        let fused = record();
        let today = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
        let composer = ResponseComposer::new();

        let mut scored = crop_suitability::crop_recommendation(&fused, today);
        scored[0].market = Some(MarketSnapshot {
            price_min: 2040.0,
            price_max: 2600.0,
            msp: Some(2203.0),
            trend: "stable".into(),
            season: "Kharif".into(),
        });
        let crops = RecommendationResult::Crops(scored);
        let response =
            composer.compose("best crop", Intent::CropRecommendation, &fused, &crops, None);
        assert_eq!(types(&response), vec![CardType::List]);
        assert_eq!(response.recommendations[0].crop_name, "rice");
        assert_eq!(response.ui_instructions[0].value, "3 crops");
        match &response.ui_instructions[0].data {
            CardData::List { items } => {
                assert_eq!(items[0].market.as_deref(), Some("₹2,040-₹2,600/qtl → (stable)"));
                assert!(items[1].market.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }

        let plan = RecommendationResult::Rotation {
            soil_type: SoilType::Clay,
            plan: rotation::rotation_planning("rice", SoilType::Clay, Season::Kharif),
        };
        let response =
            composer.compose("rotation", Intent::RotationPlanning, &fused, &plan, None);
        assert_eq!(types(&response), vec![CardType::List]);
        assert_eq!(response.ui_instructions[0].value, "Clay soil");
        assert!(response.recommendations.is_empty());
    }

    #[test]
    fn empty_crop_result_still_explains() {
        let fused = FusedRecord::empty(Location::new("Agra", 27.18, 78.01));
        let response = ResponseComposer::new().compose(
            "best crop",
            Intent::CropRecommendation,
            &fused,
            &RecommendationResult::Crops(vec![]),
            None,
        );
        assert!(response.recommendations.is_empty());
        assert_eq!(response.ui_instructions[0].value, "No match");
        assert!(response.guidance_text.contains("None of the crop suitability rules"));
    }

    #[test]
    fn general_has_four_stats_with_gaps_marked() {
        let fused = FusedRecord::empty(Location::new("Agra", 27.18, 78.01))
            .with_vegetation("v", VegetationReading { ndvi: 0.4 });
        let response = ResponseComposer::new().compose(
            "weather",
            Intent::General,
            &fused,
            &RecommendationResult::General,
            None,
        );

        assert_eq!(types(&response), vec![CardType::Stat; 4]);
        let values: Vec<&str> = response.ui_instructions.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["N/A", "N/A", "N/A", "0.40"]);
        assert_eq!(response.ui_instructions[0].color, CardColor::Gray);
    }

    #[test]
    fn composition_is_deterministic() {
        let fused = record();
        let result = RecommendationResult::General;
        let composer = ResponseComposer::new();
        assert_eq!(
            composer.compose("q", Intent::General, &fused, &result, None),
            composer.compose("q", Intent::General, &fused, &result, None)
        );
    }

    #[test]
    fn unanswered_queries_still_render() {
        let composer = ResponseComposer::new();

        let nowhere = composer.unanswered(
            "what should I grow",
            Intent::CropRecommendation,
            &Unanswered::NoLocation,
        );
        assert_eq!(nowhere.fused_data.region(), "Unknown location");
        assert!(nowhere.fused_data.data_sources.is_empty());
        assert!(nowhere.recommendations.is_empty());
        assert!(nowhere.guidance_text.contains("No place could be identified"));
        assert_eq!(types(&nowhere), vec![CardType::Stat]);

        let agra = Location::new("Agra", 27.18, 78.01);
        let down = composer.unanswered(
            "NDVI for Agra",
            Intent::LandHealth,
            &Unanswered::NoReadings(agra.clone()),
        );
        assert_eq!(down.fused_data.location, agra);
        assert!(!down.fused_data.has_ndvi());
        assert!(down.guidance_text.contains("readings for Agra could not be retrieved"));
        assert_eq!(down.ui_instructions[0].title, "Data Unavailable");
    }
}
