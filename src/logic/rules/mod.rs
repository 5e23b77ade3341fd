pub mod crop_suitability;
pub mod engine;
pub mod guidance;
pub mod land_health;
pub mod price_trend;
pub mod rotation;

pub use crop_suitability::{crop_recommendation, CropRule, CROP_RULES};
pub use engine::RecommendationEngine;
pub use price_trend::price_prediction;
pub use rotation::rotation_planning;
