use serde::{Deserialize, Serialize};

/// What kind of answer a query asks for. Every query maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CropRecommendation,
    PricePrediction,
    RotationPlanning,
    LandHealth,
    General,
}

impl Intent {
    pub const ALL: [Intent; 5] = [
        Intent::CropRecommendation,
        Intent::PricePrediction,
        Intent::RotationPlanning,
        Intent::LandHealth,
        Intent::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CropRecommendation => "crop_recommendation",
            Intent::PricePrediction => "price_prediction",
            Intent::RotationPlanning => "rotation_planning",
            Intent::LandHealth => "land_health",
            Intent::General => "general",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
