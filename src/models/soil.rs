use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilType {
    Clay,
    Loam,
    Sandy,
    Alluvial,
    Black,
    Red,
    Laterite,
}

impl SoilType {
    pub const ALL: [SoilType; 7] = [
        SoilType::Clay,
        SoilType::Loam,
        SoilType::Sandy,
        SoilType::Alluvial,
        SoilType::Black,
        SoilType::Red,
        SoilType::Laterite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Clay => "Clay",
            SoilType::Loam => "Loam",
            SoilType::Sandy => "Sandy",
            SoilType::Alluvial => "Alluvial",
            SoilType::Black => "Black",
            SoilType::Red => "Red",
            SoilType::Laterite => "Laterite",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "clay" | "clayey" | "clay loam" => Some(SoilType::Clay),
            "loam" | "loamy" | "silt loam" => Some(SoilType::Loam),
            "sandy" | "sand" | "sandy loam" | "desert" => Some(SoilType::Sandy),
            "alluvial" => Some(SoilType::Alluvial),
            "black" | "black cotton" | "regur" => Some(SoilType::Black),
            "red" | "red loam" => Some(SoilType::Red),
            "laterite" | "lateritic" => Some(SoilType::Laterite),
            _ => None,
        }
    }

    /// Finds the first soil word mentioned in free text.
    pub fn find_in(text: &str) -> Option<Self> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .find_map(Self::from_str)
    }
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
