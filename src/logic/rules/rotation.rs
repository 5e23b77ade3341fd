use crate::models::{NutrientRole, Season, SeasonalCrop, SoilType};
use Season::{Kharif, Rabi, Zaid};

/// Number of seasons in a rotation plan, the current crop included.
pub const PLAN_SEASONS: usize = 3;

/// Legumes and other crops that return nitrogen to the soil.
const NITROGEN_FIXERS: &[&str] = &[
    "chickpea",
    "lentil",
    "pea",
    "mungbean",
    "cowpea",
    "pigeonpeas",
    "soybean",
    "groundnut",
    "blackgram",
    "mothbeans",
    "berseem",
];

#[derive(Debug, Clone, Copy)]
struct RotationCrop {
    crop: &'static str,
    role: NutrientRole,
    seasons: &'static [Season],
}

const fn depleting(crop: &'static str, seasons: &'static [Season]) -> RotationCrop {
    RotationCrop {
        crop,
        role: NutrientRole::Depleting,
        seasons,
    }
}

const fn fixing(crop: &'static str, seasons: &'static [Season]) -> RotationCrop {
    RotationCrop {
        crop,
        role: NutrientRole::Fixing,
        seasons,
    }
}

const ALLUVIAL: &[RotationCrop] = &[
    depleting("rice", &[Kharif]),
    depleting("wheat", &[Rabi]),
    depleting("maize", &[Kharif, Zaid]),
    depleting("mustard", &[Rabi]),
    fixing("chickpea", &[Rabi]),
    fixing("mungbean", &[Zaid, Kharif]),
    fixing("lentil", &[Rabi]),
];

const CLAY: &[RotationCrop] = &[
    depleting("rice", &[Kharif]),
    depleting("wheat", &[Rabi]),
    depleting("sugarcane", &[Zaid, Kharif]),
    fixing("lentil", &[Rabi]),
    fixing("mungbean", &[Zaid, Kharif]),
    fixing("berseem", &[Rabi]),
];

const LOAM: &[RotationCrop] = &[
    depleting("maize", &[Kharif, Zaid]),
    depleting("wheat", &[Rabi]),
    depleting("potato", &[Rabi]),
    fixing("soybean", &[Kharif]),
    fixing("pea", &[Rabi]),
    fixing("mungbean", &[Zaid]),
];

const SANDY: &[RotationCrop] = &[
    depleting("millet", &[Kharif, Zaid]),
    depleting("mustard", &[Rabi]),
    depleting("barley", &[Rabi]),
    fixing("groundnut", &[Kharif, Zaid]),
    fixing("mothbeans", &[Kharif]),
    fixing("chickpea", &[Rabi]),
];

const BLACK: &[RotationCrop] = &[
    depleting("cotton", &[Kharif]),
    depleting("sorghum", &[Kharif, Rabi]),
    depleting("wheat", &[Rabi]),
    fixing("soybean", &[Kharif]),
    fixing("chickpea", &[Rabi]),
    fixing("mungbean", &[Zaid]),
];

const RED: &[RotationCrop] = &[
    depleting("millet", &[Kharif]),
    depleting("maize", &[Kharif, Rabi]),
    depleting("sorghum", &[Rabi, Zaid]),
    fixing("groundnut", &[Kharif, Zaid]),
    fixing("pigeonpeas", &[Kharif]),
    fixing("cowpea", &[Zaid, Rabi]),
];

const LATERITE: &[RotationCrop] = &[
    depleting("rice", &[Kharif]),
    depleting("maize", &[Rabi, Zaid]),
    depleting("cassava", &[Zaid]),
    fixing("cowpea", &[Rabi, Zaid]),
    fixing("groundnut", &[Kharif]),
    fixing("blackgram", &[Rabi]),
];

fn table_for(soil: SoilType) -> &'static [RotationCrop] {
    match soil {
        SoilType::Alluvial => ALLUVIAL,
        SoilType::Clay => CLAY,
        SoilType::Loam => LOAM,
        SoilType::Sandy => SANDY,
        SoilType::Black => BLACK,
        SoilType::Red => RED,
        SoilType::Laterite => LATERITE,
    }
}

pub fn nutrient_role(crop: &str) -> NutrientRole {
    if NITROGEN_FIXERS.contains(&crop.trim().to_lowercase().as_str()) {
        NutrientRole::Fixing
    } else {
        NutrientRole::Depleting
    }
}

fn note_for(role: NutrientRole) -> &'static str {
    match role {
        NutrientRole::Depleting => "Heavy feeder; likely to draw down soil nitrogen",
        NutrientRole::Fixing => "Legume; may restore nitrogen for the following crop",
    }
}

/// Picks the crop for one slot: right role and season first, then right role only.
fn pick(soil: SoilType, role: NutrientRole, season: Season, used: &[String]) -> &'static str {
    let table = table_for(soil);
    let unused = |c: &&RotationCrop| c.role == role && !used.iter().any(|u| u == c.crop);

    table
        .iter()
        .filter(unused)
        .find(|c| c.seasons.contains(&season))
        .or_else(|| table.iter().find(unused))
        .or_else(|| table.iter().find(|c| c.role == role))
        .map(|c| c.crop)
        .unwrap_or(match role {
            NutrientRole::Depleting => "wheat",
            NutrientRole::Fixing => "chickpea",
        })
}

/// Three-season plan starting with the current crop, alternating nutrient roles.
pub fn rotation_planning(
    current_crop: &str,
    soil: SoilType,
    start_season: Season,
) -> Vec<SeasonalCrop> {
    let current = current_crop.trim().to_lowercase();
    let mut role = nutrient_role(&current);
    let mut season = start_season;

    let mut plan = vec![SeasonalCrop {
        season,
        crop: current.clone(),
        role,
        note: note_for(role).to_string(),
    }];
    let mut used = vec![current];

    while plan.len() < PLAN_SEASONS {
        role = role.opposite();
        season = season.next();
        let crop = pick(soil, role, season, &used).to_string();
        used.push(crop.clone());
        plan.push(SeasonalCrop {
            season,
            crop,
            role,
            note: note_for(role).to_string(),
        });
    }
    plan
}
