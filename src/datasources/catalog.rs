use super::Geocoder;
use crate::error::{AgroFusionError, Result};
use crate::logic::calculations::haversine_km;
use crate::models::{Coordinates, Location, RegionProfile, SoilType};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

const REGIONS_JSON: &str = include_str!("../../data/regions.json");

/// Points further than this from every catalog centre are not "near" anything.
pub const NEAREST_MATCH_KM: f64 = 150.0;

#[derive(Debug, Clone, Deserialize)]
pub struct RegionRecord {
    pub city: String,
    pub state: String,
    pub lat_range: [f64; 2],
    pub lon_range: [f64; 2],
    pub soil_type: String,
    pub texture: String,
    pub ph: f64,
    #[serde(default)]
    pub recommended_crops: Vec<String>,
}

impl RegionRecord {
    pub fn label(&self) -> String {
        format!("{}, {}", self.city, self.state)
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            (self.lat_range[0] + self.lat_range[1]) / 2.0,
            (self.lon_range[0] + self.lon_range[1]) / 2.0,
        )
    }

    pub fn contains(&self, coords: Coordinates) -> bool {
        (self.lat_range[0]..=self.lat_range[1]).contains(&coords.lat)
            && (self.lon_range[0]..=self.lon_range[1]).contains(&coords.lon)
    }

    pub fn soil(&self) -> Option<SoilType> {
        SoilType::from_str(&self.soil_type)
    }

    pub fn profile(&self) -> RegionProfile {
        RegionProfile {
            region: self.label(),
            soil_type: self.soil_type.clone(),
            texture: self.texture.clone(),
            ph: self.ph,
            common_crops: self.recommended_crops.clone(),
        }
    }

    fn location(&self) -> Location {
        let center = self.center();
        Location::new(self.label(), center.lat, center.lon)
    }
}

/// Offline gazetteer of farming regions with their soil profile.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: Vec<RegionRecord>,
}

/// Lowercase words separated by single spaces, padded so whole-word
/// containment is a plain substring test.
fn normalize(text: &str) -> String {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    format!(" {} ", words.join(" "))
}

impl RegionCatalog {
    pub fn embedded() -> Result<Self> {
        Self::from_json(REGIONS_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let regions: Vec<RegionRecord> = serde_json::from_str(json)?;
        if regions.is_empty() {
            return Err(AgroFusionError::InvalidData("region catalog is empty".into()));
        }
        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[RegionRecord] {
        &self.regions
    }

    /// Exact city, then the longest city named inside the text, then exact state.
    pub fn find_by_name(&self, place: &str) -> Option<&RegionRecord> {
        let text = normalize(place);
        if text.trim().is_empty() {
            return None;
        }

        if let Some(exact) = self.regions.iter().find(|r| normalize(&r.city) == text) {
            return Some(exact);
        }

        let contained = self
            .regions
            .iter()
            .filter(|r| text.contains(&normalize(&r.city)))
            .max_by_key(|r| r.city.len());
        if contained.is_some() {
            return contained;
        }

        self.regions.iter().find(|r| normalize(&r.state) == text)
    }

    pub fn containing(&self, coords: Coordinates) -> Option<&RegionRecord> {
        self.regions.iter().find(|r| r.contains(coords))
    }

    /// Closest region centre within `max_km`, with its distance.
    pub fn nearest(&self, coords: Coordinates, max_km: f64) -> Option<(&RegionRecord, f64)> {
        self.regions
            .iter()
            .map(|r| {
                let c = r.center();
                (r, haversine_km(coords.lat, coords.lon, c.lat, c.lon))
            })
            .filter(|(_, d)| *d < max_km)
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Region whose box holds the point, else the nearest one in range.
    pub fn region_at(&self, coords: Coordinates) -> Option<&RegionRecord> {
        self.containing(coords)
            .or_else(|| self.nearest(coords, NEAREST_MATCH_KM).map(|(r, _)| r))
    }

    pub fn soil_type_at(&self, coords: Coordinates) -> Option<SoilType> {
        self.region_at(coords).and_then(RegionRecord::soil)
    }

    pub fn profile_at(&self, coords: Coordinates) -> Option<RegionProfile> {
        self.region_at(coords).map(RegionRecord::profile)
    }
}

#[async_trait]
impl Geocoder for RegionCatalog {
    fn name(&self) -> &'static str {
        "Region Catalog"
    }

    async fn forward(&self, place: &str) -> Result<Option<Location>> {
        Ok(self.find_by_name(place).map(RegionRecord::location))
    }

    /// Only points inside a catalog box; proximity matches come from [`NearestRegion`].
    async fn reverse(&self, coords: Coordinates) -> Result<Option<String>> {
        Ok(self.containing(coords).map(RegionRecord::label))
    }
}

/// Last-resort reverse geocoder naming a point after the closest catalog region.
pub struct NearestRegion {
    catalog: Arc<RegionCatalog>,
}

impl NearestRegion {
    pub fn new(catalog: Arc<RegionCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Geocoder for NearestRegion {
    fn name(&self) -> &'static str {
        "Nearest Catalog Region"
    }

    async fn forward(&self, _place: &str) -> Result<Option<Location>> {
        Ok(None)
    }

    async fn reverse(&self, coords: Coordinates) -> Result<Option<String>> {
        Ok(self
            .catalog
            .nearest(coords, NEAREST_MATCH_KM)
            .map(|(region, _)| format!("Near {}", region.label())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> RegionCatalog {
        RegionCatalog::embedded().unwrap()
    }

    #[test]
    fn embedded_catalog_parses_soils() {
        let catalog = catalog();
        assert!(catalog.regions().len() >= 20);
        assert!(catalog.regions().iter().all(|r| r.soil().is_some()));
    }

    #[test]
    fn exact_and_contained_city_names() {
        let catalog = catalog();
        assert_eq!(catalog.find_by_name("agra").unwrap().city, "Agra");
        assert_eq!(
            catalog.find_by_name("Greater Noida").unwrap().city,
            "Greater Noida"
        );
        assert_eq!(
            catalog.find_by_name("Mathura district").unwrap().city,
            "Mathura"
        );
        assert!(catalog.find_by_name("Atlantis").is_none());
        assert!(catalog.find_by_name("   ").is_none());
    }

    #[test]
    fn profile_carries_texture_ph_and_crops() {
        let profile = catalog().profile_at(Coordinates::new(27.18, 78.01)).unwrap();
        assert_eq!(profile.region, "Agra, Uttar Pradesh");
        assert_eq!(profile.soil_type, "Alluvial");
        assert_eq!(profile.texture, "Sandy Loam");
        assert_eq!(profile.ph, 8.0);
        assert_eq!(profile.common_crops[0], "potato");
        assert!(catalog().profile_at(Coordinates::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn state_name_maps_to_a_region_of_that_state() {
        let catalog = catalog();
        assert_eq!(catalog.find_by_name("Delhi").unwrap().city, "New Delhi");
        assert_eq!(catalog.find_by_name("punjab").unwrap().state, "Punjab");
    }

    #[test]
    fn default_location_is_inside_greater_noida() {
        let catalog = catalog();
        let region = catalog.containing(Coordinates::new(28.47, 77.50)).unwrap();
        assert_eq!(region.label(), "Greater Noida, Uttar Pradesh");
        assert_eq!(
            catalog.soil_type_at(Coordinates::new(28.47, 77.50)),
            Some(SoilType::Alluvial)
        );
    }

    #[test]
    fn nearest_respects_distance_cap() {
        let catalog = catalog();
        // Between Agra and Mathura, outside both boxes
        let (region, km) = catalog
            .nearest(Coordinates::new(27.35, 77.85), NEAREST_MATCH_KM)
            .unwrap();
        assert!(km < 40.0);
        assert!(region.city == "Agra" || region.city == "Mathura");

        // Middle of the Arabian Sea
        assert!(catalog.nearest(Coordinates::new(15.0, 65.0), NEAREST_MATCH_KM).is_none());
    }

    #[tokio::test]
    async fn geocoder_forward_returns_box_centre() {
        let catalog = catalog();
        let agra = catalog.forward("Agra").await.unwrap().unwrap();
        assert_eq!(agra.name, "Agra, Uttar Pradesh");
        assert!((agra.lat - 27.18).abs() < 1e-9);
        assert!((agra.lon - 78.01).abs() < 1e-9);
    }

    #[tokio::test]
    async fn reverse_geocoding_box_then_nearest() {
        let catalog = Arc::new(catalog());
        let inside = catalog.reverse(Coordinates::new(27.18, 78.01)).await.unwrap();
        assert_eq!(inside.as_deref(), Some("Agra, Uttar Pradesh"));

        let outside = Coordinates::new(27.35, 77.85);
        assert!(catalog.reverse(outside).await.unwrap().is_none());

        let nearest = NearestRegion::new(catalog.clone());
        let label = nearest.reverse(outside).await.unwrap().unwrap();
        assert!(label.starts_with("Near "));
        assert!(nearest.forward("Agra").await.unwrap().is_none());
    }
}
