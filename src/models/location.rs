use super::fused::MISSING_READING;
use crate::error::{AgroFusionError, Result};
use serde::{Deserialize, Serialize};

/// Coordinate tolerance, in degrees, within which two locations are the same region.
/// Upstream geocoders disagree on precision, so exact equality is never required.
pub const REGION_TOLERANCE_DEG: f64 = 0.01;

pub const UNRESOLVED_NAME: &str = "Unknown location";

/// A named point used as the join key across all datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }

    /// A location at the given point named after its coordinates.
    pub fn unnamed(coords: Coordinates) -> Self {
        Self::new(coordinate_label(coords.lat, coords.lon), coords.lat, coords.lon)
    }

    /// Stand-in for a query that named no place and carried no coordinates.
    /// Both coordinates hold the missing-reading marker.
    pub fn unresolved() -> Self {
        Self::new(UNRESOLVED_NAME, MISSING_READING, MISSING_READING)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lon: self.lon,
        }
    }

    pub fn same_region(&self, other: &Location) -> bool {
        (self.lat - other.lat).abs() <= REGION_TOLERANCE_DEG + f64::EPSILON
            && (self.lon - other.lon).abs() <= REGION_TOLERANCE_DEG + f64::EPSILON
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.4}, {:.4})", self.name, self.lat, self.lon)
    }
}

/// Raw coordinates, e.g. from a map click.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn validate(self) -> Result<Self> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(AgroFusionError::Validation(format!(
                "latitude {} is outside [-90, 90]",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(AgroFusionError::Validation(format!(
                "longitude {} is outside [-180, 180]",
                self.lon
            )));
        }
        Ok(self)
    }
}

/// Label used when no geocoder can name a point, e.g. `Region (28.47°N, 77.50°E)`.
pub fn coordinate_label(lat: f64, lon: f64) -> String {
    let ns = if lat < 0.0 { 'S' } else { 'N' };
    let ew = if lon < 0.0 { 'W' } else { 'E' };
    format!(
        "Region ({:.2}°{}, {:.2}°{})",
        lat.abs(),
        ns,
        lon.abs(),
        ew
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_region_within_tolerance() {
        let a = Location::new("Agra", 27.1767, 78.0081);
        let b = Location::new("Agra, Uttar Pradesh", 27.18, 78.01);
        let c = Location::new("Mathura", 27.4924, 77.6737);

        assert!(a.same_region(&b));
        assert!(b.same_region(&a));
        assert!(!a.same_region(&c));
    }

    #[test]
    fn same_region_rejects_just_outside_tolerance() {
        let a = Location::new("A", 10.0, 10.0);
        let b = Location::new("B", 10.02, 10.0);
        assert!(!a.same_region(&b));
    }

    #[test]
    fn coordinate_label_hemispheres() {
        assert_eq!(coordinate_label(28.47, 77.5), "Region (28.47°N, 77.50°E)");
        assert_eq!(coordinate_label(-33.9, -70.25), "Region (33.90°S, 70.25°W)");
    }

    #[test]
    fn coordinates_validation() {
        assert!(Coordinates::new(28.47, 77.5).validate().is_ok());
        assert!(Coordinates::new(90.0, -180.0).validate().is_ok());
        assert!(Coordinates::new(90.5, 0.0).validate().is_err());
        assert!(Coordinates::new(0.0, 180.1).validate().is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).validate().is_err());
    }
}
