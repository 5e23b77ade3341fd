use crate::models::{FusedRecord, LandHealthAssessment, MoistureStatus, VegetationClass};

pub const NDVI_SPARSE_BELOW: f64 = 0.3;
pub const NDVI_HEALTHY_FROM: f64 = 0.5;
pub const MOISTURE_DRY_BELOW: f64 = 20.0;
pub const MOISTURE_WATERLOGGED_ABOVE: f64 = 45.0;

pub fn classify_vegetation(fused: &FusedRecord) -> VegetationClass {
    if !fused.has_ndvi() {
        VegetationClass::Unknown
    } else if fused.ndvi_avg < NDVI_SPARSE_BELOW {
        VegetationClass::Sparse
    } else if fused.ndvi_avg < NDVI_HEALTHY_FROM {
        VegetationClass::Moderate
    } else {
        VegetationClass::Healthy
    }
}

pub fn classify_moisture(fused: &FusedRecord) -> MoistureStatus {
    if !fused.has_soil_moisture() {
        MoistureStatus::Unknown
    } else if fused.soil_moisture_pct < MOISTURE_DRY_BELOW {
        MoistureStatus::Dry
    } else if fused.soil_moisture_pct <= MOISTURE_WATERLOGGED_ABOVE {
        MoistureStatus::Adequate
    } else {
        MoistureStatus::Waterlogged
    }
}

pub fn assess(fused: &FusedRecord) -> LandHealthAssessment {
    LandHealthAssessment {
        vegetation: classify_vegetation(fused),
        moisture: classify_moisture(fused),
    }
}
