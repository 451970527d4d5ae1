//! Match Service - Orchestrates stores and the compatibility matcher
//!
//! Thin seam between storage and algorithm: looks up the crop, pulls the
//! full region snapshot, delegates ranking to the matcher, and shapes the
//! report consumers see. No numeric parsing happens at this layer.

use crate::data::{CropRecord, RegionRecord};
use crate::matcher::{score_regions, MatchResult};
use crate::store::{CropStore, RegionStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("crop \"{0}\" not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Crop requirement summary echoed back with every match report.
#[derive(Debug, Clone, Serialize)]
pub struct CropDetails {
    pub preferred_ph_range: String,
    pub soil_texture: String,
    pub temperature_range: String,
    pub moisture_regime: String,
    pub germination: String,
    pub biomass: String,
    pub flowered_seed: String,
}

impl From<&CropRecord> for CropDetails {
    fn from(crop: &CropRecord) -> Self {
        CropDetails {
            preferred_ph_range: crop.preferred_ph_range.clone(),
            soil_texture: crop.soil_texture.clone(),
            temperature_range: crop.temperature_range.clone(),
            moisture_regime: crop.moisture_regime.clone(),
            germination: crop.germination.clone(),
            biomass: crop.biomass.clone(),
            flowered_seed: crop.flowered_seed.clone(),
        }
    }
}

/// One ranked match enriched with the full region record for display.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedMatch {
    pub region_name: String,
    pub score: i32,
    pub reasons: Vec<String>,
    pub latitude: String,
    pub longitude: String,
    pub elevation: String,
    pub ph: String,
    pub perchlorate_wt_pct: String,
    pub water_release_wt_pct: String,
    pub major_minerals: String,
    pub terrain_type: String,
    pub notes: String,
}

impl DetailedMatch {
    fn new(result: &MatchResult, region: &RegionRecord) -> Self {
        DetailedMatch {
            region_name: result.region_name.clone(),
            score: result.score,
            reasons: result.reasons.clone(),
            latitude: region.latitude.clone(),
            longitude: region.longitude.clone(),
            elevation: region.elevation.clone(),
            ph: region.ph.clone(),
            perchlorate_wt_pct: region.perchlorate_wt_pct.clone(),
            water_release_wt_pct: region.water_release_wt_pct.clone(),
            major_minerals: region.major_minerals.clone(),
            terrain_type: region.terrain_type.clone(),
            notes: region.notes.clone(),
        }
    }
}

/// Full match report for one crop query.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub crop: String,
    pub crop_details: CropDetails,
    pub top_matches: Vec<DetailedMatch>,
    pub total_regions_analyzed: usize,
}

/// Binds the crop/region stores to the matcher behind a single call.
#[derive(Clone)]
pub struct MatchService {
    crops: Arc<dyn CropStore>,
    regions: Arc<dyn RegionStore>,
}

impl MatchService {
    pub fn new(crops: Arc<dyn CropStore>, regions: Arc<dyn RegionStore>) -> Self {
        Self { crops, regions }
    }

    /// Rank all known regions for the named crop and return the top `top_n`.
    pub fn match_crop(&self, crop_name: &str, top_n: usize) -> Result<MatchReport, MatchError> {
        let crop = self
            .crops
            .find_by_name_substring(crop_name)?
            .ok_or_else(|| MatchError::NotFound(crop_name.to_string()))?;

        let regions = self.regions.list_all()?;
        let total = regions.len();
        let ranked = score_regions(&crop, &regions, top_n);

        // Re-attach the full region records for display
        let top_matches = ranked
            .iter()
            .filter_map(|result| {
                regions
                    .iter()
                    .find(|r| r.name == result.region_name)
                    .map(|region| DetailedMatch::new(result, region))
            })
            .collect();

        Ok(MatchReport {
            crop: crop.name.clone(),
            crop_details: CropDetails::from(&crop),
            top_matches,
            total_regions_analyzed: total,
        })
    }

    /// Crop lookup shared by the narrative endpoints.
    pub fn find_crop(&self, crop_name: &str) -> Result<CropRecord, MatchError> {
        self.crops
            .find_by_name_substring(crop_name)?
            .ok_or_else(|| MatchError::NotFound(crop_name.to_string()))
    }

    /// Exact region lookup shared by the narrative endpoints.
    pub fn find_region(&self, region_name: &str) -> Result<RegionRecord, MatchError> {
        self.regions
            .find_by_name(region_name)?
            .ok_or_else(|| MatchError::NotFound(region_name.to_string()))
    }

    pub fn list_crops(&self) -> Result<Vec<CropRecord>, MatchError> {
        Ok(self.crops.list_all()?)
    }

    pub fn list_regions(&self) -> Result<Vec<RegionRecord>, MatchError> {
        Ok(self.regions.list_all()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ReferenceStore;

    fn fixture_service() -> MatchService {
        let crops = vec![CropRecord {
            name: "Lettuce".to_string(),
            germination: "Yes".to_string(),
            biomass: "Moderate".to_string(),
            flowered_seed: "Yes".to_string(),
            notes: String::new(),
            preferred_ph_range: "6.0-7.0".to_string(),
            soil_texture: "sandy loam".to_string(),
            temperature_range: "15-20".to_string(),
            humidity_range: String::new(),
            moisture_regime: "Consistent moisture".to_string(),
        }];
        let regions = vec![
            RegionRecord {
                name: "Gale Crater".to_string(),
                latitude: "4.5895°S".to_string(),
                longitude: "137.4417°E".to_string(),
                elevation: "-4500".to_string(),
                perchlorate_wt_pct: "0.2".to_string(),
                water_release_wt_pct: "2.0".to_string(),
                ph: "6.5".to_string(),
                major_minerals: "Basalt".to_string(),
                terrain_type: "sandy plains".to_string(),
                notes: String::new(),
            },
            RegionRecord {
                name: "Planum Boreum".to_string(),
                latitude: "88°N".to_string(),
                longitude: "15°E".to_string(),
                elevation: "-3000".to_string(),
                perchlorate_wt_pct: "0.8".to_string(),
                water_release_wt_pct: String::new(),
                ph: String::new(),
                major_minerals: "Water ice".to_string(),
                terrain_type: "polar cap".to_string(),
                notes: "Permanent ice".to_string(),
            },
        ];
        let store = Arc::new(ReferenceStore::new(crops, regions));
        MatchService::new(store.clone(), store)
    }

    #[test]
    fn test_match_crop_ranks_and_counts() {
        let service = fixture_service();
        let report = service.match_crop("lettuce", 5).unwrap();

        assert_eq!(report.crop, "Lettuce");
        assert_eq!(report.total_regions_analyzed, 2);
        assert_eq!(report.top_matches.len(), 2);
        assert_eq!(report.top_matches[0].region_name, "Gale Crater");
        assert_eq!(report.top_matches[0].score, 10);
        // Pass-through region fields survive enrichment
        assert_eq!(report.top_matches[0].longitude, "137.4417°E");
    }

    #[test]
    fn test_match_crop_not_found() {
        let service = fixture_service();
        let err = service.match_crop("wheat", 5).unwrap_err();
        assert!(matches!(err, MatchError::NotFound(ref name) if name == "wheat"));
    }

    #[test]
    fn test_match_crop_top_n_one() {
        let service = fixture_service();
        let report = service.match_crop("Lettuce", 1).unwrap();
        assert_eq!(report.top_matches.len(), 1);
        assert_eq!(report.total_regions_analyzed, 2);
    }

    #[test]
    fn test_find_region_exact() {
        let service = fixture_service();
        assert!(service.find_region("Planum Boreum").is_ok());
        assert!(matches!(
            service.find_region("Olympus Mons"),
            Err(MatchError::NotFound(_))
        ));
    }
}
