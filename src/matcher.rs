//! Crop-to-Region Compatibility Matcher
//!
//! Ranks Martian regions against one crop's environmental requirements using
//! a weighted rule set, attaching a human-readable reason for each rule that
//! fires. Scoring is a pure function of its inputs: no shared state, no
//! mutation, identical output for identical input. Downstream consumers
//! (UI, narrative prompt builder) depend on the exact reason wording and
//! ordering, so rules always evaluate in the fixed order below.
//!
//! Rule weights (signed, accumulated from 0):
//!   1. pH compatibility        +3 / -1
//!   2. Soil texture            +2 / +2 / +1 (first match wins)
//!   3. Latitude climate band   +2 / +1 / -1
//!   4. Perchlorate penalty     -3 / -1 / +1
//!   5. Water release bonus     +2 / +1
//!   6. Notes keywords          +1 (ice), -1 (dust)
//!
//! Rules 4 and 5 deliberately differ on unparseable input: rule 4 reports
//! "Perchlorate data unclear", rule 5 stays silent. That asymmetry is
//! observable through the API and consumers rely on it.

use crate::data::{CropRecord, RegionRecord};
use crate::parse::{parse_latitude, parse_ph_scalar, parse_range, ParsedRange, Scalar};
use serde::Serialize;

/// Parsed view of a crop's requirements, computed once per scoring call.
#[derive(Debug, Clone)]
pub struct CropProfile {
    pub ph_range: ParsedRange,
    pub soil_texture: String,
    pub moisture_regime: String,
}

impl CropProfile {
    pub fn from_record(crop: &CropRecord) -> Self {
        CropProfile {
            ph_range: parse_range(&crop.preferred_ph_range),
            soil_texture: crop.soil_texture.to_lowercase(),
            moisture_regime: crop.moisture_regime.to_lowercase(),
        }
    }
}

/// Scored outcome for a single region, produced fresh on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub region_name: String,
    pub score: i32,
    /// Justification fragments in rule evaluation order.
    pub reasons: Vec<String>,
    pub latitude: Option<f64>,
    pub perchlorate: String,
    pub ph: String,
    pub terrain: String,
}

/// Score every region against the crop's requirements and return the
/// `top_n` best, descending by score. Ties keep the order regions were
/// supplied in (stable sort), which makes the ranking reproducible.
pub fn score_regions(crop: &CropRecord, regions: &[RegionRecord], top_n: usize) -> Vec<MatchResult> {
    let profile = CropProfile::from_record(crop);
    let mut results: Vec<MatchResult> = regions
        .iter()
        .map(|region| score_region(&profile, region))
        .collect();

    // Vec::sort_by is stable: equal scores retain input order
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results.truncate(top_n);
    results
}

/// Apply the full rule set to one region.
pub fn score_region(profile: &CropProfile, region: &RegionRecord) -> MatchResult {
    let mut score = 0i32;
    let mut reasons = Vec::new();

    // 1. pH compatibility
    let region_ph = parse_ph_scalar(&region.ph);
    match (profile.ph_range.is_resolved(), region_ph) {
        (true, Scalar::Resolved(ph)) => {
            if profile.ph_range.contains(ph) {
                score += 3;
                reasons.push(format!("pH compatible ({:.1})", ph));
            } else {
                score -= 1;
                reasons.push(format!("pH mismatch ({:.1})", ph));
            }
        }
        _ => reasons.push("pH data unavailable".to_string()),
    }

    // 2. Soil texture (first match wins: loam, sandy, well-drained)
    let terrain = region.terrain_type.to_lowercase();
    if profile.soil_texture.contains("loam") && terrain.contains("loam") {
        score += 2;
        reasons.push("Loam soil match".to_string());
    } else if profile.soil_texture.contains("sandy") && terrain.contains("sandy") {
        score += 2;
        reasons.push("Sandy soil match".to_string());
    } else if profile.soil_texture.contains("well-drained") && terrain.contains("drained") {
        score += 1;
        reasons.push("Drainage compatibility".to_string());
    }

    // 3. Latitude climate band (silent when unresolvable)
    let latitude = parse_latitude(&region.latitude).value();
    if let Some(lat) = latitude {
        if (-15.0..=15.0).contains(&lat) {
            score += 2;
            reasons.push("Equatorial climate".to_string());
        } else if (-40.0..=40.0).contains(&lat) {
            score += 1;
            reasons.push("Moderate climate".to_string());
        } else {
            score -= 1;
            reasons.push("Polar climate".to_string());
        }
    }

    // 4. Perchlorate penalty
    let perchlorate_raw = region.perchlorate_wt_pct.trim();
    if !perchlorate_raw.is_empty() {
        match perchlorate_raw.parse::<f64>() {
            Ok(pct) if pct > 0.5 => {
                score -= 3;
                reasons.push(format!("High perchlorate ({}%)", perchlorate_raw));
            }
            Ok(pct) if pct > 0.3 => {
                score -= 1;
                reasons.push(format!("Moderate perchlorate ({}%)", perchlorate_raw));
            }
            Ok(_) => {
                score += 1;
                reasons.push(format!("Low perchlorate ({}%)", perchlorate_raw));
            }
            Err(_) => reasons.push("Perchlorate data unclear".to_string()),
        }
    }

    // 5. Water release bonus (silent on unparseable input, unlike rule 4)
    let water_raw = region.water_release_wt_pct.trim();
    if !water_raw.is_empty() {
        if let Ok(pct) = water_raw.parse::<f64>() {
            if pct > 1.5 {
                score += 2;
                reasons.push(format!("Good water availability ({}%)", water_raw));
            } else if pct > 1.0 {
                score += 1;
                reasons.push(format!("Moderate water ({}%)", water_raw));
            }
        }
    }

    // 6. Notes keywords (independent checks, both may fire)
    let notes = region.notes.to_lowercase();
    if notes.contains("ice") && profile.moisture_regime.contains("moisture") {
        score += 1;
        reasons.push("Water ice potential".to_string());
    }
    if notes.contains("dust") {
        score -= 1;
        reasons.push("Dust challenges".to_string());
    }

    MatchResult {
        region_name: region.name.clone(),
        score,
        reasons,
        latitude,
        perchlorate: region.perchlorate_wt_pct.clone(),
        ph: region.ph.clone(),
        terrain: region.terrain_type.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crop(ph_range: &str, soil: &str, moisture: &str) -> CropRecord {
        CropRecord {
            name: "Test Crop".to_string(),
            germination: String::new(),
            biomass: String::new(),
            flowered_seed: String::new(),
            notes: String::new(),
            preferred_ph_range: ph_range.to_string(),
            soil_texture: soil.to_string(),
            temperature_range: String::new(),
            humidity_range: String::new(),
            moisture_regime: moisture.to_string(),
        }
    }

    fn region(name: &str) -> RegionRecord {
        RegionRecord {
            name: name.to_string(),
            latitude: String::new(),
            longitude: String::new(),
            elevation: String::new(),
            perchlorate_wt_pct: String::new(),
            water_release_wt_pct: String::new(),
            ph: String::new(),
            major_minerals: String::new(),
            terrain_type: String::new(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_full_scenario_score_ten() {
        let crop = crop("6.0-7.0", "sandy loam", "");
        let mut r = region("Region A");
        r.ph = "6.5".to_string();
        r.terrain_type = "sandy plains".to_string();
        r.latitude = "5°N".to_string();
        r.perchlorate_wt_pct = "0.2".to_string();
        r.water_release_wt_pct = "2.0".to_string();

        let results = score_regions(&crop, &[r], 3);
        assert_eq!(results.len(), 1);
        // 3 (pH) + 2 (sandy) + 2 (equatorial) + 1 (low perchlorate) + 2 (water)
        assert_eq!(results[0].score, 10);
        assert_eq!(
            results[0].reasons,
            vec![
                "pH compatible (6.5)",
                "Sandy soil match",
                "Equatorial climate",
                "Low perchlorate (0.2%)",
                "Good water availability (2.0%)",
            ]
        );
    }

    #[test]
    fn test_high_perchlorate_alone() {
        let crop = crop("", "", "");
        let mut r = region("Toxic Flats");
        r.perchlorate_wt_pct = "0.8".to_string();

        let result = score_region(&CropProfile::from_record(&crop), &r);
        // -3 perchlorate; pH unavailable reason carries no score
        assert_eq!(result.score, -3);
        assert_eq!(
            result.reasons,
            vec!["pH data unavailable", "High perchlorate (0.8%)"]
        );
    }

    #[test]
    fn test_ph_mismatch_penalty() {
        let crop = crop("6.0-7.0", "", "");
        let mut r = region("Alkali Basin");
        r.ph = "8.5".to_string();

        let result = score_region(&CropProfile::from_record(&crop), &r);
        assert_eq!(result.score, -1);
        assert_eq!(result.reasons, vec!["pH mismatch (8.5)"]);
    }

    #[test]
    fn test_ph_unavailable_when_crop_range_unknown() {
        let crop = crop("Unknown", "", "");
        let mut r = region("Any");
        r.ph = "7.0".to_string();

        let result = score_region(&CropProfile::from_record(&crop), &r);
        assert_eq!(result.score, 0);
        assert_eq!(result.reasons, vec!["pH data unavailable"]);
    }

    #[test]
    fn test_soil_rules_first_match_wins() {
        // Crop mentions both loam and sandy; loam check fires first
        let crop = crop("", "sandy loam", "");
        let mut r = region("Loam Terrace");
        r.terrain_type = "sandy loam deposits".to_string();

        let result = score_region(&CropProfile::from_record(&crop), &r);
        assert_eq!(result.score, 2);
        assert_eq!(result.reasons, vec!["pH data unavailable", "Loam soil match"]);
    }

    #[test]
    fn test_drainage_compatibility() {
        let crop = crop("", "well-drained silt", "");
        let mut r = region("Drained Slope");
        r.terrain_type = "freely drained scree".to_string();

        let result = score_region(&CropProfile::from_record(&crop), &r);
        assert_eq!(result.score, 1);
        assert_eq!(
            result.reasons,
            vec!["pH data unavailable", "Drainage compatibility"]
        );
    }

    #[test]
    fn test_latitude_bands() {
        let crop = crop("", "", "");
        let profile = CropProfile::from_record(&crop);

        let mut equatorial = region("Eq");
        equatorial.latitude = "14.9°S".to_string();
        let r = score_region(&profile, &equatorial);
        assert_eq!(r.score, 2);
        assert!(r.reasons.contains(&"Equatorial climate".to_string()));

        let mut moderate = region("Mid");
        moderate.latitude = "39°N".to_string();
        let r = score_region(&profile, &moderate);
        assert_eq!(r.score, 1);
        assert!(r.reasons.contains(&"Moderate climate".to_string()));

        let mut polar = region("Pole");
        polar.latitude = "68°N".to_string();
        let r = score_region(&profile, &polar);
        assert_eq!(r.score, -1);
        assert!(r.reasons.contains(&"Polar climate".to_string()));
    }

    #[test]
    fn test_unresolvable_latitude_is_silent() {
        let crop = crop("", "", "");
        let mut r = region("Nowhere");
        r.latitude = "somewhere north".to_string();

        let result = score_region(&CropProfile::from_record(&crop), &r);
        assert_eq!(result.score, 0);
        assert_eq!(result.latitude, None);
        assert_eq!(result.reasons, vec!["pH data unavailable"]);
    }

    #[test]
    fn test_perchlorate_unclear_vs_water_silent() {
        let crop = crop("", "", "");
        let mut r = region("Murky");
        r.perchlorate_wt_pct = "trace amounts".to_string();
        r.water_release_wt_pct = "some".to_string();

        let result = score_region(&CropProfile::from_record(&crop), &r);
        assert_eq!(result.score, 0);
        // Rule 4 reports unclear data, rule 5 stays silent
        assert_eq!(
            result.reasons,
            vec!["pH data unavailable", "Perchlorate data unclear"]
        );
    }

    #[test]
    fn test_moderate_water_threshold() {
        let crop = crop("", "", "");
        let mut r = region("Damp");
        r.water_release_wt_pct = "1.2".to_string();

        let result = score_region(&CropProfile::from_record(&crop), &r);
        assert_eq!(result.score, 1);
        assert!(result
            .reasons
            .contains(&"Moderate water (1.2%)".to_string()));
    }

    #[test]
    fn test_low_water_is_silent() {
        let crop = crop("", "", "");
        let mut r = region("Dry");
        r.water_release_wt_pct = "0.9".to_string();

        let result = score_region(&CropProfile::from_record(&crop), &r);
        assert_eq!(result.score, 0);
        assert_eq!(result.reasons, vec!["pH data unavailable"]);
    }

    #[test]
    fn test_ice_and_dust_both_fire() {
        let crop = crop("", "", "Consistent moisture");
        let mut r = region("Icy Dunes");
        r.notes = "Subsurface ice beneath dust mantle".to_string();

        let result = score_region(&CropProfile::from_record(&crop), &r);
        assert_eq!(result.score, 0); // +1 ice, -1 dust
        assert_eq!(
            result.reasons,
            vec!["pH data unavailable", "Water ice potential", "Dust challenges"]
        );
    }

    #[test]
    fn test_ice_requires_moisture_keyword() {
        let crop = crop("", "", "Drought tolerant");
        let mut r = region("Icy");
        r.notes = "Water ice present".to_string();

        let result = score_region(&CropProfile::from_record(&crop), &r);
        assert_eq!(result.score, 0);
        assert!(!result.reasons.contains(&"Water ice potential".to_string()));
    }

    #[test]
    fn test_stable_sort_preserves_input_order_on_ties() {
        let crop = crop("", "", "");
        let names = ["First", "Second", "Third"];
        let regions: Vec<RegionRecord> = names.iter().map(|n| region(n)).collect();

        let results = score_regions(&crop, &regions, 3);
        let out: Vec<&str> = results.iter().map(|r| r.region_name.as_str()).collect();
        assert_eq!(out, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_top_n_truncation() {
        let crop = crop("", "", "");
        let mut regions = Vec::new();
        for i in 0..10 {
            let mut r = region(&format!("Region {}", i));
            // Regions 7, 8, 9 get the low-perchlorate bonus
            if i >= 7 {
                r.perchlorate_wt_pct = "0.1".to_string();
            }
            regions.push(r);
        }

        let results = score_regions(&crop, &regions, 3);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.score == 1));
        assert_eq!(results[0].region_name, "Region 7");
        assert_eq!(results[2].region_name, "Region 9");
    }

    #[test]
    fn test_empty_regions_empty_result() {
        let crop = crop("6.0-7.0", "loam", "");
        let results = score_regions(&crop, &[], 5);
        assert!(results.is_empty());
    }

    #[test]
    fn test_determinism() {
        let crop = crop("6.0-7.0", "sandy loam well-drained", "moisture");
        let mut r = region("Gale");
        r.ph = "7.2".to_string();
        r.latitude = "4.5895°S".to_string();
        r.terrain_type = "sedimentary loam".to_string();
        r.perchlorate_wt_pct = "0.5".to_string();
        r.water_release_wt_pct = "2.0".to_string();
        r.notes = "ice-bearing strata, dust cover".to_string();
        let regions = vec![r];

        let a = score_regions(&crop, &regions, 5);
        let b = score_regions(&crop, &regions, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_never_panics_on_garbage_fields() {
        let crop = crop("pH of roughly–ish", "☃ snow", "???");
        let garbage = [
            "", " ", "NaN", "--", "°N", "1.2.3.4", "∞", "null", "１２３",
            "12°X", "-", "1e309", "0x1F", "percent%", "７．２",
        ];
        for g in &garbage {
            let mut r = region("Fuzz");
            r.ph = g.to_string();
            r.latitude = g.to_string();
            r.perchlorate_wt_pct = g.to_string();
            r.water_release_wt_pct = g.to_string();
            r.terrain_type = g.to_string();
            r.notes = g.to_string();
            let results = score_regions(&crop, &[r], 3);
            assert_eq!(results.len(), 1);
        }
    }
}
