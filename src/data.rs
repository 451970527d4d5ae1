//! Reference Data Loading
//!
//! Record types for Martian regions, candidate crops, and exploration sites,
//! plus CSV bulk loading for the region/crop reference tables.
//!
//! All scientific fields are kept as raw strings at this layer. The source
//! spreadsheets are inconsistently formatted (pH as "6.2–6.8" or "alkaline",
//! latitude as "4.5895°S" or "-4.59") and normalization is deliberately
//! deferred to the parsing layer at scoring time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Environmental envelope and trial outcomes for one candidate crop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropRecord {
    pub name: String,
    pub germination: String,
    pub biomass: String,
    pub flowered_seed: String,
    pub notes: String,
    pub preferred_ph_range: String,
    pub soil_texture: String,
    pub temperature_range: String,
    pub humidity_range: String,
    pub moisture_regime: String,
}

/// Geochemical and terrain attributes for one Martian surface region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRecord {
    pub name: String,
    pub latitude: String,
    pub longitude: String,
    pub elevation: String,
    pub perchlorate_wt_pct: String,
    pub water_release_wt_pct: String,
    pub ph: String,
    pub major_minerals: String,
    pub terrain_type: String,
    pub notes: String,
}

/// CSV row shape for data/mars_crops.csv (original spreadsheet headers).
#[derive(Debug, Deserialize)]
struct CropCsvRow {
    #[serde(rename = "Crop")]
    crop: String,
    #[serde(rename = "Germination_on_MarsSimulant", default)]
    germination: String,
    #[serde(rename = "Biomass", default)]
    biomass: String,
    #[serde(rename = "Flowered/Seed", default)]
    flowered_seed: String,
    #[serde(rename = "Notes", default)]
    notes: String,
    #[serde(rename = "Preferred_pH_range", default)]
    preferred_ph_range: String,
    #[serde(rename = "Terrain_Soil_texture", default)]
    soil_texture: String,
    #[serde(rename = "Temperature_range_C", default)]
    temperature_range: String,
    #[serde(rename = "Humidity_RH_range", default)]
    humidity_range: String,
    #[serde(rename = "Moisture_regime", default)]
    moisture_regime: String,
}

impl From<CropCsvRow> for CropRecord {
    fn from(row: CropCsvRow) -> Self {
        CropRecord {
            name: row.crop,
            germination: row.germination,
            biomass: row.biomass,
            flowered_seed: row.flowered_seed,
            notes: row.notes,
            preferred_ph_range: row.preferred_ph_range,
            soil_texture: row.soil_texture,
            temperature_range: row.temperature_range,
            humidity_range: row.humidity_range,
            moisture_regime: row.moisture_regime,
        }
    }
}

/// CSV row shape for data/mars_regions.csv (original spreadsheet headers).
#[derive(Debug, Deserialize)]
struct RegionCsvRow {
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Latitude_deg", default)]
    latitude: String,
    #[serde(rename = "Longitude_deg", default)]
    longitude: String,
    #[serde(rename = "Elevation_m", default)]
    elevation: String,
    #[serde(rename = "Perchlorate_wt_pct", default)]
    perchlorate_wt_pct: String,
    #[serde(rename = "Water_release_wt_pct", default)]
    water_release_wt_pct: String,
    #[serde(rename = "pH", default)]
    ph: String,
    #[serde(rename = "Major_minerals", default)]
    major_minerals: String,
    #[serde(rename = "Terrain_type", default)]
    terrain_type: String,
    #[serde(rename = "Notes", default)]
    notes: String,
}

impl From<RegionCsvRow> for RegionRecord {
    fn from(row: RegionCsvRow) -> Self {
        RegionRecord {
            name: row.region,
            latitude: row.latitude,
            longitude: row.longitude,
            elevation: row.elevation,
            perchlorate_wt_pct: row.perchlorate_wt_pct,
            water_release_wt_pct: row.water_release_wt_pct,
            ph: row.ph,
            major_minerals: row.major_minerals,
            terrain_type: row.terrain_type,
            notes: row.notes,
        }
    }
}

/// Load the crop reference table from a CSV file.
pub fn load_crops_csv(path: impl AsRef<Path>) -> Result<Vec<CropRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open crops CSV at {}", path.display()))?;
    read_crops(file).with_context(|| format!("failed to parse crops CSV at {}", path.display()))
}

/// Load the region reference table from a CSV file.
pub fn load_regions_csv(path: impl AsRef<Path>) -> Result<Vec<RegionRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open regions CSV at {}", path.display()))?;
    read_regions(file).with_context(|| format!("failed to parse regions CSV at {}", path.display()))
}

/// Read crop records from any CSV source (file, in-memory fixture).
pub fn read_crops(reader: impl Read) -> Result<Vec<CropRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut crops = Vec::new();
    for row in csv_reader.deserialize::<CropCsvRow>() {
        let row = row.context("malformed crop row")?;
        crops.push(CropRecord::from(row));
    }
    Ok(crops)
}

/// Read region records from any CSV source (file, in-memory fixture).
pub fn read_regions(reader: impl Read) -> Result<Vec<RegionRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut regions = Vec::new();
    for row in csv_reader.deserialize::<RegionCsvRow>() {
        let row = row.context("malformed region row")?;
        regions.push(RegionRecord::from(row));
    }
    Ok(regions)
}

// ============================================================================
// Exploration Sites
// ============================================================================

/// A required soil amendment for a simulated exploration site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientAddition {
    pub nutrient: String,
    pub priority: String,
}

/// Simulator parameters attached to an exploration site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorParameters {
    pub regolith_type: String,
    pub water_availability: String,
    pub perchlorate_level: String,
    pub required_pretreatment: String,
    pub required_nutrient_additions: Vec<NutrientAddition>,
    pub hazards: Vec<String>,
}

/// A named Mars exploration site used by the habitat simulator frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRecord {
    pub id: String,
    pub name: String,
    pub location: String,
    pub lat: f64,
    pub lon: f64,
    pub simulator_parameters: SimulatorParameters,
}

/// Built-in exploration site descriptors (curated, not CSV-backed).
pub fn exploration_sites() -> Vec<SiteRecord> {
    vec![
        SiteRecord {
            id: "SIM-001".to_string(),
            name: "Gale Crater Base (Curiosity Site)".to_string(),
            location: "Near Equatorial/Ancient Lake Bed".to_string(),
            lat: -4.5895,
            lon: 137.4417,
            simulator_parameters: SimulatorParameters {
                regolith_type: "Fine-Grained Sedimentary".to_string(),
                water_availability: "Moderate (Requires Drilling/Extraction)".to_string(),
                perchlorate_level: "High".to_string(),
                required_pretreatment: "Intensive Regolith Washing/Heating".to_string(),
                required_nutrient_additions: vec![
                    NutrientAddition {
                        nutrient: "Reactive Nitrogen".to_string(),
                        priority: "Critical".to_string(),
                    },
                    NutrientAddition {
                        nutrient: "Potassium".to_string(),
                        priority: "Low".to_string(),
                    },
                ],
                hazards: vec![
                    "Perchlorate Toxicity".to_string(),
                    "Nanophase Iron Oxide".to_string(),
                ],
            },
        },
        SiteRecord {
            id: "SIM-002".to_string(),
            name: "Utopia Planitia Base (Subsurface Ice)".to_string(),
            location: "Northern Mid-Latitudes/Vast Plain".to_string(),
            lat: 46.7,
            lon: 117.6,
            simulator_parameters: SimulatorParameters {
                regolith_type: "Volcanic/Basaltic".to_string(),
                water_availability: "High (Subsurface Ice Deposit)".to_string(),
                perchlorate_level: "Variable (Moderate)".to_string(),
                required_pretreatment: "Moderate Washing".to_string(),
                required_nutrient_additions: vec![
                    NutrientAddition {
                        nutrient: "Reactive Nitrogen".to_string(),
                        priority: "Critical".to_string(),
                    },
                    NutrientAddition {
                        nutrient: "Organic Carbon".to_string(),
                        priority: "High".to_string(),
                    },
                ],
                hazards: vec![
                    "Seasonal Dust Storms".to_string(),
                    "Potential Hexavalent Chromium ($Cr^{6+}$)".to_string(),
                ],
            },
        },
    ]
}
