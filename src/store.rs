//! Reference Store - In-memory typed storage for crop and region lookups
//!
//! The matching core only ever reads reference data, so the store is an
//! immutable snapshot loaded once at startup. Lookups go through the
//! `CropStore`/`RegionStore` traits so the service layer stays independent
//! of where the records actually live.

use crate::data::{self, CropRecord, RegionRecord};
use rustc_hash::FxHashMap;
use std::path::Path;
use thiserror::Error;

/// Failure of the backing store to respond. Propagated unchanged to the
/// caller; the core neither retries nor caches around it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reference store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only crop lookup collaborator.
pub trait CropStore: Send + Sync {
    /// Case-insensitive substring match against crop names, first hit wins.
    fn find_by_name_substring(&self, name: &str) -> Result<Option<CropRecord>, StoreError>;

    fn list_all(&self) -> Result<Vec<CropRecord>, StoreError>;
}

/// Read-only region lookup collaborator.
pub trait RegionStore: Send + Sync {
    fn list_all(&self) -> Result<Vec<RegionRecord>, StoreError>;

    /// Exact-name lookup, used by the region analysis endpoint.
    fn find_by_name(&self, name: &str) -> Result<Option<RegionRecord>, StoreError>;
}

/// In-memory reference store backed by the CSV bulk load.
///
/// Records are sorted by name at construction so substring matches and
/// ranking tie-breaks are deterministic regardless of spreadsheet row order.
pub struct ReferenceStore {
    crops: Vec<CropRecord>,
    regions: Vec<RegionRecord>,
    region_index: FxHashMap<String, usize>,
}

impl ReferenceStore {
    pub fn new(mut crops: Vec<CropRecord>, mut regions: Vec<RegionRecord>) -> Self {
        crops.sort_by(|a, b| a.name.cmp(&b.name));
        regions.sort_by(|a, b| a.name.cmp(&b.name));

        let region_index = regions
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.name.clone(), idx))
            .collect();

        Self {
            crops,
            regions,
            region_index,
        }
    }

    /// Load both reference tables from `<data_dir>/mars_crops.csv` and
    /// `<data_dir>/mars_regions.csv`.
    pub fn from_csv_dir(data_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let data_dir = data_dir.as_ref();
        let crops = data::load_crops_csv(data_dir.join("mars_crops.csv"))?;
        let regions = data::load_regions_csv(data_dir.join("mars_regions.csv"))?;
        tracing::info!(
            "Loaded reference data: {} crops, {} regions",
            crops.len(),
            regions.len()
        );
        Ok(Self::new(crops, regions))
    }

    pub fn crop_count(&self) -> usize {
        self.crops.len()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

impl CropStore for ReferenceStore {
    fn find_by_name_substring(&self, name: &str) -> Result<Option<CropRecord>, StoreError> {
        let needle = name.to_lowercase();
        Ok(self
            .crops
            .iter()
            .find(|c| c.name.to_lowercase().contains(&needle))
            .cloned())
    }

    fn list_all(&self) -> Result<Vec<CropRecord>, StoreError> {
        Ok(self.crops.clone())
    }
}

impl RegionStore for ReferenceStore {
    fn list_all(&self) -> Result<Vec<RegionRecord>, StoreError> {
        Ok(self.regions.clone())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<RegionRecord>, StoreError> {
        Ok(self
            .region_index
            .get(name)
            .map(|&idx| self.regions[idx].clone()))
    }
}
