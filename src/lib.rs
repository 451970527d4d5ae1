//! TerraEngine - Mars Crop Matching Backend
//!
//! Matches agricultural crops to candidate Martian regions with a
//! deterministic multi-factor heuristic and serves the ranked results over
//! a JSON API:
//! - `parse`: normalization of loosely-formatted scientific fields
//! - `matcher`: the weighted compatibility rule set
//! - `data` / `store`: reference records, CSV bulk load, lookup traits
//! - `service`: the match orchestration seam
//! - `narrative`: optional Gemini enrichment with deterministic fallback
//! - `api_server`: Axum routing and state

pub mod api_server;
pub mod data;
pub mod matcher;
pub mod narrative;
pub mod parse;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use api_server::{create_router, AppState};
pub use data::{CropRecord, RegionRecord};
pub use matcher::{score_regions, MatchResult};
pub use parse::{parse_latitude, parse_ph_scalar, parse_range, ParsedRange, Scalar};
pub use service::{MatchError, MatchReport, MatchService};
pub use store::{CropStore, ReferenceStore, RegionStore};
