// Axum API Server Module
//
// REST surface over the matching core: crop/region/site listings, the
// crop-to-region match operation, and the two narrative endpoints. The
// handlers stay thin; ranking lives in the matcher and narrative text in
// the narrator.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};

use moka::future::Cache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::data::{exploration_sites, SiteRecord};
use crate::narrative::{GeminiClient, Narrator, TextGenerator};
use crate::service::{CropDetails, MatchError, MatchService};
use crate::store::ReferenceStore;

/// Default number of regions returned by the match endpoint.
const DEFAULT_TOP_N: usize = 3;

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub service: MatchService,
    pub narrator: Arc<Narrator>,
    pub sites: Arc<Vec<SiteRecord>>,
    pub cache: Cache<String, serde_json::Value>,
}

impl AppState {
    /// Load reference data from `data_dir` and wire the Gemini client from
    /// the environment (absent key means fallback-only narration).
    pub fn new(data_dir: &str) -> anyhow::Result<Self> {
        tracing::info!("Loading reference store from {}...", data_dir);
        let store = Arc::new(ReferenceStore::from_csv_dir(data_dir)?);

        let generator: Option<Box<dyn TextGenerator>> =
            GeminiClient::from_env().map(|c| Box::new(c) as Box<dyn TextGenerator>);

        Ok(Self::from_parts(store, Narrator::new(generator)))
    }

    /// Assemble state from preloaded parts (used by tests with fixtures).
    pub fn from_parts(store: Arc<ReferenceStore>, narrator: Narrator) -> Self {
        let service = MatchService::new(store.clone(), store);

        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(300))
            .build();

        Self {
            service,
            narrator: Arc::new(narrator),
            sites: Arc::new(exploration_sites()),
            cache,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Reference data listings
        .route("/api/crops", get(list_crops))
        .route("/api/regions", get(list_regions))
        .route("/api/sites", get(list_sites))
        .route("/api/sites/:id", get(get_site))
        // Matching
        .route("/api/crops/match", get(match_crop))
        // Narrative enrichment
        .route("/api/crops/recommend", post(recommend_with_ai))
        .route("/api/regions/analyze", post(analyze_region))
        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Store(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Store(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

fn crop_error(crop_name: &str, err: MatchError) -> AppError {
    match err {
        MatchError::NotFound(_) => AppError::NotFound(format!("Crop \"{}\" not found", crop_name)),
        MatchError::Store(e) => AppError::Store(e.to_string()),
    }
}

fn region_error(region_name: &str, err: MatchError) -> AppError {
    match err {
        MatchError::NotFound(_) => {
            AppError::NotFound(format!("Region \"{}\" not found", region_name))
        }
        MatchError::Store(e) => AppError::Store(e.to_string()),
    }
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_crops(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let crops = state
        .service
        .list_crops()
        .map_err(|e| AppError::Store(e.to_string()))?;
    Ok(Json(serde_json::json!(crops)))
}

async fn list_regions(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let regions = state
        .service
        .list_regions()
        .map_err(|e| AppError::Store(e.to_string()))?;
    Ok(Json(serde_json::json!(regions)))
}

async fn list_sites(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!(&*state.sites))
}

async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .sites
        .iter()
        .find(|s| s.id == id)
        .map(|s| Json(serde_json::json!(s)))
        .ok_or_else(|| AppError::NotFound("Site not found".to_string()))
}

#[derive(Debug, Deserialize)]
struct MatchQuery {
    crop: Option<String>,
    top_n: Option<usize>,
}

async fn match_crop(
    State(state): State<AppState>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let crop_name = query
        .crop
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Crop name required".to_string()))?;
    let top_n = query.top_n.unwrap_or(DEFAULT_TOP_N).max(1);

    let cache_key = format!("match:{}:{}", crop_name.to_lowercase(), top_n);
    if let Some(cached) = state.cache.get(&cache_key).await {
        tracing::debug!("Cache hit for match query '{}'", crop_name);
        return Ok(Json(cached));
    }

    let report = state
        .service
        .match_crop(&crop_name, top_n)
        .map_err(|e| crop_error(&crop_name, e))?;

    let result = serde_json::json!(report);
    state.cache.insert(cache_key, result.clone()).await;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct RecommendRequest {
    crop: Option<String>,
    top_n: Option<usize>,
}

async fn recommend_with_ai(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let crop_name = request
        .crop
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Crop name required".to_string()))?;
    let top_n = request.top_n.unwrap_or(DEFAULT_TOP_N).max(1);

    let report = state
        .service
        .match_crop(&crop_name, top_n)
        .map_err(|e| crop_error(&crop_name, e))?;

    let insights = state
        .narrator
        .crop_insights(
            &report.crop,
            &report.crop_details,
            &report.top_matches,
            report.total_regions_analyzed,
        )
        .await;

    let message = if insights.enabled {
        "AI-enhanced recommendations"
    } else {
        "Algorithmic recommendations (Gemini not configured)"
    };

    Ok(Json(serde_json::json!({
        "crop": report.crop,
        "crop_details": report.crop_details,
        "recommendations": report.top_matches,
        "total_regions_analyzed": report.total_regions_analyzed,
        "ai_insights": insights,
        "message": message,
    })))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    region_name: Option<String>,
    crop_name: Option<String>,
    #[serde(default)]
    score: i32,
}

async fn analyze_region(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (region_name, crop_name) = match (request.region_name, request.crop_name) {
        (Some(r), Some(c)) if !r.trim().is_empty() && !c.trim().is_empty() => (r, c),
        _ => {
            return Err(AppError::BadRequest(
                "Both region_name and crop_name are required".to_string(),
            ))
        }
    };

    let region = state
        .service
        .find_region(&region_name)
        .map_err(|e| region_error(&region_name, e))?;
    let crop = state
        .service
        .find_crop(&crop_name)
        .map_err(|e| crop_error(&crop_name, e))?;

    let analysis = state
        .narrator
        .region_analysis(&crop.name, &CropDetails::from(&crop), &region, request.score)
        .await;

    Ok(Json(serde_json::json!({
        "region": region.name,
        "crop": crop.name,
        "score": request.score,
        "ai_insights": analysis,
    })))
}
