//! Narrative Insights - Optional LLM enrichment with algorithmic fallback
//!
//! The Gemini text endpoint is an untrusted collaborator: it may be
//! unconfigured, slow, or down. Every narrative entry point therefore
//! computes a deterministic fallback from the already-ranked matches before
//! touching the network, and a failed generation call degrades to that
//! fallback instead of failing the request. Core ranking never waits on
//! this module.

use crate::data::RegionRecord;
use crate::service::{CropDetails, DetailedMatch};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("text generation unavailable: no API key configured")]
    Disabled,

    #[error("text generation request failed: {0}")]
    Request(String),

    #[error("text generation returned an unexpected response shape")]
    MalformedResponse,
}

/// Capability interface for external text generation.
///
/// Injected rather than global so the API layer can run without any AI
/// backing and tests can substitute a canned generator.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, NarrativeError>;
}

// ============================================================================
// Gemini Client
// ============================================================================

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Gemini REST client. One instance per process, cheap to clone.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self, NarrativeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| NarrativeError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: GEMINI_MODEL.to_string(),
        })
    }

    /// Build a client from `GEMINI_API_KEY`, or None when unset.
    pub fn from_env() -> Option<Self> {
        match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => match Self::new(key) {
                Ok(client) => {
                    tracing::info!("Gemini narrative client initialized ({})", GEMINI_MODEL);
                    Some(client)
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize Gemini client: {}", e);
                    None
                }
            },
            _ => {
                tracing::info!("GEMINI_API_KEY not set - narrative endpoints use fallback text");
                None
            }
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, NarrativeError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_ENDPOINT, self.model, self.api_key
        );

        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NarrativeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let truncated: String = detail.chars().take(512).collect();
            return Err(NarrativeError::Request(format!(
                "{} from Gemini - {}",
                status, truncated
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NarrativeError::Request(e.to_string()))?;

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or(NarrativeError::MalformedResponse)
    }
}

// ============================================================================
// Insight Shapes
// ============================================================================

/// Recommendation-level insights for a full match report.
#[derive(Debug, Clone, Serialize)]
pub struct AiInsights {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Region-focused analysis for one crop/region/score triple.
#[derive(Debug, Clone, Serialize)]
pub struct RegionAnalysis {
    pub enabled: bool,
    pub analysis: String,
    pub recommendation_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn recommendation_level(score: i32) -> &'static str {
    if score >= 5 {
        "highly_recommended"
    } else if score >= 3 {
        "recommended"
    } else if score >= 0 {
        "challenging"
    } else {
        "not_recommended"
    }
}

// ============================================================================
// Narrator
// ============================================================================

/// Front door for narrative generation. Holds an optional generator; all
/// methods return usable text whether or not one is configured.
pub struct Narrator {
    generator: Option<Box<dyn TextGenerator>>,
}

impl Narrator {
    pub fn new(generator: Option<Box<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub fn disabled() -> Self {
        Self { generator: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Narrative insights for a ranked match report. The fallback text is
    /// computed first so a failed LLM call can never lose the result.
    pub async fn crop_insights(
        &self,
        crop_name: &str,
        crop_details: &CropDetails,
        matches: &[DetailedMatch],
        total_regions: usize,
    ) -> AiInsights {
        let fallback = fallback_insights(crop_name, matches, total_regions);

        let Some(generator) = &self.generator else {
            return AiInsights {
                enabled: false,
                insights: None,
                message: Some(
                    "Gemini AI not configured. Using algorithmic recommendations.".to_string(),
                ),
                error: None,
                recommendation: Some(fallback),
            };
        };

        let prompt = build_recommendation_prompt(crop_name, crop_details, matches);
        match generator.generate_text(&prompt).await {
            Ok(text) => AiInsights {
                enabled: true,
                insights: Some(text),
                message: None,
                error: None,
                recommendation: None,
            },
            Err(e) => {
                tracing::warn!("Narrative generation failed: {}", e);
                AiInsights {
                    enabled: false,
                    insights: None,
                    message: None,
                    error: Some(e.to_string()),
                    recommendation: Some(fallback),
                }
            }
        }
    }

    /// Focused analysis of one region for one crop, given its score.
    pub async fn region_analysis(
        &self,
        crop_name: &str,
        crop_details: &CropDetails,
        region: &RegionRecord,
        score: i32,
    ) -> RegionAnalysis {
        let fallback = fallback_region_analysis(crop_name, region, score);
        let level = recommendation_level(score).to_string();

        let Some(generator) = &self.generator else {
            return RegionAnalysis {
                enabled: false,
                analysis: fallback,
                recommendation_level: level,
                error: None,
            };
        };

        let prompt = build_region_prompt(crop_name, crop_details, region, score);
        match generator.generate_text(&prompt).await {
            Ok(text) => RegionAnalysis {
                enabled: true,
                analysis: text,
                recommendation_level: level,
                error: None,
            },
            Err(e) => {
                tracing::warn!("Region analysis generation failed: {}", e);
                RegionAnalysis {
                    enabled: false,
                    analysis: fallback,
                    recommendation_level: level,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

// ============================================================================
// Prompt Builders
// ============================================================================

fn build_recommendation_prompt(
    crop_name: &str,
    details: &CropDetails,
    matches: &[DetailedMatch],
) -> String {
    let mut prompt = format!(
        "You are an expert in Mars agriculture and terraforming. Analyze the following data and provide insights.\n\n\
         CROP: {crop_name}\n\
         REQUIREMENTS:\n\
         - pH Range: {}\n\
         - Soil Texture: {}\n\
         - Temperature Range: {}\n\
         - Moisture Regime: {}\n\n\
         TOP RECOMMENDED REGIONS:\n",
        or_unknown(&details.preferred_ph_range),
        or_unknown(&details.soil_texture),
        or_unknown(&details.temperature_range),
        or_unknown(&details.moisture_regime),
    );

    for (idx, m) in matches.iter().take(5).enumerate() {
        let reasons: Vec<&str> = m.reasons.iter().take(3).map(|s| s.as_str()).collect();
        prompt.push_str(&format!(
            "\n{}. {} (Score: {})\n   Reasons: {}\n",
            idx + 1,
            m.region_name,
            m.score,
            reasons.join(", ")
        ));
    }

    prompt.push_str(
        "\n\nPlease provide:\n\
         1. A brief summary of why these regions are suitable for this crop\n\
         2. Key challenges to address for successful cultivation\n\
         3. Specific recommendations for soil preparation and environmental control\n\
         4. Estimated success probability for each of the top 3 regions\n\n\
         Keep the response concise and actionable for Mars colonization planners.\n",
    );

    prompt
}

fn build_region_prompt(
    crop_name: &str,
    details: &CropDetails,
    region: &RegionRecord,
    score: i32,
) -> String {
    format!(
        "You are an expert in Mars agriculture and terraforming. Analyze this specific Martian region for growing {crop_name}.\n\n\
         REGION: {}\n\
         COMPATIBILITY SCORE: {score}/10\n\n\
         CROP REQUIREMENTS:\n\
         - pH Range: {}\n\
         - Soil Texture: {}\n\
         - Temperature: {}\n\
         - Moisture: {}\n\n\
         REGION CONDITIONS:\n\
         - Location: {}, {}\n\
         - Elevation: {} m\n\
         - pH: {}\n\
         - Perchlorate Level: {}%\n\
         - Water Content: {}%\n\
         - Terrain: {}\n\
         - Minerals: {}\n\
         - Notes: {}\n\n\
         Provide a focused analysis (200-300 words) covering:\n\
         1. **Why This Score?** - Explain the compatibility score in context\n\
         2. **Key Advantages** - What makes this region suitable (2-3 points)\n\
         3. **Main Challenges** - Critical issues to address (2-3 points)\n\
         4. **Success Factors** - What would make cultivation succeed here\n\
         5. **Bottom Line** - Clear recommendation (Highly Recommended / Recommended with Preparation / Challenging / Not Recommended)\n\n\
         Be specific, actionable, and focus on Mars colonization practicality.",
        region.name,
        or_unknown(&details.preferred_ph_range),
        or_unknown(&details.soil_texture),
        or_unknown(&details.temperature_range),
        or_unknown(&details.moisture_regime),
        or_unknown(&region.latitude),
        or_unknown(&region.longitude),
        or_unknown(&region.elevation),
        or_unknown(&region.ph),
        or_unknown(&region.perchlorate_wt_pct),
        or_unknown(&region.water_release_wt_pct),
        or_unknown(&region.terrain_type),
        or_unknown(&region.major_minerals),
        if region.notes.is_empty() { "None" } else { &region.notes },
    )
}

fn or_unknown(text: &str) -> &str {
    if text.is_empty() {
        "Unknown"
    } else {
        text
    }
}

// ============================================================================
// Deterministic Fallbacks
// ============================================================================

/// Score-threshold insight text used whenever the LLM is absent or fails.
pub fn fallback_insights(crop_name: &str, matches: &[DetailedMatch], total_regions: usize) -> String {
    let Some(top) = matches.first() else {
        return format!(
            "No suitable regions found for {crop_name}. Consider environmental modifications or alternative crops."
        );
    };

    let (quality, outlook) = if top.score >= 5 {
        ("excellent", "Highly recommended")
    } else if top.score >= 3 {
        ("good", "Recommended with moderate preparation")
    } else if top.score >= 0 {
        ("moderate", "Possible with significant soil treatment")
    } else {
        ("poor", "Not recommended without extensive terraforming")
    };

    let advantages: Vec<&str> = top.reasons.iter().take(2).map(|s| s.as_str()).collect();

    format!(
        "Based on analysis of {total_regions} Martian regions, {crop_name} shows {quality} compatibility with the identified locations.\n\n\
         TOP RECOMMENDATION: {}\n\
         - Compatibility Score: {}/10\n\
         - Key advantages: {}\n\n\
         CULTIVATION OUTLOOK: {outlook}\n\n\
         NEXT STEPS:\n\
         1. Conduct detailed soil analysis for perchlorate and heavy metal content\n\
         2. Plan irrigation systems based on local water availability\n\
         3. Design environmental control systems for temperature and humidity regulation\n\
         4. Establish nutrient supplementation protocols\n\n\
         For best results, consider implementing controlled environment agriculture (CEA) with Martian regolith enrichment.",
        top.region_name,
        top.score,
        advantages.join(", "),
    )
}

/// Region-focused fallback text mirroring the AI analysis structure.
pub fn fallback_region_analysis(crop_name: &str, region: &RegionRecord, score: i32) -> String {
    let (recommendation, outlook) = if score >= 5 {
        ("Highly Recommended", "excellent")
    } else if score >= 3 {
        ("Recommended with Moderate Preparation", "good")
    } else if score >= 0 {
        ("Challenging - Significant Preparation Required", "challenging")
    } else {
        ("Not Recommended", "poor")
    };

    format!(
        "**{} - Compatibility Score: {score}/10**\n\n\
         **Overall Assessment:** This region shows {outlook} potential for {crop_name} cultivation based on our analysis.\n\n\
         **Key Factors:**\n\
         - Location: {}\n\
         - Terrain: {}\n\
         - pH Level: {}\n\
         - Water Availability: {}%\n\n\
         **Recommendation:** {recommendation}\n\n\
         **Note:** For detailed AI-powered insights, ensure Gemini API is configured.",
        region.name,
        or_unknown(&region.latitude),
        or_unknown(&region.terrain_type),
        or_unknown(&region.ph),
        or_unknown(&region.water_release_wt_pct),
    )
}
