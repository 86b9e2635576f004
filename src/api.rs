use std::time::Duration;

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::config::BackendConfig;
use crate::error::{Result, SnipError};
use crate::overlay::CaptureImage;

const FALLBACK_REASONING: &str =
    "Error connecting to server. Please check your internet connection.";
const DEFAULT_REASONING: &str = "No reasoning provided.";

/// The fixed result shape every analysis resolves to, success or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Trust score, 0-100.
    pub score: f64,
    pub reasoning: String,
    pub sources: Vec<String>,
}

impl AnalysisResult {
    /// The low-confidence result substituted whenever the backend call fails.
    /// Keeps the UI out of a no-result error state.
    pub fn fallback() -> Self {
        Self {
            score: 0.0,
            reasoning: FALLBACK_REASONING.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Backend response with every field optional; partially-populated responses
/// map to defaults instead of failing.
#[derive(Debug, Deserialize)]
struct BackendResponse {
    score: Option<f64>,
    reasoning: Option<String>,
    sources: Option<Sources>,
    #[allow(dead_code)]
    error: Option<String>,
}

/// The text-path backend sometimes returns a lone string for `sources`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Sources {
    One(String),
    Many(Vec<String>),
}

impl From<Sources> for Vec<String> {
    fn from(sources: Sources) -> Self {
        match sources {
            Sources::One(s) => vec![s],
            Sources::Many(v) => v,
        }
    }
}

/// Map a successful response body into a result, defaulting missing fields.
fn parse_backend_response(body: &str) -> Result<AnalysisResult> {
    let response: BackendResponse =
        serde_json::from_str(body).map_err(|e| SnipError::Transport(e.to_string()))?;

    Ok(AnalysisResult {
        score: response.score.unwrap_or(0.0),
        reasoning: response
            .reasoning
            .unwrap_or_else(|| DEFAULT_REASONING.to_string()),
        sources: response.sources.map(Vec::from).unwrap_or_default(),
    })
}

/// Seam between the orchestrator and the remote backend. Infallible by
/// contract: failures degrade to `AnalysisResult::fallback()`.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze_image(&self, image: &CaptureImage) -> AnalysisResult;
    async fn analyze_text(&self, text: &str) -> AnalysisResult;
}

/// HTTP client for the trust-score backend.
pub struct AnalysisClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AnalysisClient {
    pub fn new(config: &BackendConfig) -> AnyResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    async fn post(&self, body: serde_json::Value) -> Result<AnalysisResult> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SnipError::Timeout
                } else {
                    SnipError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SnipError::Backend {
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| SnipError::Transport(e.to_string()))?;
        parse_backend_response(&text)
    }

    async fn post_or_fallback(&self, body: serde_json::Value) -> AnalysisResult {
        match self.post(body).await {
            Ok(result) => {
                info!("analysis complete, score {}", result.score);
                result
            }
            Err(e) => {
                error!("analysis request failed: {}", e);
                AnalysisResult::fallback()
            }
        }
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze_image(&self, image: &CaptureImage) -> AnalysisResult {
        let body = json!({
            "file": image.base64_payload(),
            "type": "image",
        });
        self.post_or_fallback(body).await
    }

    async fn analyze_text(&self, text: &str) -> AnalysisResult {
        self.post_or_fallback(json!({ "text": text })).await
    }
}
