//! HTTP endpoints for running analyses.

pub mod response;

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::filter::validate_target_url;
use crate::pipeline::{AnalysisRequest, Phase1Result, Pipeline, StepByStepResult, parse_frameworks};
use crate::results::{Availability, ComprehensiveAnalysisResult, FrameworkOutcome};
use response::{ApiJson, ApiResponse, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase2Request {
    #[serde(default)]
    pub url: String,
    pub phase1: Phase1Result,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub frameworks: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase3Request {
    #[serde(default)]
    pub url: String,
    pub phase1: Phase1Result,
    pub phase2: Vec<FrameworkOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase2Response {
    pub url: String,
    pub frameworks: Vec<FrameworkOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase3Response {
    pub url: String,
    pub insights: Availability<Value>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/analyze/comprehensive", post(comprehensive))
        .route("/api/analyze/phase1-complete", post(phase1_complete))
        .route("/api/analyze/phase2-frameworks", post(phase2_frameworks))
        .route("/api/analyze/phase3-complete", post(phase3_complete))
        .route("/api/analyze/step-by-step", post(step_by_step))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "browser": state.pipeline.has_browser(),
    }))
}

async fn comprehensive(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnalysisRequest>,
) -> ApiResult<ComprehensiveAnalysisResult> {
    let result = state.pipeline.comprehensive(&request).await?;
    Ok(ApiResponse::success(result))
}

async fn phase1_complete(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnalysisRequest>,
) -> ApiResult<Phase1Result> {
    let request = request.validate()?;
    let result = state.pipeline.phase1(&request).await?;
    Ok(ApiResponse::success(result))
}

async fn phase2_frameworks(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<Phase2Request>,
) -> ApiResult<Phase2Response> {
    let url = validate_target_url(&request.url)?;
    let frameworks = parse_frameworks(request.frameworks.as_deref())?;
    let keyword = request
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    let outcomes = state
        .pipeline
        .phase2(&request.phase1, &frameworks, keyword)
        .await;
    Ok(ApiResponse::success(Phase2Response {
        url: url.to_string(),
        frameworks: outcomes,
    }))
}

async fn phase3_complete(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<Phase3Request>,
) -> ApiResult<Phase3Response> {
    let url = validate_target_url(&request.url)?;
    let insights = state.pipeline.phase3(&request.phase1, &request.phase2).await;
    Ok(ApiResponse::success(Phase3Response {
        url: url.to_string(),
        insights,
    }))
}

async fn step_by_step(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnalysisRequest>,
) -> ApiResult<StepByStepResult> {
    let outcome = state.pipeline.step_by_step(&request).await?;
    if let Some(message) = outcome.fatal_error().map(str::to_string) {
        return Ok(ApiResponse::partial(outcome, message));
    }
    Ok(ApiResponse::success(outcome))
}

#[cfg(test)]
mod tests;
