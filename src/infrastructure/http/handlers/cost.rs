//! Cost Handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::application::EstimateDialogueCostQuery;
use crate::domain::audio_tags::CostEstimate;
use crate::domain::dialogue::{DialogueLine, ModelMode};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EstimateCostRequest {
    #[serde(default)]
    pub lines: Vec<DialogueLine>,
    #[serde(default)]
    pub mode: ModelMode,
}

pub async fn estimate_cost(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EstimateCostRequest>,
) -> Result<Json<ApiResponse<CostEstimate>>, ApiError> {
    let query = EstimateDialogueCostQuery {
        lines: req.lines,
        mode: req.mode,
    };

    let estimate = state.estimate_cost_handler.handle(query).await?;

    Ok(Json(ApiResponse::success(estimate)))
}
