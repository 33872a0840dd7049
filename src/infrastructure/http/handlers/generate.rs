//! Generate Handlers
//!
//! 请求携带文档层的只读投影（lines + speakers），服务端不保存文档

use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::application::{GenerateDialogueCommand, GenerateLineCommand};
use crate::domain::dialogue::{Dialogue, ModelMode};
use crate::infrastructure::http::dto::{ApiResponse, GenerationResponseDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Line
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateLineRequest {
    pub session_id: String,
    #[serde(flatten)]
    pub dialogue: Dialogue,
    pub line_id: String,
    #[serde(default)]
    pub mode: ModelMode,
}

pub async fn generate_line(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateLineRequest>,
) -> Result<Json<ApiResponse<GenerationResponseDto>>, ApiError> {
    let cmd = GenerateLineCommand {
        session_id: req.session_id,
        dialogue: req.dialogue,
        line_id: req.line_id,
        mode: req.mode,
    };

    let result = state.generate_line_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(result.into())))
}

// ============================================================================
// Dialogue
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateDialogueRequest {
    pub session_id: String,
    #[serde(flatten)]
    pub dialogue: Dialogue,
    #[serde(default)]
    pub mode: ModelMode,
}

pub async fn generate_dialogue(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateDialogueRequest>,
) -> Result<Json<ApiResponse<GenerationResponseDto>>, ApiError> {
    let cmd = GenerateDialogueCommand {
        session_id: req.session_id,
        dialogue: req.dialogue,
        mode: req.mode,
    };

    let result = state.generate_dialogue_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(result.into())))
}
