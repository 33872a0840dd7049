//! Session Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{
    CloseSessionCommand, GetSessionStatusQuery, OpenSessionCommand,
};
use crate::infrastructure::http::dto::{ApiResponse, PlaybackHandleDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Open
// ============================================================================

#[derive(Debug, Serialize)]
pub struct OpenSessionResponseDto {
    pub session_id: String,
}

pub async fn open_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<OpenSessionResponseDto>>, ApiError> {
    let result = state.open_session_handler.handle(OpenSessionCommand).await?;

    Ok(Json(ApiResponse::success(OpenSessionResponseDto {
        session_id: result.session_id,
    })))
}

// ============================================================================
// Close
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct CloseSessionResponseDto {
    pub session_id: String,
    pub released_playback: bool,
}

pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<CloseSessionResponseDto>>, ApiError> {
    let cmd = CloseSessionCommand {
        session_id: req.session_id,
    };

    let result = state.close_session_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(CloseSessionResponseDto {
        session_id: result.session_id,
        released_playback: result.released_playback,
    })))
}

// ============================================================================
// Status
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SessionStatusDto {
    pub session_id: String,
    pub generating: Option<String>,
    pub playback: Option<PlaybackHandleDto>,
    pub dialogue_cached: bool,
    pub created_at: String,
    pub last_activity: String,
}

pub async fn session_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<SessionStatusDto>>, ApiError> {
    let query = GetSessionStatusQuery {
        session_id: req.session_id,
    };

    let result = state.session_status_handler.handle(query).await?;

    Ok(Json(ApiResponse::success(SessionStatusDto {
        session_id: result.session_id,
        generating: result.generating.map(|t| t.to_string()),
        playback: result.playback.map(Into::into),
        dialogue_cached: result.dialogue_cached,
        created_at: result.created_at,
        last_activity: result.last_activity,
    })))
}
