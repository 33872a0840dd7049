//! Playback Handlers

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::GetPlaybackAudioQuery;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 返回句柄对应的原始音频
pub async fn get_playback_audio(
    State(state): State<Arc<AppState>>,
    Path(handle_id): Path<String>,
) -> Result<Response, ApiError> {
    let handle_id = Uuid::parse_str(&handle_id)
        .map_err(|_| ApiError::NotFound(format!("Playback not found: {}", handle_id)))?;

    let result = state
        .playback_audio_handler
        .handle(GetPlaybackAudioQuery { handle_id })
        .await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type)
        .header(header::CONTENT_LENGTH, result.audio_data.len())
        .body(Body::from(result.audio_data))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
