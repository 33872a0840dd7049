//! Cache Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{
    ClearCacheCommand, GetCacheStatsQuery, GetDialogueCacheStatusQuery,
    InvalidateCacheEntryCommand, SweepExpiredCacheCommand,
};
use crate::domain::dialogue::Dialogue;
use crate::infrastructure::http::dto::{ApiResponse, Empty};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Dialogue Status
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DialogueCacheStatusDto {
    pub cache_key: Option<String>,
    pub cached: bool,
}

pub async fn dialogue_cache_status(
    State(state): State<Arc<AppState>>,
    Json(dialogue): Json<Dialogue>,
) -> Result<Json<ApiResponse<DialogueCacheStatusDto>>, ApiError> {
    let result = state
        .dialogue_cache_status_handler
        .handle(GetDialogueCacheStatusQuery { dialogue })
        .await?;

    Ok(Json(ApiResponse::success(DialogueCacheStatusDto {
        cache_key: result.cache_key,
        cached: result.cached,
    })))
}

// ============================================================================
// Stats
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CacheStatsDto {
    pub entry_count: usize,
    pub total_size_bytes: u64,
}

pub async fn cache_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CacheStatsDto>>, ApiError> {
    let stats = state.cache_stats_handler.handle(GetCacheStatsQuery).await?;

    Ok(Json(ApiResponse::success(CacheStatsDto {
        entry_count: stats.entry_count,
        total_size_bytes: stats.total_size_bytes,
    })))
}

// ============================================================================
// Maintenance
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SweepResponseDto {
    pub removed: usize,
}

pub async fn sweep_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SweepResponseDto>>, ApiError> {
    let result = state
        .sweep_cache_handler
        .handle(SweepExpiredCacheCommand)
        .await?;

    Ok(Json(ApiResponse::success(SweepResponseDto {
        removed: result.removed,
    })))
}

pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.clear_cache_handler.handle(ClearCacheCommand).await?;
    Ok(Json(ApiResponse::ok()))
}

#[derive(Debug, Deserialize)]
pub struct DeleteCacheEntryRequest {
    pub cache_key: String,
}

pub async fn delete_cache_entry(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteCacheEntryRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    if req.cache_key.trim().is_empty() {
        return Err(ApiError::BadRequest("cache_key cannot be empty".to_string()));
    }

    state
        .invalidate_cache_handler
        .handle(InvalidateCacheEntryCommand {
            cache_key: req.cache_key,
        })
        .await?;

    Ok(Json(ApiResponse::ok()))
}
