//! Data Transfer Objects

use serde::Serialize;
use uuid::Uuid;

use crate::application::{GenerationResponse, PlaybackHandle};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self::success(Empty {})
    }
}

// ============================================================================
// Playback / Generation DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PlaybackHandleDto {
    pub handle_id: Uuid,
    pub url: String,
    pub size_bytes: usize,
}

impl From<PlaybackHandle> for PlaybackHandleDto {
    fn from(handle: PlaybackHandle) -> Self {
        Self {
            handle_id: handle.id,
            url: handle.url,
            size_bytes: handle.size_bytes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerationResponseDto {
    pub session_id: String,
    /// `line:{id}` 或 `dialogue`
    pub target: String,
    pub cache_key: String,
    pub model_id: String,
    /// `cache` 或 `generated`
    pub source: &'static str,
    pub from_cache: bool,
    pub playback: PlaybackHandleDto,
}

impl From<GenerationResponse> for GenerationResponseDto {
    fn from(resp: GenerationResponse) -> Self {
        Self {
            from_cache: resp.from_cache(),
            session_id: resp.session_id,
            target: resp.target.to_string(),
            cache_key: resp.cache_key,
            model_id: resp.model_id,
            source: resp.source.as_str(),
            playback: resp.playback.into(),
        }
    }
}
