//! Session Queries - 会话与播放查询

use uuid::Uuid;

use crate::application::ports::{GenerationTarget, PlaybackHandle};

/// 会话状态查询
#[derive(Debug, Clone)]
pub struct GetSessionStatusQuery {
    pub session_id: String,
}

/// 会话状态响应
#[derive(Debug, Clone)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub generating: Option<GenerationTarget>,
    pub playback: Option<PlaybackHandle>,
    pub dialogue_cached: bool,
    pub created_at: String,
    pub last_activity: String,
}

/// 读取播放句柄音频
#[derive(Debug, Clone)]
pub struct GetPlaybackAudioQuery {
    pub handle_id: Uuid,
}

/// 播放音频响应
#[derive(Debug, Clone)]
pub struct PlaybackAudioResponse {
    pub audio_data: Vec<u8>,
    pub content_type: String,
}
