//! Playback Port - 可播放句柄管理
//!
//! 把二进制音频物化为可播放句柄（通过 URL 访问），并负责释放与自动播放调度

use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// 音频来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSource {
    /// 缓存命中
    Cache,
    /// 新生成
    Generated,
}

impl AudioSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Generated => "generated",
        }
    }
}

/// 可播放句柄
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackHandle {
    pub id: Uuid,
    pub url: String,
    pub size_bytes: usize,
}

/// Playback Port
///
/// 每个句柄持有一份音频；替换或会话结束时必须释放，避免资源累积
pub trait PlaybackPort: Send + Sync {
    /// 物化可播放句柄
    fn materialize(&self, audio_data: Vec<u8>) -> PlaybackHandle;

    /// 释放句柄（幂等）
    fn revoke(&self, handle_id: Uuid);

    /// 读取句柄的音频
    fn fetch(&self, handle_id: Uuid) -> Option<Vec<u8>>;

    /// 句柄是否仍然有效
    fn is_live(&self, handle_id: Uuid) -> bool;

    /// 延迟后请求会话自动播放；句柄届时已释放则跳过
    fn schedule_autoplay(
        &self,
        session_id: &str,
        handle: &PlaybackHandle,
        source: AudioSource,
        delay: Duration,
    );

    /// 当前持有的句柄数量
    fn live_count(&self) -> usize;
}
