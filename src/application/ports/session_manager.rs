//! Session Manager Port - 编辑会话管理
//!
//! 每个会话拥有一个编排器实例的内存状态：当前播放句柄、进行中的生成、
//! 整段对话是否已缓存。生命周期与编辑会话一致，不持久化。

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::PlaybackHandle;

/// 会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session already exists: {0}")]
    AlreadyExists(String),
}

/// 生成目标
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenerationTarget {
    Line(String),
    Dialogue,
}

impl std::fmt::Display for GenerationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Line(line_id) => write!(f, "line:{}", line_id),
            Self::Dialogue => f.write_str("dialogue"),
        }
    }
}

/// 生成状态机
///
/// Idle → KeyBuilding → CacheProbe → (Ready | Generating → Storing → Ready)，
/// KeyBuilding 到 Generating 之间任一步可进入 Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Idle,
    KeyBuilding,
    CacheProbe,
    Generating,
    Storing,
    Ready,
    Failed,
}

impl GenerationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::KeyBuilding => "key_building",
            Self::CacheProbe => "cache_probe",
            Self::Generating => "generating",
            Self::Storing => "storing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// 会话
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    /// 进行中的生成目标
    pub generating: Option<GenerationTarget>,
    /// 当前播放句柄
    pub playback: Option<PlaybackHandle>,
    /// 最近一次整段生成是否已写入缓存
    pub dialogue_cached: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            generating: None,
            playback: None,
            dialogue_cached: false,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.generating.is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Session Manager Port
pub trait SessionManagerPort: Send + Sync {
    fn create(&self, session: Session) -> Result<String, SessionError>;

    fn get(&self, id: &str) -> Result<Session, SessionError>;

    fn is_valid(&self, id: &str) -> bool;

    /// 关闭会话，返回被移除的会话以便释放其资源
    fn close(&self, id: &str) -> Result<Session, SessionError>;

    fn touch(&self, id: &str);

    /// 设置进行中的生成目标（None 表示空闲）
    fn set_generating(&self, id: &str, target: Option<GenerationTarget>) -> Result<(), SessionError>;

    /// 安装新的播放句柄，返回被替换的旧句柄
    fn replace_playback(
        &self,
        id: &str,
        handle: PlaybackHandle,
    ) -> Result<Option<PlaybackHandle>, SessionError>;

    fn set_dialogue_cached(&self, id: &str, cached: bool) -> Result<(), SessionError>;

    /// 获取空闲超时的会话
    fn get_expired_sessions(&self, idle_timeout_secs: u64) -> Vec<String>;

    fn list_all(&self) -> Vec<String>;
}
