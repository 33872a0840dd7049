//! Generate Commands - 音频生成命令

use crate::application::ports::{AudioSource, GenerationTarget, PlaybackHandle};
use crate::domain::dialogue::{Dialogue, ModelMode};

/// 生成单行音频命令
#[derive(Debug, Clone)]
pub struct GenerateLineCommand {
    pub session_id: String,
    pub dialogue: Dialogue,
    pub line_id: String,
    pub mode: ModelMode,
}

/// 生成整段对话音频命令（始终使用完整模型）
#[derive(Debug, Clone)]
pub struct GenerateDialogueCommand {
    pub session_id: String,
    pub dialogue: Dialogue,
    pub mode: ModelMode,
}

/// 生成响应
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub session_id: String,
    pub target: GenerationTarget,
    pub cache_key: String,
    pub model_id: String,
    pub source: AudioSource,
    pub playback: PlaybackHandle,
}

impl GenerationResponse {
    pub fn from_cache(&self) -> bool {
        self.source == AudioSource::Cache
    }
}
