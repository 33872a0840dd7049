//! Dialogue Context - Entities
//!
//! 文档层提供的只读投影，核心不修改这些实体

use serde::{Deserialize, Serialize};

/// 对话行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueLine {
    pub id: String,
    /// 包含内联标签的完整文本，如 `[excited] Hello!`
    pub text: String,
    pub speaker_id: String,
}

impl DialogueLine {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        speaker_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            speaker_id: speaker_id.into(),
        }
    }
}

/// 说话人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// 分配的音色，空字符串视为未分配
    #[serde(default)]
    pub voice_id: String,
}

impl Speaker {
    pub fn new(id: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            voice_id: voice_id.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 已分配的音色
    pub fn assigned_voice(&self) -> Option<&str> {
        let voice = self.voice_id.trim();
        if voice.is_empty() {
            None
        } else {
            Some(&self.voice_id)
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}
