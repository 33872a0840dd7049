//! Dialogue Context - Value Objects

use serde::{Deserialize, Serialize};

/// 全保真模型（唯一支持内联标签与对话接口）
pub const FULL_MODEL_ID: &str = "eleven_v3";

/// 快速模型（不支持内联标签）
pub const FAST_MODEL_ID: &str = "eleven_flash_v2_5";

/// 一个说话轮次
///
/// 由对话行与其说话人的音色解析而来，只在生成时临时计算，不单独持久化。
/// 字段顺序参与缓存 key 的规范化 JSON，不可调整。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueTurn {
    pub text: String,
    pub voice_id: String,
}

impl DialogueTurn {
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
        }
    }
}

/// 合成模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelMode {
    /// 低保真快速合成，剥离内联标签
    Fast,
    /// 全保真，保留内联标签
    #[default]
    Full,
}

impl ModelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Full => "full",
        }
    }

    pub fn is_fast(&self) -> bool {
        matches!(self, Self::Fast)
    }

    /// 每字符消耗的额度
    pub fn credits_per_char(&self) -> f64 {
        match self {
            Self::Fast => 0.5,
            Self::Full => 1.0,
        }
    }
}

impl std::fmt::Display for ModelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_serializes_camel_case() {
        let json = serde_json::to_string(&DialogueTurn::new("hi", "A")).unwrap();
        assert_eq!(json, r#"{"text":"hi","voiceId":"A"}"#);
    }

    #[test]
    fn test_model_mode_serde() {
        let mode: ModelMode = serde_json::from_str(r#""fast""#).unwrap();
        assert_eq!(mode, ModelMode::Fast);
        assert_eq!(ModelMode::default(), ModelMode::Full);
    }
}
