//! Speech Synthesis Port - 语音合成引擎抽象
//!
//! 远程合成 API 的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::cache_key::DEFAULT_OUTPUT_FORMAT;
use crate::domain::dialogue::{DialogueTurn, FULL_MODEL_ID};

/// 合成错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("API key is not configured")]
    MissingApiKey,
}

/// 合成参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOptions {
    pub model_id: String,
    pub output_format: String,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            model_id: FULL_MODEL_ID.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }
}

impl SynthesisOptions {
    pub fn new(model_id: impl Into<String>, output_format: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            output_format: output_format.into(),
        }
    }
}

/// Speech Synthesis Port
#[async_trait]
pub trait SpeechSynthesisPort: Send + Sync {
    /// 单音色合成，不支持内联标签
    async fn synthesize_single(
        &self,
        text: &str,
        voice_id: &str,
        options: &SynthesisOptions,
    ) -> Result<Vec<u8>, SynthesisError>;

    /// 多说话人对话合成，唯一支持内联标签的路径
    async fn synthesize_dialogue(
        &self,
        turns: &[DialogueTurn],
        options: &SynthesisOptions,
    ) -> Result<Vec<u8>, SynthesisError>;

    /// 检查合成服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
