//! 缓存 key 构建器
//!
//! 把 (text, voice, model, output format) 或有序的多轮对话转换为规范化 key：
//! `audio:<kind>:v<version>:<hex>`
//!
//! 负载结构体的字段声明顺序即序列化顺序，serde_json 按声明顺序输出，
//! 因此同一请求在任何进程中得到相同的 JSON 文本和相同的 key。

use serde::Serialize;
use thiserror::Error;

use super::hasher::{hash_hex_with, Digester, Sha256Digester};
use crate::domain::dialogue::DialogueTurn;

/// key 派生算法的 schema 版本，负载结构不兼容变更时递增
pub const CACHE_KEY_VERSION: u32 = 1;

/// 未指定时使用的输出格式
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3_44100_128";

/// 缓存 key 构建错误
#[derive(Debug, Error)]
pub enum CacheKeyError {
    #[error("Failed to serialize cache key payload: {0}")]
    Serialization(String),
}

/// 缓存 key 种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKeyKind {
    Line,
    Dialogue,
}

impl CacheKeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Dialogue => "dialogue",
        }
    }
}

#[derive(Serialize)]
struct LineKeyPayload<'a> {
    v: u32,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "modelId")]
    model_id: &'a str,
    #[serde(rename = "outputFormat")]
    output_format: &'a str,
    #[serde(rename = "voiceId")]
    voice_id: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct DialogueKeyPayload<'a> {
    v: u32,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(rename = "modelId")]
    model_id: &'a str,
    #[serde(rename = "outputFormat")]
    output_format: &'a str,
    turns: &'a [DialogueTurn],
}

/// 缓存 key 构建器
///
/// 持有摘要器，默认 SHA-256
pub struct CacheKeyBuilder {
    digester: Box<dyn Digester>,
}

impl Default for CacheKeyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheKeyBuilder {
    pub fn new() -> Self {
        Self {
            digester: Box::new(Sha256Digester),
        }
    }

    /// 使用自定义摘要器
    pub fn with_digester(digester: Box<dyn Digester>) -> Self {
        Self { digester }
    }

    /// 单行 key
    pub fn line_key(
        &self,
        text: &str,
        voice_id: &str,
        model_id: &str,
        output_format: Option<&str>,
    ) -> Result<String, CacheKeyError> {
        let payload = LineKeyPayload {
            v: CACHE_KEY_VERSION,
            kind: CacheKeyKind::Line.as_str(),
            model_id,
            output_format: output_format.unwrap_or(DEFAULT_OUTPUT_FORMAT),
            voice_id,
            text,
        };
        let json = serde_json::to_string(&payload)
            .map_err(|e| CacheKeyError::Serialization(e.to_string()))?;
        Ok(self.format_key(CacheKeyKind::Line, &json))
    }

    /// 整段对话 key，turns 顺序即说话顺序，参与 key 计算
    pub fn dialogue_key(
        &self,
        turns: &[DialogueTurn],
        model_id: &str,
        output_format: Option<&str>,
    ) -> Result<String, CacheKeyError> {
        let payload = DialogueKeyPayload {
            v: CACHE_KEY_VERSION,
            kind: CacheKeyKind::Dialogue.as_str(),
            model_id,
            output_format: output_format.unwrap_or(DEFAULT_OUTPUT_FORMAT),
            turns,
        };
        let json = serde_json::to_string(&payload)
            .map_err(|e| CacheKeyError::Serialization(e.to_string()))?;
        Ok(self.format_key(CacheKeyKind::Dialogue, &json))
    }

    fn format_key(&self, kind: CacheKeyKind, canonical_json: &str) -> String {
        format!(
            "audio:{}:v{}:{}",
            kind.as_str(),
            CACHE_KEY_VERSION,
            hash_hex_with(self.digester.as_ref(), canonical_json)
        )
    }
}

/// 使用默认构建器生成单行 key
pub fn build_line_key(
    text: &str,
    voice_id: &str,
    model_id: &str,
    output_format: Option<&str>,
) -> Result<String, CacheKeyError> {
    CacheKeyBuilder::new().line_key(text, voice_id, model_id, output_format)
}

/// 使用默认构建器生成对话 key
pub fn build_dialogue_key(
    turns: &[DialogueTurn],
    model_id: &str,
    output_format: Option<&str>,
) -> Result<String, CacheKeyError> {
    CacheKeyBuilder::new().dialogue_key(turns, model_id, output_format)
}
