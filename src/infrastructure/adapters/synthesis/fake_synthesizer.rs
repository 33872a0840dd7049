//! Fake Speech Synthesizer - 用于测试和离线运行的合成器
//!
//! 不访问网络，按输入确定性地生成音频字节，并记录每次调用

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

use crate::application::ports::{SpeechSynthesisPort, SynthesisError, SynthesisOptions};
use crate::domain::dialogue::DialogueTurn;

/// MPEG 帧头，便于客户端识别为 mp3
const FAKE_FRAME_HEADER: [u8; 4] = [0xff, 0xfb, 0x90, 0x64];

/// 记录的合成调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisCall {
    Single {
        text: String,
        voice_id: String,
        model_id: String,
    },
    Dialogue {
        turns: Vec<DialogueTurn>,
        model_id: String,
    },
}

/// Fake Speech Synthesizer
#[derive(Default)]
pub struct FakeSpeechSynthesizer {
    calls: Mutex<Vec<SynthesisCall>>,
    failure: Mutex<Option<String>>,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
}

impl FakeSpeechSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 模拟合成延迟
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 每次合成都等待 gate 放行后再返回
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 设置后续调用的失败信息（None 恢复正常）
    pub async fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock().await = message.map(str::to_string);
    }

    pub async fn calls(&self) -> Vec<SynthesisCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// 与 synthesize_* 返回值相同的确定性音频
    pub fn render(model_id: &str, output_format: &str, parts: &[(&str, &str)]) -> Vec<u8> {
        let mut audio = FAKE_FRAME_HEADER.to_vec();
        audio.extend_from_slice(model_id.as_bytes());
        audio.push(b'|');
        audio.extend_from_slice(output_format.as_bytes());
        for (text, voice_id) in parts {
            audio.push(b'|');
            audio.extend_from_slice(voice_id.as_bytes());
            audio.push(b':');
            audio.extend_from_slice(text.as_bytes());
        }
        audio
    }

    async fn simulate(&self, call: SynthesisCall) -> Result<(), SynthesisError> {
        self.calls.lock().await.push(call);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match self.failure.lock().await.as_ref() {
            Some(message) => Err(SynthesisError::ServiceError(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SpeechSynthesisPort for FakeSpeechSynthesizer {
    async fn synthesize_single(
        &self,
        text: &str,
        voice_id: &str,
        options: &SynthesisOptions,
    ) -> Result<Vec<u8>, SynthesisError> {
        tracing::debug!(
            voice_id = %voice_id,
            text_len = text.len(),
            "FakeSpeechSynthesizer: single"
        );

        self.simulate(SynthesisCall::Single {
            text: text.to_string(),
            voice_id: voice_id.to_string(),
            model_id: options.model_id.clone(),
        })
        .await?;

        Ok(Self::render(
            &options.model_id,
            &options.output_format,
            &[(text, voice_id)],
        ))
    }

    async fn synthesize_dialogue(
        &self,
        turns: &[DialogueTurn],
        options: &SynthesisOptions,
    ) -> Result<Vec<u8>, SynthesisError> {
        tracing::debug!(lines = turns.len(), "FakeSpeechSynthesizer: dialogue");

        self.simulate(SynthesisCall::Dialogue {
            turns: turns.to_vec(),
            model_id: options.model_id.clone(),
        })
        .await?;

        let parts: Vec<(&str, &str)> = turns
            .iter()
            .map(|t| (t.text.as_str(), t.voice_id.as_str()))
            .collect();
        Ok(Self::render(&options.model_id, &options.output_format, &parts))
    }
}
