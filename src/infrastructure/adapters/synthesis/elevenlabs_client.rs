//! ElevenLabs Client - 调用远程语音合成 API
//!
//! 实现 SpeechSynthesisPort trait
//!
//! 远程 API:
//! POST {base_url}/v1/text-to-speech/{voice_id}?output_format=...  (voice_id 按路径段转义)
//! Request: {"text": "...", "model_id": "..."}  (JSON)
//! POST {base_url}/v1/text-to-dialogue?output_format=...
//! Request: {"inputs": [{"text": "...", "voice_id": "..."}], "model_id": "..."}  (JSON)
//! Response: 音频二进制

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{SpeechSynthesisPort, SynthesisError, SynthesisOptions};
use crate::domain::dialogue::DialogueTurn;

const API_KEY_HEADER: &str = "xi-api-key";

/// 单音色合成请求体
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// 对话合成请求体
#[derive(Debug, Serialize)]
struct DialogueRequest<'a> {
    inputs: Vec<DialogueInput<'a>>,
    model_id: &'a str,
}

#[derive(Debug, Serialize)]
struct DialogueInput<'a> {
    text: &'a str,
    voice_id: &'a str,
}

/// ElevenLabs 客户端配置
#[derive(Debug, Clone)]
pub struct ElevenLabsClientConfig {
    /// API 基础 URL
    pub base_url: String,
    /// API key
    pub api_key: String,
    /// 请求超时时间（秒），长对话需要更长
    pub timeout_secs: u64,
}

impl Default for ElevenLabsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: String::new(),
            timeout_secs: 240,
        }
    }
}

impl ElevenLabsClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// ElevenLabs 客户端
pub struct ElevenLabsClient {
    client: Client,
    config: ElevenLabsClientConfig,
}

impl ElevenLabsClient {
    /// 创建新的客户端，API key 不能为空
    pub fn new(mut config: ElevenLabsClientConfig) -> Result<Self, SynthesisError> {
        config.api_key = config.api_key.trim().to_string();
        if config.api_key.is_empty() {
            return Err(SynthesisError::MissingApiKey);
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SynthesisError::NetworkError(e.to_string()))?;

        tracing::info!(
            base_url = %config.base_url,
            timeout_secs = config.timeout_secs,
            "ElevenLabs client initialized"
        );

        Ok(Self { client, config })
    }

    /// voice_id 作为单个路径段写入，`/`、`?` 等字符会被转义
    fn speech_url(&self, voice_id: &str) -> Result<Url, SynthesisError> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            SynthesisError::NetworkError(format!("Invalid base URL {}: {}", self.config.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                SynthesisError::NetworkError(format!(
                    "Base URL cannot carry a path: {}",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["v1", "text-to-speech", voice_id]);
        Ok(url)
    }

    fn dialogue_url(&self) -> String {
        format!("{}/v1/text-to-dialogue", self.config.base_url)
    }

    fn user_url(&self) -> String {
        format!("{}/v1/user", self.config.base_url)
    }

    /// 发送请求并读取音频
    async fn send_for_audio(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<Vec<u8>, SynthesisError> {
        let started = std::time::Instant::now();

        let response = request
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout
                } else if e.is_connect() {
                    SynthesisError::NetworkError(format!(
                        "Cannot connect to synthesis service: {}",
                        e
                    ))
                } else {
                    SynthesisError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                endpoint = endpoint,
                status = %status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Synthesis request rejected"
            );
            return Err(SynthesisError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if audio_data.is_empty() {
            return Err(SynthesisError::InvalidResponse(
                "Empty audio payload".to_string(),
            ));
        }

        tracing::info!(
            endpoint = endpoint,
            audio_size = audio_data.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Synthesis completed"
        );

        Ok(audio_data)
    }
}

#[async_trait]
impl SpeechSynthesisPort for ElevenLabsClient {
    async fn synthesize_single(
        &self,
        text: &str,
        voice_id: &str,
        options: &SynthesisOptions,
    ) -> Result<Vec<u8>, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::InvalidInput("Text cannot be empty".to_string()));
        }
        if voice_id.trim().is_empty() {
            return Err(SynthesisError::InvalidInput("Voice ID is required".to_string()));
        }

        tracing::debug!(
            voice_id = %voice_id,
            model_id = %options.model_id,
            text_len = text.chars().count(),
            "Sending text-to-speech request"
        );

        let request = self
            .client
            .post(self.speech_url(voice_id)?)
            .query(&[("output_format", options.output_format.as_str())])
            .json(&SpeechRequest {
                text,
                model_id: &options.model_id,
            });

        self.send_for_audio(request, "text-to-speech").await
    }

    async fn synthesize_dialogue(
        &self,
        turns: &[DialogueTurn],
        options: &SynthesisOptions,
    ) -> Result<Vec<u8>, SynthesisError> {
        if turns.is_empty() {
            return Err(SynthesisError::InvalidInput(
                "At least one dialogue input is required".to_string(),
            ));
        }
        for turn in turns {
            if turn.text.trim().is_empty() {
                return Err(SynthesisError::InvalidInput(
                    "Dialogue input text cannot be empty".to_string(),
                ));
            }
            if turn.voice_id.trim().is_empty() {
                return Err(SynthesisError::InvalidInput(
                    "Dialogue input must have a valid voice ID".to_string(),
                ));
            }
        }

        let total_chars: usize = turns.iter().map(|t| t.text.chars().count()).sum();
        tracing::debug!(
            lines = turns.len(),
            total_chars = total_chars,
            model_id = %options.model_id,
            "Sending text-to-dialogue request"
        );

        let body = DialogueRequest {
            inputs: turns
                .iter()
                .map(|t| DialogueInput {
                    text: &t.text,
                    voice_id: &t.voice_id,
                })
                .collect(),
            model_id: &options.model_id,
        };

        let request = self
            .client
            .post(self.dialogue_url())
            .query(&[("output_format", options.output_format.as_str())])
            .json(&body);

        self.send_for_audio(request, "text-to-dialogue").await
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.user_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client_for(base_url: &str) -> ElevenLabsClient {
        ElevenLabsClient::new(ElevenLabsClientConfig::new(base_url, "test-key").with_timeout(5))
            .unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = ElevenLabsClientConfig::default();
        assert_eq!(config.base_url, "https://api.elevenlabs.io");
        assert_eq!(config.timeout_secs, 240);
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = ElevenLabsClient::new(ElevenLabsClientConfig::new("http://localhost", "   "));
        assert!(matches!(result, Err(SynthesisError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_synthesize_single_request_shape() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/text-to-speech/voice-a")
            .match_header("xi-api-key", "test-key")
            .match_query(Matcher::UrlEncoded(
                "output_format".into(),
                "mp3_44100_128".into(),
            ))
            .match_body(Matcher::Json(serde_json::json!({
                "text": "Hello there",
                "model_id": "eleven_flash_v2_5"
            })))
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(vec![1u8, 2, 3])
            .create_async()
            .await;

        let client = client_for(&server.url());
        let options = SynthesisOptions::new("eleven_flash_v2_5", "mp3_44100_128");
        let audio = client
            .synthesize_single("Hello there", "voice-a", &options)
            .await
            .unwrap();

        assert_eq!(audio, vec![1, 2, 3]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_voice_id_is_escaped_as_one_path_segment() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/text-to-speech/a%2Fb%3Fc")
            .match_query(Matcher::UrlEncoded(
                "output_format".into(),
                "mp3_44100_128".into(),
            ))
            .with_status(200)
            .with_body(vec![4u8])
            .create_async()
            .await;

        let client = client_for(&server.url());
        let options = SynthesisOptions::new("eleven_flash_v2_5", "mp3_44100_128");
        let audio = client
            .synthesize_single("Hello", "a/b?c", &options)
            .await
            .unwrap();

        assert_eq!(audio, vec![4]);
        mock.assert_async().await;
    }

    #[test]
    fn test_speech_url_keeps_base_path() {
        let client = client_for("http://localhost:9000/proxy/");
        let url = client.speech_url("voice a").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/proxy/v1/text-to-speech/voice%20a"
        );
    }

    #[tokio::test]
    async fn test_synthesize_dialogue_request_shape() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/text-to-dialogue")
            .match_query(Matcher::UrlEncoded(
                "output_format".into(),
                "mp3_44100_128".into(),
            ))
            .match_body(Matcher::Json(serde_json::json!({
                "inputs": [
                    {"text": "[excited] Hi", "voice_id": "v1"},
                    {"text": "Hello", "voice_id": "v2"}
                ],
                "model_id": "eleven_v3"
            })))
            .with_status(200)
            .with_body(vec![9u8; 16])
            .create_async()
            .await;

        let client = client_for(&server.url());
        let turns = vec![
            DialogueTurn::new("[excited] Hi", "v1"),
            DialogueTurn::new("Hello", "v2"),
        ];
        let audio = client
            .synthesize_dialogue(&turns, &SynthesisOptions::default())
            .await
            .unwrap();

        assert_eq!(audio.len(), 16);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_service_error_carries_message() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/text-to-dialogue")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .synthesize_dialogue(&[DialogueTurn::new("Hi", "v1")], &SynthesisOptions::default())
            .await
            .unwrap_err();

        match err {
            SynthesisError::ServiceError(message) => {
                assert!(message.contains("401"));
                assert!(message.contains("invalid api key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_locally() {
        let client = client_for("http://127.0.0.1:9");

        let err = client
            .synthesize_dialogue(&[], &SynthesisOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidInput(_)));

        let err = client
            .synthesize_single("hi", " ", &SynthesisOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidInput(_)));
    }
}
