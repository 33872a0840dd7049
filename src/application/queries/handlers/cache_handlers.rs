//! Cache Query Handlers

use std::sync::Arc;

use crate::application::commands::handlers::GenerationConfig;
use crate::application::error::ApplicationError;
use crate::application::ports::{AudioCachePort, CacheStats};
use crate::application::queries::cache_queries::*;
use crate::domain::cache_key::CacheKeyBuilder;

/// GetDialogueCacheStatus Handler
///
/// 按整段生成相同的 key 规则（完整模型、不校验）探测缓存
pub struct GetDialogueCacheStatusHandler {
    audio_cache: Arc<dyn AudioCachePort>,
    key_builder: CacheKeyBuilder,
    config: GenerationConfig,
}

impl GetDialogueCacheStatusHandler {
    pub fn new(audio_cache: Arc<dyn AudioCachePort>, config: GenerationConfig) -> Self {
        Self {
            audio_cache,
            key_builder: CacheKeyBuilder::new(),
            config,
        }
    }

    pub async fn handle(
        &self,
        query: GetDialogueCacheStatusQuery,
    ) -> Result<DialogueCacheStatusResponse, ApplicationError> {
        if query.dialogue.is_empty() {
            return Ok(DialogueCacheStatusResponse {
                cache_key: None,
                cached: false,
            });
        }

        let cache_key = self.key_builder.dialogue_key(
            &query.dialogue.to_turns(),
            &self.config.full_model_id,
            Some(self.config.output_format.as_str()),
        )?;
        let cached = self.audio_cache.get(&cache_key).await.is_some();

        Ok(DialogueCacheStatusResponse {
            cache_key: Some(cache_key),
            cached,
        })
    }
}

/// GetCacheStats Handler
pub struct GetCacheStatsHandler {
    audio_cache: Arc<dyn AudioCachePort>,
}

impl GetCacheStatsHandler {
    pub fn new(audio_cache: Arc<dyn AudioCachePort>) -> Self {
        Self { audio_cache }
    }

    pub async fn handle(&self, _query: GetCacheStatsQuery) -> Result<CacheStats, ApplicationError> {
        Ok(self.audio_cache.stats().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::{Dialogue, DialogueLine, Speaker, FULL_MODEL_ID};
    use crate::domain::cache_key::build_dialogue_key;
    use crate::infrastructure::persistence::SledAudioCache;
    use tempfile::tempdir;

    fn dialogue() -> Dialogue {
        Dialogue::new(
            vec![
                DialogueLine::new("l1", "Hello", "s1"),
                DialogueLine::new("l2", "Hi", "s2"),
            ],
            vec![Speaker::new("s1", "v1")],
        )
    }

    #[tokio::test]
    async fn test_dialogue_cache_status() {
        let dir = tempdir().unwrap();
        let cache = SledAudioCache::open(dir.path().join("cache.sled")).arc();
        let handler = GetDialogueCacheStatusHandler::new(cache.clone(), GenerationConfig::default());

        let status = handler
            .handle(GetDialogueCacheStatusQuery { dialogue: dialogue() })
            .await
            .unwrap();
        assert!(!status.cached);

        // 未分配音色的行按空 voice_id 计算 key
        let expected = build_dialogue_key(&dialogue().to_turns(), FULL_MODEL_ID, None).unwrap();
        assert_eq!(status.cache_key.as_deref(), Some(expected.as_str()));

        cache.put(&expected, vec![1, 2]).await;
        let status = handler
            .handle(GetDialogueCacheStatusQuery { dialogue: dialogue() })
            .await
            .unwrap();
        assert!(status.cached);

        let stats = GetCacheStatsHandler::new(cache)
            .handle(GetCacheStatsQuery)
            .await
            .unwrap();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.total_size_bytes, 2);
    }

    #[tokio::test]
    async fn test_empty_dialogue_is_not_cached() {
        let dir = tempdir().unwrap();
        let cache = SledAudioCache::open(dir.path().join("cache.sled")).arc();
        let handler = GetDialogueCacheStatusHandler::new(cache, GenerationConfig::default());

        let status = handler
            .handle(GetDialogueCacheStatusQuery {
                dialogue: Dialogue::default(),
            })
            .await
            .unwrap();
        assert!(!status.cached);
        assert!(status.cache_key.is_none());
    }
}
