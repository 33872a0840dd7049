//! Cache Command Handlers
//!
//! 存储失败在缓存实现内部降级，这里的命令不会因存储错误失败

use std::sync::Arc;

use crate::application::commands::cache_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::AudioCachePort;
use crate::infrastructure::events::EventPublisher;

/// SweepExpiredCache Handler
pub struct SweepExpiredCacheHandler {
    audio_cache: Arc<dyn AudioCachePort>,
    event_publisher: Arc<EventPublisher>,
}

impl SweepExpiredCacheHandler {
    pub fn new(audio_cache: Arc<dyn AudioCachePort>, event_publisher: Arc<EventPublisher>) -> Self {
        Self {
            audio_cache,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        _cmd: SweepExpiredCacheCommand,
    ) -> Result<SweepExpiredCacheResponse, ApplicationError> {
        let removed = self.audio_cache.sweep_expired().await;
        if removed > 0 {
            self.event_publisher.publish_cache_swept(removed);
        }
        Ok(SweepExpiredCacheResponse { removed })
    }
}

/// ClearCache Handler
pub struct ClearCacheHandler {
    audio_cache: Arc<dyn AudioCachePort>,
    event_publisher: Arc<EventPublisher>,
}

impl ClearCacheHandler {
    pub fn new(audio_cache: Arc<dyn AudioCachePort>, event_publisher: Arc<EventPublisher>) -> Self {
        Self {
            audio_cache,
            event_publisher,
        }
    }

    pub async fn handle(&self, _cmd: ClearCacheCommand) -> Result<(), ApplicationError> {
        self.audio_cache.clear().await;
        self.event_publisher.publish_cache_cleared();
        Ok(())
    }
}

/// InvalidateCacheEntry Handler
pub struct InvalidateCacheEntryHandler {
    audio_cache: Arc<dyn AudioCachePort>,
}

impl InvalidateCacheEntryHandler {
    pub fn new(audio_cache: Arc<dyn AudioCachePort>) -> Self {
        Self { audio_cache }
    }

    pub async fn handle(&self, cmd: InvalidateCacheEntryCommand) -> Result<(), ApplicationError> {
        self.audio_cache.delete(&cmd.cache_key).await;
        tracing::info!(cache_key = %cmd.cache_key, "Audio cache entry invalidated");
        Ok(())
    }
}
