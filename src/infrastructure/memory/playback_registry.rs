//! In-Memory Playback Registry Implementation
//!
//! 句柄对应内存中的一份音频，通过 `{url_prefix}/{handle_id}` 访问

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::application::ports::{AudioSource, PlaybackHandle, PlaybackPort};
use crate::infrastructure::events::EventPublisher;

/// 默认句柄 URL 前缀
pub const DEFAULT_PLAYBACK_URL_PREFIX: &str = "/api/playback";

/// 内存播放句柄注册表
pub struct InMemoryPlaybackRegistry {
    /// handle_id -> audio
    handles: Arc<DashMap<Uuid, Arc<Vec<u8>>>>,
    url_prefix: String,
    event_publisher: Arc<EventPublisher>,
}

impl InMemoryPlaybackRegistry {
    pub fn new(event_publisher: Arc<EventPublisher>) -> Self {
        Self::with_url_prefix(event_publisher, DEFAULT_PLAYBACK_URL_PREFIX)
    }

    pub fn with_url_prefix(event_publisher: Arc<EventPublisher>, url_prefix: &str) -> Self {
        Self {
            handles: Arc::new(DashMap::new()),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            event_publisher,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl PlaybackPort for InMemoryPlaybackRegistry {
    fn materialize(&self, audio_data: Vec<u8>) -> PlaybackHandle {
        let id = Uuid::new_v4();
        let size_bytes = audio_data.len();
        self.handles.insert(id, Arc::new(audio_data));
        tracing::debug!(handle_id = %id, size_bytes = size_bytes, "Playback handle created");

        PlaybackHandle {
            id,
            url: format!("{}/{}", self.url_prefix, id),
            size_bytes,
        }
    }

    fn revoke(&self, handle_id: Uuid) {
        if self.handles.remove(&handle_id).is_some() {
            tracing::debug!(handle_id = %handle_id, "Playback handle revoked");
        }
    }

    fn fetch(&self, handle_id: Uuid) -> Option<Vec<u8>> {
        self.handles.get(&handle_id).map(|a| a.as_ref().clone())
    }

    fn is_live(&self, handle_id: Uuid) -> bool {
        self.handles.contains_key(&handle_id)
    }

    fn schedule_autoplay(
        &self,
        session_id: &str,
        handle: &PlaybackHandle,
        source: AudioSource,
        delay: Duration,
    ) {
        let handles = self.handles.clone();
        let publisher = self.event_publisher.clone();
        let session_id = session_id.to_string();
        let handle = handle.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !handles.contains_key(&handle.id) {
                tracing::debug!(
                    session_id = %session_id,
                    handle_id = %handle.id,
                    "Skipping autoplay for revoked handle"
                );
                return;
            }
            publisher.publish_autoplay(&session_id, &handle, source);
        });
    }

    fn live_count(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::events::WsEvent;

    fn registry() -> (Arc<EventPublisher>, InMemoryPlaybackRegistry) {
        let publisher = EventPublisher::new().arc();
        let registry = InMemoryPlaybackRegistry::new(publisher.clone());
        (publisher, registry)
    }

    #[test]
    fn test_materialize_and_revoke() {
        let (_publisher, registry) = registry();
        let handle = registry.materialize(vec![1, 2, 3]);

        assert_eq!(handle.url, format!("/api/playback/{}", handle.id));
        assert_eq!(handle.size_bytes, 3);
        assert_eq!(registry.fetch(handle.id), Some(vec![1, 2, 3]));
        assert_eq!(registry.live_count(), 1);

        registry.revoke(handle.id);
        registry.revoke(handle.id);
        assert!(!registry.is_live(handle.id));
        assert_eq!(registry.fetch(handle.id), None);
        assert_eq!(registry.live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_after_delay() {
        let (publisher, registry) = registry();
        let mut rx = publisher.register_session("s1");
        let handle = registry.materialize(vec![9]);

        registry.schedule_autoplay("s1", &handle, AudioSource::Cache, Duration::from_millis(50));

        match rx.recv().await.unwrap() {
            WsEvent::AutoPlay { handle_id, source, url, .. } => {
                assert_eq!(handle_id, handle.id);
                assert_eq!(source, "cache");
                assert_eq!(url, handle.url);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_skipped_when_revoked() {
        let (publisher, registry) = registry();
        let mut rx = publisher.register_session("s1");
        let handle = registry.materialize(vec![9]);

        registry.schedule_autoplay(
            "s1",
            &handle,
            AudioSource::Generated,
            Duration::from_millis(100),
        );
        registry.revoke(handle.id);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());
    }
}
