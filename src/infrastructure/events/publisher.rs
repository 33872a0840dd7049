//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现

use crate::application::ports::{AudioSource, GenerationState, GenerationTarget, PlaybackHandle};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 生成状态变更
    GenerationStateChanged {
        session_id: String,
        target: String,
        state: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cache_key: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// 请求客户端自动播放
    AutoPlay {
        session_id: String,
        handle_id: Uuid,
        url: String,
        source: String,
    },
    /// 会话关闭
    SessionClosed {
        session_id: String,
        reason: String,
    },
    /// 过期清理完成
    CacheSwept {
        removed: usize,
    },
    /// 缓存已清空
    CacheCleared,
}

/// 事件发布器
pub struct EventPublisher {
    /// session_id -> broadcast sender (for session-specific events)
    session_channels: DashMap<String, broadcast::Sender<WsEvent>>,
    /// Global broadcast channel for cache maintenance events
    global_channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(100);
        Self {
            session_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局事件（CacheSwept/CacheCleared）
    pub fn subscribe_global(&self) -> broadcast::Receiver<WsEvent> {
        self.global_channel.subscribe()
    }

    /// 注册会话的事件通道
    pub fn register_session(&self, session_id: &str) -> broadcast::Receiver<WsEvent> {
        if let Some(sender) = self.session_channels.get(session_id) {
            return sender.subscribe();
        }

        let (tx, rx) = broadcast::channel(100);
        self.session_channels.insert(session_id.to_string(), tx);
        rx
    }

    /// 取消注册会话
    pub fn unregister_session(&self, session_id: &str) {
        self.session_channels.remove(session_id);
    }

    /// 获取会话的事件接收器
    pub fn subscribe(&self, session_id: &str) -> Option<broadcast::Receiver<WsEvent>> {
        self.session_channels.get(session_id).map(|s| s.subscribe())
    }

    /// 发布生成状态变更
    pub fn publish_generation_state(
        &self,
        session_id: &str,
        target: &GenerationTarget,
        state: GenerationState,
        cache_key: Option<&str>,
    ) {
        self.publish_to_session(
            session_id,
            WsEvent::GenerationStateChanged {
                session_id: session_id.to_string(),
                target: target.to_string(),
                state: state.as_str().to_string(),
                cache_key: cache_key.map(str::to_string),
                error: None,
            },
        );
    }

    /// 发布生成失败事件
    pub fn publish_generation_failed(
        &self,
        session_id: &str,
        target: &GenerationTarget,
        cache_key: Option<&str>,
        error: &str,
    ) {
        self.publish_to_session(
            session_id,
            WsEvent::GenerationStateChanged {
                session_id: session_id.to_string(),
                target: target.to_string(),
                state: GenerationState::Failed.as_str().to_string(),
                cache_key: cache_key.map(str::to_string),
                error: Some(error.to_string()),
            },
        );
    }

    /// 发布自动播放请求
    pub fn publish_autoplay(&self, session_id: &str, handle: &PlaybackHandle, source: AudioSource) {
        self.publish_to_session(
            session_id,
            WsEvent::AutoPlay {
                session_id: session_id.to_string(),
                handle_id: handle.id,
                url: handle.url.clone(),
                source: source.as_str().to_string(),
            },
        );
    }

    /// 发布会话关闭事件
    pub fn publish_session_closed(&self, session_id: &str, reason: &str) {
        self.publish_to_session(
            session_id,
            WsEvent::SessionClosed {
                session_id: session_id.to_string(),
                reason: reason.to_string(),
            },
        );
    }

    /// 发布过期清理结果（全局广播）
    pub fn publish_cache_swept(&self, removed: usize) {
        if let Err(e) = self.global_channel.send(WsEvent::CacheSwept { removed }) {
            tracing::debug!(
                removed = removed,
                error = %e,
                "Failed to publish CacheSwept event (no receivers)"
            );
        }
    }

    /// 发布缓存清空事件（全局广播）
    pub fn publish_cache_cleared(&self) {
        if let Err(e) = self.global_channel.send(WsEvent::CacheCleared) {
            tracing::debug!(error = %e, "Failed to publish CacheCleared event (no receivers)");
        }
    }

    /// 发布事件到指定会话
    fn publish_to_session(&self, session_id: &str, event: WsEvent) {
        if let Some(sender) = self.session_channels.get(session_id) {
            if let Err(e) = sender.send(event) {
                tracing::debug!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
