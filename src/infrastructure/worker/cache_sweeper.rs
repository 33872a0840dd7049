//! Cache Sweeper - 后台过期清理
//!
//! 周期性删除过期缓存条目，并回收空闲会话及其播放句柄

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{AudioCachePort, PlaybackPort, SessionManagerPort};
use crate::infrastructure::events::EventPublisher;

/// Sweeper 配置
#[derive(Debug, Clone)]
pub struct CacheSweeperConfig {
    /// 清理间隔
    pub interval: Duration,
    /// 会话空闲过期时间（秒）
    pub session_expire_secs: u64,
}

impl Default for CacheSweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            session_expire_secs: 86400,
        }
    }
}

/// 单轮清理结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_entries: usize,
    pub expired_sessions: usize,
}

/// 缓存清理 Worker
pub struct CacheSweeper {
    config: CacheSweeperConfig,
    audio_cache: Arc<dyn AudioCachePort>,
    session_manager: Arc<dyn SessionManagerPort>,
    playback: Arc<dyn PlaybackPort>,
    event_publisher: Arc<EventPublisher>,
}

impl CacheSweeper {
    pub fn new(
        config: CacheSweeperConfig,
        audio_cache: Arc<dyn AudioCachePort>,
        session_manager: Arc<dyn SessionManagerPort>,
        playback: Arc<dyn PlaybackPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            config,
            audio_cache,
            session_manager,
            playback,
            event_publisher,
        }
    }

    /// 启动 Worker（首轮立即执行）
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            session_expire_secs = self.config.session_expire_secs,
            "CacheSweeper started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    /// 执行一轮清理
    pub async fn sweep_once(&self) -> SweepReport {
        let expired_entries = self.audio_cache.sweep_expired().await;
        if expired_entries > 0 {
            self.event_publisher.publish_cache_swept(expired_entries);
        }

        let expired_sessions = self.reclaim_sessions();

        let report = SweepReport {
            expired_entries,
            expired_sessions,
        };
        if expired_entries > 0 || expired_sessions > 0 {
            tracing::info!(
                expired_entries = expired_entries,
                expired_sessions = expired_sessions,
                "Sweep completed"
            );
        }
        report
    }

    /// 关闭空闲会话并释放其句柄
    fn reclaim_sessions(&self) -> usize {
        let expired = self
            .session_manager
            .get_expired_sessions(self.config.session_expire_secs);

        let mut reclaimed = 0;
        for session_id in expired {
            let session = match self.session_manager.close(&session_id) {
                Ok(session) => session,
                Err(_) => continue,
            };
            if let Some(handle) = session.playback {
                self.playback.revoke(handle.id);
            }
            self.event_publisher
                .publish_session_closed(&session_id, "idle_timeout");
            self.event_publisher.unregister_session(&session_id);
            tracing::debug!(session_id = %session_id, "Idle session reclaimed");
            reclaimed += 1;
        }
        reclaimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Session;
    use crate::infrastructure::memory::{InMemoryPlaybackRegistry, InMemorySessionManager};
    use crate::infrastructure::persistence::SledAudioCache;
    use chrono::Utc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sweep_once_reclaims_idle_sessions() {
        let dir = tempdir().unwrap();
        let cache = SledAudioCache::open(dir.path().join("cache.sled")).arc();
        let sessions = InMemorySessionManager::new().arc();
        let publisher = EventPublisher::new().arc();
        let playback = InMemoryPlaybackRegistry::new(publisher.clone()).arc();

        let mut idle = Session::new();
        idle.last_activity = Utc::now() - chrono::Duration::seconds(600);
        let idle_id = sessions.create(idle).unwrap();
        let handle = playback.materialize(vec![1]);
        sessions.replace_playback(&idle_id, handle.clone()).unwrap();

        let active_id = sessions.create(Session::new()).unwrap();

        let sweeper = CacheSweeper::new(
            CacheSweeperConfig {
                interval: Duration::from_secs(60),
                session_expire_secs: 300,
            },
            cache,
            sessions.clone(),
            playback.clone(),
            publisher,
        );

        let report = sweeper.sweep_once().await;
        assert_eq!(
            report,
            SweepReport {
                expired_entries: 0,
                expired_sessions: 1
            }
        );
        assert!(!sessions.is_valid(&idle_id));
        assert!(sessions.is_valid(&active_id));
        assert!(!playback.is_live(handle.id));
    }
}
