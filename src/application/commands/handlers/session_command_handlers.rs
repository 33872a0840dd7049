//! Session Command Handlers

use std::sync::Arc;

use crate::application::commands::session_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{PlaybackPort, Session, SessionManagerPort};
use crate::infrastructure::events::EventPublisher;

/// OpenSession Handler - 创建编辑会话
pub struct OpenSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl OpenSessionHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub async fn handle(
        &self,
        _cmd: OpenSessionCommand,
    ) -> Result<OpenSessionResponse, ApplicationError> {
        let session_id = self.session_manager.create(Session::new())?;
        Ok(OpenSessionResponse { session_id })
    }
}

/// CloseSession Handler - 关闭会话并释放播放句柄
pub struct CloseSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    playback: Arc<dyn PlaybackPort>,
    event_publisher: Arc<EventPublisher>,
}

impl CloseSessionHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        playback: Arc<dyn PlaybackPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            session_manager,
            playback,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: CloseSessionCommand,
    ) -> Result<CloseSessionResponse, ApplicationError> {
        let session = self.session_manager.close(&cmd.session_id)?;

        // 释放当前句柄
        let released_playback = match session.playback {
            Some(handle) => {
                self.playback.revoke(handle.id);
                true
            }
            None => false,
        };

        // 发布会话关闭事件
        self.event_publisher
            .publish_session_closed(&cmd.session_id, "client_close");

        // 取消注册事件通道
        self.event_publisher.unregister_session(&cmd.session_id);

        tracing::info!(
            session_id = %cmd.session_id,
            released_playback = released_playback,
            "Session closed"
        );

        Ok(CloseSessionResponse {
            session_id: cmd.session_id,
            released_playback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::events::WsEvent;
    use crate::infrastructure::memory::{InMemoryPlaybackRegistry, InMemorySessionManager};

    #[tokio::test]
    async fn test_open_and_close_session() {
        let sessions = InMemorySessionManager::new().arc();
        let publisher = EventPublisher::new().arc();
        let playback = InMemoryPlaybackRegistry::new(publisher.clone()).arc();

        let opened = OpenSessionHandler::new(sessions.clone())
            .handle(OpenSessionCommand)
            .await
            .unwrap();
        assert!(sessions.is_valid(&opened.session_id));

        let handle = playback.materialize(vec![1, 2, 3]);
        sessions
            .replace_playback(&opened.session_id, handle.clone())
            .unwrap();
        let mut rx = publisher.register_session(&opened.session_id);

        let closer = CloseSessionHandler::new(sessions.clone(), playback.clone(), publisher.clone());
        let closed = closer
            .handle(CloseSessionCommand {
                session_id: opened.session_id.clone(),
            })
            .await
            .unwrap();

        assert!(closed.released_playback);
        assert!(!playback.is_live(handle.id));
        assert!(!sessions.is_valid(&opened.session_id));
        assert!(matches!(
            rx.recv().await.unwrap(),
            WsEvent::SessionClosed { .. }
        ));

        let err = closer
            .handle(CloseSessionCommand {
                session_id: opened.session_id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::SessionNotFound(_)));
    }
}
