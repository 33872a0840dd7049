//! Session Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{PlaybackPort, SessionManagerPort};
use crate::application::queries::session_queries::*;

/// GetSessionStatus Handler
pub struct GetSessionStatusHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl GetSessionStatusHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub async fn handle(
        &self,
        query: GetSessionStatusQuery,
    ) -> Result<SessionStatusResponse, ApplicationError> {
        let session = self.session_manager.get(&query.session_id)?;
        self.session_manager.touch(&query.session_id);

        Ok(SessionStatusResponse {
            session_id: session.id,
            generating: session.generating,
            playback: session.playback,
            dialogue_cached: session.dialogue_cached,
            created_at: session.created_at.to_rfc3339(),
            last_activity: session.last_activity.to_rfc3339(),
        })
    }
}

/// 按输出格式推断 MIME 类型
pub fn content_type_for(output_format: &str) -> &'static str {
    if output_format.starts_with("mp3") {
        "audio/mpeg"
    } else if output_format.starts_with("opus") {
        "audio/ogg"
    } else {
        "audio/wav"
    }
}

/// GetPlaybackAudio Handler
pub struct GetPlaybackAudioHandler {
    playback: Arc<dyn PlaybackPort>,
    content_type: &'static str,
}

impl GetPlaybackAudioHandler {
    pub fn new(playback: Arc<dyn PlaybackPort>, output_format: &str) -> Self {
        Self {
            playback,
            content_type: content_type_for(output_format),
        }
    }

    pub async fn handle(
        &self,
        query: GetPlaybackAudioQuery,
    ) -> Result<PlaybackAudioResponse, ApplicationError> {
        let audio_data = self
            .playback
            .fetch(query.handle_id)
            .ok_or_else(|| ApplicationError::not_found("Playback", query.handle_id.to_string()))?;

        Ok(PlaybackAudioResponse {
            audio_data,
            content_type: self.content_type.to_string(),
        })
    }
}
