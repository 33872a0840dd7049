//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    ClearCacheHandler, CloseSessionHandler, GenerateDialogueHandler, GenerateLineHandler,
    GenerationConfig, GenerationPipeline, InvalidateCacheEntryHandler, OpenSessionHandler,
    SweepExpiredCacheHandler,
    // Query handlers
    EstimateDialogueCostHandler, GetCacheStatsHandler, GetDialogueCacheStatusHandler,
    GetPlaybackAudioHandler, GetSessionStatusHandler,
    // Ports
    AudioCachePort, PlaybackPort, SessionManagerPort, SpeechSynthesisPort,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态
///
/// 会话与播放句柄均为内存实现，音频缓存为 sled
pub struct AppState {
    // ========== Ports ==========
    pub session_manager: Arc<dyn SessionManagerPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub open_session_handler: OpenSessionHandler,
    pub close_session_handler: CloseSessionHandler,
    pub generate_line_handler: GenerateLineHandler,
    pub generate_dialogue_handler: GenerateDialogueHandler,
    pub sweep_cache_handler: SweepExpiredCacheHandler,
    pub clear_cache_handler: ClearCacheHandler,
    pub invalidate_cache_handler: InvalidateCacheEntryHandler,

    // ========== Query Handlers ==========
    pub session_status_handler: GetSessionStatusHandler,
    pub playback_audio_handler: GetPlaybackAudioHandler,
    pub dialogue_cache_status_handler: GetDialogueCacheStatusHandler,
    pub cache_stats_handler: GetCacheStatsHandler,
    pub estimate_cost_handler: EstimateDialogueCostHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        audio_cache: Arc<dyn AudioCachePort>,
        synthesizer: Arc<dyn SpeechSynthesisPort>,
        playback: Arc<dyn PlaybackPort>,
        event_publisher: Arc<EventPublisher>,
        generation: GenerationConfig,
    ) -> Self {
        let pipeline = GenerationPipeline::new(
            session_manager.clone(),
            audio_cache.clone(),
            synthesizer,
            playback.clone(),
            event_publisher.clone(),
            generation.clone(),
        )
        .arc();

        Self {
            // Ports
            session_manager: session_manager.clone(),
            event_publisher: event_publisher.clone(),

            // Command handlers
            open_session_handler: OpenSessionHandler::new(session_manager.clone()),
            close_session_handler: CloseSessionHandler::new(
                session_manager.clone(),
                playback.clone(),
                event_publisher.clone(),
            ),
            generate_line_handler: GenerateLineHandler::new(pipeline.clone()),
            generate_dialogue_handler: GenerateDialogueHandler::new(pipeline),
            sweep_cache_handler: SweepExpiredCacheHandler::new(
                audio_cache.clone(),
                event_publisher.clone(),
            ),
            clear_cache_handler: ClearCacheHandler::new(audio_cache.clone(), event_publisher),
            invalidate_cache_handler: InvalidateCacheEntryHandler::new(audio_cache.clone()),

            // Query handlers
            session_status_handler: GetSessionStatusHandler::new(session_manager),
            playback_audio_handler: GetPlaybackAudioHandler::new(
                playback,
                &generation.output_format,
            ),
            dialogue_cache_status_handler: GetDialogueCacheStatusHandler::new(
                audio_cache.clone(),
                generation,
            ),
            cache_stats_handler: GetCacheStatsHandler::new(audio_cache),
            estimate_cost_handler: EstimateDialogueCostHandler::new(),
        }
    }
}
