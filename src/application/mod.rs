//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（AudioCache、SpeechSynthesis、Playback、SessionManager）
//! - commands: CQRS 命令及处理器（生成编排、会话、缓存维护）
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Generate commands
    GenerateDialogueCommand,
    GenerateLineCommand,
    GenerationResponse,
    // Session commands
    CloseSessionCommand,
    CloseSessionResponse,
    OpenSessionCommand,
    OpenSessionResponse,
    // Cache commands
    ClearCacheCommand,
    InvalidateCacheEntryCommand,
    SweepExpiredCacheCommand,
    SweepExpiredCacheResponse,
    // Handlers
    handlers::{
        ClearCacheHandler, CloseSessionHandler, GenerateDialogueHandler, GenerateLineHandler,
        GenerationConfig, GenerationPipeline, InvalidateCacheEntryHandler, OpenSessionHandler,
        SweepExpiredCacheHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Audio cache
    AudioCachePort,
    CacheError,
    CacheStats,
    AUDIO_CACHE_TTL,
    // Playback
    AudioSource,
    PlaybackHandle,
    PlaybackPort,
    // Session manager
    GenerationState,
    GenerationTarget,
    Session,
    SessionError,
    SessionManagerPort,
    // Speech synthesis
    SpeechSynthesisPort,
    SynthesisError,
    SynthesisOptions,
};

pub use queries::{
    // Cache queries
    DialogueCacheStatusResponse,
    GetCacheStatsQuery,
    GetDialogueCacheStatusQuery,
    // Cost queries
    EstimateDialogueCostQuery,
    // Session queries
    GetPlaybackAudioQuery,
    GetSessionStatusQuery,
    PlaybackAudioResponse,
    SessionStatusResponse,
    // Handlers
    handlers::{
        EstimateDialogueCostHandler, GetCacheStatsHandler, GetDialogueCacheStatusHandler,
        GetPlaybackAudioHandler, GetSessionStatusHandler,
    },
};
