//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_cache;
mod playback;
mod session_manager;
mod speech_synthesis;

pub use audio_cache::{AudioCachePort, CacheError, CacheStats, AUDIO_CACHE_TTL};
pub use playback::{AudioSource, PlaybackHandle, PlaybackPort};
pub use session_manager::{
    GenerationState, GenerationTarget, Session, SessionError, SessionManagerPort,
};
pub use speech_synthesis::{SpeechSynthesisPort, SynthesisError, SynthesisOptions};
