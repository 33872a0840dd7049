//! Memory Layer - In-Memory State Management
//!
//! 实现 SessionManager 和 PlaybackRegistry，管理编辑会话和播放句柄的内存状态

mod playback_registry;
mod session_manager;

pub use playback_registry::{InMemoryPlaybackRegistry, DEFAULT_PLAYBACK_URL_PREFIX};
pub use session_manager::InMemorySessionManager;
