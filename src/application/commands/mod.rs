//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：生成音频、会话生命周期、缓存维护

mod cache_commands;
mod generate_commands;
mod session_commands;

pub mod handlers;

pub use cache_commands::*;
pub use generate_commands::*;
pub use session_commands::*;
