//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod cache_command_handlers;
mod generate_handlers;
mod session_command_handlers;

pub use cache_command_handlers::*;
pub use generate_handlers::*;
pub use session_command_handlers::*;
