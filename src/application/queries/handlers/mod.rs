//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod cache_handlers;
mod cost_handlers;
mod session_handlers;

pub use cache_handlers::*;
pub use cost_handlers::*;
pub use session_handlers::*;
