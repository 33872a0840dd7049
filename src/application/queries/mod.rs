//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：处理所有读操作

mod cache_queries;
mod cost_queries;
mod session_queries;

pub mod handlers;

pub use cache_queries::*;
pub use cost_queries::*;
pub use session_queries::*;
